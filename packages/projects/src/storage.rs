// ABOUTME: Storage layer for project records in SQLite
// ABOUTME: Provides CRUD operations for projects and their embedded sandbox references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Sandbox reference embedded on a project record.
///
/// `pass` is the provisioning secret (VNC password) chosen when the
/// sandbox was created. Written by the provisioning flow, read-only for
/// everything else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxRecord {
    pub id: String,
    pub pass: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub sandbox: Option<SandboxRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_project(&self, mut project: Project) -> Result<Project> {
        if project.id.is_empty() {
            project.id = uuid::Uuid::new_v4().to_string();
        }

        let sandbox_json = project
            .sandbox
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, name, sandbox, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&sandbox_json)
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(project_id = %project.id, "Created project record");
        Ok(project)
    }

    /// Fetch a project by exact id match.
    pub async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, sandbox, created_at, updated_at
            FROM projects
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_project).transpose()
    }

    /// Record the provisioned sandbox on a project.
    pub async fn set_sandbox(&self, project_id: &str, sandbox: &SandboxRecord) -> Result<()> {
        let sandbox_json = serde_json::to_string(sandbox)?;

        let result = sqlx::query(
            r#"
            UPDATE projects SET sandbox = ?1, updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(&sandbox_json)
        .bind(Utc::now().to_rfc3339())
        .bind(project_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(project_id.to_string()));
        }

        debug!(%project_id, sandbox_id = %sandbox.id, "Attached sandbox to project");
        Ok(())
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn row_to_project(row: sqlx::sqlite::SqliteRow) -> Result<Project> {
    use sqlx::Row;

    let sandbox = row
        .get::<Option<String>, _>("sandbox")
        .map(|s| serde_json::from_str(&s))
        .transpose()?;

    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        sandbox,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(value.to_string()))
}
