// ABOUTME: Project-bound sandbox capability injected into higher-level tools
// ABOUTME: Resolves a project's sandbox once under a lock and caches the handle

use crate::paths::{clean_path, WORKSPACE_ROOT};
use crate::providers::SandboxInfo;
use crate::resolver::{ResolverError, SandboxResolver};
use sandpit_projects::{ProjectStorage, StorageError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("No sandbox found for project {0}")]
    SandboxNotConfigured(String),

    #[error("Sandbox not resolved, call ensure() first")]
    NotResolved,

    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),
}

pub type Result<T> = std::result::Result<T, BindingError>;

/// Resolved sandbox fields. They only ever exist together; partial
/// resolution is unrepresentable.
#[derive(Debug, Clone)]
struct Resolved {
    handle: SandboxInfo,
    id: String,
    pass: String,
}

enum BindingState {
    Unresolved,
    Resolved(Resolved),
}

/// Sandbox access for a single project, handed to tools at construction.
///
/// Resolution runs once: the first `ensure` reads the project record,
/// obtains a ready handle from the resolver and caches it. The lock is held
/// across the whole resolution, so concurrent first uses cannot issue
/// duplicate provider calls.
pub struct ProjectSandbox {
    project_id: String,
    storage: Arc<ProjectStorage>,
    resolver: Arc<SandboxResolver>,
    state: tokio::sync::Mutex<BindingState>,
}

impl ProjectSandbox {
    pub fn new(
        project_id: impl Into<String>,
        storage: Arc<ProjectStorage>,
        resolver: Arc<SandboxResolver>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            storage,
            resolver,
            state: tokio::sync::Mutex::new(BindingState::Unresolved),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Resolve the project's sandbox, starting it if necessary.
    ///
    /// Subsequent calls return the cached handle without touching the
    /// database or the provider.
    pub async fn ensure(&self) -> Result<SandboxInfo> {
        let mut state = self.state.lock().await;

        if let BindingState::Resolved(resolved) = &*state {
            return Ok(resolved.handle.clone());
        }

        let resolved = self.resolve().await.map_err(|e| {
            error!(project_id = %self.project_id, "Error retrieving sandbox for project: {e}");
            e
        })?;

        let handle = resolved.handle.clone();
        *state = BindingState::Resolved(resolved);
        Ok(handle)
    }

    async fn resolve(&self) -> Result<Resolved> {
        let project = self
            .storage
            .get_project(&self.project_id)
            .await?
            .ok_or_else(|| BindingError::ProjectNotFound(self.project_id.clone()))?;

        let record = project
            .sandbox
            .filter(|s| !s.id.is_empty())
            .ok_or_else(|| BindingError::SandboxNotConfigured(self.project_id.clone()))?;

        let handle = self.resolver.get_or_start_sandbox(&record.id).await?;

        Ok(Resolved {
            handle,
            id: record.id,
            pass: record.pass,
        })
    }

    /// Cached sandbox handle. Errors when `ensure` has not run successfully.
    pub async fn handle(&self) -> Result<SandboxInfo> {
        match &*self.state.lock().await {
            BindingState::Resolved(resolved) => Ok(resolved.handle.clone()),
            BindingState::Unresolved => Err(BindingError::NotResolved),
        }
    }

    /// Cached sandbox id. Errors when `ensure` has not run successfully.
    pub async fn id(&self) -> Result<String> {
        match &*self.state.lock().await {
            BindingState::Resolved(resolved) => Ok(resolved.id.clone()),
            BindingState::Unresolved => Err(BindingError::NotResolved),
        }
    }

    /// Cached VNC password. Errors when `ensure` has not run successfully.
    pub async fn pass(&self) -> Result<String> {
        match &*self.state.lock().await {
            BindingState::Resolved(resolved) => Ok(resolved.pass.clone()),
            BindingState::Unresolved => Err(BindingError::NotResolved),
        }
    }

    /// Normalize a caller path to be relative to the sandbox workspace.
    pub fn clean_path(&self, path: &str) -> String {
        let cleaned = clean_path(path, WORKSPACE_ROOT);
        debug!("Cleaned path: {path} -> {cleaned}");
        cleaned
    }
}
