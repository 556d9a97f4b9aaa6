// ABOUTME: Integration tests for the project-bound sandbox capability
// ABOUTME: Covers lazy resolution, caching, accessor preconditions and race safety

use mockall::mock;
use sandpit_projects::{Project, ProjectStorage, SandboxRecord};
use sandpit_sandbox::providers::Result as ProviderResult;
use sandpit_sandbox::{
    BindingError, CreateSandboxParams, PreviewLink, ProjectSandbox, SandboxInfo, SandboxProvider,
    SandboxResolver, SandboxState, SessionExecuteRequest,
};
use std::sync::Arc;

mock! {
    Provider {}

    #[async_trait::async_trait]
    impl SandboxProvider for Provider {
        async fn get_sandbox(&self, sandbox_id: &str) -> ProviderResult<SandboxInfo>;
        async fn create_sandbox(&self, params: &CreateSandboxParams) -> ProviderResult<SandboxInfo>;
        async fn start_sandbox(&self, sandbox_id: &str) -> ProviderResult<()>;
        async fn create_session(&self, sandbox_id: &str, session_id: &str) -> ProviderResult<()>;
        async fn execute_session_command(
            &self,
            sandbox_id: &str,
            session_id: &str,
            request: &SessionExecuteRequest,
        ) -> ProviderResult<()>;
        async fn preview_url(&self, sandbox_id: &str, port: u16) -> ProviderResult<PreviewLink>;
    }
}

async fn setup_storage() -> Arc<ProjectStorage> {
    let pool = sqlx::SqlitePool::connect(":memory:")
        .await
        .expect("Failed to create in-memory database");

    sqlx::migrate!("../projects/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Arc::new(ProjectStorage::new(pool))
}

async fn insert_project(storage: &ProjectStorage, id: &str, sandbox: Option<SandboxRecord>) {
    storage
        .create_project(Project {
            id: id.to_string(),
            name: format!("project-{}", id),
            sandbox,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        })
        .await
        .expect("Failed to insert project");
}

fn binding(project_id: &str, storage: Arc<ProjectStorage>, provider: MockProvider) -> ProjectSandbox {
    let resolver = Arc::new(SandboxResolver::new(Arc::new(provider), "us"));
    ProjectSandbox::new(project_id, storage, resolver)
}

fn running(id: &str) -> SandboxInfo {
    SandboxInfo {
        id: id.to_string(),
        name: format!("Sandbox-{}", &id[..id.len().min(8)]),
        state: SandboxState::Started,
        image: None,
        target: None,
    }
}

/// A project without a sandbox entry fails with a not-found condition and
/// never reaches the provider.
#[tokio::test]
async fn test_project_without_sandbox_fails_before_provider() {
    let storage = setup_storage().await;
    insert_project(&storage, "proj-1", None).await;

    // No expectations set: any provider call panics the test.
    let provider = MockProvider::new();
    let sandbox = binding("proj-1", storage, provider);

    let result = sandbox.ensure().await;
    assert!(matches!(result, Err(BindingError::SandboxNotConfigured(_))));
}

/// A sandbox record with an empty id counts as not configured.
#[tokio::test]
async fn test_empty_sandbox_id_fails_before_provider() {
    let storage = setup_storage().await;
    insert_project(
        &storage,
        "proj-2",
        Some(SandboxRecord {
            id: String::new(),
            pass: "pw".to_string(),
        }),
    )
    .await;

    let provider = MockProvider::new();
    let sandbox = binding("proj-2", storage, provider);

    let result = sandbox.ensure().await;
    assert!(matches!(result, Err(BindingError::SandboxNotConfigured(_))));
}

/// A missing project record fails with a project-not-found condition.
#[tokio::test]
async fn test_missing_project_fails() {
    let storage = setup_storage().await;
    let provider = MockProvider::new();
    let sandbox = binding("nonexistent", storage, provider);

    let result = sandbox.ensure().await;
    assert!(matches!(result, Err(BindingError::ProjectNotFound(_))));
}

/// Accessing the cached handle or id before resolution is a precondition
/// violation, never a silent empty value.
#[tokio::test]
async fn test_accessors_before_ensure_fail() {
    let storage = setup_storage().await;
    let provider = MockProvider::new();
    let sandbox = binding("proj-3", storage, provider);

    assert!(matches!(
        sandbox.handle().await,
        Err(BindingError::NotResolved)
    ));
    assert!(matches!(sandbox.id().await, Err(BindingError::NotResolved)));
    assert!(matches!(sandbox.pass().await, Err(BindingError::NotResolved)));
}

/// The first ensure resolves and caches; later calls and accessors reuse
/// the cached fields without further provider traffic.
#[tokio::test]
async fn test_ensure_resolves_and_caches() {
    let storage = setup_storage().await;
    insert_project(
        &storage,
        "proj-4",
        Some(SandboxRecord {
            id: "sbx-abc".to_string(),
            pass: "vnc-pw".to_string(),
        }),
    )
    .await;

    let mut provider = MockProvider::new();
    provider
        .expect_get_sandbox()
        .times(1)
        .returning(|id| Ok(running(id)));

    let sandbox = binding("proj-4", storage, provider);

    let first = sandbox.ensure().await.expect("First ensure should succeed");
    let second = sandbox.ensure().await.expect("Second ensure should succeed");
    assert_eq!(first.id, second.id);

    assert_eq!(sandbox.handle().await.unwrap().id, "sbx-abc");
    assert_eq!(sandbox.id().await.unwrap(), "sbx-abc");
    assert_eq!(sandbox.pass().await.unwrap(), "vnc-pw");
}

/// Concurrent first uses are serialized: the provider sees exactly one
/// fetch even when two tasks race on ensure.
#[tokio::test]
async fn test_concurrent_ensure_is_single_flight() {
    let storage = setup_storage().await;
    insert_project(
        &storage,
        "proj-5",
        Some(SandboxRecord {
            id: "sbx-race".to_string(),
            pass: "pw".to_string(),
        }),
    )
    .await;

    let mut provider = MockProvider::new();
    provider
        .expect_get_sandbox()
        .times(1)
        .returning(|id| Ok(running(id)));

    let sandbox = Arc::new(binding("proj-5", storage, provider));

    let a = tokio::spawn({
        let sandbox = sandbox.clone();
        async move { sandbox.ensure().await }
    });
    let b = tokio::spawn({
        let sandbox = sandbox.clone();
        async move { sandbox.ensure().await }
    });

    let (a, b) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(a.expect("task a").id, "sbx-race");
    assert_eq!(b.expect("task b").id, "sbx-race");
}

/// A resolver failure leaves the binding unresolved so a later ensure can
/// retry.
#[tokio::test]
async fn test_failed_ensure_leaves_binding_unresolved() {
    let storage = setup_storage().await;
    insert_project(
        &storage,
        "proj-6",
        Some(SandboxRecord {
            id: "sbx-err".to_string(),
            pass: "pw".to_string(),
        }),
    )
    .await;

    let mut provider = MockProvider::new();
    let mut calls = 0;
    provider.expect_get_sandbox().times(2).returning(move |id| {
        calls += 1;
        if calls == 1 {
            Err(sandpit_sandbox::ProviderError::ConnectionError(
                "timeout".to_string(),
            ))
        } else {
            Ok(running(id))
        }
    });

    let sandbox = binding("proj-6", storage, provider);

    assert!(sandbox.ensure().await.is_err());
    assert!(matches!(
        sandbox.handle().await,
        Err(BindingError::NotResolved)
    ));

    sandbox.ensure().await.expect("Retry should succeed");
    assert_eq!(sandbox.id().await.unwrap(), "sbx-err");
}

/// Path cleaning normalizes every accepted form to the same
/// workspace-relative result.
#[tokio::test]
async fn test_clean_path_forms() {
    let storage = setup_storage().await;
    let provider = MockProvider::new();
    let sandbox = binding("proj-7", storage, provider);

    assert_eq!(sandbox.clean_path("foo/bar"), "foo/bar");
    assert_eq!(sandbox.clean_path("/workspace/foo/bar"), "foo/bar");
    assert_eq!(sandbox.clean_path("./foo/bar"), "foo/bar");
}
