// ABOUTME: Remote sandbox provisioning and project-bound sandbox access
// ABOUTME: Provider REST client, get-or-start resolution and the tool-facing binding

pub mod binding;
pub mod paths;
pub mod providers;
pub mod resolver;

pub use binding::{BindingError, ProjectSandbox};
pub use paths::{clean_path, WORKSPACE_ROOT};
pub use providers::{
    CreateSandboxParams, DaytonaProvider, PreviewLink, ProviderError, SandboxInfo,
    SandboxProvider, SandboxState, SessionExecuteRequest,
};
pub use resolver::{ResolverError, SandboxResolver, SANDBOX_IMAGE, SUPERVISORD_SESSION_ID};
