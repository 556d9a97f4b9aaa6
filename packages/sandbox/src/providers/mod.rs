// ABOUTME: Provider trait and types for remote sandbox backends
// ABOUTME: Defines the abstract interface for workspace lifecycle and in-sandbox sessions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod daytona;

pub use daytona::DaytonaProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Lifecycle state of a remote sandbox as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxState {
    Creating,
    Starting,
    Started,
    Stopping,
    Stopped,
    Archiving,
    Archived,
    Error,
    #[serde(other)]
    Unknown,
}

impl SandboxState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Archiving => "archiving",
            Self::Archived => "archived",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// States that require an explicit start before the sandbox is usable.
    pub fn needs_start(&self) -> bool {
        matches!(self, Self::Stopped | Self::Archived)
    }
}

impl std::fmt::Display for SandboxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for a remote sandbox, as returned by the provider API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxInfo {
    pub id: String,
    pub name: String,
    pub state: SandboxState,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
}

/// Creation request for a new sandbox.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSandboxParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub image: String,
    pub target: String,
    pub env: HashMap<String, String>,
}

/// Command execution request inside a named session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionExecuteRequest {
    pub command: String,
    #[serde(rename = "runAsync")]
    pub run_async: bool,
}

/// Preview endpoint exposed by the provider for a sandbox port.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewLink {
    pub url: String,
}

/// Provider trait for remote sandbox backends.
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    /// Fetch sandbox metadata by id.
    async fn get_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo>;

    /// Provision a new sandbox.
    async fn create_sandbox(&self, params: &CreateSandboxParams) -> Result<SandboxInfo>;

    /// Start a stopped or archived sandbox.
    async fn start_sandbox(&self, sandbox_id: &str) -> Result<()>;

    /// Open a named execution session inside a sandbox.
    async fn create_session(&self, sandbox_id: &str, session_id: &str) -> Result<()>;

    /// Execute a command inside an existing session.
    async fn execute_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> Result<()>;

    /// Resolve the public preview URL for a sandbox port.
    async fn preview_url(&self, sandbox_id: &str, port: u16) -> Result<PreviewLink>;
}
