// ABOUTME: Sandbox resolution flow: fetch-or-start, provision, supervisor bootstrap
// ABOUTME: Fail-fast policy throughout, errors are logged at the failure site and propagated

use crate::providers::{
    CreateSandboxParams, SandboxInfo, SandboxProvider, SessionExecuteRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Container image every sandbox is provisioned from.
pub const SANDBOX_IMAGE: &str = "adamcohenhillel/kortix-suna:0.0.20";

/// Fixed session id hosting the process supervisor inside a sandbox.
pub const SUPERVISORD_SESSION_ID: &str = "supervisord-session";

const SUPERVISORD_COMMAND: &str =
    "exec /usr/bin/supervisord -n -c /etc/supervisor/conf.d/supervisord.conf";

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("Provider error: {0}")]
    Provider(#[from] crate::providers::ProviderError),
}

pub type Result<T> = std::result::Result<T, ResolverError>;

/// Resolves sandbox ids to ready-to-use handles against a provider.
pub struct SandboxResolver {
    provider: Arc<dyn SandboxProvider>,
    target: String,
}

impl SandboxResolver {
    pub fn new(provider: Arc<dyn SandboxProvider>, target: impl Into<String>) -> Self {
        Self {
            provider,
            target: target.into(),
        }
    }

    /// Retrieve a sandbox by id, starting it first when it is stopped or
    /// archived.
    ///
    /// The handle is returned in whatever state the provider reports after
    /// the start call; no post-start verification is performed.
    pub async fn get_or_start_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        info!(%sandbox_id, "Getting or starting sandbox");

        let mut sandbox = self
            .provider
            .get_sandbox(sandbox_id)
            .await
            .map_err(|e| {
                error!(%sandbox_id, "Error retrieving sandbox: {e}");
                e
            })?;

        if sandbox.state.needs_start() {
            info!(state = %sandbox.state, %sandbox_id, "Sandbox is not running, starting");

            sandbox = self.start_and_bootstrap(sandbox_id).await.map_err(|e| {
                error!(%sandbox_id, "Error starting sandbox: {e}");
                e
            })?;
        }

        info!(%sandbox_id, "Sandbox is ready");
        Ok(sandbox)
    }

    async fn start_and_bootstrap(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        self.provider.start_sandbox(sandbox_id).await?;

        // Refresh metadata after starting
        let sandbox = self.provider.get_sandbox(sandbox_id).await?;

        self.start_supervisord_session(sandbox_id).await?;
        Ok(sandbox)
    }

    /// Provision a new sandbox with the browser image and display/VNC
    /// environment, then bootstrap its supervisor session.
    ///
    /// A random id is generated when none is supplied; the display name is
    /// derived from the first 8 characters of the id. No cleanup is
    /// attempted when creation fails partway.
    pub async fn create_sandbox(
        &self,
        password: &str,
        sandbox_id: Option<String>,
    ) -> Result<SandboxInfo> {
        debug!("Creating new sandbox environment");

        let id = sandbox_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let name = format!("Sandbox-{}", id.chars().take(8).collect::<String>());

        let params = CreateSandboxParams {
            id: Some(id),
            name,
            image: SANDBOX_IMAGE.to_string(),
            target: self.target.clone(),
            env: default_env_vars(password),
        };
        debug!(name = %params.name, image = %params.image, target = %params.target,
            "Creating sandbox with provider params");

        let sandbox = self.provider.create_sandbox(&params).await.map_err(|e| {
            error!("Error during sandbox creation: {e}");
            e
        })?;
        info!(sandbox_id = %sandbox.id, image = %params.image, "Sandbox created successfully");

        self.start_supervisord_session(&sandbox.id).await?;

        debug!(sandbox_id = %sandbox.id, "Sandbox environment successfully initialized");
        Ok(sandbox)
    }

    /// Open the supervisor session and launch supervisord asynchronously,
    /// replacing the session's own process image.
    ///
    /// Not idempotent: a second call against the same sandbox collides on
    /// the fixed session id and errors if the provider rejects duplicates.
    pub async fn start_supervisord_session(&self, sandbox_id: &str) -> Result<()> {
        info!(%sandbox_id, session_id = SUPERVISORD_SESSION_ID, "Creating supervisord session");

        let result: Result<()> = async {
            self.provider
                .create_session(sandbox_id, SUPERVISORD_SESSION_ID)
                .await?;

            self.provider
                .execute_session_command(
                    sandbox_id,
                    SUPERVISORD_SESSION_ID,
                    &SessionExecuteRequest {
                        command: SUPERVISORD_COMMAND.to_string(),
                        run_async: true,
                    },
                )
                .await?;
            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                info!(%sandbox_id, session_id = SUPERVISORD_SESSION_ID, "Supervisord started");
                Ok(())
            }
            Err(e) => {
                error!(%sandbox_id, "Error starting supervisord session: {e}");
                Err(e)
            }
        }
    }
}

/// Environment configuring the display resolution, VNC access and browser
/// debugging surface of a new sandbox.
fn default_env_vars(vnc_password: &str) -> HashMap<String, String> {
    HashMap::from([
        ("CHROME_PERSISTENT_SESSION".to_string(), "true".to_string()),
        ("RESOLUTION".to_string(), "1024x768x24".to_string()),
        ("RESOLUTION_WIDTH".to_string(), "1024".to_string()),
        ("RESOLUTION_HEIGHT".to_string(), "768".to_string()),
        ("VNC_PASSWORD".to_string(), vnc_password.to_string()),
        ("ANONYMIZED_TELEMETRY".to_string(), "false".to_string()),
        ("CHROME_PATH".to_string(), String::new()),
        ("CHROME_USER_DATA".to_string(), String::new()),
        ("CHROME_DEBUGGING_PORT".to_string(), "9222".to_string()),
        ("CHROME_DEBUGGING_HOST".to_string(), "localhost".to_string()),
        ("CHROME_CDP".to_string(), String::new()),
    ])
}
