// ABOUTME: Daytona provider for remote development workspaces
// ABOUTME: Implements the SandboxProvider trait over Daytona's REST API

use super::{
    CreateSandboxParams, PreviewLink, ProviderError, Result, SandboxInfo, SandboxProvider,
    SessionExecuteRequest,
};
use async_trait::async_trait;
use sandpit_config::ProviderConfig;
use serde_json::json;
use tracing::{debug, warn};

/// Daytona workspace provider.
///
/// Construction never fails on missing credentials; an incomplete
/// configuration surfaces as an API error on the first real call.
pub struct DaytonaProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DaytonaProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        if !config.is_complete() {
            warn!("Daytona configuration is incomplete; provider calls will fail until it is set");
        }

        Self {
            http: reqwest::Client::new(),
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Map non-2xx responses to an API error carrying status and body.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SandboxProvider for DaytonaProvider {
    async fn get_sandbox(&self, sandbox_id: &str) -> Result<SandboxInfo> {
        debug!(%sandbox_id, "Fetching sandbox metadata");
        let response = self
            .authorize(self.http.get(self.url(&format!("workspace/{}", sandbox_id))))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::decode(Self::check(response).await?).await
    }

    async fn create_sandbox(&self, params: &CreateSandboxParams) -> Result<SandboxInfo> {
        debug!(name = %params.name, image = %params.image, target = %params.target,
            "Creating sandbox");
        let response = self
            .authorize(self.http.post(self.url("workspace")))
            .json(params)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::decode(Self::check(response).await?).await
    }

    async fn start_sandbox(&self, sandbox_id: &str) -> Result<()> {
        debug!(%sandbox_id, "Starting sandbox");
        let response = self
            .authorize(
                self.http
                    .post(self.url(&format!("workspace/{}/start", sandbox_id))),
            )
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn create_session(&self, sandbox_id: &str, session_id: &str) -> Result<()> {
        debug!(%sandbox_id, %session_id, "Creating session");
        let response = self
            .authorize(
                self.http
                    .post(self.url(&format!("workspace/{}/toolbox/process/session", sandbox_id))),
            )
            .json(&json!({ "sessionId": session_id }))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn execute_session_command(
        &self,
        sandbox_id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> Result<()> {
        debug!(%sandbox_id, %session_id, "Executing session command");
        let response = self
            .authorize(self.http.post(self.url(&format!(
                "workspace/{}/toolbox/process/session/{}/exec",
                sandbox_id, session_id
            ))))
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::check(response).await?;
        Ok(())
    }

    async fn preview_url(&self, sandbox_id: &str, port: u16) -> Result<PreviewLink> {
        let response = self
            .authorize(self.http.get(self.url(&format!(
                "workspace/{}/ports/{}/preview-url",
                sandbox_id, port
            ))))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Self::decode(Self::check(response).await?).await
    }
}
