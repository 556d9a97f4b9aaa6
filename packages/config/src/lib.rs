// ABOUTME: Typed configuration loader for the Daytona sandbox provider
// ABOUTME: Reads credentials from the environment, warning on absence instead of failing

pub mod constants;

use tracing::{debug, warn};

/// Connection settings for the Daytona sandbox provider.
///
/// Missing values are tolerated at load time: the client is constructed
/// regardless and the first real provider call surfaces the failure.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: String,
    pub server_url: String,
    pub target: String,
}

impl ProviderConfig {
    pub fn new(api_key: String, server_url: String, target: String) -> Self {
        Self {
            api_key,
            server_url,
            target,
        }
    }

    /// Load provider settings from the process environment.
    pub fn from_env() -> Self {
        let api_key = env_or_empty(constants::DAYTONA_API_KEY);
        let server_url = env_or_empty(constants::DAYTONA_SERVER_URL);
        let target = env_or_empty(constants::DAYTONA_TARGET);

        if api_key.is_empty() {
            warn!("No Daytona API key found in environment variables");
        } else {
            debug!("Daytona API key configured successfully");
        }

        if server_url.is_empty() {
            warn!("No Daytona server URL found in environment variables");
        } else {
            debug!(%server_url, "Daytona server URL configured");
        }

        if target.is_empty() {
            warn!("No Daytona target found in environment variables");
        } else {
            debug!(%target, "Daytona target configured");
        }

        Self {
            api_key,
            server_url,
            target,
        }
    }

    /// True when every field required for a live API call is present.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.server_url.is_empty() && !self.target.is_empty()
    }
}

fn env_or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
