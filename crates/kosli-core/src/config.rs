//! Settings for fingerprinting that talks to the outside world.

use serde::{Deserialize, Serialize};

const DEFAULT_USER_AGENT: &str = concat!("kosli-core/", env!("CARGO_PKG_VERSION"));

/// Configuration for registry and container-engine lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Registry request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent sent to registries.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Container engine binary used for local images.
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            docker_bin: default_docker_bin(),
        }
    }
}

impl FingerprintConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `KOSLI_REGISTRY_TIMEOUT` | Registry request timeout in seconds (default: 30) |
    /// | `KOSLI_DOCKER_BIN` | Container engine binary (default: `docker`) |
    pub fn from_env() -> Self {
        Self {
            timeout_secs: std::env::var("KOSLI_REGISTRY_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            user_agent: default_user_agent(),
            docker_bin: std::env::var("KOSLI_DOCKER_BIN")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(default_docker_bin),
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the container engine binary.
    pub fn with_docker_bin(mut self, docker_bin: impl Into<String>) -> Self {
        self.docker_bin = docker_bin.into();
        self
    }
}
