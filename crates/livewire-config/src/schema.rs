use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default API base address when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LivewireConfig {
    pub api: ApiConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root address of the LiveWire server. The fixed `/api` segment is
    /// appended by the gateway, not configured here.
    pub base_url: String,

    /// Override the credentials file location (defaults to
    /// `~/.config/livewire/credentials.json`).
    pub credentials_path: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            credentials_path: None,
        }
    }
}
