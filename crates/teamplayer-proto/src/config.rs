use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;
use crate::records::StationId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root of the TeamPlayer web app; every API path is joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Push feed address.  The client does not connect to it itself; it is
    /// logged so a bridge can be pointed at it.
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    /// Django session cookie value, sent as `sessionid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_home_station")]
    pub home_station_id: StationId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_view")]
    pub default_view: String,
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
    /// Overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            websocket_url: default_websocket_url(),
            session_id: None,
            username: String::new(),
            home_station_id: default_home_station(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_view: default_view(),
            max_notifications: default_max_notifications(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/".to_string()
}

fn default_websocket_url() -> String {
    "ws://localhost:8097/".to_string()
}

fn default_home_station() -> StationId {
    1
}

fn default_view() -> String {
    "queue".to_string()
}

fn default_max_notifications() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_file() -> PathBuf {
    platform::data_dir().join("client.log")
}

fn default_log_filter() -> String {
    // Suppress connection-level DEBUG from the HTTP client internals.
    "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing {}", config_path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        // Relative API paths only join correctly onto a directory-style base.
        if !config.server.base_url.ends_with('/') {
            config.server.base_url.push('/');
        }
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
