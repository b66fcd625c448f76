use serde::{Deserialize, Serialize};
use songframe_editor::{ControllerConfig, Fixtures, UNTITLED};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_NAME: &str = "songframe.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Host configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Quiet period before an edit is written
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    /// Title shown for documents without one
    #[serde(default = "default_untitled_title")]
    pub untitled_title: String,

    /// Inbound queue depth between the transport and the bridge
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Remote store; the in-memory gateway is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,

    /// JSON seed data for the in-memory gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: String,
    /// Public key sent as `apikey`
    pub anon_key: String,
}

fn default_save_debounce_ms() -> u64 {
    900
}

fn default_untitled_title() -> String {
    UNTITLED.to_string()
}

fn default_channel_capacity() -> usize {
    100
}

fn default_log_filter() -> String {
    "songframe=info".to_string()
}

impl BridgeConfig {
    /// Load config from a directory, falling back to defaults
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load an explicitly named config file; it must exist
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            save_delay: self.save_delay(),
            untitled_title: self.untitled_title.clone(),
        }
    }

    /// Seed data for the in-memory gateway; empty when none is configured
    pub fn load_fixtures(&self) -> Result<Fixtures, ConfigError> {
        let Some(path) = &self.fixtures else {
            return Ok(Fixtures::default());
        };
        let content = read(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: default_save_debounce_ms(),
            untitled_title: default_untitled_title(),
            channel_capacity: default_channel_capacity(),
            log_filter: default_log_filter(),
            backend: None,
            fixtures: None,
        }
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
