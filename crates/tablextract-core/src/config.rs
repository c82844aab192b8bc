use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TableExtractError;

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 800;
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Settings for the (not yet wired) remote request layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "/api".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub content_type: String,
}

impl Default for UploadLimits {
    fn default() -> Self {
        UploadLimits {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            content_type: PDF_CONTENT_TYPE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    /// Simulator tick period in milliseconds.
    pub tick_interval_ms: u64,
    pub upload: UploadLimits,
    /// Custom fixtures file; the built-in demo set is used when unset.
    pub fixtures: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig::default(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            upload: UploadLimits::default(),
            fixtures: None,
        }
    }
}

impl AppConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Load configuration from a JSON file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<AppConfig, TableExtractError> {
    let content = std::fs::read_to_string(path).map_err(|e| TableExtractError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let config: AppConfig =
        serde_json::from_str(&content).map_err(|e| TableExtractError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if config.tick_interval_ms == 0 {
        return Err(TableExtractError::ConfigLoad {
            path: path.to_path_buf(),
            reason: "tick_interval_ms must be greater than zero".into(),
        });
    }

    Ok(config)
}
