use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{AppError, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "autoeda.toml";

/// Environment variable prefix, e.g. `AUTOEDA_PORT=8080`
pub const ENV_PREFIX: &str = "AUTOEDA_";

/// Process-wide settings, built once at startup and handed to the server
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// Directory holding uploads while they are processed
    #[validate(length(min = 1))]
    pub upload_dir: String,

    /// Where the generated report is written (overwritten per request)
    #[validate(length(min = 1))]
    pub report_path: String,

    #[validate(range(min = 1))]
    pub max_upload_bytes: usize,

    /// Default tracing filter when RUST_LOG is not set
    #[validate(length(min = 1))]
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_dir: "uploads".to_string(),
            report_path: "reports/report.html".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file (if present), then `AUTOEDA_*` variables
    pub fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load config: {}", e)))?;
        config
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid config: {}", e)))?;
        Ok(config)
    }

    /// Load `.env`, then resolve the config file from `AUTOEDA_CONFIG`
    /// or fall back to `autoeda.toml`
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let config_file = std::env::var(format!("{}CONFIG", ENV_PREFIX))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&config_file))
    }

    pub fn upload_dir(&self) -> PathBuf {
        PathBuf::from(&self.upload_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        PathBuf::from(&self.report_path)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
