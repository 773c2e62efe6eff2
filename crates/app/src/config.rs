use std::path::{Path, PathBuf};

use kahu_rules::IgnoreRuleSpec;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config field {0:?} must be set")]
    Missing(&'static str),
}

/// Run configuration, loaded once and passed into each component.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub spreadsheet_id: String,
    pub akahu_user_token: String,
    pub akahu_app_token: String,
    /// Service-account key path; `GOOGLE_APPLICATION_CREDENTIALS` wins
    /// when set.
    #[serde(default)]
    pub google_service_file: Option<PathBuf>,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    #[serde(default = "default_transactions_tab")]
    pub transactions_tab: String,
    #[serde(default = "default_category_map_tab")]
    pub category_map_tab: String,
    #[serde(default)]
    pub perform_reconciliation: bool,
    #[serde(default)]
    pub ignore_rules: Vec<IgnoreRuleSpec>,
}

fn default_lookback_days() -> u32 {
    7
}

fn default_state_file() -> PathBuf {
    PathBuf::from("sync_state.json")
}

fn default_transactions_tab() -> String {
    "Transactions".to_string()
}

fn default_category_map_tab() -> String {
    "CategoryMap".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Missing("spreadsheet_id"));
        }
        if self.akahu_user_token.trim().is_empty() {
            return Err(ConfigError::Missing("akahu_user_token"));
        }
        if self.akahu_app_token.trim().is_empty() {
            return Err(ConfigError::Missing("akahu_app_token"));
        }
        Ok(())
    }

    /// Resolve the service-account key path. Must succeed before any
    /// network call is made.
    pub fn credentials_path(&self) -> Result<PathBuf, ConfigError> {
        if let Ok(path) = std::env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        self.google_service_file
            .clone()
            .ok_or(ConfigError::Missing("google_service_file"))
    }
}
