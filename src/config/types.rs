use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Identifier attached to single-transaction submissions.
    #[serde(default = "default_user_id")]
    pub default_user_id: String,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(Error::config("service.base_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("service.timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_export_file_name() -> String {
    "fraud_detection_results.csv".to_string()
}

fn default_user_id() -> String {
    "1234".to_string()
}
