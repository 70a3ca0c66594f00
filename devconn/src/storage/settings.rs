//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::activity::strategy::ActivityStrategyType;
use crate::connectivity::options::ConnectivityOptions;
use crate::logs::LogLevel;

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON formatted logs
    #[serde(default)]
    pub log_json: bool,

    /// Also write daily rolling log files under the storage logs directory
    #[serde(default)]
    pub log_to_file: bool,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Public base URL used in generated commands, derived from the request when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Registry file, `registry.json` under the storage directory when unset
    #[serde(default)]
    pub registry_file: Option<PathBuf>,

    /// Connectivity configuration
    #[serde(default)]
    pub connectivity: ConnectivityOptions,

    /// Activity reporting configuration
    #[serde(default)]
    pub activity: ActivitySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_to_file: false,
            server: ServerSettings::default(),
            base_url: None,
            registry_file: None,
            connectivity: ConnectivityOptions::default(),
            activity: ActivitySettings::default(),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

/// Activity reporting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySettings {
    /// Enable the activity reporting worker
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Which activity events are reported
    #[serde(default = "default_strategy")]
    pub strategy: ActivityStrategyType,

    /// Reporting period in seconds
    #[serde(default = "default_reporting_period")]
    pub reporting_period_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_strategy() -> ActivityStrategyType {
    ActivityStrategyType::Last
}

fn default_reporting_period() -> u64 {
    10
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: default_strategy(),
            reporting_period_secs: default_reporting_period(),
        }
    }
}
