//! Application configuration options

use std::time::Duration;

use crate::activity::strategy::ActivityStrategyType;
use crate::connectivity::options::ConnectivityOptions;
use crate::storage::layout::StorageLayout;
use crate::storage::settings::Settings;
use crate::workers::activity;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Public base URL used in generated commands
    pub base_url: Option<String>,

    /// Connectivity configuration
    pub connectivity: ConnectivityOptions,

    /// Strategy used to report device activity
    pub activity_strategy: ActivityStrategyType,

    /// Enable the activity worker
    pub enable_activity_worker: bool,

    /// Activity worker options
    pub activity_worker: activity::Options,
}

impl AppOptions {
    /// Build options from a settings file and storage layout
    pub fn from_settings(settings: &Settings, layout: StorageLayout) -> Self {
        let registry_file = settings
            .registry_file
            .clone()
            .unwrap_or_else(|| layout.registry_file().path().to_path_buf());
        Self {
            storage: StorageOptions {
                layout,
                registry_file: Some(registry_file),
            },
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            base_url: settings.base_url.clone(),
            connectivity: settings.connectivity.clone(),
            activity_strategy: settings.activity.strategy,
            enable_activity_worker: settings.activity.enabled,
            activity_worker: activity::Options {
                reporting_period: Duration::from_secs(settings.activity.reporting_period_secs.max(1)),
            },
            ..Default::default()
        }
    }
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            storage: StorageOptions::default(),
            server: ServerOptions::default(),
            base_url: None,
            connectivity: ConnectivityOptions::default(),
            activity_strategy: ActivityStrategyType::Last,
            enable_activity_worker: true,
            activity_worker: activity::Options::default(),
        }
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,

    /// Registry file, the layout's `registry.json` when unset
    pub registry_file: Option<std::path::PathBuf>,
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}
