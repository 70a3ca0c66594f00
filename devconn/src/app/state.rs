//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::activity::manager::ActivityManager;
use crate::app::options::AppOptions;
use crate::connectivity::service::DeviceConnectivityService;
use crate::errors::ConnectivityError;
use crate::filesys::file::File;
use crate::storage::registry::InMemoryRegistry;

/// Main application state
pub struct AppState {
    /// Devices, profiles, credentials and admin settings
    pub registry: Arc<InMemoryRegistry>,

    /// Connectivity service
    pub connectivity: Arc<DeviceConnectivityService>,

    /// Device activity tracking
    pub activity: Arc<ActivityManager>,
}

impl AppState {
    /// Initialize application state, loading the registry file
    pub async fn init(options: &AppOptions) -> Result<Self, ConnectivityError> {
        info!("Initializing application state...");

        let registry_file = match &options.storage.registry_file {
            Some(path) => File::new(path),
            None => options.storage.layout.registry_file(),
        };
        let registry = Arc::new(InMemoryRegistry::load(&registry_file).await?);

        Ok(Self::with_registry(options, registry))
    }

    /// Build application state around an existing registry
    pub fn with_registry(options: &AppOptions, registry: Arc<InMemoryRegistry>) -> Self {
        let connectivity = Arc::new(DeviceConnectivityService::new(
            options.connectivity.clone(),
            registry.clone(),
            registry.clone(),
            registry.clone(),
        ));
        let activity = Arc::new(ActivityManager::new(options.activity_strategy));

        Self {
            registry,
            connectivity,
            activity,
        }
    }
}
