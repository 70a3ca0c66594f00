//! Server state

use std::sync::Arc;

use crate::activity::manager::ActivityManager;
use crate::connectivity::service::DeviceConnectivityService;
use crate::storage::stores::DeviceStore;

/// Server state shared across handlers
pub struct ServerState {
    pub connectivity: Arc<DeviceConnectivityService>,
    pub devices: Arc<dyn DeviceStore>,
    pub activity: Arc<ActivityManager>,

    /// Public base URL, derived from request headers when unset
    pub base_url: Option<String>,
}

impl ServerState {
    pub fn new(
        connectivity: Arc<DeviceConnectivityService>,
        devices: Arc<dyn DeviceStore>,
        activity: Arc<ActivityManager>,
        base_url: Option<String>,
    ) -> Self {
        Self {
            connectivity,
            devices,
            activity,
            base_url,
        }
    }
}
