//! Device records

use serde::{Deserialize, Serialize};

use crate::models::ids::{DeviceId, DeviceProfileId, TenantId};

/// A provisioned device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,

    pub tenant_id: TenantId,

    pub device_profile_id: DeviceProfileId,

    pub name: String,

    #[serde(default)]
    pub label: Option<String>,
}

impl Device {
    pub fn new(
        id: DeviceId,
        tenant_id: TenantId,
        device_profile_id: DeviceProfileId,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            device_profile_id,
            name: name.into(),
            label: None,
        }
    }
}
