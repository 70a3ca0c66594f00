//! Store ports consumed by the connectivity service

use async_trait::async_trait;

use crate::errors::ConnectivityError;
use crate::models::credentials::DeviceCredentials;
use crate::models::device::Device;
use crate::models::ids::{DeviceId, DeviceProfileId, TenantId};
use crate::models::profile::DeviceProfile;

#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Find a device by id
    async fn find_device_by_id(&self, device_id: &DeviceId) -> Result<Option<Device>, ConnectivityError>;
}

#[async_trait]
pub trait CredentialsStore: Send + Sync {
    /// Find the credentials of a device
    async fn find_device_credentials_by_device_id(
        &self,
        tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceCredentials>, ConnectivityError>;
}

#[async_trait]
pub trait DeviceProfileStore: Send + Sync {
    /// Find a device profile by id
    async fn find_device_profile_by_id(
        &self,
        tenant_id: &TenantId,
        profile_id: &DeviceProfileId,
    ) -> Result<Option<DeviceProfile>, ConnectivityError>;
}

#[async_trait]
pub trait AdminSettingsStore: Send + Sync {
    /// Find the JSON value stored under `key`
    async fn find_admin_settings_by_key(
        &self,
        tenant_id: &TenantId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, ConnectivityError>;
}
