//! In-memory registry of devices, profiles, credentials and admin settings

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::ConnectivityError;
use crate::filesys::file::File;
use crate::models::credentials::DeviceCredentials;
use crate::models::device::Device;
use crate::models::ids::{DeviceId, DeviceProfileId, TenantId};
use crate::models::profile::DeviceProfile;
use crate::storage::stores::{AdminSettingsStore, CredentialsStore, DeviceProfileStore, DeviceStore};

/// Registry file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryData {
    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub device_profiles: Vec<DeviceProfile>,

    #[serde(default)]
    pub credentials: Vec<DeviceCredentials>,

    /// System admin settings by key, e.g. `connectivity`
    #[serde(default)]
    pub admin_settings: HashMap<String, serde_json::Value>,
}

#[derive(Default)]
struct Entries {
    devices: HashMap<DeviceId, Device>,
    profiles: HashMap<DeviceProfileId, DeviceProfile>,
    credentials: HashMap<DeviceId, DeviceCredentials>,
    admin_settings: HashMap<String, serde_json::Value>,
}

/// Registry backing every store port
#[derive(Default)]
pub struct InMemoryRegistry {
    entries: RwLock<Entries>,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from its file contents
    pub fn from_data(data: RegistryData) -> Self {
        let registry = Self::new();
        for device in data.devices {
            registry.insert_device(device);
        }
        for profile in data.device_profiles {
            registry.insert_profile(profile);
        }
        for creds in data.credentials {
            registry.insert_credentials(creds);
        }
        for (key, value) in data.admin_settings {
            registry.save_admin_settings(&key, value);
        }
        registry
    }

    /// Load the registry file, an absent file yields an empty registry
    pub async fn load(file: &File) -> Result<Self, ConnectivityError> {
        if !file.exists().await {
            info!("Registry file {:?} not found, starting empty", file.path());
            return Ok(Self::new());
        }
        let data: RegistryData = file.read_json().await?;
        info!(
            "Loaded registry: {} devices, {} profiles, {} credentials",
            data.devices.len(),
            data.device_profiles.len(),
            data.credentials.len()
        );
        Ok(Self::from_data(data))
    }

    pub fn insert_device(&self, device: Device) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.devices.insert(device.id, device);
    }

    pub fn insert_profile(&self, profile: DeviceProfile) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.profiles.insert(profile.id, profile);
    }

    pub fn insert_credentials(&self, creds: DeviceCredentials) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.credentials.insert(creds.device_id, creds);
    }

    pub fn save_admin_settings(&self, key: &str, value: serde_json::Value) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.admin_settings.insert(key.to_string(), value);
    }

    pub fn remove_admin_settings(&self, key: &str) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.admin_settings.remove(key);
    }
}

#[async_trait]
impl DeviceStore for InMemoryRegistry {
    async fn find_device_by_id(&self, device_id: &DeviceId) -> Result<Option<Device>, ConnectivityError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.devices.get(device_id).cloned())
    }
}

#[async_trait]
impl CredentialsStore for InMemoryRegistry {
    async fn find_device_credentials_by_device_id(
        &self,
        _tenant_id: &TenantId,
        device_id: &DeviceId,
    ) -> Result<Option<DeviceCredentials>, ConnectivityError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.credentials.get(device_id).cloned())
    }
}

#[async_trait]
impl DeviceProfileStore for InMemoryRegistry {
    async fn find_device_profile_by_id(
        &self,
        tenant_id: &TenantId,
        profile_id: &DeviceProfileId,
    ) -> Result<Option<DeviceProfile>, ConnectivityError> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .profiles
            .get(profile_id)
            .filter(|p| p.tenant_id == *tenant_id)
            .cloned())
    }
}

#[async_trait]
impl AdminSettingsStore for InMemoryRegistry {
    async fn find_admin_settings_by_key(
        &self,
        tenant_id: &TenantId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, ConnectivityError> {
        if *tenant_id != TenantId::SYS_TENANT_ID {
            return Ok(None);
        }
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries.admin_settings.get(key).cloned())
    }
}
