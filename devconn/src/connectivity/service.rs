//! Device connectivity service

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::fs;
use tracing::{trace, warn};

use crate::cache::certs::CertCache;
use crate::connectivity::cert::load_pem_file;
use crate::connectivity::commands::{
    coap_publish_command, curl_pem_cert_command, docker_coap_publish_command,
    docker_mqtt_publish_command, get_host, get_port, http_publish_command, mqtt_publish_command,
    port_from_base_url,
};
use crate::connectivity::compose::gateway_docker_compose_file;
use crate::connectivity::info::{ConnectivitySettings, DeviceConnectivityInfo};
use crate::connectivity::options::{ConnectivityOptions, PortMode};
use crate::connectivity::protocol::{
    Protocol, CHECK_DOCUMENTATION, CONNECTIVITY_SETTINGS_KEY, DEFAULT_DEVICE_TELEMETRY_TOPIC,
    DOCKER, HTTPS_DEFAULT_PORT, HTTP_DEFAULT_PORT,
};
use crate::connectivity::resource::Resource;
use crate::errors::ConnectivityError;
use crate::models::credentials::{DeviceCredentials, DeviceCredentialsType};
use crate::models::device::Device;
use crate::models::ids::{validate_id, TenantId};
use crate::models::profile::{DeviceProfile, TransportConfiguration};
use crate::storage::stores::{AdminSettingsStore, CredentialsStore, DeviceProfileStore};

pub const INCORRECT_TENANT_ID: &str = "Incorrect tenantId ";
pub const INCORRECT_DEVICE_ID: &str = "Incorrect deviceId ";

/// Base URL port of a local docker deployment that publishes the transports
/// on shifted host ports
const LOCAL_DEPLOYMENT_BASE_URL_PORT: &str = "18080";

/// Builds connection instructions for devices and gateways
pub struct DeviceConnectivityService {
    options: ConnectivityOptions,
    credentials: Arc<dyn CredentialsStore>,
    profiles: Arc<dyn DeviceProfileStore>,
    admin_settings: Arc<dyn AdminSettingsStore>,
    certs: CertCache,
}

impl DeviceConnectivityService {
    pub fn new(
        options: ConnectivityOptions,
        credentials: Arc<dyn CredentialsStore>,
        profiles: Arc<dyn DeviceProfileStore>,
        admin_settings: Arc<dyn AdminSettingsStore>,
    ) -> Self {
        Self {
            options,
            credentials,
            profiles,
            admin_settings,
            certs: CertCache::new(),
        }
    }

    pub fn options(&self) -> &ConnectivityOptions {
        &self.options
    }

    /// Publish commands for `device`, grouped by transport protocol
    pub async fn find_device_publish_telemetry_commands(
        &self,
        base_url: &str,
        device: &Device,
    ) -> Result<Map<String, Value>, ConnectivityError> {
        trace!("Executing find_device_publish_telemetry_commands [{}]", device.id);
        validate_device(device)?;

        let creds = self.find_credentials(device).await?;
        let profile = self.find_profile(device).await?;
        let settings = self.connectivity_settings().await?;

        let mut commands = Map::new();
        match &profile.transport_configuration {
            TransportConfiguration::Default => {
                if let Some(http) = self.http_transport_commands(base_url, &settings, &creds) {
                    commands.insert(Protocol::Http.to_string(), http);
                }
                if let Some(mqtt) = self.mqtt_transport_commands(
                    base_url,
                    DEFAULT_DEVICE_TELEMETRY_TOPIC,
                    &settings,
                    &creds,
                ) {
                    commands.insert(Protocol::Mqtt.to_string(), mqtt);
                }
                if let Some(coap) = self.coap_transport_commands(base_url, &settings, &creds) {
                    commands.insert(Protocol::Coap.to_string(), coap);
                }
            }
            TransportConfiguration::Mqtt(mqtt_config) => {
                if mqtt_config.sparkplug {
                    commands.insert(
                        Protocol::Mqtt.to_string(),
                        json!({ "sparkplug": CHECK_DOCUMENTATION }),
                    );
                } else if let Some(mqtt) = self.mqtt_transport_commands(
                    base_url,
                    &mqtt_config.device_telemetry_topic,
                    &settings,
                    &creds,
                ) {
                    commands.insert(Protocol::Mqtt.to_string(), mqtt);
                }
            }
            TransportConfiguration::Coap => {
                if let Some(coap) = self.coap_transport_commands(base_url, &settings, &creds) {
                    commands.insert(Protocol::Coap.to_string(), coap);
                }
            }
            TransportConfiguration::Lwm2m | TransportConfiguration::Snmp => {
                commands.insert(
                    profile.transport_type().name().to_string(),
                    Value::String(CHECK_DOCUMENTATION.to_string()),
                );
            }
        }
        Ok(commands)
    }

    /// Server certificate chain for `protocol`, loaded once and memoized.
    ///
    /// Only `mqtts` with stored connectivity settings has a certificate;
    /// anything else is logged and yields `None`.
    pub async fn get_pem_cert_file(
        &self,
        protocol: &str,
    ) -> Result<Option<Arc<Resource>>, ConnectivityError> {
        self.certs
            .get_or_try_load(protocol, || self.load_pem_cert_file(protocol))
            .await
    }

    async fn load_pem_cert_file(&self, protocol: &str) -> Result<Option<Resource>, ConnectivityError> {
        let connectivity = match protocol.parse::<Protocol>() {
            Ok(Protocol::Mqtts) => self.connectivity_settings().await?.get(Protocol::Mqtts),
            _ => None,
        };
        if connectivity.is_none() {
            warn!("Unknown connectivity protocol: {}", protocol);
            return Ok(None);
        }

        let path = match &self.options.mqtts_pem_cert_file {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Ok(None),
        };
        if !fs::try_exists(path).await.unwrap_or(false) {
            return Ok(None);
        }

        match load_pem_file(path).await {
            Ok(cert) => Ok(Some(cert)),
            Err(e) => {
                let msg = format!("Failed to read {} server certificate!", protocol);
                warn!("{} {}", msg, e);
                Err(ConnectivityError::certificate(msg, e))
            }
        }
    }

    /// Compose file launching the IoT gateway for `device`
    pub async fn create_gateway_docker_compose_file(
        &self,
        base_url: &str,
        device: &Device,
    ) -> Result<Resource, ConnectivityError> {
        trace!("Executing create_gateway_docker_compose_file [{}]", device.id);
        validate_device(device)?;

        let settings = self.connectivity_settings().await?;
        let mqtt_type = if settings.is_enabled(Protocol::Mqtts) {
            Protocol::Mqtts
        } else {
            Protocol::Mqtt
        };
        let info = settings.get(mqtt_type);
        let creds = self.find_credentials(device).await?;

        let host = get_host(base_url, info.as_ref(), mqtt_type);
        let mut port = get_port(info.as_ref());
        if port.is_empty() {
            if let Some(binding) = self.options.transport.get(mqtt_type) {
                port = binding.bind_port.to_string();
            }
        }
        Ok(gateway_docker_compose_file(&host, &port, &creds, mqtt_type))
    }

    /// Whether stored connectivity settings enable `protocol`
    pub async fn is_enabled(&self, protocol: &str) -> Result<bool, ConnectivityError> {
        let Ok(protocol) = protocol.parse::<Protocol>() else {
            return Ok(false);
        };
        Ok(self.connectivity_settings().await?.is_enabled(protocol))
    }

    async fn connectivity_settings(&self) -> Result<ConnectivitySettings, ConnectivityError> {
        let value = self
            .admin_settings
            .find_admin_settings_by_key(&TenantId::SYS_TENANT_ID, CONNECTIVITY_SETTINGS_KEY)
            .await?;
        Ok(value
            .map(|v| ConnectivitySettings::from_json(&v))
            .unwrap_or_default())
    }

    async fn find_credentials(&self, device: &Device) -> Result<DeviceCredentials, ConnectivityError> {
        self.credentials
            .find_device_credentials_by_device_id(&device.tenant_id, &device.id)
            .await?
            .ok_or_else(|| {
                ConnectivityError::NotFound(format!("Credentials of device {}", device.id))
            })
    }

    async fn find_profile(&self, device: &Device) -> Result<DeviceProfile, ConnectivityError> {
        self.profiles
            .find_device_profile_by_id(&device.tenant_id, &device.device_profile_id)
            .await?
            .ok_or_else(|| {
                ConnectivityError::NotFound(format!("Device profile {}", device.device_profile_id))
            })
    }

    // ================================ HTTP ================================== //

    fn http_transport_commands(
        &self,
        base_url: &str,
        settings: &ConnectivitySettings,
        creds: &DeviceCredentials,
    ) -> Option<Value> {
        let mut commands = Map::new();
        for protocol in [Protocol::Http, Protocol::Https] {
            if let Some(command) = self.http_publish_command(protocol, base_url, settings, creds) {
                commands.insert(protocol.to_string(), Value::String(command));
            }
        }
        non_empty(commands)
    }

    fn http_publish_command(
        &self,
        protocol: Protocol,
        base_url: &str,
        settings: &ConnectivitySettings,
        creds: &DeviceCredentials,
    ) -> Option<String> {
        let info = settings.get(protocol).filter(|info| info.enabled)?;
        if creds.credentials_type != DeviceCredentialsType::AccessToken {
            return None;
        }

        let host = get_host(base_url, Some(&info), protocol);
        let port = match self.options.port_mode {
            PortMode::Settings => {
                let port = get_port(Some(&info));
                if port.is_empty() || port == HTTP_DEFAULT_PORT || port == HTTPS_DEFAULT_PORT {
                    String::new()
                } else {
                    format!(":{}", port)
                }
            }
            PortMode::BindPort => format!(":{}", port_from_base_url(base_url)),
        };
        http_publish_command(protocol, &host, &port, creds)
    }

    // ================================ MQTT ================================== //

    fn mqtt_transport_commands(
        &self,
        base_url: &str,
        topic: &str,
        settings: &ConnectivitySettings,
        creds: &DeviceCredentials,
    ) -> Option<Value> {
        let mut commands = Map::new();

        if creds.credentials_type == DeviceCredentialsType::X509Certificate {
            commands.insert(
                Protocol::Mqtts.to_string(),
                Value::String(CHECK_DOCUMENTATION.to_string()),
            );
            return Some(Value::Object(commands));
        }

        let mut docker_commands = Map::new();

        if self.is_transport_enabled(Protocol::Mqtt, settings) {
            let info = settings.get(Protocol::Mqtt);
            let host = get_host(base_url, info.as_ref(), Protocol::Mqtt);
            let port = self.transport_port(Protocol::Mqtt, base_url, info.as_ref());

            if let Some(command) = mqtt_publish_command(Protocol::Mqtt, &host, Some(&port), topic, creds) {
                commands.insert(Protocol::Mqtt.to_string(), Value::String(command));
            }
            if let Some(command) = docker_mqtt_publish_command(
                Protocol::Mqtt,
                base_url,
                &host,
                Some(&port),
                topic,
                creds,
            ) {
                docker_commands.insert(Protocol::Mqtt.to_string(), Value::String(command));
            }
        }

        if self.is_transport_enabled(Protocol::Mqtts, settings) {
            let info = settings.get(Protocol::Mqtts);
            let host = get_host(base_url, info.as_ref(), Protocol::Mqtts);
            let port = self.transport_port(Protocol::Mqtts, base_url, info.as_ref());

            if let Some(command) = mqtt_publish_command(Protocol::Mqtts, &host, Some(&port), topic, creds) {
                commands.insert(
                    Protocol::Mqtts.to_string(),
                    json!([curl_pem_cert_command(base_url, Protocol::Mqtts), command]),
                );
            }
            if let Some(command) = docker_mqtt_publish_command(
                Protocol::Mqtts,
                base_url,
                &host,
                Some(&port),
                topic,
                creds,
            ) {
                docker_commands.insert(Protocol::Mqtts.to_string(), Value::String(command));
            }
        }

        if !docker_commands.is_empty() {
            commands.insert(DOCKER.to_string(), Value::Object(docker_commands));
        }
        non_empty(commands)
    }

    // ================================ CoAP ================================== //

    fn coap_transport_commands(
        &self,
        base_url: &str,
        settings: &ConnectivitySettings,
        creds: &DeviceCredentials,
    ) -> Option<Value> {
        let mut commands = Map::new();

        if creds.credentials_type == DeviceCredentialsType::X509Certificate {
            commands.insert(
                Protocol::Coaps.to_string(),
                Value::String(CHECK_DOCUMENTATION.to_string()),
            );
            return Some(Value::Object(commands));
        }

        let mut docker_commands = Map::new();

        for protocol in [Protocol::Coap, Protocol::Coaps] {
            if !self.is_transport_enabled(protocol, settings) {
                continue;
            }
            let info = settings.get(protocol);
            let host = get_host(base_url, info.as_ref(), protocol);
            let port = self.transport_port(protocol, base_url, info.as_ref());
            let port = if port.is_empty() {
                port
            } else {
                format!(":{}", port)
            };

            if let Some(command) = coap_publish_command(protocol, &host, &port, creds) {
                commands.insert(protocol.to_string(), Value::String(command));
            }
            if let Some(command) = docker_coap_publish_command(protocol, &host, &port, creds) {
                docker_commands.insert(protocol.to_string(), Value::String(command));
            }
        }

        if !docker_commands.is_empty() {
            commands.insert(DOCKER.to_string(), Value::Object(docker_commands));
        }
        non_empty(commands)
    }

    // =============================== Ports ================================== //

    fn is_transport_enabled(&self, protocol: Protocol, settings: &ConnectivitySettings) -> bool {
        match self.options.port_mode {
            PortMode::Settings => settings.is_enabled(protocol),
            PortMode::BindPort => self
                .options
                .transport
                .get(protocol)
                .map(|binding| binding.enabled)
                .unwrap_or(false),
        }
    }

    /// Port of an MQTT/CoAP transport, without the `:` prefix; may be empty
    fn transport_port(
        &self,
        protocol: Protocol,
        base_url: &str,
        info: Option<&DeviceConnectivityInfo>,
    ) -> String {
        match self.options.port_mode {
            PortMode::Settings => get_port(info),
            PortMode::BindPort => {
                let port = self
                    .options
                    .transport
                    .get(protocol)
                    .map(|binding| binding.bind_port.to_string())
                    .unwrap_or_default();
                remap_local_deployment_port(port, base_url)
            }
        }
    }
}

/// A local docker deployment serving the UI on 18080 publishes the plain MQTT
/// and CoAP listeners on 11883 and 15683
fn remap_local_deployment_port(port: String, base_url: &str) -> String {
    if port_from_base_url(base_url) != LOCAL_DEPLOYMENT_BASE_URL_PORT {
        return port;
    }
    match port.as_str() {
        "1883" => "11883".to_string(),
        "5683" => "15683".to_string(),
        _ => port,
    }
}

fn validate_device(device: &Device) -> Result<(), ConnectivityError> {
    validate_id(&device.tenant_id, |id| format!("{}{}", INCORRECT_TENANT_ID, id))?;
    validate_id(&device.id, |id| format!("{}{}", INCORRECT_DEVICE_ID, id))
}

fn non_empty(commands: Map<String, Value>) -> Option<Value> {
    if commands.is_empty() {
        None
    } else {
        Some(Value::Object(commands))
    }
}
