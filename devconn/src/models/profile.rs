//! Device profiles and their transport configuration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connectivity::protocol::DEFAULT_DEVICE_TELEMETRY_TOPIC;
use crate::models::ids::{DeviceProfileId, TenantId};

/// Transport a device profile is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceTransportType {
    Default,
    Mqtt,
    Coap,
    Lwm2m,
    Snmp,
}

impl DeviceTransportType {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceTransportType::Default => "DEFAULT",
            DeviceTransportType::Mqtt => "MQTT",
            DeviceTransportType::Coap => "COAP",
            DeviceTransportType::Lwm2m => "LWM2M",
            DeviceTransportType::Snmp => "SNMP",
        }
    }
}

impl fmt::Display for DeviceTransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// MQTT specific profile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttTransportConfiguration {
    #[serde(default)]
    pub sparkplug: bool,

    #[serde(default = "default_telemetry_topic")]
    pub device_telemetry_topic: String,
}

fn default_telemetry_topic() -> String {
    DEFAULT_DEVICE_TELEMETRY_TOPIC.to_string()
}

impl Default for MqttTransportConfiguration {
    fn default() -> Self {
        Self {
            sparkplug: false,
            device_telemetry_topic: default_telemetry_topic(),
        }
    }
}

/// Transport configuration carried by a profile.
///
/// Only MQTT has settings that influence the publish commands; every other
/// transport is opaque here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportConfiguration {
    Default,
    Mqtt(MqttTransportConfiguration),
    Coap,
    Lwm2m,
    Snmp,
}

/// Device profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    pub id: DeviceProfileId,

    pub tenant_id: TenantId,

    pub name: String,

    pub transport_configuration: TransportConfiguration,
}

impl DeviceProfile {
    pub fn transport_type(&self) -> DeviceTransportType {
        match self.transport_configuration {
            TransportConfiguration::Default => DeviceTransportType::Default,
            TransportConfiguration::Mqtt(_) => DeviceTransportType::Mqtt,
            TransportConfiguration::Coap => DeviceTransportType::Coap,
            TransportConfiguration::Lwm2m => DeviceTransportType::Lwm2m,
            TransportConfiguration::Snmp => DeviceTransportType::Snmp,
        }
    }
}
