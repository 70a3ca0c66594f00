//! Connectivity service configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::connectivity::protocol::Protocol;

/// Where MQTT/CoAP enablement and ports come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortMode {
    /// Transport bind configuration of this node; HTTP port from the base URL
    #[default]
    BindPort,

    /// Stored `connectivity` admin settings
    Settings,
}

/// A transport listener of this node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportBinding {
    #[serde(default)]
    pub enabled: bool,

    pub bind_port: u16,
}

impl TransportBinding {
    pub fn new(enabled: bool, bind_port: u16) -> Self {
        Self { enabled, bind_port }
    }
}

/// Listeners for the MQTT and CoAP transports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportBindings {
    #[serde(default = "default_mqtt")]
    pub mqtt: TransportBinding,

    #[serde(default = "default_mqtts")]
    pub mqtts: TransportBinding,

    #[serde(default = "default_coap")]
    pub coap: TransportBinding,

    #[serde(default = "default_coaps")]
    pub coaps: TransportBinding,
}

fn default_mqtt() -> TransportBinding {
    TransportBinding::new(true, 1883)
}

fn default_mqtts() -> TransportBinding {
    TransportBinding::new(false, 8883)
}

fn default_coap() -> TransportBinding {
    TransportBinding::new(true, 5683)
}

fn default_coaps() -> TransportBinding {
    TransportBinding::new(false, 5684)
}

impl Default for TransportBindings {
    fn default() -> Self {
        Self {
            mqtt: default_mqtt(),
            mqtts: default_mqtts(),
            coap: default_coap(),
            coaps: default_coaps(),
        }
    }
}

impl TransportBindings {
    /// Listener for `protocol`; HTTP is served by the web server and has none
    pub fn get(&self, protocol: Protocol) -> Option<&TransportBinding> {
        match protocol {
            Protocol::Mqtt => Some(&self.mqtt),
            Protocol::Mqtts => Some(&self.mqtts),
            Protocol::Coap => Some(&self.coap),
            Protocol::Coaps => Some(&self.coaps),
            Protocol::Http | Protocol::Https => None,
        }
    }
}

/// Options of `DeviceConnectivityService`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectivityOptions {
    /// PEM file served as the MQTTS server chain
    #[serde(default)]
    pub mqtts_pem_cert_file: Option<PathBuf>,

    #[serde(default)]
    pub port_mode: PortMode,

    #[serde(default)]
    pub transport: TransportBindings,
}
