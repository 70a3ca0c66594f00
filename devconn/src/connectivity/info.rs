//! Per-protocol connectivity settings

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::connectivity::protocol::Protocol;

/// Host/port advertised to clients for one protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConnectivityInfo {
    #[serde(default)]
    pub enabled: bool,

    /// Host advertised to clients, base URL host when blank
    #[serde(default)]
    pub host: String,

    #[serde(default, deserialize_with = "port_as_string")]
    pub port: String,
}

impl DeviceConnectivityInfo {
    pub fn new(enabled: bool, host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            enabled,
            host: host.into(),
            port: port.into(),
        }
    }
}

/// Ports are strings in the settings blob, but numbers are accepted as well
fn port_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
        Null(()),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
        Port::Null(()) => String::new(),
    })
}

/// The `connectivity` admin settings blob, keyed by protocol name
#[derive(Debug, Clone, Default)]
pub struct ConnectivitySettings {
    entries: HashMap<String, serde_json::Value>,
}

impl ConnectivitySettings {
    /// Wrap the raw JSON blob; anything but an object yields empty settings
    pub fn from_json(value: &serde_json::Value) -> Self {
        let entries = match value.as_object() {
            Some(object) => object
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => {
                warn!("Connectivity settings are not a JSON object, ignoring");
                HashMap::new()
            }
        };
        Self { entries }
    }

    /// Settings for `protocol`, `None` when missing or malformed
    pub fn get(&self, protocol: Protocol) -> Option<DeviceConnectivityInfo> {
        let value = self.entries.get(protocol.as_str())?;
        match serde_json::from_value(value.clone()) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Malformed connectivity settings for {}: {}", protocol, e);
                None
            }
        }
    }

    pub fn is_enabled(&self, protocol: Protocol) -> bool {
        self.get(protocol).map(|info| info.enabled).unwrap_or(false)
    }
}
