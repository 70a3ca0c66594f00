//! Protocol names and the fixed vocabulary of the generated commands

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const HTTP: &str = "http";
pub const HTTPS: &str = "https";
pub const MQTT: &str = "mqtt";
pub const MQTTS: &str = "mqtts";
pub const COAP: &str = "coap";
pub const COAPS: &str = "coaps";
pub const DOCKER: &str = "docker";

/// Placeholder emitted where no command can be generated
pub const CHECK_DOCUMENTATION: &str = "Check documentation";

pub const DEFAULT_DEVICE_TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";
pub const PEM_CERT_FILE_NAME: &str = "tb-server-chain.pem";
pub const CA_ROOT_CERT_PEM: &str = "ca-root.pem";
pub const JSON_EXAMPLE_PAYLOAD: &str = "\"{temperature:25}\"";

pub const DOCKER_RUN: &str = "docker run --rm -it ";
pub const MQTT_IMAGE: &str = "thingsboard/mosquitto-clients ";
pub const COAP_IMAGE: &str = "thingsboard/coap-clients ";

pub const HTTP_DEFAULT_PORT: &str = "80";
pub const HTTPS_DEFAULT_PORT: &str = "443";

/// Port assumed when the base URL does not name one
pub const DEFAULT_BASE_URL_PORT: &str = "8080";

/// Admin settings key holding the per-protocol connectivity blob
pub const CONNECTIVITY_SETTINGS_KEY: &str = "connectivity";

/// Transport protocol a client can connect with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    Mqtt,
    Mqtts,
    Coap,
    Coaps,
}

impl Protocol {
    pub const ALL: [Protocol; 6] = [
        Protocol::Http,
        Protocol::Https,
        Protocol::Mqtt,
        Protocol::Mqtts,
        Protocol::Coap,
        Protocol::Coaps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => HTTP,
            Protocol::Https => HTTPS,
            Protocol::Mqtt => MQTT,
            Protocol::Mqtts => MQTTS,
            Protocol::Coap => COAP,
            Protocol::Coaps => COAPS,
        }
    }

    pub fn is_mqtt(&self) -> bool {
        matches!(self, Protocol::Mqtt | Protocol::Mqtts)
    }

    pub fn is_secure(&self) -> bool {
        matches!(self, Protocol::Https | Protocol::Mqtts | Protocol::Coaps)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names are matched exactly; `MQTTS` is not a known protocol
impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Protocol::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("Unknown protocol: {}", s))
    }
}
