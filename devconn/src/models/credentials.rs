//! Device credentials

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::models::ids::DeviceId;

/// How a device authenticates against the transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceCredentialsType {
    AccessToken,
    X509Certificate,
    MqttBasic,
    Lwm2mCredentials,
}

/// Credentials stored for a device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    pub device_id: DeviceId,

    pub credentials_type: DeviceCredentialsType,

    /// Access token for `ACCESS_TOKEN`, certificate hash for `X509_CERTIFICATE`
    #[serde(default)]
    pub credentials_id: String,

    /// JSON-encoded `BasicMqttCredentials` for `MQTT_BASIC`, PEM for X.509
    #[serde(default)]
    pub credentials_value: Option<String>,
}

impl DeviceCredentials {
    pub fn access_token(device_id: DeviceId, token: impl Into<String>) -> Self {
        Self {
            device_id,
            credentials_type: DeviceCredentialsType::AccessToken,
            credentials_id: token.into(),
            credentials_value: None,
        }
    }

    /// Decode the MQTT basic credentials, `None` when absent or malformed
    pub fn basic_mqtt(&self) -> Option<BasicMqttCredentials> {
        let value = self.credentials_value.as_deref()?;
        serde_json::from_str(value).ok()
    }
}

/// Client id / user name / password triple for `MQTT_BASIC` credentials
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMqttCredentials {
    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,
}

impl BasicMqttCredentials {
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.expose_secret())
    }
}
