//! Shell command builders for the publish instructions shown to users

use std::net::{IpAddr, Ipv6Addr};

use url::Url;

use crate::connectivity::info::DeviceConnectivityInfo;
use crate::connectivity::protocol::{
    Protocol, COAP_IMAGE, DEFAULT_BASE_URL_PORT, DOCKER_RUN, JSON_EXAMPLE_PAYLOAD, MQTT_IMAGE,
    PEM_CERT_FILE_NAME,
};
use crate::models::credentials::{DeviceCredentials, DeviceCredentialsType};

/// `curl` command posting sample telemetry over HTTP(S).
///
/// `port` is either empty or already prefixed with `:`. Only access tokens
/// can be expressed in the URL, other credentials yield `None`.
pub fn http_publish_command(
    protocol: Protocol,
    host: &str,
    port: &str,
    creds: &DeviceCredentials,
) -> Option<String> {
    if creds.credentials_type != DeviceCredentialsType::AccessToken {
        return None;
    }
    Some(format!(
        "curl -v -X POST {}://{}{}/api/v1/{}/telemetry --header Content-Type:application/json --data {}",
        protocol, host, port, creds.credentials_id, JSON_EXAMPLE_PAYLOAD
    ))
}

/// `mosquitto_pub` command publishing sample telemetry to `topic`
pub fn mqtt_publish_command(
    protocol: Protocol,
    host: &str,
    port: Option<&str>,
    topic: &str,
    creds: &DeviceCredentials,
) -> Option<String> {
    let mut command = String::from("mosquitto_pub -d -q 1");
    if protocol == Protocol::Mqtts {
        command.push_str(" --cafile ");
        command.push_str(PEM_CERT_FILE_NAME);
    }
    command.push_str(" -h ");
    command.push_str(host);
    if let Some(port) = port.filter(|p| !p.is_empty()) {
        command.push_str(" -p ");
        command.push_str(port);
    }
    command.push_str(" -t ");
    command.push_str(topic);

    match creds.credentials_type {
        DeviceCredentialsType::AccessToken => {
            command.push_str(" -u ");
            command.push_str(&creds.credentials_id);
        }
        DeviceCredentialsType::MqttBasic => {
            let basic = creds.basic_mqtt()?;
            if let Some(client_id) = &basic.client_id {
                command.push_str(" -i ");
                command.push_str(client_id);
            }
            if let Some(user_name) = &basic.user_name {
                command.push_str(" -u ");
                command.push_str(user_name);
            }
            if let Some(password) = basic.password() {
                command.push_str(" -P ");
                command.push_str(password);
            }
        }
        _ => return None,
    }

    command.push_str(" -m ");
    command.push_str(JSON_EXAMPLE_PAYLOAD);
    Some(command)
}

/// `mosquitto_pub` run inside the clients image; MQTTS fetches the server chain first
pub fn docker_mqtt_publish_command(
    protocol: Protocol,
    base_url: &str,
    host: &str,
    port: Option<&str>,
    topic: &str,
    creds: &DeviceCredentials,
) -> Option<String> {
    let mqtt_command = mqtt_publish_command(protocol, host, port, topic, creds)?;

    let mut command = String::from(DOCKER_RUN);
    if is_localhost(host) {
        command.push_str("--network=host ");
    }
    command.push_str(MQTT_IMAGE);

    if protocol == Protocol::Mqtts {
        command.push_str("/bin/sh -c \"");
        command.push_str(&curl_pem_cert_command(base_url, protocol));
        command.push_str(" && ");
        command.push_str(&mqtt_command);
        command.push('"');
    } else {
        command.push_str(&mqtt_command);
    }
    Some(command)
}

/// Downloads the server certificate chain next to the publish command
pub fn curl_pem_cert_command(base_url: &str, protocol: Protocol) -> String {
    format!(
        "curl -f -S -o {} {}/api/device-connectivity/{}/certificate/download",
        PEM_CERT_FILE_NAME,
        base_url.trim_end_matches('/'),
        protocol
    )
}

/// `coap-client` command; `port` is either empty or prefixed with `:`
pub fn coap_publish_command(
    protocol: Protocol,
    host: &str,
    port: &str,
    creds: &DeviceCredentials,
) -> Option<String> {
    match creds.credentials_type {
        DeviceCredentialsType::AccessToken => {
            let client = if protocol == Protocol::Coaps {
                "coap-client-openssl"
            } else {
                "coap-client"
            };
            Some(format!(
                "{} -v 6 -m POST {}://{}{}/api/v1/{}/telemetry -t json -e {}",
                client, protocol, host, port, creds.credentials_id, JSON_EXAMPLE_PAYLOAD
            ))
        }
        _ => None,
    }
}

pub fn docker_coap_publish_command(
    protocol: Protocol,
    host: &str,
    port: &str,
    creds: &DeviceCredentials,
) -> Option<String> {
    let coap_command = coap_publish_command(protocol, host, port, creds)?;
    let network = if is_localhost(host) { "--network=host " } else { "" };
    Some(format!("{}{}{}{}", DOCKER_RUN, network, COAP_IMAGE, coap_command))
}

/// Host advertised for `protocol`.
///
/// The configured host wins when non-blank, otherwise the host of the base
/// URL is used. IPv6 literals are bracketed for URL based commands and left
/// bare for `mosquitto_pub -h`.
pub fn get_host(base_url: &str, info: Option<&DeviceConnectivityInfo>, protocol: Protocol) -> String {
    let initial = match info {
        Some(info) if !info.host.trim().is_empty() => info.host.trim(),
        _ => base_url.trim(),
    };

    let host = extract_host(initial);
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<Ipv6Addr>().is_ok() {
        if protocol.is_mqtt() {
            bare.to_string()
        } else {
            format!("[{}]", bare)
        }
    } else {
        host
    }
}

fn extract_host(value: &str) -> String {
    let parsed = if value.contains("://") {
        Url::parse(value)
    } else {
        Url::parse(&format!("http://{}", value))
    };

    parsed
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| value.to_string())
}

/// Configured port, empty when unset
pub fn get_port(info: Option<&DeviceConnectivityInfo>) -> String {
    info.map(|i| i.port.trim().to_string()).unwrap_or_default()
}

/// `localhost` or a loopback address literal
pub fn is_localhost(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

/// Literal port of an `http(s)://host:port` base URL, `8080` otherwise
pub fn port_from_base_url(base_url: &str) -> String {
    for (idx, _) in base_url.match_indices("http") {
        let rest = &base_url[idx + 4..];
        let rest = if let Some(r) = rest.strip_prefix("s://") {
            r
        } else if let Some(r) = rest.strip_prefix("://") {
            r
        } else {
            continue;
        };

        let host_len = rest.find([':', '/']).unwrap_or(rest.len());
        if host_len == 0 {
            continue;
        }

        if let Some(port) = rest[host_len..].strip_prefix(':') {
            let digits: String = port.chars().take_while(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                return digits;
            }
        }
    }
    DEFAULT_BASE_URL_PORT.to_string()
}
