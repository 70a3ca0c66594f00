//! Docker Compose file for launching the IoT gateway

use std::fmt::Write;

use crate::connectivity::commands::is_localhost;
use crate::connectivity::protocol::{Protocol, CA_ROOT_CERT_PEM, CHECK_DOCUMENTATION};
use crate::connectivity::resource::Resource;
use crate::models::credentials::{DeviceCredentials, DeviceCredentialsType};

pub const DOCKER_COMPOSE_FILE_NAME: &str = "docker-compose.yml";

const GATEWAY_IMAGE: &str = "thingsboard/tb-gateway";
const GATEWAY_CONTAINER: &str = "tb-gateway";
const DOCKER_HOST_ALIAS: &str = "host.docker.internal";

/// Render the gateway compose file.
///
/// `host` and `port` are the MQTT endpoint the gateway connects to. A
/// loopback host is replaced with the docker host alias so the container can
/// reach a server running on the same machine.
pub fn gateway_docker_compose_file(
    host: &str,
    port: &str,
    creds: &DeviceCredentials,
    mqtt_type: Protocol,
) -> Resource {
    let host = if is_localhost(host) { DOCKER_HOST_ALIAS } else { host };

    let mut compose = String::new();
    compose.push_str("version: '3.4'\n");
    compose.push_str("services:\n");
    compose.push_str("  # IoT Gateway Service Configuration\n");
    let _ = writeln!(compose, "  {}:", GATEWAY_CONTAINER);
    let _ = writeln!(compose, "    image: {}", GATEWAY_IMAGE);
    let _ = writeln!(compose, "    container_name: {}", GATEWAY_CONTAINER);
    compose.push_str("    restart: always\n");
    compose.push('\n');
    compose.push_str("    # Ports bindings - required by some connectors\n");
    compose.push_str("    ports:\n");
    compose.push_str(
        "        - \"5000:5000\" # Comment if you don't use REST connector and change if you use another port\n",
    );
    compose.push_str("        # Uncomment and modify the following ports based on connector usage:\n");
    compose.push_str("#        - \"1052:1052\" # BACnet connector\n");
    compose.push_str("#        - \"5026:5026\" # Modbus TCP connector (Modbus Slave)\n");
    compose.push_str("#        - \"50000:50000/tcp\" # Socket connector with type TCP\n");
    compose.push_str("#        - \"50000:50000/udp\" # Socket connector with type UDP\n");
    compose.push('\n');
    compose.push_str("    # Necessary mapping for Linux\n");
    compose.push_str("    extra_hosts:\n");
    let _ = writeln!(compose, "      - \"{}:host-gateway\"", DOCKER_HOST_ALIAS);
    compose.push('\n');
    compose.push_str("    # Environment variables\n");
    compose.push_str("    environment:\n");
    let _ = writeln!(compose, "      - host={}", host);
    let _ = writeln!(compose, "      - port={}", port);
    if mqtt_type == Protocol::Mqtts {
        let _ = writeln!(
            compose,
            "      - caCert=/thingsboard_gateway/config/{}",
            CA_ROOT_CERT_PEM
        );
    }
    write_credentials(&mut compose, creds);
    compose.push('\n');
    compose.push_str("    # Volumes bind\n");
    compose.push_str("    volumes:\n");
    compose.push_str("      - tb-gw-config:/thingsboard_gateway/config\n");
    compose.push_str("      - tb-gw-logs:/thingsboard_gateway/logs\n");
    compose.push_str("      - tb-gw-extensions:/thingsboard_gateway/extensions\n");
    compose.push('\n');
    compose.push_str("# Volumes declaration for configurations, extensions and logs\n");
    compose.push_str("volumes:\n");
    for volume in ["tb-gw-config", "tb-gw-logs", "tb-gw-extensions"] {
        let _ = writeln!(compose, "  {}:", volume);
        let _ = writeln!(compose, "    name: {}", volume);
    }

    Resource::new(DOCKER_COMPOSE_FILE_NAME, compose)
}

fn write_credentials(compose: &mut String, creds: &DeviceCredentials) {
    match creds.credentials_type {
        DeviceCredentialsType::AccessToken => {
            let _ = writeln!(compose, "      - accessToken={}", creds.credentials_id);
        }
        DeviceCredentialsType::MqttBasic => match creds.basic_mqtt() {
            Some(basic) => {
                if let Some(client_id) = &basic.client_id {
                    let _ = writeln!(compose, "      - clientId={}", client_id);
                }
                if let Some(user_name) = &basic.user_name {
                    let _ = writeln!(compose, "      - username={}", user_name);
                }
                if let Some(password) = basic.password() {
                    let _ = writeln!(compose, "      - password={}", password);
                }
            }
            None => {
                let _ = writeln!(compose, "      # {}", CHECK_DOCUMENTATION);
            }
        },
        _ => {
            let _ = writeln!(compose, "      # {}", CHECK_DOCUMENTATION);
        }
    }
}
