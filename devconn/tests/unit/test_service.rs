//! Connectivity service unit tests

use std::sync::Arc;

use devconn::connectivity::options::{ConnectivityOptions, PortMode, TransportBinding};
use devconn::connectivity::service::DeviceConnectivityService;
use devconn::errors::ConnectivityError;
use devconn::models::credentials::{DeviceCredentials, DeviceCredentialsType};
use devconn::models::device::Device;
use devconn::models::ids::{DeviceId, DeviceProfileId, TenantId};
use devconn::models::profile::{DeviceProfile, MqttTransportConfiguration, TransportConfiguration};
use devconn::storage::registry::InMemoryRegistry;
use serde_json::{json, Value};

const TOKEN: &str = "A1_TEST_TOKEN";

struct Fixture {
    registry: Arc<InMemoryRegistry>,
    tenant_id: TenantId,
}

impl Fixture {
    fn new(connectivity: Value) -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.save_admin_settings("connectivity", connectivity);
        Self {
            registry,
            tenant_id: TenantId::random(),
        }
    }

    fn service(&self, options: ConnectivityOptions) -> DeviceConnectivityService {
        DeviceConnectivityService::new(
            options,
            self.registry.clone(),
            self.registry.clone(),
            self.registry.clone(),
        )
    }

    fn device(&self, transport: TransportConfiguration, creds: Option<DeviceCredentials>) -> Device {
        let profile = DeviceProfile {
            id: DeviceProfileId::random(),
            tenant_id: self.tenant_id,
            name: "profile".to_string(),
            transport_configuration: transport,
        };
        let device = Device::new(DeviceId::random(), self.tenant_id, profile.id, "sensor");
        let creds = creds.unwrap_or_else(|| DeviceCredentials::access_token(device.id, TOKEN));
        self.registry.insert_profile(profile);
        self.registry.insert_device(device.clone());
        self.registry.insert_credentials(DeviceCredentials {
            device_id: device.id,
            ..creds
        });
        device
    }
}

fn local_settings() -> Value {
    json!({
        "http": {"enabled": true, "host": "", "port": "8080"},
        "https": {"enabled": false, "host": "", "port": "443"},
        "mqtt": {"enabled": true, "host": "", "port": "1883"},
        "mqtts": {"enabled": false, "host": "", "port": "8883"},
        "coap": {"enabled": true, "host": "", "port": "5683"},
        "coaps": {"enabled": false, "host": "", "port": "5684"}
    })
}

fn remote_settings() -> Value {
    json!({
        "http": {"enabled": true, "host": "", "port": "80"},
        "https": {"enabled": true, "host": "", "port": "443"},
        "mqtt": {"enabled": true, "host": "mqtt.example.com", "port": "1883"},
        "mqtts": {"enabled": true, "host": "", "port": 8883},
        "coap": {"enabled": true, "host": "", "port": "5683"},
        "coaps": {"enabled": false, "host": "", "port": "5684"}
    })
}

fn settings_mode() -> ConnectivityOptions {
    ConnectivityOptions {
        port_mode: PortMode::Settings,
        ..Default::default()
    }
}

fn x509(device_id: DeviceId) -> DeviceCredentials {
    DeviceCredentials {
        device_id,
        credentials_type: DeviceCredentialsType::X509Certificate,
        credentials_id: "hash".to_string(),
        credentials_value: Some("-----BEGIN CERTIFICATE-----".to_string()),
    }
}

#[tokio::test]
async fn test_default_profile_on_local_edge() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();

    let expected = json!({
        "http": {
            "http": format!(r#"curl -v -X POST http://localhost:8080/api/v1/{TOKEN}/telemetry --header Content-Type:application/json --data "{{temperature:25}}""#)
        },
        "mqtt": {
            "mqtt": format!(r#"mosquitto_pub -d -q 1 -h localhost -p 1883 -t v1/devices/me/telemetry -u {TOKEN} -m "{{temperature:25}}""#),
            "docker": {
                "mqtt": format!(r#"docker run --rm -it --network=host thingsboard/mosquitto-clients mosquitto_pub -d -q 1 -h localhost -p 1883 -t v1/devices/me/telemetry -u {TOKEN} -m "{{temperature:25}}""#)
            }
        },
        "coap": {
            "coap": format!(r#"coap-client -v 6 -m POST coap://localhost:5683/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#),
            "docker": {
                "coap": format!(r#"docker run --rm -it --network=host thingsboard/coap-clients coap-client -v 6 -m POST coap://localhost:5683/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#)
            }
        }
    });
    assert_eq!(Value::Object(commands), expected);
}

#[tokio::test]
async fn test_bind_ports_follow_transport_configuration() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let mut options = ConnectivityOptions::default();
    options.transport.mqtt = TransportBinding::new(true, 2883);
    options.transport.coap = TransportBinding::new(false, 5683);
    let service = fixture.service(options);

    let commands = service
        .find_device_publish_telemetry_commands("http://10.0.0.5:9090", &device)
        .await
        .unwrap();

    let http = commands["http"]["http"].as_str().unwrap();
    assert!(http.contains("http://10.0.0.5:9090/api/v1/"));
    let mqtt = commands["mqtt"]["mqtt"].as_str().unwrap();
    assert!(mqtt.contains("-h 10.0.0.5 -p 2883 "));
    let docker = commands["mqtt"]["docker"]["mqtt"].as_str().unwrap();
    assert!(!docker.contains("--network=host"));
    assert!(!commands.contains_key("coap"));
}

#[tokio::test]
async fn test_local_deployment_ports_are_remapped() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:18080", &device)
        .await
        .unwrap();

    assert!(commands["http"]["http"]
        .as_str()
        .unwrap()
        .contains("http://localhost:18080/api/v1/"));
    assert!(commands["mqtt"]["mqtt"]
        .as_str()
        .unwrap()
        .contains("-p 11883 "));
    assert!(commands["coap"]["coap"]
        .as_str()
        .unwrap()
        .contains("coap://localhost:15683/api/v1/"));
}

#[tokio::test]
async fn test_default_profile_from_settings() {
    let fixture = Fixture::new(remote_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(settings_mode());
    let base_url = "https://iot.example.com";

    let commands = service
        .find_device_publish_telemetry_commands(base_url, &device)
        .await
        .unwrap();

    // Default HTTP(S) ports are left implicit
    assert_eq!(
        commands["http"]["http"],
        format!(r#"curl -v -X POST http://iot.example.com/api/v1/{TOKEN}/telemetry --header Content-Type:application/json --data "{{temperature:25}}""#)
    );
    assert_eq!(
        commands["http"]["https"],
        format!(r#"curl -v -X POST https://iot.example.com/api/v1/{TOKEN}/telemetry --header Content-Type:application/json --data "{{temperature:25}}""#)
    );

    assert_eq!(
        commands["mqtt"]["mqtt"],
        format!(r#"mosquitto_pub -d -q 1 -h mqtt.example.com -p 1883 -t v1/devices/me/telemetry -u {TOKEN} -m "{{temperature:25}}""#)
    );

    let curl = "curl -f -S -o tb-server-chain.pem https://iot.example.com/api/device-connectivity/mqtts/certificate/download";
    let mqtts = format!(r#"mosquitto_pub -d -q 1 --cafile tb-server-chain.pem -h iot.example.com -p 8883 -t v1/devices/me/telemetry -u {TOKEN} -m "{{temperature:25}}""#);
    assert_eq!(commands["mqtt"]["mqtts"], json!([curl, mqtts]));
    assert_eq!(
        commands["mqtt"]["docker"]["mqtts"],
        format!(r#"docker run --rm -it thingsboard/mosquitto-clients /bin/sh -c "{curl} && {mqtts}""#)
    );

    assert_eq!(
        commands["coap"]["coap"],
        format!(r#"coap-client -v 6 -m POST coap://iot.example.com:5683/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#)
    );
    assert!(commands["coap"].get("coaps").is_none());
}

#[tokio::test]
async fn test_disabled_http_is_omitted() {
    let mut settings = local_settings();
    settings["http"]["enabled"] = json!(false);
    let fixture = Fixture::new(settings);
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();
    assert!(!commands.contains_key("http"));
    assert!(commands.contains_key("mqtt"));
}

#[tokio::test]
async fn test_mqtt_profile_uses_profile_topic() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(
        TransportConfiguration::Mqtt(MqttTransportConfiguration {
            sparkplug: false,
            device_telemetry_topic: "sensors/telemetry".to_string(),
        }),
        None,
    );
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();

    assert_eq!(commands.len(), 1);
    assert!(commands["mqtt"]["mqtt"]
        .as_str()
        .unwrap()
        .contains(" -t sensors/telemetry "));
}

#[tokio::test]
async fn test_sparkplug_profile_points_to_documentation() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(
        TransportConfiguration::Mqtt(MqttTransportConfiguration {
            sparkplug: true,
            ..Default::default()
        }),
        None,
    );
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();
    assert_eq!(
        Value::Object(commands),
        json!({"mqtt": {"sparkplug": "Check documentation"}})
    );
}

#[tokio::test]
async fn test_mqtt_basic_credentials() {
    let fixture = Fixture::new(local_settings());
    let creds = DeviceCredentials {
        device_id: DeviceId::random(),
        credentials_type: DeviceCredentialsType::MqttBasic,
        credentials_id: "basic".to_string(),
        credentials_value: Some(
            json!({"clientId": "client1", "userName": "user1", "password": "pass1"}).to_string(),
        ),
    };
    let device = fixture.device(TransportConfiguration::Default, Some(creds));
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();

    // Only MQTT can carry basic credentials
    assert!(!commands.contains_key("http"));
    assert!(!commands.contains_key("coap"));
    assert_eq!(
        commands["mqtt"]["mqtt"],
        r#"mosquitto_pub -d -q 1 -h localhost -p 1883 -t v1/devices/me/telemetry -i client1 -u user1 -P pass1 -m "{temperature:25}""#
    );
}

#[tokio::test]
async fn test_x509_credentials_point_to_documentation() {
    let fixture = Fixture::new(local_settings());
    let service = fixture.service(ConnectivityOptions::default());

    let device = fixture.device(TransportConfiguration::Default, Some(x509(DeviceId::random())));
    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();
    assert_eq!(
        Value::Object(commands),
        json!({
            "mqtt": {"mqtts": "Check documentation"},
            "coap": {"coaps": "Check documentation"}
        })
    );

    let device = fixture.device(TransportConfiguration::Coap, Some(x509(DeviceId::random())));
    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();
    assert_eq!(
        Value::Object(commands),
        json!({"coap": {"coaps": "Check documentation"}})
    );
}

#[tokio::test]
async fn test_coap_profile_on_local_edge() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Coap, None);
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap();

    let coap = format!(r#"coap-client -v 6 -m POST coap://localhost:5683/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#);
    assert_eq!(
        Value::Object(commands),
        json!({
            "coap": {
                "coap": coap,
                "docker": {
                    "coap": format!("docker run --rm -it --network=host thingsboard/coap-clients {coap}")
                }
            }
        })
    );
}

#[tokio::test]
async fn test_coap_profile_from_settings_with_coaps() {
    let mut settings = remote_settings();
    settings["coaps"]["enabled"] = json!(true);
    let fixture = Fixture::new(settings);
    let device = fixture.device(TransportConfiguration::Coap, None);
    let service = fixture.service(settings_mode());

    let commands = service
        .find_device_publish_telemetry_commands("https://iot.example.com", &device)
        .await
        .unwrap();

    let coap = format!(r#"coap-client -v 6 -m POST coap://iot.example.com:5683/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#);
    let coaps = format!(r#"coap-client-openssl -v 6 -m POST coaps://iot.example.com:5684/api/v1/{TOKEN}/telemetry -t json -e "{{temperature:25}}""#);
    assert_eq!(
        Value::Object(commands),
        json!({
            "coap": {
                "coap": coap,
                "coaps": coaps,
                "docker": {
                    "coap": format!("docker run --rm -it thingsboard/coap-clients {coap}"),
                    "coaps": format!("docker run --rm -it thingsboard/coap-clients {coaps}")
                }
            }
        })
    );
}

#[tokio::test]
async fn test_other_transports_point_to_documentation() {
    let fixture = Fixture::new(local_settings());
    let service = fixture.service(ConnectivityOptions::default());

    for (transport, name) in [
        (TransportConfiguration::Lwm2m, "LWM2M"),
        (TransportConfiguration::Snmp, "SNMP"),
    ] {
        let device = fixture.device(transport, None);
        let commands = service
            .find_device_publish_telemetry_commands("http://localhost:8080", &device)
            .await
            .unwrap();
        assert_eq!(Value::Object(commands), json!({ name: "Check documentation" }));
    }
}

#[tokio::test]
async fn test_ipv6_hosts() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let commands = service
        .find_device_publish_telemetry_commands("http://[::1]:8080", &device)
        .await
        .unwrap();

    assert!(commands["http"]["http"]
        .as_str()
        .unwrap()
        .contains("http://[::1]:8080/api/v1/"));
    assert!(commands["mqtt"]["mqtt"]
        .as_str()
        .unwrap()
        .contains("-h ::1 -p 1883"));
    assert!(commands["coap"]["coap"]
        .as_str()
        .unwrap()
        .contains("coap://[::1]:5683/api/v1/"));
}

#[tokio::test]
async fn test_invalid_ids_are_rejected() {
    let fixture = Fixture::new(local_settings());
    let service = fixture.service(ConnectivityOptions::default());
    let device = Device::new(
        DeviceId::new(uuid::Uuid::nil()),
        fixture.tenant_id,
        DeviceProfileId::random(),
        "ghost",
    );

    let err = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &device)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectivityError::ValidationError(_)));
    assert_eq!(
        err.to_string(),
        "Validation error: Incorrect deviceId 00000000-0000-0000-0000-000000000000"
    );

    let err = service
        .create_gateway_docker_compose_file("http://localhost:8080", &device)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectivityError::ValidationError(_)));
}

#[tokio::test]
async fn test_missing_credentials_and_profile() {
    let fixture = Fixture::new(local_settings());
    let service = fixture.service(ConnectivityOptions::default());

    let orphan = Device::new(
        DeviceId::random(),
        fixture.tenant_id,
        DeviceProfileId::random(),
        "orphan",
    );
    let err = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &orphan)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectivityError::NotFound(_)));

    fixture
        .registry
        .insert_credentials(DeviceCredentials::access_token(orphan.id, TOKEN));
    let err = service
        .find_device_publish_telemetry_commands("http://localhost:8080", &orphan)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectivityError::NotFound(_)));
}

#[tokio::test]
async fn test_is_enabled() {
    let fixture = Fixture::new(remote_settings());
    let service = fixture.service(ConnectivityOptions::default());
    assert!(service.is_enabled("mqtts").await.unwrap());
    assert!(service.is_enabled("http").await.unwrap());
    // Protocol names are exact lowercase keys
    assert!(!service.is_enabled("HTTP").await.unwrap());
    assert!(!service.is_enabled("MQTTS").await.unwrap());
    assert!(!service.is_enabled("coaps").await.unwrap());
    assert!(!service.is_enabled("amqp").await.unwrap());

    fixture.registry.remove_admin_settings("connectivity");
    for protocol in ["http", "https", "mqtt", "mqtts", "coap", "coaps"] {
        assert!(!service.is_enabled(protocol).await.unwrap());
    }
}

#[tokio::test]
async fn test_gateway_compose_over_mqtt() {
    let fixture = Fixture::new(local_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let compose = service
        .create_gateway_docker_compose_file("http://localhost:8080", &device)
        .await
        .unwrap();

    assert_eq!(compose.file_name, "docker-compose.yml");
    let text = compose.as_str();
    assert!(text.contains("image: thingsboard/tb-gateway"));
    assert!(text.contains("      - host=host.docker.internal\n"));
    assert!(text.contains("      - port=1883\n"));
    assert!(text.contains(&format!("      - accessToken={TOKEN}\n")));
    assert!(!text.contains("caCert"));
}

#[tokio::test]
async fn test_gateway_compose_over_mqtts() {
    let fixture = Fixture::new(remote_settings());
    let device = fixture.device(TransportConfiguration::Default, None);
    let service = fixture.service(ConnectivityOptions::default());

    let compose = service
        .create_gateway_docker_compose_file("https://iot.example.com", &device)
        .await
        .unwrap();

    let text = compose.as_str();
    assert!(text.contains("      - host=iot.example.com\n"));
    assert!(text.contains("      - port=8883\n"));
    assert!(text.contains("      - caCert=/thingsboard_gateway/config/ca-root.pem\n"));
}

#[tokio::test]
async fn test_gateway_compose_without_settings_uses_bind_port() {
    let fixture = Fixture::new(json!({}));
    let device = fixture.device(TransportConfiguration::Default, Some(x509(DeviceId::random())));
    let service = fixture.service(ConnectivityOptions::default());

    let compose = service
        .create_gateway_docker_compose_file("http://gateway-host:8080", &device)
        .await
        .unwrap();

    let text = compose.as_str();
    assert!(text.contains("      - host=gateway-host\n"));
    assert!(text.contains("      - port=1883\n"));
    assert!(text.contains("      # Check documentation\n"));
}
