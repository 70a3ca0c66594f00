//! HTTP API unit tests

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use devconn::activity::manager::ActivityManager;
use devconn::activity::strategy::ActivityStrategyType;
use devconn::connectivity::options::ConnectivityOptions;
use devconn::connectivity::service::DeviceConnectivityService;
use devconn::models::credentials::DeviceCredentials;
use devconn::models::device::Device;
use devconn::models::ids::{DeviceId, DeviceProfileId, TenantId};
use devconn::models::profile::{DeviceProfile, TransportConfiguration};
use devconn::server::serve::router;
use devconn::server::state::ServerState;
use devconn::storage::registry::InMemoryRegistry;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    device: Device,
    activity: Arc<ActivityManager>,
}

fn app(base_url: Option<&str>, options: ConnectivityOptions) -> TestApp {
    let registry = Arc::new(InMemoryRegistry::new());
    registry.save_admin_settings(
        "connectivity",
        json!({
            "http": {"enabled": true, "host": "", "port": "8080"},
            "mqtt": {"enabled": true, "host": "", "port": "1883"},
            "mqtts": {"enabled": true, "host": "", "port": "8883"}
        }),
    );

    let tenant_id = TenantId::random();
    let profile = DeviceProfile {
        id: DeviceProfileId::random(),
        tenant_id,
        name: "default".to_string(),
        transport_configuration: TransportConfiguration::Default,
    };
    let device = Device::new(DeviceId::random(), tenant_id, profile.id, "thermostat");
    registry.insert_profile(profile);
    registry.insert_device(device.clone());
    registry.insert_credentials(DeviceCredentials::access_token(device.id, "tok"));

    let service = DeviceConnectivityService::new(
        options,
        registry.clone(),
        registry.clone(),
        registry.clone(),
    );
    let activity = Arc::new(ActivityManager::new(ActivityStrategyType::First));
    let state = ServerState::new(
        Arc::new(service),
        registry,
        activity.clone(),
        base_url.map(String::from),
    );

    TestApp {
        router: router(Arc::new(state)),
        device,
        activity,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "edge.local:8080")
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_and_version() {
    let app = app(None, ConnectivityOptions::default());

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "devconn");

    let response = app.router.oneshot(get("/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_publish_commands_use_request_host() {
    let app = app(None, ConnectivityOptions::default());
    let uri = format!("/api/device-connectivity/{}", app.device.id);

    let response = app.router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["http"]["http"],
        r#"curl -v -X POST http://edge.local:8080/api/v1/tok/telemetry --header Content-Type:application/json --data "{temperature:25}""#
    );
    assert!(body["mqtt"]["mqtt"]
        .as_str()
        .unwrap()
        .contains("-h edge.local -p 1883"));
}

#[tokio::test]
async fn test_publish_commands_use_configured_base_url() {
    let app = app(Some("https://iot.example.com"), ConnectivityOptions::default());
    let uri = format!("/api/device-connectivity/{}", app.device.id);

    let response = app.router.oneshot(get(&uri)).await.unwrap();
    let body = body_json(response).await;
    assert!(body["mqtt"]["mqtt"]
        .as_str()
        .unwrap()
        .contains("-h iot.example.com"));
}

#[tokio::test]
async fn test_invalid_and_unknown_devices() {
    let app = app(None, ConnectivityOptions::default());

    let response = app
        .router
        .clone()
        .oneshot(get("/api/device-connectivity/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "Validation error: Incorrect deviceId not-a-uuid");

    let uri = format!("/api/device-connectivity/{}", DeviceId::random());
    let response = app.router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_certificate_download() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.pem");
    std::fs::write(
        &path,
        "-----BEGIN CERTIFICATE-----\nMAECAwQFBgcICQ==\n-----END CERTIFICATE-----\n",
    )
    .unwrap();
    let options = ConnectivityOptions {
        mqtts_pem_cert_file: Some(path),
        ..Default::default()
    };
    let app = app(None, options);

    let response = app
        .router
        .clone()
        .oneshot(get("/api/device-connectivity/mqtts/certificate/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=tb-server-chain.pem"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        "-----BEGIN CERTIFICATE-----\nMAECAwQFBgcICQ==\n-----END CERTIFICATE-----\n"
    );

    let response = app
        .router
        .oneshot(get("/api/device-connectivity/mqtt/certificate/download"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_gateway_compose_download() {
    let app = app(None, ConnectivityOptions::default());
    let uri = format!(
        "/api/device-connectivity/gateway-launch/{}/docker-compose/download",
        app.device.id
    );

    let response = app.router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=docker-compose.yml"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let compose = std::str::from_utf8(&bytes).unwrap();
    assert!(compose.contains("      - host=edge.local\n"));
    assert!(compose.contains("      - port=8883\n"));
    assert!(compose.contains("      - accessToken=tok\n"));
}

#[tokio::test]
async fn test_activity_recording() {
    let app = app(None, ConnectivityOptions::default());
    let uri = format!("/api/activity/{}", app.device.id);
    let post = |uri: &str| {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let response = app.router.clone().oneshot(post(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["device_id"], app.device.id.to_string());
    assert!(body["reported"]["last_activity_time"].is_i64());

    // FIRST strategy reports once per period
    let response = app.router.oneshot(post(&uri)).await.unwrap();
    let body = body_json(response).await;
    assert!(body["reported"].is_null());
    assert_eq!(app.activity.len(), 1);
}
