//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use openapi_server::models::{ErrorResponse, HealthResponse, PublishCommands, VersionResponse};
use serde::Serialize;
use tracing::{debug, error};

use crate::activity::manager::ActivityReport;
use crate::connectivity::resource::Resource;
use crate::connectivity::service::INCORRECT_DEVICE_ID;
use crate::errors::ConnectivityError;
use crate::models::device::Device;
use crate::models::ids::DeviceId;
use crate::server::state::ServerState;
use crate::utils::version_info;

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

impl IntoResponse for ConnectivityError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ConnectivityError::ValidationError(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ConnectivityError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }
        let body = ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "devconn".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Publish telemetry commands of a device
pub async fn device_connectivity_handler(
    State(state): State<Arc<ServerState>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PublishCommands>, ConnectivityError> {
    let device = find_device(&state, &device_id).await?;
    let base_url = base_url(&state, &headers);
    let commands = state
        .connectivity
        .find_device_publish_telemetry_commands(&base_url, &device)
        .await?;
    Ok(Json(commands))
}

/// Server certificate chain download
pub async fn certificate_download_handler(
    State(state): State<Arc<ServerState>>,
    Path(protocol): Path<String>,
) -> Result<Response, ConnectivityError> {
    let cert = state
        .connectivity
        .get_pem_cert_file(&protocol)
        .await?
        .ok_or_else(|| ConnectivityError::NotFound(format!("{} server certificate", protocol)))?;
    Ok(attachment(&cert))
}

/// Gateway docker compose file download
pub async fn gateway_compose_download_handler(
    State(state): State<Arc<ServerState>>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ConnectivityError> {
    let device = find_device(&state, &device_id).await?;
    let base_url = base_url(&state, &headers);
    let compose = state
        .connectivity
        .create_gateway_docker_compose_file(&base_url, &device)
        .await?;
    Ok(attachment(&compose))
}

/// Activity recording response
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub device_id: String,

    /// Set when the event was reported immediately
    pub reported: Option<ActivityReport>,
}

/// Record an activity event of a device
pub async fn activity_handler(
    State(state): State<Arc<ServerState>>,
    Path(device_id): Path<String>,
) -> Result<Json<ActivityResponse>, ConnectivityError> {
    let device = find_device(&state, &device_id).await?;
    let key = device.id.to_string();
    let now = chrono::Utc::now().timestamp_millis();
    let reported = state.activity.on_activity(&key, now);
    Ok(Json(ActivityResponse {
        device_id: key,
        reported,
    }))
}

async fn find_device(state: &ServerState, device_id: &str) -> Result<Device, ConnectivityError> {
    let id: DeviceId = device_id.parse().map_err(|_| {
        ConnectivityError::ValidationError(format!("{}{}", INCORRECT_DEVICE_ID, device_id))
    })?;
    state
        .devices
        .find_device_by_id(&id)
        .await?
        .ok_or_else(|| ConnectivityError::NotFound(format!("Device {}", id)))
}

/// Configured base URL, otherwise rebuilt from the forwarded scheme and host
fn base_url(state: &ServerState, headers: &HeaderMap) -> String {
    if let Some(base_url) = &state.base_url {
        return base_url.trim_end_matches('/').to_string();
    }
    let scheme = headers
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}", scheme, host)
}

fn attachment(resource: &Resource) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", resource.file_name),
            ),
        ],
        resource.content.clone(),
    )
        .into_response()
}
