use crate::{
    types::{HealthResponse, ServiceInfo},
    AppState,
};
use axum::{extract::State, Json};

/// Service identifier reported by the health endpoint.
pub const SERVICE_NAME: &str = "fabric-agent-backend";

/// Health check endpoint for monitoring
#[utoipa::path(
    get,
    path = "/v1/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Basic service information
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service information", body = ServiceInfo)),
    tag = "health"
)]
pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    let server = &state.config.server;
    let docs_url = if server.debug {
        "/openapi.json".to_string()
    } else {
        "disabled".to_string()
    };

    Json(ServiceInfo {
        name: server.title.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: server.description.clone(),
        status: "running".to_string(),
        docs_url,
    })
}
