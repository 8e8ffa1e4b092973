//! HTTP API Handlers and Routes
//!
//! # API Endpoints
//!
//! ## Agent (`/v1`, bearer token required)
//! - `POST /v1/answer` - Run a task on an agent framework and persist the exchange
//! - `POST /v1/sessions` - Create a conversation session
//! - `GET /v1/agents` - List frameworks and their availability
//!
//! ## Public
//! - `GET /v1/health` - Health check
//! - `GET /` - Service information
//! - `GET /metrics` - Prometheus metrics
//! - `GET /openapi.json` - OpenAPI document (only with `server.debug = true`)
//!
//! # Authentication
//!
//! Agent endpoints require a valid JWT in the `Authorization` header:
//! ```text
//! Authorization: Bearer <token>
//! ```

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    AgentInfo, AgentsResponse, AnswerRequest, AnswerResponse, HealthResponse, ServiceInfo,
    SessionResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::answer::answer,
        handlers::sessions::create_session,
        handlers::agents::list_agents,
        handlers::health::health,
        handlers::health::root,
        handlers::metrics::metrics,
    ),
    components(schemas(
        AnswerRequest,
        AnswerResponse,
        SessionResponse,
        AgentsResponse,
        AgentInfo,
        HealthResponse,
        ServiceInfo,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "agent", description = "Agent task execution"),
        (name = "health", description = "Service health and metrics")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(utoipa::openapi::security::Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
