use crate::{auth::middleware::AuthUser, types::AgentsResponse, AppState};
use axum::{extract::State, Json};
use tracing::info;

/// List registered agent frameworks and their availability
#[utoipa::path(
    get,
    path = "/v1/agents",
    responses(
        (status = 200, description = "Agent availability", body = AgentsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "agent",
    security(("bearer" = []))
)]
pub async fn list_agents(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Json<AgentsResponse> {
    let available_agents = state.orchestrator.available_agents();
    let agent_details = state.orchestrator.agent_details();

    info!(
        user_id = %claims.sub,
        available_agents = ?available_agents,
        "Agent info requested"
    );

    Json(AgentsResponse {
        available_agents,
        agent_details,
    })
}
