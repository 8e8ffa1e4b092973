use crate::{
    auth::middleware::AuthUser,
    types::{AppError, CreateSessionParams, Result, SessionResponse},
    AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use tracing::{error, info};

/// Create a new agent conversation session
#[utoipa::path(
    post,
    path = "/v1/sessions",
    params(CreateSessionParams),
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Persistence failure")
    ),
    tag = "agent",
    security(("bearer" = []))
)]
pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<CreateSessionParams>,
) -> Result<Json<SessionResponse>> {
    let session_id = state
        .store
        .create_session(&claims.sub, params.session_name.as_deref())
        .await
        .map_err(|e| {
            error!(user_id = %claims.sub, session_name = ?params.session_name, error = %e, "Session creation failed");
            AppError::Internal(format!("Failed to create session: {}", e))
        })?;
    state.metrics.session_opened();

    info!(
        session_id = %session_id,
        user_id = %claims.sub,
        session_name = ?params.session_name,
        "Session created"
    );

    Ok(Json(SessionResponse {
        session_id,
        created_at: Utc::now().to_rfc3339(),
    }))
}
