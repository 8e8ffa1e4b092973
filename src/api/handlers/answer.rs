use crate::{
    auth::middleware::AuthUser,
    db::{ExecutionStatus, MessageType, NewExecution, NewMessage},
    monitoring::ExecutionOutcome,
    types::{AnswerRequest, AnswerResponse, AppError, Claims, JsonMap, Result},
    AppState,
};
use axum::{extract::State, Json};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

/// Characters of the task kept in an auto-created session's name.
const SESSION_NAME_TASK_CHARS: usize = 50;

/// Execute a task on an agent framework
#[utoipa::path(
    post,
    path = "/v1/answer",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Agent execution result", body = AnswerResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Persistence failure")
    ),
    tag = "agent",
    security(("bearer" = []))
)]
pub async fn answer(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    if payload.task.trim().is_empty() {
        return Err(AppError::InvalidInput("Task cannot be empty".to_string()));
    }

    let request_id = Uuid::new_v4().to_string();
    info!(
        request_id = %request_id,
        user_id = %claims.sub,
        agent_type = %payload.agent_type,
        task_length = payload.task.len(),
        session_id = ?payload.session_id,
        "Agent request received"
    );

    match run_task(&state, &claims, &payload, &request_id).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(
                request_id = %request_id,
                user_id = %claims.sub,
                agent_type = %payload.agent_type,
                session_id = ?payload.session_id,
                error = %e,
                "Agent task failed"
            );
            state.metrics.record_agent_execution(
                &payload.agent_type,
                ExecutionOutcome::Error,
                None,
                None,
            );
            Err(AppError::Internal(format!("Agent execution failed: {}", e)))
        }
    }
}

async fn run_task(
    state: &AppState,
    claims: &Claims,
    payload: &AnswerRequest,
    request_id: &str,
) -> Result<AnswerResponse> {
    let user_id = claims.sub.as_str();

    let session_id = match &payload.session_id {
        Some(id) => {
            // Sessions of other users are reported as missing
            match state.store.get_session(id).await? {
                Some(session) if session.user_id == user_id => {}
                _ => return Err(AppError::NotFound(format!("Session '{}' not found", id))),
            }
            info!(session_id = %id, user_id, "Using existing session");
            id.clone()
        }
        None => {
            let name = session_name(&payload.task);
            let id = state.store.create_session(user_id, Some(&name)).await?;
            state.metrics.session_opened();
            id
        }
    };

    let mut user_metadata = JsonMap::new();
    user_metadata.insert("agent_type".to_string(), json!(payload.agent_type));
    user_metadata.insert("context".to_string(), json!(payload.context));
    state
        .store
        .save_message(NewMessage {
            session_id: &session_id,
            user_id,
            message_type: MessageType::User,
            content: &payload.task,
            metadata: user_metadata,
            token_count: 0,
        })
        .await?;

    let response = state
        .orchestrator
        .execute_task(&payload.agent_type, &payload.task, payload.context.as_ref())
        .await;

    state.metrics.record_agent_execution(
        &payload.agent_type,
        if response.success {
            ExecutionOutcome::Success
        } else {
            ExecutionOutcome::Failure
        },
        response.execution_time_ms.map(|ms| ms as f64 / 1000.0),
        response.token_usage.as_ref(),
    );

    let mut assistant_metadata = JsonMap::new();
    assistant_metadata.insert("agent_type".to_string(), json!(payload.agent_type));
    assistant_metadata.insert(
        "execution_time_ms".to_string(),
        json!(response.execution_time_ms),
    );
    assistant_metadata.insert("success".to_string(), json!(response.success));
    if let Some(metadata) = &response.metadata {
        assistant_metadata.extend(metadata.clone());
    }

    let content = response
        .result
        .as_deref()
        .or(response.error.as_deref())
        .unwrap_or("No response");
    let message_id = state
        .store
        .save_message(NewMessage {
            session_id: &session_id,
            user_id,
            message_type: MessageType::Assistant,
            content,
            metadata: assistant_metadata,
            token_count: response.total_tokens(),
        })
        .await?;

    state
        .store
        .save_execution(NewExecution {
            session_id: &session_id,
            user_id,
            agent_type: &payload.agent_type,
            task: &payload.task,
            status: if response.success {
                ExecutionStatus::Completed
            } else {
                ExecutionStatus::Failed
            },
            result: response.result.as_deref(),
            error_message: response.error.as_deref(),
            execution_time_ms: response.execution_time_ms,
            token_usage: response.token_usage.clone().unwrap_or_default(),
            metadata: response.metadata.clone().unwrap_or_default(),
        })
        .await?;

    info!(
        request_id,
        session_id = %session_id,
        success = response.success,
        execution_time_ms = ?response.execution_time_ms,
        "Agent task completed"
    );

    Ok(AnswerResponse {
        success: response.success,
        result: response.result,
        error: response.error,
        execution_time_ms: response.execution_time_ms,
        session_id,
        message_id,
        agent_type: payload.agent_type.clone(),
        metadata: response.metadata,
    })
}

fn session_name(task: &str) -> String {
    let head: String = task.chars().take(SESSION_NAME_TASK_CHARS).collect();
    format!("Agent Task - {}...", head)
}
