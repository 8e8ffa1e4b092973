use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============= Agent Types =============

/// Free-form context forwarded to an agent alongside its task.
///
/// An empty context is treated the same as an absent one.
pub type AgentContext = BTreeMap<String, serde_json::Value>;

/// String-keyed JSON map used for token usage and response metadata.
pub type JsonMap = BTreeMap<String, serde_json::Value>;

/// Uniform result of running a task through any agent adapter.
///
/// Failures are values: every failure kind (unavailable framework, timeout,
/// framework error, unknown agent type, missing fallback) is reported with
/// `success == false` and a populated `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent executing, absent when the call failed fast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub token_usage: Option<JsonMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonMap>,
}

impl AgentResponse {
    /// A successful execution.
    pub fn completed(
        result: impl Into<String>,
        execution_time_ms: u64,
        token_usage: Option<JsonMap>,
        metadata: Option<JsonMap>,
    ) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
            execution_time_ms: Some(execution_time_ms),
            token_usage,
            metadata,
        }
    }

    /// A failure reported before anything was executed.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            execution_time_ms: None,
            token_usage: None,
            metadata: None,
        }
    }

    /// A failure that happened after execution started.
    pub fn failed(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            execution_time_ms: Some(execution_time_ms),
            ..Self::rejected(error)
        }
    }

    /// Numeric `total` entry of the token usage, if one was reported.
    pub fn total_tokens(&self) -> i64 {
        self.token_usage
            .as_ref()
            .and_then(|usage| usage.get("total"))
            .and_then(|total| total.as_i64())
            .unwrap_or(0)
    }
}

/// Description of one registered agent type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentInfo {
    pub name: String,
    pub available: bool,
    #[serde(rename = "type")]
    pub agent_type: String,
    pub description: String,
}

/// Returned instead of [`AgentInfo`] when the agent type is not registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AgentInfoError {
    pub error: String,
}

// ============= API Request/Response Types =============

fn default_agent_type() -> String {
    "praisonai".to_string()
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Task description for the agent to execute
    pub task: String,
    /// Type of agent to use (praisonai, crewai, ag2)
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    /// Existing session to append the exchange to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Extra context for the agent; `null` is the same as omitting it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub context: Option<AgentContext>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
    pub session_id: String,
    pub message_id: String,
    pub agent_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonMap>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CreateSessionParams {
    pub session_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AgentsResponse {
    pub available_agents: Vec<String>,
    pub agent_details: BTreeMap<String, AgentInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub status: String,
    pub docs_url: String,
}

// ============= Authentication Types =============

/// Claims carried by an accepted bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Empty when the token carried no subject; such tokens are rejected
    #[serde(default)]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_metadata: Option<serde_json::Value>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Database(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Auth(msg) => (axum::http::StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_response_has_no_timing() {
        let response = AgentResponse::rejected("Agent type 'x' not found");

        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Agent type 'x' not found"));
        assert!(response.execution_time_ms.is_none());
        assert!(response.result.is_none());
    }

    #[test]
    fn test_failed_response_keeps_timing() {
        let response = AgentResponse::failed("boom", 42);

        assert!(!response.success);
        assert_eq!(response.execution_time_ms, Some(42));
    }

    #[test]
    fn test_total_tokens() {
        let mut usage = JsonMap::new();
        usage.insert("framework".to_string(), json!("crewai"));
        let response = AgentResponse::completed("ok", 1, Some(usage.clone()), None);
        assert_eq!(response.total_tokens(), 0);

        usage.insert("total".to_string(), json!(128));
        let response = AgentResponse::completed("ok", 1, Some(usage), None);
        assert_eq!(response.total_tokens(), 128);
    }

    #[test]
    fn test_answer_request_defaults() {
        let request: AnswerRequest = serde_json::from_value(json!({"task": "hello"})).unwrap();

        assert_eq!(request.agent_type, "praisonai");
        assert!(request.session_id.is_none());
        assert!(request.context.is_none());
    }

    #[test]
    fn test_answer_request_accepts_null_context() {
        let request: AnswerRequest =
            serde_json::from_value(json!({"task": "hello", "context": null})).unwrap();
        assert!(request.context.is_none());

        let request: AnswerRequest =
            serde_json::from_value(json!({"task": "hello", "context": {"lang": "en"}})).unwrap();
        assert_eq!(request.context.unwrap()["lang"], "en");
    }

    #[test]
    fn test_agent_info_serializes_type_key() {
        let info = AgentInfo {
            name: "ag2".to_string(),
            available: false,
            agent_type: "ag2".to_string(),
            description: "AutoGen conversation-based multi-agent system".to_string(),
        };

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["type"], "ag2");
        assert_eq!(value["available"], false);
    }
}
