//! HTTP API tests against the full router, with mock agents and an
//! in-memory session store.

mod common;

use axum::http::StatusCode;
use common::mocks::MockAgent;
use common::{test_server, test_state, token_for};
use fabric::db::{ExecutionStatus, MessageType};
use fabric::AgentOrchestrator;
use serde_json::{json, Value};
use std::sync::Arc;

fn mock_orchestrator() -> AgentOrchestrator {
    AgentOrchestrator::builder()
        .register("praisonai", MockAgent::new("praisonai", "Title: Report\nContent: Done"))
        .register("crewai", MockAgent::failing("crewai", "LLM quota exceeded"))
        .register("ag2", MockAgent::unavailable("ag2"))
        .alias("autogen", "ag2")
        .build()
}

// ============= Public Endpoints =============

#[tokio::test]
async fn test_health_is_public() {
    let server = test_server(test_state(mock_orchestrator(), false).await);

    let response = server.get("/v1/health").await;

    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "healthy",
        "service": "fabric-agent-backend",
        "version": env!("CARGO_PKG_VERSION"),
    }));
}

#[tokio::test]
async fn test_root_service_info() {
    let server = test_server(test_state(mock_orchestrator(), false).await);

    let body: Value = server.get("/").await.json();

    assert_eq!(body["name"], "Fabric Agent Backend");
    assert_eq!(body["status"], "running");
    assert_eq!(body["docs_url"], "disabled");
}

#[tokio::test]
async fn test_openapi_only_in_debug() {
    let server = test_server(test_state(mock_orchestrator(), false).await);
    server
        .get("/openapi.json")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let server = test_server(test_state(mock_orchestrator(), true).await);
    let root: Value = server.get("/").await.json();
    assert_eq!(root["docs_url"], "/openapi.json");

    let doc: Value = server.get("/openapi.json").await.json();
    assert!(doc["paths"]["/v1/answer"]["post"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
}

// ============= Authentication =============

#[tokio::test]
async fn test_protected_routes_require_token() {
    let server = test_server(test_state(mock_orchestrator(), false).await);

    let response = server
        .post("/v1/answer")
        .json(&json!({ "task": "hello" }))
        .await;
    response.assert_status_unauthorized();
    response.assert_json(&json!({ "error": "Missing bearer token" }));

    server
        .post("/v1/sessions")
        .await
        .assert_status_unauthorized();
    server.get("/v1/agents").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let server = test_server(test_state(mock_orchestrator(), false).await);

    let response = server
        .get("/v1/agents")
        .authorization_bearer("not.a.jwt")
        .await;

    response.assert_status_unauthorized();
    response.assert_json(&json!({ "error": "Invalid token" }));
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let server = test_server(test_state(mock_orchestrator(), false).await);
    let foreign = fabric::auth::jwt::AuthService::new(
        "a-completely-different-secret-value!!".to_string(),
        3600,
    )
    .issue_token("user_1", None)
    .unwrap();

    server
        .get("/v1/agents")
        .authorization_bearer(foreign)
        .await
        .assert_status_unauthorized();
}

// ============= Agents =============

#[tokio::test]
async fn test_list_agents() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_1");
    let server = test_server(state);

    let response = server.get("/v1/agents").authorization_bearer(token).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["available_agents"], json!(["crewai", "praisonai"]));
    assert_eq!(
        body["agent_details"]["ag2"],
        json!({
            "name": "ag2",
            "available": false,
            "type": "ag2",
            "description": "AutoGen conversation-based multi-agent system",
        })
    );
}

// ============= Sessions =============

#[tokio::test]
async fn test_create_session() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_42");
    let store = Arc::clone(&state.store);
    let server = test_server(state);

    let response = server
        .post("/v1/sessions")
        .add_query_param("session_name", "Quarterly research")
        .authorization_bearer(token)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let session_id = body["session_id"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(body["created_at"].as_str().unwrap()).is_ok());

    let session = store.get_session(session_id).await.unwrap().unwrap();
    assert_eq!(session.user_id, "user_42");
    assert_eq!(session.session_name.as_deref(), Some("Quarterly research"));
    assert!(session.is_active);
}

// ============= Answer =============

#[tokio::test]
async fn test_answer_persists_exchange() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let store = Arc::clone(&state.store);
    let server = test_server(state);

    let response = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({
            "task": "Summarize the release notes",
            "context": { "audience": "engineers" }
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["agent_type"], "praisonai");
    assert_eq!(body["result"], "Title: Report\nContent: Done");
    assert_eq!(body["execution_time_ms"], 12);
    assert!(body.get("error").is_none());

    let session_id = body["session_id"].as_str().unwrap();
    let session = store.get_session(session_id).await.unwrap().unwrap();
    assert_eq!(
        session.session_name.as_deref(),
        Some("Agent Task - Summarize the release notes...")
    );

    let messages = store.session_messages(session_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message_type, MessageType::User);
    assert_eq!(messages[0].content, "Summarize the release notes");
    assert_eq!(messages[0].metadata["context"]["audience"], "engineers");
    assert_eq!(messages[1].message_type, MessageType::Assistant);
    assert_eq!(messages[1].id, body["message_id"].as_str().unwrap());
    assert_eq!(messages[1].token_count, 42);
    assert_eq!(messages[1].metadata["success"], true);
    assert_eq!(messages[1].metadata["framework"], "praisonai");

    let executions = store.session_executions(session_id).await.unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, ExecutionStatus::Completed);
    assert_eq!(executions[0].user_id, "user_7");
    assert_eq!(executions[0].token_usage["total"], 42);
    assert!(executions[0].completed_at.is_some());
}

#[tokio::test]
async fn test_answer_accepts_null_context() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let store = Arc::clone(&state.store);
    let server = test_server(state);

    let response = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "Plan the sprint", "context": null }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let messages = store
        .session_messages(body["session_id"].as_str().unwrap())
        .await
        .unwrap();
    assert!(messages[0].metadata["context"].is_null());
}

#[tokio::test]
async fn test_answer_reuses_existing_session() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let store = Arc::clone(&state.store);
    let session_id = store.create_session("user_7", Some("Ongoing")).await.unwrap();
    let server = test_server(state);

    for task in ["first question", "second question"] {
        let body: Value = server
            .post("/v1/answer")
            .authorization_bearer(&token)
            .json(&json!({ "task": task, "session_id": session_id }))
            .await
            .json();
        assert_eq!(body["session_id"], session_id.as_str());
    }

    assert_eq!(store.session_messages(&session_id).await.unwrap().len(), 4);
    assert_eq!(store.session_executions(&session_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_answer_records_agent_failure() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let store = Arc::clone(&state.store);
    let server = test_server(state);

    let response = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "Research competitors", "agent_type": "crewai" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "LLM quota exceeded");
    assert!(body.get("result").is_none());

    let session_id = body["session_id"].as_str().unwrap();
    let messages = store.session_messages(session_id).await.unwrap();
    assert_eq!(messages[1].content, "LLM quota exceeded");
    assert_eq!(messages[1].metadata["success"], false);

    let executions = store.session_executions(session_id).await.unwrap();
    assert_eq!(executions[0].status, ExecutionStatus::Failed);
    assert_eq!(
        executions[0].error_message.as_deref(),
        Some("LLM quota exceeded")
    );
}

#[tokio::test]
async fn test_answer_with_unavailable_alias() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let server = test_server(state);

    let body: Value = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "Chat about Rust", "agent_type": "autogen" }))
        .await
        .json();

    assert_eq!(body["success"], false);
    assert_eq!(body["agent_type"], "autogen");
    assert_eq!(body["error"], "Agent 'ag2' not available and no fallback");
    assert!(body.get("execution_time_ms").is_none());
}

#[tokio::test]
async fn test_answer_rejects_empty_task() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let server = test_server(state);

    let response = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "   " }))
        .await;

    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "Task cannot be empty" }));
}

#[tokio::test]
async fn test_answer_unknown_session_is_internal_error() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let metrics = Arc::clone(&state.metrics);
    let server = test_server(state);

    let response = server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "hello", "session_id": "no-such-session" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Agent execution failed: "));
    assert_eq!(
        metrics
            .agent_executions
            .get(&[("agent_type", "praisonai"), ("status", "error")]),
        1
    );
}

// ============= Metrics =============

#[tokio::test]
async fn test_metrics_export() {
    let state = test_state(mock_orchestrator(), false).await;
    let token = token_for(&state, "user_7");
    let server = test_server(state);

    server.get("/v1/health").await.assert_status_ok();
    server
        .post("/v1/answer")
        .authorization_bearer(token)
        .json(&json!({ "task": "Count tokens" }))
        .await
        .assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    assert!(response
        .header("content-type")
        .to_str()
        .unwrap()
        .starts_with("text/plain; version=0.0.4"));

    let text = response.text();
    assert!(text.contains(
        r#"http_requests_total{endpoint="/v1/health",method="GET",status_code="200"} 1"#
    ));
    assert!(text.contains(r#"agent_executions_total{agent_type="praisonai",status="success"} 1"#));
    assert!(text.contains(
        r#"agent_token_usage_total{agent_type="praisonai",token_type="total"} 42"#
    ));
    assert!(text.contains("active_sessions_total 1"));
}
