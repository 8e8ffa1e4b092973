//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mocks;

use axum_test::TestServer;
use fabric::{
    auth::jwt::AuthService, build_app, AgentOrchestrator, AppState, FabricConfig, FabricMetrics,
    SessionStore,
};
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret-at-least-32-characters-long";

/// State backed by an in-memory store and an HS256 auth service.
pub async fn test_state(orchestrator: AgentOrchestrator, debug: bool) -> AppState {
    let mut config = FabricConfig::default();
    config.server.debug = debug;
    config.database.url = ":memory:".to_string();

    let store = SessionStore::new_memory()
        .await
        .expect("in-memory store should open");

    AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
        store: Arc::new(store),
        auth_service: Arc::new(AuthService::new(TEST_SECRET.to_string(), 3600)),
        metrics: Arc::new(FabricMetrics::new()),
    }
}

pub fn test_server(state: AppState) -> TestServer {
    TestServer::new(build_app(state)).expect("test server should start")
}

/// Bearer token for `user_id`, signed with [`TEST_SECRET`].
pub fn token_for(state: &AppState, user_id: &str) -> String {
    state
        .auth_service
        .issue_token(user_id, Some("tester@example.com"))
        .expect("token should be issued")
}
