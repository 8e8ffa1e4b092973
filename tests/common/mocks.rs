//! Mock agent adapters for testing.
//!
//! These stand in for the framework adapters so the orchestrator and the
//! HTTP API can be exercised without any Python framework installed.

use async_trait::async_trait;
use fabric::agents::AgentAdapter;
use fabric::types::{AgentContext, AgentResponse, JsonMap};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What a [`MockAgent`] does when executed.
#[derive(Clone)]
pub enum Behavior {
    /// Return this response
    Respond(AgentResponse),
    /// Panic with this message
    Panic(&'static str),
}

/// Mock adapter that records every task it receives.
pub struct MockAgent {
    name: String,
    available: bool,
    behavior: Behavior,
    calls: AtomicUsize,
    last_task: Mutex<Option<String>>,
    last_context: Mutex<Option<AgentContext>>,
}

impl MockAgent {
    /// An available adapter answering every task with `result`.
    pub fn new(name: &str, result: &str) -> Self {
        let mut usage = JsonMap::new();
        usage.insert("prompt".to_string(), json!(30));
        usage.insert("completion".to_string(), json!(12));
        usage.insert("total".to_string(), json!(42));

        let mut metadata = JsonMap::new();
        metadata.insert("framework".to_string(), json!(name));

        Self::with_behavior(
            name,
            true,
            Behavior::Respond(AgentResponse::completed(
                result,
                12,
                Some(usage),
                Some(metadata),
            )),
        )
    }

    /// An adapter whose framework failed to load.
    pub fn unavailable(name: &str) -> Self {
        Self::with_behavior(
            name,
            false,
            Behavior::Respond(AgentResponse::rejected("should never run")),
        )
    }

    /// An available adapter that reports a framework error.
    pub fn failing(name: &str, error: &str) -> Self {
        Self::with_behavior(
            name,
            true,
            Behavior::Respond(AgentResponse::failed(error, 5)),
        )
    }

    pub fn panicking(name: &str, message: &'static str) -> Self {
        Self::with_behavior(name, true, Behavior::Panic(message))
    }

    pub fn with_behavior(name: &str, available: bool, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            available,
            behavior,
            calls: AtomicUsize::new(0),
            last_task: Mutex::new(None),
            last_context: Mutex::new(None),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_task(&self) -> Option<String> {
        self.last_task.lock().clone()
    }

    pub fn last_context(&self) -> Option<AgentContext> {
        self.last_context.lock().clone()
    }
}

#[async_trait]
impl AgentAdapter for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn execute(&self, task: &str, context: Option<&AgentContext>) -> AgentResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_task.lock() = Some(task.to_string());
        *self.last_context.lock() = context.cloned();

        match &self.behavior {
            Behavior::Respond(response) => response.clone(),
            Behavior::Panic(message) => panic!("{}", message),
        }
    }
}
