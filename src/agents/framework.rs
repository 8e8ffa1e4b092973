//! Plumbing shared by every framework adapter.

use crate::agents::executor::JobExecutor;
use crate::agents::runtime::{FrameworkOutput, FrameworkRuntime, InitError};
use crate::types::{AgentContext, AgentResponse, JsonMap};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Outcome of binding a framework at startup.
pub type Binding = Result<Arc<dyn FrameworkRuntime>, InitError>;

/// A framework's runtime binding plus the executor its jobs run on.
///
/// The binding is resolved once at construction and never re-probed.
pub struct FrameworkBinding {
    framework: &'static str,
    display_name: &'static str,
    runtime: Binding,
    executor: JobExecutor,
}

impl FrameworkBinding {
    pub fn new(
        framework: &'static str,
        display_name: &'static str,
        runtime: Binding,
        executor: JobExecutor,
    ) -> Self {
        match &runtime {
            Ok(_) => info!(framework, "{} agent initialized successfully", display_name),
            Err(e) => warn!(framework, "{} not available: {}", display_name, e),
        }

        Self {
            framework,
            display_name,
            runtime,
            executor,
        }
    }

    pub fn is_available(&self) -> bool {
        self.runtime.is_ok()
    }

    /// Why the framework could not be bound, if it could not.
    pub fn init_error(&self) -> Option<&InitError> {
        self.runtime.as_ref().err()
    }

    /// Run `job` on the framework and wrap the outcome in an [`AgentResponse`].
    ///
    /// `extract` flattens the framework output into the textual result.
    pub async fn execute<X>(&self, job: Value, agents_used: u32, extract: X) -> AgentResponse
    where
        X: FnOnce(FrameworkOutput) -> String,
    {
        let runtime = match &self.runtime {
            Ok(runtime) => runtime,
            Err(_) => {
                return AgentResponse::rejected(format!(
                    "{} agent not available",
                    self.display_name
                ));
            }
        };

        let started = Instant::now();
        let outcome = self.executor.run(runtime.run(&job)).await;
        let execution_time_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(output) => {
                let mut token_usage = JsonMap::new();
                token_usage.insert("framework".to_string(), json!(self.framework));

                let mut metadata = JsonMap::new();
                metadata.insert("framework".to_string(), json!(self.framework));
                metadata.insert("agents_used".to_string(), json!(agents_used));

                AgentResponse::completed(
                    extract(output),
                    execution_time_ms,
                    Some(token_usage),
                    Some(metadata),
                )
            }
            Err(e) => {
                error!(
                    framework = self.framework,
                    execution_time_ms,
                    "{} execution failed: {}",
                    self.display_name,
                    e
                );
                AgentResponse::failed(e.to_string(), execution_time_ms)
            }
        }
    }
}

/// Render the caller's context for inclusion in a task description.
pub(crate) fn describe_context(context: Option<&AgentContext>, fallback: &str) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => {
            serde_json::to_string(ctx).unwrap_or_else(|_| fallback.to_string())
        }
        _ => fallback.to_string(),
    }
}
