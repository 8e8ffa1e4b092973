//! Framework adapters and the orchestrator that dispatches to them.
//!
//! Each adapter wraps one third-party multi-agent framework behind
//! [`AgentAdapter`]. Whether a framework is usable is decided once, when the
//! adapter is constructed; an adapter whose framework failed to load stays
//! registered and answers every task with a failure response.

pub mod ag2;
pub mod crewai;
pub mod executor;
pub mod framework;
pub mod orchestrator;
pub mod praisonai;
pub mod runtime;

use crate::types::{AgentContext, AgentResponse};
use async_trait::async_trait;

pub use ag2::{Ag2Agent, LlmSettings};
pub use crewai::CrewAiAgent;
pub use executor::{JobExecutor, ExecutionError};
pub use orchestrator::{AgentOrchestrator, AgentOrchestratorBuilder, FALLBACK_AGENT};
pub use praisonai::PraisonAiAgent;
pub use runtime::{FrameworkOutput, FrameworkRuntime, InitError, PythonRuntime, RuntimeError};

/// Uniform contract every framework adapter implements.
#[async_trait]
pub trait AgentAdapter: Send + Sync {
    /// Registry key of the framework this adapter wraps
    fn name(&self) -> &str;

    /// Whether the framework loaded at startup
    fn is_available(&self) -> bool;

    /// Run `task`; failures are reported in the response, never raised.
    async fn execute(&self, task: &str, context: Option<&AgentContext>) -> AgentResponse;
}
