//! Dispatch from agent-type names to framework adapters.
//!
//! The orchestrator is built once at startup and is read-only afterwards, so
//! it is shared through [`AppState`](crate::AppState) without any locking.
//!
//! Dispatch order for [`AgentOrchestrator::execute_task`]:
//! 1. resolve aliases (`autogen` is served by `ag2`)
//! 2. reject unknown agent types
//! 3. if the adapter is unavailable, hand the task to the adapter registered
//!    under [`FALLBACK_AGENT`], when there is one and it is available
//! 4. run the adapter, turning a panic into a failed response

use crate::agents::ag2::{Ag2Agent, LlmSettings};
use crate::agents::crewai::CrewAiAgent;
use crate::agents::executor::JobExecutor;
use crate::agents::praisonai::PraisonAiAgent;
use crate::agents::AgentAdapter;
use crate::types::{AgentContext, AgentInfo, AgentInfoError, AgentResponse};
use crate::utils::toml_config::AgentsConfig;
use futures::FutureExt;
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Key consulted when a requested adapter is unavailable.
///
/// Nothing is registered under it by default.
pub const FALLBACK_AGENT: &str = "mock";

/// Human-readable description of a registered agent type.
pub fn describe(agent_type: &str) -> &'static str {
    match agent_type {
        "praisonai" => "Multi-agent orchestration with structured outputs",
        "crewai" => "Collaborative AI agents for complex tasks",
        "ag2" => "AutoGen conversation-based multi-agent system",
        _ => "Unknown agent type",
    }
}

pub struct AgentOrchestrator {
    agents: BTreeMap<String, Arc<dyn AgentAdapter>>,
    aliases: HashMap<String, String>,
}

impl AgentOrchestrator {
    pub fn builder() -> AgentOrchestratorBuilder {
        AgentOrchestratorBuilder::default()
    }

    /// Probe every supported framework and register its adapter.
    ///
    /// Unavailable frameworks are still registered so they show up in the
    /// agent listing.
    pub fn from_config(config: &AgentsConfig) -> Self {
        let executor = JobExecutor::new(
            Duration::from_secs(config.timeout_secs),
            config.max_concurrent,
        );
        let python = Path::new(&config.python);
        let llm = LlmSettings {
            model: config.ag2_model.clone(),
            temperature: config.ag2_temperature,
            timeout_secs: config.timeout_secs,
        };

        let orchestrator = Self::builder()
            .register("praisonai", PraisonAiAgent::new(python, executor.clone()))
            .register("crewai", CrewAiAgent::new(python, executor.clone()))
            .register("ag2", Ag2Agent::new(python, llm, executor))
            .alias("autogen", "ag2")
            .build();

        info!(
            available = ?orchestrator.available_agents(),
            "Agent orchestrator initialized"
        );
        orchestrator
    }

    /// Canonical key for `agent_type`; unknown names pass through unchanged.
    pub fn resolve<'a>(&'a self, agent_type: &'a str) -> &'a str {
        self.aliases
            .get(agent_type)
            .map(String::as_str)
            .unwrap_or(agent_type)
    }

    /// Run `task` on the adapter registered for `agent_type`.
    ///
    /// Never fails: every failure is reported inside the returned response.
    pub async fn execute_task(
        &self,
        agent_type: &str,
        task: &str,
        context: Option<&AgentContext>,
    ) -> AgentResponse {
        let resolved = self.resolve(agent_type);

        let Some(agent) = self.agents.get(resolved) else {
            warn!(agent_type = %resolved, "Unknown agent type requested");
            return AgentResponse::rejected(format!("Agent type '{}' not found", resolved));
        };

        let agent = if agent.is_available() {
            agent
        } else {
            match self.agents.get(FALLBACK_AGENT) {
                Some(fallback) if fallback.is_available() => {
                    warn!(
                        agent_type = %resolved,
                        fallback = FALLBACK_AGENT,
                        "Agent unavailable, using fallback"
                    );
                    fallback
                }
                _ => {
                    return AgentResponse::rejected(format!(
                        "Agent '{}' not available and no fallback",
                        resolved
                    ));
                }
            }
        };

        match AssertUnwindSafe(agent.execute(task, context))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(agent_type = %resolved, "Agent execution panicked: {}", message);
                AgentResponse::rejected(format!("Agent execution failed: {}", message))
            }
        }
    }

    /// Registered agent types whose framework is loaded, in sorted order.
    pub fn available_agents(&self) -> Vec<String> {
        self.agents
            .iter()
            .filter(|(_, agent)| agent.is_available())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn agent_info(&self, agent_type: &str) -> Result<AgentInfo, AgentInfoError> {
        match self.agents.get(agent_type) {
            Some(agent) => Ok(AgentInfo {
                name: agent_type.to_string(),
                available: agent.is_available(),
                agent_type: agent_type.to_string(),
                description: describe(agent_type).to_string(),
            }),
            None => Err(AgentInfoError {
                error: format!("Agent type '{}' not found", agent_type),
            }),
        }
    }

    /// [`AgentInfo`] for every registered agent type.
    pub fn agent_details(&self) -> BTreeMap<String, AgentInfo> {
        self.agents
            .iter()
            .map(|(name, agent)| {
                let info = AgentInfo {
                    name: name.clone(),
                    available: agent.is_available(),
                    agent_type: name.clone(),
                    description: describe(name).to_string(),
                };
                (name.clone(), info)
            })
            .collect()
    }
}

/// Collects adapters and aliases for an [`AgentOrchestrator`].
#[derive(Default)]
pub struct AgentOrchestratorBuilder {
    agents: BTreeMap<String, Arc<dyn AgentAdapter>>,
    aliases: HashMap<String, String>,
}

impl AgentOrchestratorBuilder {
    pub fn register(mut self, key: impl Into<String>, agent: impl AgentAdapter + 'static) -> Self {
        self.agents.insert(key.into(), Arc::new(agent));
        self
    }

    pub fn register_arc(mut self, key: impl Into<String>, agent: Arc<dyn AgentAdapter>) -> Self {
        self.agents.insert(key.into(), agent);
        self
    }

    pub fn alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.insert(from.into(), to.into());
        self
    }

    pub fn build(self) -> AgentOrchestrator {
        AgentOrchestrator {
            agents: self.agents,
            aliases: self.aliases,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
