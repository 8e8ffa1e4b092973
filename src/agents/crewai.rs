//! CrewAI adapter: a one-member crew running a research task.

use crate::agents::executor::JobExecutor;
use crate::agents::framework::{describe_context, Binding, FrameworkBinding};
use crate::agents::runtime::{FrameworkOutput, FrameworkRuntime, PythonRuntime};
use crate::agents::AgentAdapter;
use crate::types::{AgentContext, AgentResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub const MODULES: &[&str] = &["crewai"];

const DRIVER: &str = include_str!("drivers/crewai.py");

pub struct CrewAiAgent {
    binding: FrameworkBinding,
}

impl CrewAiAgent {
    pub fn new(python: &Path, executor: JobExecutor) -> Self {
        let runtime = PythonRuntime::probe(python, MODULES, DRIVER)
            .map(|rt| Arc::new(rt) as Arc<dyn FrameworkRuntime>);
        Self::with_runtime(runtime, executor)
    }

    pub fn with_runtime(runtime: Binding, executor: JobExecutor) -> Self {
        Self {
            binding: FrameworkBinding::new("crewai", "CrewAI", runtime, executor),
        }
    }

    fn job(task: &str, context: Option<&AgentContext>) -> Value {
        let context = describe_context(context, "No additional context");
        json!({
            "agent": {
                "role": "Research Analyst",
                "goal": "Conduct thorough research and analysis",
                "backstory": "Expert researcher with deep analytical skills",
                "allow_delegation": false,
            },
            "task": {
                "description": format!("Research and analyze: {}\nContext: {}", task, context),
                "expected_output": "Comprehensive analysis with insights and recommendations",
            },
            "process": "sequential",
        })
    }
}

fn raw_text(output: FrameworkOutput) -> String {
    output.raw.unwrap_or_default()
}

#[async_trait]
impl AgentAdapter for CrewAiAgent {
    fn name(&self) -> &str {
        "crewai"
    }

    fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    async fn execute(&self, task: &str, context: Option<&AgentContext>) -> AgentResponse {
        self.binding
            .execute(Self::job(task, context), 1, raw_text)
            .await
    }
}
