//! PraisonAI adapter: a single analyst agent producing structured output.

use crate::agents::executor::JobExecutor;
use crate::agents::framework::{describe_context, Binding, FrameworkBinding};
use crate::agents::runtime::{FrameworkOutput, FrameworkRuntime, PythonRuntime};
use crate::agents::AgentAdapter;
use crate::types::{AgentContext, AgentResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

/// Import paths tried at startup, primary first.
pub const MODULES: &[&str] = &["praisonaiagents", "praisonai"];

const DRIVER: &str = include_str!("drivers/praisonai.py");

pub struct PraisonAiAgent {
    binding: FrameworkBinding,
}

impl PraisonAiAgent {
    /// Probe the interpreter for PraisonAI and bind whichever path imports.
    pub fn new(python: &Path, executor: JobExecutor) -> Self {
        let runtime = PythonRuntime::probe(python, MODULES, DRIVER)
            .map(|rt| Arc::new(rt) as Arc<dyn FrameworkRuntime>);
        Self::with_runtime(runtime, executor)
    }

    pub fn with_runtime(runtime: Binding, executor: JobExecutor) -> Self {
        Self {
            binding: FrameworkBinding::new("praisonai", "PraisonAI", runtime, executor),
        }
    }

    fn job(task: &str, context: Option<&AgentContext>) -> Value {
        let context = describe_context(context, "No additional context provided");
        json!({
            "agent": {
                "role": "Task Analyst",
                "goal": "Analyze and complete the given task with structured output",
                "backstory": "Expert analyst capable of breaking down complex tasks and providing structured insights",
            },
            "task": {
                "description": format!(
                    "Task: {}\nContext: {}\nProvide a comprehensive analysis with structured output.",
                    task, context
                ),
                "expected_output": "Structured analysis with title, content, summary, and key points",
            },
            "process": "sequential",
        })
    }
}

/// Flatten structured output, falling back to the raw text.
fn flatten(output: FrameworkOutput) -> String {
    if let Some(s) = output.structured {
        let mut text = format!(
            "Title: {}\n\nContent: {}\n\nSummary: {}",
            s.title, s.content, s.summary
        );
        if !s.key_points.is_empty() {
            text.push_str("\n\nKey Points:\n");
            let points: Vec<String> = s.key_points.iter().map(|p| format!("- {}", p)).collect();
            text.push_str(&points.join("\n"));
        }
        return text;
    }

    match output.raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => "No response generated".to_string(),
    }
}

#[async_trait]
impl AgentAdapter for PraisonAiAgent {
    fn name(&self) -> &str {
        "praisonai"
    }

    fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    async fn execute(&self, task: &str, context: Option<&AgentContext>) -> AgentResponse {
        self.binding.execute(Self::job(task, context), 1, flatten).await
    }
}
