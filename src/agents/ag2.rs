//! AG2 (AutoGen) adapter: an assistant and a user proxy holding a short
//! conversation about the task.

use crate::agents::executor::JobExecutor;
use crate::agents::framework::{describe_context, Binding, FrameworkBinding};
use crate::agents::runtime::{FrameworkOutput, FrameworkRuntime, PythonRuntime};
use crate::agents::AgentAdapter;
use crate::types::{AgentContext, AgentResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;

pub const MODULES: &[&str] = &["autogen", "autogen.agentchat"];

const DRIVER: &str = include_str!("drivers/ag2.py");

/// Model settings handed to the assistant agent.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

pub struct Ag2Agent {
    binding: FrameworkBinding,
    llm: LlmSettings,
}

impl Ag2Agent {
    pub fn new(python: &Path, llm: LlmSettings, executor: JobExecutor) -> Self {
        let runtime = PythonRuntime::probe(python, MODULES, DRIVER)
            .map(|rt| Arc::new(rt) as Arc<dyn FrameworkRuntime>);
        Self::with_runtime(runtime, llm, executor)
    }

    pub fn with_runtime(runtime: Binding, llm: LlmSettings, executor: JobExecutor) -> Self {
        Self {
            binding: FrameworkBinding::new("ag2", "AG2/AutoGen", runtime, executor),
            llm,
        }
    }

    fn job(&self, task: &str, context: Option<&AgentContext>) -> Value {
        let context = describe_context(context, "No additional context");
        json!({
            "llm_config": {
                "model": self.llm.model,
                "temperature": self.llm.temperature,
                "timeout": self.llm.timeout_secs,
            },
            "assistant": {
                "name": "assistant",
                "system_message": "You are a helpful AI assistant that provides comprehensive analysis and insights.",
                "max_consecutive_auto_reply": 1,
            },
            "user_proxy": {
                "name": "user_proxy",
                "system_message": "You are a user proxy that initiates conversations.",
                "max_consecutive_auto_reply": 0,
            },
            "message": format!("Task: {}\nContext: {}", task, context),
        })
    }
}

/// The last transcript entry carries the conversation's answer.
fn last_message(output: FrameworkOutput) -> String {
    match output.messages.into_iter().last() {
        Some(message) => message
            .content
            .unwrap_or_else(|| "No response".to_string()),
        None => "No response generated".to_string(),
    }
}

#[async_trait]
impl AgentAdapter for Ag2Agent {
    fn name(&self) -> &str {
        "ag2"
    }

    fn is_available(&self) -> bool {
        self.binding.is_available()
    }

    async fn execute(&self, task: &str, context: Option<&AgentContext>) -> AgentResponse {
        self.binding
            .execute(self.job(task, context), 2, last_message)
            .await
    }
}
