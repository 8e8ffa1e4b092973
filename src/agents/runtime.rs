//! Bridge into a framework's native runtime.
//!
//! A [`FrameworkRuntime`] executes one framework job. The [`PythonRuntime`]
//! implementation binds a framework by probing its import paths once, then
//! runs an embedded driver script in a child process per job, exchanging
//! JSON over stdin/stdout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Structured output requested from frameworks that support typed results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredOutput {
    pub title: String,
    pub content: String,
    pub summary: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// One entry of a conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// What a framework job produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameworkOutput {
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub structured: Option<StructuredOutput>,
    #[serde(default)]
    pub messages: Vec<TranscriptMessage>,
}

/// Why a framework could not be bound at startup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InitError {
    #[error("interpreter '{0}' not found")]
    InterpreterMissing(String),

    #[error("none of [{modules}] could be imported: {reason}")]
    ModuleMissing { modules: String, reason: String },

    #[error("failed to probe framework: {0}")]
    Probe(String),
}

/// Failure of a single framework job.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to start framework process: {0}")]
    Spawn(String),

    /// The framework raised; carries its message verbatim.
    #[error("{0}")]
    Failed(String),

    #[error("unreadable framework output: {0}")]
    Protocol(String),
}

/// Entrypoint into one framework.
///
/// Dropping the returned future must abandon the job and release whatever
/// it holds, so [`JobExecutor`](crate::agents::executor::JobExecutor) can
/// cancel it on timeout.
#[async_trait]
pub trait FrameworkRuntime: Send + Sync {
    /// Run one job described by `job` and return what the framework produced.
    async fn run(&self, job: &Value) -> Result<FrameworkOutput, RuntimeError>;
}

/// Runs framework jobs through a Python interpreter and an embedded driver.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    interpreter: PathBuf,
    module: String,
    driver: &'static str,
}

impl PythonRuntime {
    /// Bind the first importable module among `candidates`.
    ///
    /// Candidates are tried in order, so the primary import path comes first
    /// and fallbacks after it. Blocks while the interpreter runs.
    pub fn probe(
        interpreter: impl Into<PathBuf>,
        candidates: &[&str],
        driver: &'static str,
    ) -> Result<Self, InitError> {
        let interpreter = interpreter.into();
        let mut reason = "no import paths given".to_string();

        for module in candidates {
            let output = Command::new(&interpreter)
                .arg("-c")
                .arg(format!("import {}", module))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output();

            match output {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(InitError::InterpreterMissing(
                        interpreter.display().to_string(),
                    ));
                }
                Err(e) => return Err(InitError::Probe(e.to_string())),
                Ok(out) if out.status.success() => {
                    debug!(module = %module, "Framework module imported");
                    return Ok(Self {
                        interpreter,
                        module: module.to_string(),
                        driver,
                    });
                }
                Ok(out) => {
                    reason = last_line(&out.stderr)
                        .unwrap_or_else(|| format!("import {} failed", module));
                    debug!(module = %module, reason = %reason, "Framework import failed");
                }
            }
        }

        Err(InitError::ModuleMissing {
            modules: candidates.join(", "),
            reason,
        })
    }

    /// The module name that was bound during probing.
    pub fn module(&self) -> &str {
        &self.module
    }
}

#[async_trait]
impl FrameworkRuntime for PythonRuntime {
    async fn run(&self, job: &Value) -> Result<FrameworkOutput, RuntimeError> {
        let mut child = tokio::process::Command::new(&self.interpreter)
            .arg("-c")
            .arg(self.driver)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::Spawn(e.to_string()))?;

        let envelope = json!({ "module": self.module, "job": job });
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(envelope.to_string().as_bytes())
                .await
                .map_err(|e| RuntimeError::Spawn(format!("failed to send job: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RuntimeError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let message = last_line(&output.stderr)
                .unwrap_or_else(|| format!("framework exited with {}", output.status));
            return Err(RuntimeError::Failed(message));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| RuntimeError::Protocol(e.to_string()))
    }
}

/// Last non-empty line of a process stream.
fn last_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
