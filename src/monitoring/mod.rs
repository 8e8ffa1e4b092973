//! Request and agent-execution metrics.
//!
//! [`FabricMetrics`] is owned by [`AppState`](crate::AppState) and exported in
//! Prometheus text format at `GET /metrics`.

pub mod metrics;
pub mod middleware;

use crate::types::JsonMap;
use metrics::{
    write_gauge, write_labeled_counter, write_labeled_histogram, Gauge, LabeledCounter,
    LabeledHistogram,
};
use tracing::{debug, info};

/// Outcome label recorded for an agent execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The agent reported success
    Success,
    /// The agent ran but reported a failure
    Failure,
    /// The request failed outside the agent (persistence, internal error)
    Error,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Success => "success",
            ExecutionOutcome::Failure => "failure",
            ExecutionOutcome::Error => "error",
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct FabricMetrics {
    pub http_requests: LabeledCounter,
    pub http_request_duration: LabeledHistogram,
    pub agent_executions: LabeledCounter,
    pub agent_execution_duration: LabeledHistogram,
    pub agent_token_usage: LabeledCounter,
    pub active_sessions: Gauge,
}

impl FabricMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_http_request(&self, method: &str, endpoint: &str, status_code: u16, duration: f64) {
        let status = status_code.to_string();
        self.http_requests.inc(&[
            ("method", method),
            ("endpoint", endpoint),
            ("status_code", &status),
        ]);
        self.http_request_duration
            .observe(&[("method", method), ("endpoint", endpoint)], duration);

        debug!(method, endpoint, status_code, duration, "HTTP request recorded");
    }

    /// Record one agent execution.
    ///
    /// Only numeric token-usage entries are counted; each key becomes a
    /// `token_type` label.
    pub fn record_agent_execution(
        &self,
        agent_type: &str,
        outcome: ExecutionOutcome,
        duration: Option<f64>,
        token_usage: Option<&JsonMap>,
    ) {
        self.agent_executions
            .inc(&[("agent_type", agent_type), ("status", outcome.as_str())]);

        if let Some(duration) = duration {
            self.agent_execution_duration
                .observe(&[("agent_type", agent_type)], duration);
        }

        if let Some(usage) = token_usage {
            for (token_type, count) in usage {
                if let Some(count) = count.as_u64() {
                    self.agent_token_usage.inc_by(
                        &[("agent_type", agent_type), ("token_type", token_type)],
                        count,
                    );
                }
            }
        }

        info!(
            agent_type,
            status = outcome.as_str(),
            duration,
            "Agent execution recorded"
        );
    }

    pub fn session_opened(&self) {
        self.active_sessions.inc();
    }

    /// Render every metric family in Prometheus text exposition format.
    pub fn export_prometheus(&self) -> String {
        let mut out = String::new();
        write_labeled_counter(
            &mut out,
            "http_requests_total",
            "Total number of HTTP requests",
            &self.http_requests,
        );
        write_labeled_histogram(
            &mut out,
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            &self.http_request_duration,
        );
        write_labeled_counter(
            &mut out,
            "agent_executions_total",
            "Total number of agent executions",
            &self.agent_executions,
        );
        write_labeled_histogram(
            &mut out,
            "agent_execution_duration_seconds",
            "Agent execution duration in seconds",
            &self.agent_execution_duration,
        );
        write_labeled_counter(
            &mut out,
            "agent_token_usage_total",
            "Total token usage by agents",
            &self.agent_token_usage,
        );
        write_gauge(
            &mut out,
            "active_sessions_total",
            "Number of active agent sessions",
            &self.active_sessions,
        );
        out
    }
}
