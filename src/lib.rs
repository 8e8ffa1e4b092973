//! # Fabric - multi-framework agent backend
//!
//! Fabric exposes several third-party multi-agent frameworks (PraisonAI,
//! CrewAI and AG2/AutoGen) behind one authenticated HTTP API. Every task is
//! dispatched through an [`AgentOrchestrator`], persisted as a session with
//! messages and an execution record, and counted in Prometheus metrics.
//!
//! ## Overview
//!
//! Fabric can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `fabric-server` binary
//! 2. **As a library** - Embed the orchestrator in your own Rust project
//!
//! ### Running a task
//!
//! ```rust,ignore
//! use fabric::{AgentOrchestrator, utils::toml_config::AgentsConfig};
//!
//! let orchestrator = AgentOrchestrator::from_config(&AgentsConfig::default());
//! let response = orchestrator.execute_task("crewai", "Summarize the Rust 2024 edition", None).await;
//! if response.success {
//!     println!("{}", response.result.unwrap_or_default());
//! }
//! ```
//!
//! ### Custom adapters
//!
//! ```rust,ignore
//! use fabric::{AgentOrchestrator, agents::AgentAdapter};
//!
//! let orchestrator = AgentOrchestrator::builder()
//!     .register("mock", MyMockAdapter)
//!     .register("crewai", crewai_adapter)
//!     .alias("crew", "crewai")
//!     .build();
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Framework adapters, runtime bridge and orchestrator
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - JWT authentication and middleware
//! - [`db`] - Session, message and execution persistence
//! - [`monitoring`] - Prometheus metrics
//! - [`types`] - Common types and error handling
//! - [`utils`] - TOML configuration

#![warn(rustdoc::missing_crate_level_docs)]

/// Framework adapters and the orchestrator.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// JWT authentication and middleware.
pub mod auth;
/// Command-line interface.
pub mod cli;
/// Session persistence (libSQL).
pub mod db;
/// Request and agent metrics.
pub mod monitoring;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{AgentAdapter, AgentOrchestrator, AgentOrchestratorBuilder};
pub use api::routes::build_app;
pub use db::SessionStore;
pub use monitoring::FabricMetrics;
pub use types::{AgentResponse, AppError, Result};
pub use utils::toml_config::{ConfigManager, FabricConfig};

use crate::auth::jwt::AuthService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<FabricConfig>,
    /// Agent dispatcher, built once and read-only afterwards
    pub orchestrator: Arc<AgentOrchestrator>,
    /// Session, message and execution records
    pub store: Arc<SessionStore>,
    /// Authentication service
    pub auth_service: Arc<AuthService>,
    /// Metrics exported at `/metrics`
    pub metrics: Arc<FabricMetrics>,
}

impl AppState {
    /// Build the production state: probe every framework, open the database
    /// and set up authentication from `config`.
    pub async fn initialize(config: Arc<FabricConfig>) -> Result<Self> {
        let auth_service = Arc::new(AuthService::from_config(&config)?);
        let store = Arc::new(SessionStore::open(&config.database.url).await?);

        let agents_config = config.agents.clone();
        let orchestrator = tokio::task::spawn_blocking(move || {
            AgentOrchestrator::from_config(&agents_config)
        })
        .await
        .map_err(|e| AppError::Internal(format!("Agent initialization failed: {}", e)))?;

        Ok(Self {
            config,
            orchestrator: Arc::new(orchestrator),
            store,
            auth_service,
            metrics: Arc::new(FabricMetrics::new()),
        })
    }
}
