//! API request handlers.

/// Agent listing.
pub mod agents;
/// Task execution with session persistence.
pub mod answer;
/// Health and service information.
pub mod health;
/// Prometheus export.
pub mod metrics;
/// Session creation.
pub mod sessions;
