//! Configuration utilities.

/// `fabric.toml` loading and validation.
pub mod toml_config;
