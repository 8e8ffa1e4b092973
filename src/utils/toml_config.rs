//! TOML-based configuration for Fabric
//!
//! Server, authentication, database, CORS and framework settings are read
//! from a single `fabric.toml`. Every section is optional and falls back to
//! the defaults below; secrets are never stored in the file, only the names
//! of the environment variables that hold them.

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Root configuration structure loaded from fabric.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FabricConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Framework runtime settings shared by every adapter
    #[serde(default)]
    pub agents: AgentsConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `json` or `pretty`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Exposes `/openapi.json` when set
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_description")]
    pub description: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_title() -> String {
    "Fabric Agent Backend".to_string()
}

fn default_description() -> String {
    "Multi-framework AI agent backend for PraisonAI, CrewAI and AG2".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            debug: false,
            title: default_title(),
            description: default_description(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `HS256` (shared secret) or `RS256` (public key or JWKS)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Environment variable name containing the HS256 secret
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// PEM-encoded RSA public key for RS256
    pub public_key_path: Option<PathBuf>,

    /// JWKS endpoint for RS256, used when no public key file is given
    pub jwks_url: Option<String>,

    /// Expected `aud` claim; audience is not checked when unset
    pub audience: Option<String>,

    /// Expected `iss` claim
    pub issuer: Option<String>,

    /// Lifetime of tokens minted by `fabric-server token`, in seconds
    #[serde(default = "default_token_expiry")]
    pub token_expiry: i64,
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_jwt_secret_env() -> String {
    "JWT_SECRET".to_string()
}

fn default_token_expiry() -> i64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            jwt_secret_env: default_jwt_secret_env(),
            public_key_path: None,
            jwks_url: None,
            audience: None,
            issuer: None,
            token_expiry: default_token_expiry(),
        }
    }
}

impl AuthConfig {
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        match self.algorithm.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Algorithm::HS256),
            "RS256" => Ok(Algorithm::RS256),
            other => Err(ConfigError::ValidationError(format!(
                "Unsupported JWT algorithm '{}' (expected HS256 or RS256)",
                other
            ))),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Local database path, or `:memory:`
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "./data/fabric.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= CORS Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_origins")]
    pub origins: Vec<String>,
}

fn default_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:19006".to_string(),
    ]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_origins(),
        }
    }
}

// ============= Agent Framework Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Interpreter the framework runtimes are probed and run with
    #[serde(default = "default_python")]
    pub python: String,

    /// Upper bound on a single framework execution
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Framework executions allowed to run at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_ag2_model")]
    pub ag2_model: String,

    #[serde(default = "default_ag2_temperature")]
    pub ag2_temperature: f64,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_concurrent() -> usize {
    8
}

fn default_ag2_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_ag2_temperature() -> f64 {
    0.7
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            ag2_model: default_ag2_model(),
            ag2_temperature: default_ag2_temperature(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl FabricConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without validating it.
    ///
    /// Used by commands that only need part of the configuration and must
    /// work before secrets are in place.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FabricConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }

        if !matches!(self.server.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'json' or 'pretty', got '{}'",
                self.server.log_format
            )));
        }

        match self.auth.algorithm()? {
            Algorithm::RS256 => {
                if self.auth.public_key_path.is_none() && self.auth.jwks_url.is_none() {
                    return Err(ConfigError::ValidationError(
                        "RS256 requires auth.public_key_path or auth.jwks_url".to_string(),
                    ));
                }
            }
            _ => self.validate_env_var(&self.auth.jwt_secret_env)?,
        }

        if self.auth.token_expiry <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.token_expiry must be positive".to_string(),
            ));
        }

        if self.agents.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "agents.timeout_secs must be positive".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.agents.ag2_temperature) {
            return Err(ConfigError::ValidationError(format!(
                "agents.ag2_temperature must be between 0 and 2, got {}",
                self.agents.ag2_temperature
            )));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get the JWT secret from the environment
    pub fn jwt_secret(&self) -> Result<String, ConfigError> {
        self.resolve_env(&self.auth.jwt_secret_env)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.jwt_secret_env.clone()))
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

// ============= Configuration Manager =============

/// Owns the configuration loaded at startup and hands out shared references.
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<FabricConfig>,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let config = FabricConfig::load(&path)?;
        info!(path = %path.display(), "Configuration loaded");

        Ok(Self {
            config: Arc::new(config),
            config_path: path,
        })
    }

    /// Create a config manager directly from a config (useful for testing)
    pub fn from_config(config: FabricConfig) -> Self {
        Self {
            config: Arc::new(config),
            config_path: PathBuf::from("fabric.toml"),
        }
    }

    pub fn config(&self) -> Arc<FabricConfig> {
        Arc::clone(&self.config)
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}
