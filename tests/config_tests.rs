//! Loading `fabric.toml` files from disk.

use fabric::utils::toml_config::ConfigError;
use fabric::{ConfigManager, FabricConfig};
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

const SECRET_ENV: &str = "FABRIC_CONFIG_TESTS_JWT_SECRET";

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn set_secret() {
    unsafe {
        std::env::set_var(SECRET_ENV, "config-tests-secret-at-least-32-chars");
    }
}

#[test]
fn test_load_minimal_file_uses_defaults() {
    set_secret();
    let file = write_config(&format!("[auth]\njwt_secret_env = \"{}\"\n", SECRET_ENV));

    let config = FabricConfig::load(file.path()).unwrap();

    assert_eq!(config.bind_address(), "0.0.0.0:8000");
    assert_eq!(config.agents.python, "python3");
    assert_eq!(config.agents.ag2_model, "gpt-3.5-turbo");
    assert_eq!(
        config.jwt_secret().unwrap(),
        "config-tests-secret-at-least-32-chars"
    );
}

#[test]
fn test_config_manager_shares_config() {
    set_secret();
    let file = write_config(&format!(
        "[server]\nport = 8100\ndebug = true\n\n[auth]\njwt_secret_env = \"{}\"\n",
        SECRET_ENV
    ));

    let manager = ConfigManager::new(file.path()).unwrap();

    assert_eq!(manager.path(), file.path());
    assert_eq!(manager.config().server.port, 8100);
    assert!(manager.config().server.debug);
}

#[test]
fn test_read_skips_validation() {
    let file = write_config("[auth]\njwt_secret_env = \"FABRIC_CONFIG_TESTS_UNSET\"\n");

    assert!(FabricConfig::read(file.path()).is_ok());
    assert!(matches!(
        FabricConfig::load(file.path()),
        Err(ConfigError::MissingEnvVar(name)) if name == "FABRIC_CONFIG_TESTS_UNSET"
    ));
}

#[test]
fn test_malformed_toml() {
    let file = write_config("[server\nport = 8000");

    assert!(matches!(
        FabricConfig::read(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[rstest]
#[case("[server]\nport = 0", "server.port")]
#[case("[server]\nlog_format = \"xml\"", "log_format")]
#[case("[auth]\ntoken_expiry = 0", "token_expiry")]
#[case("[agents]\ntimeout_secs = 0", "timeout_secs")]
#[case("[agents]\nag2_temperature = 3.5", "ag2_temperature")]
#[case("[auth]\nalgorithm = \"RS256\"", "RS256")]
fn test_validation_errors(#[case] section: &str, #[case] mentions: &str) {
    set_secret();
    let content = if section.starts_with("[auth]") {
        format!("{}\njwt_secret_env = \"{}\"\n", section, SECRET_ENV)
    } else {
        format!("{}\n\n[auth]\njwt_secret_env = \"{}\"\n", section, SECRET_ENV)
    };
    let file = write_config(&content);

    match FabricConfig::load(file.path()) {
        Err(ConfigError::ValidationError(msg)) => assert!(
            msg.contains(mentions),
            "expected '{}' in '{}'",
            mentions,
            msg
        ),
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}
