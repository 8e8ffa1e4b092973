use anyhow::{Context, Result};
use fabric::{
    agents::AgentOrchestrator,
    auth::jwt::AuthService,
    build_app,
    cli::{output::Output, Cli, Commands},
    utils::toml_config::{ConfigError, ServerConfig},
    AppState, ConfigManager, FabricConfig,
};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cli.config, cli.verbose, output).await,
        Commands::Agents => list_agents(&cli.config, output).await,
        Commands::Token { sub, email } => mint_token(&cli.config, &sub, email.as_deref(), output),
        Commands::Config { validate } => show_config(&cli.config, validate, output),
    }
}

async fn serve(config_path: &Path, verbose: bool, output: &Output) -> Result<()> {
    let manager = ConfigManager::new(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let config = manager.config();

    init_tracing(&config.server, verbose);
    if config.server.log_format == "pretty" {
        output.banner();
    }

    info!(title = %config.server.title, "Starting Fabric");
    let state = AppState::initialize(config.clone()).await?;
    info!(
        available_agents = ?state.orchestrator.available_agents(),
        "Application startup complete"
    );

    let app = build_app(state);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Fabric listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down Fabric");
    Ok(())
}

fn init_tracing(server: &ServerConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { server.log_level.as_str() };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if server.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

/// Config for commands that run without secrets; falls back to defaults
/// when the file does not exist.
fn read_config_lenient(path: &Path) -> Result<FabricConfig> {
    match FabricConfig::read(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::FileNotFound(_)) => Ok(FabricConfig::default()),
        Err(e) => Err(e.into()),
    }
}

async fn list_agents(config_path: &Path, output: &Output) -> Result<()> {
    let config = read_config_lenient(config_path)?;
    let agents_config = config.agents.clone();

    let orchestrator =
        tokio::task::spawn_blocking(move || AgentOrchestrator::from_config(&agents_config))
            .await
            .context("Agent probing failed")?;

    output.header("Agent frameworks");
    output.kv("python", &config.agents.python);
    for info in orchestrator.agent_details().values() {
        output.agent(info);
    }

    let available = orchestrator.available_agents().len();
    if available == 0 {
        output.warning("No agent framework is importable; every task will fail");
    } else {
        output.info(&format!(
            "{} of {} frameworks importable",
            available,
            orchestrator.agent_details().len()
        ));
    }
    Ok(())
}

fn mint_token(config_path: &Path, sub: &str, email: Option<&str>, output: &Output) -> Result<()> {
    let config = read_config_lenient(config_path)?;
    let auth = AuthService::from_config(&config)?;
    let token = auth.issue_token(sub, email)?;

    output.raw(&token);
    Ok(())
}

fn show_config(config_path: &Path, validate_only: bool, output: &Output) -> Result<()> {
    let config = FabricConfig::load(config_path)
        .with_context(|| format!("Invalid configuration {}", config_path.display()))?;

    if validate_only {
        output.success(&format!("{} is valid", config_path.display()));
        return Ok(());
    }

    output.header("Server");
    output.kv("bind", &config.bind_address());
    output.kv("log", &format!("{} ({})", config.server.log_level, config.server.log_format));
    output.kv("debug", &config.server.debug.to_string());
    output.header("Auth");
    output.kv("algorithm", &config.auth.algorithm);
    output.kv(
        "audience",
        config.auth.audience.as_deref().unwrap_or("(not checked)"),
    );
    output.header("Database");
    output.kv("url", &config.database.url);
    output.header("Agents");
    output.kv("python", &config.agents.python);
    output.kv("timeout", &format!("{}s", config.agents.timeout_secs));
    output.kv("max_concurrent", &config.agents.max_concurrent.to_string());
    output.kv("ag2_model", &config.agents.ag2_model);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
