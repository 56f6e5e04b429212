//! ResQ server.
//!
//! Accepts emergency reports, lets dispatchers move incidents along the
//! response steps and pushes every status change to the reporters watching
//! an incident over WebSocket or Server-Sent Events.
//!
//! Configuration is layered: `.env`, then `resq.toml` (or `--config`), then
//! environment variables, then the flags below.

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use resq_config::{Config, ConfigLoad, ConfigLoader, ConfigWarnings};
use resq_core::KeywordAnalyzer;
use resq_server::{AppState, create_app};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "resq-server")]
#[command(about = "Emergency report intake with live incident status push")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Path to a TOML config file (defaults to resq.toml or config/resq.toml)
    #[arg(short, long, env = "RESQ_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Path to an env file loaded before the environment is read
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and validate the configuration, print warnings and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let ConfigLoad { config, warnings } = load_runtime_config(&cli.serve)?;
    init_tracing();
    log_config(&config, &warnings);

    if let Some(Command::CheckConfig) = cli.command {
        info!(warnings = warnings.len(), "configuration is valid");
        return Ok(());
    }

    run_server(config).await
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<ConfigLoad> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = args.config.clone() {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = args.env_file.clone() {
        loader = loader.with_env_file(path);
    }

    let mut load = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        load.config.server.port = port;
    }
    if let Some(host) = args.host.clone() {
        load.config.server.host = host;
    }
    Ok(load)
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn log_config(config: &Config, warnings: &ConfigWarnings) {
    if config.metadata.env_file_loaded {
        info!("loaded .env file");
    }
    if let Some(path) = config.metadata.config_path.as_ref() {
        info!(path = %path.display(), "configuration file loaded");
    }

    for warning in &warnings.items {
        warn!(
            message = %warning.message,
            hint = warning.hint.as_deref().unwrap_or("-"),
            "configuration warning"
        );
    }

    info!(
        watcher_buffer = config.fanout.watcher_buffer,
        push_timeout = ?config.fanout.push_timeout,
        keepalive_interval = ?config.fanout.keepalive_interval,
        dev_mode = config.dev_mode,
        "fanout settings"
    );
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let state = AppState::new(Arc::new(config), Arc::new(KeywordAnalyzer));
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "ResQ server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
