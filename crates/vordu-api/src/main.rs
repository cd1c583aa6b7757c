//! vordu-api - serve the roadmap matrix

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use vordu_api::{routes, ConfigOverrides, ServerConfig, SqliteStore};

#[derive(Debug, Parser)]
#[command(name = "vordu-api", version, about = "Vörðu API - the living roadmap aggregator")]
struct Cli {
    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    bind: Option<String>,

    /// Database URL (path, sqlite:///path or :memory:)
    #[arg(long)]
    database_url: Option<String>,

    /// API key required by mutating endpoints
    #[arg(long)]
    api_key: Option<String>,

    /// Built dashboard directory
    #[arg(long, value_name = "DIR")]
    ui_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind: self.bind.clone(),
            database_url: self.database_url.clone(),
            api_key: self.api_key.clone(),
            ui_dir: self.ui_dir.clone(),
            cors_origins: None,
        }
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let file = match &cli.config {
        Some(path) => ConfigOverrides::from_file(path)?,
        None => ConfigOverrides::default(),
    };
    let overrides = file.merge(ConfigOverrides::from_env()).merge(cli.overrides());
    Ok(ServerConfig::resolve(overrides)?)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).context("invalid configuration")?;
    let store = SqliteStore::open(&config.database_url)
        .with_context(|| format!("cannot open database '{}'", config.database_url))?;

    if config.api_key.is_none() {
        tracing::warn!("No API key configured; ingest and admin endpoints are open");
    }
    tracing::info!(
        bind = %config.bind,
        database = %config.database_url,
        ui_dir = %config.ui_dir.display(),
        "Starting Vörðu API"
    );

    let filter = routes(Arc::new(store), &config);
    let (addr, server) = warp::serve(filter)
        .try_bind_with_graceful_shutdown(config.bind, async {
            // a failed signal listener just means no graceful shutdown
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .with_context(|| format!("cannot bind {}", config.bind))?;

    tracing::info!("Listening on http://{}", addr);
    server.await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
