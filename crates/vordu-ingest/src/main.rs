//! vordu-ingest - compute and post roadmap status for one repository

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use vordu_ingest::{IngestionOutput, RunInputs, VorduClient};

#[derive(Debug, Parser)]
#[command(name = "vordu-ingest", version, about = "Ingest catalog, features and test reports into Vörðu")]
struct Cli {
    /// Path to catalog-info.yaml
    catalog: PathBuf,

    /// Cucumber JSON report (repeatable)
    #[arg(long = "report", value_name = "FILE")]
    reports: Vec<PathBuf>,

    /// Root of the feature file tree
    #[arg(long, value_name = "DIR")]
    features: Option<PathBuf>,

    /// Vörðu API base URL; without it payloads are printed (dry run)
    #[arg(long, env = "VORDU_API_URL")]
    api_url: Option<String>,

    /// API key sent as X-API-Key
    #[arg(long, env = "VORDU_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Bound on each outbound call, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_dry_run(output: &IngestionOutput) -> Result<()> {
    if let Some(config) = &output.config {
        println!("--- config ---");
        println!("{}", serde_json::to_string_pretty(config)?);
    }
    println!("--- status ---");
    println!("{}", serde_json::to_string_pretty(&output.cells)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let inputs = RunInputs {
        catalog: cli.catalog,
        reports: cli.reports,
        features: cli.features,
    };
    let output = inputs.execute().context("ingestion run failed")?;

    let Some(api_url) = cli.api_url else {
        return print_dry_run(&output);
    };

    let client = VorduClient::new(
        api_url,
        cli.api_key,
        Duration::from_secs(cli.timeout_secs),
    )?;

    if let Some(config) = &output.config {
        client
            .post_config(config)
            .await
            .context("config ingest failed; status not posted")?;
    }

    let count = client
        .post_status(&output.cells)
        .await
        .context("status ingest failed")?;
    tracing::info!("Vörðu updated: {} cells", count);
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
