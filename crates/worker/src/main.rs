use std::process::ExitCode;

use clap::Parser;
use freebie_worker::cli::{Cli, EnvSource};
use freebie_worker::config::ConfigError;
use freebie_worker::{exit_code, Pipeline, RunError, RunReport, WorkerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str =
    "freebie_worker=info,freebie_catalog=info,freebie_store=info,freebie_events=info";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Loaded before the subscriber so RUST_LOG can come from the env file.
    let env_source = cli.load_env();

    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let outcome = run(&cli, env_source).await;
    match &outcome {
        Ok(report) => tracing::info!("{report}"),
        Err(e) => tracing::error!(error = %e, "Run aborted"),
    }
    ExitCode::from(exit_code(&outcome))
}

async fn run(
    cli: &Cli,
    env_source: Result<EnvSource, ConfigError>,
) -> Result<RunReport, RunError> {
    let env_source = env_source?;
    tracing::debug!(source = ?env_source, "Environment loaded");

    let config = WorkerConfig::from_env()?;
    tracing::info!(
        promotions_url = %config.promotions_url,
        tracking = %config.tracking,
        dry_run = cli.dry_run,
        "Worker starting"
    );

    Pipeline::from_config(&config)?
        .dry_run(cli.dry_run)
        .run(chrono::Utc::now())
        .await
}
