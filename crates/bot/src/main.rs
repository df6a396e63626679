use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use crews::{CrewEngine, Dispatcher};
use tokio::io::BufReader;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod gateway;
mod rest;
mod settings;

use rest::RestChatApi;
use settings::load_settings;

/// Keeps voice categories stocked with a "new crew" channel and posts crew invites.
///
/// Gateway events are read as JSON lines from stdin.
#[derive(Parser, Debug)]
#[command(name = "crewsd", version)]
struct Cli {
    /// TOML configuration file. Defaults to `crews.toml` when present.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if settings.api_token.is_empty() {
        warn!("api_token is empty; platform calls will be rejected");
    }
    let api = RestChatApi::new(&settings.api_base_url, settings.api_token.clone())?;

    let (dispatcher, mut failures) = Dispatcher::new();
    let engine = CrewEngine::new(Arc::new(api), settings.crews.clone(), dispatcher);

    let reporter = tokio::spawn(async move {
        let mut failed = 0usize;
        while let Some(failure) = failures.recv().await {
            failed += 1;
            debug!(task = failure.task, failed, "failure reported");
        }
        if failed > 0 {
            warn!(failed, "background tasks failed during this run");
        }
    });

    info!(
        categories = settings.crews.configured_categories().len(),
        "crewsd started, reading gateway events from stdin"
    );

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = gateway::run_event_stream(&engine, stdin) => {
            let delivered = result.context("gateway stream failed")?;
            info!(delivered, "gateway stream closed");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for shutdown signal")?;
            info!("shutdown requested");
        }
    }

    engine.dispatcher().settle().await;
    drop(engine);
    let _ = reporter.await;
    Ok(())
}
