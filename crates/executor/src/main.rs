pub mod config;
pub mod csv_provider;
pub mod error;
pub mod searcher;
pub mod simulator;
pub mod types;
pub mod writer;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use csv_provider::CsvRateProvider;
use cycle_arb_core::traits::RateProvider;
use error::Error;
use searcher::{ArbSearcher, SearchReport};
use simulator::SimulatedRateProvider;
use types::{DataSource, JoinHandleResult};
use writer::ReportWriter;

const REPORT_BUFFER: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "executor")]
#[command(about = "Scan a set of asset pairs for profitable conversion cycles")]
struct Cli {
    /// Config file; defaults to crates/executor/Config.toml under the current directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rate source; `sim` when omitted.
    #[command(subcommand)]
    source: Option<DataSource>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => {
            info!("Pipeline shut down.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = config::load_config(cli.config.as_deref())?;

    match cli.source.unwrap_or(DataSource::Sim) {
        DataSource::Sim => {
            info!(seed = config.simulator.seed, "Starting simulated rate source...");
            let provider = SimulatedRateProvider::new(&config.simulator);
            run_pipeline(Arc::new(provider), &config).await
        }
        DataSource::Csv { reserves } => {
            info!(path = %reserves.display(), "Starting CSV rate source...");
            let provider = CsvRateProvider::from_path(&reserves)?;
            run_pipeline(Arc::new(provider), &config).await
        }
    }
}

async fn run_pipeline<P>(provider: Arc<P>, config: &Config) -> Result<(), Error>
where
    P: RateProvider + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let (sender, receiver) = mpsc::channel::<SearchReport>(REPORT_BUFFER);

    let writer = ReportWriter::new(
        receiver,
        shutdown_rx.clone(),
        config.report.csv_path.as_deref(),
        config.searcher.display_decimals,
    )?;
    let searcher = ArbSearcher::new(provider, config.market.pairs.clone(), &config.searcher);

    let writer_handle = writer.spawn_task();
    let searcher_handle = spawn_searcher(searcher, sender, shutdown_rx);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down."),
            Err(e) => warn!(error = %e, "Unable to listen for Ctrl-C, shutting down."),
        }
        let _ = shutdown_tx.send(());
    });

    let (searcher_result, writer_result) = tokio::join!(searcher_handle, writer_handle);
    searcher_result??;
    writer_result??;
    Ok(())
}

/// Spawn searcher task
fn spawn_searcher<P>(
    searcher: ArbSearcher<P>,
    sender: mpsc::Sender<SearchReport>,
    shutdown: watch::Receiver<()>,
) -> JoinHandleResult
where
    P: RateProvider + 'static,
{
    tokio::spawn(searcher.search_for_arbs(sender, shutdown))
}
