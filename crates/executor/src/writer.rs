use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tokio::select;
use tokio::sync::{mpsc::Receiver, watch};
use tracing::{info, warn};

use super::error::Error;
use super::searcher::SearchReport;
use common::types::ProfitResult;

/// One CSV row per opportunity.
#[derive(Debug, Serialize)]
struct OpportunityRow {
    round: u64,
    cycle: String,
    hops: usize,
    ratio: String,
    percent: String,
}

impl OpportunityRow {
    fn new(round: u64, result: &ProfitResult, display_decimals: i64) -> Self {
        OpportunityRow {
            round,
            cycle: result.cycle.to_string(),
            hops: result.cycle.hops(),
            ratio: result.display_ratio(display_decimals),
            percent: result.display_percent(2),
        }
    }
}

/// Async consumer that reports search results.
///
/// Every opportunity is logged; when a CSV path is configured it is also
/// appended to that file, one row per opportunity.
pub struct ReportWriter {
    receiver: Receiver<SearchReport>,
    shutdown: watch::Receiver<()>, // signal for graceful shutdown
    csv: Option<csv::Writer<File>>,
    display_decimals: i64,
}

impl ReportWriter {
    pub fn new(
        receiver: Receiver<SearchReport>,
        shutdown: watch::Receiver<()>,
        csv_path: Option<&Path>,
        display_decimals: i64,
    ) -> Result<Self, Error> {
        let csv = match csv_path {
            Some(path) => {
                info!(path = %path.display(), "Writing opportunities to CSV");
                Some(csv::Writer::from_path(path)?)
            }
            None => None,
        };

        Ok(Self {
            receiver,
            shutdown,
            csv,
            display_decimals,
        })
    }

    /// Run the writer asynchronously.
    ///
    /// Exits gracefully when the receiver is closed or shutdown signal is received.
    pub async fn process_reports(mut self) -> Result<(), Error> {
        info!("Writer ready.");

        loop {
            select! {
                report = self.receiver.recv() => {
                    match report {
                        Some(report) => self.write_report(&report)?,
                        None => {
                            info!("Receiver closed, shutting down writer.");
                            break;
                        }
                    }
                }

                _ = self.shutdown.changed() => {
                    info!("Shutdown signal received, stopping writer.");
                    break;
                }
            }
        }

        Ok(())
    }

    fn write_report(&mut self, report: &SearchReport) -> Result<(), Error> {
        for failure in &report.skipped {
            warn!(round = report.round, pair = %failure.pair, error = %failure.error, "Pair skipped");
        }

        if report.opportunities.is_empty() {
            info!(
                round = report.round,
                cycles = report.cycles,
                "No arbitrage opportunities."
            );
        }

        for result in &report.opportunities {
            let row = OpportunityRow::new(report.round, result, self.display_decimals);
            info!(
                round = report.round,
                cycle = %row.cycle,
                ratio = %row.ratio,
                percent = %row.percent,
                "Arbitrage opportunity: {result}"
            );
            if let Some(csv) = self.csv.as_mut() {
                csv.serialize(&row)?;
            }
        }

        if let Some(csv) = self.csv.as_mut() {
            csv.flush()?;
        }
        Ok(())
    }

    pub fn spawn_task(self) -> tokio::task::JoinHandle<Result<(), Error>> {
        tokio::spawn(self.process_reports())
    }
}
