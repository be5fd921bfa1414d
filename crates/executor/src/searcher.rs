use std::sync::Arc;
use tokio::select;
use tokio::sync::{mpsc::Sender, watch};
use tokio::time::{self, Duration};
use tracing::{error, info};

use super::config::SearcherConfig;
use super::error::Error;
use common::types::{AssetPair, ProfitResult};
use cycle_arb_core::{
    DfsCycleFinder, ProfitEvaluator, RateGraphBuilder, builder::PairFailure,
    traits::{CycleFinder, RateProvider},
};

/// Outcome of one search round over a fresh rate graph.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub round: u64,
    pub assets: usize,
    pub edges: usize,
    pub skipped: Vec<PairFailure>,
    pub cycles: usize,
    /// Profitable cycles only, in discovery order.
    pub opportunities: Vec<ProfitResult>,
}

/// Rebuilds the rate graph from the provider and scans it for profitable cycles,
/// once or on a fixed interval.
pub struct ArbSearcher<P: ?Sized> {
    provider: Arc<P>,
    pairs: Vec<AssetPair>,
    builder: RateGraphBuilder,
    finder: DfsCycleFinder,
    interval: u64, // interval in seconds, 0 for a single round
}

impl<P> ArbSearcher<P>
where
    P: RateProvider + ?Sized,
{
    pub fn new(provider: Arc<P>, pairs: Vec<AssetPair>, config: &SearcherConfig) -> Self {
        ArbSearcher {
            provider,
            pairs,
            builder: RateGraphBuilder::new(config.max_concurrent_fetches),
            finder: DfsCycleFinder::new(config.min_cycle_assets, config.max_cycle_assets),
            interval: config.interval_seconds,
        }
    }

    /// Runs the whole pipeline once: fetch, build, enumerate, evaluate.
    pub async fn run_once(&self, round: u64) -> Result<SearchReport, Error> {
        let build = self.builder.build(self.provider.as_ref(), &self.pairs).await;
        let graph = &build.graph;

        let cycles = self.finder.find_cycles(graph);
        let opportunities = ProfitEvaluator::new(graph).opportunities(&cycles)?;

        info!(
            round,
            cycles = cycles.len(),
            opportunities = opportunities.len(),
            "Search complete"
        );

        Ok(SearchReport {
            round,
            assets: graph.asset_count(),
            edges: graph.edge_count(),
            skipped: build.failures,
            cycles: cycles.len(),
            opportunities,
        })
    }

    /// Searches every `interval` seconds and forwards each report, until shutdown is
    /// signalled or the report receiver is dropped. With an interval of zero a
    /// single round runs and the task ends.
    pub async fn search_for_arbs(
        self,
        reports: Sender<SearchReport>,
        mut shutdown: watch::Receiver<()>,
    ) -> Result<(), Error> {
        info!(pairs = self.pairs.len(), "Searcher ready.");

        if self.interval == 0 {
            let report = self.run_once(0).await?;
            return reports
                .send(report)
                .await
                .map_err(|_| Error::ChannelSendFailed);
        }

        let mut interval = time::interval(Duration::from_secs(self.interval));
        let mut round = 0;

        loop {
            select! {
                _ = interval.tick() => {
                    match self.run_once(round).await {
                        Ok(report) => {
                            if reports.send(report).await.is_err() {
                                error!("Report receiver dropped, stopping searcher.");
                                return Err(Error::ChannelSendFailed);
                            }
                        }
                        Err(e) => {
                            error!(round, error = %e, "Search round failed. Continuing.");
                        }
                    }
                    self.provider.advance();
                    round += 1;
                }

                _ = shutdown.changed() => {
                    info!("Shutdown signal received, stopping searcher.");
                    break;
                }
            }
        }

        Ok(())
    }
}
