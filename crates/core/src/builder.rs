use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::graph::RateGraph;
use super::traits::RateProvider;
use common::{error::Error, types::AssetPair};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

/// A pair that could not be turned into graph edges, and why.
#[derive(Debug, Clone, PartialEq)]
pub struct PairFailure {
    pub pair: AssetPair,
    pub error: Error,
}

/// Outcome of one build: the graph over every pair that succeeded plus the
/// pairs that were skipped.
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub graph: RateGraph,
    pub failures: Vec<PairFailure>,
}

/// Turns a list of pairs into a [`RateGraph`] by querying a [`RateProvider`].
///
/// Up to `max_concurrent_fetches` quotes are in flight at once. Results are applied
/// in input order whatever order they complete in, so a later duplicate of a pair
/// overwrites an earlier one and the graph is identical across runs with the
/// same quotes. A failing pair is logged and skipped; the build carries on.
#[derive(Debug, Clone)]
pub struct RateGraphBuilder {
    max_concurrent_fetches: usize,
}

impl RateGraphBuilder {
    pub fn new(max_concurrent_fetches: usize) -> Self {
        RateGraphBuilder {
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        }
    }

    pub async fn build<P>(&self, provider: &P, pairs: &[AssetPair]) -> GraphBuild
    where
        P: RateProvider + ?Sized,
    {
        let mut build = GraphBuild::default();

        let quotes: Vec<_> = stream::iter(pairs)
            .map(|pair| async move {
                // Never hits the provider for a pair that cannot become an edge.
                if pair.is_self_pair() {
                    return (pair, Err(Error::SelfPair(pair.base.clone())));
                }
                (pair, provider.fetch_rates(pair).await)
            })
            .buffered(self.max_concurrent_fetches)
            .boxed()
            .collect()
            .await;

        for (pair, quote) in quotes {
            let inserted = quote.and_then(|quote| build.graph.insert_pair(pair, quote));
            match inserted {
                Ok(()) => debug!(%pair, "Pair added to rate graph"),
                Err(error) => {
                    warn!(%pair, %error, "Skipping pair");
                    build.failures.push(PairFailure {
                        pair: pair.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            pairs = pairs.len(),
            assets = build.graph.asset_count(),
            edges = build.graph.edge_count(),
            skipped = build.failures.len(),
            "Rate graph built"
        );

        build
    }
}

impl Default for RateGraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_FETCHES)
    }
}
