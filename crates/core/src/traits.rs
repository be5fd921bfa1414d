use async_trait::async_trait;

use super::graph::RateGraph;
use common::{
    error::Error,
    types::{AssetPair, Cycle, RateQuote},
};

/// Source of live exchange rates (price oracle, on-chain reserves, replay file).
///
/// Implementations own their own retry and timeout policy; the core only sees a
/// quote or an error for each pair.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns both directional rates of `pair`, read from a single snapshot.
    ///
    /// `Err(Error::RateUnavailable)` when no market exists or the source failed.
    async fn fetch_rates(&self, pair: &AssetPair) -> Result<RateQuote, Error>;

    /// Moves a replayed or simulated source on to its next snapshot between search
    /// rounds. Live sources have nothing to do.
    fn advance(&self) {}
}

/// Trait for graph searches enumerating simple cycles.
pub trait CycleFinder {
    /// Returns every distinct simple cycle of `graph`, each normalised to its
    /// smallest rotation, in a deterministic order.
    fn find_cycles(&self, graph: &RateGraph) -> Vec<Cycle>;
}
