use thiserror::Error;

use crate::types::{AssetId, AssetPair};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The rate provider could not quote the pair (no market, provider failure).
    #[error("Rates unavailable for pair {pair}: {reason}")]
    RateUnavailable { pair: AssetPair, reason: String },

    /// A quoted rate was zero, negative or not representable as a finite decimal.
    #[error("Invalid rate {rate} for edge {from} -> {to}")]
    InvalidRate {
        from: AssetId,
        to: AssetId,
        rate: String,
    },

    /// A pair whose two sides are the same asset.
    #[error("Asset {0} cannot be paired with itself")]
    SelfPair(AssetId),

    /// A cycle references an edge the graph does not contain.
    #[error("Edge {from} -> {to} not found in rate graph")]
    EdgeNotFound { from: AssetId, to: AssetId },

    /// A cycle that is not closed or too short to contain an edge.
    #[error("Malformed cycle: {0}")]
    MalformedCycle(String),
}
