use clap::Subcommand;
use std::path::PathBuf;
use tokio::task::JoinHandle;

use super::error::Error;

/// Where the searcher reads its rates from.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum DataSource {
    /// Seeded random reserves around the configured USD prices.
    Sim,
    /// Reserve snapshots replayed from a CSV file.
    Csv {
        /// File with `asset_a,asset_b,reserve_a,reserve_b,decimals_a,decimals_b` rows.
        #[arg(long)]
        reserves: PathBuf,
    },
}

pub type JoinHandleResult = JoinHandle<Result<(), Error>>;
