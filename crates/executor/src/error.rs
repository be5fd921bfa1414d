use thiserror::Error;

use common::error::Error as ArbCoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load config: {0}")]
    ConfigLoadError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid reserve record on line {line}: {reason}")]
    InvalidReserveRecord { line: u64, reason: String },

    #[error("Channel sender failed: Receiver has been dropped.")]
    ChannelSendFailed,

    #[error("Pipeline task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    #[error("Arbitrage search error: {0}")]
    SearchError(#[from] ArbCoreError),
}
