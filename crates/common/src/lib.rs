pub mod error;
pub mod numeric_kernel;
pub mod types;

pub use error::Error;
pub use types::{AssetId, AssetPair, Cycle, ProfitResult, RateQuote, ReserveSnapshot};
