pub mod builder;
pub mod cycles;
pub mod graph;
pub mod profit;
pub mod traits;

pub use builder::{GraphBuild, PairFailure, RateGraphBuilder};
pub use cycles::DfsCycleFinder;
pub use graph::RateGraph;
pub use profit::ProfitEvaluator;
