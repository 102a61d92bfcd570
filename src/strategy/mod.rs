//! Strategy selection pipeline: filter, score, resolve.

pub mod filter;
pub mod resolve;
pub mod score;

pub use filter::filter_candidates;
pub use resolve::{gas_gate, resolve, AdvisoryOutcome, MIN_DISTINCT_APY};
pub use score::{ScoreConfig, Scorer};
