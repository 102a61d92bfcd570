//! Simulation engine: per-agent decision cycle and portfolio ledger.

pub mod agent;
pub mod ledger;

pub use agent::Agent;
pub use ledger::Ledger;
