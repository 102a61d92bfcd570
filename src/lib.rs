//! YIELDSIM — Competing Autonomous DeFi Yield Agents
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod advisor;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod limits;
pub mod market;
pub mod strategy;
pub mod types;
