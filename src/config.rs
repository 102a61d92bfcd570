//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::{AgentConstraints, SimError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub advisor: AdvisorConfig,
    pub limits: LimitsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub gas: GasConfig,
    pub agents: Vec<AgentEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    /// Number of simulated days to run.
    pub days: u32,
    /// Starting balance per agent, ETH.
    pub initial_balance: f64,
    /// Seed for the simulated market feed.
    pub market_seed: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub api_key_env: String,
    /// Models to try in order; later entries are throttle fallbacks.
    pub models: Vec<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Minimum seconds to wait before retrying a throttled model.
    #[serde(default = "default_retry_floor_secs")]
    pub retry_floor_secs: u64,
}

fn default_retry_floor_secs() -> u64 {
    16
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Shared advisory-call bucket capacity per refill window.
    pub requests_per_window: u32,
    /// Refill window length in seconds.
    pub window_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub gas_penalty_per_gwei: Option<f64>,
    #[serde(default)]
    pub excess_leverage_penalty: Option<f64>,
    #[serde(default)]
    pub contrarian_bonus: Option<f64>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GasConfig {
    /// ETH charged per gas unit at 1000 gwei on a strategy switch.
    pub unit_cost: f64,
}

impl Default for GasConfig {
    fn default() -> Self {
        GasConfig { unit_cost: 0.02 }
    }
}

/// One competing agent: a name plus its mandate.
#[derive(Debug, Deserialize, Clone)]
pub struct AgentEntry {
    pub name: String,
    #[serde(flatten)]
    pub constraints: AgentConstraints,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.agents.is_empty() {
            return Err(SimError::Config("config declares no agents".to_string()).into());
        }
        for agent in &self.agents {
            agent
                .constraints
                .validate()
                .with_context(|| format!("invalid constraints for agent {}", agent.name))?;
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
