//! YIELDSIM — Competing Autonomous DeFi Yield Agents
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the shared market feed, catalog, and rate limiter, then runs
//! the day loop: one tick per day, every agent completing its decision
//! cycle before the next day begins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};

use yieldsim::advisor::openrouter::OpenRouterClient;
use yieldsim::advisor::{Validator, ValidatorConfig};
use yieldsim::catalog::StaticCatalog;
use yieldsim::config::AppConfig;
use yieldsim::engine::{Agent, Ledger};
use yieldsim::limits::TokenBucket;
use yieldsim::market::{MarketFeed, SimulatedFeed};
use yieldsim::strategy::{ScoreConfig, Scorer};

const BANNER: &str = r#"
__   _____ _____ _     ____  ____ ___ __  __
\ \ / /_ _| ____| |   |  _ \/ ___|_ _|  \/  |
 \ V / | ||  _| | |   | | | \___ \| || |\/| |
  | |  | || |___| |___| |_| |___) | || |  | |
  |_| |___|_____|_____|____/|____/___|_|  |_|

  Competing Autonomous Yield Agents
  v0.1.0 — Simulation
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        days = cfg.simulation.days,
        agents = cfg.agents.len(),
        initial_balance = cfg.simulation.initial_balance,
        seed = cfg.simulation.market_seed,
        "YIELDSIM starting up"
    );

    // -- Shared components -----------------------------------------------

    let mut feed = SimulatedFeed::new(cfg.simulation.market_seed);
    let catalog = StaticCatalog::standard();
    let ledger = Ledger::new(cfg.gas.unit_cost);

    let mut score_config = ScoreConfig::default();
    if let Some(v) = cfg.scoring.gas_penalty_per_gwei {
        score_config.gas_penalty_per_gwei = v;
    }
    if let Some(v) = cfg.scoring.excess_leverage_penalty {
        score_config.excess_leverage_penalty = v;
    }
    if let Some(v) = cfg.scoring.contrarian_bonus {
        score_config.contrarian_bonus = v;
    }
    if let Some(v) = cfg.scoring.top_k {
        score_config.top_k = v;
    }
    let scorer = Scorer::new(score_config);

    let bucket = TokenBucket::new(
        cfg.limits.requests_per_window,
        Duration::from_secs(cfg.limits.window_secs),
    );

    // Advisory stack. A missing key downgrades the whole run to
    // numeric-only decisions rather than failing it.
    let api_key = std::env::var(&cfg.advisor.api_key_env).unwrap_or_default();
    let advisory_enabled = cfg.advisor.enabled && !api_key.is_empty();
    if cfg.advisor.enabled && api_key.is_empty() {
        warn!(
            env = %cfg.advisor.api_key_env,
            "No advisory API key configured, running numeric-only"
        );
    }
    let client = Arc::new(OpenRouterClient::new(api_key, cfg.advisor.max_tokens)?);
    let validator = Validator::new(
        client.clone(),
        ValidatorConfig {
            models: cfg.advisor.models.clone(),
            retry_floor: Duration::from_secs(cfg.advisor.retry_floor_secs),
        },
    );

    let mut agents: Vec<Agent> = cfg
        .agents
        .iter()
        .map(|entry| {
            Agent::new(
                entry.name.clone(),
                entry.constraints.clone(),
                cfg.simulation.initial_balance,
                advisory_enabled,
            )
        })
        .collect::<Result<_, _>>()?;

    // -- Day loop ----------------------------------------------------------

    for day in 0..cfg.simulation.days {
        let tick = feed.tick(day);
        info!(%tick, "Market open");

        // All agents share the tick and must finish before the next
        // day's conditions are drawn.
        join_all(agents.iter_mut().map(|agent| {
            agent.run_day(&tick, &catalog, &scorer, &validator, &bucket, &ledger)
        }))
        .await;
    }

    // -- Final report ------------------------------------------------------

    let mut standings: Vec<_> = agents
        .iter()
        .map(|a| (a.name().to_string(), a.performance()))
        .collect();
    standings.sort_by(|a, b| {
        b.1.balance
            .partial_cmp(&a.1.balance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!("\n=== Final standings after {} days ===", cfg.simulation.days);
    for (rank, (name, perf)) in standings.iter().enumerate() {
        println!("  {}. {name:<20} {perf}", rank + 1);
    }

    info!(
        advisory_calls = client.total_calls(),
        "YIELDSIM run complete."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("yieldsim=info"));

    let json_logging = std::env::var("YIELDSIM_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
