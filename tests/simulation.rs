//! Multi-day simulation harness.
//!
//! Drives full decision cycles through the public API: shared market
//! ticks, the standard catalog, scripted advisory verdicts, and the
//! ledger, then checks the portfolio trajectories that fall out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use yieldsim::advisor::{AdvisorError, AdvisoryClient, Validator, ValidatorConfig};
use yieldsim::catalog::StaticCatalog;
use yieldsim::engine::{Agent, Ledger};
use yieldsim::limits::TokenBucket;
use yieldsim::market::{MarketFeed, SimulatedFeed};
use yieldsim::strategy::{ScoreConfig, Scorer};
use yieldsim::types::{
    AgentConstraints, MarketTick, PreferenceWeights, RiskTier, Sentiment, Trend, HOLD,
};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn make_tick(day: u32, gas_price: f64) -> MarketTick {
    MarketTick {
        day,
        gas_price,
        baseline_apy: 4.0,
        trend: Trend::Stable,
        sentiment: Sentiment::Neutral,
    }
}

fn make_constraints(risk_ceiling: RiskTier, gas_window: (f64, f64)) -> AgentConstraints {
    AgentConstraints {
        max_leverage: 3.0,
        allowed_networks: Vec::new(),
        risk_ceiling,
        gas_window,
        preferred_protocols: Vec::new(),
        weights: PreferenceWeights::default(),
    }
}

/// Advisory client that replays a scripted response sequence.
struct ScriptedAdvisor {
    script: Mutex<VecDeque<Result<String, AdvisorError>>>,
}

impl ScriptedAdvisor {
    fn new(script: Vec<Result<String, AdvisorError>>) -> Arc<Self> {
        Arc::new(ScriptedAdvisor {
            script: Mutex::new(script.into()),
        })
    }
}

#[async_trait]
impl AdvisoryClient for ScriptedAdvisor {
    async fn complete(
        &self,
        _model: &str,
        _system: &str,
        _prompt: &str,
    ) -> Result<String, AdvisorError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(r#"{"approve": true, "reason": "fine"}"#.to_string()))
    }
}

struct Harness {
    catalog: StaticCatalog,
    scorer: Scorer,
    validator: Validator,
    bucket: TokenBucket,
    ledger: Ledger,
}

impl Harness {
    fn new(script: Vec<Result<String, AdvisorError>>) -> Self {
        Harness {
            catalog: StaticCatalog::standard(),
            scorer: Scorer::new(ScoreConfig::default()),
            validator: Validator::new(
                ScriptedAdvisor::new(script),
                ValidatorConfig {
                    models: vec!["m1".to_string()],
                    retry_floor: Duration::ZERO,
                },
            ),
            bucket: TokenBucket::new(100, Duration::from_secs(60)),
            ledger: Ledger::new(0.02),
        }
    }

    async fn run_day(&self, agent: &mut Agent, tick: &MarketTick) {
        agent
            .run_day(tick, &self.catalog, &self.scorer, &self.validator, &self.bucket, &self.ledger)
            .await;
    }
}

fn make_agent(name: &str, constraints: AgentConstraints, advisory: bool) -> Agent {
    Agent::new(name.to_string(), constraints, 10.0, advisory).unwrap()
}

// ---------------------------------------------------------------------------
// Trajectory properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_one_transaction_per_day_and_balances_chain() {
    let harness = Harness::new(Vec::new());
    let mut agent = make_agent(
        "chained",
        make_constraints(RiskTier::High, (0.0, 500.0)),
        false,
    );

    for day in 0..10 {
        harness.run_day(&mut agent, &make_tick(day, 25.0)).await;
        assert_eq!(agent.state().transactions.len(), day as usize + 1);
    }

    let txs = &agent.state().transactions;
    for (i, window) in txs.windows(2).enumerate() {
        assert_eq!(window[0].day, i as u32);
        assert_eq!(window[1].balance_before, window[0].balance_after);
    }
    assert_eq!(agent.state().balance, txs.last().unwrap().balance_after);
}

#[tokio::test]
async fn test_gas_charged_only_when_strategy_changes() {
    let harness = Harness::new(Vec::new());
    let mut agent = make_agent(
        "holder",
        make_constraints(RiskTier::High, (0.0, 500.0)),
        false,
    );

    // Stable conditions: day 0 enters a strategy, later days re-affirm.
    for day in 0..5 {
        harness.run_day(&mut agent, &make_tick(day, 25.0)).await;
    }

    let txs = &agent.state().transactions;
    assert!(txs[0].gas_cost > 0.0, "first entry pays gas");
    for tx in &txs[1..] {
        assert_eq!(tx.gas_cost, 0.0, "re-affirmed position is free: {tx}");
    }
    assert!(agent.state().balance > 10.0 - txs[0].gas_cost);
}

#[tokio::test]
async fn test_gas_charged_iff_action_differs() {
    let harness = Harness::new(Vec::new());
    let mut agent = make_agent(
        "invariant",
        make_constraints(RiskTier::High, (0.0, 500.0)),
        false,
    );

    // Stable conditions: day 0 enters, days 1-2 re-affirm the same
    // action string.
    for day in 0..3 {
        harness.run_day(&mut agent, &make_tick(day, 25.0)).await;
    }

    for w in agent.state().transactions.windows(2) {
        assert_eq!(
            w[1].action != w[0].action,
            w[1].gas_cost > 0.0,
            "day {}: {:?} -> {:?} with gas {}",
            w[1].day,
            w[0].action,
            w[1].action,
            w[1].gas_cost
        );
    }
}

#[tokio::test]
async fn test_identical_runs_are_identical() {
    let run = || async {
        let harness = Harness::new(Vec::new());
        let mut feed = SimulatedFeed::new(1234);
        let mut agent = make_agent(
            "det",
            make_constraints(RiskTier::High, (0.0, 500.0)),
            false,
        );
        for day in 0..30 {
            let tick = feed.tick(day);
            harness.run_day(&mut agent, &tick).await;
        }
        (
            agent.state().balance,
            agent.state().current_strategy.clone(),
        )
    };

    assert_eq!(run().await, run().await);
}

// ---------------------------------------------------------------------------
// Gas window
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_gas_spike_holds_prior_strategy_without_gas() {
    let harness = Harness::new(Vec::new());
    let mut agent = make_agent(
        "windowed",
        make_constraints(RiskTier::High, (5.0, 50.0)),
        false,
    );

    harness.run_day(&mut agent, &make_tick(0, 25.0)).await;
    let entered = agent.state().current_strategy.clone();
    assert_ne!(entered, HOLD);

    // Spike above the window: the position is kept as-is.
    harness.run_day(&mut agent, &make_tick(1, 90.0)).await;

    let tx = &agent.state().transactions[1];
    assert_eq!(agent.state().current_strategy, entered);
    assert_eq!(tx.gas_cost, 0.0);
    assert!(tx.reasoning.contains("above maximum"));
    // Yield still accrued while parked.
    assert!(tx.balance_after > tx.balance_before);
}

// ---------------------------------------------------------------------------
// Advisory interaction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_rejection_switches_away_from_top_pick() {
    // Same agent name twice so both rank identically: the numeric-only
    // run reveals the top pick, the rejected run must land elsewhere.
    let numeric = Harness::new(Vec::new());
    let reject = Harness::new(vec![Ok(
        r#"{"approve": false, "reason": "overexposed", "concerns": ["concentration"]}"#
            .to_string(),
    )]);

    let constraints = make_constraints(RiskTier::High, (0.0, 500.0));
    let mut baseline_agent = make_agent("twin", constraints.clone(), false);
    let mut rejected_agent = make_agent("twin", constraints, true);

    let tick = make_tick(0, 25.0);
    numeric.run_day(&mut baseline_agent, &tick).await;
    reject.run_day(&mut rejected_agent, &tick).await;

    let top_pick = baseline_agent.state().current_strategy.clone();
    assert_ne!(top_pick, HOLD);
    assert_ne!(rejected_agent.state().current_strategy, HOLD);
    assert_ne!(rejected_agent.state().current_strategy, top_pick);
    assert!(rejected_agent.state().transactions[0]
        .reasoning
        .contains("overexposed"));
}

#[tokio::test]
async fn test_shared_bucket_starves_second_agent() {
    // Capacity 1: the first agent's advisory call drains the bucket,
    // the second proceeds numeric-only and says so.
    let catalog = StaticCatalog::standard();
    let scorer = Scorer::new(ScoreConfig::default());
    let validator = Validator::new(
        ScriptedAdvisor::new(Vec::new()),
        ValidatorConfig {
            models: vec!["m1".to_string()],
            retry_floor: Duration::ZERO,
        },
    );
    let bucket = TokenBucket::new(1, Duration::from_secs(600));
    let ledger = Ledger::default();

    let constraints = make_constraints(RiskTier::Medium, (0.0, 500.0));
    let mut first = make_agent("first", constraints.clone(), true);
    let mut second = make_agent("second", constraints, true);

    let tick = make_tick(0, 25.0);
    first
        .run_day(&tick, &catalog, &scorer, &validator, &bucket, &ledger)
        .await;
    second
        .run_day(&tick, &catalog, &scorer, &validator, &bucket, &ledger)
        .await;

    assert!(first.state().transactions[0].reasoning.contains("Advisor approved"));
    assert!(second.state().transactions[0].reasoning.contains("rate limit"));
    // Starvation never blocks the decision itself.
    assert_ne!(second.state().current_strategy, HOLD);
}

#[tokio::test]
async fn test_advisory_outage_still_commits_on_numeric_score() {
    let harness = Harness::new(vec![Err(AdvisorError::Http {
        status: 503,
        message: "upstream unavailable".to_string(),
    })]);
    let mut agent = make_agent(
        "orphaned",
        make_constraints(RiskTier::Medium, (0.0, 500.0)),
        true,
    );

    harness.run_day(&mut agent, &make_tick(0, 25.0)).await;

    let tx = &agent.state().transactions[0];
    assert!(tx.reasoning.contains("Advisor unavailable"));
    assert_ne!(agent.state().current_strategy, HOLD);
}

// ---------------------------------------------------------------------------
// Mandate divergence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_conservative_and_aggressive_agents_diverge() {
    let harness = Harness::new(Vec::new());
    let mut cautious = make_agent(
        "cautious",
        make_constraints(RiskTier::Low, (0.0, 500.0)),
        false,
    );
    let mut degen = Agent::new(
        "degen".to_string(),
        AgentConstraints {
            max_leverage: 10.0,
            ..make_constraints(RiskTier::Extreme, (0.0, 500.0))
        },
        10.0,
        false,
    )
    .unwrap();

    let tick = make_tick(0, 25.0);
    harness.run_day(&mut cautious, &tick).await;
    harness.run_day(&mut degen, &tick).await;

    assert_ne!(
        cautious.state().current_strategy,
        degen.state().current_strategy
    );
}

#[tokio::test]
async fn test_day_barrier_runs_all_agents_on_shared_tick() {
    let harness = Harness::new(Vec::new());
    let mut agents: Vec<Agent> = (0..4)
        .map(|i| {
            make_agent(
                &format!("agent-{i}"),
                make_constraints(RiskTier::High, (0.0, 500.0)),
                false,
            )
        })
        .collect();

    let mut feed = SimulatedFeed::new(99);
    for day in 0..5 {
        let tick = feed.tick(day);
        join_all(
            agents
                .iter_mut()
                .map(|agent| harness.run_day(agent, &tick)),
        )
        .await;
    }

    for agent in &agents {
        assert_eq!(agent.state().transactions.len(), 5);
        assert_eq!(agent.state().transactions.last().unwrap().day, 4);
    }
}
