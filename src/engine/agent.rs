//! Per-agent decision cycle.
//!
//! One `Agent` owns its mandate, its portfolio, and its day-scoped
//! advisory budget. `run_day` walks the full cycle: gas gate, catalog
//! fetch, filter, score, optional advisory check, resolution, ledger
//! application. The cycle never fails; every failure mode degrades to
//! a HOLD with its cause in the reasoning.

use tracing::{info, warn};

use crate::advisor::Validator;
use crate::catalog::StrategyCatalog;
use crate::engine::ledger::Ledger;
use crate::limits::{DailyAdvisoryBudget, TokenBucket};
use crate::strategy::{self, AdvisoryOutcome, Scorer};
use crate::types::{AgentConstraints, AgentState, Decision, MarketTick, Performance, SimError};

pub struct Agent {
    name: String,
    constraints: AgentConstraints,
    state: AgentState,
    day_budget: DailyAdvisoryBudget,
    advisory_enabled: bool,
}

impl Agent {
    pub fn new(
        name: String,
        constraints: AgentConstraints,
        initial_balance: f64,
        advisory_enabled: bool,
    ) -> Result<Self, SimError> {
        constraints.validate()?;
        Ok(Agent {
            name,
            constraints,
            state: AgentState::new(initial_balance),
            day_budget: DailyAdvisoryBudget::new(),
            advisory_enabled,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn current_strategy(&self) -> &str {
        &self.state.current_strategy
    }

    pub fn performance(&self) -> Performance {
        Performance::of(&self.state)
    }

    /// Run one full decision cycle and apply the outcome to the
    /// portfolio. Appends exactly one transaction.
    pub async fn run_day(
        &mut self,
        tick: &MarketTick,
        catalog: &dyn StrategyCatalog,
        scorer: &Scorer,
        validator: &Validator,
        bucket: &TokenBucket,
        ledger: &Ledger,
    ) {
        let decision = self.decide(tick, catalog, scorer, validator, bucket).await;

        ledger.apply(&mut self.state, &decision, tick);

        info!(
            agent = %self.name,
            day = tick.day,
            strategy = %decision.strategy_name,
            apy = format!("{:.2}%", decision.expected_apy),
            balance = format!("{:.4}", self.state.balance),
            "Day complete"
        );
    }

    async fn decide(
        &mut self,
        tick: &MarketTick,
        catalog: &dyn StrategyCatalog,
        scorer: &Scorer,
        validator: &Validator,
        bucket: &TokenBucket,
    ) -> Decision {
        // Gas gate comes first: outside the window nothing else runs,
        // no advisory budget is spent.
        if let Some(hold) = strategy::gas_gate(tick, &self.constraints, &self.state) {
            return hold;
        }

        let candidates = match catalog.fetch(tick).await {
            Ok(c) => c,
            Err(e) => {
                warn!(agent = %self.name, day = tick.day, error = %e, "Catalog fetch failed");
                return Decision::hold(
                    &self.state,
                    format!("Catalog unavailable ({e}); maintaining current position."),
                );
            }
        };

        let filtered = strategy::filter_candidates(&candidates, &self.constraints);
        let scored = scorer.rank(&self.name, &filtered, tick, &self.constraints);

        let outcome = if scored.is_empty() || !self.advisory_enabled {
            AdvisoryOutcome::Disabled
        } else if !self.day_budget.try_consume(tick.day) {
            AdvisoryOutcome::SkippedDailyBudget
        } else if !bucket.take() {
            AdvisoryOutcome::SkippedRateLimit
        } else {
            validator
                .validate(
                    &self.name,
                    tick,
                    &self.constraints,
                    &self.state,
                    scorer.top_k(&scored),
                )
                .await
        };

        strategy::resolve(&scored, &outcome, &self.constraints, &self.state)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
