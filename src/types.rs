//! Shared types for the YIELDSIM agents.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that catalog, strategy,
//! advisor, and engine modules can depend on them without
//! circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel strategy name meaning "no active strategy / no change".
pub const HOLD: &str = "HOLD";

/// Every agent starts with this many simulated units.
pub const INITIAL_BALANCE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Market tick
// ---------------------------------------------------------------------------

/// One day of simulated market conditions, produced externally.
/// Immutable; `day` is strictly increasing across a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketTick {
    pub day: u32,
    /// Current gas price in gwei.
    pub gas_price: f64,
    /// Baseline yield environment in APY percentage points.
    pub baseline_apy: f64,
    pub trend: Trend,
    pub sentiment: Sentiment,
}

impl fmt::Display for MarketTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {} | gas {:.1} gwei | baseline {:.2}% | {} | {}",
            self.day, self.gas_price, self.baseline_apy, self.trend, self.sentiment,
        )
    }
}

impl MarketTick {
    /// Helper to build a test tick with sensible defaults.
    #[cfg(test)]
    pub fn sample(day: u32) -> Self {
        MarketTick {
            day,
            gas_price: 25.0,
            baseline_apy: 5.0,
            trend: Trend::Stable,
            sentiment: Sentiment::Neutral,
        }
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction of the yield environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Rising,
    Declining,
    Stable,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Rising => write!(f, "RISING"),
            Trend::Declining => write!(f, "DECLINING"),
            Trend::Stable => write!(f, "STABLE"),
        }
    }
}

/// Aggregate market mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Fear,
    Greed,
    Neutral,
}

impl Sentiment {
    /// Whether the mood is at an extreme (contrarian signal).
    pub fn is_extreme(&self) -> bool {
        !matches!(self, Sentiment::Neutral)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Fear => write!(f, "FEAR"),
            Sentiment::Greed => write!(f, "GREED"),
            Sentiment::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Strategy risk tier, ordered LOW < MEDIUM < HIGH < EXTREME.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskTier {
    /// All tiers in ascending order (useful for iteration).
    pub const ALL: &'static [RiskTier] = &[
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Extreme,
    ];

    /// Position in the ordering, 0 = LOW.
    pub fn index(&self) -> usize {
        match self {
            RiskTier::Low => 0,
            RiskTier::Medium => 1,
            RiskTier::High => 2,
            RiskTier::Extreme => 3,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "LOW"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::High => write!(f, "HIGH"),
            RiskTier::Extreme => write!(f, "EXTREME"),
        }
    }
}

/// Attempt to parse a string into a RiskTier (case-insensitive).
impl std::str::FromStr for RiskTier {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskTier::Low),
            "medium" | "med" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            "extreme" => Ok(RiskTier::Extreme),
            _ => Err(anyhow::anyhow!("Unknown risk tier: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy catalog types
// ---------------------------------------------------------------------------

/// One yield strategy offered by the catalog. Immutable per fetch;
/// the catalog may change between days.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyCandidate {
    /// Unique within a catalog snapshot.
    pub name: String,
    pub description: String,
    /// Advertised yield in APY percentage points, before costs.
    pub expected_apy: f64,
    pub protocols: Vec<String>,
    pub networks: Vec<String>,
    pub risk: RiskTier,
    /// On-chain operations required to enter the strategy.
    pub steps: Vec<String>,
    /// Leverage used by the strategy. Catalogs that predate this field
    /// leave it unset and the scorer falls back to parsing the
    /// description text.
    #[serde(default)]
    pub leverage_hint: Option<f64>,
}

impl StrategyCandidate {
    /// Number of on-chain operations (proxy for execution complexity).
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for StrategyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.1}% APY, {}, {} steps) [{}]",
            self.name,
            self.expected_apy,
            self.risk,
            self.step_count(),
            self.networks.join("/"),
        )
    }
}

// ---------------------------------------------------------------------------
// Agent constraints
// ---------------------------------------------------------------------------

/// Scoring preferences an agent weights into its ranking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PreferenceWeights {
    /// Penalize strategies with many on-chain steps.
    #[serde(default)]
    pub efficiency: bool,
    /// Penalize strategies riding at the agent's risk ceiling.
    #[serde(default)]
    pub stability: bool,
    /// Reward entering when sentiment or trend is at an extreme.
    #[serde(default)]
    pub contrarian: bool,
}

/// Per-agent constraints, supplied at construction and immutable for
/// the agent's lifetime in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConstraints {
    /// Maximum leverage the agent tolerates (>= 1).
    pub max_leverage: f64,
    /// Networks the agent may touch. Empty = no restriction.
    #[serde(default)]
    pub allowed_networks: Vec<String>,
    pub risk_ceiling: RiskTier,
    /// Inclusive [min, max] gas price window (gwei) within which the
    /// agent is willing to transact at all.
    pub gas_window: (f64, f64),
    /// Protocols the agent prefers. Empty = no restriction.
    #[serde(default)]
    pub preferred_protocols: Vec<String>,
    #[serde(default)]
    pub weights: PreferenceWeights,
}

impl AgentConstraints {
    /// Sanity-check the constraint values.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.max_leverage < 1.0 {
            return Err(SimError::Constraints(format!(
                "max_leverage must be >= 1, got {}",
                self.max_leverage
            )));
        }
        let (lo, hi) = self.gas_window;
        if lo < 0.0 || hi < lo {
            return Err(SimError::Constraints(format!(
                "gas_window must satisfy 0 <= min <= max, got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }

    /// Whether a gas price falls inside the agent's window (inclusive).
    pub fn gas_in_window(&self, gas_price: f64) -> bool {
        let (lo, hi) = self.gas_window;
        gas_price >= lo && gas_price <= hi
    }

    /// Permissive defaults useful for tests.
    #[cfg(test)]
    pub fn permissive() -> Self {
        AgentConstraints {
            max_leverage: 3.0,
            allowed_networks: Vec::new(),
            risk_ceiling: RiskTier::Extreme,
            gas_window: (0.0, 1000.0),
            preferred_protocols: Vec::new(),
            weights: PreferenceWeights::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived decision types
// ---------------------------------------------------------------------------

/// A candidate with its computed fitness. Recomputed every cycle,
/// never persisted beyond one cycle.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: StrategyCandidate,
    /// Final ranking value after all penalties and bonuses.
    pub net_score: f64,
    /// Expected APY after gas and leverage costs, floored at zero.
    pub net_apy: f64,
}

impl fmt::Display for ScoredCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | net {:.2}% APY | score {:.2}",
            self.candidate.name, self.net_apy, self.net_score,
        )
    }
}

/// Structured verdict parsed from the advisory oracle's free-form text.
/// Absence of a verdict is "no opinion", not a rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryVerdict {
    pub approve: bool,
    pub reason: String,
    #[serde(default)]
    pub concerns: Vec<String>,
}

impl fmt::Display for AdvisoryVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            if self.approve { "APPROVE" } else { "REJECT" },
            self.reason,
        )?;
        if !self.concerns.is_empty() {
            write!(f, " (concerns: {})", self.concerns.join("; "))?;
        }
        Ok(())
    }
}

/// Final resolved decision for one agent-day. Immutable once returned.
///
/// A hold re-affirms the prior strategy: `strategy_name` and
/// `expected_apy` repeat the agent's current values so the ledger
/// charges no gas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub strategy_name: String,
    pub reasoning: String,
    pub expected_apy: f64,
    pub protocols: Vec<String>,
    pub risk: Option<RiskTier>,
}

impl Decision {
    /// Build a hold decision that re-affirms the agent's current position.
    pub fn hold(state: &AgentState, reasoning: String) -> Self {
        Decision {
            strategy_name: state.current_strategy.clone(),
            reasoning,
            expected_apy: state.current_apy,
            protocols: Vec::new(),
            risk: None,
        }
    }

    /// Whether this decision keeps the given state's current strategy.
    pub fn is_hold_for(&self, state: &AgentState) -> bool {
        self.strategy_name == state.current_strategy
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.2}% APY — {}",
            self.strategy_name, self.expected_apy, self.reasoning,
        )
    }
}

// ---------------------------------------------------------------------------
// Ledger types
// ---------------------------------------------------------------------------

/// Append-only ledger entry; never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub day: u32,
    /// The strategy name committed for the day.
    pub action: String,
    pub reasoning: String,
    pub balance_before: f64,
    pub balance_after: f64,
    /// Zero unless the strategy changed this day.
    pub gas_cost: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day {} | {} | {:.4} -> {:.4} (gas {:.4})",
            self.day, self.action, self.balance_before, self.balance_after, self.gas_cost,
        )
    }
}

/// Portfolio state owned exclusively by one agent instance.
/// Mutated only by the ledger step, once per day, in day order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub initial_balance: f64,
    pub balance: f64,
    pub current_strategy: String,
    pub current_apy: f64,
    pub transactions: Vec<Transaction>,
}

impl AgentState {
    /// Fresh state holding only the sentinel position.
    pub fn new(initial_balance: f64) -> Self {
        AgentState {
            initial_balance,
            balance: initial_balance,
            current_strategy: HOLD.to_string(),
            current_apy: 0.0,
            transactions: Vec::new(),
        }
    }

    /// Cumulative gas paid across all ledger entries.
    pub fn total_gas(&self) -> f64 {
        self.transactions.iter().map(|t| t.gas_cost).sum()
    }

    /// Percentage return since the start of the run.
    pub fn return_pct(&self) -> f64 {
        if self.initial_balance <= 0.0 {
            0.0
        } else {
            (self.balance - self.initial_balance) / self.initial_balance * 100.0
        }
    }
}

impl Default for AgentState {
    fn default() -> Self {
        AgentState::new(INITIAL_BALANCE)
    }
}

/// Performance snapshot computed purely from `AgentState`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Performance {
    pub initial_balance: f64,
    pub balance: f64,
    pub return_pct: f64,
    pub total_gas: f64,
    pub transaction_count: usize,
}

impl Performance {
    pub fn of(state: &AgentState) -> Self {
        Performance {
            initial_balance: state.initial_balance,
            balance: state.balance,
            return_pct: state.return_pct(),
            total_gas: state.total_gas(),
            transaction_count: state.transactions.len(),
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "balance {:.4} ({}{:.2}%) | gas {:.4} | {} txs",
            self.balance,
            if self.return_pct >= 0.0 { "+" } else { "" },
            self.return_pct,
            self.total_gas,
            self.transaction_count,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for YIELDSIM.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Invalid constraints: {0}")]
    Constraints(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
