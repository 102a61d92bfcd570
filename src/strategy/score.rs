//! Candidate scoring.
//!
//! Assigns each filtered candidate a net fitness score from advertised
//! yield, gas conditions, leverage, risk tier, and agent preferences.
//! Scoring is fully deterministic: ties resolve through a stable
//! agent-identity-derived bias and then by candidate name, never by
//! runtime randomness.

use tracing::debug;

use crate::types::{
    AgentConstraints, MarketTick, RiskTier, ScoredCandidate, StrategyCandidate, Trend,
};

// ---------------------------------------------------------------------------
// Configuration (defaults — overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

/// Scoring coefficients.
#[derive(Debug, Clone)]
pub struct ScoreConfig {
    /// APY points deducted per gwei of gas price.
    pub gas_penalty_per_gwei: f64,
    /// APY points deducted per unit of leverage beyond the agent's cap.
    pub excess_leverage_penalty: f64,
    /// Risk penalty per tier, indexed by `RiskTier::index()`.
    pub risk_penalties: [f64; 4],
    /// Steps beyond this count are penalized for efficiency-minded agents.
    pub free_steps: usize,
    /// Penalty per step beyond `free_steps`.
    pub step_penalty_unit: f64,
    /// Penalty per tier above the agent's ceiling for stability-minded
    /// agents (only reachable when a filter grace is configured).
    pub stability_penalty_unit: f64,
    /// Flat bonus when the market signals an extreme and the agent is
    /// contrarian.
    pub contrarian_bonus: f64,
    /// How many ranked candidates the advisor gets to see.
    pub top_k: usize,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            gas_penalty_per_gwei: 0.015,
            excess_leverage_penalty: 1.5,
            risk_penalties: [0.0, 2.0, 5.0, 8.0],
            free_steps: 3,
            step_penalty_unit: 0.5,
            stability_penalty_unit: 1.0,
            contrarian_bonus: 1.0,
            top_k: 5,
        }
    }
}

impl ScoreConfig {
    pub fn risk_penalty(&self, tier: RiskTier) -> f64 {
        self.risk_penalties[tier.index()]
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

pub struct Scorer {
    config: ScoreConfig,
}

impl Scorer {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Score and rank candidates for one agent under current market
    /// conditions. Output is sorted by net score descending, ties by
    /// candidate name ascending.
    pub fn rank(
        &self,
        agent_name: &str,
        candidates: &[StrategyCandidate],
        tick: &MarketTick,
        constraints: &AgentConstraints,
    ) -> Vec<ScoredCandidate> {
        let mut scored: Vec<ScoredCandidate> = candidates
            .iter()
            .map(|c| self.score_one(agent_name, c, tick, constraints))
            .collect();

        scored.sort_by(|a, b| {
            b.net_score
                .partial_cmp(&a.net_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.candidate.name.cmp(&b.candidate.name))
        });

        if let Some(top) = scored.first() {
            debug!(
                agent = agent_name,
                top = %top.candidate.name,
                net_score = format!("{:.2}", top.net_score),
                net_apy = format!("{:.2}%", top.net_apy),
                candidates = scored.len(),
                "Scoring complete"
            );
        }

        scored
    }

    /// The ranked prefix shown to the advisory oracle.
    pub fn top_k<'a>(&self, scored: &'a [ScoredCandidate]) -> &'a [ScoredCandidate] {
        &scored[..scored.len().min(self.config.top_k)]
    }

    fn score_one(
        &self,
        agent_name: &str,
        candidate: &StrategyCandidate,
        tick: &MarketTick,
        constraints: &AgentConstraints,
    ) -> ScoredCandidate {
        let cfg = &self.config;

        let gas_penalty = tick.gas_price * cfg.gas_penalty_per_gwei;

        let hint = leverage_hint(candidate);
        let implied = hint.clamp(1.0, constraints.max_leverage);
        let over_leverage_penalty = (hint - implied).max(0.0) * cfg.excess_leverage_penalty;

        let risk_penalty = cfg.risk_penalty(candidate.risk);

        let efficiency_penalty = if constraints.weights.efficiency {
            candidate.step_count().saturating_sub(cfg.free_steps) as f64 * cfg.step_penalty_unit
        } else {
            0.0
        };

        let stability_penalty = if constraints.weights.stability {
            candidate
                .risk
                .index()
                .saturating_sub(constraints.risk_ceiling.index()) as f64
                * cfg.stability_penalty_unit
        } else {
            0.0
        };

        let market_extreme =
            tick.sentiment.is_extreme() || !matches!(tick.trend, Trend::Stable);
        let contrarian_bonus = if constraints.weights.contrarian && market_extreme {
            cfg.contrarian_bonus
        } else {
            0.0
        };

        let net_apy = (candidate.expected_apy - gas_penalty - over_leverage_penalty).max(0.0);
        let bias = tie_break_bias(agent_name, &candidate.name);
        let net_score = net_apy - risk_penalty - stability_penalty - efficiency_penalty
            + contrarian_bonus
            + bias;

        ScoredCandidate {
            candidate: candidate.clone(),
            net_score,
            net_apy,
        }
    }
}

// ---------------------------------------------------------------------------
// Leverage hint
// ---------------------------------------------------------------------------

/// Leverage the strategy is believed to use. Prefers the catalog's
/// explicit field; the description-text scan remains only as a
/// compatibility shim for legacy catalogs that lack it.
fn leverage_hint(candidate: &StrategyCandidate) -> f64 {
    candidate
        .leverage_hint
        .or_else(|| parse_leverage_text(&candidate.description))
        .unwrap_or(1.0)
}

/// Find the first "<number>x" pattern in free text, e.g. "3x" or "2.5x".
fn parse_leverage_text(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'x' || bytes[i] == b'X') {
                if let Ok(v) = text[start..i].parse::<f64>() {
                    if v >= 1.0 {
                        return Some(v);
                    }
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Tie-break bias
// ---------------------------------------------------------------------------

/// Small stable offset in [0, 0.1) derived from agent and candidate
/// identity, so equal-scoring candidates rank reproducibly per agent.
fn tie_break_bias(agent_name: &str, candidate_name: &str) -> f64 {
    let hash = fnv1a(format!("{agent_name}:{candidate_name}").as_bytes());
    (hash % 100) as f64 * 0.001
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
