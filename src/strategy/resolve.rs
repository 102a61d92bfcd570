//! Decision resolution.
//!
//! Combines the ranked scores with the advisory outcome into the final
//! committed decision for the day. Missing advice defaults to proceed;
//! an explicit rejection defaults to caution (fallback search, then
//! HOLD). That asymmetry is deliberate.

use tracing::{debug, info};

use crate::types::{
    AdvisoryVerdict, AgentConstraints, AgentState, Decision, MarketTick, ScoredCandidate,
};

/// A fallback candidate must differ from the rejected top pick by more
/// than this many net-APY points to count as a real alternative.
pub const MIN_DISTINCT_APY: f64 = 0.25;

/// What came back from the advisory stage, including why it was skipped.
#[derive(Debug, Clone)]
pub enum AdvisoryOutcome {
    /// The oracle returned a usable verdict.
    Verdict(AdvisoryVerdict),
    /// The oracle was unreachable or its response unusable.
    NoOpinion(String),
    /// The per-day advisory budget was already spent.
    SkippedDailyBudget,
    /// The process-wide rate limiter denied the call.
    SkippedRateLimit,
    /// Advisory consultation is disabled for this run.
    Disabled,
}

impl AdvisoryOutcome {
    /// The reasoning fragment describing this outcome.
    fn fragment(&self) -> String {
        match self {
            AdvisoryOutcome::Verdict(v) if v.approve => {
                format!("Advisor approved: {}.", v.reason)
            }
            AdvisoryOutcome::Verdict(v) => format!("Advisor rejected: {}.", v.reason),
            AdvisoryOutcome::NoOpinion(cause) => {
                format!("Advisor unavailable ({cause}); proceeding on numeric score.")
            }
            AdvisoryOutcome::SkippedDailyBudget => {
                "Advisory skipped: daily budget exhausted.".to_string()
            }
            AdvisoryOutcome::SkippedRateLimit => {
                "Advisory skipped: request rate limit reached.".to_string()
            }
            AdvisoryOutcome::Disabled => "Advisory disabled.".to_string(),
        }
    }
}

/// Gas-window gate. Runs before filtering and scoring; a violation
/// holds immediately with the violated bound named.
pub fn gas_gate(
    tick: &MarketTick,
    constraints: &AgentConstraints,
    state: &AgentState,
) -> Option<Decision> {
    if constraints.gas_in_window(tick.gas_price) {
        return None;
    }
    let (lo, hi) = constraints.gas_window;
    let reasoning = if tick.gas_price < lo {
        format!(
            "Gas price {:.1} gwei below minimum {lo:.1} gwei; holding current position.",
            tick.gas_price
        )
    } else {
        format!(
            "Gas price {:.1} gwei above maximum {hi:.1} gwei; holding current position.",
            tick.gas_price
        )
    };
    debug!(gas = tick.gas_price, window = ?constraints.gas_window, "Gas gate holds");
    Some(Decision::hold(state, reasoning))
}

/// Resolve the final decision from the ranked candidates and the
/// advisory outcome. Assumes the gas gate already passed.
pub fn resolve(
    scored: &[ScoredCandidate],
    outcome: &AdvisoryOutcome,
    constraints: &AgentConstraints,
    state: &AgentState,
) -> Decision {
    let Some(top) = scored.first() else {
        return Decision::hold(
            state,
            "No strategies satisfy constraints; holding current position.".to_string(),
        );
    };

    let numeric = format!(
        "Top score: {} (net {:.2}% APY, score {:.2}).",
        top.candidate.name, top.net_apy, top.net_score
    );

    match outcome {
        AdvisoryOutcome::Verdict(v) if !v.approve => {
            resolve_rejection(top, &scored[1..], v, &numeric, constraints, state)
        }
        _ => {
            // Approval and every flavour of "no opinion" commit the top
            // pick; no data defaults to proceed.
            commit(top, vec![numeric, outcome.fragment()])
        }
    }
}

/// The advisor explicitly rejected the top pick: look for the first
/// distinct-enough, safe-enough alternative, else hold.
fn resolve_rejection(
    top: &ScoredCandidate,
    rest: &[ScoredCandidate],
    verdict: &AdvisoryVerdict,
    numeric: &str,
    constraints: &AgentConstraints,
    state: &AgentState,
) -> Decision {
    let alternative = rest.iter().find(|c| {
        (c.net_apy - top.net_apy).abs() > MIN_DISTINCT_APY
            && c.candidate.risk.index() <= constraints.risk_ceiling.index() + 1
    });

    match alternative {
        Some(alt) => {
            info!(
                rejected = %top.candidate.name,
                alternative = %alt.candidate.name,
                "Advisor rejected top pick, switching to alternative"
            );
            commit(
                alt,
                vec![
                    numeric.to_string(),
                    format!(
                        "Advisor rejected {} ({}); switching to {}.",
                        top.candidate.name, verdict.reason, alt.candidate.name
                    ),
                ],
            )
        }
        None => {
            info!(rejected = %top.candidate.name, "Advisor rejected top pick, no safe alternative");
            Decision::hold(
                state,
                format!(
                    "{numeric} Advisor rejected {} ({}); no safe alternative found, holding.",
                    top.candidate.name, verdict.reason
                ),
            )
        }
    }
}

fn commit(pick: &ScoredCandidate, fragments: Vec<String>) -> Decision {
    Decision {
        strategy_name: pick.candidate.name.clone(),
        reasoning: fragments.join(" "),
        // Gross APY: the scorer's gas deduction ranks candidates, but
        // the ledger charges gas separately at switch time.
        expected_apy: pick.candidate.expected_apy,
        protocols: pick.candidate.protocols.clone(),
        risk: Some(pick.candidate.risk),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
