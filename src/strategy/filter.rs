//! Candidate filtering against agent constraints.
//!
//! Reduces the full catalog snapshot to the candidates one agent may
//! even consider. Filtering always precedes scoring: the scorer never
//! sees an excluded candidate.

use tracing::debug;

use crate::types::{AgentConstraints, StrategyCandidate};

/// Keep the candidates satisfying the constraints, preserving catalog
/// order. An empty result means the cycle short-circuits to HOLD.
pub fn filter_candidates(
    catalog: &[StrategyCandidate],
    constraints: &AgentConstraints,
) -> Vec<StrategyCandidate> {
    let survivors: Vec<StrategyCandidate> = catalog
        .iter()
        .filter(|c| passes(c, constraints))
        .cloned()
        .collect();

    debug!(
        catalog = catalog.len(),
        survivors = survivors.len(),
        risk_ceiling = %constraints.risk_ceiling,
        "Candidate filter complete"
    );

    survivors
}

/// Whether a single candidate satisfies every constraint.
fn passes(candidate: &StrategyCandidate, constraints: &AgentConstraints) -> bool {
    // Risk: at most the ceiling tier, no grace.
    if candidate.risk.index() > constraints.risk_ceiling.index() {
        return false;
    }

    // Networks: intersection required unless the agent is unrestricted
    // or the candidate declares none.
    if !constraints.allowed_networks.is_empty()
        && !candidate.networks.is_empty()
        && !intersects(&candidate.networks, &constraints.allowed_networks)
    {
        return false;
    }

    // Protocols: intersection required unless the agent has no preference.
    if !constraints.preferred_protocols.is_empty()
        && !intersects(&candidate.protocols, &constraints.preferred_protocols)
    {
        return false;
    }

    true
}

fn intersects(a: &[String], b: &[String]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.eq_ignore_ascii_case(y)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
