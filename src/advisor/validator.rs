//! Advisory validation of the top-ranked strategy.
//!
//! Wraps an `AdvisoryClient` with the throttle-and-fallback policy:
//! each model in the chain gets one attempt, a throttled attempt waits
//! out the server hint (floored) and retries once, and a second
//! throttle on the same model advances to the next model in the chain.
//! Any non-throttle failure abandons the chain immediately; the caller
//! then proceeds on numeric score alone.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{AdvisorError, AdvisoryClient};
use crate::strategy::AdvisoryOutcome;
use crate::types::{AdvisoryVerdict, AgentConstraints, AgentState, MarketTick, ScoredCandidate};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Minimum wait before retrying a throttled model, regardless of how
/// small the server's Retry-After hint is.
const DEFAULT_RETRY_FLOOR: Duration = Duration::from_secs(16);

const DEFAULT_MODELS: &[&str] = &[
    "openai/gpt-4o-mini",
    "anthropic/claude-3.5-haiku",
    "meta-llama/llama-3.1-8b-instruct",
];

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Models to try, in order.
    pub models: Vec<String>,
    /// Floor applied to throttle waits.
    pub retry_floor: Duration,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            retry_floor: DEFAULT_RETRY_FLOOR,
        }
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

pub struct Validator {
    client: Arc<dyn AdvisoryClient>,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(client: Arc<dyn AdvisoryClient>, config: ValidatorConfig) -> Self {
        Validator { client, config }
    }

    /// Ask the oracle whether the top-ranked candidate is sound.
    ///
    /// Returns `Verdict` on any usable response and `NoOpinion` on
    /// every failure mode; never errors, the decision cycle always
    /// proceeds.
    pub async fn validate(
        &self,
        agent_name: &str,
        tick: &MarketTick,
        constraints: &AgentConstraints,
        state: &AgentState,
        scored: &[ScoredCandidate],
    ) -> AdvisoryOutcome {
        let prompt = build_prompt(agent_name, tick, constraints, state, scored);

        for (i, model) in self.config.models.iter().enumerate() {
            debug!(agent = agent_name, model = %model, "Requesting advisory verdict");
            match self.client.complete(model, SYSTEM_PROMPT, &prompt).await {
                Ok(text) => return self.outcome_from_text(agent_name, model, &text),
                Err(AdvisorError::Throttled { retry_after }) => {
                    let wait = retry_after
                        .unwrap_or(Duration::ZERO)
                        .max(self.config.retry_floor);
                    warn!(
                        agent = agent_name,
                        model = %model,
                        wait_secs = wait.as_secs(),
                        "Advisory model throttled, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;

                    match self.client.complete(model, SYSTEM_PROMPT, &prompt).await {
                        Ok(text) => return self.outcome_from_text(agent_name, model, &text),
                        Err(AdvisorError::Throttled { .. }) => {
                            // Persistent throttle: move down the chain.
                            if i + 1 < self.config.models.len() {
                                warn!(
                                    agent = agent_name,
                                    model = %model,
                                    "Still throttled after retry, falling back to next model"
                                );
                            }
                            continue;
                        }
                        Err(e) => return self.abandon(agent_name, model, e),
                    }
                }
                Err(e) => return self.abandon(agent_name, model, e),
            }
        }

        AdvisoryOutcome::NoOpinion("all advisory models rate limited".to_string())
    }

    /// A response arrived; parse it or stop the chain without an
    /// opinion. A reachable-but-incoherent oracle gets no second model.
    fn outcome_from_text(&self, agent_name: &str, model: &str, text: &str) -> AdvisoryOutcome {
        match parse_verdict(text) {
            Some(verdict) => {
                info!(
                    agent = agent_name,
                    model,
                    approve = verdict.approve,
                    "Advisory verdict received"
                );
                AdvisoryOutcome::Verdict(verdict)
            }
            None => {
                warn!(agent = agent_name, model, "Advisory response unparsable");
                AdvisoryOutcome::NoOpinion(format!("unparsable response from {model}"))
            }
        }
    }

    fn abandon(&self, agent_name: &str, model: &str, err: AdvisorError) -> AdvisoryOutcome {
        warn!(agent = agent_name, model, error = %err, "Advisory call failed");
        AdvisoryOutcome::NoOpinion(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Prompt construction
// ---------------------------------------------------------------------------

const SYSTEM_PROMPT: &str = "You are a conservative DeFi risk reviewer. You are shown a yield \
strategy an autonomous agent intends to enter, together with market conditions, the agent's \
mandate, and the runner-up strategies. Judge only whether the top pick is sound for this agent \
today. Respond with a single JSON object and nothing else: \
{\"approve\": true|false, \"reason\": \"one sentence\", \"concerns\": [\"...\"]}";

fn build_prompt(
    agent_name: &str,
    tick: &MarketTick,
    constraints: &AgentConstraints,
    state: &AgentState,
    scored: &[ScoredCandidate],
) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(&format!(
        "Agent: {agent_name}\nDay {}: gas {:.1} gwei, baseline {:.2}% APY, trend {}, sentiment {}\n",
        tick.day, tick.gas_price, tick.baseline_apy, tick.trend, tick.sentiment
    ));
    prompt.push_str(&format!(
        "Current position: {} at {:.2}% APY, balance {:.4} ETH\n",
        state.current_strategy, state.current_apy, state.balance
    ));
    prompt.push_str(&format!(
        "Mandate: risk ceiling {}, max leverage {:.1}x, networks [{}]\n\n",
        constraints.risk_ceiling,
        constraints.max_leverage,
        constraints.allowed_networks.join(", ")
    ));

    if let Some((top, rest)) = scored.split_first() {
        prompt.push_str(&format!(
            "Proposed strategy: {} ({}) -- {:.2}% net APY, risk {}, score {:.2}\nSteps: {}\n",
            top.candidate.name,
            top.candidate.description,
            top.net_apy,
            top.candidate.risk,
            top.net_score,
            top.candidate.steps.join("; ")
        ));
        if !rest.is_empty() {
            prompt.push_str("\nRunners-up:\n");
            for c in rest {
                prompt.push_str(&format!(
                    "- {} ({:.2}% net APY, risk {}, score {:.2})\n",
                    c.candidate.name, c.net_apy, c.candidate.risk, c.net_score
                ));
            }
        }
    }

    prompt.push_str("\nShould the agent enter the proposed strategy today?");
    prompt
}

// ---------------------------------------------------------------------------
// Verdict parsing
// ---------------------------------------------------------------------------

/// Parse a verdict out of raw model output. Tolerates prose and code
/// fences around the JSON object; returns None when no object with the
/// expected shape can be found.
pub fn parse_verdict(text: &str) -> Option<AdvisoryVerdict> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str(trimmed) {
        return Some(v);
    }

    // Fall back to the outermost brace span, which survives markdown
    // fences and leading chatter.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
