//! Simulated market conditions.
//!
//! Produces the one `MarketTick` all agents share each day. The
//! simulated feed is a seeded deterministic walk so runs are exactly
//! reproducible; two feeds with the same seed emit the same sequence.

use tracing::debug;

use crate::types::{MarketTick, Sentiment, Trend};

/// Source of daily market conditions.
pub trait MarketFeed: Send {
    fn tick(&mut self, day: u32) -> MarketTick;
}

// ---------------------------------------------------------------------------
// Simulated feed
// ---------------------------------------------------------------------------

const GAS_MIN: f64 = 8.0;
const GAS_MAX: f64 = 140.0;
const APY_MIN: f64 = 1.5;
const APY_MAX: f64 = 7.5;

/// Deterministic random-walk feed.
pub struct SimulatedFeed {
    rng: u64,
    gas_price: f64,
    baseline_apy: f64,
    prev_apy: f64,
}

impl SimulatedFeed {
    pub fn new(seed: u64) -> Self {
        SimulatedFeed {
            // xorshift needs a nonzero state.
            rng: seed.max(1),
            gas_price: 30.0,
            baseline_apy: 4.0,
            prev_apy: 4.0,
        }
    }

    /// Next value in [0, 1).
    fn next_unit(&mut self) -> f64 {
        // xorshift64
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }

    fn step(&mut self) {
        // Gas moves up to +-30% per day, APY up to +-0.4 points.
        let gas_drift = (self.next_unit() - 0.5) * 0.6;
        self.gas_price = (self.gas_price * (1.0 + gas_drift)).clamp(GAS_MIN, GAS_MAX);

        self.prev_apy = self.baseline_apy;
        let apy_drift = (self.next_unit() - 0.5) * 0.8;
        self.baseline_apy = (self.baseline_apy + apy_drift).clamp(APY_MIN, APY_MAX);
    }

    fn trend(&self) -> Trend {
        let delta = self.baseline_apy - self.prev_apy;
        if delta > 0.1 {
            Trend::Rising
        } else if delta < -0.1 {
            Trend::Declining
        } else {
            Trend::Stable
        }
    }

    fn sentiment(&mut self) -> Sentiment {
        // High gas reads as crowding (greed), cheap blocks plus weak
        // yield as capitulation (fear).
        if self.gas_price > 80.0 {
            Sentiment::Greed
        } else if self.gas_price < 15.0 && self.baseline_apy < 3.0 {
            Sentiment::Fear
        } else if self.next_unit() < 0.15 {
            // Occasional sentiment swing uncoupled from gas.
            if self.next_unit() < 0.5 {
                Sentiment::Fear
            } else {
                Sentiment::Greed
            }
        } else {
            Sentiment::Neutral
        }
    }
}

impl MarketFeed for SimulatedFeed {
    fn tick(&mut self, day: u32) -> MarketTick {
        self.step();
        let tick = MarketTick {
            day,
            gas_price: self.gas_price,
            baseline_apy: self.baseline_apy,
            trend: self.trend(),
            sentiment: self.sentiment(),
        };
        debug!(%tick, "Market tick");
        tick
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimulatedFeed::new(42);
        let mut b = SimulatedFeed::new(42);
        for day in 0..30 {
            let ta = a.tick(day);
            let tb = b.tick(day);
            assert_eq!(ta.gas_price, tb.gas_price);
            assert_eq!(ta.baseline_apy, tb.baseline_apy);
            assert_eq!(ta.trend, tb.trend);
            assert_eq!(ta.sentiment, tb.sentiment);
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = SimulatedFeed::new(1);
        let mut b = SimulatedFeed::new(2);
        let diverged = (0..10).any(|day| a.tick(day).gas_price != b.tick(day).gas_price);
        assert!(diverged);
    }

    #[test]
    fn test_values_stay_in_bounds() {
        let mut feed = SimulatedFeed::new(7);
        for day in 0..365 {
            let tick = feed.tick(day);
            assert!((GAS_MIN..=GAS_MAX).contains(&tick.gas_price));
            assert!((APY_MIN..=APY_MAX).contains(&tick.baseline_apy));
        }
    }

    #[test]
    fn test_zero_seed_does_not_stall() {
        // xorshift with state 0 is a fixed point; the constructor must
        // dodge it.
        let mut feed = SimulatedFeed::new(0);
        let a = feed.tick(0);
        let b = feed.tick(1);
        assert!(a.gas_price != b.gas_price || a.baseline_apy != b.baseline_apy);
    }

    #[test]
    fn test_tick_carries_requested_day() {
        let mut feed = SimulatedFeed::new(3);
        assert_eq!(feed.tick(17).day, 17);
    }
}
