//! Resource budgets governing advisory-oracle calls.
//!
//! Two independent limiters gate every advisory call. The day-scoped
//! budget models "at most one external check per simulated day per
//! agent"; the process-wide token bucket bounds the real request rate
//! across all agents so an upstream rate ceiling is respected. A call
//! proceeds only when both grant a token.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

// ---------------------------------------------------------------------------
// Day-scoped single-use budget
// ---------------------------------------------------------------------------

/// Grants exactly one advisory-call token per simulated day.
///
/// Per-agent state; a new `day` value resets the token, a repeated
/// `day` after consumption denies. Independent of wall-clock time.
#[derive(Debug, Default)]
pub struct DailyAdvisoryBudget {
    last_day: Option<u32>,
    spent: bool,
}

impl DailyAdvisoryBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the day's token. Returns false if already spent for
    /// this `day`.
    pub fn try_consume(&mut self, day: u32) -> bool {
        if self.last_day != Some(day) {
            self.last_day = Some(day);
            self.spent = false;
        }
        if self.spent {
            debug!(day, "Daily advisory budget already spent");
            return false;
        }
        self.spent = true;
        true
    }
}

// ---------------------------------------------------------------------------
// Process-wide token bucket
// ---------------------------------------------------------------------------

/// Mutex-guarded token bucket shared by all agents.
///
/// Refills to full capacity every `refill_interval`, computed lazily
/// from elapsed time at call time; no background timer runs. Passed
/// explicitly to every agent rather than living in a hidden global,
/// so tests can inject their own instance.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: u32,
    refill_interval: Duration,
    inner: Mutex<BucketState>,
}

#[derive(Debug)]
struct BucketState {
    tokens: u32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u32, refill_interval: Duration) -> Self {
        TokenBucket {
            capacity,
            refill_interval,
            inner: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Take one token. Returns false when the bucket is empty and the
    /// refill interval has not yet elapsed.
    pub fn take(&self) -> bool {
        self.take_at(Instant::now())
    }

    /// Tokens currently available (after a lazy refill check).
    pub fn available(&self) -> u32 {
        self.available_at(Instant::now())
    }

    fn take_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        self.refill(&mut state, now);
        if state.tokens >= 1 {
            state.tokens -= 1;
            true
        } else {
            debug!(capacity = self.capacity, "Advisory rate limit exhausted");
            false
        }
    }

    fn available_at(&self, now: Instant) -> u32 {
        let mut state = self.lock();
        self.refill(&mut state, now);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        if now.duration_since(state.last_refill) >= self.refill_interval {
            state.tokens = self.capacity;
            state.last_refill = now;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        // A poisoned lock only means another thread panicked mid-take;
        // the counter itself is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
