//! Outcome recording, failure decay and priority scoring.
//!
//! The tracker is stateless apart from its thresholds; the counters live on
//! each [`Candidate`]. A candidate is:
//!
//! - **usable** while `failure_count < failure_threshold`
//! - **disabled** once the threshold is reached
//! - **rehabilitated** gradually: once `failure_cooldown` has passed since
//!   its last failure, every decay pass removes one failure
//!
//! Priorities are recomputed on demand and only ever used for ranking.

use std::time::Duration;

use tokio::time::Instant;

use super::Candidate;

/// Points per recorded success.
const SUCCESS_WEIGHT: i64 = 2;

/// Points per outstanding failure.
const FAILURE_WEIGHT: i64 = 3;

/// Bonus when the last failure is older than the failure cooldown.
const RECOVERY_BONUS: i64 = 5;

/// Penalty when the last success is older than the staleness window.
const STALE_PENALTY: i64 = 2;

/// Age after which a success no longer counts as recent.
const SUCCESS_STALENESS: Duration = Duration::from_millis(300_000);

/// Health bookkeeping rules for one family.
#[derive(Clone, Copy, Debug)]
pub struct HealthTracker {
    failure_threshold: u32,
    failure_cooldown: Duration,
    success_staleness: Duration,
}

impl HealthTracker {
    pub fn new(failure_threshold: u32, failure_cooldown: Duration) -> Self {
        Self {
            failure_threshold,
            failure_cooldown,
            success_staleness: SUCCESS_STALENESS,
        }
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn record_failure(&self, candidate: &mut Candidate, now: Instant) {
        candidate.failure_count = candidate.failure_count.saturating_add(1);
        candidate.last_failure = Some(now);
    }

    /// Record a success. One outstanding failure is forgiven.
    pub fn record_success(&self, candidate: &mut Candidate, now: Instant) {
        candidate.success_count = candidate.success_count.saturating_add(1);
        candidate.last_success = Some(now);
        candidate.failure_count = candidate.failure_count.saturating_sub(1);
    }

    /// Remove one failure if the last failure is older than the cooldown.
    ///
    /// Each call past the cooldown removes one more, down to zero. Returns
    /// whether a failure was removed.
    pub fn decay_failures(&self, candidate: &mut Candidate, now: Instant) -> bool {
        if candidate.failure_count == 0 {
            return false;
        }
        let Some(last_failure) = candidate.last_failure else {
            return false;
        };

        if now.saturating_duration_since(last_failure) > self.failure_cooldown {
            candidate.failure_count -= 1;
            true
        } else {
            false
        }
    }

    /// Ranking score; higher is better.
    ///
    /// `successes*2 - failures*3`, plus 5 when the last failure is older than
    /// the failure cooldown, minus 2 when the last success is older than five
    /// minutes. A missing timestamp counts as infinitely old.
    pub fn priority(&self, candidate: &Candidate, now: Instant) -> i64 {
        let mut score = i64::from(candidate.success_count) * SUCCESS_WEIGHT
            - i64::from(candidate.failure_count) * FAILURE_WEIGHT;

        if older_than(candidate.last_failure, now, self.failure_cooldown) {
            score += RECOVERY_BONUS;
        }
        if older_than(candidate.last_success, now, self.success_staleness) {
            score -= STALE_PENALTY;
        }

        score
    }

    pub fn is_usable(&self, candidate: &Candidate) -> bool {
        candidate.failure_count < self.failure_threshold
    }
}

fn older_than(at: Option<Instant>, now: Instant, window: Duration) -> bool {
    at.map_or(true, |at| now.saturating_duration_since(at) > window)
}
