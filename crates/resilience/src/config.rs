//! Per-family tuning.
//!
//! Thresholds, cooldowns and timeouts differ between the price, RPC and
//! metadata families. They are plain configuration here; nothing in the pool
//! or the orchestrator assumes one family's numbers.

use std::time::Duration;

/// How candidate identifiers are shortened for logs and stats.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentifierKind {
    /// Secret API keys: only a short prefix is ever shown.
    ApiKey,
    /// Endpoint URLs: only the host (and port) is shown, since paths and
    /// query strings frequently embed credentials.
    Url,
}

/// Exponential backoff between retries within one family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Growth factor per retry.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub cap: Duration,
}

impl BackoffPolicy {
    /// Delay to wait after the `retry`-th failed attempt (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(64) as i32);
        let secs = self.base.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.cap.as_secs_f64() {
            self.cap
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            multiplier: 1.5,
            cap: Duration::from_secs(10),
        }
    }
}

/// Configuration for one source family.
#[derive(Clone, Debug)]
pub struct FamilyConfig {
    /// Failures at which a candidate is skipped.
    pub failure_threshold: u32,
    /// Quiet period after the last failure before the count starts decaying.
    pub failure_cooldown: Duration,
    /// Minimum time between two rotations.
    pub rotation_cooldown: Duration,
    /// After a keyed failure, how long to go straight to the public path.
    pub error_cooldown: Duration,
    /// Attempts against the family per `execute` call.
    pub max_retries: u32,
    /// Timeout for one attempt against a candidate.
    pub attempt_timeout: Duration,
    /// Timeout for one fallback step.
    pub fallback_timeout: Duration,
    pub backoff: BackoffPolicy,
    pub identifier_kind: IdentifierKind,
}

impl FamilyConfig {
    /// Tuning for pools of price API keys.
    pub fn price_keys() -> Self {
        Self {
            failure_threshold: 5,
            failure_cooldown: Duration::from_secs(5 * 60),
            rotation_cooldown: Duration::from_secs(2),
            error_cooldown: Duration::from_secs(30),
            max_retries: 5,
            attempt_timeout: Duration::from_secs(20),
            fallback_timeout: Duration::from_secs(20),
            backoff: BackoffPolicy::default(),
            identifier_kind: IdentifierKind::ApiKey,
        }
    }

    /// Tuning for pools of blockchain RPC endpoints.
    pub fn rpc_endpoints() -> Self {
        Self {
            failure_threshold: 3,
            failure_cooldown: Duration::from_secs(3 * 60),
            rotation_cooldown: Duration::from_secs(3),
            error_cooldown: Duration::from_secs(20),
            max_retries: 10,
            attempt_timeout: Duration::from_secs(8),
            fallback_timeout: Duration::from_secs(8),
            backoff: BackoffPolicy::default(),
            identifier_kind: IdentifierKind::Url,
        }
    }

    /// Tuning for pools of token-metadata API endpoints.
    pub fn metadata_endpoints() -> Self {
        Self {
            failure_threshold: 5,
            failure_cooldown: Duration::from_secs(5 * 60),
            rotation_cooldown: Duration::from_secs(2),
            error_cooldown: Duration::from_secs(60),
            max_retries: 5,
            attempt_timeout: Duration::from_secs(25),
            fallback_timeout: Duration::from_secs(20),
            backoff: BackoffPolicy::default(),
            identifier_kind: IdentifierKind::Url,
        }
    }
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self::price_keys()
    }
}
