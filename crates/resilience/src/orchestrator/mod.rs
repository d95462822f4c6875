//! Retry, rotation and fallback around a [`SourceFamily`].
//!
//! [`Orchestrator::execute`] runs one logical request:
//!
//! 1. Skip the family entirely if it is empty or in error cooldown
//! 2. Otherwise attempt the selected candidate, up to `max_retries` times,
//!    recording each outcome, rotating after penalised failures and backing
//!    off between attempts
//! 3. Walk the fallback chain in order, one attempt per step
//! 4. Produce the last-resort value, noting the summary as the family's
//!    last error
//!
//! `execute` never fails; the caller always gets a value and a trace of how
//! it was obtained. Dropping the returned future mid-attempt abandons that
//! attempt without touching any counters.

mod diagnostics;
mod fallback;

pub use diagnostics::{AttemptOutcome, FetchDiagnostics, SkipReason, SourceAttempt};
pub use fallback::{FallbackChain, FallbackStep};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::time::{sleep, timeout};

use crate::errors::{RetryClass, SourceError};
use crate::pool::{RotateOutcome, SelectedCandidate, SourceFamily};

/// Where a resolved value came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedFrom {
    /// A keyed candidate, by label.
    Candidate(String),
    /// A fallback step, by name.
    Fallback(String),
    /// Nothing answered; the value is the caller's static default.
    LastResort,
}

impl fmt::Display for ResolvedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate(label) => write!(f, "{label}"),
            Self::Fallback(name) => write!(f, "{name}"),
            Self::LastResort => write!(f, "LAST_RESORT"),
        }
    }
}

/// Value produced by [`Orchestrator::execute`].
#[derive(Clone, Debug)]
pub struct Resolution<T> {
    pub value: T,
    pub source: ResolvedFrom,
    pub diagnostics: FetchDiagnostics,
}

impl<T> Resolution<T> {
    pub fn is_last_resort(&self) -> bool {
        self.source == ResolvedFrom::LastResort
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Runs requests against one family with retries and fallbacks.
#[derive(Clone, Debug)]
pub struct Orchestrator {
    family: Arc<SourceFamily>,
}

impl Orchestrator {
    pub fn new(family: Arc<SourceFamily>) -> Self {
        Self { family }
    }

    pub fn family(&self) -> &Arc<SourceFamily> {
        &self.family
    }

    /// Resolve a value through the family, then `chain`, then `last_resort`.
    ///
    /// `request` builds one attempt for the given candidate. Each attempt is
    /// bounded by the family's `attempt_timeout`, each fallback step by
    /// `fallback_timeout`.
    pub async fn execute<T, F, Fut, L>(
        &self,
        mut request: F,
        chain: FallbackChain<'_, T>,
        last_resort: L,
    ) -> Resolution<T>
    where
        F: FnMut(SelectedCandidate) -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
        L: FnOnce() -> T,
    {
        let family = &self.family;
        let config = family.config();
        let mut diagnostics = FetchDiagnostics::new();

        if family.is_empty() {
            diagnostics.record_skip(family.name(), SkipReason::NoCandidates);
        } else if family.in_error_cooldown() {
            debug!("{}: error cooldown active, skipping keyed sources", family.name());
            diagnostics.record_skip(family.name(), SkipReason::ErrorCooldown);
        } else {
            for attempt in 1..=config.max_retries {
                let Some(candidate) = family.select() else {
                    diagnostics.record_skip(family.name(), SkipReason::FamilyExhausted);
                    break;
                };
                let index = candidate.index;
                let label = candidate.label.clone();

                let outcome = match timeout(config.attempt_timeout, request(candidate)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(SourceError::Timeout {
                        provider: label.clone(),
                    }),
                };

                let error = match outcome {
                    Ok(value) => {
                        family.record_success(index);
                        diagnostics.record_success(&label);
                        debug!("{}: served by {} on attempt {}", family.name(), label, attempt);
                        return Resolution {
                            value,
                            source: ResolvedFrom::Candidate(label),
                            diagnostics,
                        };
                    }
                    Err(error) => error,
                };

                diagnostics.record_error(&label, error.to_string());

                if error.retry_class() == RetryClass::NextProvider {
                    info!("{}: {} cannot serve this request: {}", family.name(), label, error);
                    family.note_error(format!("{label}: {error}"));
                    diagnostics.record_skip(
                        family.name(),
                        SkipReason::NotServable {
                            message: error.to_string(),
                        },
                    );
                    break;
                }

                warn!(
                    "{}: attempt {}/{} via {} failed: {}",
                    family.name(),
                    attempt,
                    config.max_retries,
                    label,
                    error
                );
                family.record_failure(index, &error);

                if attempt == config.max_retries {
                    break;
                }
                if family.rotate() == RotateOutcome::Exhausted {
                    diagnostics.record_skip(family.name(), SkipReason::FamilyExhausted);
                    break;
                }
                sleep(config.backoff.delay(attempt - 1)).await;
            }
        }

        for step in chain.into_steps() {
            let name = step.name;
            match timeout(config.fallback_timeout, step.future).await {
                Ok(Ok(value)) => {
                    info!("{}: served by fallback {}", family.name(), name);
                    diagnostics.record_success(&name);
                    return Resolution {
                        value,
                        source: ResolvedFrom::Fallback(name),
                        diagnostics,
                    };
                }
                Ok(Err(error)) => {
                    debug!("{}: fallback {} failed: {}", family.name(), name, error);
                    diagnostics.record_error(&name, error.to_string());
                }
                Err(_) => {
                    debug!("{}: fallback {} timed out", family.name(), name);
                    let error = SourceError::Timeout {
                        provider: name.clone(),
                    };
                    diagnostics.record_error(&name, error.to_string());
                }
            }
        }

        let summary = diagnostics.summary();
        warn!(
            "{}: every source failed, using last-resort value [{}]",
            family.name(),
            summary
        );
        family.note_error(format!("all sources failed: {summary}"));
        Resolution {
            value: last_resort(),
            source: ResolvedFrom::LastResort,
            diagnostics,
        }
    }

    /// Try every usable candidate once, best first, and make the first
    /// that answers current.
    ///
    /// No backoff between attempts. Returns `None` when nothing answered.
    pub async fn sweep<F, Fut>(&self, mut check: F) -> Option<SelectedCandidate>
    where
        F: FnMut(SelectedCandidate) -> Fut,
        Fut: Future<Output = Result<(), SourceError>>,
    {
        let family = &self.family;
        let attempt_timeout = family.config().attempt_timeout;

        for index in family.ranked() {
            let Some(candidate) = family.candidate(index) else {
                continue;
            };
            let selected = SelectedCandidate {
                index,
                identifier: candidate.identifier().to_string(),
                label: candidate.label().to_string(),
            };

            let outcome = match timeout(attempt_timeout, check(selected.clone())).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Timeout {
                    provider: selected.label.clone(),
                }),
            };

            match outcome {
                Ok(()) => {
                    family.record_success(index);
                    family.set_current(index);
                    info!("{}: {} is healthy", family.name(), selected.label);
                    return Some(selected);
                }
                Err(error) if error.retry_class() == RetryClass::NextProvider => {
                    family.note_error(format!("{}: {}", selected.label, error));
                }
                Err(error) => {
                    debug!("{}: health check of {} failed: {}", family.name(), selected.label, error);
                    family.record_failure(index, &error);
                }
            }
        }

        warn!("{}: no candidate answered the health check", family.name());
        None
    }
}
