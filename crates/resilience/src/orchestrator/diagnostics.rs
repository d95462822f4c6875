//! Per-call trace of what the orchestrator tried.
//!
//! The trail is rendered into a single line for logs and for the family's
//! last error, for example:
//!
//! ```text
//! price skipped (error cooldown) | BINANCE failed: HTTP 503 from BINANCE | KRAKEN served
//! ```

use std::fmt;

/// Why the keyed family was not used (or stopped being used) for a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The family has no candidates configured.
    NoCandidates,

    /// A candidate failed recently; the call went straight to the fallbacks.
    ErrorCooldown,

    /// Every candidate is over its failure threshold.
    FamilyExhausted,

    /// The error was not the candidate's fault; other candidates would
    /// answer the same way.
    NotServable { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCandidates => f.write_str("no candidates"),
            Self::ErrorCooldown => f.write_str("error cooldown"),
            Self::FamilyExhausted => f.write_str("all candidates disabled"),
            Self::NotServable { message } => write!(f, "not servable: {message}"),
        }
    }
}

/// What happened at one step of a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Skipped(SkipReason),
    Failed(String),
    Served,
}

/// One step of a call: a candidate attempt, a fallback step, or a skipped
/// family.
#[derive(Clone, Debug)]
pub struct SourceAttempt {
    /// Family name, candidate label or fallback step name.
    pub source: String,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for SourceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Skipped(reason) => write!(f, "{} skipped ({reason})", self.source),
            AttemptOutcome::Failed(error) => write!(f, "{} failed: {error}", self.source),
            AttemptOutcome::Served => write!(f, "{} served", self.source),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FetchDiagnostics {
    pub attempts: Vec<SourceAttempt>,
}

impl FetchDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, source: impl Into<String>, outcome: AttemptOutcome) {
        self.attempts.push(SourceAttempt {
            source: source.into(),
            outcome,
        });
    }

    pub fn record_skip(&mut self, family: impl Into<String>, reason: SkipReason) {
        self.push(family, AttemptOutcome::Skipped(reason));
    }

    pub fn record_error(&mut self, source: impl Into<String>, error: impl Into<String>) {
        self.push(source, AttemptOutcome::Failed(error.into()));
    }

    pub fn record_success(&mut self, source: impl Into<String>) {
        self.push(source, AttemptOutcome::Served);
    }

    /// The whole trail on one line, steps separated by `|`.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(SourceAttempt::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Served)
    }

    /// `(source, error)` for every failed step, in call order.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Failed(error) => Some((a.source.as_str(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn skip_reasons(&self) -> Vec<(&str, &SkipReason)> {
        self.attempts
            .iter()
            .filter_map(|a| match &a.outcome {
                AttemptOutcome::Skipped(reason) => Some((a.source.as_str(), reason)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reads_in_call_order() {
        let mut diag = FetchDiagnostics::new();
        diag.record_skip("price", SkipReason::ErrorCooldown);
        diag.record_error("BINANCE", "HTTP 503 from BINANCE");
        diag.record_success("KRAKEN");

        assert_eq!(
            diag.summary(),
            "price skipped (error cooldown) | BINANCE failed: HTTP 503 from BINANCE | KRAKEN served"
        );
        assert!(diag.has_success());
        assert_eq!(diag.errors(), vec![("BINANCE", "HTTP 503 from BINANCE")]);
        assert_eq!(diag.skip_reasons(), vec![("price", &SkipReason::ErrorCooldown)]);
    }

    #[test]
    fn test_not_servable_carries_message() {
        let mut diag = FetchDiagnostics::new();
        diag.record_error("CG-ab...", "Not found: FOO");
        diag.record_skip(
            "price",
            SkipReason::NotServable {
                message: "Not found: FOO".to_string(),
            },
        );

        assert_eq!(
            diag.summary(),
            "CG-ab... failed: Not found: FOO | price skipped (not servable: Not found: FOO)"
        );
        assert!(!diag.has_success());
    }

    #[test]
    fn test_empty_trail() {
        let diag = FetchDiagnostics::new();
        assert!(!diag.has_success());
        assert_eq!(diag.summary(), "");
        assert!(diag.errors().is_empty());
    }
}
