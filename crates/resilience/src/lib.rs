//! Solbot Resilience Crate
//!
//! Keeps a dashboard answering while the upstream APIs behind it come and go.
//!
//! # Overview
//!
//! Each upstream provider is modelled as a *family* of interchangeable
//! candidates (API keys or endpoint URLs). For every request the crate:
//! - picks the healthiest candidate, skipping ones that failed too often
//! - retries with rotation and exponential backoff on transient failures
//! - walks an ordered chain of public fallbacks when the family gives up
//! - finally substitutes a caller-provided last-resort value
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  SourceFamily    |  candidates + current pointer + last error
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |  HealthTracker   |  counters, decay, priority
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  Orchestrator    | --> |  FallbackChain   |  (lazy, ordered)
//! +------------------+     +------------------+
//!          |
//!          v
//! +------------------+
//! |  Resolution<T>   |  value + where it came from
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`SourceFamily`] - Registry and selector for one provider's candidates
//! - [`HealthTracker`] - Failure/success bookkeeping and priority scoring
//! - [`Orchestrator`] - Retry, rotation and fallback around a family
//! - [`FamilyStats`] - Serializable health snapshot
//! - [`SourceError`] - Error of a single upstream attempt

pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod pool;

pub use config::{BackoffPolicy, FamilyConfig, IdentifierKind};
pub use errors::{RetryClass, SourceError};
pub use orchestrator::{
    FallbackChain, FetchDiagnostics, Orchestrator, Resolution, ResolvedFrom, SkipReason,
};
pub use pool::{
    parse_source_list, short_label, source_list_from_env, Candidate, FamilyStats, HealthTracker,
    RotateOutcome, SelectedCandidate, SourceFamily,
};
