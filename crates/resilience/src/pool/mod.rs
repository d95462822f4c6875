//! Candidate pools: registry, health tracking and selection.

mod candidate;
mod family;
mod health;
mod source_list;
mod stats;

pub use candidate::{short_label, Candidate};
pub use family::{RotateOutcome, SelectedCandidate, SourceFamily};
pub use health::HealthTracker;
pub use source_list::{parse_source_list, source_list_from_env};
pub use stats::FamilyStats;
