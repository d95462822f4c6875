//! A family of interchangeable candidates with a shared "current" pointer.
//!
//! The family owns the mutable state that every request against the same
//! provider shares: the candidates' counters, the current index, the time of
//! the last rotation and the most recent error. State sits behind a plain
//! mutex that is never held across an await point; concurrent callers may
//! interleave their updates, which only affects the ranking heuristic.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use log::{debug, info, warn};
use tokio::time::Instant;

use super::candidate::short_label;
use super::source_list::{dedup_preserving_order, source_list_from_env};
use super::{Candidate, FamilyStats, HealthTracker};
use crate::config::FamilyConfig;
use crate::errors::SourceError;

/// A candidate picked for the next attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedCandidate {
    pub index: usize,
    /// Full identifier, only for building the request.
    pub identifier: String,
    pub label: String,
}

/// Result of a rotation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotateOutcome {
    /// The previous rotation was too recent; the current index is unchanged.
    Cooldown { current: usize },
    /// The current index now points at `to`.
    Rotated { from: usize, to: usize },
    /// Every candidate is over its failure threshold; use the fallback chain.
    Exhausted,
}

#[derive(Debug)]
struct FamilyState {
    candidates: Vec<Candidate>,
    current: usize,
    last_rotation: Option<Instant>,
    last_error: Option<String>,
    last_error_at: Option<Instant>,
}

impl FamilyState {
    fn selected(&self, index: usize) -> SelectedCandidate {
        let candidate = &self.candidates[index];
        SelectedCandidate {
            index,
            identifier: candidate.identifier().to_string(),
            label: candidate.label().to_string(),
        }
    }
}

/// An ordered pool of candidates for one provider family.
pub struct SourceFamily {
    name: String,
    config: FamilyConfig,
    tracker: HealthTracker,
    state: Mutex<FamilyState>,
}

impl SourceFamily {
    /// Create a family from already-parsed identifiers.
    ///
    /// Duplicate identifiers are dropped. Labels that collide after
    /// shortening get a `#<index>` suffix so stats stay one-per-candidate.
    pub fn new(name: impl Into<String>, identifiers: Vec<String>, config: FamilyConfig) -> Self {
        let name = name.into();
        let identifiers = dedup_preserving_order(identifiers);

        let mut seen_labels = HashSet::with_capacity(identifiers.len());
        let candidates: Vec<Candidate> = identifiers
            .into_iter()
            .enumerate()
            .map(|(index, identifier)| {
                let mut label = short_label(&identifier, config.identifier_kind);
                if !seen_labels.insert(label.clone()) {
                    label = format!("{label}#{index}");
                    seen_labels.insert(label.clone());
                }
                Candidate::new(identifier, label)
            })
            .collect();

        info!(
            "Source family '{}' initialised with {} candidate(s)",
            name,
            candidates.len()
        );

        Self {
            tracker: HealthTracker::new(config.failure_threshold, config.failure_cooldown),
            name,
            config,
            state: Mutex::new(FamilyState {
                candidates,
                current: 0,
                last_rotation: None,
                last_error: None,
                last_error_at: None,
            }),
        }
    }

    /// Create a family from an environment variable, using `defaults` when
    /// the variable is missing or empty.
    pub fn from_env(
        name: impl Into<String>,
        var: &str,
        defaults: &[&str],
        config: FamilyConfig,
    ) -> Self {
        let mut identifiers = source_list_from_env(var);
        if identifiers.is_empty() {
            identifiers = defaults.iter().map(|s| s.to_string()).collect();
        }
        Self::new(name, identifiers, config)
    }

    /// Lock the state mutex, recovering from poison if necessary.
    ///
    /// The worst case after a poisoned lock is a slightly wrong ranking,
    /// which is better than panicking in every later request.
    fn lock_state(&self) -> MutexGuard<'_, FamilyState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Source family '{}' mutex was poisoned, recovering", self.name);
            poisoned.into_inner()
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FamilyConfig {
        &self.config
    }

    pub fn tracker(&self) -> &HealthTracker {
        &self.tracker
    }

    pub fn len(&self) -> usize {
        self.lock_state().candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn current_index(&self) -> usize {
        self.lock_state().current
    }

    /// Snapshot of one candidate.
    pub fn candidate(&self, index: usize) -> Option<Candidate> {
        self.lock_state().candidates.get(index).cloned()
    }

    /// Snapshot of all candidates, in configuration order.
    pub fn candidates(&self) -> Vec<Candidate> {
        self.lock_state().candidates.clone()
    }

    /// Index of the best usable candidate, or `None` when all are disabled.
    ///
    /// Every candidate gets a decay chance first. Ties go to the lowest index.
    pub fn best(&self) -> Option<usize> {
        let now = Instant::now();
        let mut state = self.lock_state();
        best_index(&self.tracker, &mut state.candidates, now)
    }

    /// The candidate to try next: the current one while it is usable,
    /// otherwise the best usable one (which then becomes current).
    pub fn select(&self) -> Option<SelectedCandidate> {
        let now = Instant::now();
        let mut state = self.lock_state();
        if state.candidates.is_empty() {
            return None;
        }

        let current = state.current;
        self.tracker
            .decay_failures(&mut state.candidates[current], now);
        if self.tracker.is_usable(&state.candidates[current]) {
            return Some(state.selected(current));
        }

        let best = best_index(&self.tracker, &mut state.candidates, now)?;
        if best != current {
            debug!(
                "{}: current candidate {} disabled, switching to {}",
                self.name, state.candidates[current].label(), state.candidates[best].label()
            );
        }
        state.current = best;
        Some(state.selected(best))
    }

    /// Move the current pointer away from the current candidate.
    ///
    /// Rotations closer together than `rotation_cooldown` are ignored. When
    /// allowed, the pointer goes to [`best`](Self::best) if that differs from
    /// the current candidate, otherwise to the next usable index (wrapping).
    pub fn rotate(&self) -> RotateOutcome {
        let now = Instant::now();
        let mut state = self.lock_state();
        if state.candidates.is_empty() {
            return RotateOutcome::Exhausted;
        }

        if let Some(last) = state.last_rotation {
            if now.saturating_duration_since(last) < self.config.rotation_cooldown {
                debug!("{}: rotation skipped, cooldown active", self.name);
                return RotateOutcome::Cooldown {
                    current: state.current,
                };
            }
        }

        let from = state.current;
        let Some(best) = best_index(&self.tracker, &mut state.candidates, now) else {
            warn!(
                "{}: all {} candidate(s) over failure threshold, falling back",
                self.name,
                state.candidates.len()
            );
            return RotateOutcome::Exhausted;
        };

        let to = if best != from {
            best
        } else {
            let len = state.candidates.len();
            (1..=len)
                .map(|step| (from + step) % len)
                .find(|&i| self.tracker.is_usable(&state.candidates[i]))
                .unwrap_or(best)
        };

        state.current = to;
        state.last_rotation = Some(now);
        info!(
            "{}: rotated from {} to {}",
            self.name,
            state.candidates[from].label(),
            state.candidates[to].label()
        );
        RotateOutcome::Rotated { from, to }
    }

    /// Make `index` the current candidate. Out-of-range indices are ignored.
    pub fn set_current(&self, index: usize) {
        let mut state = self.lock_state();
        if index < state.candidates.len() {
            state.current = index;
        }
    }

    /// Usable candidates ordered by priority (highest first, ties by index).
    pub fn ranked(&self) -> Vec<usize> {
        let now = Instant::now();
        let mut state = self.lock_state();
        for candidate in state.candidates.iter_mut() {
            self.tracker.decay_failures(candidate, now);
        }

        let mut usable: Vec<(usize, i64)> = state
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| self.tracker.is_usable(c))
            .map(|(i, c)| (i, self.tracker.priority(c, now)))
            .collect();
        usable.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        usable.into_iter().map(|(i, _)| i).collect()
    }

    /// Record a failed attempt against a candidate.
    ///
    /// Also sets the family's last error and starts the error cooldown.
    pub fn record_failure(&self, index: usize, error: &SourceError) {
        let now = Instant::now();
        let mut state = self.lock_state();
        let Some(candidate) = state.candidates.get_mut(index) else {
            return;
        };
        self.tracker.record_failure(candidate, now);
        let message = format!("{}: {}", candidate.label(), error);
        debug!(
            "{}: failure recorded for {} ({}/{})",
            self.name,
            candidate.label(),
            candidate.failure_count(),
            self.tracker.failure_threshold()
        );
        state.last_error = Some(message);
        state.last_error_at = Some(now);
    }

    /// Record a successful attempt and clear the family's error state.
    pub fn record_success(&self, index: usize) {
        let now = Instant::now();
        let mut state = self.lock_state();
        let Some(candidate) = state.candidates.get_mut(index) else {
            return;
        };
        self.tracker.record_success(candidate, now);
        state.last_error = None;
        state.last_error_at = None;
    }

    /// Remember an error that is not attributable to a candidate.
    ///
    /// Does not start the error cooldown.
    pub fn note_error(&self, message: impl Into<String>) {
        self.lock_state().last_error = Some(message.into());
    }

    /// Whether a candidate failed within the last `error_cooldown`.
    pub fn in_error_cooldown(&self) -> bool {
        let now = Instant::now();
        self.lock_state()
            .last_error_at
            .is_some_and(|at| now.saturating_duration_since(at) < self.config.error_cooldown)
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    /// Zero every counter, forget errors and reselect the first candidate.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        for candidate in state.candidates.iter_mut() {
            candidate.reset();
        }
        state.current = 0;
        state.last_rotation = None;
        state.last_error = None;
        state.last_error_at = None;
        info!("{}: state reset", self.name);
    }

    /// Health snapshot. Reads only; no decay is applied.
    pub fn stats(&self) -> FamilyStats {
        let state = self.lock_state();
        let total = state.candidates.len();
        let mut failures = HashMap::with_capacity(total);
        let mut successes = HashMap::with_capacity(total);
        let mut working = 0;

        for candidate in &state.candidates {
            if self.tracker.is_usable(candidate) {
                working += 1;
            }
            failures.insert(candidate.label().to_string(), candidate.failure_count());
            successes.insert(candidate.label().to_string(), candidate.success_count());
        }

        FamilyStats {
            family: self.name.clone(),
            total_keys: total,
            working_keys: working,
            current_key: state
                .candidates
                .get(state.current)
                .map(|c| c.label().to_string()),
            failures,
            successes,
            last_error: state.last_error.clone(),
        }
    }
}

impl std::fmt::Debug for SourceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFamily")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn best_index(tracker: &HealthTracker, candidates: &mut [Candidate], now: Instant) -> Option<usize> {
    let mut best: Option<(usize, i64)> = None;
    for (index, candidate) in candidates.iter_mut().enumerate() {
        tracker.decay_failures(candidate, now);
        if !tracker.is_usable(candidate) {
            continue;
        }
        let score = tracker.priority(candidate, now);
        // Strictly greater keeps the lowest index on ties
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn keys(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn family(ids: &[&str]) -> SourceFamily {
        SourceFamily::new("test", keys(ids), FamilyConfig::price_keys())
    }

    fn failure() -> SourceError {
        SourceError::Http {
            provider: "test".to_string(),
            status: 500,
        }
    }

    #[test]
    fn test_new_dedups_and_labels() {
        let family = family(&["key-alpha-1111", "key-beta-2222", "key-alpha-1111"]);
        assert_eq!(family.len(), 2);

        let labels: Vec<String> = family
            .candidates()
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        // Both shorten to "key-al..." / "key-be..."
        assert_eq!(labels, vec!["key-al...", "key-be..."]);
    }

    #[test]
    fn test_colliding_labels_get_suffix() {
        let family = family(&["k1", "k2", "k3"]);
        let labels: Vec<String> = family
            .candidates()
            .iter()
            .map(|c| c.label().to_string())
            .collect();
        assert_eq!(labels, vec!["k...", "k...#1", "k...#2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_skips_disabled_candidate() {
        let family = family(&["k1", "k2", "k3"]);
        for _ in 0..5 {
            family.record_failure(0, &failure());
        }

        let best = family.best().unwrap();
        assert_ne!(best, 0);
        // Ties between k2 and k3 resolve to the lowest index
        assert_eq!(best, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_prefers_successful_candidate() {
        let family = family(&["k1", "k2", "k3"]);
        for _ in 0..5 {
            family.record_failure(0, &failure());
        }
        assert!(matches!(family.best(), Some(1) | Some(2)));

        for _ in 0..3 {
            family.record_success(1);
        }
        assert_eq!(family.best(), Some(1));

        // k3 now gets the successes and overtakes
        for _ in 0..4 {
            family.record_success(2);
        }
        assert_eq!(family.best(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_best_none_when_all_disabled() {
        let family = family(&["k1", "k2"]);
        for index in 0..2 {
            for _ in 0..5 {
                family.record_failure(index, &failure());
            }
        }
        assert_eq!(family.best(), None);
        assert_eq!(family.select(), None);
        assert_eq!(family.rotate(), RotateOutcome::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_candidate_recovers_after_cooldown() {
        let family = family(&["k1"]);
        for _ in 0..5 {
            family.record_failure(0, &failure());
        }
        assert_eq!(family.best(), None);

        tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;
        assert_eq!(family.best(), Some(0));
        assert_eq!(family.candidate(0).unwrap().failure_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_cooldown_keeps_index() {
        let family = family(&["k1", "k2", "k3"]);

        assert_eq!(family.rotate(), RotateOutcome::Rotated { from: 0, to: 1 });
        assert_eq!(family.rotate(), RotateOutcome::Cooldown { current: 1 });
        assert_eq!(family.current_index(), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        // All tied, so best is k1 again
        assert_eq!(family.rotate(), RotateOutcome::Rotated { from: 1, to: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotate_jumps_to_best_and_skips_disabled() {
        let family = family(&["k1", "k2", "k3"]);
        for _ in 0..5 {
            family.record_failure(1, &failure());
        }
        family.record_success(2);

        // Best (k3) differs from current (k1)
        assert_eq!(family.rotate(), RotateOutcome::Rotated { from: 0, to: 2 });

        tokio::time::advance(Duration::from_secs(3)).await;
        // Best is now current; advance skips disabled k2 and wraps to k1
        assert_eq!(family.rotate(), RotateOutcome::Rotated { from: 2, to: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_moves_off_disabled_current() {
        let family = family(&["k1", "k2"]);
        assert_eq!(family.select().unwrap().index, 0);

        for _ in 0..5 {
            family.record_failure(0, &failure());
        }
        let selected = family.select().unwrap();
        assert_eq!(selected.index, 1);
        assert_eq!(selected.identifier, "k2");
        assert_eq!(family.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_cooldown_window() {
        let family = family(&["k1"]);
        assert!(!family.in_error_cooldown());

        family.record_failure(0, &failure());
        assert!(family.in_error_cooldown());
        assert!(family.last_error().unwrap().contains("HTTP 500"));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!family.in_error_cooldown());
        // The message stays for display until a success
        assert!(family.last_error().is_some());

        family.record_success(0);
        assert!(family.last_error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ranked_orders_by_priority() {
        let family = family(&["k1", "k2", "k3", "k4"]);
        family.record_success(2);
        family.record_failure(0, &failure());
        for _ in 0..5 {
            family.record_failure(3, &failure());
        }

        assert_eq!(family.ranked(), vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_working_count() {
        let family = family(&["k1", "k2", "k3"]);
        for _ in 0..5 {
            family.record_failure(0, &failure());
        }
        family.record_failure(1, &failure());
        family.record_success(2);

        let stats = family.stats();
        let working = family
            .candidates()
            .iter()
            .filter(|c| c.failure_count() < 5)
            .count();
        assert_eq!(stats.total_keys, 3);
        assert_eq!(stats.working_keys, working);
        assert_eq!(stats.working_keys, 2);
        assert_eq!(stats.failures["k..."], 5);
        assert_eq!(stats.failures["k...#1"], 1);
        assert_eq!(stats.successes["k...#2"], 1);
        assert_eq!(stats.current_key.as_deref(), Some("k..."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_has_no_side_effects() {
        let family = family(&["k1"]);
        family.record_failure(0, &failure());
        tokio::time::advance(Duration::from_secs(10 * 60)).await;

        let _ = family.stats();
        assert_eq!(family.candidate(0).unwrap().failure_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_is_idempotent() {
        let family = family(&["k1", "k2"]);
        family.record_failure(0, &failure());
        family.record_success(1);
        family.rotate();

        family.reset();
        let once = family.stats();
        let once_candidates = family.candidates();

        family.reset();
        let twice = family.stats();

        assert_eq!(once, twice);
        assert_eq!(family.current_index(), 0);
        assert!(once.last_error.is_none());
        for (a, b) in once_candidates.iter().zip(family.candidates().iter()) {
            assert_eq!(a.failure_count(), 0);
            assert_eq!(a.success_count(), 0);
            assert_eq!(a.last_failure(), b.last_failure());
            assert_eq!(a.last_success(), None);
        }
        // Rotation gate was cleared as well
        assert!(matches!(family.rotate(), RotateOutcome::Rotated { .. }));
    }

    #[test]
    fn test_empty_family() {
        let family = family(&[]);
        assert!(family.is_empty());
        assert_eq!(family.select(), None);
        assert_eq!(family.rotate(), RotateOutcome::Exhausted);
        assert_eq!(family.stats().current_key, None);
    }

    #[test]
    fn test_from_env_uses_defaults() {
        let family = SourceFamily::from_env(
            "rpc",
            "SOLBOT_TEST_UNSET_RPC_URLS",
            &["https://a.example.com", "https://b.example.com"],
            FamilyConfig::rpc_endpoints(),
        );
        assert_eq!(family.len(), 2);
        assert_eq!(family.stats().current_key.as_deref(), Some("a.example.com"));
    }
}
