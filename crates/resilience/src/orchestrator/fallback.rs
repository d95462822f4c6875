//! Ordered alternatives tried after the keyed family gives up.

use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::errors::SourceError;

/// One named alternative. The future is not polled until its turn.
pub struct FallbackStep<'a, T> {
    pub name: String,
    pub(crate) future: BoxFuture<'a, Result<T, SourceError>>,
}

impl<T> std::fmt::Debug for FallbackStep<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Fallback steps in the order they should be tried.
///
/// Building a chain performs no I/O: each step is an unstarted future, so
/// steps after the first success are dropped without ever running.
///
/// ```
/// use solbot_resilience::errors::SourceError;
/// use solbot_resilience::orchestrator::FallbackChain;
///
/// let chain: FallbackChain<'_, u32> = FallbackChain::new()
///     .then("PUBLIC", async { Ok(1) })
///     .then("MIRROR", async {
///         Err(SourceError::Unsupported {
///             provider: "MIRROR".to_string(),
///             what: "prices".to_string(),
///         })
///     });
/// assert_eq!(chain.names(), vec!["PUBLIC", "MIRROR"]);
/// ```
#[derive(Debug)]
pub struct FallbackChain<'a, T> {
    steps: Vec<FallbackStep<'a, T>>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step and return the chain, for building in one expression.
    pub fn then<F>(mut self, name: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<T, SourceError>> + Send + 'a,
    {
        self.push(name, future);
        self
    }

    /// Append a step, for chains whose shape depends on runtime state.
    pub fn push<F>(&mut self, name: impl Into<String>, future: F)
    where
        F: Future<Output = Result<T, SourceError>> + Send + 'a,
    {
        self.steps.push(FallbackStep {
            name: name.into(),
            future: future.boxed(),
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub(crate) fn into_steps(self) -> Vec<FallbackStep<'a, T>> {
        self.steps
    }
}

impl<T> Default for FallbackChain<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}
