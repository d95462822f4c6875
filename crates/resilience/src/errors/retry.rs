/// Classification for retry policy.
///
/// Used by the orchestrator to decide what a failed attempt means for the
/// candidate that served it.
///
/// # Behavior Summary
///
/// | Class | Record failure on candidate? | Keep trying this family? |
/// |-------|------------------------------|--------------------------|
/// | `FailoverWithPenalty` | Yes | Yes (rotate, back off, retry) |
/// | `NextProvider` | No | No (go to the fallback chain) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Record a failure against the candidate and rotate to another one.
    ///
    /// Used for timeouts, transport errors, rate limiting, rejected keys and
    /// malformed payloads. Enough of these push the candidate over the failure
    /// threshold and it is skipped until its cooldown passes.
    FailoverWithPenalty,

    /// Leave the family without recording any penalty.
    ///
    /// Used when the provider cannot answer this request at all (unknown
    /// asset, unsupported operation). Another key for the same provider would
    /// give the same answer, so the orchestrator moves on to the fallback chain.
    NextProvider,
}
