//! A single upstream target (API key or endpoint URL) and its counters.

use tokio::time::Instant;
use url::Url;

use crate::config::IdentifierKind;

/// Characters of an API key that may appear in logs.
const KEY_PREFIX_LEN: usize = 6;

/// One upstream target within a family.
///
/// The full identifier is only handed to request closures; everything that
/// is logged or reported uses [`label`](Self::label).
#[derive(Clone, Debug)]
pub struct Candidate {
    identifier: String,
    label: String,
    pub(crate) failure_count: u32,
    pub(crate) success_count: u32,
    pub(crate) last_failure: Option<Instant>,
    pub(crate) last_success: Option<Instant>,
}

impl Candidate {
    pub(crate) fn new(identifier: String, label: String) -> Self {
        Self {
            identifier,
            label,
            failure_count: 0,
            success_count: 0,
            last_failure: None,
            last_success: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Short, non-identifying form of the identifier.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn success_count(&self) -> u32 {
        self.success_count
    }

    pub fn last_failure(&self) -> Option<Instant> {
        self.last_failure
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    pub(crate) fn reset(&mut self) {
        self.failure_count = 0;
        self.success_count = 0;
        self.last_failure = None;
        self.last_success = None;
    }
}

/// Shorten an identifier so it can be logged without leaking a secret.
///
/// API keys keep at most six leading characters (and never more than half
/// the key). URLs are reduced to host and port.
pub fn short_label(identifier: &str, kind: IdentifierKind) -> String {
    match kind {
        IdentifierKind::Url => url_label(identifier).unwrap_or_else(|| key_label(identifier)),
        IdentifierKind::ApiKey => key_label(identifier),
    }
}

fn key_label(identifier: &str) -> String {
    let visible = (identifier.chars().count() / 2).min(KEY_PREFIX_LEN);
    let prefix: String = identifier.chars().take(visible).collect();
    format!("{prefix}...")
}

fn url_label(identifier: &str) -> Option<String> {
    let url = Url::parse(identifier).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_label_hides_most_of_the_key() {
        assert_eq!(
            short_label("CG-abcdefghijklmnop", IdentifierKind::ApiKey),
            "CG-abc..."
        );
        assert_eq!(short_label("k1", IdentifierKind::ApiKey), "k...");
        assert_eq!(short_label("", IdentifierKind::ApiKey), "...");
    }

    #[test]
    fn test_url_label_drops_path_and_query() {
        assert_eq!(
            short_label(
                "https://mainnet.helius-rpc.com/?api-key=secret",
                IdentifierKind::Url
            ),
            "mainnet.helius-rpc.com"
        );
        assert_eq!(
            short_label("http://127.0.0.1:8899/rpc", IdentifierKind::Url),
            "127.0.0.1:8899"
        );
    }

    #[test]
    fn test_unparseable_url_falls_back_to_prefix() {
        assert_eq!(
            short_label("not a url at all", IdentifierKind::Url),
            "not a ..."
        );
    }
}
