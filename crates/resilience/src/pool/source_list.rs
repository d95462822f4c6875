//! Parsing of candidate lists from configuration values.
//!
//! A family is configured with a single string that may be:
//! - a JSON array literal: `["key-a", "key-b"]`
//! - a comma-separated list: `key-a, key-b`
//! - a single value: `key-a`
//!
//! Parsing never fails. Input that looks like JSON but does not parse is
//! kept whole as one candidate.

use std::collections::HashSet;

use log::debug;
use serde_json::Value;

/// Parse a configuration value into an ordered, deduplicated candidate list.
///
/// # Examples
///
/// ```
/// use solbot_resilience::pool::parse_source_list;
///
/// assert_eq!(parse_source_list(r#"["a","b","a"]"#), vec!["a", "b"]);
/// assert_eq!(parse_source_list("a,b,c"), vec!["a", "b", "c"]);
/// assert_eq!(parse_source_list("single"), vec!["single"]);
/// assert_eq!(parse_source_list("[a,b"), vec!["[a,b"]);
/// ```
pub fn parse_source_list(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let entries = if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(values) => values
                .into_iter()
                .filter_map(|value| match value {
                    Value::String(s) => {
                        let s = s.trim();
                        (!s.is_empty()).then(|| s.to_string())
                    }
                    _ => None,
                })
                .collect(),
            Err(e) => {
                debug!(
                    "Source list looks like JSON but failed to parse ({}), using it as one entry",
                    e
                );
                vec![trimmed.to_string()]
            }
        }
    } else if trimmed.contains(',') {
        trimmed
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![trimmed.to_string()]
    };

    dedup_preserving_order(entries)
}

/// Read and parse a candidate list from an environment variable.
///
/// A missing or non-unicode variable yields an empty list.
pub fn source_list_from_env(var: &str) -> Vec<String> {
    std::env::var(var)
        .map(|value| parse_source_list(&value))
        .unwrap_or_default()
}

/// Remove duplicates, keeping the first occurrence of each entry.
pub(crate) fn dedup_preserving_order(entries: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array_dedups_in_order() {
        assert_eq!(parse_source_list(r#"["a","b","a"]"#), vec!["a", "b"]);
    }

    #[test]
    fn test_json_array_keeps_only_non_empty_strings() {
        let parsed = parse_source_list(r#"[" k1 ", "", 42, null, "k2", {"k": "v"}]"#);
        assert_eq!(parsed, vec!["k1", "k2"]);
    }

    #[test]
    fn test_comma_separated() {
        assert_eq!(parse_source_list("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_source_list(" a , ,b,, a "), vec!["a", "b"]);
    }

    #[test]
    fn test_single_value() {
        assert_eq!(parse_source_list("single"), vec!["single"]);
        assert_eq!(parse_source_list("  https://rpc.example.com  "), vec![
            "https://rpc.example.com"
        ]);
    }

    #[test]
    fn test_malformed_json_is_one_candidate() {
        assert_eq!(parse_source_list("[a,b"), vec!["[a,b"]);
        assert_eq!(parse_source_list("[\"a\","), vec!["[\"a\","]);
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(parse_source_list("").is_empty());
        assert!(parse_source_list("   ").is_empty());
        assert!(parse_source_list("[]").is_empty());
    }

    #[test]
    fn test_missing_env_var_is_empty() {
        assert!(source_list_from_env("SOLBOT_TEST_SURELY_UNSET_VARIABLE").is_empty());
    }
}
