use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Point-in-time health summary of a family, for dashboards.
///
/// Counters are keyed by candidate label, never by the full identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyStats {
    pub family: String,
    pub total_keys: usize,
    pub working_keys: usize,
    pub current_key: Option<String>,
    pub failures: HashMap<String, u32>,
    pub successes: HashMap<String, u32>,
    pub last_error: Option<String>,
}

impl FamilyStats {
    /// Fraction of candidates below the failure threshold. An empty family
    /// reports 0.
    pub fn health_ratio(&self) -> f64 {
        if self.total_keys == 0 {
            0.0
        } else {
            self.working_keys as f64 / self.total_keys as f64
        }
    }

    /// Whether fewer than `min_ratio` of the candidates are usable.
    pub fn is_degraded(&self, min_ratio: f64) -> bool {
        self.health_ratio() < min_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let stats = FamilyStats {
            family: "price".to_string(),
            total_keys: 2,
            working_keys: 1,
            current_key: Some("CG-abc...".to_string()),
            failures: HashMap::from([("CG-abc...".to_string(), 5)]),
            successes: HashMap::new(),
            last_error: None,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalKeys"], 2);
        assert_eq!(json["workingKeys"], 1);
        assert_eq!(json["currentKey"], "CG-abc...");
        assert_eq!(json["failures"]["CG-abc..."], 5);
        assert!(json["lastError"].is_null());
    }

    #[test]
    fn test_health_ratio() {
        let mut stats = FamilyStats {
            total_keys: 4,
            working_keys: 1,
            ..Default::default()
        };
        assert_eq!(stats.health_ratio(), 0.25);
        assert!(stats.is_degraded(0.5));

        stats.working_keys = 4;
        assert!(!stats.is_degraded(0.5));

        assert_eq!(FamilyStats::default().health_ratio(), 0.0);
    }
}
