//! Sanity checks on provider answers.
//!
//! A provider that answers with nonsense counts as a failed attempt, so its
//! candidate is penalised and the next source is tried:
//! - Non-positive prices (hard)
//! - Prices above a sanity ceiling (hard)
//! - Implausible 24h changes (soft, logged only)
//! - Empty or non-positive chart samples (hard)

use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solbot_resilience::SourceError;

use crate::models::{PricePoint, PriceQuote};

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Reject the answer and try the next source.
    Hard,
    /// Accept the answer but log a warning.
    Soft,
}

#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: ValidationSeverity,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Maximum allowed price (sanity ceiling).
    pub max_price: Decimal,
    /// 24h moves beyond this many percent are logged.
    pub warn_change_pct: Decimal,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_price: dec!(10000000),
            warn_change_pct: dec!(50),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PriceValidator {
    config: ValidatorConfig,
}

impl PriceValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a current-price answer from `provider`.
    pub fn validate_quote(&self, provider: &str, quote: &PriceQuote) -> Result<(), SourceError> {
        let mut issues = Vec::new();
        self.check_price(quote.price, &mut issues);

        if quote.change_24h.abs() > self.config.warn_change_pct {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: format!("24h change of {}% looks implausible", quote.change_24h),
            });
        }

        report(provider, issues)
    }

    /// Validate a chart series from `provider`.
    pub fn validate_history(&self, provider: &str, points: &[PricePoint]) -> Result<(), SourceError> {
        if points.is_empty() {
            return Err(SourceError::ValidationFailed {
                message: format!("{provider}: empty price history"),
            });
        }

        let mut issues = Vec::new();
        for point in points {
            self.check_price(point.price, &mut issues);
        }
        report(provider, issues)
    }

    fn check_price(&self, price: Decimal, issues: &mut Vec<ValidationIssue>) {
        if price <= Decimal::ZERO {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!("Non-positive price: {}", price),
            });
        } else if price > self.config.max_price {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Hard,
                message: format!(
                    "Price ({}) exceeds max threshold ({})",
                    price, self.config.max_price
                ),
            });
        }
    }
}

fn report(provider: &str, issues: Vec<ValidationIssue>) -> Result<(), SourceError> {
    let (hard, soft): (Vec<_>, Vec<_>) = issues
        .into_iter()
        .partition(|i| i.severity == ValidationSeverity::Hard);

    for issue in &soft {
        warn!("Validation warning for {}: {}", provider, issue.message);
    }

    if hard.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = hard.iter().map(|i| i.message.as_str()).collect();
        Err(SourceError::ValidationFailed {
            message: format!("{}: {}", provider, messages.join("; ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_valid_quote() {
        let validator = PriceValidator::new();
        let quote = PriceQuote::new(dec!(150), dec!(3.5));
        assert!(validator.validate_quote("BINANCE", &quote).is_ok());
    }

    #[test]
    fn test_zero_price_rejected() {
        let validator = PriceValidator::new();
        let quote = PriceQuote::new(Decimal::ZERO, Decimal::ZERO);
        let err = validator.validate_quote("OKX", &quote).unwrap_err();
        assert!(matches!(err, SourceError::ValidationFailed { .. }));
        assert!(err.to_string().contains("OKX"));
    }

    #[test]
    fn test_ceiling() {
        let validator = PriceValidator::with_config(ValidatorConfig {
            max_price: dec!(1000),
            ..Default::default()
        });
        let quote = PriceQuote::new(dec!(1001), Decimal::ZERO);
        assert!(validator.validate_quote("X", &quote).is_err());
    }

    #[test]
    fn test_large_change_is_only_a_warning() {
        let validator = PriceValidator::new();
        let quote = PriceQuote::new(dec!(10), dec!(-80));
        assert!(validator.validate_quote("X", &quote).is_ok());
    }

    #[test]
    fn test_history() {
        let validator = PriceValidator::new();
        assert!(validator.validate_history("X", &[]).is_err());

        let points = vec![
            PricePoint {
                timestamp: Utc::now(),
                price: dec!(1),
            },
            PricePoint {
                timestamp: Utc::now(),
                price: dec!(-1),
            },
        ];
        assert!(validator.validate_history("X", &points).is_err());
        assert!(validator.validate_history("X", &points[..1]).is_ok());
    }
}
