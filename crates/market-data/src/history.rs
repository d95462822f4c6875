//! Chart series construction: thinning raw samples and labelling them.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::constants::HISTORY_POINTS;
use crate::models::{PriceHistory, PricePoint};

/// Reduce `points` to at most `HISTORY_POINTS` evenly spaced samples, always
/// keeping the first and the last, and label them for a chart axis.
pub fn build_history(points: &[PricePoint], days: u32) -> PriceHistory {
    let selected = thin(points, HISTORY_POINTS);
    let prices = selected.iter().map(|p| p.price).collect();
    let labels = selected
        .iter()
        .map(|p| label(p.timestamp, days))
        .collect();
    PriceHistory { prices, labels }
}

/// A flat series at `price`, used when no provider returned history.
pub fn flat_history(price: Decimal, days: u32, now: DateTime<Utc>) -> PriceHistory {
    let span = Duration::days(i64::from(days.max(1)));
    let steps = (HISTORY_POINTS - 1) as i32;
    let points: Vec<PricePoint> = (0..HISTORY_POINTS as i32)
        .map(|i| PricePoint {
            timestamp: now - span + span * i / steps,
            price,
        })
        .collect();
    build_history(&points, days)
}

fn thin(points: &[PricePoint], target: usize) -> Vec<&PricePoint> {
    if points.len() <= target || target < 2 {
        return points.iter().collect();
    }
    let last = points.len() - 1;
    (0..target)
        .map(|i| &points[(i * last + (target - 1) / 2) / (target - 1)])
        .collect()
}

/// Hours for intraday ranges, dates otherwise.
fn label(timestamp: DateTime<Utc>, days: u32) -> String {
    if days <= 1 {
        timestamp.format("%H:%M").to_string()
    } else {
        timestamp.format("%b %d").to_string()
    }
}
