//! Change metrics and display formatting.
//!
//! Rounding policy for display: values are scaled by 100 and rounded half
//! away from zero (`f64::round`), then printed with two decimals. A result of
//! zero is printed as `0.00`, never `-0.00`. Absent values print as
//! [`NOT_AVAILABLE`].

use serde::Serialize;

use crate::Quote;

/// Marker for a value the upstream did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Absolute and percentage change against the previous close.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ChangeMetrics {
    pub change: Option<f64>,
    pub pct_change: Option<f64>,
}

/// Both metrics are present only when last price and a non-zero previous
/// close are available.
pub fn compute(quote: &Quote) -> ChangeMetrics {
    let (Some(last), Some(previous)) = (quote.last_price, quote.previous_close) else {
        return ChangeMetrics::default();
    };
    if previous == 0.0 || !last.is_finite() || !previous.is_finite() {
        return ChangeMetrics::default();
    }

    let change = last - previous;
    ChangeMetrics {
        change: Some(change),
        pct_change: Some(change / previous * 100.0),
    }
}

/// Round to two decimals, half away from zero.
pub fn round_2dp(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn format_price(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{:.2}", round_2dp(value)),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!("{:.2}%", round_2dp(value)),
        _ => NOT_AVAILABLE.to_owned(),
    }
}

pub fn format_count(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_owned(), |value| value.to_string())
}
