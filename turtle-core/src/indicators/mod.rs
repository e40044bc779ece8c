//! Read-only projections over a price series.
//!
//! Each metric documents its own window so it can be asserted independently of
//! the signal that consumes it.

pub mod average;
pub mod channel;

pub use average::average_close;
pub use channel::{current_price, rolling_high, rolling_low, trailing, ChannelBand};

/// Create bars from (high, low, close) triples for testing.
///
/// Dates start at 2024-01-02 and advance one calendar day per bar; open equals
/// close, volume is fixed at 1000.
#[cfg(test)]
pub fn make_bars(data: &[(f64, f64, f64)]) -> Vec<crate::domain::PriceBar> {
    use crate::domain::PriceBar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(high, low, close))| PriceBar {
            date: base_date + chrono::Duration::days(i as i64),
            open: close,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
