//! Trailing price channel: highest high / lowest low over the most recent bars.
//!
//! Unlike a full rolling indicator, the evaluator only needs the channel as of
//! the last bar, so these helpers compute a single value:
//! - Upper: max(high) over the last `period` bars, last bar included
//! - Lower: min(low) over the last `period` bars, last bar included
//!
//! A period longer than the series covers the whole series.

use crate::domain::PriceBar;

/// Which edge of the channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelBand {
    Upper,
    Lower,
}

impl ChannelBand {
    /// Extreme of the band over `bars`, or `None` for an empty slice.
    pub fn extreme(self, bars: &[PriceBar]) -> Option<f64> {
        match self {
            ChannelBand::Upper => bars.iter().map(|b| b.high).reduce(f64::max),
            ChannelBand::Lower => bars.iter().map(|b| b.low).reduce(f64::min),
        }
    }
}

/// The most recent `period` bars (all of them when the series is shorter).
pub fn trailing(bars: &[PriceBar], period: usize) -> &[PriceBar] {
    &bars[bars.len().saturating_sub(period)..]
}

/// Close of the last bar.
pub fn current_price(bars: &[PriceBar]) -> Option<f64> {
    bars.last().map(|b| b.close)
}

/// Highest high over the trailing `period` bars.
pub fn rolling_high(bars: &[PriceBar], period: usize) -> Option<f64> {
    ChannelBand::Upper.extreme(trailing(bars, period))
}

/// Lowest low over the trailing `period` bars.
pub fn rolling_low(bars: &[PriceBar], period: usize) -> Option<f64> {
    ChannelBand::Lower.extreme(trailing(bars, period))
}
