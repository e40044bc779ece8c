//! PriceBar and PriceSeries: the market data the evaluator consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }
}

/// Ordered daily bars for one symbol.
///
/// Always ascending by date with no duplicate dates. Construction through
/// [`PriceSeries::new`] canonicalizes raw provider output, so every series a
/// provider hands out already satisfies the ordering invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from raw bars.
    ///
    /// Drops void bars (any NaN price), sorts by date, and keeps the last
    /// bar seen for a duplicated date.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<PriceBar>) -> Self {
        bars.retain(|b| !b.is_void());
        bars.sort_by_key(|b| b.date);

        let mut canonical: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match canonical.last_mut() {
                Some(prev) if prev.date == bar.date => *prev = bar,
                _ => canonical.push(bar),
            }
        }

        Self {
            symbol: symbol.into(),
            bars: canonical,
        }
    }

    /// A series with no bars ("symbol known, no data").
    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Keep only bars dated on or after `start`.
    pub fn since(self, start: NaiveDate) -> Self {
        let bars = self.bars.into_iter().filter(|b| b.date >= start).collect();
        Self {
            symbol: self.symbol,
            bars,
        }
    }

    /// Keep only bars dated on or before `as_of`. Used to evaluate "as of" a
    /// past date without lookahead.
    pub fn as_of(self, as_of: NaiveDate) -> Self {
        let bars = self.bars.into_iter().filter(|b| b.date <= as_of).collect();
        Self {
            symbol: self.symbol,
            bars,
        }
    }

    pub fn into_bars(self) -> Vec<PriceBar> {
        self.bars
    }
}
