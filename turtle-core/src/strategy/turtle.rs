//! Turtle breakout rule: classic channel breakout on daily bars.
//!
//! BUY when the last close reaches the highest high of the entry window, SELL
//! when it reaches the lowest low of the exit window, HOLD otherwise. Both
//! windows include the last bar, so a close equal to the bar's own high (or
//! low) is a breakout (or breakdown). BUY is checked first and wins ties.
//!
//! A series shorter than the entry window yields HOLD rather than an error.
//! Callers that need a hard failure check the length themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::{PriceBar, Signal, SignalResult};
use crate::indicators::{average_close, current_price, rolling_high, rolling_low};

pub const DEFAULT_ENTRY_PERIOD: usize = 20;
pub const DEFAULT_EXIT_PERIOD: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParamError {
    #[error("entry_period must be >= 1")]
    ZeroEntryPeriod,
    #[error("exit_period must be >= 1")]
    ZeroExitPeriod,
}

/// Window lengths (in bars) for the breakout rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurtleParams {
    entry_period: usize,
    exit_period: usize,
}

impl TurtleParams {
    pub fn new(entry_period: usize, exit_period: usize) -> Result<Self, ParamError> {
        if entry_period == 0 {
            return Err(ParamError::ZeroEntryPeriod);
        }
        if exit_period == 0 {
            return Err(ParamError::ZeroExitPeriod);
        }
        Ok(Self {
            entry_period,
            exit_period,
        })
    }

    pub fn entry_period(&self) -> usize {
        self.entry_period
    }

    pub fn exit_period(&self) -> usize {
        self.exit_period
    }

    /// Bars needed before the rule stops falling back to HOLD.
    pub fn warmup_bars(&self) -> usize {
        self.entry_period
    }
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            entry_period: DEFAULT_ENTRY_PERIOD,
            exit_period: DEFAULT_EXIT_PERIOD,
        }
    }
}

/// Channel levels as of the last bar of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub current_price: f64,
    pub entry_high: f64,
    pub exit_low: f64,
    pub average_price: f64,
}

impl ChannelSnapshot {
    /// `None` for an empty series.
    pub fn compute(bars: &[PriceBar], params: &TurtleParams) -> Option<Self> {
        Some(Self {
            current_price: current_price(bars)?,
            entry_high: rolling_high(bars, params.entry_period)?,
            exit_low: rolling_low(bars, params.exit_period)?,
            average_price: average_close(bars)?,
        })
    }

    pub fn signal(&self) -> Signal {
        decide(self.current_price, self.entry_high, self.exit_low)
    }
}

/// The decision step on its own: BUY first, then SELL, else HOLD.
pub fn decide(current: f64, entry_high: f64, exit_low: f64) -> Signal {
    if current >= entry_high {
        Signal::Buy
    } else if current <= exit_low {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Evaluate the breakout rule on a series trimmed to the evaluation date.
pub fn evaluate(bars: &[PriceBar], params: &TurtleParams) -> Signal {
    if bars.len() < params.warmup_bars() {
        debug!(
            bars = bars.len(),
            required = params.warmup_bars(),
            "insufficient history, holding"
        );
        return Signal::Hold;
    }

    // Non-empty here: warmup_bars() >= 1.
    let Some(snapshot) = ChannelSnapshot::compute(bars, params) else {
        return Signal::Hold;
    };
    let signal = snapshot.signal();
    debug!(
        current = snapshot.current_price,
        entry_high = snapshot.entry_high,
        exit_low = snapshot.exit_low,
        %signal,
        "turtle evaluation"
    );
    signal
}

/// Evaluate and package the signal with its channel levels.
///
/// Returns `None` for an empty series. A non-empty series shorter than the
/// entry window still produces a result (with signal HOLD).
pub fn analyze(
    symbol: &str,
    bars: &[PriceBar],
    params: &TurtleParams,
    timestamp: DateTime<Utc>,
) -> Option<SignalResult> {
    let snapshot = ChannelSnapshot::compute(bars, params)?;
    Some(SignalResult {
        symbol: symbol.to_string(),
        signal: evaluate(bars, params),
        current_price: snapshot.current_price,
        high_of_entry_window: snapshot.entry_high,
        low_of_exit_window: snapshot.exit_low,
        average_price: Some(snapshot.average_price),
        timestamp,
    })
}
