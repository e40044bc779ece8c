//! Signal kinds and the immutable result of one evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trading signal produced by the turtle evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// BUY and SELL call for action; HOLD does not.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown signal '{0}' (expected BUY, SELL or HOLD)")]
pub struct SignalParseError(pub String);

impl FromStr for Signal {
    type Err = SignalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            _ => Err(SignalParseError(s.to_string())),
        }
    }
}

/// Outcome of evaluating one symbol. Created fresh per evaluation, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub signal: Signal,
    pub current_price: f64,
    /// Highest high over the entry window.
    pub high_of_entry_window: f64,
    /// Lowest low over the exit window.
    pub low_of_exit_window: f64,
    /// Mean close over the whole supplied series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<f64>,
    pub timestamp: DateTime<Utc>,
}
