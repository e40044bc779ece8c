//! Batch evaluation: one turtle signal per requested symbol, failures isolated.
//!
//! Symbols are normalized (trimmed, upper-cased, blanks dropped) but never
//! de-duplicated: a symbol requested twice is fetched and reported twice.
//! Each symbol's fetch + evaluate runs independently on the rayon pool; the
//! indexed collect keeps output order equal to input order no matter which
//! worker finishes first. A failing symbol becomes a `failed` entry and never
//! affects its siblings.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{normalize_symbol, PriceSeries, SignalResult};
use crate::strategy::{analyze, TurtleParams};

/// Upper bound on symbols per batch request.
pub const MAX_BATCH_SIZE: usize = 10;

/// Bars a symbol needs before the batch evaluates it.
pub const DEFAULT_MIN_BARS: usize = 20;

/// Caller-input errors. Raised before any fetch happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("symbol list is empty")]
    Empty,

    #[error("too many symbols: {requested} requested, at most {max} per batch")]
    TooManySymbols { requested: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Failed,
}

/// Outcome for a single requested symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub symbol: String,
    pub status: BatchStatus,
    pub result: Option<SignalResult>,
    pub error: Option<String>,
}

impl BatchEntry {
    fn success(result: SignalResult) -> Self {
        Self {
            symbol: result.symbol.clone(),
            status: BatchStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    fn failed(symbol: String, reason: impl Into<String>) -> Self {
        Self {
            symbol,
            status: BatchStatus::Failed,
            result: None,
            error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Normalized symbols processed; always equals `entries.len()`.
    pub total_requested: usize,
    pub entries: Vec<BatchEntry>,
    pub timestamp: DateTime<Utc>,
}

impl BatchResult {
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total_requested - self.succeeded()
    }
}

/// Trim, upper-case and drop blank entries, keeping order and duplicates.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter()
        .filter_map(|s| normalize_symbol(s.as_ref()))
        .collect()
}

/// Split a comma-separated list ("AAPL, tsla,,MSFT") and normalize it.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',').filter_map(normalize_symbol).collect()
}

/// Evaluate every symbol with the default 20/10 windows.
///
/// A symbol fails when its fetch errors, returns no bars, or returns fewer
/// than `min_bars` bars. More than [`MAX_BATCH_SIZE`] normalized symbols, or
/// none at all, is rejected before `fetch` is ever called.
pub fn evaluate_batch<S, F, E>(
    symbols: &[S],
    fetch: F,
    min_bars: usize,
) -> Result<BatchResult, BatchError>
where
    S: AsRef<str>,
    F: Fn(&str) -> Result<PriceSeries, E> + Sync,
    E: Display,
{
    let symbols = normalize_symbols(symbols);
    if symbols.is_empty() {
        return Err(BatchError::Empty);
    }
    if symbols.len() > MAX_BATCH_SIZE {
        return Err(BatchError::TooManySymbols {
            requested: symbols.len(),
            max: MAX_BATCH_SIZE,
        });
    }

    info!(count = symbols.len(), "starting batch evaluation");
    let params = TurtleParams::default();

    let entries: Vec<BatchEntry> = symbols
        .into_par_iter()
        .map(|symbol| evaluate_one(symbol, &fetch, min_bars, &params))
        .collect();

    let result = BatchResult {
        total_requested: entries.len(),
        entries,
        timestamp: Utc::now(),
    };
    info!(
        succeeded = result.succeeded(),
        failed = result.failed(),
        "batch evaluation complete"
    );
    Ok(result)
}

fn evaluate_one<F, E>(symbol: String, fetch: &F, min_bars: usize, params: &TurtleParams) -> BatchEntry
where
    F: Fn(&str) -> Result<PriceSeries, E> + Sync,
    E: Display,
{
    let series = match fetch(&symbol) {
        Ok(series) => series,
        Err(e) => {
            warn!(%symbol, error = %e, "fetch failed");
            return BatchEntry::failed(symbol, format!("fetch failed: {e}"));
        }
    };

    if series.is_empty() {
        warn!(%symbol, "no data returned");
        return BatchEntry::failed(symbol, "no data returned for symbol");
    }
    if series.len() < min_bars {
        warn!(%symbol, bars = series.len(), min_bars, "insufficient history");
        return BatchEntry::failed(
            symbol,
            format!(
                "insufficient data: {} bars, need at least {min_bars}",
                series.len()
            ),
        );
    }

    match analyze(&symbol, series.bars(), params, Utc::now()) {
        Some(result) => BatchEntry::success(result),
        None => BatchEntry::failed(symbol, "no data returned for symbol"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn series(symbol: &str, n: usize) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                PriceBar {
                    date: base + chrono::Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1000,
                }
            })
            .collect();
        PriceSeries::new(symbol, bars)
    }

    #[test]
    fn normalizes_without_dedup() {
        let syms = normalize_symbols(&[" aapl", "", "AAPL ", "  ", "tsla"]);
        assert_eq!(syms, vec!["AAPL", "AAPL", "TSLA"]);
    }

    #[test]
    fn parses_comma_list() {
        assert_eq!(parse_symbol_list("aapl, tsla,,msft "), vec!["AAPL", "TSLA", "MSFT"]);
        assert!(parse_symbol_list(" , ,").is_empty());
    }

    #[test]
    fn empty_list_rejected() {
        let calls = AtomicUsize::new(0);
        let err = evaluate_batch(
            &["  ", ""],
            |s: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(series(s, 30))
            },
            DEFAULT_MIN_BARS,
        )
        .unwrap_err();
        assert_eq!(err, BatchError::Empty);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn oversized_batch_rejected_before_fetch() {
        let calls = AtomicUsize::new(0);
        let symbols: Vec<String> = (0..11).map(|i| format!("S{i}")).collect();
        let err = evaluate_batch(
            &symbols,
            |s: &str| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(series(s, 30))
            },
            DEFAULT_MIN_BARS,
        )
        .unwrap_err();
        assert_eq!(
            err,
            BatchError::TooManySymbols {
                requested: 11,
                max: 10
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn blank_entries_do_not_count_toward_limit() {
        let mut symbols: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
        symbols.push("   ".into());
        let result =
            evaluate_batch(&symbols, |s: &str| Ok::<_, String>(series(s, 30)), 20).unwrap();
        assert_eq!(result.total_requested, 10);
    }

    #[test]
    fn short_series_fails_with_reason() {
        let result =
            evaluate_batch(&["AAPL"], |s: &str| Ok::<_, String>(series(s, 19)), 20).unwrap();
        let entry = &result.entries[0];
        assert_eq!(entry.status, BatchStatus::Failed);
        assert!(entry.result.is_none());
        assert!(entry.error.as_deref().unwrap().contains("19 bars"));
    }

    #[test]
    fn fetch_error_is_captured() {
        let result = evaluate_batch(
            &["AAPL", "BOOM"],
            |s: &str| {
                if s == "BOOM" {
                    Err("connection reset".to_string())
                } else {
                    Ok(series(s, 25))
                }
            },
            20,
        )
        .unwrap();
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
        assert!(result.entries[1]
            .error
            .as_deref()
            .unwrap()
            .contains("connection reset"));
    }

    #[test]
    fn successful_entries_carry_result() {
        let result =
            evaluate_batch(&["msft"], |s: &str| Ok::<_, String>(series(s, 25)), 20).unwrap();
        let entry = &result.entries[0];
        assert!(entry.is_success());
        assert_eq!(entry.symbol, "MSFT");
        let r = entry.result.as_ref().unwrap();
        assert_eq!(r.symbol, "MSFT");
        // Monotonically rising closes: each close equals its own high minus one,
        // so the last close (124) is below the window high (125) and above the
        // exit low (114).
        assert_eq!(r.current_price, 124.0);
        assert_eq!(r.high_of_entry_window, 125.0);
        assert_eq!(r.low_of_exit_window, 114.0);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BatchStatus::Failed).unwrap(),
            "\"failed\""
        );
    }
}
