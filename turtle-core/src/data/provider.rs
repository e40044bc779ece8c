//! Price provider trait and structured error types.
//!
//! The PriceProvider trait abstracts over data sources (Yahoo Finance, CSV
//! files, in-memory fixtures) so the service can swap implementations and
//! tests can inject canned series.

use thiserror::Error;

use super::period::LookbackPeriod;
use crate::domain::PriceSeries;

/// Structured error types for data operations.
///
/// "No data" has two spellings: an `Ok` empty series, or `SymbolNotFound`.
/// Every other variant is a transport or format failure.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("csv error: {0}")]
    Csv(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// True when the provider answered but has nothing for the symbol.
    pub fn is_no_data(&self) -> bool {
        matches!(self, DataError::SymbolNotFound { .. })
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::Csv(err.to_string())
    }
}

/// Source of daily bars for a symbol.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars covering `period`, ending at the latest available bar.
    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, DataError>;

    /// Whether the provider currently accepts requests (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Trim a full-history series to the lookback window ending at its last bar.
pub fn trim_to_period(series: PriceSeries, period: LookbackPeriod) -> PriceSeries {
    if let Some(n) = period.trading_days() {
        let symbol = series.symbol().to_string();
        let mut bars = series.into_bars();
        let keep_from = bars.len().saturating_sub(n);
        bars.drain(..keep_from);
        return PriceSeries::new(symbol, bars);
    }

    let start = series.last().and_then(|b| period.start_date(b.date));
    match start {
        Some(start) => series.since(start),
        None => series,
    }
}
