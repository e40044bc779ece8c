//! In-memory provider backed by pre-built series.

use std::collections::{HashMap, HashSet};

use super::period::LookbackPeriod;
use super::provider::{DataError, PriceProvider};
use crate::domain::PriceSeries;

/// Serves canned series by symbol. The requested period is ignored: callers
/// get exactly the bars they inserted.
///
/// Symbols registered with [`StaticProvider::fail_symbol`] return a network
/// error, which lets tests exercise per-symbol failure handling.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    series: HashMap<String, PriceSeries>,
    failing: HashSet<String>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn fail_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.failing.insert(symbol.into());
        self
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }
}

impl PriceProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, symbol: &str, _period: LookbackPeriod) -> Result<PriceSeries, DataError> {
        if self.failing.contains(symbol) {
            return Err(DataError::NetworkUnreachable(format!(
                "simulated failure for {symbol}"
            )));
        }
        self.series
            .get(symbol)
            .cloned()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_inserted_series() {
        let provider = StaticProvider::new().with_series(PriceSeries::empty("AAPL"));
        let got = provider.fetch("AAPL", LookbackPeriod::Max).unwrap();
        assert_eq!(got.symbol(), "AAPL");
        assert!(provider.fetch("MSFT", LookbackPeriod::Max).unwrap_err().is_no_data());
    }

    #[test]
    fn failing_symbol_errors() {
        let provider = StaticProvider::new()
            .with_series(PriceSeries::empty("AAPL"))
            .fail_symbol("AAPL");
        let err = provider.fetch("AAPL", LookbackPeriod::TwoMonths).unwrap_err();
        assert!(matches!(err, DataError::NetworkUnreachable(_)));
    }
}
