//! CSV price provider.
//!
//! Reads `<dir>/<SYMBOL>.csv` with a `date,open,high,low,close,volume`
//! header. Used for offline runs and as the fallback when the remote
//! provider is unreachable.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::period::LookbackPeriod;
use super::provider::{trim_to_period, DataError, PriceProvider};
use crate::domain::{PriceBar, PriceSeries};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<u64>,
}

impl From<CsvRow> for PriceBar {
    fn from(row: CsvRow) -> Self {
        PriceBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Read every bar in the symbol's file, unfiltered.
    pub fn read_all(&self, symbol: &str) -> Result<PriceSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)?;

        let bars = reader
            .deserialize::<CsvRow>()
            .map(|row| row.map(PriceBar::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PriceSeries::new(symbol, bars))
    }
}

impl PriceProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, period: LookbackPeriod) -> Result<PriceSeries, DataError> {
        let series = trim_to_period(self.read_all(symbol)?, period);
        debug!(%symbol, %period, bars = series.len(), dir = %self.dir.display(), "read from csv");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, symbol: &str, body: &str) {
        fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
    }

    #[test]
    fn reads_and_sorts_rows() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "SPY",
            "date,open,high,low,close,volume\n\
             2024-01-03,101,102,100,101.5,2000\n\
             2024-01-02,100,101,99,100.5,1000\n",
        );
        let provider = CsvProvider::new(tmp.path());
        let series = provider.fetch("SPY", LookbackPeriod::Max).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.first().unwrap().close, 100.5);
        assert_eq!(series.last().unwrap().volume, 2000);
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "QQQ",
            "date,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.5,\n",
        );
        let series = CsvProvider::new(tmp.path()).read_all("QQQ").unwrap();
        assert_eq!(series.last().unwrap().volume, 0);
    }

    #[test]
    fn missing_file_is_symbol_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = CsvProvider::new(tmp.path())
            .fetch("NOPE", LookbackPeriod::OneYear)
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn malformed_row_is_csv_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "BAD",
            "date,open,high,low,close,volume\nnot-a-date,1,2,0,1,5\n",
        );
        let err = CsvProvider::new(tmp.path()).read_all("BAD").unwrap_err();
        assert!(matches!(err, DataError::Csv(_)));
    }

    #[test]
    fn header_only_is_empty_series() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "NEW", "date,open,high,low,close,volume\n");
        let series = CsvProvider::new(tmp.path())
            .fetch("NEW", LookbackPeriod::TwoMonths)
            .unwrap();
        assert!(series.is_empty());
    }
}
