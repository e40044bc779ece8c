//! Lookback window requested from a provider ("2mo", "1y", ...).

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[default]
    #[serde(rename = "2mo")]
    TwoMonths,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "10y")]
    TenYears,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "max")]
    Max,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown period '{0}' (expected one of 1d, 5d, 1mo, 2mo, 3mo, 6mo, 1y, 2y, 5y, 10y, ytd, max)")]
pub struct PeriodParseError(pub String);

impl LookbackPeriod {
    pub const ALL: [LookbackPeriod; 12] = [
        LookbackPeriod::OneDay,
        LookbackPeriod::FiveDays,
        LookbackPeriod::OneMonth,
        LookbackPeriod::TwoMonths,
        LookbackPeriod::ThreeMonths,
        LookbackPeriod::SixMonths,
        LookbackPeriod::OneYear,
        LookbackPeriod::TwoYears,
        LookbackPeriod::FiveYears,
        LookbackPeriod::TenYears,
        LookbackPeriod::YearToDate,
        LookbackPeriod::Max,
    ];

    /// Yahoo chart API `range` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackPeriod::OneDay => "1d",
            LookbackPeriod::FiveDays => "5d",
            LookbackPeriod::OneMonth => "1mo",
            LookbackPeriod::TwoMonths => "2mo",
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::FiveYears => "5y",
            LookbackPeriod::TenYears => "10y",
            LookbackPeriod::YearToDate => "ytd",
            LookbackPeriod::Max => "max",
        }
    }

    /// Trading-day windows count bars rather than calendar days.
    pub fn trading_days(&self) -> Option<usize> {
        match self {
            LookbackPeriod::OneDay => Some(1),
            LookbackPeriod::FiveDays => Some(5),
            _ => None,
        }
    }

    /// First calendar date inside the window ending at `end`.
    ///
    /// `None` for `max` and for the trading-day windows (see [`trading_days`]).
    ///
    /// [`trading_days`]: LookbackPeriod::trading_days
    pub fn start_date(&self, end: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            LookbackPeriod::OneMonth => 1,
            LookbackPeriod::TwoMonths => 2,
            LookbackPeriod::ThreeMonths => 3,
            LookbackPeriod::SixMonths => 6,
            LookbackPeriod::OneYear => 12,
            LookbackPeriod::TwoYears => 24,
            LookbackPeriod::FiveYears => 60,
            LookbackPeriod::TenYears => 120,
            LookbackPeriod::YearToDate => return NaiveDate::from_ymd_opt(end.year(), 1, 1),
            LookbackPeriod::OneDay | LookbackPeriod::FiveDays | LookbackPeriod::Max => {
                return None
            }
        };
        end.checked_sub_months(Months::new(months))
            .and_then(|d| d.succ_opt())
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookbackPeriod {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| PeriodParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_two_months() {
        assert_eq!(LookbackPeriod::default(), LookbackPeriod::TwoMonths);
    }

    #[test]
    fn parses_every_variant() {
        for p in LookbackPeriod::ALL {
            assert_eq!(p.as_str().parse::<LookbackPeriod>().unwrap(), p);
        }
        assert_eq!("1Y".parse::<LookbackPeriod>().unwrap(), LookbackPeriod::OneYear);
        assert!("3w".parse::<LookbackPeriod>().is_err());
    }

    #[test]
    fn serde_uses_range_strings() {
        let json = serde_json::to_string(&LookbackPeriod::SixMonths).unwrap();
        assert_eq!(json, "\"6mo\"");
        let p: LookbackPeriod = serde_json::from_str("\"ytd\"").unwrap();
        assert_eq!(p, LookbackPeriod::YearToDate);
    }

    #[test]
    fn month_windows_are_calendar_based() {
        let end = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(
            LookbackPeriod::TwoMonths.start_date(end),
            NaiveDate::from_ymd_opt(2024, 3, 16)
        );
        assert_eq!(
            LookbackPeriod::YearToDate.start_date(end),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(LookbackPeriod::Max.start_date(end), None);
        assert_eq!(LookbackPeriod::FiveDays.trading_days(), Some(5));
    }
}
