//! Price data providers.

pub mod circuit_breaker;
pub mod csv_file;
pub mod period;
pub mod provider;
pub mod static_provider;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use csv_file::CsvProvider;
pub use period::{LookbackPeriod, PeriodParseError};
pub use provider::{DataError, PriceProvider};
pub use static_provider::StaticProvider;
pub use yahoo::YahooProvider;
