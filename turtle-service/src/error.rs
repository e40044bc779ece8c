//! Request-level errors and their HTTP status mapping.

use thiserror::Error;
use turtle_core::data::{DataError, PeriodParseError};
use turtle_core::{BatchError, ParamError};

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The provider has no bars for the symbol.
    #[error("no data found for symbol '{symbol}'")]
    DataUnavailable { symbol: String },

    /// Fewer bars than the request needs.
    #[error("insufficient data for '{symbol}': {available} bars, need at least {required}")]
    InsufficientHistory {
        symbol: String,
        available: usize,
        required: usize,
    },

    #[error("too many symbols: {requested} requested, at most {max} per batch")]
    BatchSizeExceeded { requested: usize, max: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Transport failure talking to the price provider.
    #[error("upstream provider error: {0}")]
    Upstream(#[source] DataError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// HTTP status an HTTP layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::DataUnavailable { .. } | ServiceError::NotFound(_) => 404,
            ServiceError::InsufficientHistory { .. }
            | ServiceError::BatchSizeExceeded { .. }
            | ServiceError::InvalidInput(_) => 400,
            ServiceError::Upstream(_) => 502,
            ServiceError::Unexpected(_) => 500,
        }
    }

    /// Classify a single-symbol fetch failure.
    pub fn from_fetch(symbol: &str, err: DataError) -> Self {
        if err.is_no_data() {
            ServiceError::DataUnavailable {
                symbol: symbol.to_string(),
            }
        } else {
            ServiceError::Upstream(err)
        }
    }
}

impl From<BatchError> for ServiceError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::Empty => ServiceError::InvalidInput(err.to_string()),
            BatchError::TooManySymbols { requested, max } => {
                ServiceError::BatchSizeExceeded { requested, max }
            }
        }
    }
}

impl From<ParamError> for ServiceError {
    fn from(err: ParamError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<PeriodParseError> for ServiceError {
    fn from(err: PeriodParseError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}
