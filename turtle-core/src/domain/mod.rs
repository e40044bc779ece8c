//! Domain types for the turtle signal system

pub mod bar;
pub mod signal;

pub use bar::{PriceBar, PriceSeries};
pub use signal::{Signal, SignalParseError, SignalResult};

/// Symbol type alias
pub type Symbol = String;

/// Normalize a user-supplied ticker: trim surrounding whitespace and upper-case.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_symbol(raw: &str) -> Option<Symbol> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}
