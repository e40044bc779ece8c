//! Turtle Core: price series, channel metrics, signal evaluation, batch evaluation.
//!
//! This crate contains the pure heart of the signal system:
//! - Domain types (price bars, canonical series, signals, signal results)
//! - Channel metrics (rolling high/low, current price, average close)
//! - The turtle breakout evaluator (BUY / SELL / HOLD)
//! - Batch evaluation over a bounded symbol list with per-symbol isolation
//! - Price providers (Yahoo Finance, CSV files, in-memory) behind one trait

pub mod batch;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod strategy;

pub use batch::{
    evaluate_batch, normalize_symbols, parse_symbol_list, BatchEntry, BatchError, BatchResult,
    BatchStatus, DEFAULT_MIN_BARS, MAX_BATCH_SIZE,
};
pub use domain::{PriceBar, PriceSeries, Signal, SignalResult};
pub use strategy::{evaluate, ChannelSnapshot, ParamError, TurtleParams};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the batch evaluator hands across rayon
    /// workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceBar>();
        require_sync::<PriceBar>();
        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<SignalResult>();
        require_sync::<SignalResult>();
        require_send::<BatchEntry>();
        require_sync::<BatchEntry>();
        require_send::<BatchResult>();
        require_sync::<BatchResult>();
        require_send::<TurtleParams>();
        require_sync::<TurtleParams>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
    }

    /// The provider trait is object safe and shareable across threads.
    #[test]
    fn provider_trait_is_object_safe() {
        fn _check(provider: &dyn data::PriceProvider) -> &str {
            provider.name()
        }
        fn _require_send_sync<T: Send + Sync + ?Sized>() {}
        _require_send_sync::<dyn data::PriceProvider>();
    }
}
