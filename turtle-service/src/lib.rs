//! Turtle Service: the request surface around `turtle-core`.
//!
//! This crate provides:
//! - `SignalService`: analyze, quote, batch, history, statistics, watchlist, health
//! - Alert history behind the `AlertRepository` trait (JSONL file, in-memory)
//! - Trade alert delivery behind the `Notifier` trait (log, JSONL outbox)
//! - Tracked-symbol watchlist with soft delete
//! - TOML configuration with environment overrides
//! - `ServiceError` with HTTP status mapping

pub mod config;
pub mod error;
pub mod history;
pub mod notify;
pub mod service;
pub mod watchlist;

pub use config::{ConfigError, ProviderKind, ServiceConfig};
pub use error::ServiceError;
pub use history::{
    AlertRecord, AlertRepository, HistoryError, HistoryQuery, JsonlAlertStore, MemoryAlertStore,
    NewAlert, SignalStatistics,
};
pub use notify::{
    format_message, EmailMessage, LogNotifier, Notifier, NotifyError, OutboxNotifier, SignalEvent,
};
pub use service::{
    recommendation, AnalyzeRequest, AnalyzeResponse, BatchRequest, BatchResponse, HealthReport,
    HistoryStatus, QuoteRequest, QuoteResponse, SignalService, SymbolList, TrackedDetail,
};
pub use watchlist::{TrackedSymbol, Watchlist, WatchlistError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn service_is_send_sync() {
        assert_send::<SignalService>();
        assert_sync::<SignalService>();
    }

    #[test]
    fn stores_are_send_sync() {
        assert_send::<JsonlAlertStore>();
        assert_sync::<JsonlAlertStore>();
        assert_sync::<MemoryAlertStore>();
        assert_sync::<Watchlist>();
        assert_sync::<OutboxNotifier>();
    }
}
