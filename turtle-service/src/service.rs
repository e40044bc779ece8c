//! Signal service: the request/response surface over the core evaluator.
//!
//! A single-symbol analysis runs fetch, length check, evaluation,
//! notification, watchlist update and history write, in that order. Only
//! the first three can fail the request. Notification, watchlist and history
//! are best effort: a failure there is logged and the computed signal is
//! still returned (with `alert_id = None` / `notified = false`).
//!
//! Prices in responses are rounded to cents. Evaluation itself runs on the
//! unrounded bars.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use turtle_core::data::{
    CircuitBreaker, CsvProvider, LookbackPeriod, PriceProvider, YahooProvider,
};
use turtle_core::domain::normalize_symbol;
use turtle_core::strategy::analyze;
use turtle_core::{
    evaluate_batch, normalize_symbols, parse_symbol_list, BatchEntry, ChannelSnapshot, PriceSeries,
    Signal, SignalResult, TurtleParams, DEFAULT_MIN_BARS,
};

use crate::config::{ProviderKind, ServiceConfig};
use crate::error::ServiceError;
use crate::history::{
    AlertRecord, AlertRepository, HistoryQuery, JsonlAlertStore, NewAlert, SignalStatistics,
};
use crate::notify::{LogNotifier, Notifier, OutboxNotifier, SignalEvent};
use crate::watchlist::{TrackedSymbol, Watchlist};

/// Largest page a history listing may request.
pub const MAX_HISTORY_LIMIT: usize = 100;

/// Alerts shown alongside a tracked symbol.
pub const DETAIL_RECENT_ALERTS: usize = 5;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Human-readable advice for a signal.
pub fn recommendation(signal: Signal, params: &TurtleParams, low: f64, high: f64) -> String {
    match signal {
        Signal::Buy => format!(
            "Price broke above the {}-day high, consider buying",
            params.entry_period()
        ),
        Signal::Sell => format!(
            "Price fell below the {}-day low, consider selling",
            params.exit_period()
        ),
        Signal::Hold => format!("Price is inside the ${low:.2} - ${high:.2} channel, hold and watch"),
    }
}

// ── Requests / responses ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub symbol: String,
    pub period: Option<LookbackPeriod>,
    pub entry_period: Option<usize>,
    pub exit_period: Option<usize>,
}

impl AnalyzeRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub symbol: String,
    pub signal: Signal,
    pub current_price: f64,
    pub high_of_entry_window: f64,
    pub low_of_exit_window: f64,
    pub entry_period: usize,
    pub exit_period: usize,
    pub recommendation: String,
    pub timestamp: DateTime<Utc>,
    /// Id of the stored history record, if the write succeeded.
    pub alert_id: Option<u64>,
    pub notified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteRequest {
    pub symbol: String,
    pub period: Option<LookbackPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub symbol: String,
    pub current_price: f64,
    pub high_20d: f64,
    pub low_10d: f64,
    pub average_price: f64,
    pub data_points: usize,
    pub period: LookbackPeriod,
    pub timestamp: DateTime<Utc>,
}

/// Symbols as a JSON list or a single comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolList {
    List(Vec<String>),
    Csv(String),
}

impl SymbolList {
    pub fn normalized(&self) -> Vec<String> {
        match self {
            SymbolList::List(list) => normalize_symbols(list),
            SymbolList::Csv(raw) => parse_symbol_list(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub symbols: SymbolList,
    #[serde(default)]
    pub period: Option<LookbackPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchEntry>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedDetail {
    #[serde(flatten)]
    pub tracked: TrackedSymbol,
    pub recent_alerts: Vec<AlertRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Connected,
    Disabled,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub provider: String,
    pub provider_available: bool,
    pub history: HistoryStatus,
    pub total_analyses: usize,
    pub tracked_symbols: usize,
    pub timestamp: DateTime<Utc>,
}

// ── Service ──────────────────────────────────────────────────────────

pub struct SignalService {
    config: ServiceConfig,
    provider: Arc<dyn PriceProvider>,
    history: Option<Arc<dyn AlertRepository>>,
    history_status: HistoryStatus,
    notifier: Option<Arc<dyn Notifier>>,
    watchlist: Option<Arc<Watchlist>>,
}

impl SignalService {
    /// A service with no history, notifier or watchlist attached.
    pub fn new(provider: Arc<dyn PriceProvider>, config: ServiceConfig) -> Self {
        Self {
            config,
            provider,
            history: None,
            history_status: HistoryStatus::Disabled,
            notifier: None,
            watchlist: None,
        }
    }

    pub fn with_history(mut self, history: Arc<dyn AlertRepository>) -> Self {
        self.history = Some(history);
        self.history_status = HistoryStatus::Connected;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_watchlist(mut self, watchlist: Arc<Watchlist>) -> Self {
        self.watchlist = Some(watchlist);
        self
    }

    /// Wire everything the configuration asks for.
    ///
    /// The configuration must validate and the provider must build. History
    /// and watchlist files that cannot be opened are logged and left
    /// detached, and health reports history as unavailable.
    pub fn from_config(config: ServiceConfig) -> Result<Self, ServiceError> {
        config
            .validate()
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let provider: Arc<dyn PriceProvider> = match config.provider.kind {
            ProviderKind::Yahoo => Arc::new(
                YahooProvider::new(
                    Arc::new(CircuitBreaker::default_provider()),
                    Duration::from_secs(config.provider.timeout_secs),
                    config.provider.max_retries,
                )
                .map_err(|e| ServiceError::Unexpected(e.to_string()))?,
            ),
            ProviderKind::Csv => Arc::new(CsvProvider::new(&config.provider.csv_dir)),
        };

        let mut service = Self::new(provider, config.clone());

        if config.history.enabled {
            match JsonlAlertStore::open(&config.history.path) {
                Ok(store) => service = service.with_history(Arc::new(store)),
                Err(e) => {
                    warn!(path = %config.history.path.display(), error = %e, "alert history unavailable");
                    service.history_status = HistoryStatus::Unavailable;
                }
            }
        }

        if config.notification.enabled {
            let notification = &config.notification;
            let notifier: Arc<dyn Notifier> = match &notification.outbox_path {
                Some(path) => Arc::new(OutboxNotifier::new(
                    path,
                    notification.from.clone(),
                    notification.to.clone(),
                )),
                None => Arc::new(LogNotifier::new(notification.to.clone())),
            };
            service = service.with_notifier(notifier);
        }

        if config.watchlist.enabled {
            match Watchlist::open(&config.watchlist.path) {
                Ok(watchlist) => service = service.with_watchlist(Arc::new(watchlist)),
                Err(e) => {
                    warn!(path = %config.watchlist.path.display(), error = %e, "watchlist unavailable")
                }
            }
        }

        info!(
            provider = service.provider.name(),
            history = ?service.history_status,
            notifier = service.notifier.is_some(),
            watchlist = service.watchlist.is_some(),
            "signal service ready"
        );
        Ok(service)
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn require_symbol(raw: &str) -> Result<String, ServiceError> {
        normalize_symbol(raw)
            .ok_or_else(|| ServiceError::InvalidInput("symbol must not be empty".into()))
    }

    fn fetch_nonempty(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, ServiceError> {
        let series = self
            .provider
            .fetch(symbol, period)
            .map_err(|e| ServiceError::from_fetch(symbol, e))?;
        if series.is_empty() {
            return Err(ServiceError::DataUnavailable {
                symbol: symbol.to_string(),
            });
        }
        Ok(series)
    }

    /// Evaluate one symbol, notify on BUY/SELL, and record the outcome.
    #[instrument(skip(self, request), fields(symbol = %request.symbol))]
    pub fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ServiceError> {
        let symbol = Self::require_symbol(&request.symbol)?;
        let params = TurtleParams::new(
            request.entry_period.unwrap_or(self.config.strategy.entry_period),
            request.exit_period.unwrap_or(self.config.strategy.exit_period),
        )?;
        let period = request.period.unwrap_or(self.config.strategy.period);

        let series = self.fetch_nonempty(&symbol, period)?;
        if series.len() < params.entry_period() {
            return Err(ServiceError::InsufficientHistory {
                symbol,
                available: series.len(),
                required: params.entry_period(),
            });
        }

        let result = analyze(&symbol, series.bars(), &params, Utc::now()).ok_or_else(|| {
            ServiceError::DataUnavailable {
                symbol: symbol.clone(),
            }
        })?;
        info!(signal = %result.signal, price = result.current_price, "analysis complete");

        let notified = self.notify(&result, &params);
        self.track(&result);
        let recommendation = recommendation(
            result.signal,
            &params,
            result.low_of_exit_window,
            result.high_of_entry_window,
        );
        let alert_id = self.record(&result, &params, &recommendation, notified);

        Ok(AnalyzeResponse {
            symbol: result.symbol,
            signal: result.signal,
            current_price: round_cents(result.current_price),
            high_of_entry_window: round_cents(result.high_of_entry_window),
            low_of_exit_window: round_cents(result.low_of_exit_window),
            entry_period: params.entry_period(),
            exit_period: params.exit_period(),
            recommendation,
            timestamp: result.timestamp,
            alert_id,
            notified,
        })
    }

    fn notify(&self, result: &SignalResult, params: &TurtleParams) -> bool {
        if !result.signal.is_actionable() {
            return false;
        }
        let Some(notifier) = &self.notifier else {
            return false;
        };
        let event = SignalEvent {
            symbol: result.symbol.clone(),
            signal: result.signal,
            current_price: result.current_price,
            entry_high: result.high_of_entry_window,
            exit_low: result.low_of_exit_window,
            entry_period: params.entry_period(),
            exit_period: params.exit_period(),
            timestamp: result.timestamp,
        };
        match notifier.notify(&event) {
            Ok(()) => true,
            Err(e) => {
                warn!(symbol = %result.symbol, error = %e, "notification failed");
                false
            }
        }
    }

    fn track(&self, result: &SignalResult) {
        let Some(watchlist) = &self.watchlist else {
            return;
        };
        if let Err(e) = watchlist.record_price(
            &result.symbol,
            round_cents(result.current_price),
            result.timestamp,
        ) {
            warn!(symbol = %result.symbol, error = %e, "watchlist update failed");
        }
    }

    fn record(
        &self,
        result: &SignalResult,
        params: &TurtleParams,
        message: &str,
        notified: bool,
    ) -> Option<u64> {
        let history = self.history.as_ref()?;
        let alert = NewAlert {
            symbol: result.symbol.clone(),
            signal: result.signal,
            price: round_cents(result.current_price),
            entry_high: round_cents(result.high_of_entry_window),
            exit_low: round_cents(result.low_of_exit_window),
            entry_period: params.entry_period(),
            exit_period: params.exit_period(),
            message: message.to_string(),
            notified,
        };
        match history.save(alert) {
            Ok(record) => Some(record.id),
            Err(e) => {
                warn!(symbol = %result.symbol, error = %e, "history write failed");
                None
            }
        }
    }

    /// Current price and fixed 20-day high / 10-day low.
    #[instrument(skip(self, request), fields(symbol = %request.symbol))]
    pub fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ServiceError> {
        let symbol = Self::require_symbol(&request.symbol)?;
        let period = request.period.unwrap_or(self.config.strategy.period);
        let series = self.fetch_nonempty(&symbol, period)?;
        if series.len() < DEFAULT_MIN_BARS {
            return Err(ServiceError::InsufficientHistory {
                symbol,
                available: series.len(),
                required: DEFAULT_MIN_BARS,
            });
        }

        let snapshot = ChannelSnapshot::compute(series.bars(), &TurtleParams::default())
            .ok_or_else(|| ServiceError::DataUnavailable {
                symbol: symbol.clone(),
            })?;

        Ok(QuoteResponse {
            symbol,
            current_price: round_cents(snapshot.current_price),
            high_20d: round_cents(snapshot.entry_high),
            low_10d: round_cents(snapshot.exit_low),
            average_price: round_cents(snapshot.average_price),
            data_points: series.len(),
            period,
            timestamp: Utc::now(),
        })
    }

    /// Evaluate up to `batch.max_symbols` symbols with the default windows.
    ///
    /// Per-symbol failures are reported inline. Batch runs neither notify nor
    /// write history.
    #[instrument(skip(self, request))]
    pub fn batch(&self, request: &BatchRequest) -> Result<BatchResponse, ServiceError> {
        let symbols = request.symbols.normalized();
        let max = self.config.batch.max_symbols;
        if symbols.len() > max {
            return Err(ServiceError::BatchSizeExceeded {
                requested: symbols.len(),
                max,
            });
        }
        let period = request.period.unwrap_or(self.config.strategy.period);
        let provider = &self.provider;

        let batch = evaluate_batch(
            symbols.as_slice(),
            |s: &str| provider.fetch(s, period),
            self.config.batch.min_bars,
        )?;

        let succeeded = batch.succeeded();
        let failed = batch.failed();
        let results = batch
            .entries
            .into_iter()
            .map(|mut entry| {
                if let Some(result) = entry.result.as_mut() {
                    result.current_price = round_cents(result.current_price);
                    result.high_of_entry_window = round_cents(result.high_of_entry_window);
                    result.low_of_exit_window = round_cents(result.low_of_exit_window);
                    result.average_price = result.average_price.map(round_cents);
                }
                entry
            })
            .collect();

        Ok(BatchResponse {
            total: batch.total_requested,
            succeeded,
            failed,
            results,
            timestamp: batch.timestamp,
        })
    }

    /// Most recent analyses across all symbols, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<AlertRecord>, ServiceError> {
        if limit == 0 || limit > MAX_HISTORY_LIMIT {
            return Err(ServiceError::InvalidInput(format!(
                "limit must be between 1 and {MAX_HISTORY_LIMIT}"
            )));
        }
        self.query(&HistoryQuery::recent(limit))
    }

    /// Every analysis of one symbol, newest first.
    pub fn symbol_history(&self, symbol: &str) -> Result<Vec<AlertRecord>, ServiceError> {
        let symbol = Self::require_symbol(symbol)?;
        self.query(&HistoryQuery::for_symbol(&symbol))
    }

    fn query(&self, query: &HistoryQuery) -> Result<Vec<AlertRecord>, ServiceError> {
        match &self.history {
            Some(history) => history
                .query(query)
                .map_err(|e| ServiceError::Unexpected(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    pub fn statistics(&self) -> Result<SignalStatistics, ServiceError> {
        match &self.history {
            Some(history) => history
                .statistics()
                .map_err(|e| ServiceError::Unexpected(e.to_string())),
            None => Ok(SignalStatistics::default()),
        }
    }

    /// Tracked symbols sorted by symbol.
    pub fn tracked(&self, active_only: bool) -> Vec<TrackedSymbol> {
        self.watchlist
            .as_ref()
            .map(|w| w.list(active_only))
            .unwrap_or_default()
    }

    /// A tracked symbol and its most recent alerts.
    pub fn tracked_detail(&self, symbol: &str) -> Result<TrackedDetail, ServiceError> {
        let symbol = Self::require_symbol(symbol)?;
        let tracked = self
            .watchlist
            .as_ref()
            .and_then(|w| w.get(&symbol))
            .ok_or_else(|| ServiceError::NotFound(format!("symbol '{symbol}' is not tracked")))?;
        let recent_alerts =
            self.query(&HistoryQuery::for_symbol(&symbol).limit(DETAIL_RECENT_ALERTS))?;
        Ok(TrackedDetail {
            tracked,
            recent_alerts,
        })
    }

    /// Soft-delete a tracked symbol.
    pub fn untrack(&self, symbol: &str) -> Result<(), ServiceError> {
        let symbol = Self::require_symbol(symbol)?;
        let not_found = || ServiceError::NotFound(format!("symbol '{symbol}' is not tracked"));
        let watchlist = self.watchlist.as_ref().ok_or_else(not_found)?;
        match watchlist.deactivate(&symbol) {
            Ok(true) => {
                info!(%symbol, "symbol untracked");
                Ok(())
            }
            Ok(false) => Err(not_found()),
            Err(e) => Err(ServiceError::Unexpected(e.to_string())),
        }
    }

    pub fn health(&self) -> HealthReport {
        let (history, total_analyses) = match (&self.history, self.history_status) {
            (Some(store), _) => match store.statistics() {
                Ok(stats) => (HistoryStatus::Connected, stats.total_analyses),
                Err(e) => {
                    warn!(error = %e, "history unreadable during health check");
                    (HistoryStatus::Unavailable, 0)
                }
            },
            (None, status) => (status, 0),
        };
        HealthReport {
            status: "ok".into(),
            provider: self.provider.name().to_string(),
            provider_available: self.provider.is_available(),
            history,
            total_analyses,
            tracked_symbols: self
                .watchlist
                .as_ref()
                .map_or(0, |w| w.active_count()),
            timestamp: Utc::now(),
        }
    }
}
