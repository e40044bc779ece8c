//! Trade alert notifications.
//!
//! Delivery is behind the [`Notifier`] trait. The service only calls it for
//! BUY and SELL; HOLD is never announced. Two implementations ship here:
//! [`LogNotifier`] writes the alert to the log, and [`OutboxNotifier`]
//! appends the formatted message as a JSON line for an external mailer to
//! pick up.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use turtle_core::Signal;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("notification serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// What happened, for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub symbol: String,
    pub signal: Signal,
    pub current_price: f64,
    pub entry_high: f64,
    pub exit_low: f64,
    pub entry_period: usize,
    pub exit_period: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: String,
    pub body: String,
}

fn action(signal: Signal) -> &'static str {
    match signal {
        Signal::Buy => "buy",
        Signal::Sell => "sell",
        Signal::Hold => "hold",
    }
}

fn describe(event: &SignalEvent) -> String {
    match event.signal {
        Signal::Buy => format!("price broke above the {}-day high", event.entry_period),
        Signal::Sell => format!("price fell below the {}-day low", event.exit_period),
        Signal::Hold => "price is inside the channel".to_string(),
    }
}

/// Render subject and plain-text body for an alert.
pub fn format_message(event: &SignalEvent) -> (String, String) {
    let subject = format!("Turtle alert: {} - {} signal", event.symbol, event.signal);
    let rule = "=".repeat(50);
    let body = format!(
        "Turtle trading alert\n\
         {rule}\n\
         \n\
         Symbol:        {symbol}\n\
         Current price: ${price:.2}\n\
         \n\
         {entry}-day high:   ${high:.2}\n\
         {exit}-day low:    ${low:.2}\n\
         \n\
         Signal:        {signal} ({desc})\n\
         Analyzed at:   {at}\n\
         \n\
         Suggested action: {action}\n\
         \n\
         Risk note: this alert is based on technical analysis only and is not\n\
         investment advice. Trade at your own risk.\n\
         {rule}\n",
        symbol = event.symbol,
        price = event.current_price,
        entry = event.entry_period,
        high = event.entry_high,
        exit = event.exit_period,
        low = event.exit_low,
        signal = event.signal,
        desc = describe(event),
        at = event.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        action = action(event.signal),
    );
    (subject, body)
}

/// Delivery capability for trade alerts.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &SignalEvent) -> Result<(), NotifyError>;
}

/// Writes alerts to the log only.
#[derive(Debug, Default)]
pub struct LogNotifier {
    to: Option<String>,
}

impl LogNotifier {
    pub fn new(to: Option<String>) -> Self {
        Self { to }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, event: &SignalEvent) -> Result<(), NotifyError> {
        let (subject, _) = format_message(event);
        info!(
            symbol = %event.symbol,
            signal = %event.signal,
            price = event.current_price,
            to = self.to.as_deref().unwrap_or("-"),
            %subject,
            "trade alert"
        );
        Ok(())
    }
}

/// Appends one [`EmailMessage`] per alert to a JSONL outbox file.
#[derive(Debug)]
pub struct OutboxNotifier {
    path: PathBuf,
    from: Option<String>,
    to: Option<String>,
    write_lock: Mutex<()>,
}

impl OutboxNotifier {
    pub fn new(path: impl Into<PathBuf>, from: Option<String>, to: Option<String>) -> Self {
        Self {
            path: path.into(),
            from,
            to,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Notifier for OutboxNotifier {
    fn notify(&self, event: &SignalEvent) -> Result<(), NotifyError> {
        let (subject, body) = format_message(event);
        let message = EmailMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            subject,
            body,
        };
        let json = serde_json::to_string(&message)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")?;
        file.flush()?;
        info!(symbol = %event.symbol, signal = %event.signal, outbox = %self.path.display(), "alert queued");
        Ok(())
    }
}
