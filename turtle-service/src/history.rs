//! Alert history: one record per completed single-symbol analysis.
//!
//! [`AlertRepository`] is the persistence boundary. Two stores implement it:
//! an append-only JSONL file (one JSON object per line, resilient to partial
//! writes and easy to stream) and an in-memory store for tests and
//! history-disabled runs.
//!
//! Ids are assigned by the store and strictly increase. The JSONL store
//! recovers its next id by scanning the file on open, so ids keep increasing
//! across restarts.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use turtle_core::domain::normalize_symbol;
use turtle_core::Signal;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("history serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An analysis outcome about to be recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub symbol: String,
    pub signal: Signal,
    pub price: f64,
    pub entry_high: f64,
    pub exit_low: f64,
    pub entry_period: usize,
    pub exit_period: usize,
    pub message: String,
    pub notified: bool,
}

/// A stored analysis outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: u64,
    pub symbol: String,
    pub signal: Signal,
    pub price: f64,
    pub entry_high: f64,
    pub exit_low: f64,
    pub entry_period: usize,
    pub exit_period: usize,
    pub message: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    fn from_new(id: u64, alert: NewAlert, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            symbol: alert.symbol,
            signal: alert.signal,
            price: alert.price,
            entry_high: alert.entry_high,
            exit_low: alert.exit_low,
            entry_period: alert.entry_period,
            exit_period: alert.exit_period,
            message: alert.message,
            notified: alert.notified,
            created_at,
        }
    }
}

/// Filter for [`AlertRepository::query`]. Results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Most recent `limit` records across all symbols.
    pub fn recent(limit: usize) -> Self {
        Self {
            symbol: None,
            limit: Some(limit),
        }
    }

    /// All records for one symbol. The symbol is normalized.
    pub fn for_symbol(symbol: &str) -> Self {
        Self {
            symbol: Some(normalize_symbol(symbol).unwrap_or_default()),
            limit: None,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn select(&self, mut records: Vec<AlertRecord>) -> Vec<AlertRecord> {
        if let Some(symbol) = &self.symbol {
            records.retain(|r| &r.symbol == symbol);
        }
        records.sort_by(|a, b| b.id.cmp(&a.id));
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }
}

/// Counts of stored records by signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalStatistics {
    pub total_analyses: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub hold_count: usize,
}

impl SignalStatistics {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AlertRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut stats, record| {
                stats.total_analyses += 1;
                match record.signal {
                    Signal::Buy => stats.buy_count += 1,
                    Signal::Sell => stats.sell_count += 1,
                    Signal::Hold => stats.hold_count += 1,
                }
                stats
            })
    }
}

/// Persistence boundary for analysis outcomes.
pub trait AlertRepository: Send + Sync {
    /// Store an outcome and return it with its assigned id and timestamp.
    fn save(&self, alert: NewAlert) -> Result<AlertRecord, HistoryError>;

    fn query(&self, query: &HistoryQuery) -> Result<Vec<AlertRecord>, HistoryError>;

    fn statistics(&self) -> Result<SignalStatistics, HistoryError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Writer state guarded by the store's mutex.
#[derive(Debug)]
struct WriterState {
    next_id: u64,
    /// The file does not end in a newline (an interrupted write).
    torn: bool,
}

/// Append-only JSONL alert history.
///
/// Writers are serialized by a mutex that also guards the next id. Malformed
/// lines, including invalid UTF-8 and a torn final line, are skipped on read.
/// A torn line is terminated before the next append, and any id it still
/// carries is never handed out again.
#[derive(Debug)]
pub struct JsonlAlertStore {
    path: PathBuf,
    state: Mutex<WriterState>,
}

impl JsonlAlertStore {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let scan = scan_file(&path)?;
        debug!(
            path = %path.display(),
            last_id = scan.max_id,
            records = scan.records.len(),
            torn = scan.torn,
            "opened alert history"
        );
        Ok(Self {
            path,
            state: Mutex::new(WriterState {
                next_id: scan.max_id + 1,
                torn: scan.torn,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file size in bytes (zero if not yet created).
    pub fn file_size_bytes(&self) -> io::Result<u64> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e),
        }
    }

    pub fn read_all(&self) -> Result<Vec<AlertRecord>, HistoryError> {
        Ok(scan_file(&self.path)?.records)
    }

    fn append(&self, state: &mut WriterState, json: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = Vec::with_capacity(json.len() + 2);
        if state.torn {
            buf.push(b'\n');
        }
        buf.extend_from_slice(json.as_bytes());
        buf.push(b'\n');

        // Assume the worst until the whole line is on disk.
        state.torn = true;
        file.write_all(&buf)?;
        file.flush()?;
        state.torn = false;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Scan {
    records: Vec<AlertRecord>,
    /// Highest id seen, counting ids recovered from malformed lines.
    max_id: u64,
    torn: bool,
}

fn scan_file(path: &Path) -> Result<Scan, HistoryError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Scan::default()),
        Err(e) => return Err(e.into()),
    };

    let mut scan = Scan {
        torn: bytes.last().is_some_and(|b| *b != b'\n'),
        ..Scan::default()
    };
    for (lineno, line) in bytes.split(|b| *b == b'\n').enumerate() {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match serde_json::from_slice::<AlertRecord>(line) {
            Ok(record) => {
                scan.max_id = scan.max_id.max(record.id);
                scan.records.push(record);
            }
            Err(e) => {
                if let Some(id) = leading_id(line) {
                    scan.max_id = scan.max_id.max(id);
                }
                warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping malformed history line");
            }
        }
    }
    Ok(scan)
}

/// Id of a record line cut short after its `id` field.
///
/// Records serialize `id` first, so a torn line still starts with `{"id":N`.
fn leading_id(line: &[u8]) -> Option<u64> {
    let start = line.iter().position(|b| !b.is_ascii_whitespace())?;
    let rest = line[start..].strip_prefix(b"{\"id\":".as_slice())?;
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    std::str::from_utf8(&rest[..digits]).ok()?.parse().ok()
}

impl AlertRepository for JsonlAlertStore {
    fn save(&self, alert: NewAlert) -> Result<AlertRecord, HistoryError> {
        let mut state = lock(&self.state);
        let record = AlertRecord::from_new(state.next_id, alert, Utc::now());
        let json = serde_json::to_string(&record)?;

        let appended = self.append(&mut state, &json);
        // A failed append may still have left bytes carrying this id.
        state.next_id += 1;
        appended?;

        debug!(id = record.id, symbol = %record.symbol, signal = %record.signal, "alert saved");
        Ok(record)
    }

    fn query(&self, query: &HistoryQuery) -> Result<Vec<AlertRecord>, HistoryError> {
        Ok(query.select(self.read_all()?))
    }

    fn statistics(&self) -> Result<SignalStatistics, HistoryError> {
        Ok(SignalStatistics::from_records(&self.read_all()?))
    }
}

/// Alert history held in memory only.
#[derive(Debug, Default)]
pub struct MemoryAlertStore {
    records: Mutex<Vec<AlertRecord>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertRepository for MemoryAlertStore {
    fn save(&self, alert: NewAlert) -> Result<AlertRecord, HistoryError> {
        let mut records = lock(&self.records);
        let id = records.last().map_or(1, |r| r.id + 1);
        let record = AlertRecord::from_new(id, alert, Utc::now());
        records.push(record.clone());
        Ok(record)
    }

    fn query(&self, query: &HistoryQuery) -> Result<Vec<AlertRecord>, HistoryError> {
        Ok(query.select(lock(&self.records).clone()))
    }

    fn statistics(&self) -> Result<SignalStatistics, HistoryError> {
        Ok(SignalStatistics::from_records(lock(&self.records).iter()))
    }
}
