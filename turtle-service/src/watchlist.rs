//! Tracked symbols: last seen price per analyzed symbol.
//!
//! Every successful single-symbol analysis upserts its symbol here. Removal
//! is a soft delete: the entry stays on disk with `active = false` and comes
//! back on the next analysis. The optional backing file is pretty-printed
//! JSON rewritten on each change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("watchlist i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watchlist serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedSymbol {
    pub symbol: String,
    pub name: Option<String>,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Default)]
pub struct Watchlist {
    entries: Mutex<BTreeMap<String, TrackedSymbol>>,
    path: Option<PathBuf>,
}

impl Watchlist {
    /// A watchlist that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file starts empty; a corrupt one is logged
    /// and replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WatchlistError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<TrackedSymbol>>(&content) {
                Ok(list) => list.into_iter().map(|t| (t.symbol.clone(), t)).collect(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt watchlist file, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            entries: Mutex::new(entries),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, TrackedSymbol>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save(&self, entries: &BTreeMap<String, TrackedSymbol>) -> Result<(), WatchlistError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let list: Vec<&TrackedSymbol> = entries.values().collect();
        std::fs::write(path, serde_json::to_string_pretty(&list)?)?;
        Ok(())
    }

    /// Upsert the latest price and reactivate the symbol.
    ///
    /// Memory only changes once the file write has succeeded.
    pub fn record_price(
        &self,
        symbol: &str,
        price: f64,
        at: DateTime<Utc>,
    ) -> Result<TrackedSymbol, WatchlistError> {
        let mut entries = self.lock();
        let entry = match entries.get(symbol) {
            Some(existing) => TrackedSymbol {
                current_price: price,
                last_updated: at,
                active: true,
                ..existing.clone()
            },
            None => TrackedSymbol {
                symbol: symbol.to_string(),
                name: None,
                current_price: price,
                last_updated: at,
                active: true,
            },
        };
        self.commit(&mut entries, entry.clone())?;
        Ok(entry)
    }

    fn commit(
        &self,
        entries: &mut BTreeMap<String, TrackedSymbol>,
        entry: TrackedSymbol,
    ) -> Result<(), WatchlistError> {
        let mut next = entries.clone();
        next.insert(entry.symbol.clone(), entry);
        self.save(&next)?;
        *entries = next;
        Ok(())
    }

    /// Entries sorted by symbol.
    pub fn list(&self, active_only: bool) -> Vec<TrackedSymbol> {
        self.lock()
            .values()
            .filter(|t| !active_only || t.active)
            .cloned()
            .collect()
    }

    pub fn get(&self, symbol: &str) -> Option<TrackedSymbol> {
        self.lock().get(symbol).cloned()
    }

    /// Soft delete. Returns `Ok(false)` if the symbol was never tracked.
    pub fn deactivate(&self, symbol: &str) -> Result<bool, WatchlistError> {
        let mut entries = self.lock();
        let Some(existing) = entries.get(symbol) else {
            return Ok(false);
        };
        let entry = TrackedSymbol {
            active: false,
            ..existing.clone()
        };
        self.commit(&mut entries, entry)?;
        Ok(true)
    }

    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|t| t.active).count()
    }
}
