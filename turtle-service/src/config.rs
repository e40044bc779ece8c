//! Service configuration: TOML file plus environment overrides.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working configuration: Yahoo provider, 2mo lookback, 20/10 windows, history
//! and watchlist under `data/`, notifications logged rather than delivered.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use turtle_core::data::LookbackPeriod;
use turtle_core::{ParamError, TurtleParams, DEFAULT_MIN_BARS, MAX_BATCH_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy parameters: {0}")]
    Params(#[from] ParamError),

    #[error("invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("batch.max_symbols must be between 1 and {max}, got {0}", max = MAX_BATCH_SIZE)]
    BatchLimit(usize),

    #[error("provider.timeout_secs must be positive")]
    ZeroTimeout,

    #[error("provider.max_retries must be at most {max}, got {0}", max = MAX_PROVIDER_RETRIES)]
    RetryLimit(u32),
}

/// Upper bound on `provider.max_retries`.
pub const MAX_PROVIDER_RETRIES: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub strategy: StrategySection,
    pub batch: BatchSection,
    pub provider: ProviderSection,
    pub history: HistorySection,
    pub notification: NotificationSection,
    pub watchlist: WatchlistSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub period: LookbackPeriod,
    pub entry_period: usize,
    pub exit_period: usize,
}

impl Default for StrategySection {
    fn default() -> Self {
        let params = TurtleParams::default();
        Self {
            period: LookbackPeriod::default(),
            entry_period: params.entry_period(),
            exit_period: params.exit_period(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub max_symbols: usize,
    pub min_bars: usize,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            max_symbols: MAX_BATCH_SIZE,
            min_bars: DEFAULT_MIN_BARS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub kind: ProviderKind,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Directory of `<SYMBOL>.csv` files, used when `kind = "csv"`.
    pub csv_dir: PathBuf,
}

impl Default for ProviderSection {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            timeout_secs: 30,
            max_retries: 3,
            csv_dir: PathBuf::from("data/prices"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySection {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/alerts.jsonl"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSection {
    pub enabled: bool,
    pub from: Option<String>,
    pub to: Option<String>,
    /// When set, formatted messages are appended here for an external mailer;
    /// otherwise they are only logged.
    pub outbox_path: Option<PathBuf>,
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            from: None,
            to: None,
            outbox_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistSection {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for WatchlistSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("data/watchlist.json"),
        }
    }
}

impl ServiceConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document. No environment lookup.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style key lookups.
    ///
    /// `TURTLE_*` keys win over the bare `FROM_EMAIL` / `TO_EMAIL` names.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k).filter(|v| !v.is_empty()));

        if let Some(path) = first(&["TURTLE_HISTORY_PATH"]) {
            self.history.path = PathBuf::from(path);
        }
        if let Some(path) = first(&["TURTLE_OUTBOX_PATH"]) {
            self.notification.outbox_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = first(&["TURTLE_CSV_DIR"]) {
            self.provider.csv_dir = PathBuf::from(dir);
            self.provider.kind = ProviderKind::Csv;
        }
        if let Some(from) = first(&["TURTLE_NOTIFY_FROM", "FROM_EMAIL"]) {
            self.notification.from = Some(from);
        }
        if let Some(to) = first(&["TURTLE_NOTIFY_TO", "TO_EMAIL"]) {
            self.notification.to = Some(to);
        }
        if let Some(raw) = first(&["TURTLE_PROVIDER_TIMEOUT_SECS"]) {
            self.provider.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: "TURTLE_PROVIDER_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.turtle_params()?;
        if self.batch.max_symbols == 0 || self.batch.max_symbols > MAX_BATCH_SIZE {
            return Err(ConfigError::BatchLimit(self.batch.max_symbols));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.provider.max_retries > MAX_PROVIDER_RETRIES {
            return Err(ConfigError::RetryLimit(self.provider.max_retries));
        }
        Ok(())
    }

    pub fn turtle_params(&self) -> Result<TurtleParams, ParamError> {
        TurtleParams::new(self.strategy.entry_period, self.strategy.exit_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn empty_document_is_default() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.strategy.period, LookbackPeriod::TwoMonths);
        assert_eq!(config.strategy.entry_period, 20);
        assert_eq!(config.strategy.exit_period, 10);
        assert_eq!(config.batch.max_symbols, 10);
        assert_eq!(config.batch.min_bars, 20);
        assert_eq!(config.provider.kind, ProviderKind::Yahoo);
    }

    #[test]
    fn parses_sections() {
        let config = ServiceConfig::from_toml_str(
            r#"
            [strategy]
            period = "6mo"
            entry_period = 55
            exit_period = 20

            [provider]
            kind = "csv"
            csv_dir = "fixtures"

            [notification]
            to = "desk@example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy.period, LookbackPeriod::SixMonths);
        assert_eq!(config.turtle_params().unwrap().entry_period(), 55);
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.provider.csv_dir, PathBuf::from("fixtures"));
        assert_eq!(config.notification.to.as_deref(), Some("desk@example.com"));
        assert!(config.history.enabled);
    }

    #[test]
    fn rejects_zero_period_and_oversized_batch() {
        let err = ServiceConfig::from_toml_str("[strategy]\nexit_period = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Params(ParamError::ZeroExitPeriod)));

        let err = ServiceConfig::from_toml_str("[batch]\nmax_symbols = 25\n").unwrap_err();
        assert!(matches!(err, ConfigError::BatchLimit(25)));
    }

    #[test]
    fn rejects_zero_timeout_and_excess_retries() {
        let err = ServiceConfig::from_toml_str("[provider]\ntimeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout));

        let err = ServiceConfig::from_toml_str("[provider]\nmax_retries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::RetryLimit(40)));

        let config = ServiceConfig::from_toml_str("[provider]\nmax_retries = 10\n").unwrap();
        assert_eq!(config.provider.max_retries, MAX_PROVIDER_RETRIES);
    }

    #[test]
    fn zero_timeout_from_env_fails_validation() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[("TURTLE_PROVIDER_TIMEOUT_SECS", "0")]))
            .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));
    }

    #[test]
    fn rejects_unknown_period() {
        assert!(ServiceConfig::from_toml_str("[strategy]\nperiod = \"3w\"\n").is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = ServiceConfig::default();
        config
            .apply_env(env(&[
                ("TURTLE_HISTORY_PATH", "/tmp/h.jsonl"),
                ("TURTLE_CSV_DIR", "/tmp/csv"),
                ("FROM_EMAIL", "bot@example.com"),
                ("TO_EMAIL", "fallback@example.com"),
                ("TURTLE_NOTIFY_TO", "primary@example.com"),
                ("TURTLE_PROVIDER_TIMEOUT_SECS", "5"),
            ]))
            .unwrap();
        assert_eq!(config.history.path, PathBuf::from("/tmp/h.jsonl"));
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.notification.from.as_deref(), Some("bot@example.com"));
        assert_eq!(config.notification.to.as_deref(), Some("primary@example.com"));
        assert_eq!(config.provider.timeout_secs, 5);
    }

    #[test]
    fn bad_timeout_env_is_error() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env(env(&[("TURTLE_PROVIDER_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = ServiceConfig::from_file(Path::new("/nonexistent/turtle.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
