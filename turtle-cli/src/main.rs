//! Turtle CLI: breakout signals for one or many symbols.
//!
//! Commands:
//! - `analyze`: evaluate one symbol, notify on BUY/SELL, record the outcome
//! - `quote`: current price with 20-day high and 10-day low
//! - `batch`: evaluate up to 10 symbols, failures reported per symbol
//! - `history` / `stats`: stored analyses and signal counts
//! - `stocks list|show|remove`: tracked symbols
//! - `health`: provider, history and watchlist status
//!
//! Results go to stdout as JSON; logs go to stderr (`RUST_LOG` overrides the
//! default `info` level).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use turtle_core::data::LookbackPeriod;
use turtle_service::{
    AnalyzeRequest, BatchRequest, ProviderKind, QuoteRequest, ServiceConfig, SignalService,
    SymbolList,
};

#[derive(Parser)]
#[command(name = "turtle", about = "Turtle breakout signals over daily bars")]
struct Cli {
    /// Path to a TOML config file. Defaults plus environment overrides when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read prices from `<DIR>/<SYMBOL>.csv` instead of Yahoo Finance.
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    /// Do not read or write alert history.
    #[arg(long, global = true, default_value_t = false)]
    no_history: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the breakout rule for one symbol.
    Analyze {
        symbol: String,

        /// Lookback period: 1d 5d 1mo 2mo 3mo 6mo 1y 2y 5y 10y ytd max.
        #[arg(long)]
        period: Option<LookbackPeriod>,

        /// Entry window in bars. Defaults to the configured value (20).
        #[arg(long)]
        entry_period: Option<usize>,

        /// Exit window in bars. Defaults to the configured value (10).
        #[arg(long)]
        exit_period: Option<usize>,
    },
    /// Current price with the 20-day high and 10-day low.
    Quote {
        symbol: String,

        #[arg(long)]
        period: Option<LookbackPeriod>,
    },
    /// Evaluate several symbols (space or comma separated, at most 10).
    Batch {
        #[arg(required = true)]
        symbols: Vec<String>,

        #[arg(long)]
        period: Option<LookbackPeriod>,
    },
    /// Recent analyses, newest first.
    History {
        /// Only this symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Number of records (1-100).
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Signal counts across the stored history.
    Stats,
    /// Tracked symbols.
    Stocks {
        #[command(subcommand)]
        action: StocksAction,
    },
    /// Provider, history and watchlist status.
    Health,
}

#[derive(Subcommand)]
enum StocksAction {
    /// List tracked symbols.
    List {
        /// Include removed symbols.
        #[arg(long, default_value_t = false)]
        all: bool,
    },
    /// One tracked symbol with its five most recent alerts.
    Show { symbol: String },
    /// Stop tracking a symbol (soft delete).
    Remove { symbol: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let service = build_service(&cli)?;

    match cli.command {
        Commands::Analyze {
            symbol,
            period,
            entry_period,
            exit_period,
        } => print_json(&service.analyze(&AnalyzeRequest {
            symbol,
            period,
            entry_period,
            exit_period,
        })?),
        Commands::Quote { symbol, period } => {
            print_json(&service.quote(&QuoteRequest { symbol, period })?)
        }
        Commands::Batch { symbols, period } => print_json(&service.batch(&BatchRequest {
            symbols: SymbolList::Csv(symbols.join(",")),
            period,
        })?),
        Commands::History { symbol, limit } => match symbol {
            Some(symbol) => {
                let mut records = service.symbol_history(&symbol)?;
                records.truncate(limit);
                print_json(&records)
            }
            None => print_json(&service.history(limit)?),
        },
        Commands::Stats => print_json(&service.statistics()?),
        Commands::Stocks { action } => match action {
            StocksAction::List { all } => print_json(&service.tracked(!all)),
            StocksAction::Show { symbol } => print_json(&service.tracked_detail(&symbol)?),
            StocksAction::Remove { symbol } => {
                service.untrack(&symbol)?;
                let symbol = symbol.trim().to_uppercase();
                print_json(&serde_json::json!({ "symbol": symbol, "active": false }))
            }
        },
        Commands::Health => print_json(&service.health()),
    }
}

fn build_service(cli: &Cli) -> Result<SignalService> {
    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ServiceConfig::from_env().context("reading environment overrides")?,
    };

    if let Some(dir) = &cli.csv_dir {
        config.provider.kind = ProviderKind::Csv;
        config.provider.csv_dir = dir.clone();
    }
    if cli.no_history {
        config.history.enabled = false;
    }
    tracing::debug!(
        provider = ?config.provider.kind,
        period = %config.strategy.period,
        history = config.history.enabled,
        "configuration loaded"
    );

    Ok(SignalService::from_config(config)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
