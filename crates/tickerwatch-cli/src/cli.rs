//! CLI argument definitions for tickerwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watch` | Poll a watchlist and print a table every refresh interval |
//! | `detail` | Full quote and daily chart for one ticker |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `5000` | Per-call upstream timeout in ms |
//! | `--cache-ttl-secs` | `10` | Quote/history cache lifetime |
//! | `--concurrency` | `8` | Tickers fetched at once |
//!
//! # Examples
//!
//! ```bash
//! # Default watchlist, refresh every 15 seconds
//! tickerwatch watch
//!
//! # One snapshot as JSON
//! tickerwatch watch --tickers 005930.KS,035420.KQ --once --format json --pretty
//!
//! # Detail page over the last 30 days
//! tickerwatch detail 000660.KS --days 30
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use tickerwatch_core::{RefreshInterval, DEFAULT_WATCHLIST};

/// Tickerwatch - polling quote watchlist
///
/// Shows last price, change and percentage change for a list of tickers,
/// refreshed on a fixed interval, plus a short price history per ticker.
#[derive(Debug, Parser)]
#[command(name = "tickerwatch", author, version, about = "Polling quote watchlist")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Upper bound for each upstream call in milliseconds.
    #[arg(long, global = true, default_value_t = 5_000)]
    pub timeout_ms: u64,

    /// How long fetched quotes and histories are reused.
    #[arg(long, global = true, default_value_t = 10)]
    pub cache_ttl_secs: u64,

    /// Maximum tickers fetched at the same time.
    #[arg(long, global = true, default_value_t = 8)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text table for terminal display.
    Table,
    /// One JSON object per snapshot.
    Json,
}

/// Chart lines to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SeriesArg {
    Close,
    CloseOpen,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll a watchlist until interrupted.
    ///
    /// # Examples
    ///
    ///   tickerwatch watch
    ///   tickerwatch watch --tickers 005930.KS,035420.KQ --refresh-secs 30
    ///   tickerwatch watch --no-chart --once
    Watch(WatchArgs),

    /// Full quote and daily close/open chart for one ticker.
    ///
    /// # Examples
    ///
    ///   tickerwatch detail
    ///   tickerwatch detail 035420.KQ --days 30
    Detail(DetailArgs),
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Comma-separated tickers, e.g. `005930.KS,035420.KQ`.
    #[arg(long, default_value = DEFAULT_WATCHLIST)]
    pub tickers: String,

    /// Seconds between refresh cycles (5-3600).
    #[arg(long, default_value_t = RefreshInterval::DEFAULT_SECS)]
    pub refresh_secs: u64,

    /// Chart window in minutes (1-1440).
    #[arg(long, default_value_t = 60)]
    pub history_minutes: u32,

    /// Skip history fetches and chart output.
    #[arg(long, default_value_t = false)]
    pub no_chart: bool,

    #[arg(long, value_enum, default_value_t = SeriesArg::Close)]
    pub series: SeriesArg,

    /// Print one snapshot and exit.
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

#[derive(Debug, Args)]
pub struct DetailArgs {
    /// Ticker to inspect.
    #[arg(default_value = "005930.KS")]
    pub ticker: String,

    /// Chart window in days (1-30).
    #[arg(long, default_value_t = 7)]
    pub days: u32,
}
