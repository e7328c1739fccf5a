//! # Tickerwatch Core
//!
//! Quote aggregation and derived-metrics pipeline for a polling watchlist.
//!
//! ## Overview
//!
//! One refresh cycle turns raw watchlist text into a table of quotes:
//!
//! - **Watchlist parsing** into unique, upper-cased tickers
//! - **Layered quote lookup**: fast quote first, intraday bars as fallback
//! - **Windowed history** at 1-minute or daily resolution
//! - **TTL cache** with single-flight refresh per (ticker, request shape)
//! - **Change metrics** and `N/A`-safe formatting
//! - **Top mover** selection and chart series extraction
//!
//! Upstream failures never surface as errors: a ticker with no data shows up
//! as an all-absent [`Quote`] and an empty [`HistorySeries`].
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance provider |
//! | [`aggregator`] | Watchlist fan-out and top mover |
//! | [`cache`] | TTL cache and injectable clock |
//! | [`chart`] | Chart series extraction |
//! | [`config`] | Dashboard configuration and bounds |
//! | [`dashboard`] | Refresh-cycle entry point |
//! | [`domain`] | Domain models (Quote, HistorySeries, TickerSymbol) |
//! | [`error`] | Validation errors |
//! | [`history_fetcher`] | Windowed history lookup |
//! | [`http_client`] | HTTP client abstraction |
//! | [`metrics`] | Change metrics and formatting |
//! | [`provider`] | Market data provider trait |
//! | [`quote_fetcher`] | Quote fallback chain |
//! | [`watchlist`] | Watchlist text parsing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickerwatch_core::metrics::format_price;
//! use tickerwatch_core::{DashboardConfig, WatchDashboard, YahooProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dashboard = WatchDashboard::new(
//!         Arc::new(YahooProvider::default()),
//!         DashboardConfig::default(),
//!     )?;
//!
//!     if let Some(snapshot) = dashboard.refresh("005930.KS,035420.KQ").await.snapshot() {
//!         for row in &snapshot.table.rows {
//!             println!("{} {}", row.ticker, format_price(row.quote.last_price));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Scheduler / CLI │
//! └────────┬────────┘
//!          │ refresh(raw)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ WatchDashboard  │────▶│ WatchlistAggr.   │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ QuoteCache (TTL) │
//!                         └────────┬─────────┘
//!                                  │ miss
//!                    ┌─────────────┴─────────────┐
//!                    ▼                           ▼
//!          ┌──────────────────┐        ┌──────────────────┐
//!          │ QuoteFetcher     │        │ HistoryFetcher   │
//!          └────────┬─────────┘        └────────┬─────────┘
//!                   └─────────────┬─────────────┘
//!                                 ▼
//!                       ┌──────────────────┐
//!                       │MarketDataProvider│
//!                       └──────────────────┘
//! ```

pub mod adapters;
pub mod aggregator;
pub mod cache;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod history_fetcher;
pub mod http_client;
pub mod metrics;
pub mod provider;
pub mod quote_fetcher;
pub mod watchlist;

// Adapter implementations
pub use adapters::{YahooAuthManager, YahooProvider};

// Pipeline
pub use aggregator::{select_top_mover, WatchTable, WatchlistAggregator};
pub use cache::{CacheKey, Clock, ManualClock, QuoteCache, RequestShape, SystemClock, TtlCache};
pub use chart::{ChartData, ChartPoint, ChartSeries, SeriesKind, SeriesSelector, TickerChart};
pub use dashboard::{CycleOutcome, TickerDetail, WatchDashboard, WatchSnapshot};
pub use history_fetcher::HistoryFetcher;
pub use metrics::{ChangeMetrics, NOT_AVAILABLE};
pub use quote_fetcher::{FastQuoteStrategy, IntradayFallbackStrategy, QuoteFetcher, QuoteStrategy};
pub use watchlist::{Watchlist, DEFAULT_WATCHLIST};

// Configuration
pub use config::{DashboardConfig, RefreshInterval};

// Domain models
pub use domain::{
    FetchedQuote, HistoryPoint, HistorySeries, HistoryWindow, Quote, QuoteOrigin, Resolution,
    TickerSymbol, UtcDateTime, WatchRow,
};

// Error types
pub use error::ValidationError;

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

// Provider contract
pub use provider::{HistoryRequest, MarketDataProvider, SourceError, SourceErrorKind, SourceFuture};
