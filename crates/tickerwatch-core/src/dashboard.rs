//! Refresh-cycle entry point.
//!
//! [`WatchDashboard::refresh`] produces one snapshot of the watchlist. Every
//! call bumps a cycle counter; a cycle that sees the counter move on before it
//! finishes stops waiting, drops its in-flight fetches and reports
//! [`CycleOutcome::Superseded`]. Completed snapshots carry their cycle id.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::aggregator::{build_row, WatchTable, WatchlistAggregator};
use crate::cache::{Clock, QuoteCache, SystemClock};
use crate::chart::{self, SeriesSelector, TickerChart};
use crate::config::DashboardConfig;
use crate::history_fetcher::HistoryFetcher;
use crate::provider::MarketDataProvider;
use crate::quote_fetcher::QuoteFetcher;
use crate::watchlist::Watchlist;
use crate::{HistoryWindow, TickerSymbol, UtcDateTime, ValidationError, WatchRow};

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchSnapshot {
    pub cycle: u64,
    pub generated_at: UtcDateTime,
    pub watchlist: Watchlist,
    pub table: WatchTable,
    /// Empty when charts are turned off.
    pub charts: Vec<TickerChart>,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum CycleOutcome {
    Completed(WatchSnapshot),
    /// A newer cycle started first; nothing from this one is reported.
    Superseded { cycle: u64 },
}

impl CycleOutcome {
    pub fn snapshot(&self) -> Option<&WatchSnapshot> {
        match self {
            Self::Completed(snapshot) => Some(snapshot),
            Self::Superseded { .. } => None,
        }
    }

    pub fn into_snapshot(self) -> Option<WatchSnapshot> {
        match self {
            Self::Completed(snapshot) => Some(snapshot),
            Self::Superseded { .. } => None,
        }
    }

    pub const fn cycle(&self) -> u64 {
        match self {
            Self::Completed(snapshot) => snapshot.cycle,
            Self::Superseded { cycle } => *cycle,
        }
    }
}

/// Single-ticker view: full quote and a daily close/open chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerDetail {
    pub row: WatchRow,
    pub available: bool,
    pub chart: TickerChart,
}

pub struct WatchDashboard {
    config: DashboardConfig,
    cache: Arc<QuoteCache>,
    aggregator: WatchlistAggregator,
    generation: watch::Sender<u64>,
}

impl WatchDashboard {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        config: DashboardConfig,
    ) -> Result<Self, ValidationError> {
        Self::with_clock(provider, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn MarketDataProvider>,
        config: DashboardConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;

        let quote_fetcher = QuoteFetcher::new(Arc::clone(&provider), config.fetch_timeout);
        let history_fetcher = HistoryFetcher::new(provider, config.fetch_timeout);
        let cache = Arc::new(QuoteCache::with_clock(
            quote_fetcher,
            history_fetcher,
            config.cache_ttl,
            clock,
        ));
        let aggregator = WatchlistAggregator::new(Arc::clone(&cache), config.concurrency);
        let (generation, _) = watch::channel(0);

        Ok(Self {
            config,
            cache,
            aggregator,
            generation,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Id of the most recently started cycle; zero before the first refresh.
    pub fn current_cycle(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Snapshot of the watchlist described by `raw`.
    ///
    /// Safe to call again while a previous call is still running; the older
    /// call then returns [`CycleOutcome::Superseded`].
    pub async fn refresh(&self, raw: &str) -> CycleOutcome {
        let mut cycle = 0;
        self.generation.send_modify(|generation| {
            *generation += 1;
            cycle = *generation;
        });
        let mut newer = self.generation.subscribe();

        tokio::select! {
            biased;
            () = wait_superseded(&mut newer, cycle) => {
                info!(cycle, "refresh cycle superseded");
                CycleOutcome::Superseded { cycle }
            }
            snapshot = self.snapshot(raw, cycle) => CycleOutcome::Completed(snapshot),
        }
    }

    /// Detail view over `days` of daily bars. The quote goes through the same
    /// cached fallback chain as the watchlist.
    pub async fn detail(&self, symbol: &TickerSymbol, days: HistoryWindow) -> TickerDetail {
        let (fetched, history) =
            tokio::join!(self.cache.quote(symbol), self.cache.history(symbol, days));
        let row = build_row(symbol.clone(), fetched);
        let available = !row.quote.is_unavailable();
        if !available {
            debug!(ticker = %symbol, "detail quote unavailable");
        }

        TickerDetail {
            row,
            available,
            chart: TickerChart {
                ticker: symbol.clone(),
                window: days,
                data: chart::build(&history, SeriesSelector::CloseAndOpen),
            },
        }
    }

    async fn snapshot(&self, raw: &str, cycle: u64) -> WatchSnapshot {
        let started = Instant::now();
        let watchlist = Watchlist::parse(raw);

        let table = self.aggregator.aggregate(&watchlist).await;
        let charts = if self.config.show_chart {
            self.aggregator
                .charts(&watchlist, self.config.history_window, self.config.series)
                .await
        } else {
            Vec::new()
        };

        let latency_ms = elapsed_ms(started.elapsed());
        info!(
            cycle,
            tickers = watchlist.len(),
            top_mover = table.top_mover.as_ref().map(|row| row.ticker.as_str()),
            latency_ms,
            "refresh cycle completed"
        );

        WatchSnapshot {
            cycle,
            generated_at: UtcDateTime::now(),
            watchlist,
            table,
            charts,
            latency_ms,
        }
    }
}

async fn wait_superseded(newer: &mut watch::Receiver<u64>, cycle: u64) {
    let closed = newer.wait_for(|latest| *latest != cycle).await.is_err();
    if closed {
        // Sender gone; nothing can supersede this cycle any more.
        std::future::pending::<()>().await;
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{HistoryRequest, SourceError, SourceFuture};
    use crate::{HistoryPoint, HistorySeries, Quote};

    struct FixedProvider;

    impl MarketDataProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn fast_quote<'a>(&'a self, symbol: TickerSymbol) -> SourceFuture<'a, Quote> {
            Box::pin(async move {
                if symbol.as_str() == "MISSING" {
                    return Err(SourceError::no_data("unknown symbol"));
                }
                Ok(Quote {
                    last_price: Some(105.0),
                    previous_close: Some(100.0),
                    ..Quote::unavailable()
                })
            })
        }

        fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, HistorySeries> {
            Box::pin(async move {
                if req.symbol.as_str() == "MISSING" {
                    return Ok(HistorySeries::empty(req.symbol, req.resolution));
                }
                let points = vec![
                    HistoryPoint::new(req.start, 100.0, 101.0),
                    HistoryPoint::new(req.end, 101.0, 102.0),
                ];
                Ok(HistorySeries::new(req.symbol, req.resolution, points))
            })
        }
    }

    fn dashboard(config: DashboardConfig) -> WatchDashboard {
        WatchDashboard::new(Arc::new(FixedProvider), config).expect("valid config")
    }

    #[tokio::test]
    async fn cycles_are_numbered_in_call_order() {
        let dashboard = dashboard(DashboardConfig::default());
        assert_eq!(dashboard.current_cycle(), 0);

        let first = dashboard.refresh("AAA").await;
        let second = dashboard.refresh("AAA,BBB").await;

        assert_eq!(first.cycle(), 1);
        assert_eq!(second.cycle(), 2);
        let snapshot = second.snapshot().expect("completed");
        assert_eq!(snapshot.table.rows.len(), 2);
        assert_eq!(snapshot.charts.len(), 2);
    }

    #[tokio::test]
    async fn charts_are_skipped_when_hidden() {
        let dashboard = dashboard(DashboardConfig {
            show_chart: false,
            ..DashboardConfig::default()
        });

        let outcome = dashboard.refresh("AAA").await;

        assert!(outcome.snapshot().expect("completed").charts.is_empty());
    }

    #[tokio::test]
    async fn empty_watchlist_yields_empty_table() {
        let dashboard = dashboard(DashboardConfig::default());

        let snapshot = dashboard
            .refresh(" , ")
            .await
            .into_snapshot()
            .expect("completed");

        assert!(snapshot.table.rows.is_empty());
        assert!(snapshot.table.top_mover.is_none());
    }

    #[tokio::test]
    async fn detail_reports_unavailable_ticker() {
        let dashboard = dashboard(DashboardConfig::default());
        let days = HistoryWindow::days(7).expect("in range");

        let missing = dashboard
            .detail(&TickerSymbol::parse("missing").expect("valid"), days)
            .await;
        assert!(!missing.available);
        assert!(missing.chart.data.is_no_data());

        let known = dashboard
            .detail(&TickerSymbol::parse("aaa").expect("valid"), days)
            .await;
        assert!(known.available);
        assert_eq!(known.row.change, Some(5.0));
        assert_eq!(known.chart.data.series().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = WatchDashboard::new(
            Arc::new(FixedProvider),
            DashboardConfig {
                concurrency: 0,
                ..DashboardConfig::default()
            },
        );
        assert!(result.is_err());
    }
}
