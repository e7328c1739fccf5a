//! Watchlist fan-out.
//!
//! Quotes and histories are fetched through the shared [`QuoteCache`] with at
//! most `concurrency` tickers in flight. Results are written back by input
//! index, so output order never depends on completion order. A task that
//! panics leaves its row all-absent; the rest of the table is unaffected.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::cache::QuoteCache;
use crate::chart::{self, SeriesSelector, TickerChart};
use crate::metrics;
use crate::watchlist::Watchlist;
use crate::{FetchedQuote, HistoryWindow, TickerSymbol, WatchRow};

/// Rows in watchlist order plus the largest absolute mover.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WatchTable {
    pub rows: Vec<WatchRow>,
    pub top_mover: Option<WatchRow>,
}

impl WatchTable {
    pub fn from_rows(rows: Vec<WatchRow>) -> Self {
        let top_mover = select_top_mover(&rows).cloned();
        Self { rows, top_mover }
    }
}

/// Row with the greatest `|change|`. Rows without a change are skipped and
/// ties keep the earliest row.
pub fn select_top_mover(rows: &[WatchRow]) -> Option<&WatchRow> {
    let mut best: Option<(&WatchRow, f64)> = None;
    for row in rows {
        let Some(change) = row.change else {
            continue;
        };
        let magnitude = change.abs();
        if best.map_or(true, |(_, current)| magnitude > current) {
            best = Some((row, magnitude));
        }
    }
    best.map(|(row, _)| row)
}

pub fn build_row(ticker: TickerSymbol, fetched: FetchedQuote) -> WatchRow {
    let metrics = metrics::compute(&fetched.quote);
    WatchRow {
        ticker,
        quote: fetched.quote,
        origin: fetched.origin,
        change: metrics.change,
        pct_change: metrics.pct_change,
    }
}

pub struct WatchlistAggregator {
    cache: Arc<QuoteCache>,
    concurrency: usize,
}

impl WatchlistAggregator {
    pub fn new(cache: Arc<QuoteCache>, concurrency: usize) -> Self {
        Self {
            cache,
            concurrency: concurrency.max(1),
        }
    }

    /// Exactly one row per ticker, in watchlist order.
    pub async fn aggregate(&self, watchlist: &Watchlist) -> WatchTable {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, symbol) in watchlist.iter().cloned().enumerate() {
            let cache = Arc::clone(&self.cache);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                (index, cache.quote(&symbol).await)
            });
        }

        let mut fetched = vec![FetchedQuote::unavailable(); watchlist.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, quote)) => fetched[index] = quote,
                Err(error) => warn!(error = %error, "quote task did not complete"),
            }
        }

        let rows = watchlist
            .iter()
            .cloned()
            .zip(fetched)
            .map(|(ticker, fetched)| build_row(ticker, fetched))
            .collect();
        WatchTable::from_rows(rows)
    }

    /// One chart per ticker, in watchlist order. Failed fetches chart as no data.
    pub async fn charts(
        &self,
        watchlist: &Watchlist,
        window: HistoryWindow,
        selector: SeriesSelector,
    ) -> Vec<TickerChart> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, symbol) in watchlist.iter().cloned().enumerate() {
            let cache = Arc::clone(&self.cache);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let history = cache.history(&symbol, window).await;
                (index, chart::build(&history, selector))
            });
        }

        let mut data = vec![chart::ChartData::NoData; watchlist.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, built)) => data[index] = built,
                Err(error) => warn!(error = %error, "history task did not complete"),
            }
        }

        watchlist
            .iter()
            .cloned()
            .zip(data)
            .map(|(ticker, data)| TickerChart {
                ticker,
                window,
                data,
            })
            .collect()
    }
}
