//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tickerwatch_core::{
    HistoryPoint, HistoryRequest, HistorySeries, MarketDataProvider, Quote, SourceError,
    SourceFuture, TickerSymbol,
};

/// Provider answering from fixed per-ticker scripts.
///
/// Tickers without a scripted quote fail the fast path with `no_data`;
/// tickers without scripted bars return an empty series.
#[derive(Default)]
pub struct ScriptedProvider {
    quotes: HashMap<String, Quote>,
    bars: HashMap<String, Vec<(f64, f64)>>,
    delay: Option<Duration>,
    fast_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, ticker: &str, last: f64, previous_close: f64) -> Self {
        self.quotes.insert(
            ticker.to_owned(),
            Quote {
                last_price: Some(last),
                previous_close: Some(previous_close),
                ..Quote::unavailable()
            },
        );
        self
    }

    /// Bars as `(open, close)` pairs, oldest first, one minute apart.
    pub fn with_bars(mut self, ticker: &str, bars: &[(f64, f64)]) -> Self {
        self.bars.insert(ticker.to_owned(), bars.to_vec());
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fast_calls(&self) -> usize {
        self.fast_calls.load(Ordering::SeqCst)
    }

    pub fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn fast_quote<'a>(&'a self, symbol: TickerSymbol) -> SourceFuture<'a, Quote> {
        self.fast_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.pause().await;
            self.quotes
                .get(symbol.as_str())
                .copied()
                .ok_or_else(|| SourceError::no_data(format!("no quote for '{symbol}'")))
        })
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, HistorySeries> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.pause().await;
            let bars = self.bars.get(req.symbol.as_str()).cloned().unwrap_or_default();
            let count = bars.len() as i64;
            let points = bars
                .into_iter()
                .enumerate()
                .map(|(index, (open, close))| {
                    let minutes_back = count - 1 - index as i64;
                    let ts = req
                        .end
                        .saturating_sub(time::Duration::minutes(minutes_back));
                    HistoryPoint::new(ts, open, close)
                })
                .collect();
            Ok(HistorySeries::new(req.symbol, req.resolution, points))
        })
    }
}

pub fn symbol(raw: &str) -> TickerSymbol {
    TickerSymbol::parse(raw).expect("valid symbol")
}
