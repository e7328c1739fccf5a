//! Layered quote lookup.
//!
//! A [`QuoteFetcher`] walks an ordered list of [`QuoteStrategy`] values and
//! stops at the first one that yields a quote. The default chain is:
//!
//! 1. [`FastQuoteStrategy`]: the provider's lightweight quote call.
//! 2. [`IntradayFallbackStrategy`]: two days of one-minute bars, from which
//!    last price, open and previous close are derived.
//!
//! When every strategy fails the fetcher returns [`FetchedQuote::unavailable`];
//! failures are logged, never returned.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::provider::{HistoryRequest, MarketDataProvider, SourceError, SourceFuture};
use crate::{
    FetchedQuote, HistorySeries, Quote, QuoteOrigin, Resolution, TickerSymbol, UtcDateTime,
};

/// One step of the quote fallback chain.
pub trait QuoteStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch<'a>(
        &'a self,
        provider: &'a dyn MarketDataProvider,
        symbol: &'a TickerSymbol,
    ) -> SourceFuture<'a, FetchedQuote>;
}

/// Provider fast quote. A quote without a last price counts as a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastQuoteStrategy;

impl QuoteStrategy for FastQuoteStrategy {
    fn name(&self) -> &'static str {
        "fast_quote"
    }

    fn fetch<'a>(
        &'a self,
        provider: &'a dyn MarketDataProvider,
        symbol: &'a TickerSymbol,
    ) -> SourceFuture<'a, FetchedQuote> {
        Box::pin(async move {
            let quote = provider.fast_quote(symbol.clone()).await?.normalized();
            if quote.last_price.is_none() {
                return Err(SourceError::no_data(format!(
                    "fast quote for '{symbol}' has no last price"
                )));
            }
            Ok(FetchedQuote::new(quote, QuoteOrigin::FastQuote))
        })
    }
}

/// Derives a quote from recent one-minute bars.
#[derive(Debug, Clone, Copy)]
pub struct IntradayFallbackStrategy {
    lookback: time::Duration,
}

impl Default for IntradayFallbackStrategy {
    fn default() -> Self {
        Self {
            lookback: time::Duration::days(2),
        }
    }
}

impl QuoteStrategy for IntradayFallbackStrategy {
    fn name(&self) -> &'static str {
        "intraday_history"
    }

    fn fetch<'a>(
        &'a self,
        provider: &'a dyn MarketDataProvider,
        symbol: &'a TickerSymbol,
    ) -> SourceFuture<'a, FetchedQuote> {
        Box::pin(async move {
            let request = HistoryRequest::lookback(
                symbol.clone(),
                Resolution::OneMinute,
                self.lookback,
                UtcDateTime::now(),
            );
            let series = provider.history(request).await?;
            derive_from_intraday(&series).ok_or_else(|| {
                SourceError::no_data(format!("no intraday bars for '{symbol}'"))
            })
        })
    }
}

/// Quote from the tail of an intraday series.
///
/// `previous_close` is the close of the second-to-last bar. With a single bar
/// it falls back to the last price, which pins the change at zero; the result
/// is tagged [`QuoteOrigin::IntradaySingleBar`] so callers can tell. A tail
/// bar without a finite close yields `None`, as a fast quote would.
pub fn derive_from_intraday(series: &HistorySeries) -> Option<FetchedQuote> {
    let points = series.points();
    let last = points.last()?;
    let (previous_close, origin) = match points.len() {
        1 => (last.close, QuoteOrigin::IntradaySingleBar),
        len => (points[len - 2].close, QuoteOrigin::IntradayHistory),
    };

    let quote = Quote {
        last_price: Some(last.close),
        open: Some(last.open),
        previous_close: Some(previous_close),
        ..Quote::unavailable()
    }
    .normalized();
    quote.last_price?;
    Some(FetchedQuote::new(quote, origin))
}

/// Runs the strategy chain for one ticker with a per-strategy timeout.
pub struct QuoteFetcher {
    provider: Arc<dyn MarketDataProvider>,
    strategies: Vec<Box<dyn QuoteStrategy>>,
    timeout: Duration,
}

impl QuoteFetcher {
    /// Default chain: fast quote, then intraday history.
    pub fn new(provider: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        Self::with_strategies(
            provider,
            vec![
                Box::new(FastQuoteStrategy),
                Box::new(IntradayFallbackStrategy::default()),
            ],
            timeout,
        )
    }

    pub fn with_strategies(
        provider: Arc<dyn MarketDataProvider>,
        strategies: Vec<Box<dyn QuoteStrategy>>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            strategies,
            timeout,
        }
    }

    pub async fn fetch(&self, symbol: &TickerSymbol) -> FetchedQuote {
        for strategy in &self.strategies {
            let attempt = strategy.fetch(self.provider.as_ref(), symbol);
            match tokio::time::timeout(self.timeout, attempt).await {
                Ok(Ok(fetched)) => {
                    if fetched.origin == QuoteOrigin::IntradaySingleBar {
                        debug!(
                            ticker = %symbol,
                            "single intraday bar; previous close set to last price"
                        );
                    }
                    debug!(ticker = %symbol, strategy = strategy.name(), "quote resolved");
                    return fetched;
                }
                Ok(Err(error)) => {
                    warn!(
                        ticker = %symbol,
                        strategy = strategy.name(),
                        provider = self.provider.name(),
                        code = error.code(),
                        error = %error.message(),
                        "quote strategy failed"
                    );
                }
                Err(_) => {
                    warn!(
                        ticker = %symbol,
                        strategy = strategy.name(),
                        provider = self.provider.name(),
                        timeout_ms = self.timeout.as_millis() as u64,
                        "quote strategy timed out"
                    );
                }
            }
        }

        FetchedQuote::unavailable()
    }
}
