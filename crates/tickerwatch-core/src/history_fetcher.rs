//! Windowed history lookup.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::provider::{HistoryRequest, MarketDataProvider};
use crate::{HistorySeries, HistoryWindow, TickerSymbol, UtcDateTime};

/// Fetches bars for a backward-looking window. Resolution follows the window
/// (minutes → 1m bars, days → 1d bars); no resampling happens here.
pub struct HistoryFetcher {
    provider: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl HistoryFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Ascending series; empty on any failure or timeout.
    pub async fn fetch(&self, symbol: &TickerSymbol, window: HistoryWindow) -> HistorySeries {
        let resolution = window.resolution();
        let request = HistoryRequest::lookback(
            symbol.clone(),
            resolution,
            window.duration(),
            UtcDateTime::now(),
        );

        match tokio::time::timeout(self.timeout, self.provider.history(request)).await {
            Ok(Ok(series)) => series,
            Ok(Err(error)) => {
                warn!(
                    ticker = %symbol,
                    window = %window,
                    provider = self.provider.name(),
                    code = error.code(),
                    error = %error.message(),
                    "history fetch failed"
                );
                HistorySeries::empty(symbol.clone(), resolution)
            }
            Err(_) => {
                warn!(
                    ticker = %symbol,
                    window = %window,
                    provider = self.provider.name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "history fetch timed out"
                );
                HistorySeries::empty(symbol.clone(), resolution)
            }
        }
    }
}
