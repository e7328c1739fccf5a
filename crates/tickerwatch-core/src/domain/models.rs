use serde::{Deserialize, Serialize};

use crate::{Resolution, TickerSymbol, UtcDateTime};

/// Snapshot of current price fields for one ticker.
///
/// Every field is independently optional. A missing field means the upstream
/// did not provide it, which is never the same as a zero price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub last_price: Option<f64>,
    pub open: Option<f64>,
    pub previous_close: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
}

impl Quote {
    /// Quote with every field absent.
    pub const fn unavailable() -> Self {
        Self {
            last_price: None,
            open: None,
            previous_close: None,
            day_high: None,
            day_low: None,
            volume: None,
            market_cap: None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        self.last_price.is_none()
            && self.open.is_none()
            && self.previous_close.is_none()
            && self.day_high.is_none()
            && self.day_low.is_none()
            && self.volume.is_none()
            && self.market_cap.is_none()
    }

    /// Drops non-finite prices so they read as absent downstream.
    pub fn normalized(self) -> Self {
        Self {
            last_price: finite(self.last_price),
            open: finite(self.open),
            previous_close: finite(self.previous_close),
            day_high: finite(self.day_high),
            day_low: finite(self.day_low),
            volume: self.volume,
            market_cap: finite(self.market_cap),
        }
    }
}

/// How a quote was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteOrigin {
    FastQuote,
    IntradayHistory,
    /// Derived from a single intraday bar; previous close equals the last
    /// price, so the change is always zero.
    IntradaySingleBar,
    Unavailable,
}

/// Quote together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FetchedQuote {
    pub quote: Quote,
    pub origin: QuoteOrigin,
}

impl FetchedQuote {
    pub const fn new(quote: Quote, origin: QuoteOrigin) -> Self {
        Self { quote, origin }
    }

    pub const fn unavailable() -> Self {
        Self::new(Quote::unavailable(), QuoteOrigin::Unavailable)
    }
}

/// One history bar. `open` and `close` are always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: UtcDateTime,
    pub open: f64,
    pub close: f64,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<u64>,
}

impl HistoryPoint {
    pub const fn new(timestamp: UtcDateTime, open: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            close,
            high: None,
            low: None,
            volume: None,
        }
    }
}

/// Ascending run of history points for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawHistorySeries")]
pub struct HistorySeries {
    pub symbol: TickerSymbol,
    pub resolution: Resolution,
    points: Vec<HistoryPoint>,
}

impl HistorySeries {
    /// Sorts points by timestamp; the upstream order is not trusted.
    pub fn new(
        symbol: TickerSymbol,
        resolution: Resolution,
        mut points: Vec<HistoryPoint>,
    ) -> Self {
        points.sort_by_key(|point| point.timestamp);
        Self {
            symbol,
            resolution,
            points,
        }
    }

    pub fn empty(symbol: TickerSymbol, resolution: Resolution) -> Self {
        Self::new(symbol, resolution, Vec::new())
    }

    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Deserialize)]
struct RawHistorySeries {
    symbol: TickerSymbol,
    resolution: Resolution,
    points: Vec<HistoryPoint>,
}

impl From<RawHistorySeries> for HistorySeries {
    fn from(raw: RawHistorySeries) -> Self {
        Self::new(raw.symbol, raw.resolution, raw.points)
    }
}

/// Derived watchlist row; one per input ticker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchRow {
    pub ticker: TickerSymbol,
    pub quote: Quote,
    pub origin: QuoteOrigin,
    pub change: Option<f64>,
    pub pct_change: Option<f64>,
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}
