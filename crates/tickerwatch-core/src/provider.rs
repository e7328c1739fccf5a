//! Upstream market-data provider contract.
//!
//! The pipeline never talks to the network directly. It goes through a
//! [`MarketDataProvider`], which exposes the two calls the quote and history
//! fetchers need:
//!
//! | Call | Request | Response | Description |
//! |------|---------|----------|-------------|
//! | `fast_quote` | [`TickerSymbol`] | [`Quote`] | Lightweight current-quote lookup |
//! | `history` | [`HistoryRequest`] | [`HistorySeries`] | OHLC bars over a time range |
//!
//! Providers may fail, return partial fields, or return nothing for unknown
//! symbols. Callers translate every failure into absent data.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use time::Duration;

use crate::{HistorySeries, Quote, Resolution, TickerSymbol, UtcDateTime};

/// Provider error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    NoData,
    Timeout,
    RateLimited,
    InvalidResponse,
}

/// Structured provider error. Logged by the fetchers, never shown per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Timeout,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidResponse,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::NoData => "source.no_data",
            SourceErrorKind::Timeout => "source.timeout",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidResponse => "source.invalid_response",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Bars for one symbol between `start` and `end` at a fixed resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: TickerSymbol,
    pub resolution: Resolution,
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

impl HistoryRequest {
    /// Range ending at `now` and reaching `lookback` into the past.
    pub fn lookback(
        symbol: TickerSymbol,
        resolution: Resolution,
        lookback: Duration,
        now: UtcDateTime,
    ) -> Self {
        Self {
            symbol,
            resolution,
            start: now.saturating_sub(lookback),
            end: now,
        }
    }
}

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Market-data provider contract.
///
/// Implementations must be `Send + Sync`; one provider is shared by every
/// concurrent fetch of a refresh cycle.
pub trait MarketDataProvider: Send + Sync {
    /// Short provider name used in log fields.
    fn name(&self) -> &'static str;

    /// Lightweight current-quote lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider is unreachable, rate limited,
    /// answers with an unparseable payload, or has no quote for the symbol.
    fn fast_quote<'a>(&'a self, symbol: TickerSymbol) -> SourceFuture<'a, Quote>;

    /// OHLC bars for the requested range.
    ///
    /// An empty series is a valid answer. Errors follow the same taxonomy as
    /// [`fast_quote`](MarketDataProvider::fast_quote).
    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, HistorySeries>;
}
