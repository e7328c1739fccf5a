//! # Domain Models
//!
//! Value types shared by every stage of the quote pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TickerSymbol`] | Upper-cased ticker, exchange suffix kept |
//! | [`Quote`] | Current price fields, each independently optional |
//! | [`FetchedQuote`] | Quote plus the [`QuoteOrigin`] that produced it |
//! | [`HistoryPoint`] | One OHLC bar |
//! | [`HistorySeries`] | Ascending bars for one ticker |
//! | [`HistoryWindow`] | Bounded lookback window (minutes or days) |
//! | [`Resolution`] | Bar resolution (1m, 1d) |
//! | [`WatchRow`] | Derived row of the watchlist table |
//! | [`UtcDateTime`] | UTC timestamp |

mod interval;
mod models;
mod symbol;
mod timestamp;
mod window;

pub use interval::Resolution;
pub use models::{FetchedQuote, HistoryPoint, HistorySeries, Quote, QuoteOrigin, WatchRow};
pub use symbol::TickerSymbol;
pub use timestamp::UtcDateTime;
pub use window::HistoryWindow;
