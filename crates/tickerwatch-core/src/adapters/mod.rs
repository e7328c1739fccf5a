//! Upstream provider adapters.

mod yahoo;

pub use yahoo::{YahooAuthManager, YahooProvider};
