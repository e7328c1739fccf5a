//! Watchlist text parsing.

use std::collections::HashSet;

use serde::Serialize;

use crate::TickerSymbol;

/// Watchlist shown when the user has not typed anything yet.
pub const DEFAULT_WATCHLIST: &str = "005930.KS,035420.KQ,000660.KS";

/// Ordered set of unique tickers, rebuilt from raw text every refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Watchlist {
    symbols: Vec<TickerSymbol>,
}

impl Watchlist {
    /// Split on commas, trim, upper-case, drop empty tokens and keep the first
    /// occurrence of each ticker. Never fails; an empty input gives an empty
    /// watchlist.
    pub fn parse(raw: &str) -> Self {
        let mut seen = HashSet::new();
        let symbols = raw
            .split(',')
            .filter_map(|token| TickerSymbol::parse(token).ok())
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();

        Self { symbols }
    }

    pub fn symbols(&self) -> &[TickerSymbol] {
        &self.symbols
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TickerSymbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl<'a> IntoIterator for &'a Watchlist {
    type Item = &'a TickerSymbol;
    type IntoIter = std::slice::Iter<'a, TickerSymbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tickers(watchlist: &Watchlist) -> Vec<&str> {
        watchlist.iter().map(TickerSymbol::as_str).collect()
    }

    #[test]
    fn collapses_duplicates_and_blank_tokens() {
        let watchlist = Watchlist::parse(" 005930.ks, 005930.KS ,, 035420.kq");
        assert_eq!(tickers(&watchlist), vec!["005930.KS", "035420.KQ"]);
    }

    #[test]
    fn preserves_first_seen_order() {
        let watchlist = Watchlist::parse("000660.KS,005930.KS,000660.ks,035420.KQ");
        assert_eq!(
            tickers(&watchlist),
            vec!["000660.KS", "005930.KS", "035420.KQ"]
        );
    }

    #[test]
    fn blank_input_is_an_empty_watchlist() {
        assert!(Watchlist::parse("").is_empty());
        assert!(Watchlist::parse(" , ,\t,").is_empty());
    }

    #[test]
    fn default_watchlist_has_three_tickers() {
        assert_eq!(Watchlist::parse(DEFAULT_WATCHLIST).len(), 3);
    }

    #[test]
    fn output_never_contains_empty_or_lowercase_tickers() {
        let inputs = [
            "a,b,,c",
            ",,,",
            "aapl , msft,AAPL,  ",
            "005930.ks,\n035420.kq",
            "x",
        ];
        for input in inputs {
            let watchlist = Watchlist::parse(input);
            let mut seen = HashSet::new();
            for symbol in &watchlist {
                assert!(!symbol.as_str().is_empty());
                assert_eq!(symbol.as_str(), symbol.as_str().to_uppercase());
                assert!(seen.insert(symbol.as_str()), "duplicate in {input:?}");
            }
        }
    }
}
