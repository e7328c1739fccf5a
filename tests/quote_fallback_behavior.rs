//! Behavior-driven tests for the quote fallback chain.
//!
//! These tests verify HOW a quote is obtained when the fast path fails, is
//! partial, or hangs.

mod support;

use std::sync::Arc;
use std::time::{Duration, Instant};

use support::{symbol, ScriptedProvider};
use tickerwatch_core::{FastQuoteStrategy, FetchedQuote, QuoteFetcher, QuoteOrigin, QuoteStrategy};

fn fetcher(provider: Arc<ScriptedProvider>, timeout: Duration) -> QuoteFetcher {
    QuoteFetcher::new(provider, timeout)
}

#[tokio::test]
async fn when_fast_quote_succeeds_history_is_never_requested() {
    // Given
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_quote("005930.KS", 71_500.0, 70_000.0)
            .with_bars("005930.KS", &[(1.0, 2.0)]),
    );

    // When
    let fetched = fetcher(Arc::clone(&provider), Duration::from_secs(1))
        .fetch(&symbol("005930.KS"))
        .await;

    // Then
    assert_eq!(fetched.origin, QuoteOrigin::FastQuote);
    assert_eq!(fetched.quote.last_price, Some(71_500.0));
    assert_eq!(provider.fast_calls(), 1);
    assert_eq!(provider.history_calls(), 0);
}

#[tokio::test]
async fn when_fast_quote_fails_intraday_bars_fill_the_quote() {
    // Given: no fast quote, three one-minute bars
    let provider = Arc::new(ScriptedProvider::new().with_bars(
        "035420.KQ",
        &[(200_000.0, 201_000.0), (201_000.0, 202_000.0), (202_000.0, 204_000.0)],
    ));

    // When
    let fetched = fetcher(Arc::clone(&provider), Duration::from_secs(1))
        .fetch(&symbol("035420.KQ"))
        .await;

    // Then: last close, last open, second-to-last close
    assert_eq!(fetched.origin, QuoteOrigin::IntradayHistory);
    assert_eq!(fetched.quote.last_price, Some(204_000.0));
    assert_eq!(fetched.quote.open, Some(202_000.0));
    assert_eq!(fetched.quote.previous_close, Some(202_000.0));
    assert_eq!(fetched.quote.volume, None);
    assert_eq!(provider.history_calls(), 1);
}

#[tokio::test]
async fn single_intraday_bar_pins_change_at_zero_and_is_flagged() {
    // Given: only one bar available
    let provider = Arc::new(ScriptedProvider::new().with_bars("NEWLIST", &[(10.0, 12.0)]));

    // When
    let fetched = fetcher(provider, Duration::from_secs(1))
        .fetch(&symbol("NEWLIST"))
        .await;

    // Then: previous close equals last price and the origin says so
    assert_eq!(fetched.origin, QuoteOrigin::IntradaySingleBar);
    assert_eq!(fetched.quote.previous_close, fetched.quote.last_price);
    let metrics = tickerwatch_core::metrics::compute(&fetched.quote);
    assert_eq!(metrics.change, Some(0.0));
}

#[tokio::test]
async fn when_both_strategies_find_nothing_the_quote_is_all_absent() {
    let provider = Arc::new(ScriptedProvider::new());

    let fetched = fetcher(Arc::clone(&provider), Duration::from_secs(1))
        .fetch(&symbol("999999.XX"))
        .await;

    assert_eq!(fetched, FetchedQuote::unavailable());
    assert_eq!(provider.fast_calls(), 1);
    assert_eq!(provider.history_calls(), 1);
}

#[tokio::test]
async fn hanging_provider_is_cut_off_by_the_timeout() {
    // Given: every call takes far longer than the timeout
    let provider = Arc::new(
        ScriptedProvider::new()
            .with_quote("SLOW", 1.0, 1.0)
            .with_delay(Duration::from_secs(5)),
    );
    let started = Instant::now();

    // When
    let fetched = fetcher(provider, Duration::from_millis(50))
        .fetch(&symbol("SLOW"))
        .await;

    // Then: both strategies time out and the quote degrades to all-absent
    assert_eq!(fetched.origin, QuoteOrigin::Unavailable);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn custom_chain_without_fallback_stops_after_fast_quote() {
    // Given: a chain with only the fast strategy
    let provider = Arc::new(ScriptedProvider::new().with_bars("AAA", &[(1.0, 2.0), (2.0, 3.0)]));
    let strategies: Vec<Box<dyn QuoteStrategy>> = vec![Box::new(FastQuoteStrategy)];
    let fetcher =
        QuoteFetcher::with_strategies(provider.clone(), strategies, Duration::from_secs(1));

    // When
    let fetched = fetcher.fetch(&symbol("AAA")).await;

    // Then: bars exist, but nothing asked for them
    assert_eq!(fetched.origin, QuoteOrigin::Unavailable);
    assert_eq!(provider.history_calls(), 0);
}
