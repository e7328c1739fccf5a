use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::provider::{HistoryRequest, MarketDataProvider, SourceError, SourceFuture};
use crate::{HistoryPoint, HistorySeries, Quote, Resolution, TickerSymbol, UtcDateTime};

const REFERER: &str = "https://finance.yahoo.com/";
const QUOTE_FIELDS: &str = "regularMarketPrice,regularMarketOpen,regularMarketPreviousClose,\
regularMarketDayHigh,regularMarketDayLow,regularMarketVolume,marketCap";

// ============================================================================
// Crumb handshake
// ============================================================================

/// Caches the Yahoo crumb token required by the quote endpoint.
///
/// The session cookie comes from `fc.yahoo.com` and lives in the HTTP client's
/// cookie jar; the crumb is passed as a query parameter. The lock is held for
/// the whole refresh so concurrent callers share one handshake.
#[derive(Debug)]
pub struct YahooAuthManager {
    crumb: Mutex<Option<CachedCrumb>>,
    auth_ttl: Duration,
}

#[derive(Debug, Clone)]
struct CachedCrumb {
    value: String,
    fetched_at: Instant,
}

impl Default for YahooAuthManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

impl YahooAuthManager {
    pub fn new(auth_ttl: Duration) -> Self {
        Self {
            crumb: Mutex::new(None),
            auth_ttl,
        }
    }

    /// Returns the cached crumb, running the handshake when missing or stale.
    pub async fn crumb(
        &self,
        http_client: &dyn HttpClient,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            if crumb.fetched_at.elapsed() < self.auth_ttl {
                return Ok(crumb.value.clone());
            }
        }

        let value = fetch_crumb(http_client, timeout_ms).await?;
        *cached = Some(CachedCrumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Forget the cached crumb; the next call performs a fresh handshake.
    pub async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }
}

async fn fetch_crumb(http_client: &dyn HttpClient, timeout_ms: u64) -> Result<String, SourceError> {
    // fc.yahoo.com answers 404 but still sets the session cookie.
    let cookie_request = HttpRequest::get("https://fc.yahoo.com")
        .with_header("referer", REFERER)
        .with_timeout_ms(timeout_ms);
    http_client
        .execute(cookie_request)
        .await
        .map_err(|error| transport_error("cookie", &error))?;

    let crumb_endpoints = [
        "https://query1.finance.yahoo.com/v1/test/getcrumb",
        "https://query2.finance.yahoo.com/v1/test/getcrumb",
    ];

    for endpoint in crumb_endpoints {
        let request = HttpRequest::get(endpoint)
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);

        let Ok(response) = http_client.execute(request).await else {
            continue;
        };
        if response.status == 429 {
            return Err(SourceError::rate_limited(
                "yahoo rate limited the crumb handshake",
            ));
        }
        if !response.is_success() {
            continue;
        }

        let body = response.body.trim();
        if body.contains("<html") || body.contains("<!DOCTYPE") {
            continue;
        }
        if !body.is_empty() && body.len() < 100 && !body.contains(char::is_whitespace) {
            return Ok(body.to_owned());
        }
    }

    Err(SourceError::unavailable(
        "failed to fetch yahoo crumb from all endpoints",
    ))
}

// ============================================================================
// Provider
// ============================================================================

/// Yahoo Finance provider: v7 quote endpoint for fast quotes, v8 chart
/// endpoint for history.
#[derive(Clone)]
pub struct YahooProvider {
    http_client: Arc<dyn HttpClient>,
    auth: Arc<YahooAuthManager>,
    timeout_ms: u64,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestHttpClient::default()))
    }
}

impl YahooProvider {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            auth: Arc::new(YahooAuthManager::default()),
            timeout_ms: 5_000,
        }
    }

    /// Per-request transport timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn send(&self, url: String) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout_ms(self.timeout_ms);

        self.http_client
            .execute(request)
            .await
            .map_err(|error| transport_error("request", &error))
    }

    async fn quote_body(&self, symbol: &TickerSymbol) -> Result<String, SourceError> {
        let crumb = self
            .auth
            .crumb(self.http_client.as_ref(), self.timeout_ms)
            .await?;
        let response = self.send(quote_url(symbol, &crumb)).await?;

        // A stale crumb answers 401: redo the handshake once.
        if response.status == 401 {
            self.auth.invalidate().await;
            let crumb = self
                .auth
                .crumb(self.http_client.as_ref(), self.timeout_ms)
                .await?;
            let retried = self.send(quote_url(symbol, &crumb)).await?;
            return check_status(retried);
        }

        check_status(response)
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fast_quote<'a>(&'a self, symbol: TickerSymbol) -> SourceFuture<'a, Quote> {
        Box::pin(async move {
            let body = self.quote_body(&symbol).await?;
            parse_quote_body(&symbol, &body)
        })
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> SourceFuture<'a, HistorySeries> {
        Box::pin(async move {
            let response = self.send(chart_url(&req)).await?;
            let body = check_status(response)?;
            parse_chart_body(&req.symbol, req.resolution, &body)
        })
    }
}

fn quote_url(symbol: &TickerSymbol, crumb: &str) -> String {
    format!(
        "https://query1.finance.yahoo.com/v7/finance/quote?symbols={}&fields={}&crumb={}",
        urlencoding::encode(symbol.as_str()),
        QUOTE_FIELDS,
        urlencoding::encode(crumb)
    )
}

fn chart_url(req: &HistoryRequest) -> String {
    format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false",
        urlencoding::encode(req.symbol.as_str()),
        req.start.unix_timestamp(),
        req.end.unix_timestamp(),
        req.resolution.as_str()
    )
}

fn check_status(response: HttpResponse) -> Result<String, SourceError> {
    match response.status {
        200..=299 => Ok(response.body),
        404 => Err(SourceError::no_data("yahoo returned status 404")),
        429 => Err(SourceError::rate_limited("yahoo returned status 429")),
        status => Err(SourceError::unavailable(format!(
            "yahoo returned status {status}"
        ))),
    }
}

fn transport_error(stage: &str, error: &HttpError) -> SourceError {
    if error.is_timeout() {
        SourceError::timeout(format!("yahoo {stage} timed out: {}", error.message()))
    } else {
        SourceError::unavailable(format!("yahoo {stage} failed: {}", error.message()))
    }
}

fn api_error(error: YahooApiError) -> SourceError {
    if error.code.eq_ignore_ascii_case("not found") {
        SourceError::no_data(format!("yahoo API error: {error}"))
    } else {
        SourceError::unavailable(format!("yahoo API error: {error}"))
    }
}

/// Parse a v7 quote payload into a [`Quote`] for `symbol`.
pub(crate) fn parse_quote_body(symbol: &TickerSymbol, body: &str) -> Result<Quote, SourceError> {
    let response: YahooQuoteResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse yahoo quote: {e}"))
    })?;

    if let Some(error) = response.quote_response.error {
        return Err(api_error(error));
    }

    let data = response
        .quote_response
        .result
        .unwrap_or_default()
        .into_iter()
        .find(|quote| quote.symbol.eq_ignore_ascii_case(symbol.as_str()))
        .ok_or_else(|| SourceError::no_data(format!("yahoo has no quote for '{symbol}'")))?;

    Ok(Quote {
        last_price: data.regular_market_price,
        open: data.regular_market_open,
        previous_close: data.regular_market_previous_close,
        day_high: data.regular_market_day_high,
        day_low: data.regular_market_day_low,
        volume: data.regular_market_volume.and_then(to_volume),
        market_cap: data.market_cap,
    }
    .normalized())
}

/// Parse a v8 chart payload. Bars missing open or close are skipped.
pub(crate) fn parse_chart_body(
    symbol: &TickerSymbol,
    resolution: Resolution,
    body: &str,
) -> Result<HistorySeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        SourceError::invalid_response(format!("failed to parse yahoo chart: {e}"))
    })?;

    if let Some(error) = response.chart.error {
        return Err(api_error(error));
    }

    let Some(result) = response.chart.result.unwrap_or_default().into_iter().next() else {
        return Ok(HistorySeries::empty(symbol.clone(), resolution));
    };
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(HistorySeries::empty(symbol.clone(), resolution));
    };

    let mut points = Vec::with_capacity(timestamps.len());
    for (index, &seconds) in timestamps.iter().enumerate() {
        let open = value_at(&quote.open, index);
        let close = value_at(&quote.close, index);
        let (Some(open), Some(close)) = (open, close) else {
            continue;
        };
        let timestamp = UtcDateTime::from_unix_timestamp(seconds)
            .map_err(|e| SourceError::invalid_response(e.to_string()))?;

        points.push(HistoryPoint {
            timestamp,
            open,
            close,
            high: value_at(&quote.high, index),
            low: value_at(&quote.low, index),
            volume: value_at(&quote.volume, index).and_then(to_volume),
        });
    }

    Ok(HistorySeries::new(symbol.clone(), resolution, points))
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values
        .get(index)
        .copied()
        .flatten()
        .filter(|value| value.is_finite())
}

fn to_volume(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}

// Yahoo Finance API response structures
#[derive(Debug, Clone, Deserialize)]
struct YahooApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

impl Display for YahooApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {description}", self.code),
            None => f.write_str(&self.code),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteResponse {
    #[serde(rename = "quoteResponse")]
    quote_response: YahooQuoteResponseData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooQuoteResponseData {
    #[serde(default)]
    result: Option<Vec<YahooQuoteData>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuoteData {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SourceErrorKind;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex as StdMutex;

    /// Answers by URL prefix; records every request.
    struct ScriptedHttpClient {
        routes: Vec<(&'static str, Vec<HttpResponse>)>,
        requests: StdMutex<Vec<String>>,
    }

    impl ScriptedHttpClient {
        fn new(routes: Vec<(&'static str, Vec<HttpResponse>)>) -> Self {
            Self {
                routes,
                requests: StdMutex::new(Vec::new()),
            }
        }

        fn count(&self, prefix: &str) -> usize {
            self.requests
                .lock()
                .expect("request log should not be poisoned")
                .iter()
                .filter(|url| url.starts_with(prefix))
                .count()
        }
    }

    impl HttpClient for ScriptedHttpClient {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            let mut log = self
                .requests
                .lock()
                .expect("request log should not be poisoned");
            let (prefix, responses) = self
                .routes
                .iter()
                .find(|(prefix, _)| request.url.starts_with(prefix))
                .map(|(prefix, responses)| (*prefix, responses.clone()))
                .unwrap_or(("", Vec::new()));
            let seen = log.iter().filter(|url| url.starts_with(prefix)).count();
            log.push(request.url);

            let response = responses
                .get(seen)
                .or_else(|| responses.last())
                .cloned()
                .ok_or_else(|| HttpError::new("no route"));
            Box::pin(async move { response })
        }
    }

    const QUOTE_BODY: &str = r#"{"quoteResponse":{"result":[{"symbol":"005930.KS",
        "regularMarketPrice":71500.0,"regularMarketOpen":70900.0,
        "regularMarketPreviousClose":70000.0,"regularMarketDayHigh":72000.0,
        "regularMarketDayLow":70500.0,"regularMarketVolume":12345678,
        "marketCap":426840000000000}],"error":null}}"#;

    const CHART_BODY: &str = r#"{"chart":{"result":[{"meta":{"symbol":"005930.KS"},
        "timestamp":[1704153600,1704153660,1704153720],
        "indicators":{"quote":[{"open":[100.0,null,102.0],"high":[101.0,null,103.0],
        "low":[99.5,null,101.5],"close":[100.5,null,102.5],"volume":[10,null,30]}]}}],
        "error":null}}"#;

    const NOT_FOUND_BODY: &str = r#"{"chart":{"result":null,"error":{"code":"Not Found",
        "description":"No data found, symbol may be delisted"}}}"#;

    fn symbol() -> TickerSymbol {
        TickerSymbol::parse("005930.KS").expect("valid symbol")
    }

    #[test]
    fn parses_every_quote_field() {
        let quote = parse_quote_body(&symbol(), QUOTE_BODY).expect("quote should parse");

        assert_eq!(quote.last_price, Some(71_500.0));
        assert_eq!(quote.open, Some(70_900.0));
        assert_eq!(quote.previous_close, Some(70_000.0));
        assert_eq!(quote.day_high, Some(72_000.0));
        assert_eq!(quote.day_low, Some(70_500.0));
        assert_eq!(quote.volume, Some(12_345_678));
        assert_eq!(quote.market_cap, Some(426_840_000_000_000.0));
    }

    #[test]
    fn partial_quote_keeps_missing_fields_absent() {
        let body = r#"{"quoteResponse":{"result":[{"symbol":"035420.KQ","regularMarketPrice":181000}]}}"#;
        let symbol = TickerSymbol::parse("035420.kq").expect("valid symbol");
        let quote = parse_quote_body(&symbol, body).expect("quote should parse");

        assert_eq!(quote.last_price, Some(181_000.0));
        assert_eq!(quote.previous_close, None);
        assert_eq!(quote.volume, None);
    }

    #[test]
    fn empty_quote_result_is_no_data() {
        let body = r#"{"quoteResponse":{"result":[],"error":null}}"#;
        let error = parse_quote_body(&symbol(), body).expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NoData);
    }

    #[test]
    fn chart_skips_bars_without_prices() {
        let series = parse_chart_body(&symbol(), Resolution::OneMinute, CHART_BODY)
            .expect("chart should parse");

        assert_eq!(series.len(), 2);
        let first = &series.points()[0];
        assert_eq!(first.open, 100.0);
        assert_eq!(first.close, 100.5);
        assert_eq!(first.high, Some(101.0));
        assert_eq!(first.volume, Some(10));
        assert_eq!(series.points()[1].close, 102.5);
    }

    #[test]
    fn chart_without_timestamps_is_empty_not_error() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let series =
            parse_chart_body(&symbol(), Resolution::OneDay, body).expect("chart should parse");
        assert!(series.is_empty());
    }

    #[test]
    fn chart_not_found_is_no_data() {
        let error = parse_chart_body(&symbol(), Resolution::OneMinute, NOT_FOUND_BODY)
            .expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NoData);
    }

    #[test]
    fn malformed_payload_is_invalid_response() {
        let error = parse_quote_body(&symbol(), "<html>").expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn fast_quote_runs_handshake_once_and_reuses_crumb() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            ("https://fc.yahoo.com", vec![HttpResponse::with_status(404, "")]),
            (
                "https://query1.finance.yahoo.com/v1/test/getcrumb",
                vec![HttpResponse::ok_json("abc123")],
            ),
            (
                "https://query1.finance.yahoo.com/v7/finance/quote",
                vec![HttpResponse::ok_json(QUOTE_BODY)],
            ),
        ]));
        let provider = YahooProvider::new(client.clone());

        for _ in 0..2 {
            let quote = provider
                .fast_quote(symbol())
                .await
                .expect("quote should succeed");
            assert_eq!(quote.last_price, Some(71_500.0));
        }

        assert_eq!(client.count("https://query1.finance.yahoo.com/v1/test/getcrumb"), 1);
        assert_eq!(client.count("https://query1.finance.yahoo.com/v7/finance/quote"), 2);
    }

    #[tokio::test]
    async fn stale_crumb_triggers_one_fresh_handshake() {
        let client = Arc::new(ScriptedHttpClient::new(vec![
            ("https://fc.yahoo.com", vec![HttpResponse::with_status(404, "")]),
            (
                "https://query1.finance.yahoo.com/v1/test/getcrumb",
                vec![HttpResponse::ok_json("old"), HttpResponse::ok_json("new")],
            ),
            (
                "https://query1.finance.yahoo.com/v7/finance/quote",
                vec![
                    HttpResponse::with_status(401, "Unauthorized"),
                    HttpResponse::ok_json(QUOTE_BODY),
                ],
            ),
        ]));
        let provider = YahooProvider::new(client.clone());

        let quote = provider
            .fast_quote(symbol())
            .await
            .expect("retry should succeed");
        assert_eq!(quote.previous_close, Some(70_000.0));
        assert_eq!(client.count("https://query1.finance.yahoo.com/v1/test/getcrumb"), 2);
    }

    #[tokio::test]
    async fn unknown_ticker_history_maps_to_no_data() {
        let client = Arc::new(ScriptedHttpClient::new(vec![(
            "https://query1.finance.yahoo.com/v8/finance/chart",
            vec![HttpResponse::with_status(404, NOT_FOUND_BODY)],
        )]));
        let provider = YahooProvider::new(client);
        let symbol = TickerSymbol::parse("999999.XX").expect("valid symbol");
        let request = HistoryRequest::lookback(
            symbol,
            Resolution::OneMinute,
            time::Duration::minutes(60),
            UtcDateTime::now(),
        );

        let error = provider.history(request).await.expect_err("must fail");
        assert_eq!(error.kind(), SourceErrorKind::NoData);
    }
}
