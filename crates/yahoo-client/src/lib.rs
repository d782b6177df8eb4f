use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use market_core::{Bar, MarketDataProvider, MarketError, PriceSeries};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const BASE_URL: &str = "https://query1.finance.yahoo.com";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; nifty-select/0.1)";

/// NSE-listed constituents resolve to Yahoo's `<TICKER>.NS` form.
/// Index symbols (`^NSEI`) and already-suffixed symbols pass through.
pub fn nse_symbol(ticker: &str) -> String {
    if ticker.starts_with('^') || ticker.contains('.') {
        ticker.to_string()
    } else {
        format!("{}.NS", ticker)
    }
}

/// Caps outbound requests to `limit` per rolling `window`.
#[derive(Clone)]
struct Throttle {
    sent: Arc<Mutex<VecDeque<Instant>>>,
    limit: usize,
    window: Duration,
}

impl Throttle {
    fn new(limit: usize, window: Duration) -> Self {
        Self {
            sent: Arc::new(Mutex::new(VecDeque::new())),
            // A zero limit would block every caller forever
            limit: limit.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();
                while sent
                    .front()
                    .is_some_and(|&t| now.duration_since(t) >= self.window)
                {
                    sent.pop_front();
                }
                if sent.len() < self.limit {
                    sent.push_back(now);
                    return;
                }
                // Oldest in-window send decides when a slot frees up
                let oldest = *sent.front().unwrap();
                self.window - now.duration_since(oldest) + Duration::from_millis(25)
            };
            tracing::debug!("Throttling Yahoo request for {:.1}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
    }
}

#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: Client,
    throttle: Throttle,
}

impl YahooClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Build a client against a non-default endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        // Yahoo throttles unauthenticated chart requests aggressively;
        // default to 60/min and let YAHOO_RATE_LIMIT override.
        let rate_limit: usize = std::env::var("YAHOO_RATE_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into(),
            client,
            throttle: Throttle::new(rate_limit, Duration::from_secs(60)),
        }
    }

    /// Execute a request behind the throttle, retrying when Yahoo 429s.
    async fn send_request(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, MarketError> {
        const MAX_ATTEMPTS: u32 = 3;

        let request = builder
            .build()
            .map_err(|e| MarketError::Api(e.to_string()))?;

        for attempt in 1..=MAX_ATTEMPTS {
            self.throttle.acquire().await;
            let req = request
                .try_clone()
                .ok_or_else(|| MarketError::Api("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req)
                .await
                .map_err(|e| MarketError::Api(e.to_string()))?;

            if response.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            tracing::warn!(
                "Yahoo throttled the request (attempt {}/{}), backing off 10s",
                attempt,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(Duration::from_secs(10)).await;
        }

        Err(MarketError::Api(
            "Yahoo kept returning 429 after 3 attempts".to_string(),
        ))
    }

    /// Fetch daily bars for `symbol` covering `[from, to]`.
    pub async fn get_daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, MarketError> {
        let period1 = from
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        // period2 is exclusive; push it past the end of `to`
        let period2 = to
            .succ_opt()
            .unwrap_or(to)
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);

        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let response = self
            .send_request(self.client.get(&url).query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(MarketError::Api(format!(
                "HTTP {} for {}: {}",
                response.status(),
                symbol,
                response.text().await.unwrap_or_default()
            )));
        }

        let chart: ChartResponse = response
            .json()
            .await
            .map_err(|e| MarketError::Api(e.to_string()))?;

        bars_from_chart(symbol, chart)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn daily_history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<PriceSeries, MarketError> {
        // Callers use plain universe tickers; the `.NS` suffix is a Yahoo detail
        let bars = self.get_daily_bars(&nse_symbol(symbol), from, to).await?;
        if bars.is_empty() {
            return Err(MarketError::EmptySeries(symbol.to_string()));
        }
        Ok(PriceSeries::new(symbol, bars))
    }
}

/// Decode a chart payload into bars, skipping rows Yahoo nulls out
/// (halted sessions leave holes in every quote array).
fn bars_from_chart(symbol: &str, chart: ChartResponse) -> Result<Vec<Bar>, MarketError> {
    if let Some(err) = chart.chart.error {
        return Err(MarketError::Api(format!(
            "{}: {} ({})",
            symbol, err.description, err.code
        )));
    }

    let result = chart
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| MarketError::EmptySeries(symbol.to_string()))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::EmptySeries(symbol.to_string()))?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = match quote.close.get(i).copied().flatten() {
            Some(c) => c,
            None => continue,
        };
        let timestamp = match DateTime::<Utc>::from_timestamp(ts, 0) {
            Some(t) => t,
            None => continue,
        };
        bars.push(Bar {
            timestamp,
            open: quote.open.get(i).copied().flatten().unwrap_or(close),
            high: quote.high.get(i).copied().flatten().unwrap_or(close),
            low: quote.low.get(i).copied().flatten().unwrap_or(close),
            close,
            volume: quote.volume.get(i).copied().flatten().unwrap_or(0.0),
        });
    }

    Ok(bars)
}

// Yahoo v8 chart response DTOs

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Default)]
struct QuoteBlock {
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
