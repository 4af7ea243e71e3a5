//! Quote-summary client for per-ticker price and valuation facts.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use screener_core::numeric::coerce_json;
use screener_core::{normalize_ticker, MarketDataSource, MarketSnapshot, ScreenerError};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const MODULES: &str = "price,summaryDetail,defaultKeyStatistics,assetProfile,financialData";
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Clone)]
pub struct MarketDataClient {
    client: Client,
    /// `None` until the first request; `Some("")` once a crumb fetch failed.
    crumb: Arc<Mutex<Option<String>>>,
}

impl MarketDataClient {
    pub fn new(timeout: Duration) -> Result<Self, ScreenerError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| ScreenerError::ApiError(e.to_string()))?;

        Ok(Self {
            client,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    /// Session crumb, fetched once. A failed fetch is remembered as empty and
    /// requests go out without one.
    async fn crumb(&self) -> Option<String> {
        let mut guard = self.crumb.lock().await;
        if guard.is_none() {
            let fetched = self.fetch_crumb().await.unwrap_or_else(|e| {
                tracing::warn!("Quote crumb unavailable, continuing without: {}", e);
                String::new()
            });
            *guard = Some(fetched);
        }
        guard.clone().filter(|c| !c.is_empty())
    }

    async fn fetch_crumb(&self) -> Result<String, ScreenerError> {
        // Only the session cookie matters here; the status is often 404.
        let _ = self.client.get(COOKIE_URL).send().await;

        let response = self
            .client
            .get(CRUMB_URL)
            .send()
            .await
            .map_err(|e| ScreenerError::ApiError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ScreenerError::HttpStatus {
                status: response.status().as_u16(),
                url: CRUMB_URL.to_string(),
            });
        }
        let crumb = response
            .text()
            .await
            .map_err(|e| ScreenerError::DecodeError(e.to_string()))?;
        Ok(crumb.trim().to_string())
    }

    /// Fetch the quote summary for one ticker.
    pub async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ScreenerError> {
        let ticker = normalize_ticker(ticker);
        let url = format!("{}/{}", SUMMARY_BASE_URL, ticker);

        let mut query = vec![("modules", MODULES.to_string())];
        if let Some(crumb) = self.crumb().await {
            query.push(("crumb", crumb));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ScreenerError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScreenerError::HttpStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ScreenerError::DecodeError(e.to_string()))?;
        parse_quote_summary(&ticker, &body)
    }
}

#[async_trait]
impl MarketDataSource for MarketDataClient {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ScreenerError> {
        self.fetch_snapshot(ticker).await
    }
}

/// Numeric field that may be wrapped as `{"raw": 1.5, "fmt": "1.50"}`.
fn number(module: &Value, field: &str) -> Option<f64> {
    let value = module.get(field)?;
    match value.get("raw") {
        Some(raw) => coerce_json(raw),
        None => coerce_json(value),
    }
}

fn text(module: &Value, field: &str) -> Option<String> {
    module
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Map a quote-summary payload to a snapshot.
pub fn parse_quote_summary(ticker: &str, body: &Value) -> Result<MarketSnapshot, ScreenerError> {
    let summary = &body["quoteSummary"];
    let result = summary["result"]
        .as_array()
        .and_then(|r| r.first())
        .ok_or_else(|| {
            let reason = summary["error"]["description"]
                .as_str()
                .unwrap_or("empty result");
            ScreenerError::InsufficientData(format!("{}: {}", ticker, reason))
        })?;

    let price = &result["price"];
    let detail = &result["summaryDetail"];
    let stats = &result["defaultKeyStatistics"];
    let profile = &result["assetProfile"];
    let financial = &result["financialData"];

    Ok(MarketSnapshot {
        ticker: normalize_ticker(ticker),
        name: text(price, "longName").or_else(|| text(price, "shortName")),
        sector: text(profile, "sector"),
        industry: text(profile, "industry"),
        price: number(financial, "currentPrice").or_else(|| number(price, "regularMarketPrice")),
        market_cap: number(detail, "marketCap").or_else(|| number(price, "marketCap")),
        trailing_pe: number(detail, "trailingPE"),
        forward_pe: number(detail, "forwardPE").or_else(|| number(stats, "forwardPE")),
        peg_ratio: number(stats, "pegRatio"),
        beta: number(detail, "beta").or_else(|| number(stats, "beta")),
    })
}
