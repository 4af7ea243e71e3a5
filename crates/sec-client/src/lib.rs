use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use reqwest::Client;
use screener_core::{
    format_cik, CompanyFacts, CompanyRecord, FactConcept, FilingsSource, ScreenerError,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";
const FACTS_BASE_URL: &str = "https://data.sec.gov/api/xbrl/companyfacts";

/// Client for the registry's master ticker list and XBRL company facts.
#[derive(Clone)]
///
/// Requests are not throttled here; callers pace themselves (the screen sleeps
/// a courtesy delay after every request).
pub struct SecClient {
    client: Client,
}

impl SecClient {
    /// `user_agent` must identify the caller (the registry rejects anonymous
    /// clients); `timeout` applies to each request.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScreenerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ScreenerError::InvalidData(format!("user agent: {}", e)))?,
        );
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ScreenerError::ApiError(e.to_string()))?;

        Ok(Self { client })
    }

    /// Single attempt; any non-2xx status is an error.
    async fn get_json(&self, url: &str) -> Result<Value, ScreenerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScreenerError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScreenerError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ScreenerError::DecodeError(e.to_string()))
    }

    /// Download the master ticker list, in registry order.
    pub async fn download_tickers(&self) -> Result<Vec<CompanyRecord>, ScreenerError> {
        tracing::info!("Downloading SEC master ticker list from company_tickers.json...");
        let body = self.get_json(TICKERS_URL).await?;
        let companies = parse_ticker_list(body)?;
        tracing::info!("Fetched {} tickers", companies.len());
        Ok(companies)
    }

    /// Fetch the `us-gaap` facts for one company.
    pub async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFacts, ScreenerError> {
        let url = format!("{}/CIK{}.json", FACTS_BASE_URL, cik);
        let body = self.get_json(&url).await?;
        parse_company_facts(body)
    }
}

#[async_trait]
impl FilingsSource for SecClient {
    async fn company_tickers(&self) -> Result<Vec<CompanyRecord>, ScreenerError> {
        self.download_tickers().await
    }

    async fn company_facts(&self, cik: &str) -> Result<CompanyFacts, ScreenerError> {
        self.fetch_company_facts(cik).await
    }
}

// Ticker list: {"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}
#[derive(Debug, Deserialize)]
struct TickerListEntry {
    cik_str: u64,
    ticker: String,
    title: String,
}

/// Parse the master list. Malformed entries are skipped; order follows the
/// numeric keys.
pub fn parse_ticker_list(body: Value) -> Result<Vec<CompanyRecord>, ScreenerError> {
    let Value::Object(map) = body else {
        return Err(ScreenerError::DecodeError(
            "ticker list is not a JSON object".to_string(),
        ));
    };

    let mut keyed: Vec<(u64, CompanyRecord)> = map
        .into_iter()
        .filter_map(|(key, entry)| {
            let index = key.parse::<u64>().ok()?;
            let entry: TickerListEntry = serde_json::from_value(entry).ok()?;
            Some((
                index,
                CompanyRecord::new(format_cik(entry.cik_str), &entry.ticker, entry.title),
            ))
        })
        .collect();
    keyed.sort_by_key(|(index, _)| *index);

    Ok(keyed.into_iter().map(|(_, c)| c).collect())
}

// Company facts: {"cik": ..., "entityName": ..., "facts": {"us-gaap": {...}, "dei": {...}}}
#[derive(Debug, Deserialize)]
struct CompanyFactsResponse {
    #[serde(default)]
    facts: FactNamespaces,
}

#[derive(Debug, Default, Deserialize)]
struct FactNamespaces {
    #[serde(rename = "us-gaap", default)]
    us_gaap: HashMap<String, FactConcept>,
}

pub fn parse_company_facts(body: Value) -> Result<CompanyFacts, ScreenerError> {
    let response: CompanyFactsResponse =
        serde_json::from_value(body).map_err(|e| ScreenerError::DecodeError(e.to_string()))?;
    Ok(CompanyFacts {
        concepts: response.facts.us_gaap,
    })
}
