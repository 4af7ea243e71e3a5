use async_trait::async_trait;
use crate::{CompanyFacts, CompanyRecord, MarketSnapshot, ScreenerError};

/// Filings registry: the ticker universe and per-company financial facts.
#[async_trait]
pub trait FilingsSource: Send + Sync {
    async fn company_tickers(&self) -> Result<Vec<CompanyRecord>, ScreenerError>;

    /// `cik` is the zero-padded 10 digit registry identifier.
    async fn company_facts(&self, cik: &str) -> Result<CompanyFacts, ScreenerError>;
}

/// Market-data provider returning one flat snapshot per ticker.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ScreenerError>;
}
