use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::numeric::format_opt;
use crate::table::TableRecord;

/// Canonical join key: trimmed, upper-case ticker.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Registry identifiers are zero-padded to 10 digits.
pub fn format_cik(raw: u64) -> String {
    format!("{:010}", raw)
}

/// A listed company from the registry's master ticker list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub cik: String,
    pub ticker: String,
    pub name: String,
}

impl CompanyRecord {
    pub fn new(cik: impl Into<String>, ticker: &str, name: impl Into<String>) -> Self {
        Self {
            cik: cik.into(),
            ticker: normalize_ticker(ticker),
            name: name.into(),
        }
    }
}

impl TableRecord for CompanyRecord {
    fn headers() -> &'static [&'static str] {
        &["cik", "ticker", "name"]
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.cik.clone()),
            Some(self.ticker.clone()),
            Some(self.name.clone()),
        ]
    }
}

/// Filing form types accepted as revenue sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingForm {
    /// 10-Q
    Quarterly,
    /// 10-K
    Annual,
}

impl FilingForm {
    pub fn from_form(form: &str) -> Option<Self> {
        match form {
            "10-Q" => Some(FilingForm::Quarterly),
            "10-K" => Some(FilingForm::Annual),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FilingForm::Quarterly => "10-Q",
            FilingForm::Annual => "10-K",
        }
    }
}

/// One dated revenue figure. The value is kept as reported so that a
/// non-numeric figure can exclude the company later instead of failing here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueObservation {
    pub period_end: NaiveDate,
    pub form: FilingForm,
    pub value: Value,
}

/// Four quarters of revenue, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyRevenue {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
}

impl QuarterlyRevenue {
    pub fn new(q1: f64, q2: f64, q3: f64, q4: f64) -> Self {
        Self { q1, q2, q3, q4 }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.q1, self.q2, self.q3, self.q4]
    }
}

/// A company with its four latest revenue quarters and the growth verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedCompany {
    pub company: CompanyRecord,
    pub revenue: QuarterlyRevenue,
    pub passes_growth: bool,
}

impl TableRecord for ScreenedCompany {
    fn headers() -> &'static [&'static str] {
        &["ticker", "cik", "name", "Q1", "Q2", "Q3", "Q4"]
    }

    fn cells(&self) -> Vec<Option<String>> {
        let mut cells = vec![
            Some(self.company.ticker.clone()),
            Some(self.company.cik.clone()),
            Some(self.company.name.clone()),
        ];
        cells.extend(self.revenue.as_array().iter().map(|q| format_opt(Some(*q))));
        cells
    }
}

/// A screened company enriched with price, market cap and trailing P/E
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedCompany {
    pub screened: ScreenedCompany,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
}

impl PricedCompany {
    pub fn new(screened: ScreenedCompany, snapshot: &MarketSnapshot) -> Self {
        Self {
            screened,
            price: snapshot.price,
            market_cap: snapshot.market_cap,
            trailing_pe: snapshot.trailing_pe,
        }
    }
}

impl TableRecord for PricedCompany {
    fn headers() -> &'static [&'static str] {
        &[
            "ticker", "cik", "name", "Q1", "Q2", "Q3", "Q4",
            "price", "market_cap", "trailing_PE",
        ]
    }

    fn cells(&self) -> Vec<Option<String>> {
        let mut cells = self.screened.cells();
        cells.push(format_opt(self.price));
        cells.push(format_opt(self.market_cap));
        cells.push(format_opt(self.trailing_pe));
        cells
    }
}

/// Per-ticker quote and valuation facts. Any field may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub beta: Option<f64>,
}

impl MarketSnapshot {
    /// Snapshot with every field unknown, used when the provider has nothing.
    pub fn unknown(ticker: &str) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            ..Default::default()
        }
    }
}

impl TableRecord for MarketSnapshot {
    fn headers() -> &'static [&'static str] {
        &[
            "ticker", "name", "sector", "industry", "price", "market_cap",
            "trailing_PE", "forward_PE", "peg_ratio", "beta",
        ]
    }

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.ticker.clone()),
            self.name.clone(),
            self.sector.clone(),
            self.industry.clone(),
            format_opt(self.price),
            format_opt(self.market_cap),
            format_opt(self.trailing_pe),
            format_opt(self.forward_pe),
            format_opt(self.peg_ratio),
            format_opt(self.beta),
        ]
    }
}

/// Whether a watchlist ticker passed the revenue-growth screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevFlag {
    Green,
    Neutral,
}

impl RevFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevFlag::Green => "green",
            RevFlag::Neutral => "neutral",
        }
    }

    pub fn is_green(&self) -> bool {
        matches!(self, RevFlag::Green)
    }
}

/// Discretized trailing P/E
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationTier {
    Unknown,
    Cheap,
    Reasonable,
    Expensive,
    VeryExpensive,
}

impl ValuationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationTier::Unknown => "unknown",
            ValuationTier::Cheap => "cheap",
            ValuationTier::Reasonable => "reasonable",
            ValuationTier::Expensive => "expensive",
            ValuationTier::VeryExpensive => "very_expensive",
        }
    }
}

/// Final watchlist label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named analyst column carried onto a watchlist row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystColumn {
    pub name: String,
    pub value: Option<String>,
}

/// Terminal row shown on the dashboard: snapshot, revenue flag, analyst
/// columns and the classifier's label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub snapshot: MarketSnapshot,
    pub rev_flag: RevFlag,
    pub analyst: Vec<AnalystColumn>,
    pub analyst_bias: f64,
    pub final_recommendation: Recommendation,
    pub rationale: String,
}

/// Fixed leading columns of the signals table; analyst columns follow `beta`.
pub const SIGNAL_LEADING_COLUMNS: [&str; 9] = [
    "ticker", "name", "sector", "industry", "price",
    "trailing_PE", "forward_PE", "beta", "rev_flag",
];

impl WatchlistEntry {
    /// Cells in signals-table order for the given analyst column layout.
    pub fn signal_cells(&self, analyst_columns: &[String]) -> Vec<Option<String>> {
        let s = &self.snapshot;
        let mut cells = vec![
            Some(s.ticker.clone()),
            s.name.clone(),
            s.sector.clone(),
            s.industry.clone(),
            format_opt(s.price),
            format_opt(s.trailing_pe),
            format_opt(s.forward_pe),
            format_opt(s.beta),
            Some(self.rev_flag.as_str().to_string()),
        ];
        for column in analyst_columns {
            let value = self
                .analyst
                .iter()
                .find(|a| &a.name == column)
                .and_then(|a| a.value.clone());
            cells.push(value);
        }
        cells.push(Some(self.final_recommendation.as_str().to_string()));
        cells
    }
}
