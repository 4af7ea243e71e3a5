//! Revenue Screener
//!
//! Pulls the latest four revenue quarters out of a company's registry facts
//! and keeps the companies whose revenue rose strictly quarter over quarter.

pub mod extractor;
pub mod screener;

pub use extractor::{extract_quarterly_revenue, REVENUE_TAGS};
pub use screener::{passes_growth, screen_observations, RevenueScreener, ScreenConfig, ScreenOutcome, ScreenStats};
