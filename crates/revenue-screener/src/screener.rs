//! Strict revenue-growth screen over the registry's company universe.

use screener_core::numeric::coerce_json;
use screener_core::{
    CompanyRecord, FilingsSource, QuarterlyRevenue, RevenueObservation, ScreenedCompany,
};
use std::sync::Arc;
use std::time::Duration;

use crate::extractor::extract_quarterly_revenue;

/// `Q1 > Q2 > Q3 > Q4` and `Q1 > Q4`.
///
/// The second clause follows from the first; both are evaluated.
pub fn passes_growth(revenue: &QuarterlyRevenue) -> bool {
    let QuarterlyRevenue { q1, q2, q3, q4 } = *revenue;
    (q1 > q2 && q2 > q3 && q3 > q4) && (q1 > q4)
}

/// Coerce four observations to numbers and apply the growth test.
///
/// Returns `None` when any value is not numeric; the company then counts as
/// having no data.
pub fn screen_observations(
    company: &CompanyRecord,
    observations: &[RevenueObservation; 4],
) -> Option<ScreenedCompany> {
    let [q1, q2, q3, q4] = [
        coerce_json(&observations[0].value)?,
        coerce_json(&observations[1].value)?,
        coerce_json(&observations[2].value)?,
        coerce_json(&observations[3].value)?,
    ];
    let revenue = QuarterlyRevenue::new(q1, q2, q3, q4);
    Some(ScreenedCompany {
        company: company.clone(),
        revenue,
        passes_growth: passes_growth(&revenue),
    })
}

#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Courtesy pause after every facts request.
    pub request_delay: Duration,
    /// Log progress every N companies.
    pub progress_every: usize,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            request_delay: Duration::from_millis(200),
            progress_every: 250,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreenStats {
    pub total: usize,
    pub fetch_failures: usize,
    pub no_data: usize,
    pub failed_growth: usize,
    pub passed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ScreenOutcome {
    /// Passing companies in universe order.
    pub passed: Vec<ScreenedCompany>,
    pub stats: ScreenStats,
}

pub struct RevenueScreener<S: ?Sized> {
    source: Arc<S>,
    config: ScreenConfig,
}

impl<S: FilingsSource + ?Sized> RevenueScreener<S> {
    pub fn new(source: Arc<S>, config: ScreenConfig) -> Self {
        Self { source, config }
    }

    /// Screen every company in order, one request at a time.
    ///
    /// A failed fetch, missing data or a non-numeric figure drops that company
    /// only; the batch always runs to the end.
    pub async fn screen(&self, universe: &[CompanyRecord]) -> ScreenOutcome {
        let total = universe.len();
        let mut outcome = ScreenOutcome {
            passed: Vec::new(),
            stats: ScreenStats { total, ..Default::default() },
        };

        if total == 0 {
            tracing::info!("No tickers to screen.");
            return outcome;
        }

        tracing::info!("Starting revenue growth screening of {} companies", total);

        for (idx, company) in universe.iter().enumerate() {
            if self.config.progress_every > 0 && idx % self.config.progress_every == 0 {
                tracing::info!("Progress: {}/{} tickers...", idx, total);
            }

            let facts = self.source.company_facts(&company.cik).await;
            if !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }

            let facts = match facts {
                Ok(facts) => facts,
                Err(e) => {
                    tracing::debug!("{} ({}): no facts: {}", company.ticker, company.cik, e);
                    outcome.stats.fetch_failures += 1;
                    continue;
                }
            };

            let screened = extract_quarterly_revenue(&facts)
                .and_then(|obs| screen_observations(company, &obs));

            match screened {
                None => outcome.stats.no_data += 1,
                Some(s) if s.passes_growth => {
                    tracing::info!(
                        "PASS: {} -> Q1={:.2}, Q4={:.2}",
                        company.ticker,
                        s.revenue.q1,
                        s.revenue.q4
                    );
                    outcome.stats.passed += 1;
                    outcome.passed.push(s);
                }
                Some(_) => outcome.stats.failed_growth += 1,
            }
        }

        tracing::info!(
            "Revenue screening complete: {} passed, {} failed growth, {} no data, {} fetch failures",
            outcome.stats.passed,
            outcome.stats.failed_growth,
            outcome.stats.no_data,
            outcome.stats.fetch_failures
        );
        outcome
    }
}
