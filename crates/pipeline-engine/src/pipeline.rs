//! End-to-end run: ticker universe, revenue screen, market enrichment,
//! research merge, watchlist snapshot and classification.
//!
//! Every stage persists its table as soon as it finishes, so an interrupted
//! run keeps the files of the stages that completed.

use anyhow::{anyhow, Context};
use output_store::{
    OutputStore, ALL_TICKERS, EXTERNAL_RESEARCH, FINAL_WITH_RESEARCH, REVENUE_SCREENED,
    SCREENED_WITH_PE, WATCHLIST_SIGNALS, WATCHLIST_SNAPSHOT,
};
use revenue_screener::{RevenueScreener, ScreenConfig, ScreenOutcome, ScreenStats};
use screener_core::{
    CompanyRecord, FilingsSource, MarketDataSource, MarketSnapshot, PricedCompany, Recommendation,
    ScreenedCompany, Table,
};
use signal_classifier::{classify_watchlist, merge_research, signals_table, WatchlistSignals};
use std::sync::Arc;

use crate::config::{EngineConfig, RunMode};

const SCREEN_PROGRESS_EVERY: usize = 250;
const MARKET_PROGRESS_EVERY: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Universe size after `max_tickers` truncation; zero for watchlist-only runs.
    pub tickers: usize,
    pub screen: ScreenStats,
    pub final_rows: usize,
    pub watchlist: usize,
    pub buy: usize,
    pub hold: usize,
    pub sell: usize,
}

impl RunSummary {
    fn count_signals(&mut self, signals: &WatchlistSignals) {
        self.watchlist = signals.entries.len();
        for entry in &signals.entries {
            match entry.final_recommendation {
                Recommendation::Buy => self.buy += 1,
                Recommendation::Hold => self.hold += 1,
                Recommendation::Sell => self.sell += 1,
            }
        }
    }
}

pub struct Pipeline<F: ?Sized, M: ?Sized> {
    filings: Option<Arc<F>>,
    market: Arc<M>,
    store: OutputStore,
    config: EngineConfig,
}

impl<F, M> Pipeline<F, M>
where
    F: FilingsSource + ?Sized,
    M: MarketDataSource + ?Sized,
{
    /// `filings` may be absent for watchlist-only runs; the registry stages
    /// fail without it.
    pub fn new(
        filings: Option<Arc<F>>,
        market: Arc<M>,
        store: OutputStore,
        config: EngineConfig,
    ) -> Self {
        Self {
            filings,
            market,
            store,
            config,
        }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    fn filings(&self) -> anyhow::Result<&Arc<F>> {
        self.filings
            .as_ref()
            .ok_or_else(|| anyhow!("no filings registry client configured (set SEC_USER_AGENT)"))
    }

    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        match self.config.mode {
            RunMode::Full => self.run_full().await,
            RunMode::WatchlistOnly => self.run_watchlist_only().await,
        }
    }

    async fn run_full(&self) -> anyhow::Result<RunSummary> {
        tracing::info!("=========== SEC + MARKET DATA ENGINE STARTED ===========");

        let universe = self.download_tickers().await?;
        let outcome = self.screen(&universe).await?;
        let enriched = self.add_market_data(&outcome.passed).await?;
        let final_table = self.merge_external_research(&enriched)?;
        let snapshots = self.watchlist_snapshot().await?;
        let signals = self.classify(&snapshots, &final_table)?;

        let mut summary = RunSummary {
            tickers: universe.len(),
            screen: outcome.stats,
            final_rows: final_table.len(),
            ..Default::default()
        };
        summary.count_signals(&signals);

        tracing::info!("=========== ENGINE COMPLETED SUCCESSFULLY ===========");
        Ok(summary)
    }

    /// Reuse the persisted research-merged table and refresh the watchlist.
    async fn run_watchlist_only(&self) -> anyhow::Result<RunSummary> {
        let final_table = self
            .store
            .read_table(FINAL_WITH_RESEARCH)?
            .ok_or_else(|| {
                anyhow!(
                    "{} not found; run the full pipeline first",
                    self.store.path(FINAL_WITH_RESEARCH).display()
                )
            })?;
        tracing::info!(
            "Loaded {} screened companies from {}",
            final_table.len(),
            FINAL_WITH_RESEARCH
        );

        let snapshots = self.watchlist_snapshot().await?;
        let signals = self.classify(&snapshots, &final_table)?;

        let mut summary = RunSummary {
            final_rows: final_table.len(),
            ..Default::default()
        };
        summary.count_signals(&signals);
        Ok(summary)
    }

    /// The only upstream failure that aborts a run.
    pub async fn download_tickers(&self) -> anyhow::Result<Vec<CompanyRecord>> {
        let mut universe = self
            .filings()?
            .company_tickers()
            .await
            .context("failed to download the master ticker list")?;

        if let Some(max) = self.config.max_tickers {
            if universe.len() > max {
                tracing::info!("Limiting universe to the first {} of {} tickers", max, universe.len());
                universe.truncate(max);
            }
        }

        self.store.write_records(ALL_TICKERS, &universe)?;
        Ok(universe)
    }

    pub async fn screen(&self, universe: &[CompanyRecord]) -> anyhow::Result<ScreenOutcome> {
        let screener = RevenueScreener::new(
            Arc::clone(self.filings()?),
            ScreenConfig {
                request_delay: self.config.sec_request_delay,
                progress_every: SCREEN_PROGRESS_EVERY,
            },
        );
        let outcome = screener.screen(universe).await;
        self.store.write_records(REVENUE_SCREENED, &outcome.passed)?;
        Ok(outcome)
    }

    /// Price, market cap and trailing P/E for each passing company.
    ///
    /// An empty screened set skips the stage and its file; the plain screened
    /// table is passed on instead.
    pub async fn add_market_data(&self, screened: &[ScreenedCompany]) -> anyhow::Result<Table> {
        if screened.is_empty() {
            tracing::info!("No screened companies, skipping market data.");
            return Ok(Table::from_records(screened));
        }

        let total = screened.len();
        tracing::info!("Adding market data for {} screened tickers...", total);

        let mut priced = Vec::with_capacity(total);
        for (idx, company) in screened.iter().enumerate() {
            if idx % MARKET_PROGRESS_EVERY == 0 {
                tracing::info!("Progress: {}/{} tickers", idx, total);
            }
            let snapshot = self.fetch_snapshot(&company.company.ticker).await;
            priced.push(PricedCompany::new(company.clone(), &snapshot));
        }

        let table = Table::from_records(&priced);
        self.store.write_table(SCREENED_WITH_PE, &table)?;
        Ok(table)
    }

    pub fn merge_external_research(&self, screened: &Table) -> anyhow::Result<Table> {
        let research = self.store.read_table(EXTERNAL_RESEARCH)?;
        match &research {
            Some(r) => tracing::info!("{} found, merging {} research rows", EXTERNAL_RESEARCH, r.len()),
            None => tracing::info!("{} not found, skipping merge", EXTERNAL_RESEARCH),
        }

        let merged = merge_research(screened, research.as_ref());
        self.store.write_table(FINAL_WITH_RESEARCH, &merged)?;
        Ok(merged)
    }

    pub async fn watchlist_snapshot(&self) -> anyhow::Result<Vec<MarketSnapshot>> {
        tracing::info!("Fetching snapshot for {} watchlist tickers", self.config.watchlist.len());

        let mut snapshots = Vec::with_capacity(self.config.watchlist.len());
        for ticker in &self.config.watchlist {
            snapshots.push(self.fetch_snapshot(ticker).await);
        }

        self.store.write_records(WATCHLIST_SNAPSHOT, &snapshots)?;
        Ok(snapshots)
    }

    pub fn classify(&self, snapshots: &[MarketSnapshot], screened: &Table) -> anyhow::Result<WatchlistSignals> {
        let signals = classify_watchlist(snapshots, screened);
        self.store.write_table(WATCHLIST_SIGNALS, &signals_table(&signals))?;
        Ok(signals)
    }

    /// One attempt, then the courtesy delay; failures become an all-unknown
    /// snapshot.
    async fn fetch_snapshot(&self, ticker: &str) -> MarketSnapshot {
        let result = self.market.snapshot(ticker).await;
        if !self.config.market_request_delay.is_zero() {
            tokio::time::sleep(self.config.market_request_delay).await;
        }
        match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!("{}: market data unavailable: {}", ticker, e);
                MarketSnapshot::unknown(ticker)
            }
        }
    }
}
