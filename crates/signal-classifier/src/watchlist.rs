//! Watchlist signal assembly: revenue flag, analyst columns, bias and label
//! for every watchlist ticker.

use screener_core::{
    normalize_ticker, AnalystColumn, MarketSnapshot, RevFlag, Table, WatchlistEntry,
    SIGNAL_LEADING_COLUMNS,
};
use std::collections::{HashMap, HashSet};

use crate::analyst::{analyst_bias, is_analyst_column};
use crate::classifier::{classify, ClassifierInput};
use crate::research::TICKER_COLUMN;

pub const RECOMMENDATION_COLUMN: &str = "final_recommendation";

#[derive(Debug, Clone, Default)]
pub struct WatchlistSignals {
    pub entries: Vec<WatchlistEntry>,
    /// Analyst column names in research-table order.
    pub analyst_columns: Vec<String>,
}

pub fn rev_flag(ticker: &str, green: &HashSet<String>) -> RevFlag {
    if green.contains(&normalize_ticker(ticker)) {
        RevFlag::Green
    } else {
        RevFlag::Neutral
    }
}

/// Classify each snapshot in watchlist order against the research-merged
/// screened table.
pub fn classify_watchlist(snapshots: &[MarketSnapshot], screened: &Table) -> WatchlistSignals {
    tracing::info!(
        "Classifying {} watchlist tickers against {} screened companies",
        snapshots.len(),
        screened.len()
    );

    let green: HashSet<String> = screened
        .column_values(TICKER_COLUMN)
        .into_iter()
        .map(normalize_ticker)
        .collect();

    let analyst_columns: Vec<String> = screened
        .headers()
        .iter()
        .filter(|h| is_analyst_column(h))
        .cloned()
        .collect();

    // First screened row per ticker supplies the analyst columns.
    let mut analyst_rows: HashMap<String, Vec<AnalystColumn>> = HashMap::new();
    if !analyst_columns.is_empty() {
        for row in screened.rows() {
            let Some(ticker) = row.get(TICKER_COLUMN) else { continue };
            analyst_rows.entry(normalize_ticker(ticker)).or_insert_with(|| {
                analyst_columns
                    .iter()
                    .map(|name| AnalystColumn {
                        name: name.clone(),
                        value: row.get(name).map(str::to_string),
                    })
                    .collect()
            });
        }
    }

    let entries = snapshots
        .iter()
        .map(|snapshot| {
            let mut snapshot = snapshot.clone();
            snapshot.ticker = normalize_ticker(&snapshot.ticker);

            let flag = rev_flag(&snapshot.ticker, &green);
            let analyst = match analyst_rows.get(&snapshot.ticker) {
                Some(cols) => cols.clone(),
                None => analyst_columns
                    .iter()
                    .map(|name| AnalystColumn { name: name.clone(), value: None })
                    .collect(),
            };
            let bias = analyst_bias(
                analyst
                    .iter()
                    .map(|a| (a.name.as_str(), a.value.as_deref())),
            );

            let c = classify(&ClassifierInput {
                trailing_pe: snapshot.trailing_pe,
                forward_pe: snapshot.forward_pe,
                rev_flag: flag,
                sector: snapshot.sector.as_deref(),
                analyst_bias: bias,
            });
            tracing::info!(
                "{} -> {} ({})",
                snapshot.ticker,
                c.recommendation,
                c.rationale
            );

            WatchlistEntry {
                snapshot,
                rev_flag: flag,
                analyst,
                analyst_bias: bias,
                final_recommendation: c.recommendation,
                rationale: c.rationale.to_string(),
            }
        })
        .collect();

    WatchlistSignals {
        entries,
        analyst_columns,
    }
}

/// The signals table: snapshot columns, `rev_flag`, analyst columns, label.
pub fn signals_table(signals: &WatchlistSignals) -> Table {
    let mut table = Table::new(
        SIGNAL_LEADING_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(signals.analyst_columns.iter().cloned())
            .chain(std::iter::once(RECOMMENDATION_COLUMN.to_string())),
    );
    for entry in &signals.entries {
        table.push_row(entry.signal_cells(&signals.analyst_columns));
    }
    table
}
