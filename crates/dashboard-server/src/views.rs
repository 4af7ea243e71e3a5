//! Table views behind the dashboard endpoints: derived revenue-trend
//! columns, filters and small aggregates.

use output_store::{
    OutputStore, StoreError, FINAL_WITH_RESEARCH, REVENUE_SCREENED, SCREENED_WITH_PE,
    WATCHLIST_SIGNALS, WATCHLIST_SNAPSHOT,
};
use screener_core::{normalize_ticker, RowRef, Table};
use serde::{Deserialize, Serialize};
use signal_classifier::merge_research;
use std::collections::{BTreeSet, HashMap};

pub const QOQ_COLUMN: &str = "QoQ_strict_up";
pub const YOY_COLUMN: &str = "YoY_up";
pub const REV_SCORE_COLUMN: &str = "RevScore";

const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

/// Every persisted table; `None` where the file does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub revenue: Option<Table>,
    pub with_pe: Option<Table>,
    pub final_research: Option<Table>,
    pub watchlist: Option<Table>,
    pub signals: Option<Table>,
}

impl Tables {
    pub fn load(store: &OutputStore) -> Result<Self, StoreError> {
        Ok(Self {
            revenue: store.read_table(REVENUE_SCREENED)?,
            with_pe: store.read_table(SCREENED_WITH_PE)?,
            final_research: store.read_table(FINAL_WITH_RESEARCH)?,
            watchlist: store.read_table(WATCHLIST_SNAPSHOT)?,
            signals: store.read_table(WATCHLIST_SIGNALS)?,
        })
    }

    /// The priced table when present, else the plain screened one, with the
    /// revenue-trend columns and any research columns joined on.
    pub fn screened(&self) -> Option<Table> {
        let base = self.with_pe.as_ref().or(self.revenue.as_ref())?;
        let derived = add_revenue_signals(base);
        Some(merge_research(&derived, self.final_research.as_ref()))
    }
}

fn quarters(row: &RowRef<'_>) -> [Option<f64>; 4] {
    QUARTERS.map(|q| row.get_f64(q))
}

/// `(QoQ_strict_up, YoY_up)`; an unknown quarter makes a flag false.
pub fn revenue_trend(q: [Option<f64>; 4]) -> (bool, bool) {
    match q {
        [Some(q1), Some(q2), Some(q3), Some(q4)] => (q1 > q2 && q2 > q3 && q3 > q4, q1 > q4),
        [Some(q1), _, _, Some(q4)] => (false, q1 > q4),
        _ => (false, false),
    }
}

pub fn rev_score(qoq: bool, yoy: bool) -> u8 {
    2 * qoq as u8 + yoy as u8
}

/// Append `QoQ_strict_up`, `YoY_up` and `RevScore`. Tables without all four
/// quarter columns come back unchanged.
pub fn add_revenue_signals(table: &Table) -> Table {
    let mut out = table.clone();
    if !QUARTERS.iter().all(|q| table.has_column(q)) {
        return out;
    }

    let trends: Vec<(bool, bool)> = table.rows().map(|r| revenue_trend(quarters(&r))).collect();
    out.push_column(QOQ_COLUMN, trends.iter().map(|(q, _)| Some(q.to_string())).collect());
    out.push_column(YOY_COLUMN, trends.iter().map(|(_, y)| Some(y.to_string())).collect());
    out.push_column(
        REV_SCORE_COLUMN,
        trends.iter().map(|(q, y)| Some(rev_score(*q, *y).to_string())).collect(),
    );
    out
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScreenedFilter {
    pub min_pe: Option<f64>,
    pub max_pe: Option<f64>,
    #[serde(default)]
    pub only_qoq: bool,
    #[serde(default)]
    pub only_yoy: bool,
}

/// Rows with an unknown trailing P/E always pass the P/E range.
pub fn filter_screened(table: &Table, f: &ScreenedFilter) -> Table {
    table.filter(|row| {
        let pe_ok = match row.get_f64("trailing_PE") {
            None => true,
            Some(pe) => {
                f.min_pe.map_or(true, |min| pe >= min) && f.max_pe.map_or(true, |max| pe <= max)
            }
        };
        let (qoq, yoy) = revenue_trend(quarters(row));
        pe_ok && (!f.only_qoq || qoq) && (!f.only_yoy || yoy)
    })
}

/// Comma separated query list; blanks are dropped.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Keep rows whose `column` equals one of `allowed` (case-insensitive). An
/// empty `allowed` keeps everything.
pub fn filter_in(table: &Table, column: &str, allowed: &[String]) -> Table {
    if allowed.is_empty() {
        return table.clone();
    }
    table.filter(|row| {
        row.get(column)
            .is_some_and(|v| allowed.iter().any(|a| a.eq_ignore_ascii_case(v)))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub value: String,
    pub count: usize,
}

/// Occurrences of each known value, most frequent first, ties by name.
pub fn value_counts(table: &Table, column: &str) -> Vec<CountEntry> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in table.column_values(column) {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<CountEntry> = counts
        .into_iter()
        .map(|(value, count)| CountEntry {
            value: value.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    out
}

/// Mean of the numeric cells in `column`.
pub fn mean(table: &Table, column: &str) -> Option<f64> {
    let values: Vec<f64> = table.rows().filter_map(|r| r.get_f64(column)).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sorted unique tickers of the signals table, else of the screened table.
pub fn ticker_list(signals: Option<&Table>, screened: Option<&Table>) -> Vec<String> {
    let source = signals.or(screened);
    source
        .map(|t| {
            t.column_values("ticker")
                .into_iter()
                .map(normalize_ticker)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        })
        .unwrap_or_default()
}

pub fn find_ticker<'a>(table: &'a Table, ticker: &str) -> Option<RowRef<'a>> {
    let ticker = normalize_ticker(ticker);
    table
        .rows()
        .find(|r| r.get("ticker").is_some_and(|t| normalize_ticker(t) == ticker))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueBar {
    pub quarter: &'static str,
    pub revenue: Option<f64>,
}

/// Oldest quarter first (Q4, Q3, Q2, Q1); empty when the table has no
/// quarter columns.
pub fn revenue_bars(table: &Table, row: &RowRef<'_>) -> Vec<RevenueBar> {
    if !QUARTERS.iter().all(|q| table.has_column(q)) {
        return Vec::new();
    }
    QUARTERS
        .iter()
        .rev()
        .map(|q| RevenueBar {
            quarter: *q,
            revenue: row.get_f64(q),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn screened() -> Table {
        let mut t = Table::new(["ticker", "name", "Q1", "Q2", "Q3", "Q4", "trailing_PE"]);
        t.push_row(vec![cell("AAA"), cell("A"), cell("40"), cell("30"), cell("20"), cell("10"), cell("15")]);
        t.push_row(vec![cell("BBB"), cell("B"), cell("100"), cell("90"), cell("95"), cell("80"), None]);
        t.push_row(vec![cell("CCC"), cell("C"), cell("5"), cell("6"), cell("7"), cell("8"), cell("60")]);
        t
    }

    #[test]
    fn test_revenue_trend() {
        assert_eq!(revenue_trend([Some(4.0), Some(3.0), Some(2.0), Some(1.0)]), (true, true));
        assert_eq!(revenue_trend([Some(100.0), Some(90.0), Some(95.0), Some(80.0)]), (false, true));
        assert_eq!(revenue_trend([Some(4.0), None, Some(2.0), Some(1.0)]), (false, true));
        assert_eq!(revenue_trend([None, Some(3.0), Some(2.0), Some(1.0)]), (false, false));
    }

    #[test]
    fn test_rev_score() {
        assert_eq!(rev_score(true, true), 3);
        assert_eq!(rev_score(false, true), 1);
        assert_eq!(rev_score(false, false), 0);
    }

    #[test]
    fn test_add_revenue_signals() {
        let t = add_revenue_signals(&screened());
        assert_eq!(t.row(0).unwrap().get(QOQ_COLUMN), Some("true"));
        assert_eq!(t.row(0).unwrap().get(REV_SCORE_COLUMN), Some("3"));
        assert_eq!(t.row(1).unwrap().get(YOY_COLUMN), Some("true"));
        assert_eq!(t.row(1).unwrap().get(REV_SCORE_COLUMN), Some("1"));
        assert_eq!(t.row(2).unwrap().get(REV_SCORE_COLUMN), Some("0"));

        let plain = Table::new(["ticker"]);
        assert_eq!(add_revenue_signals(&plain).headers(), plain.headers());
    }

    #[test]
    fn test_unknown_pe_always_passes_range() {
        let f = ScreenedFilter { min_pe: Some(10.0), max_pe: Some(20.0), ..Default::default() };
        let t = filter_screened(&screened(), &f);
        assert_eq!(t.column_values("ticker"), vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_trend_filters() {
        let qoq = ScreenedFilter { only_qoq: true, ..Default::default() };
        assert_eq!(filter_screened(&screened(), &qoq).column_values("ticker"), vec!["AAA"]);
        let yoy = ScreenedFilter { only_yoy: true, ..Default::default() };
        assert_eq!(filter_screened(&screened(), &yoy).column_values("ticker"), vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_parse_list_and_filter_in() {
        assert_eq!(parse_list(Some(" BUY, ,hold")), vec!["BUY", "hold"]);
        assert!(parse_list(None).is_empty());

        let mut t = Table::new(["ticker", "final_recommendation"]);
        t.push_row(vec![cell("A"), cell("BUY")]);
        t.push_row(vec![cell("B"), cell("SELL")]);
        t.push_row(vec![cell("C"), None]);
        let kept = filter_in(&t, "final_recommendation", &parse_list(Some("buy,hold")));
        assert_eq!(kept.column_values("ticker"), vec!["A"]);
        assert_eq!(filter_in(&t, "final_recommendation", &[]).len(), 3);
    }

    #[test]
    fn test_value_counts_and_mean() {
        let mut t = Table::new(["sector", "trailing_PE"]);
        t.push_row(vec![cell("Energy"), cell("10")]);
        t.push_row(vec![cell("Technology"), None]);
        t.push_row(vec![cell("Technology"), cell("30")]);
        t.push_row(vec![None, cell("bad")]);
        assert_eq!(
            value_counts(&t, "sector"),
            vec![
                CountEntry { value: "Technology".into(), count: 2 },
                CountEntry { value: "Energy".into(), count: 1 },
            ]
        );
        assert_eq!(mean(&t, "trailing_PE"), Some(20.0));
        assert_eq!(mean(&Table::new(["trailing_PE"]), "trailing_PE"), None);
    }

    #[test]
    fn test_ticker_list_prefers_signals() {
        let mut signals = Table::new(["ticker"]);
        signals.push_row(vec![cell("nvda")]);
        signals.push_row(vec![cell("AMD")]);
        signals.push_row(vec![cell("NVDA")]);
        assert_eq!(ticker_list(Some(&signals), Some(&screened())), vec!["AMD", "NVDA"]);
        assert_eq!(ticker_list(None, Some(&screened())), vec!["AAA", "BBB", "CCC"]);
        assert!(ticker_list(None, None).is_empty());
    }

    #[test]
    fn test_revenue_bars_oldest_first() {
        let t = screened();
        let row = find_ticker(&t, "aaa").unwrap();
        let bars = revenue_bars(&t, &row);
        let quarters: Vec<&str> = bars.iter().map(|b| b.quarter).collect();
        assert_eq!(quarters, vec!["Q4", "Q3", "Q2", "Q1"]);
        assert_eq!(bars[0].revenue, Some(10.0));
        assert_eq!(bars[3].revenue, Some(40.0));
    }

    #[test]
    fn test_screened_view_joins_research_extras() {
        let mut final_research = screened();
        final_research.push_column("zacks_rating_num", vec![cell("1"), None, cell("4")]);
        let tables = Tables {
            revenue: Some(screened()),
            final_research: Some(final_research),
            ..Default::default()
        };
        let view = tables.screened().unwrap();
        assert!(view.has_column(REV_SCORE_COLUMN));
        assert_eq!(view.row(0).unwrap().get("zacks_rating_num"), Some("1"));
        assert_eq!(view.len(), 3);
        assert!(Tables::default().screened().is_none());
    }
}
