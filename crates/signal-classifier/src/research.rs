//! Left join of external analyst research onto the screened table.

use screener_core::{normalize_ticker, Table};
use std::collections::HashMap;

pub const TICKER_COLUMN: &str = "ticker";

/// Left-join `research` onto `screened` by normalized ticker.
///
/// Every screened row is kept in order. Research columns are appended only
/// when the screened side has no column of that name. Unmatched research rows
/// are dropped; for a ticker listed twice the first research row is used.
pub fn merge_research(screened: &Table, research: Option<&Table>) -> Table {
    let Some(research) = research else {
        return screened.clone();
    };
    let Some(key_idx) = research.column_index(TICKER_COLUMN) else {
        tracing::warn!("Research table has no '{}' column; skipping merge", TICKER_COLUMN);
        return screened.clone();
    };

    let extra: Vec<(usize, &String)> = research
        .headers()
        .iter()
        .enumerate()
        .filter(|(i, name)| *i != key_idx && !screened.has_column(name))
        .collect();

    let mut by_ticker: HashMap<String, &[Option<String>]> = HashMap::new();
    for row in research.rows() {
        if let Some(ticker) = row.cells()[key_idx].as_deref() {
            by_ticker.entry(normalize_ticker(ticker)).or_insert(row.cells());
        }
    }

    let mut merged = Table::new(
        screened
            .headers()
            .iter()
            .cloned()
            .chain(extra.iter().map(|(_, name)| (*name).clone())),
    );

    for row in screened.rows() {
        let matched = row
            .get(TICKER_COLUMN)
            .and_then(|t| by_ticker.get(&normalize_ticker(t)));
        let mut cells = row.cells().to_vec();
        cells.extend(
            extra
                .iter()
                .map(|(i, _)| matched.and_then(|r| r[*i].clone())),
        );
        merged.push_row(cells);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    fn screened() -> Table {
        let mut t = Table::new(["ticker", "name", "Q1", "trailing_PE"]);
        t.push_row(vec![cell("AAA"), cell("Alpha"), cell("10.0"), cell("14.0")]);
        t.push_row(vec![cell("BBB"), cell("Beta"), cell("20.0"), None]);
        t
    }

    fn research() -> Table {
        let mut t = Table::new(["ticker", "zacks_rating_num", "name", "consensus_pt"]);
        t.push_row(vec![cell("aaa"), cell("2"), cell("Other Name"), cell("150")]);
        t.push_row(vec![cell("ZZZ"), cell("1"), cell("Zed"), cell("5")]);
        t.push_row(vec![cell("AAA"), cell("5"), None, None]);
        t
    }

    #[test]
    fn test_left_join_keeps_every_screened_row() {
        let merged = merge_research(&screened(), Some(&research()));
        assert_eq!(merged.len(), 2);
        let tickers = merged.column_values("ticker");
        assert_eq!(tickers, vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_screened_side_wins_on_collision() {
        let merged = merge_research(&screened(), Some(&research()));
        assert_eq!(
            merged.headers(),
            &["ticker", "name", "Q1", "trailing_PE", "zacks_rating_num", "consensus_pt"]
        );
        assert_eq!(merged.row(0).unwrap().get("name"), Some("Alpha"));
    }

    #[test]
    fn test_match_is_case_insensitive_and_first_row_wins() {
        let merged = merge_research(&screened(), Some(&research()));
        let aaa = merged.row(0).unwrap();
        assert_eq!(aaa.get("zacks_rating_num"), Some("2"));
        assert_eq!(aaa.get("consensus_pt"), Some("150"));
    }

    #[test]
    fn test_unmatched_row_keeps_original_cells() {
        let merged = merge_research(&screened(), Some(&research()));
        let bbb = merged.row(1).unwrap();
        assert_eq!(&bbb.cells()[..4], screened().row(1).unwrap().cells());
        assert_eq!(bbb.get("zacks_rating_num"), None);
        assert_eq!(bbb.get("consensus_pt"), None);
    }

    #[test]
    fn test_absent_research_is_identity() {
        assert_eq!(merge_research(&screened(), None), screened());
    }

    #[test]
    fn test_research_without_ticker_column_is_ignored() {
        let mut bad = Table::new(["symbol", "zacks_rating_num"]);
        bad.push_row(vec![cell("AAA"), cell("1")]);
        assert_eq!(merge_research(&screened(), Some(&bad)), screened());
    }
}
