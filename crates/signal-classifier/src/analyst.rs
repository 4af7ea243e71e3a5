//! Analyst rating columns and the signed bias derived from them.

use screener_core::numeric::parse_f64;

/// Research columns with these prefixes are carried onto the watchlist.
pub const ANALYST_PREFIXES: [&str; 5] = ["zacks_", "bloomberg_", "jpm_", "ms_", "consensus_"];

/// Rating columns on a 1 (strong buy) to 5 (strong sell) scale that feed the bias.
pub const RATING_COLUMNS: [&str; 3] = [
    "zacks_rating_num",
    "bloomberg_rating_num",
    "consensus_rating_num",
];

pub fn is_analyst_column(name: &str) -> bool {
    ANALYST_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Map a 1..5 rating to +1.0..-1.0 (3 is neutral).
pub fn rating_score(rating: f64) -> f64 {
    (3.0 - rating) / 2.0
}

/// Mean score over the recognised rating columns that hold a number.
///
/// Unknown, missing and non-numeric columns are skipped. No usable column
/// gives 0.0.
pub fn analyst_bias<'a, I>(columns: I) -> f64
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let scores: Vec<f64> = columns
        .into_iter()
        .filter(|(name, _)| RATING_COLUMNS.iter().any(|c| *c == *name))
        .filter_map(|(_, value)| value.and_then(parse_f64))
        .map(rating_score)
        .collect();

    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}
