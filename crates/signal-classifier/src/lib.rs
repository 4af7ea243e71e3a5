//! Signal Classifier
//!
//! Turns a watchlist snapshot, the revenue-screened set and optional analyst
//! research into one BUY / HOLD / SELL label per ticker.

pub mod analyst;
pub mod classifier;
pub mod research;
pub mod valuation;
pub mod watchlist;

pub use analyst::{analyst_bias, is_analyst_column, rating_score, ANALYST_PREFIXES, RATING_COLUMNS};
pub use classifier::{classify, Classification, ClassifierInput, Rule, Signals};
pub use research::merge_research;
pub use valuation::valuation_tier;
pub use watchlist::{classify_watchlist, rev_flag, signals_table, WatchlistSignals};
