//! pipeline-engine: registry download, revenue screen, market enrichment,
//! research merge, watchlist snapshot and classification, persisted stage by
//! stage to the output directory.

pub mod config;
pub mod pipeline;

pub use config::{EngineConfig, RunMode, DEFAULT_WATCHLIST};
pub use pipeline::{Pipeline, RunSummary};
