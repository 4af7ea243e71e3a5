//! CSV persistence for every pipeline table.
//!
//! All tables live side by side in one output directory. Unknown values are
//! written as empty cells and read back as unknown.

use screener_core::{Table, TableRecord};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ALL_TICKERS: &str = "sec_all_tickers.csv";
pub const REVENUE_SCREENED: &str = "sec_revenue_screened.csv";
pub const SCREENED_WITH_PE: &str = "sec_revenue_screened_with_pe.csv";
pub const FINAL_WITH_RESEARCH: &str = "final_screened_with_research.csv";
pub const WATCHLIST_SNAPSHOT: &str = "watchlist_snapshot.csv";
pub const WATCHLIST_SIGNALS: &str = "watchlist_signals.csv";
/// Optional input placed in the output directory by the user.
pub const EXTERNAL_RESEARCH: &str = "external_research.csv";

/// Tables the dashboard reports on, in display order.
pub const DASHBOARD_TABLES: [&str; 5] = [
    REVENUE_SCREENED,
    SCREENED_WITH_PE,
    FINAL_WITH_RESEARCH,
    WATCHLIST_SNAPSHOT,
    WATCHLIST_SIGNALS,
];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Open the output directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Read-only handle; the directory is not created.
    pub fn existing(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    pub fn write_table(&self, name: &str, table: &Table) -> Result<PathBuf, StoreError> {
        let path = self.path(name);
        write_csv(&path, table)?;
        tracing::info!("Saved {} rows to {}", table.len(), path.display());
        Ok(path)
    }

    pub fn write_records<T: TableRecord>(&self, name: &str, records: &[T]) -> Result<PathBuf, StoreError> {
        self.write_table(name, &Table::from_records(records))
    }

    /// Load a table, or `None` if the file does not exist.
    pub fn read_table(&self, name: &str) -> Result<Option<Table>, StoreError> {
        let path = self.path(name);
        if !path.is_file() {
            return Ok(None);
        }
        read_csv(&path).map(Some)
    }
}

pub fn write_csv(path: &Path, table: &Table) -> Result<(), StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer.write_record(table.headers()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.cells().iter().map(|c| c.as_deref().unwrap_or("")))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Headers and cells are trimmed; blank cells become unknown.
pub fn read_csv(path: &Path) -> Result<Table, StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(str::to_string)
        .collect();
    let mut table = Table::new(headers);

    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.push_row(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }
    Ok(table)
}
