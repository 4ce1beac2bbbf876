//! Row sources deliver one batch per symbol.
//!
//! A batch is a polars [`DataFrame`]; its column names are the batch's column names.
//! The leading columns carry identifiers (symbol, date) and the rest numeric features.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;

use crate::logging::log_event;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no quotes available for symbol `{symbol}`")]
    NotFound { symbol: String },
    #[error("failed to read quotes for `{symbol}`: {source}")]
    Read { symbol: String, source: PolarsError },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Retrieval seam between the dataset pipeline and a quote provider.
///
/// Every symbol fetched for one dataset is expected to share the same column layout.
pub trait RowSource: Send + Sync {
    fn fetch(&self, symbol: &str) -> SourceResult<DataFrame>;
}

/// Batches held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    batches: HashMap<String, DataFrame>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, symbol: impl Into<String>, batch: DataFrame) -> Self {
        self.insert(symbol, batch);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, batch: DataFrame) {
        self.batches.insert(symbol.into(), batch);
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.batches.keys().map(String::as_str)
    }
}

impl RowSource for MemorySource {
    fn fetch(&self, symbol: &str) -> SourceResult<DataFrame> {
        self.batches
            .get(symbol)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                symbol: symbol.to_string(),
            })
    }
}

/// Reads `<dir>/<SYMBOL>.csv` files exported from the quote store.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl RowSource for CsvDirSource {
    fn fetch(&self, symbol: &str) -> SourceResult<DataFrame> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(SourceError::NotFound {
                symbol: symbol.to_string(),
            });
        }

        let frame = LazyCsvReader::new(&path)
            .has_header(true)
            .with_infer_schema_length(Some(2048))
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| {
                log_event(
                    file!(),
                    "CsvDirSource",
                    "fetch",
                    "source.read",
                    line!(),
                    Some(symbol),
                    None,
                    &format!("Failed to read {}", path.display()),
                    Some(&source.to_string()),
                );
                SourceError::Read {
                    symbol: symbol.to_string(),
                    source,
                }
            })?;

        log_event(
            file!(),
            "CsvDirSource",
            "fetch",
            "source.read",
            line!(),
            Some(symbol),
            Some(frame.height()),
            &format!("Read quotes from {}", path.display()),
            None,
        );

        Ok(frame)
    }
}
