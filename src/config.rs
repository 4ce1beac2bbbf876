use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read dataset config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dataset config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Selection and layout settings for building a dataset.
///
/// `sector`, `index` and `size` are reserved: they are accepted and recorded but do not
/// filter anything yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Symbols to fetch, in the order their rows are appended.
    pub symbols: Option<Vec<String>>,
    /// Reserved sector filter.
    pub sector: Option<Vec<String>>,
    /// Reserved index membership filter.
    pub index: Option<Vec<String>>,
    /// Reserved cap on the number of rows.
    pub size: Option<usize>,
    /// Number of leading display-only columns (symbol, date).
    pub identifier_columns: usize,
    /// Fetch batches concurrently; rows are still committed in symbol order.
    pub parallel_fetch: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            symbols: None,
            sector: None,
            index: None,
            size: None,
            identifier_columns: 2,
            parallel_fetch: false,
        }
    }
}

impl DatasetConfig {
    pub fn for_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: Some(symbols.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn with_sector<I, S>(mut self, sectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sector = Some(sectors.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_index<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index = Some(indices.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_identifier_columns(mut self, identifier_columns: usize) -> Self {
        self.identifier_columns = identifier_columns;
        self
    }

    pub fn with_parallel_fetch(mut self, parallel_fetch: bool) -> Self {
        self.parallel_fetch = parallel_fetch;
        self
    }

    pub fn symbols(&self) -> &[String] {
        self.symbols.as_deref().unwrap_or_default()
    }

    /// Names of the reserved filters that were set.
    pub fn reserved_filters(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.sector.is_some() {
            set.push("sector");
        }
        if self.index.is_some() {
            set.push("index");
        }
        if self.size.is_some() {
            set.push("size");
        }
        set
    }

    pub(crate) fn warn_reserved_filters(&self) {
        for filter in self.reserved_filters() {
            warn!(target: "stockdata", filter, "reserved dataset filter is accepted but not applied");
        }
    }
}
