//! stockdata assembles per-symbol quote series into a single numeric table for
//! statistical and machine-learning work. It accumulates batches from a row source,
//! drops incomplete rows on request, and keeps a target vector aligned with the rows.

pub mod config;
pub mod dataset;
pub mod logging;
pub mod ml;
pub mod schema;
pub mod source;
pub mod table;
pub mod target;

pub use config::{ConfigError, DatasetConfig};
pub use dataset::{
    BatchHook, Dataset, DatasetError, DatasetResult, NoHook, Observer, TabularDataset,
};
pub use ml::{LabeledRows, MLDataset};
pub use schema::{ColumnKind, Schema};
pub use source::{CsvDirSource, MemorySource, RowSource, SourceError, SourceResult};
pub use table::{Row, Table};
pub use target::TargetAccumulator;

pub type Result<T> = anyhow::Result<T>;
