use std::path::{Path, PathBuf};

use polars::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

use crate::config::DatasetConfig;
use crate::logging::log_event;
use crate::schema::Schema;
use crate::source::{RowSource, SourceError};
use crate::table::{Row, Table};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to retrieve quotes for `{symbol}`: {source}")]
    Retrieval { symbol: String, source: SourceError },
    #[error("columns of `{symbol}` do not match the dataset schema: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        symbol: String,
        expected: String,
        found: String,
    },
    #[error("target misaligned in {scope}: {rows} rows but {targets} target values")]
    Alignment {
        scope: String,
        rows: usize,
        targets: usize,
    },
    #[error("target function failed for `{symbol}`: {source}")]
    Target { symbol: String, source: PolarsError },
    #[error("failed to coerce batch for `{symbol}`: {source}")]
    Coerce { symbol: String, source: PolarsError },
    #[error("failed to export dataset to {}: {source}", .path.display())]
    Export { path: PathBuf, source: csv::Error },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

/// Per-batch hook invoked once for every fetched symbol, before its rows are appended.
pub trait BatchHook {
    fn on_batch(&mut self, symbol: &str, batch: &DataFrame) -> DatasetResult<()>;
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl BatchHook for NoHook {
    fn on_batch(&mut self, _symbol: &str, _batch: &DataFrame) -> DatasetResult<()> {
        Ok(())
    }
}

/// Adapts a side-effect callback into a [`BatchHook`]; its result is ignored.
#[derive(Debug, Clone, Copy)]
pub struct Observer<F>(pub F);

impl<F> BatchHook for Observer<F>
where
    F: FnMut(&str, &DataFrame),
{
    fn on_batch(&mut self, symbol: &str, batch: &DataFrame) -> DatasetResult<()> {
        (self.0)(symbol, batch);
        Ok(())
    }
}

/// Operations shared by [`Dataset`] and [`crate::MLDataset`].
pub trait TabularDataset {
    type Rows<'a>: Iterator<Item = Row>
    where
        Self: 'a;

    /// The accumulated table.
    fn raw_data(&self) -> &Table;

    /// Lazy iteration in table order. Restartable; reflects the latest `sanitize`.
    fn rows(&self) -> Self::Rows<'_>;

    /// Remove every invalid row in one batch. Returns the number of rows removed.
    fn sanitize(&mut self) -> usize;

    fn len(&self) -> usize {
        self.raw_data().len()
    }

    fn is_empty(&self) -> bool {
        self.raw_data().is_empty()
    }

    fn column_names(&self) -> &[String] {
        self.raw_data().column_names()
    }

    /// Column names stacked above the data rows, rendered as text.
    fn pretty_data(&self) -> Vec<Vec<String>> {
        self.raw_data().pretty()
    }

    /// Write [`TabularDataset::pretty_data`] as comma-separated text.
    fn to_csv<P: AsRef<Path>>(&self, path: P) -> DatasetResult<()> {
        write_csv(path.as_ref(), &self.pretty_data())
    }
}

/// Rows accumulated from one or more symbols into a single table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    config: DatasetConfig,
    pub(crate) table: Table,
}

impl Dataset {
    pub fn new<S>(source: &S, config: DatasetConfig) -> DatasetResult<Self>
    where
        S: RowSource + ?Sized,
    {
        Self::build(source, config, &mut NoHook)
    }

    /// Build the dataset, calling `callback` with each symbol's batch before it is appended.
    pub fn with_callback<S, F>(source: &S, config: DatasetConfig, callback: F) -> DatasetResult<Self>
    where
        S: RowSource + ?Sized,
        F: FnMut(&str, &DataFrame),
    {
        Self::build(source, config, &mut Observer(callback))
    }

    /// Fetch every configured symbol in order and append its rows.
    ///
    /// Any retrieval, schema or hook failure aborts construction. With `parallel_fetch`
    /// the batches are retrieved concurrently but committed in symbol order.
    pub fn build<S, H>(source: &S, config: DatasetConfig, hook: &mut H) -> DatasetResult<Self>
    where
        S: RowSource + ?Sized,
        H: BatchHook + ?Sized,
    {
        config.warn_reserved_filters();

        let mut accumulation = Accumulation::new(config.identifier_columns);
        let symbols = config.symbols();

        if config.parallel_fetch {
            let batches = symbols
                .par_iter()
                .map(|symbol| fetch(source, symbol))
                .collect::<DatasetResult<Vec<_>>>()?;

            for (symbol, batch) in symbols.iter().zip(batches.iter()) {
                accumulation.commit(symbol, batch, hook)?;
            }
        } else {
            for symbol in symbols {
                let batch = fetch(source, symbol)?;
                accumulation.commit(symbol, &batch, hook)?;
            }
        }

        let table = accumulation.table;
        log_event(
            file!(),
            "Dataset",
            "build",
            "dataset.ready",
            line!(),
            None,
            Some(table.len()),
            &format!("Assembled dataset from {} symbols", symbols.len()),
            None,
        );

        Ok(Self { config, table })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn schema(&self) -> &Schema {
        self.table.schema()
    }

    /// The table as a polars frame with text identifiers and `Float64` features.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        self.table.to_frame()
    }
}

impl TabularDataset for Dataset {
    type Rows<'a>
        = std::iter::Cloned<std::slice::Iter<'a, Row>>
    where
        Self: 'a;

    fn raw_data(&self) -> &Table {
        &self.table
    }

    fn rows(&self) -> Self::Rows<'_> {
        self.table.rows().cloned()
    }

    fn sanitize(&mut self) -> usize {
        let doomed = self.table.invalid_rows();
        self.table.remove_rows(&doomed);

        log_event(
            file!(),
            "Dataset",
            "sanitize",
            "dataset.sanitize",
            line!(),
            None,
            Some(self.table.len()),
            &format!("Removed {} incomplete rows", doomed.len()),
            None,
        );

        doomed.len()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.rows()
    }
}

/// Table under construction; the schema is taken from the first committed batch.
struct Accumulation {
    identifier_columns: usize,
    established: bool,
    table: Table,
}

impl Accumulation {
    fn new(identifier_columns: usize) -> Self {
        Self {
            identifier_columns,
            established: false,
            table: Table::default(),
        }
    }

    fn commit<H>(&mut self, symbol: &str, batch: &DataFrame, hook: &mut H) -> DatasetResult<()>
    where
        H: BatchHook + ?Sized,
    {
        if self.established {
            self.table.schema().validate(symbol, batch).inspect_err(|error| {
                log_failure("commit", symbol, error);
            })?;
        } else {
            let schema = Schema::from_batch(symbol, batch, self.identifier_columns)
                .inspect_err(|error| log_failure("commit", symbol, error))?;
            log_event(
                file!(),
                "Dataset",
                "commit",
                "dataset.schema",
                line!(),
                Some(symbol),
                None,
                &format!("Established schema [{}]", schema.names().join(",")),
                None,
            );
            self.table = Table::new(schema);
            self.established = true;
        }

        hook.on_batch(symbol, batch)
            .inspect_err(|error| log_failure("commit", symbol, error))?;

        let appended = self
            .table
            .append_batch(batch)
            .map_err(|source| DatasetError::Coerce {
                symbol: symbol.to_string(),
                source,
            })?;

        log_event(
            file!(),
            "Dataset",
            "commit",
            "dataset.append",
            line!(),
            Some(symbol),
            Some(appended),
            &format!("Appended batch, {} rows total", self.table.len()),
            None,
        );

        Ok(())
    }
}

fn fetch<S>(source: &S, symbol: &str) -> DatasetResult<DataFrame>
where
    S: RowSource + ?Sized,
{
    source.fetch(symbol).map_err(|source| {
        let error = DatasetError::Retrieval {
            symbol: symbol.to_string(),
            source,
        };
        log_failure("fetch", symbol, &error);
        error
    })
}

fn log_failure(operation: &str, symbol: &str, error: &DatasetError) {
    log_event(
        file!(),
        "Dataset",
        operation,
        "dataset.error",
        line!(),
        Some(symbol),
        None,
        "Dataset construction aborted",
        Some(&error.to_string()),
    );
}

fn write_csv(path: &Path, records: &[Vec<String>]) -> DatasetResult<()> {
    let export_error = |source: csv::Error| {
        log_event(
            file!(),
            "Dataset",
            "to_csv",
            "dataset.export",
            line!(),
            None,
            None,
            &format!("Failed to export {}", path.display()),
            Some(&source.to_string()),
        );
        DatasetError::Export {
            path: path.to_path_buf(),
            source,
        }
    };

    let mut writer = csv::Writer::from_path(path).map_err(export_error)?;
    for record in records {
        writer.write_record(record).map_err(export_error)?;
    }
    writer
        .flush()
        .map_err(|error| export_error(csv::Error::from(error)))?;

    log_event(
        file!(),
        "Dataset",
        "to_csv",
        "dataset.export",
        line!(),
        None,
        Some(records.len().saturating_sub(1)),
        &format!("Exported dataset to {}", path.display()),
        None,
    );

    Ok(())
}
