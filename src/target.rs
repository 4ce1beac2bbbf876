use polars::prelude::*;

use crate::dataset::{BatchHook, DatasetError, DatasetResult};

/// Collects target values batch by batch from a user-supplied target function.
///
/// The function receives one symbol's batch and must return one value per batch row.
/// Its output is cast to `Float64`; values that cannot be read as numbers become null.
pub struct TargetAccumulator<F> {
    target_fn: F,
    values: Vec<Option<f64>>,
    batches: usize,
}

impl<F> TargetAccumulator<F>
where
    F: FnMut(&DataFrame) -> PolarsResult<Series>,
{
    pub fn new(target_fn: F) -> Self {
        Self {
            target_fn,
            values: Vec::new(),
            batches: 0,
        }
    }

    /// Run the target function on `batch` and append its output.
    ///
    /// Fails with [`DatasetError::Alignment`] when the output length differs from the
    /// batch height; nothing is appended in that case.
    pub fn accumulate(&mut self, symbol: &str, batch: &DataFrame) -> DatasetResult<usize> {
        let target_error = |source: PolarsError| DatasetError::Target {
            symbol: symbol.to_string(),
            source,
        };

        let series = (self.target_fn)(batch).map_err(target_error)?;
        let numeric = series.cast(&DataType::Float64).map_err(target_error)?;
        let batch_values: Vec<Option<f64>> =
            numeric.f64().map_err(target_error)?.into_iter().collect();

        if batch_values.len() != batch.height() {
            return Err(DatasetError::Alignment {
                scope: format!("batch `{symbol}`"),
                rows: batch.height(),
                targets: batch_values.len(),
            });
        }

        let appended = batch_values.len();
        if self.batches == 0 {
            self.values = batch_values;
        } else {
            self.values.extend(batch_values);
        }
        self.batches += 1;

        Ok(appended)
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Number of batches accumulated so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn into_values(self) -> Vec<Option<f64>> {
        self.values
    }
}

impl<F> BatchHook for TargetAccumulator<F>
where
    F: FnMut(&DataFrame) -> PolarsResult<Series>,
{
    fn on_batch(&mut self, symbol: &str, batch: &DataFrame) -> DatasetResult<()> {
        self.accumulate(symbol, batch).map(|_| ())
    }
}
