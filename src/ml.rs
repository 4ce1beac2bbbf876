//! Supervised-learning datasets: feature rows paired with an aligned target vector.

use polars::prelude::*;

use crate::config::DatasetConfig;
use crate::dataset::{Dataset, DatasetError, DatasetResult, TabularDataset};
use crate::logging::log_event;
use crate::source::RowSource;
use crate::table::{Row, Table, is_valid_value, remove_indices};
use crate::target::TargetAccumulator;

/// A [`Dataset`] whose rows each carry one target value.
///
/// `target.len() == table.len()` holds after construction and after every `sanitize`.
#[derive(Debug, Clone, Default)]
pub struct MLDataset {
    base: Dataset,
    target: Vec<Option<f64>>,
}

impl MLDataset {
    /// Build the dataset, deriving target values from each symbol's batch with `target_fn`.
    ///
    /// `target_fn` is called once per symbol, in symbol order, with that symbol's batch
    /// only, and must return exactly one value per batch row.
    pub fn new<S, F>(source: &S, config: DatasetConfig, target_fn: F) -> DatasetResult<Self>
    where
        S: RowSource + ?Sized,
        F: FnMut(&DataFrame) -> PolarsResult<Series>,
    {
        let mut accumulator = TargetAccumulator::new(target_fn);
        let base = Dataset::build(source, config, &mut accumulator)?;
        let target = accumulator.into_values();

        if target.len() != base.table.len() {
            return Err(DatasetError::Alignment {
                scope: "dataset".to_string(),
                rows: base.table.len(),
                targets: target.len(),
            });
        }

        Ok(Self { base, target })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.base
    }

    pub fn target(&self) -> &[Option<f64>] {
        &self.target
    }

    /// Feature columns of every row as `f64`, nulls as NaN.
    pub fn training_data(&self) -> Vec<Vec<f64>> {
        self.base.table.feature_matrix()
    }

    /// The target vector as `f64`, nulls as NaN.
    pub fn target_data(&self) -> Vec<f64> {
        self.target
            .iter()
            .map(|value| value.unwrap_or(f64::NAN))
            .collect()
    }

    pub fn into_parts(self) -> (Dataset, Vec<Option<f64>>) {
        (self.base, self.target)
    }
}

impl TabularDataset for MLDataset {
    type Rows<'a>
        = LabeledRows<'a>
    where
        Self: 'a;

    fn raw_data(&self) -> &Table {
        &self.base.table
    }

    /// Rows with the target value appended as a trailing feature.
    fn rows(&self) -> Self::Rows<'_> {
        LabeledRows {
            rows: self.base.table.rows(),
            target: self.target.iter(),
        }
    }

    /// Remove rows with an invalid feature or an invalid target from both containers.
    fn sanitize(&mut self) -> usize {
        let doomed: Vec<usize> = self
            .base
            .table
            .rows()
            .zip(self.target.iter())
            .enumerate()
            .filter(|(_, (row, target))| !row.is_complete() || !is_valid_value(**target))
            .map(|(idx, _)| idx)
            .collect();

        self.base.table.remove_rows(&doomed);
        remove_indices(&mut self.target, &doomed);

        log_event(
            file!(),
            "MLDataset",
            "sanitize",
            "dataset.sanitize",
            line!(),
            None,
            Some(self.target.len()),
            &format!("Removed {} rows with incomplete features or target", doomed.len()),
            None,
        );

        doomed.len()
    }
}

/// Iterator over rows of an [`MLDataset`] with the target appended to the features.
#[derive(Debug, Clone)]
pub struct LabeledRows<'a> {
    rows: std::slice::Iter<'a, Row>,
    target: std::slice::Iter<'a, Option<f64>>,
}

impl Iterator for LabeledRows<'_> {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let target = self.target.next().copied().flatten();

        let mut labeled = row.clone();
        labeled.features.push(target);
        Some(labeled)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for LabeledRows<'_> {}
