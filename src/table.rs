//! Row-major storage for accumulated quote rows.

use polars::prelude::*;
use serde::Serialize;

use crate::schema::Schema;

/// A feature or target value counts as valid only when present and finite.
pub fn is_valid_value(value: Option<f64>) -> bool {
    matches!(value, Some(v) if v.is_finite())
}

/// One observation: display identifiers followed by numeric features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub identifiers: Vec<Option<String>>,
    pub features: Vec<Option<f64>>,
}

impl Row {
    /// True when every feature is present and finite. Identifiers are not inspected.
    pub fn is_complete(&self) -> bool {
        self.features.iter().copied().all(is_valid_value)
    }

    /// Render every field as text: nulls empty, floats via `Display`.
    pub fn to_fields(&self) -> Vec<String> {
        self.identifiers
            .iter()
            .map(|value| value.clone().unwrap_or_default())
            .chain(
                self.features
                    .iter()
                    .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
            )
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column_names(&self) -> &[String] {
        self.schema.names()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub fn rows(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Coerce a batch against the schema and append its rows in batch order.
    ///
    /// Identifier columns are cast to text and feature columns to `Float64`. The cast is
    /// non-strict, so a feature value that cannot be read as a number becomes null.
    /// The batch must already have been validated against the schema.
    pub fn append_batch(&mut self, batch: &DataFrame) -> PolarsResult<usize> {
        let identifier_count = self.schema.identifier_count();
        let columns = batch.get_columns();

        let mut identifiers: Vec<Vec<Option<String>>> = Vec::with_capacity(identifier_count);
        for series in &columns[..identifier_count] {
            let text = series.cast(&DataType::Utf8)?;
            identifiers.push(
                text.utf8()?
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect(),
            );
        }

        let mut features: Vec<Vec<Option<f64>>> =
            Vec::with_capacity(columns.len() - identifier_count);
        for series in &columns[identifier_count..] {
            let numeric = series.cast(&DataType::Float64)?;
            features.push(numeric.f64()?.into_iter().collect());
        }

        let height = batch.height();
        self.rows.reserve(height);
        for idx in 0..height {
            self.rows.push(Row {
                identifiers: identifiers.iter().map(|column| column[idx].clone()).collect(),
                features: features.iter().map(|column| column[idx]).collect(),
            });
        }

        Ok(height)
    }

    /// Ascending indices of rows with a missing or non-finite feature.
    pub fn invalid_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_complete())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Remove the given rows in a single pass. `indices` must be sorted and unique.
    pub fn remove_rows(&mut self, indices: &[usize]) {
        remove_indices(&mut self.rows, indices);
    }

    /// Header row followed by every data row as text.
    pub fn pretty(&self) -> Vec<Vec<String>> {
        std::iter::once(self.schema.names().to_vec())
            .chain(self.rows.iter().map(Row::to_fields))
            .collect()
    }

    /// Feature fields of every row, nulls as NaN.
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                row.features
                    .iter()
                    .map(|value| value.unwrap_or(f64::NAN))
                    .collect()
            })
            .collect()
    }

    /// Rebuild a polars frame with text identifiers and `Float64` features.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let identifier_count = self.schema.identifier_count();
        let columns = self
            .schema
            .names()
            .iter()
            .enumerate()
            .map(|(column, name)| {
                if column < identifier_count {
                    let values: Vec<Option<String>> = self
                        .rows
                        .iter()
                        .map(|row| row.identifiers[column].clone())
                        .collect();
                    Series::new(name, values)
                } else {
                    let values: Vec<Option<f64>> = self
                        .rows
                        .iter()
                        .map(|row| row.features[column - identifier_count])
                        .collect();
                    Series::new(name, values)
                }
            })
            .collect::<Vec<_>>();

        DataFrame::new(columns)
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Drop the elements at `indices` (sorted, unique) while keeping the order of the rest.
pub(crate) fn remove_indices<T>(items: &mut Vec<T>, indices: &[usize]) {
    if indices.is_empty() {
        return;
    }

    let mut doomed = indices.iter().copied().peekable();
    let mut position = 0;
    items.retain(|_| {
        let remove = doomed.next_if_eq(&position).is_some();
        position += 1;
        !remove
    });
}
