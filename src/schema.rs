use polars::prelude::*;
use serde::Serialize;

use crate::dataset::{DatasetError, DatasetResult};

/// Role of a column, fixed when the schema is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    /// Display-only field such as the symbol or the quote date. Never validated.
    Identifier,
    /// Numeric model input, coerced to `f64` on ingestion.
    Feature,
}

/// Column layout shared by every batch of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    names: Vec<String>,
    kinds: Vec<ColumnKind>,
}

impl Schema {
    /// Tag the first `identifier_columns` columns as identifiers and the rest as features.
    pub fn new(names: Vec<String>, identifier_columns: usize) -> Self {
        let kinds = (0..names.len())
            .map(|idx| {
                if idx < identifier_columns {
                    ColumnKind::Identifier
                } else {
                    ColumnKind::Feature
                }
            })
            .collect();
        Self { names, kinds }
    }

    /// Derive the schema from the first batch of a dataset.
    pub fn from_batch(
        symbol: &str,
        batch: &DataFrame,
        identifier_columns: usize,
    ) -> DatasetResult<Self> {
        let names: Vec<String> = batch
            .get_column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        if names.len() < identifier_columns {
            return Err(DatasetError::SchemaMismatch {
                symbol: symbol.to_string(),
                expected: format!("at least {identifier_columns} identifier columns"),
                found: names.join(","),
            });
        }

        Ok(Self::new(names, identifier_columns))
    }

    /// Reject a batch whose column count or order differs from this schema.
    pub fn validate(&self, symbol: &str, batch: &DataFrame) -> DatasetResult<()> {
        let found = batch.get_column_names();
        let matches = found.len() == self.names.len()
            && self
                .names
                .iter()
                .zip(found.iter())
                .all(|(expected, found)| expected.as_str() == *found);

        if matches {
            Ok(())
        } else {
            Err(DatasetError::SchemaMismatch {
                symbol: symbol.to_string(),
                expected: self.names.join(","),
                found: found.join(","),
            })
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kind(&self, column: usize) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn identifier_count(&self) -> usize {
        self.kinds
            .iter()
            .filter(|kind| **kind == ColumnKind::Identifier)
            .count()
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .zip(self.kinds.iter())
            .filter(|(_, kind)| **kind == ColumnKind::Feature)
            .map(|(name, _)| name.as_str())
    }
}
