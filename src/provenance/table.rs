//! Catalog indexes backed by `dataset_source` rows.

use crate::error::IndexError;
use crate::provenance::{CatalogIndex, ProvenanceEdge, SourceConnection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One row of the `dataset_source` relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub dataset_ref: String,
    pub classifier: String,
    pub source_dataset_ref: String,
}

impl SourceRow {
    pub fn new(
        dataset_ref: impl Into<String>,
        classifier: impl Into<String>,
        source_dataset_ref: impl Into<String>,
    ) -> Self {
        Self {
            dataset_ref: dataset_ref.into(),
            classifier: classifier.into(),
            source_dataset_ref: source_dataset_ref.into(),
        }
    }
}

/// In-memory source relation.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    rows: Vec<SourceRow>,
}

impl SourceTable {
    pub fn from_rows(rows: Vec<SourceRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl SourceConnection for SourceTable {
    fn immediate_sources(&self, dataset_id: &str) -> Result<Vec<ProvenanceEdge>, IndexError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.dataset_ref == dataset_id)
            .map(|r| ProvenanceEdge::new(r.classifier.clone(), r.source_dataset_ref.clone()))
            .collect())
    }
}

impl CatalogIndex for SourceTable {
    fn connect(&self) -> Result<Box<dyn SourceConnection + '_>, IndexError> {
        Ok(Box::new(self))
    }
}

/// A `dataset_source` export on disk (YAML or JSON list of rows).
///
/// Every connection re-reads the export, so it reflects the file as it is at
/// query time and an unreadable export fails the query rather than startup.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogIndex for FileCatalog {
    fn connect(&self) -> Result<Box<dyn SourceConnection + '_>, IndexError> {
        let text = fs::read_to_string(&self.path).map_err(|source| IndexError::Connect {
            path: self.path.clone(),
            source,
        })?;
        let rows: Vec<SourceRow> =
            serde_yaml::from_str(&text).map_err(|source| IndexError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        Ok(Box::new(SourceTable::from_rows(rows)))
    }
}
