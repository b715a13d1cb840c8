//! Immediate-parent lookup against a catalog's source-relationship store.
//!
//! The catalog is reached through an explicit handle. A connection is opened
//! for the duration of one query and released when it goes out of scope.

pub mod table;

pub use table::{FileCatalog, SourceRow, SourceTable};

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One parent link: the role the parent plays and the parent's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceEdge {
    pub classifier: String,
    pub source_id: String,
}

impl ProvenanceEdge {
    pub fn new(classifier: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            classifier: classifier.into(),
            source_id: source_id.into(),
        }
    }
}

/// A catalog index that can hand out query connections.
pub trait CatalogIndex {
    fn connect(&self) -> Result<Box<dyn SourceConnection + '_>, IndexError>;
}

/// An open connection to the source-relationship store.
pub trait SourceConnection {
    /// Rows whose child is `dataset_id`, as (classifier, source id) edges.
    fn immediate_sources(&self, dataset_id: &str) -> Result<Vec<ProvenanceEdge>, IndexError>;
}

impl<T: SourceConnection + ?Sized> SourceConnection for &T {
    fn immediate_sources(&self, dataset_id: &str) -> Result<Vec<ProvenanceEdge>, IndexError> {
        (**self).immediate_sources(dataset_id)
    }
}

/// Immediate parents of `dataset_id`. One query, one hop; grandparents are
/// never followed. No parents is an empty vec, not an error.
pub fn get_immediate_parents(
    index: &dyn CatalogIndex,
    dataset_id: &str,
) -> Result<Vec<ProvenanceEdge>, IndexError> {
    let conn = index.connect()?;
    let edges = conn.immediate_sources(dataset_id)?;
    debug!(dataset = dataset_id, parents = edges.len(), "resolved immediate parents");
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct Unreachable;

    impl CatalogIndex for Unreachable {
        fn connect(&self) -> Result<Box<dyn SourceConnection + '_>, IndexError> {
            Err(IndexError::Query("connection refused".into()))
        }
    }

    /// Counts connections so tests can see one connect per lookup.
    struct Counting {
        table: SourceTable,
        opened: Cell<usize>,
    }

    impl CatalogIndex for Counting {
        fn connect(&self) -> Result<Box<dyn SourceConnection + '_>, IndexError> {
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(&self.table))
        }
    }

    #[test]
    fn resolves_one_hop_only() {
        let table = SourceTable::from_rows(vec![
            SourceRow::new("child", "nbar", "parent"),
            SourceRow::new("parent", "level1", "grandparent"),
        ]);
        let edges = get_immediate_parents(&table, "child").unwrap();
        assert_eq!(edges, vec![ProvenanceEdge::new("nbar", "parent")]);
    }

    #[test]
    fn orphan_has_no_parents() {
        let table = SourceTable::default();
        assert!(get_immediate_parents(&table, "orphan").unwrap().is_empty());
    }

    #[test]
    fn connect_failure_propagates() {
        let err = get_immediate_parents(&Unreachable, "x").unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn one_connection_per_lookup() {
        let index = Counting {
            table: SourceTable::from_rows(vec![SourceRow::new("a", "pq", "b")]),
            opened: Cell::new(0),
        };
        get_immediate_parents(&index, "a").unwrap();
        get_immediate_parents(&index, "b").unwrap();
        assert_eq!(index.opened.get(), 2);
    }
}
