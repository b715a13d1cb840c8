//! Per-file extract -> merge -> render -> parse -> write, and the batch loop.
//!
//! Files are processed one at a time. Any error is contained to the file that
//! raised it: it is logged with the path, recorded in the [`BatchReport`], and
//! the loop moves on to the next document.

use crate::config::TransformConfig;
use crate::dataset::{DatasetRecord, load_dataset};
use crate::error::TransformError;
use crate::extract::{extract_geometry, extract_lineage, extract_measurements, extract_properties};
use crate::locate::find_metadata_files;
use crate::namespace::Namespace;
use crate::output::{OutputLayout, write_atomic};
use crate::provenance::{CatalogIndex, get_immediate_parents};
use crate::render::{Template, parse_rendered, to_canonical_yaml};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Whether validated documents are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Write,
    /// Run everything up to and including validation, write nothing.
    Check,
}

/// One file that did not make it to output.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TransformError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output paths written, in processing order.
    pub written: Vec<PathBuf>,
    /// Inputs that validated (equals `written.len()` in write mode).
    pub validated: usize,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.validated + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Pipeline<'a> {
    template: &'a Template,
    config: &'a TransformConfig,
    catalog: &'a dyn CatalogIndex,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        template: &'a Template,
        config: &'a TransformConfig,
        catalog: &'a dyn CatalogIndex,
    ) -> Self {
        Self {
            template,
            config,
            catalog,
        }
    }

    /// Run every extractor plus the provenance lookup and unite the results.
    pub fn build_namespace(&self, record: &DatasetRecord) -> Result<Namespace, TransformError> {
        let edges = get_immediate_parents(self.catalog, &record.id)?;

        let mut ns = Namespace::new();
        ns.merge(extract_geometry(record))?;
        ns.merge(extract_measurements(record, self.config.band_grids()))?;
        ns.merge(extract_properties(record, self.config.property_offsets())?)?;
        ns.merge(extract_lineage(&edges))?;
        Ok(ns)
    }

    /// Load one metadata document and produce its validated transformed form.
    pub fn transform_file(&self, path: &Path) -> Result<serde_json::Value, TransformError> {
        let record = load_dataset(path)?;
        let ns = self.build_namespace(&record)?;
        debug!(path = %path.display(), keys = ?ns.keys().collect::<Vec<_>>(), "namespace built");

        let rendered = self.template.render(&ns)?;
        parse_rendered(&rendered).map_err(TransformError::ParseValidation)
    }

    /// Transform every metadata document under `root`.
    ///
    /// Never stops early on a per-file error.
    pub fn run(&self, root: &Path, layout: &OutputLayout, mode: Mode) -> BatchReport {
        let mut report = BatchReport::default();

        for path in find_metadata_files(root, &self.config.metadata_filename) {
            let outcome = self.transform_file(&path).and_then(|doc| match mode {
                Mode::Check => Ok(None),
                Mode::Write => {
                    let out_path = layout.output_path(&path);
                    let text = to_canonical_yaml(&doc).map_err(TransformError::ParseValidation)?;
                    write_atomic(&out_path, &text)?;
                    Ok(Some(out_path))
                }
            });

            match outcome {
                Ok(written) => {
                    report.validated += 1;
                    match written {
                        Some(out_path) => {
                            info!(input = %path.display(), output = %out_path.display(), "transformed");
                            report.written.push(out_path);
                        }
                        None => info!(input = %path.display(), "valid"),
                    }
                }
                Err(error) => {
                    warn!(input = %path.display(), kind = error.kind(), error = %error, "skipping file");
                    report.failures.push(FileFailure { path, error });
                }
            }
        }

        report
    }
}
