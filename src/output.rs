//! Where transformed documents go, and how they are written.

use crate::error::TransformError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const DEFAULT_OUTPUT_FILENAME: &str = "odc-metadata.yaml";

/// Maps each input document to exactly one output path.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    input_root: PathBuf,
    output_root: Option<PathBuf>,
    file_name: String,
}

impl OutputLayout {
    /// `output_root: None` writes next to each input.
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: Option<PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root,
            file_name: file_name.into(),
        }
    }

    /// `<output root>/<input dir relative to input root>/<file name>`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        let dir = input.parent().unwrap_or(Path::new(""));
        match &self.output_root {
            None => dir.join(&self.file_name),
            Some(out_root) => {
                // Located inputs always live under the input root.
                let rel = dir.strip_prefix(&self.input_root).unwrap_or(dir);
                out_root.join(rel).join(&self.file_name)
            }
        }
    }
}

/// Replace `path` with `contents` atomically: write a sibling temp file, then
/// rename it over the destination.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), TransformError> {
    let write_err = |source: std::io::Error| TransformError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
