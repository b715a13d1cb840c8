//! Discovery of metadata documents under an input root.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File name the prototype pipeline looks for.
pub const DEFAULT_METADATA_FILENAME: &str = "ga-metadata.yaml";

/// Lazily walk `root` for files named exactly `file_name`.
///
/// Order follows the directory walk. Each call starts a fresh walk. Entries
/// that cannot be read are logged and skipped; an empty or missing root simply
/// yields nothing.
pub fn find_metadata_files(root: &Path, file_name: &str) -> impl Iterator<Item = PathBuf> + use<> {
    let wanted = OsString::from(file_name);
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(move |entry| entry.file_type().is_file() && entry.file_name() == wanted.as_os_str())
        .map(walkdir::DirEntry::into_path)
}
