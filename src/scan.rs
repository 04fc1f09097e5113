//! Input discovery for the `analyze` command.
//!
//! Arguments may be files or directories. Files are taken as given, whatever
//! their extension (the decoder sniffs the format from the bytes).
//! Directories are walked recursively and contribute every file with a
//! supported image extension, sorted by path so output order is stable.

use crate::analysis::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("{0}: no such file or directory")]
    NotFound(PathBuf),
    #[error("walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Whether `path` has an extension the decoder supports (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            supported_input_extensions()
                .iter()
                .any(|ext| ext.eq_ignore_ascii_case(e))
        })
        .unwrap_or(false)
}

/// Expand the command-line inputs into the list of files to analyze.
pub fn collect_images(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry.map_err(|source| ScanError::Walk {
                    path: input.clone(),
                    source,
                })?;
                if entry.file_type().is_file() && is_supported_image(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }
    Ok(files)
}
