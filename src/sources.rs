//! Diagram source discovery

use std::path::Path;
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// File names directly inside `dir` that end with `extension`, sorted by name.
///
/// Subdirectories are not descended into and directories whose name happens
/// to match are skipped. Symlinks count when they point at a regular file.
pub fn list_sources(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            BuildError::io(path, e.into())
        })?;

        // `Path::is_file` follows symlinks, unlike the entry's own file type
        if !entry.path().is_file() {
            continue;
        }

        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(extension) {
                sources.push(name.to_string());
            }
        } else {
            tracing::warn!("Skipping non UTF-8 file name: {}", entry.path().display());
        }
    }

    sources.sort();
    tracing::debug!("Found {} source(s) in {}", sources.len(), dir.display());
    Ok(sources)
}
