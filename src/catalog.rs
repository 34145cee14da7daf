//! Source file enumeration
//!
//! Walks the source root once, up front, and produces the ordered list of
//! files to upload. Only regular files are kept; entries within a directory are
//! visited in lexical order so the list is stable across runs.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Produces the list of files under a source root
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every regular file under the root
    ///
    /// Symlinks are not followed during the walk; a symlink whose target is a
    /// regular file is listed and read through at upload time. Symlinked
    /// directories, dangling links and special files (FIFOs, sockets,
    /// devices) are skipped, as are entries that cannot be read.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            if file_type.is_file() {
                files.push(entry.into_path());
                continue;
            }

            if file_type.is_symlink() {
                match fs::metadata(entry.path()) {
                    Ok(meta) if meta.is_file() => files.push(entry.into_path()),
                    Ok(meta) if meta.is_dir() => {
                        debug!(path = %entry.path().display(), "Skipping symlinked directory");
                    }
                    Ok(_) => {
                        warn!(path = %entry.path().display(), "Skipping symlink to special file");
                    }
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "Skipping dangling symlink");
                    }
                }
                continue;
            }

            warn!(path = %entry.path().display(), "Skipping special file");
        }

        debug!(root = %self.root.display(), count = files.len(), "Catalog built");
        files
    }
}
