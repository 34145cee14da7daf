//! The immutable list of files for one run and their destination keys

use crate::catalog::FileCatalog;
use std::path::{Component, Path, PathBuf};

/// Ordered files to upload plus the context needed to name them remotely
///
/// Built once at run start and shared read-only by every worker.
#[derive(Debug, Clone)]
pub struct UploadJob {
    /// Source root that is stripped from each path
    root: PathBuf,

    /// Destination prefix inside the bucket (no trailing slash)
    prefix: String,

    /// Files in admission order
    files: Vec<PathBuf>,
}

impl UploadJob {
    pub fn new(root: impl Into<PathBuf>, prefix: &str, files: Vec<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.trim_end_matches('/').to_string(),
            files,
        }
    }

    /// Build a job from everything the catalog lists
    pub fn from_catalog(catalog: &FileCatalog, prefix: &str) -> Self {
        Self::new(catalog.root(), prefix, catalog.list())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path relative to the source root, always `/`-separated
    ///
    /// Paths outside the root keep their own components minus any root or
    /// drive prefix, so the result is still a usable key suffix.
    pub fn relative_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Destination key: `prefix/relative_name`
    pub fn destination_key(&self, path: &Path) -> String {
        let relative = self.relative_name(path);
        if self.prefix.is_empty() {
            relative
        } else {
            format!("{}/{}", self.prefix, relative)
        }
    }
}
