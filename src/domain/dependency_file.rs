//! Dependency file values owned by the orchestration layer
//!
//! A `DependencyFile` is never mutated in place: every change produces a new
//! value with updated content, keeping the original available for diffing
//! and change validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A manifest, lock or support file participating in an update run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyFile {
    /// File name relative to the directory (e.g. "package.json")
    pub name: String,
    /// Raw text content
    pub content: String,
    /// Directory the file lives in, relative to the repository root
    pub directory: String,
    /// Support files are written into the sandbox but never patched or
    /// committed (e.g. .npmrc)
    pub support_file: bool,
}

impl DependencyFile {
    /// Creates a new dependency file at the repository root
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            directory: "/".to_string(),
            support_file: false,
        }
    }

    /// Sets the directory (builder pattern)
    pub fn in_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Marks this as a support file (builder pattern)
    pub fn support(mut self) -> Self {
        self.support_file = true;
        self
    }

    /// Derives a new file value with replaced content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            content: content.into(),
            directory: self.directory.clone(),
            support_file: self.support_file,
        }
    }

    /// Returns the path of this file relative to the repository root
    pub fn path(&self) -> PathBuf {
        let dir = self.directory.trim_start_matches('/');
        if dir.is_empty() {
            PathBuf::from(&self.name)
        } else {
            PathBuf::from(dir).join(&self.name)
        }
    }

    /// Returns true if this file's content differs from another version of it
    pub fn changed_from(&self, other: &DependencyFile) -> bool {
        self.content != other.content
    }
}

impl fmt::Display for DependencyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path().display())
    }
}
