//! Disposable working directories for update attempts
//!
//! Each orchestration owns exactly one sandbox: the dependency file tree is
//! written in, the native tool runs inside it, and regenerated artifacts are
//! read back out. The package cache lives under the sandbox root so
//! concurrent jobs never share cache state. The whole tree is removed when
//! the sandbox is dropped, on every exit path.

use crate::domain::DependencyFile;
use crate::error::UpdateError;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated, disposable filesystem tree for one update attempt
pub struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    /// Creates a fresh sandbox with its per-job cache directory
    pub fn new() -> Result<Self, UpdateError> {
        let root = TempDir::with_prefix("relock-")
            .map_err(|e| UpdateError::io(std::env::temp_dir(), e))?;
        let sandbox = Self { root };
        fs::create_dir_all(sandbox.cache_dir())
            .map_err(|e| UpdateError::io(sandbox.cache_dir(), e))?;
        Ok(sandbox)
    }

    /// Root of the sandboxed file tree
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Package-cache path scoped to this job, never a global default
    pub fn cache_dir(&self) -> PathBuf {
        self.root.path().join(".relock-cache")
    }

    /// Writes the dependency file tree into the sandbox, creating
    /// intermediate directories as needed
    pub fn write_files(&self, files: &[DependencyFile]) -> Result<(), UpdateError> {
        for file in files {
            self.write_file(file)?;
        }
        Ok(())
    }

    /// Writes a single file into the sandbox
    pub fn write_file(&self, file: &DependencyFile) -> Result<(), UpdateError> {
        let target = self.root.path().join(file.path());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| UpdateError::io(parent, e))?;
        }
        fs::write(&target, &file.content).map_err(|e| UpdateError::io(&target, e))
    }

    /// Reads a file back from the sandbox after the native tool ran,
    /// producing a new value carrying the regenerated content
    pub fn read_back(&self, file: &DependencyFile) -> Result<DependencyFile, UpdateError> {
        let source = self.root.path().join(file.path());
        let content = fs::read_to_string(&source).map_err(|e| UpdateError::io(&source, e))?;
        Ok(file.with_content(content))
    }

    /// Returns true when the file exists inside the sandbox
    pub fn contains(&self, file: &DependencyFile) -> bool {
        self.root.path().join(file.path()).exists()
    }

    /// Working directory for a tool run against files in the given
    /// repository-relative directory
    pub fn working_dir(&self, directory: &str) -> PathBuf {
        let trimmed = directory.trim_start_matches('/');
        if trimmed.is_empty() {
            self.root.path().to_path_buf()
        } else {
            self.root.path().join(trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let sandbox = Sandbox::new().unwrap();
        let file = DependencyFile::new("package.json", "{\"name\": \"demo\"}");
        sandbox.write_files(std::slice::from_ref(&file)).unwrap();
        assert!(sandbox.contains(&file));
        let read = sandbox.read_back(&file).unwrap();
        assert_eq!(read.content, file.content);
    }

    #[test]
    fn test_write_creates_subdirectories() {
        let sandbox = Sandbox::new().unwrap();
        let file = DependencyFile::new("go.mod", "module demo").in_directory("/services/api");
        sandbox.write_files(std::slice::from_ref(&file)).unwrap();
        assert!(sandbox.path().join("services/api/go.mod").exists());
        assert_eq!(
            sandbox.working_dir("/services/api"),
            sandbox.path().join("services/api")
        );
    }

    #[test]
    fn test_cache_dir_lives_under_root() {
        let sandbox = Sandbox::new().unwrap();
        assert!(sandbox.cache_dir().starts_with(sandbox.path()));
        assert!(sandbox.cache_dir().exists());
    }

    #[test]
    fn test_teardown_removes_tree() {
        let path;
        {
            let sandbox = Sandbox::new().unwrap();
            path = sandbox.path().to_path_buf();
            sandbox
                .write_files(&[DependencyFile::new("Gemfile", "source 'x'")])
                .unwrap();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_read_back_missing_file_is_io_error() {
        let sandbox = Sandbox::new().unwrap();
        let ghost = DependencyFile::new("missing.lock", "");
        let err = sandbox.read_back(&ghost).unwrap_err();
        assert!(matches!(err, UpdateError::Io { .. }));
    }

    #[test]
    fn test_sandboxes_are_isolated() {
        let a = Sandbox::new().unwrap();
        let b = Sandbox::new().unwrap();
        assert_ne!(a.path(), b.path());
        assert_ne!(a.cache_dir(), b.cache_dir());
    }
}
