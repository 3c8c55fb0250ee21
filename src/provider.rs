//! Repository content provider contract
//!
//! The engine never talks to a hosting service directly; it consumes this
//! capability trait. Concrete wire formats (GitHub, GitLab, Bitbucket, Azure
//! DevOps REST) live behind it and are out of scope here. "Not found" is an
//! explicit result variant, never an error: a missing optional file is normal
//! control flow during manifest discovery.

use crate::domain::DependencyFile;
use crate::domain::UpdatedDependency;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a concrete provider implementation
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    RequestFailed(String),
    #[error("authentication rejected by provider")]
    AuthRejected,
}

/// Result of fetching one file by path and ref
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The file exists; raw text content
    Found(String),
    /// The path does not exist at the given ref
    NotFound,
}

impl FetchResult {
    /// Returns the content, when found
    pub fn content(&self) -> Option<&str> {
        match self {
            FetchResult::Found(content) => Some(content),
            FetchResult::NotFound => None,
        }
    }
}

/// One entry of a fetched tree listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub is_dir: bool,
}

/// Capability contract to a repository hosting service
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Fetches one file's content at a ref
    async fn fetch_file(&self, path: &str, git_ref: &str) -> Result<FetchResult, ProviderError>;

    /// Lists the entries under a directory at a ref
    async fn fetch_tree(&self, path: &str, git_ref: &str)
        -> Result<Vec<TreeEntry>, ProviderError>;

    /// Name of the repository's default branch
    async fn default_branch(&self) -> Result<String, ProviderError>;

    /// Creates a commit on a branch carrying the updated files
    async fn create_commit(
        &self,
        branch: &str,
        message: &str,
        files: &[DependencyFile],
    ) -> Result<(), ProviderError>;

    /// Opens a pull request for an applied update
    async fn create_pull_request(
        &self,
        branch: &str,
        update: &UpdatedDependency,
    ) -> Result<(), ProviderError>;
}

/// In-memory provider used in tests and local dry runs
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    files: std::collections::HashMap<String, String>,
    default_branch: String,
    commits: std::sync::Mutex<Vec<(String, String)>>,
    pull_requests: std::sync::Mutex<Vec<(String, String)>>,
}

impl InMemoryProvider {
    pub fn new(default_branch: impl Into<String>) -> Self {
        Self {
            files: std::collections::HashMap::new(),
            default_branch: default_branch.into(),
            commits: std::sync::Mutex::new(Vec::new()),
            pull_requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Seeds a file at a path (builder pattern)
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Commit messages recorded so far, with their branches
    pub fn commits(&self) -> Vec<(String, String)> {
        self.commits.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Pull requests recorded so far: branch and dependency name
    pub fn pull_requests(&self) -> Vec<(String, String)> {
        self.pull_requests
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryProvider {
    async fn fetch_file(&self, path: &str, _git_ref: &str) -> Result<FetchResult, ProviderError> {
        Ok(match self.files.get(path) {
            Some(content) => FetchResult::Found(content.clone()),
            None => FetchResult::NotFound,
        })
    }

    async fn fetch_tree(
        &self,
        path: &str,
        _git_ref: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError> {
        let prefix = if path.is_empty() || path == "/" {
            String::new()
        } else {
            format!("{}/", path.trim_matches('/'))
        };
        let mut entries: Vec<TreeEntry> = self
            .files
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .map(|p| {
                let rest = &p[prefix.len()..];
                match rest.split_once('/') {
                    Some((dir, _)) => TreeEntry {
                        path: format!("{}{}", prefix, dir),
                        is_dir: true,
                    },
                    None => TreeEntry {
                        path: p.clone(),
                        is_dir: false,
                    },
                }
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries.dedup();
        Ok(entries)
    }

    async fn default_branch(&self) -> Result<String, ProviderError> {
        Ok(self.default_branch.clone())
    }

    async fn create_commit(
        &self,
        branch: &str,
        message: &str,
        _files: &[DependencyFile],
    ) -> Result<(), ProviderError> {
        if let Ok(mut commits) = self.commits.lock() {
            commits.push((branch.to_string(), message.to_string()));
        }
        Ok(())
    }

    async fn create_pull_request(
        &self,
        branch: &str,
        update: &UpdatedDependency,
    ) -> Result<(), ProviderError> {
        if let Ok(mut prs) = self.pull_requests.lock() {
            prs.push((branch.to_string(), update.name.clone()));
        }
        Ok(())
    }
}
