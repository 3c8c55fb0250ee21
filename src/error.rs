//! Application error types using thiserror
//!
//! Error taxonomy:
//! - InvalidVersion / BadRequirement: malformed input, surfaced per-dependency
//! - ContentNotChanged / LockfileUnchanged: patch invariant violations
//! - SubprocessFailed / Timeout: native tool failures, recoverable per-dependency
//! - ResourceExhausted: disk/memory exhaustion, halts the whole batch
//! - PathDependencyUnreachable: path escapes the permitted tree, rejected

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving and applying a dependency update
#[derive(Error, Debug)]
pub enum UpdateError {
    /// A version string did not parse under the ecosystem grammar
    #[error("invalid version '{raw}' for {ecosystem}")]
    InvalidVersion { raw: String, ecosystem: String },

    /// A requirement string did not parse under the ecosystem grammar
    #[error("bad requirement '{raw}'")]
    BadRequirement { raw: String },

    /// A patch produced content identical to the original
    #[error("content of {name} did not change after applying edits")]
    ContentNotChanged { name: String },

    /// A patch produced content that no longer parses as the file's format
    #[error("patched content of {name} is no longer well-formed: {detail}")]
    PatchRejected { name: String, detail: String },

    /// A lock file that was expected to change is byte-identical post-run
    #[error("Expected lockfile to change! ({name})")]
    LockfileUnchanged { name: String },

    /// Native tool exited non-zero
    #[error("subprocess failed ({fingerprint}): {message}")]
    SubprocessFailed {
        /// Redacted command fingerprint safe for telemetry
        fingerprint: String,
        message: String,
        exit_status: Option<i32>,
    },

    /// Native tool exceeded the wall-clock limit
    #[error("subprocess timed out after {limit_secs}s ({fingerprint})")]
    Timeout { fingerprint: String, limit_secs: u64 },

    /// Disk or memory exhaustion detected; aborts the remaining batch
    #[error("resource exhausted during subprocess run: {detail}")]
    ResourceExhausted { detail: String },

    /// A path dependency resolves outside the permitted directory tree
    #[error("path dependency '{name}' resolves outside the repository: {path}")]
    PathDependencyUnreachable { name: String, path: PathBuf },

    /// Sandbox or file IO failure
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UpdateError {
    /// Creates a new InvalidVersion error
    pub fn invalid_version(raw: impl Into<String>, ecosystem: impl Into<String>) -> Self {
        UpdateError::InvalidVersion {
            raw: raw.into(),
            ecosystem: ecosystem.into(),
        }
    }

    /// Creates a new BadRequirement error
    pub fn bad_requirement(raw: impl Into<String>) -> Self {
        UpdateError::BadRequirement { raw: raw.into() }
    }

    /// Creates a new ContentNotChanged error
    pub fn content_not_changed(name: impl Into<String>) -> Self {
        UpdateError::ContentNotChanged { name: name.into() }
    }

    /// Creates a new PatchRejected error
    pub fn patch_rejected(name: impl Into<String>, detail: impl Into<String>) -> Self {
        UpdateError::PatchRejected {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Creates a new LockfileUnchanged error
    pub fn lockfile_unchanged(name: impl Into<String>) -> Self {
        UpdateError::LockfileUnchanged { name: name.into() }
    }

    /// Creates a new SubprocessFailed error
    pub fn subprocess_failed(
        fingerprint: impl Into<String>,
        message: impl Into<String>,
        exit_status: Option<i32>,
    ) -> Self {
        UpdateError::SubprocessFailed {
            fingerprint: fingerprint.into(),
            message: message.into(),
            exit_status,
        }
    }

    /// Creates a new PathDependencyUnreachable error
    pub fn path_unreachable(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        UpdateError::PathDependencyUnreachable {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Creates a new Io error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UpdateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this error must abort the remaining batch
    pub fn is_job_halting(&self) -> bool {
        matches!(self, UpdateError::ResourceExhausted { .. })
    }

    /// Returns true if an external job-level retry (full sandbox recreation)
    /// is a reasonable response to this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpdateError::Timeout { .. } | UpdateError::SubprocessFailed { .. }
        )
    }
}
