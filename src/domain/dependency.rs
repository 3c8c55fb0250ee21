//! Dependency information structures
//!
//! A `Dependency` is produced by the (external) file-parsing stage and is
//! consumed read-only here. Updates never mutate it in place; the engine
//! derives a new value carrying the computed target version and requirements.

use super::Ecosystem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of where a dependency's content originates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Published to a package registry
    Registry,
    /// Fetched from a git repository at a ref/branch
    Git {
        url: String,
        /// Tag or pinned ref, when present
        #[serde(rename = "ref")]
        git_ref: Option<String>,
        branch: Option<String>,
    },
    /// A local path dependency
    Path { path: String },
}

impl SourceDescriptor {
    /// Creates a git source descriptor
    pub fn git(
        url: impl Into<String>,
        git_ref: Option<String>,
        branch: Option<String>,
    ) -> Self {
        SourceDescriptor::Git {
            url: url.into(),
            git_ref,
            branch,
        }
    }

    /// Returns true for git sources
    pub fn is_git(&self) -> bool {
        matches!(self, SourceDescriptor::Git { .. })
    }

    /// Returns true for path sources
    pub fn is_path(&self) -> bool {
        matches!(self, SourceDescriptor::Path { .. })
    }

    /// Returns the pinned git ref, when this is a git source carrying one
    pub fn git_ref(&self) -> Option<&str> {
        match self {
            SourceDescriptor::Git { git_ref, .. } => git_ref.as_deref(),
            _ => None,
        }
    }
}

/// One requirement as declared in one dependency file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementEntry {
    /// The file this requirement was declared in
    pub file: String,
    /// The raw requirement string as written in the manifest
    pub requirement: String,
    /// Where the dependency content comes from for this declaration
    pub source: SourceDescriptor,
    /// Grouping metadata (e.g. "dependencies", "devDependencies")
    pub groups: Vec<String>,
}

impl RequirementEntry {
    /// Creates a registry-sourced requirement entry
    pub fn registry(file: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            requirement: requirement.into(),
            source: SourceDescriptor::Registry,
            groups: Vec::new(),
        }
    }

    /// Sets the source descriptor (builder pattern)
    pub fn with_source(mut self, source: SourceDescriptor) -> Self {
        self.source = source;
        self
    }

    /// Sets the grouping metadata (builder pattern)
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Derives a copy of this entry with a new requirement string
    pub fn with_requirement(&self, requirement: impl Into<String>) -> Self {
        Self {
            file: self.file.clone(),
            requirement: requirement.into(),
            source: self.source.clone(),
            groups: self.groups.clone(),
        }
    }
}

/// Represents a package dependency with its declared requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name
    pub name: String,
    /// Currently resolved version, when known (git-ref-only dependencies
    /// may not have one)
    pub current_version: Option<String>,
    /// Requirements as declared across dependency files, in file order
    pub requirements: Vec<RequirementEntry>,
    /// The ecosystem this dependency belongs to
    pub ecosystem: Ecosystem,
}

impl Dependency {
    /// Creates a new dependency
    pub fn new(
        name: impl Into<String>,
        current_version: Option<String>,
        requirements: Vec<RequirementEntry>,
        ecosystem: Ecosystem,
    ) -> Self {
        Self {
            name: name.into(),
            current_version,
            requirements,
            ecosystem,
        }
    }

    /// Returns the current version string, when known
    pub fn version(&self) -> Option<&str> {
        self.current_version.as_deref()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.current_version {
            Some(v) => write!(f, "{}@{} [{}]", self.name, v, self.ecosystem),
            None => write!(f, "{} [{}]", self.name, self.ecosystem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dependency() -> Dependency {
        Dependency::new(
            "left-pad",
            Some("1.0.0".to_string()),
            vec![RequirementEntry::registry("package.json", "^1.0.0")
                .with_groups(vec!["dependencies".to_string()])],
            Ecosystem::Npm,
        )
    }

    #[test]
    fn test_dependency_new() {
        let dep = sample_dependency();
        assert_eq!(dep.name, "left-pad");
        assert_eq!(dep.version(), Some("1.0.0"));
        assert_eq!(dep.ecosystem, Ecosystem::Npm);
        assert_eq!(dep.requirements.len(), 1);
    }

    #[test]
    fn test_dependency_without_version() {
        let dep = Dependency::new(
            "vendored",
            None,
            vec![RequirementEntry::registry(".gitmodules", "").with_source(
                SourceDescriptor::git("https://example.com/repo.git", Some("v1".to_string()), None),
            )],
            Ecosystem::GitSubmodules,
        );
        assert_eq!(dep.version(), None);
        assert!(dep.requirements[0].source.is_git());
    }

    #[test]
    fn test_requirement_entry_with_requirement_preserves_rest() {
        let entry = RequirementEntry::registry("package.json", "^1.0.0")
            .with_groups(vec!["dependencies".to_string()]);
        let updated = entry.with_requirement("^1.3.0");
        assert_eq!(updated.requirement, "^1.3.0");
        assert_eq!(updated.file, entry.file);
        assert_eq!(updated.groups, entry.groups);
        assert_eq!(updated.source, entry.source);
        // Original untouched
        assert_eq!(entry.requirement, "^1.0.0");
    }

    #[test]
    fn test_source_descriptor_git_ref() {
        let source = SourceDescriptor::git(
            "https://example.com/repo.git",
            Some("v2".to_string()),
            Some("main".to_string()),
        );
        assert!(source.is_git());
        assert_eq!(source.git_ref(), Some("v2"));
        assert!(SourceDescriptor::Registry.git_ref().is_none());
    }

    #[test]
    fn test_source_descriptor_path() {
        let source = SourceDescriptor::Path {
            path: "../lib".to_string(),
        };
        assert!(source.is_path());
        assert!(!source.is_git());
    }

    #[test]
    fn test_dependency_display() {
        assert_eq!(format!("{}", sample_dependency()), "left-pad@1.0.0 [npm]");
    }

    #[test]
    fn test_serde_round_trip() {
        let dep = sample_dependency();
        let json = serde_json::to_string(&dep).unwrap();
        let parsed: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dep);
    }

    #[test]
    fn test_serde_source_descriptor_tagged() {
        let json = serde_json::to_string(&SourceDescriptor::Registry).unwrap();
        assert_eq!(json, r#"{"type":"registry"}"#);
    }
}
