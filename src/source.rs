//! Source classification and target version resolution
//!
//! Decides where a dependency's content originates (registry, git, path) and
//! what the update target is: the next admissible registry version, or the
//! new git ref when every declaration agrees on one.

use crate::domain::Dependency;
use crate::error::UpdateError;
use crate::version::{scheme_for, strip_v_prefix, Version};
use std::cmp::Ordering;
use std::path::{Component, Path};

/// Aggregate origin classification for one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Registry,
    Git,
    Path,
}

/// Resolver for dependency origins and update targets
pub struct SourceResolver;

impl SourceResolver {
    /// Classifies a dependency's origin. A dependency is git-sourced only if
    /// every requirement's source is git; mixed sources fall back to
    /// registry handling. Ecosystems whose tooling manages git refs
    /// internally are always excluded from git classification.
    pub fn classify(dependency: &Dependency) -> SourceKind {
        if dependency.requirements.iter().any(|r| r.source.is_path()) {
            return SourceKind::Path;
        }
        if Self::git_dependency(dependency) {
            return SourceKind::Git;
        }
        SourceKind::Registry
    }

    /// Returns true when the dependency is git-sourced under the generic rule
    pub fn git_dependency(dependency: &Dependency) -> bool {
        if dependency.ecosystem.manages_git_refs_internally() {
            return false;
        }
        !dependency.requirements.is_empty()
            && dependency.requirements.iter().all(|r| r.source.is_git())
    }

    /// Returns the single agreed git ref across all requirements, or `None`
    /// when requirements disagree or carry no ref at all
    pub fn new_ref(dependency: &Dependency) -> Option<String> {
        if !Self::git_dependency(dependency) {
            return None;
        }
        let mut refs = dependency
            .requirements
            .iter()
            .map(|r| r.source.git_ref())
            .collect::<Vec<_>>();
        refs.dedup();
        match refs.as_slice() {
            [Some(single)] => Some((*single).to_string()),
            _ => None,
        }
    }

    /// Compares the single previous ref to the single new ref by value
    pub fn ref_changed(previous: &Dependency, updated: &Dependency) -> bool {
        Self::new_ref(previous) != Self::new_ref(updated)
    }

    /// Picks the latest admissible registry version from the candidate list.
    /// Prerelease candidates are only admissible when the current version is
    /// itself a prerelease; candidates failing the validity probe are
    /// skipped rather than failing the run.
    pub fn target_version(
        dependency: &Dependency,
        candidates: &[String],
    ) -> Result<Option<Version>, UpdateError> {
        let scheme = scheme_for(dependency.ecosystem);

        let current = match dependency.version() {
            Some(raw) => Some(scheme.parse(strip_v_prefix(raw)).map_err(|_| {
                UpdateError::invalid_version(raw, dependency.ecosystem.display_name())
            })?),
            None => None,
        };
        let allow_prerelease = current.as_ref().map(|c| c.is_prerelease()).unwrap_or(false);

        let mut best: Option<Version> = None;
        for raw in candidates {
            let stripped = strip_v_prefix(raw);
            if !scheme.correct(stripped) {
                continue;
            }
            let candidate = scheme.parse(stripped)?;
            if candidate.git_sha {
                continue;
            }
            if candidate.is_prerelease() && !allow_prerelease {
                continue;
            }
            if let Some(ref cur) = current {
                if candidate.compare(cur) != Some(Ordering::Greater) {
                    continue;
                }
            }
            let better = match &best {
                Some(b) => candidate.compare(b) == Some(Ordering::Greater),
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }
        Ok(best)
    }

    /// Rejects path dependencies that resolve outside the permitted tree.
    /// The check is lexical: absolute paths and traversals climbing past the
    /// root are never followed.
    pub fn ensure_path_reachable(name: &str, path: &str) -> Result<(), UpdateError> {
        let p = Path::new(path);
        if p.is_absolute() {
            return Err(UpdateError::path_unreachable(name, path));
        }
        let mut depth: i32 = 0;
        for component in p.components() {
            match component {
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(UpdateError::path_unreachable(name, path));
                    }
                }
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(UpdateError::path_unreachable(name, path));
                }
            }
        }
        Ok(())
    }
}
