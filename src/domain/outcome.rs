//! Update outcome types emitted by the orchestrator

use super::{Dependency, DependencyFile, RequirementEntry};
use crate::error::UpdateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record describing one applied dependency update, consumed by the
/// enrichment/PR layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedDependency {
    /// Package name
    pub name: String,
    /// Version before the update, when known
    pub previous_version: Option<String>,
    /// Version after the update
    pub new_version: String,
    /// Requirements as they stood before the update
    pub previous_requirements: Vec<RequirementEntry>,
    /// Requirements after the update
    pub new_requirements: Vec<RequirementEntry>,
    /// New file values carrying the patched content
    pub updated_files: Vec<DependencyFile>,
}

impl UpdatedDependency {
    /// Derives the updated record from the original dependency plus the
    /// computed target state
    pub fn from_dependency(
        dependency: &Dependency,
        new_version: impl Into<String>,
        new_requirements: Vec<RequirementEntry>,
        updated_files: Vec<DependencyFile>,
    ) -> Self {
        Self {
            name: dependency.name.clone(),
            previous_version: dependency.current_version.clone(),
            new_version: new_version.into(),
            previous_requirements: dependency.requirements.clone(),
            new_requirements,
            updated_files,
        }
    }
}

impl fmt::Display for UpdatedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.previous_version {
            Some(prev) => write!(f, "{}: {} -> {}", self.name, prev, self.new_version),
            None => write!(f, "{}: -> {}", self.name, self.new_version),
        }
    }
}

/// Result of one dependency-update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The current state already admits the best available version
    NoUpdateNeeded { name: String },
    /// Files were patched and the lock was regenerated
    Updated(UpdatedDependency),
}

impl UpdateOutcome {
    /// Creates a NoUpdateNeeded outcome
    pub fn no_update_needed(name: impl Into<String>) -> Self {
        UpdateOutcome::NoUpdateNeeded { name: name.into() }
    }

    /// Returns true if an update was applied
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }

    /// Returns the package name
    pub fn name(&self) -> &str {
        match self {
            UpdateOutcome::NoUpdateNeeded { name } => name,
            UpdateOutcome::Updated(updated) => &updated.name,
        }
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::NoUpdateNeeded { name } => write!(f, "{}: no update needed", name),
            UpdateOutcome::Updated(updated) => write!(f, "{}", updated),
        }
    }
}

/// A per-dependency failure recorded without aborting sibling updates
#[derive(Debug)]
pub struct FailedUpdate {
    /// Package name
    pub dependency: String,
    /// The error that stopped this update
    pub error: UpdateError,
}

impl fmt::Display for FailedUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.dependency, self.error)
    }
}

/// Aggregated result of a batch of update requests
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Outcomes for dependencies that completed
    pub outcomes: Vec<UpdateOutcome>,
    /// Per-dependency failures
    pub failures: Vec<FailedUpdate>,
    /// True when a job-halting error aborted the remaining requests
    pub halted: bool,
}

impl BatchSummary {
    /// Creates an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed outcome
    pub fn add_outcome(&mut self, outcome: UpdateOutcome) {
        self.outcomes.push(outcome);
    }

    /// Records a per-dependency failure
    pub fn add_failure(&mut self, dependency: impl Into<String>, error: UpdateError) {
        self.failures.push(FailedUpdate {
            dependency: dependency.into(),
            error,
        });
    }

    /// Number of dependencies actually updated
    pub fn updated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_updated()).count()
    }

    /// Returns true if any failure was recorded
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
