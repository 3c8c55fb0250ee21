//! Core domain types shared across the update engine

mod dependency;
mod dependency_file;
mod ecosystem;
mod outcome;

pub use dependency::{Dependency, RequirementEntry, SourceDescriptor};
pub use dependency_file::DependencyFile;
pub use ecosystem::Ecosystem;
pub use outcome::{BatchSummary, FailedUpdate, UpdateOutcome, UpdatedDependency};
