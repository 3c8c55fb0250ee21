//! relock - dependency update resolution and lockfile regeneration engine
//!
//! This library determines the latest permissible version for a dependency,
//! rewrites manifest and lock file content without disturbing unrelated
//! entries, and drives ecosystem-native tooling to regenerate lock files:
//! - npm (package.json / package-lock.json)
//! - pip/poetry (pyproject.toml / poetry.lock)
//! - bundler (Gemfile / Gemfile.lock)
//! - cargo (Cargo.toml / Cargo.lock)
//! - go modules (go.mod / go.sum)
//! - nuget (*.csproj / packages.lock.json)

pub mod cli;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod patcher;
pub mod progress;
pub mod provider;
pub mod requirement;
pub mod sandbox;
pub mod source;
pub mod subprocess;
pub mod version;
