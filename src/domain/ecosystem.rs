//! Ecosystem type definitions for supported package managers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported package-manager ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// npm/yarn/pnpm (package.json)
    Npm,
    /// pip/poetry (pyproject.toml)
    Pip,
    /// bundler (Gemfile)
    Bundler,
    /// cargo (Cargo.toml)
    Cargo,
    /// go modules (go.mod)
    GoModules,
    /// nuget (*.csproj)
    Nuget,
    /// git submodules (.gitmodules)
    GitSubmodules,
}

impl Ecosystem {
    /// Returns the manifest filename for this ecosystem
    pub fn manifest_filename(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "package.json",
            Ecosystem::Pip => "pyproject.toml",
            Ecosystem::Bundler => "Gemfile",
            Ecosystem::Cargo => "Cargo.toml",
            Ecosystem::GoModules => "go.mod",
            Ecosystem::Nuget => "project.csproj",
            Ecosystem::GitSubmodules => ".gitmodules",
        }
    }

    /// Returns the lock filenames for this ecosystem, in detection order
    pub fn lock_filenames(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Npm => &["package-lock.json", "pnpm-lock.yaml", "yarn.lock"],
            Ecosystem::Pip => &["poetry.lock", "uv.lock"],
            Ecosystem::Bundler => &["Gemfile.lock"],
            Ecosystem::Cargo => &["Cargo.lock"],
            Ecosystem::GoModules => &["go.sum"],
            Ecosystem::Nuget => &["packages.lock.json"],
            Ecosystem::GitSubmodules => &[],
        }
    }

    /// Returns the native command that regenerates the lock file in place
    pub fn lock_command(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Npm => &["npm", "install", "--package-lock-only", "--ignore-scripts"],
            Ecosystem::Pip => &["poetry", "lock", "--no-interaction"],
            Ecosystem::Bundler => &["bundle", "lock", "--update"],
            Ecosystem::Cargo => &["cargo", "update", "--workspace"],
            Ecosystem::GoModules => &["go", "mod", "tidy"],
            Ecosystem::Nuget => &["dotnet", "restore", "--use-lock-file"],
            Ecosystem::GitSubmodules => &[],
        }
    }

    /// Returns true if this ecosystem's native tooling resolves git tags and
    /// refs itself. Such dependencies are never classified as git-sourced by
    /// the generic rule; go is the one named exception.
    pub fn manages_git_refs_internally(&self) -> bool {
        matches!(self, Ecosystem::GoModules)
    }

    /// Returns true if updating a dependency is expected to change a lock file
    pub fn expects_lockfile(&self) -> bool {
        !self.lock_filenames().is_empty()
    }

    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pip => "pip",
            Ecosystem::Bundler => "bundler",
            Ecosystem::Cargo => "cargo",
            Ecosystem::GoModules => "go modules",
            Ecosystem::Nuget => "nuget",
            Ecosystem::GitSubmodules => "git submodules",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[
            Ecosystem::Npm,
            Ecosystem::Pip,
            Ecosystem::Bundler,
            Ecosystem::Cargo,
            Ecosystem::GoModules,
            Ecosystem::Nuget,
            Ecosystem::GitSubmodules,
        ]
    }

    /// Parse an ecosystem name as used on the command line
    pub fn from_name(name: &str) -> Option<Ecosystem> {
        match name {
            "npm" | "node" => Some(Ecosystem::Npm),
            "pip" | "python" | "poetry" => Some(Ecosystem::Pip),
            "bundler" | "ruby" => Some(Ecosystem::Bundler),
            "cargo" | "rust" => Some(Ecosystem::Cargo),
            "go" | "gomod" | "go_modules" => Some(Ecosystem::GoModules),
            "nuget" | "dotnet" => Some(Ecosystem::Nuget),
            "submodules" | "git_submodules" => Some(Ecosystem::GitSubmodules),
            _ => None,
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
