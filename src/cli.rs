//! CLI argument parsing

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Dependency update engine driving one local update run
#[derive(Parser, Debug, Clone)]
#[command(name = "relock", version, about = "Resolve a dependency update and regenerate the lock file")]
pub struct CliArgs {
    /// Directory containing the manifest and lock files
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Ecosystem of the dependency (npm, pip, bundler, cargo, go, nuget, submodules)
    #[arg(short, long)]
    pub ecosystem: String,

    /// Name of the dependency to update
    #[arg(short, long)]
    pub dependency: String,

    /// Currently resolved version, when known
    #[arg(long)]
    pub current_version: Option<String>,

    /// Requirement string as declared in the manifest
    #[arg(short, long)]
    pub requirement: Option<String>,

    /// Candidate versions available upstream (can be specified multiple times)
    #[arg(long = "candidate", action = ArgAction::Append)]
    pub candidates: Vec<String>,

    /// Currently pinned git ref for git-sourced dependencies
    #[arg(long)]
    pub current_ref: Option<String>,

    /// Target git ref for git-sourced dependencies
    #[arg(long)]
    pub target_ref: Option<String>,

    /// Wall-clock limit for the native tool, in seconds (0 disables)
    #[arg(long, default_value_t = 600)]
    pub timeout: u64,

    /// Resolve and patch but do not write files back to disk
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,
}
