//! relock - dependency update engine
//!
//! Resolves the best admissible version for one dependency, patches the
//! manifest in place and regenerates the lock file with the ecosystem's
//! native tooling.

use anyhow::{bail, Context};
use clap::Parser;
use relock::cli::CliArgs;
use relock::domain::{
    Dependency, DependencyFile, Ecosystem, RequirementEntry, SourceDescriptor, UpdateOutcome,
};
use relock::orchestrator::{UpdateOrchestrator, UpdateRequest};
use relock::output::{render, OutputConfig};
use relock::progress::Progress;
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let ecosystem = Ecosystem::from_name(&args.ecosystem)
        .with_context(|| format!("unknown ecosystem '{}'", args.ecosystem))?;

    let request = build_request(&args, ecosystem)?;

    let mut progress = Progress::new(!args.quiet && !args.json);
    progress.spinner(&format!("updating {}", args.dependency));

    let orchestrator = UpdateOrchestrator::new().with_timeout(args.timeout);
    let summary = orchestrator.run_batch(std::slice::from_ref(&request));
    progress.finish_and_clear();

    if !args.dry_run {
        write_back(&args, &summary)?;
    }

    let config = OutputConfig::from_cli(args.json, args.quiet);
    let mut stdout = io::stdout().lock();
    render(&summary, &config, &mut stdout)?;
    stdout.flush()?;

    if summary.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Loads the manifest and lock files from disk and assembles the request
fn build_request(args: &CliArgs, ecosystem: Ecosystem) -> anyhow::Result<UpdateRequest> {
    let manifest_name = ecosystem.manifest_filename();
    let manifest_path = args.path.join(manifest_name);
    let manifest_content = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("cannot read {}", manifest_path.display()))?;

    let mut files = vec![DependencyFile::new(manifest_name, manifest_content)];
    for lock_name in ecosystem.lock_filenames() {
        let lock_path = args.path.join(lock_name);
        if let Ok(content) = std::fs::read_to_string(&lock_path) {
            files.push(DependencyFile::new(*lock_name, content));
        }
    }

    let requirement = match (&args.requirement, &args.target_ref) {
        (Some(requirement), _) => requirement.clone(),
        (None, Some(_)) => String::new(),
        (None, None) => bail!("--requirement is required for registry dependencies"),
    };

    let mut entry = RequirementEntry::registry(manifest_name, requirement);
    if args.target_ref.is_some() {
        entry = entry.with_source(SourceDescriptor::git(
            String::new(),
            args.current_ref.clone(),
            None,
        ));
    }
    let dependency = Dependency::new(
        &args.dependency,
        args.current_version.clone(),
        vec![entry],
        ecosystem,
    );

    Ok(UpdateRequest {
        dependency,
        files,
        available_versions: args.candidates.clone(),
        target_ref: args.target_ref.clone(),
    })
}

/// Writes patched and regenerated file content back into the target directory
fn write_back(args: &CliArgs, summary: &relock::domain::BatchSummary) -> anyhow::Result<()> {
    for outcome in &summary.outcomes {
        let updated = match outcome {
            UpdateOutcome::Updated(updated) => updated,
            UpdateOutcome::NoUpdateNeeded { .. } => continue,
        };
        for file in &updated.updated_files {
            let target = args.path.join(file.path());
            std::fs::write(&target, &file.content)
                .with_context(|| format!("cannot write {}", target.display()))?;
        }
    }
    Ok(())
}
