//! Update orchestration pipeline
//!
//! Drives one dependency-update request through the phases
//! `ResolveSource → ResolveTarget → {NoUpdateNeeded} | PrepareSandbox →
//! WriteManifests → InvokeNativeTool → PatchLockMetadata → Validate`, each
//! failure carrying the phase it happened in. Requests in a batch are
//! processed independently: per-dependency errors are recorded without
//! stopping siblings, resource exhaustion aborts the whole batch.

use crate::domain::{
    BatchSummary, Dependency, DependencyFile, RequirementEntry, UpdateOutcome, UpdatedDependency,
};
use crate::error::UpdateError;
use crate::patcher::{Edit, FilePatcher};
use crate::requirement::updated_requirement;
use crate::sandbox::Sandbox;
use crate::source::{SourceKind, SourceResolver};
use crate::subprocess::SubprocessRunner;
use crate::version::scheme_for;
use std::collections::HashMap;
use std::fmt;

/// Pipeline phase of one update attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ResolveSource,
    ResolveTarget,
    PrepareSandbox,
    WriteManifests,
    InvokeNativeTool,
    PatchLockMetadata,
    Validate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::ResolveSource => "resolve-source",
            Phase::ResolveTarget => "resolve-target",
            Phase::PrepareSandbox => "prepare-sandbox",
            Phase::WriteManifests => "write-manifests",
            Phase::InvokeNativeTool => "invoke-native-tool",
            Phase::PatchLockMetadata => "patch-lock-metadata",
            Phase::Validate => "validate",
        };
        write!(f, "{}", s)
    }
}

/// An update failure together with the phase it happened in
#[derive(Debug)]
pub struct PhaseFailure {
    pub phase: Phase,
    pub error: UpdateError,
}

impl fmt::Display for PhaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed during {}: {}", self.phase, self.error)
    }
}

fn fail(phase: Phase) -> impl FnOnce(UpdateError) -> PhaseFailure {
    move |error| PhaseFailure { phase, error }
}

/// Native tool versions detected once per orchestration and passed down,
/// never memoized globally across jobs
#[derive(Debug, Default)]
pub struct ToolContext {
    versions: HashMap<String, String>,
}

impl ToolContext {
    /// Probes the version of one tool inside the sandbox; probe failures
    /// leave the tool unlisted rather than failing the update
    pub fn probe(runner: &SubprocessRunner, sandbox: &Sandbox, tool: &str) -> Self {
        let mut versions = HashMap::new();
        let command = vec![tool.to_string(), "--version".to_string()];
        if let Ok(result) = runner.run(&command, sandbox.path(), &HashMap::new(), 0) {
            if let Some(line) = result.stdout.lines().next() {
                versions.insert(tool.to_string(), line.trim().to_string());
            }
        }
        Self { versions }
    }

    /// Detected version string for a tool, when the probe succeeded
    pub fn version_of(&self, tool: &str) -> Option<&str> {
        self.versions.get(tool).map(String::as_str)
    }
}

/// One dependency-update request: the dependency, the file tree it lives in
/// and the candidate versions fetched by the (external) registry stage
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub dependency: Dependency,
    pub files: Vec<DependencyFile>,
    /// Registry version candidates, raw strings in no particular order
    pub available_versions: Vec<String>,
    /// Resolved target ref for git-sourced dependencies
    pub target_ref: Option<String>,
}

/// Drives dependency updates end to end
pub struct UpdateOrchestrator {
    timeout_secs: u64,
    lock_command: Option<Vec<String>>,
}

impl Default for UpdateOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateOrchestrator {
    pub fn new() -> Self {
        Self {
            timeout_secs: 600,
            lock_command: None,
        }
    }

    /// Overrides the native-tool wall-clock limit (builder pattern)
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Overrides the ecosystem's lock regeneration command (builder pattern)
    pub fn with_lock_command(mut self, command: Vec<String>) -> Self {
        self.lock_command = Some(command);
        self
    }

    /// Runs one update request through the pipeline
    pub fn update(&self, request: &UpdateRequest) -> Result<UpdateOutcome, PhaseFailure> {
        let dependency = &request.dependency;

        // ResolveSource
        let kind = SourceResolver::classify(dependency);
        for entry in &dependency.requirements {
            if let crate::domain::SourceDescriptor::Path { path } = &entry.source {
                SourceResolver::ensure_path_reachable(&dependency.name, path)
                    .map_err(fail(Phase::ResolveSource))?;
            }
        }

        // ResolveTarget
        let target = match kind {
            SourceKind::Git => match self.resolve_git_target(dependency, request) {
                GitTarget::Resolved(target) => target,
                GitTarget::UpToDate => {
                    return Ok(UpdateOutcome::no_update_needed(&dependency.name))
                }
                // No unanimous current ref to anchor a textual edit on;
                // candidate-based resolution applies instead
                GitTarget::UndeterminedRef => {
                    match self
                        .resolve_registry_target(dependency, request)
                        .map_err(fail(Phase::ResolveTarget))?
                    {
                        Some(target) => target,
                        None => return Ok(UpdateOutcome::no_update_needed(&dependency.name)),
                    }
                }
            },
            SourceKind::Registry | SourceKind::Path => {
                match self
                    .resolve_registry_target(dependency, request)
                    .map_err(fail(Phase::ResolveTarget))?
                {
                    Some(target) => target,
                    None => return Ok(UpdateOutcome::no_update_needed(&dependency.name)),
                }
            }
        };

        // PrepareSandbox
        let sandbox = Sandbox::new().map_err(fail(Phase::PrepareSandbox))?;

        // WriteManifests: patch declarations first, then lay the tree down
        let mut patched: Vec<DependencyFile> = Vec::new();
        let mut tree: Vec<DependencyFile> = Vec::new();
        for file in &request.files {
            let edits = target.edits_for(&file.name);
            if file.support_file || edits.is_empty() {
                tree.push(file.clone());
                continue;
            }
            let updated = FilePatcher::apply(file, &edits).map_err(fail(Phase::WriteManifests))?;
            patched.push(updated.clone());
            tree.push(updated);
        }
        if patched.is_empty() && !target.lockfile_only {
            // Nothing to edit means the resolver or the request is wrong
            return Err(fail(Phase::WriteManifests)(UpdateError::content_not_changed(
                &dependency.name,
            )));
        }
        sandbox.write_files(&tree).map_err(fail(Phase::WriteManifests))?;

        // InvokeNativeTool
        let command = self.lock_command_for(dependency);
        let mut regenerated: Vec<DependencyFile> = Vec::new();
        if !command.is_empty() {
            let runner = SubprocessRunner::new(sandbox.cache_dir())
                .with_redactions(vec![dependency.name.clone()]);
            let context = ToolContext::probe(&runner, &sandbox, &command[0]);
            let working_dir = sandbox.working_dir(&self.manifest_directory(request));
            runner
                .run(&command, &working_dir, &HashMap::new(), self.timeout_secs)
                .map_err(|e| match e {
                    UpdateError::SubprocessFailed {
                        fingerprint,
                        message,
                        exit_status,
                    } => {
                        // Tool version goes into the diagnostic payload
                        let message = match context.version_of(&command[0]) {
                            Some(v) => format!("{} [{} {}]", message, command[0], v),
                            None => message,
                        };
                        UpdateError::SubprocessFailed {
                            fingerprint,
                            message,
                            exit_status,
                        }
                    }
                    other => other,
                })
                .map_err(fail(Phase::InvokeNativeTool))?;

            // PatchLockMetadata: read regenerated locks back and fix the
            // manifest-derived hash field where the ecosystem carries one
            for file in &request.files {
                if !self.is_lock_file(dependency, file) {
                    continue;
                }
                let read = sandbox.read_back(file).map_err(fail(Phase::PatchLockMetadata))?;
                let fixed = match patched.iter().find(|m| !self.is_lock_file(dependency, m)) {
                    Some(manifest) => FilePatcher::patch_content_hash(&read, &manifest.content)
                        .map_err(fail(Phase::PatchLockMetadata))?,
                    None => read,
                };
                regenerated.push(fixed);
            }

            // Validate
            if dependency.ecosystem.expects_lockfile() {
                for file in &request.files {
                    if !self.is_lock_file(dependency, file) {
                        continue;
                    }
                    let new = regenerated
                        .iter()
                        .find(|r| r.name == file.name)
                        .ok_or_else(|| {
                            fail(Phase::Validate)(UpdateError::lockfile_unchanged(&file.name))
                        })?;
                    if !new.changed_from(file) {
                        return Err(fail(Phase::Validate)(UpdateError::lockfile_unchanged(
                            &file.name,
                        )));
                    }
                }
            }
        }

        let mut updated_files = patched;
        updated_files.retain(|f| !f.support_file);
        updated_files.extend(regenerated);

        Ok(UpdateOutcome::Updated(UpdatedDependency::from_dependency(
            dependency,
            target.new_version,
            target.new_requirements,
            updated_files,
        )))
    }

    /// Processes a batch of requests. Per-dependency failures are recorded
    /// and siblings continue; job-halting errors abort the rest.
    pub fn run_batch(&self, requests: &[UpdateRequest]) -> BatchSummary {
        let mut summary = BatchSummary::new();
        for request in requests {
            match self.update(request) {
                Ok(outcome) => summary.add_outcome(outcome),
                Err(failure) => {
                    let halting = failure.error.is_job_halting();
                    summary.add_failure(&request.dependency.name, failure.error);
                    if halting {
                        summary.halted = true;
                        break;
                    }
                }
            }
        }
        summary
    }

    fn resolve_git_target(&self, dependency: &Dependency, request: &UpdateRequest) -> GitTarget {
        let new_ref = match request.target_ref.clone() {
            Some(r) => r,
            None => return GitTarget::UpToDate,
        };
        let current_ref = SourceResolver::new_ref(dependency);
        if current_ref.as_deref() == Some(new_ref.as_str()) {
            return GitTarget::UpToDate;
        }
        let old_ref = match current_ref {
            Some(r) => r,
            None => return GitTarget::UndeterminedRef,
        };

        let mut edits: HashMap<String, Vec<Edit>> = HashMap::new();
        let mut new_requirements = Vec::new();
        for entry in &dependency.requirements {
            edits
                .entry(entry.file.clone())
                .or_default()
                .push(Edit::new(&dependency.name, &old_ref, &new_ref));
            let source = match &entry.source {
                crate::domain::SourceDescriptor::Git { url, branch, .. } => {
                    crate::domain::SourceDescriptor::git(
                        url.clone(),
                        Some(new_ref.clone()),
                        branch.clone(),
                    )
                }
                other => other.clone(),
            };
            new_requirements.push(entry.clone().with_source(source));
        }

        GitTarget::Resolved(ResolvedTarget {
            new_version: new_ref,
            new_requirements,
            edits,
            lockfile_only: false,
        })
    }

    fn resolve_registry_target(
        &self,
        dependency: &Dependency,
        request: &UpdateRequest,
    ) -> Result<Option<ResolvedTarget>, UpdateError> {
        let target = match SourceResolver::target_version(dependency, &request.available_versions)? {
            Some(target) => target,
            None => return Ok(None),
        };
        let scheme = scheme_for(dependency.ecosystem);

        let mut edits: HashMap<String, Vec<Edit>> = HashMap::new();
        let mut new_requirements: Vec<RequirementEntry> = Vec::new();
        for entry in &dependency.requirements {
            let new_req = updated_requirement(&entry.requirement, &target, scheme)?;
            if new_req != entry.requirement {
                edits.entry(entry.file.clone()).or_default().push(Edit::new(
                    &dependency.name,
                    &entry.requirement,
                    &new_req,
                ));
            }
            new_requirements.push(entry.with_requirement(new_req));
        }

        let lockfile_only = edits.is_empty();
        Ok(Some(ResolvedTarget {
            new_version: target.raw.clone(),
            new_requirements,
            edits,
            lockfile_only,
        }))
    }

    fn lock_command_for(&self, dependency: &Dependency) -> Vec<String> {
        match &self.lock_command {
            Some(command) => command.clone(),
            None => dependency
                .ecosystem
                .lock_command()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn is_lock_file(&self, dependency: &Dependency, file: &DependencyFile) -> bool {
        dependency
            .ecosystem
            .lock_filenames()
            .contains(&file.name.as_str())
    }

    fn manifest_directory(&self, request: &UpdateRequest) -> String {
        request
            .files
            .iter()
            .find(|f| f.name == request.dependency.ecosystem.manifest_filename())
            .map(|f| f.directory.clone())
            .unwrap_or_else(|| "/".to_string())
    }
}

/// Outcome of git-target resolution
enum GitTarget {
    Resolved(ResolvedTarget),
    UpToDate,
    /// Requirements carry no unanimous current ref, so no textual ref edit
    /// can be anchored
    UndeterminedRef,
}

/// Computed target state for one update: the version or ref to move to, the
/// derived requirement set and the textual edits per file
struct ResolvedTarget {
    new_version: String,
    new_requirements: Vec<RequirementEntry>,
    edits: HashMap<String, Vec<Edit>>,
    /// The constraint already admits the target; only the lock moves
    lockfile_only: bool,
}

impl ResolvedTarget {
    fn edits_for(&self, file_name: &str) -> Vec<Edit> {
        self.edits.get(file_name).cloned().unwrap_or_default()
    }
}
