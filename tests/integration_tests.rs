//! Integration tests for the update pipeline
//!
//! These tests drive full update requests through resolution, sandboxed
//! lock regeneration and patch validation, using shell stand-ins for the
//! ecosystem-native tools.

use relock::domain::{
    Dependency, DependencyFile, Ecosystem, RequirementEntry, SourceDescriptor, UpdateOutcome,
};
use relock::error::UpdateError;
use relock::orchestrator::{Phase, UpdateOrchestrator, UpdateRequest};
use relock::patcher::compute_content_hash;
use relock::provider::{InMemoryProvider, RepositoryProvider};
use tempfile::TempDir;

const NPM_MANIFEST: &str = r#"{
  "name": "demo",
  "version": "1.0.0",
  "dependencies": {
    "left-pad": "^1.0.0",
    "lodash": "^4.17.21"
  },
  "devDependencies": {
    "typescript": "~5.0.0"
  }
}
"#;

fn npm_request() -> UpdateRequest {
    let dependency = Dependency::new(
        "left-pad",
        Some("1.0.0".to_string()),
        vec![RequirementEntry::registry("package.json", "^1.0.0")
            .with_groups(vec!["dependencies".to_string()])],
        Ecosystem::Npm,
    );
    UpdateRequest {
        dependency,
        files: vec![
            DependencyFile::new("package.json", NPM_MANIFEST),
            DependencyFile::new("package-lock.json", "{\n  \"lockfileVersion\": 3\n}\n"),
        ],
        available_versions: vec![
            "1.2.0".to_string(),
            "1.3.0".to_string(),
            "2.0.0-rc1".to_string(),
        ],
        target_ref: None,
    }
}

fn shell(script: impl Into<String>) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.into()]
}

#[test]
fn updates_manifest_in_place_and_keeps_unrelated_declarations() {
    let orchestrator = UpdateOrchestrator::new()
        .with_lock_command(shell("echo '{\"lockfileVersion\": 4}' > package-lock.json"));
    let outcome = orchestrator.update(&npm_request()).unwrap();

    let updated = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected an update, got {:?}", other),
    };

    // Prerelease 2.0.0-rc1 must not be chosen from a release version
    assert_eq!(updated.new_version, "1.3.0");
    assert_eq!(updated.new_requirements[0].requirement, "^1.3.0");

    let manifest = updated
        .updated_files
        .iter()
        .find(|f| f.name == "package.json")
        .unwrap();
    for (old_line, new_line) in NPM_MANIFEST.lines().zip(manifest.content.lines()) {
        if old_line.contains("left-pad") {
            assert!(new_line.contains(r#""left-pad": "^1.3.0""#));
        } else {
            assert_eq!(old_line, new_line, "unrelated line was modified");
        }
    }

    let lock = updated
        .updated_files
        .iter()
        .find(|f| f.name == "package-lock.json")
        .unwrap();
    assert!(lock.content.contains("\"lockfileVersion\": 4"));
}

#[test]
fn regenerated_lock_gets_recomputed_content_hash() {
    let pyproject = concat!(
        "[tool.poetry]\n",
        "name = \"demo\"\n",
        "\n",
        "[tool.poetry.dependencies]\n",
        "requests = \"^2.28.0\"\n",
    );
    let lock = concat!(
        "[[package]]\n",
        "name = \"requests\"\n",
        "version = \"2.28.0\"\n",
        "\n",
        "[metadata]\n",
        "content-hash = \"deadbeef\"\n",
    );
    let dependency = Dependency::new(
        "requests",
        Some("2.28.0".to_string()),
        vec![RequirementEntry::registry("pyproject.toml", "^2.28.0")],
        Ecosystem::Pip,
    );
    let request = UpdateRequest {
        dependency,
        files: vec![
            DependencyFile::new("pyproject.toml", pyproject),
            DependencyFile::new("poetry.lock", lock),
        ],
        available_versions: vec!["3.0.1".to_string()],
        target_ref: None,
    };

    let orchestrator = UpdateOrchestrator::new().with_lock_command(shell(
        "sed 's/2\\.28\\.0/3.0.1/' poetry.lock > poetry.lock.new && mv poetry.lock.new poetry.lock",
    ));
    let outcome = orchestrator.update(&request).unwrap();
    let updated = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected an update, got {:?}", other),
    };

    let manifest = updated
        .updated_files
        .iter()
        .find(|f| f.name == "pyproject.toml")
        .unwrap();
    assert!(manifest.content.contains("requests = \"^3.0.1\""));

    let lock = updated
        .updated_files
        .iter()
        .find(|f| f.name == "poetry.lock")
        .unwrap();
    let expected = compute_content_hash(&manifest.content);
    assert!(
        lock.content.contains(&expected),
        "content-hash must be recomputed over the patched manifest"
    );
    assert!(!lock.content.contains("deadbeef"));
}

#[test]
fn timeout_fails_the_update_and_removes_the_sandbox() {
    let marker_dir = TempDir::new().unwrap();
    let marker = marker_dir.path().join("sandbox-path");

    // Exit code 124 is what the timeout wrapper reports on expiry
    let orchestrator = UpdateOrchestrator::new()
        .with_lock_command(shell(format!("pwd > {}; exit 124", marker.display())));
    let failure = orchestrator.update(&npm_request()).unwrap_err();

    assert_eq!(failure.phase, Phase::InvokeNativeTool);
    assert!(matches!(failure.error, UpdateError::Timeout { .. }));
    assert!(failure.error.is_retryable());
    assert!(!failure.error.is_job_halting());

    // The recorded working directory must be gone: no partial lock file
    // survives a timed-out run
    let recorded = std::fs::read_to_string(&marker).unwrap();
    assert!(!std::path::Path::new(recorded.trim()).exists());
}

#[test]
fn git_submodule_ref_update_end_to_end() {
    let gitmodules = concat!(
        "[submodule \"vendored\"]\n",
        "\tpath = vendored\n",
        "\turl = https://example.com/repo.git\n",
        "\tbranch = v1\n",
    );
    let dependency = Dependency::new(
        "vendored",
        None,
        vec![RequirementEntry::registry(".gitmodules", "").with_source(
            SourceDescriptor::git("https://example.com/repo.git", Some("v1".to_string()), None),
        )],
        Ecosystem::GitSubmodules,
    );
    let request = UpdateRequest {
        dependency,
        files: vec![DependencyFile::new(".gitmodules", gitmodules)],
        available_versions: vec![],
        target_ref: Some("v2".to_string()),
    };

    let outcome = UpdateOrchestrator::new().update(&request).unwrap();
    let updated = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected an update, got {:?}", other),
    };
    assert_eq!(updated.new_version, "v2");
    assert!(updated.updated_files[0].content.contains("branch = v2"));
    assert!(updated.updated_files[0].content.contains("path = vendored"));
}

#[test]
fn batch_records_failures_and_continues() {
    let good = npm_request();
    let mut unparseable = npm_request();
    unparseable.dependency.name = "broken".to_string();
    unparseable.dependency.current_version = Some("not a version at all!".to_string());

    let orchestrator = UpdateOrchestrator::new()
        .with_lock_command(shell("echo regenerated > package-lock.json"));
    let summary = orchestrator.run_batch(&[unparseable, good]);

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].dependency, "broken");
    assert!(matches!(
        summary.failures[0].error,
        UpdateError::InvalidVersion { .. }
    ));
    assert_eq!(summary.updated_count(), 1);
    assert!(!summary.halted);
}

#[test]
fn batch_halts_on_disk_exhaustion() {
    let orchestrator = UpdateOrchestrator::new()
        .with_lock_command(shell("echo 'No space left on device' >&2; exit 1"));
    let summary = orchestrator.run_batch(&[npm_request(), npm_request(), npm_request()]);

    assert!(summary.halted);
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.outcomes.is_empty());
}

#[tokio::test]
async fn applied_update_flows_into_provider_pull_request() {
    let orchestrator = UpdateOrchestrator::new()
        .with_lock_command(shell("echo regenerated > package-lock.json"));
    let outcome = orchestrator.update(&npm_request()).unwrap();
    let updated = match outcome {
        UpdateOutcome::Updated(u) => u,
        other => panic!("expected an update, got {:?}", other),
    };

    let provider = InMemoryProvider::new("main");
    let branch = format!("relock/{}-{}", updated.name, updated.new_version);
    provider
        .create_commit(
            &branch,
            &format!("bump {} to {}", updated.name, updated.new_version),
            &updated.updated_files,
        )
        .await
        .unwrap();
    provider.create_pull_request(&branch, &updated).await.unwrap();

    assert_eq!(provider.commits().len(), 1);
    assert_eq!(
        provider.pull_requests(),
        vec![("relock/left-pad-1.3.0".to_string(), "left-pad".to_string())]
    );
}
