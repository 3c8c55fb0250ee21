//! Semver-style version grammar (npm, bundler, cargo, nuget, git tags)
//!
//! Handles:
//! - Full semver: `1.2.3`, `1.2.3-beta.1+build.5`
//! - Loose forms: `1.2`, `1`, `v1.2.3`
//! - Full git commit hashes (distinct comparison class)

use super::{Segment, Version, VersionScheme};
use crate::error::UpdateError;
use regex::Regex;
use std::sync::LazyLock;

/// Parser for semver-like version strings
pub struct SemverScheme;

// Loose grammar: dotted numerics, optional prerelease and build metadata
static LOOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<release>\d+(?:\.\d+)*)(?:-(?P<pre>[0-9A-Za-z][0-9A-Za-z.-]*))?(?:\+(?P<build>[0-9A-Za-z.-]+))?$")
        .unwrap()
});

impl VersionScheme for SemverScheme {
    fn parse(&self, raw: &str) -> Result<Version, UpdateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UpdateError::invalid_version(raw, "semver"));
        }

        if Version::looks_like_git_sha(trimmed) {
            return Ok(Version::git_sha(trimmed));
        }

        let stripped = super::strip_v_prefix(trimmed);

        // Strict three-part semver takes the fast path through the semver crate
        if let Ok(parsed) = semver::Version::parse(stripped) {
            return Ok(Version {
                raw: trimmed.to_string(),
                epoch: 0,
                segments: vec![
                    Segment::Num(parsed.major),
                    Segment::Num(parsed.minor),
                    Segment::Num(parsed.patch),
                ],
                prerelease: split_tokens(parsed.pre.as_str()),
                build: (!parsed.build.is_empty()).then(|| parsed.build.to_string()),
                git_sha: false,
            });
        }

        let caps = LOOSE_RE
            .captures(stripped)
            .ok_or_else(|| UpdateError::invalid_version(raw, "semver"))?;

        let segments = caps["release"]
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map(Segment::Num)
                    .map_err(|_| UpdateError::invalid_version(raw, "semver"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Version {
            raw: trimmed.to_string(),
            epoch: 0,
            segments,
            prerelease: caps
                .name("pre")
                .map(|m| split_tokens(m.as_str()))
                .unwrap_or_default(),
            build: caps.name("build").map(|m| m.as_str().to_string()),
            git_sha: false,
        })
    }
}

/// Splits a dotted prerelease string into typed segments
fn split_tokens(pre: &str) -> Vec<Segment> {
    if pre.is_empty() {
        return Vec::new();
    }
    pre.split('.')
        .map(|token| match token.parse::<u64>() {
            Ok(n) => Segment::Num(n),
            Err(_) => Segment::Str(token.to_string()),
        })
        .collect()
}
