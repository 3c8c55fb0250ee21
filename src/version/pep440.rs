//! PEP 440 version grammar (pip/poetry)
//!
//! Handles:
//! - Release: `1.2.3`, `2024.1`
//! - Epoch: `1!2.0.0`
//! - Pre-release spellings: `1.2a1`, `1.2.alpha1`, `1.2-rc.1`, `1.2b2`
//! - Dev releases: `1.2.dev3`
//! - Post releases: `1.2.post1`

use super::{Segment, Version, VersionScheme};
use crate::error::UpdateError;
use regex::Regex;
use std::sync::LazyLock;

/// Parser for PEP 440 version strings
pub struct Pep440Scheme;

static PEP440_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?:(?P<epoch>\d+)!)?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-._]?(?P<pre_l>a|alpha|b|beta|rc|c|pre|preview)[-._]?(?P<pre_n>\d+)?)?
        (?:[-._]?(?P<post_l>post|r|rev)[-._]?(?P<post_n>\d+)?)?
        (?:[-._]?(?P<dev_l>dev)[-._]?(?P<dev_n>\d+)?)?
        (?:\+(?P<local>[0-9a-z.]+))?
        $",
    )
    .unwrap()
});

/// Normalizes equivalent pre-release spellings to their canonical form
fn normalize_pre_label(label: &str) -> &'static str {
    match label.to_ascii_lowercase().as_str() {
        "a" | "alpha" => "a",
        "b" | "beta" => "b",
        _ => "rc",
    }
}

impl VersionScheme for Pep440Scheme {
    fn parse(&self, raw: &str) -> Result<Version, UpdateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UpdateError::invalid_version(raw, "pep440"));
        }

        if Version::looks_like_git_sha(trimmed) {
            return Ok(Version::git_sha(trimmed));
        }

        let stripped = super::strip_v_prefix(trimmed);
        let caps = PEP440_RE
            .captures(stripped)
            .ok_or_else(|| UpdateError::invalid_version(raw, "pep440"))?;

        let epoch = caps
            .name("epoch")
            .map(|m| m.as_str().parse::<u64>().unwrap_or(0))
            .unwrap_or(0);

        let mut segments = caps["release"]
            .split('.')
            .map(|part| {
                part.parse::<u64>()
                    .map(Segment::Num)
                    .map_err(|_| UpdateError::invalid_version(raw, "pep440"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // Post releases sort after the bare release; string tokens order
        // after padded numeric zeros, so appending works with the generic
        // comparison
        if caps.name("post_l").is_some() {
            let n = caps
                .name("post_n")
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0);
            segments.push(Segment::Str("post".to_string()));
            segments.push(Segment::Num(n));
        }

        let mut prerelease = Vec::new();
        if let Some(label) = caps.name("pre_l") {
            prerelease.push(Segment::Str(normalize_pre_label(label.as_str()).to_string()));
            prerelease.push(Segment::Num(
                caps.name("pre_n")
                    .and_then(|m| m.as_str().parse::<u64>().ok())
                    .unwrap_or(0),
            ));
        }
        if caps.name("dev_l").is_some() {
            prerelease.push(Segment::Str("dev".to_string()));
            prerelease.push(Segment::Num(
                caps.name("dev_n")
                    .and_then(|m| m.as_str().parse::<u64>().ok())
                    .unwrap_or(0),
            ));
        }

        Ok(Version {
            raw: trimmed.to_string(),
            epoch,
            segments,
            prerelease,
            build: caps.name("local").map(|m| m.as_str().to_string()),
            git_sha: false,
        })
    }
}
