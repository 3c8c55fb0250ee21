//! Go modules version grammar
//!
//! Handles:
//! - Tagged releases: `v1.2.3`, `v1.2.3-beta.1`
//! - Pseudo-versions: `v0.0.0-20210101120000-abcdef123456`
//! - Incompatible major versions: `v2.0.0+incompatible`
//!
//! Pseudo-versions keep their timestamp and short hash as prerelease
//! segments, so a pseudo-version orders below the tagged release it
//! precedes and two pseudo-versions order by commit timestamp.

use super::{Segment, Version, VersionScheme};
use crate::error::UpdateError;
use regex::Regex;
use std::sync::LazyLock;

/// Parser for go.mod version strings
pub struct GoScheme;

static PSEUDO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<release>\d+\.\d+\.\d+)(?:-(?P<tag>[0-9A-Za-z.]+?)\.)?-?(?P<ts>\d{14})-(?P<sha>[a-f0-9]{12})$")
        .unwrap()
});

static TAGGED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<release>\d+\.\d+\.\d+)(?:-(?P<pre>[0-9A-Za-z.-]+))?(?:\+(?P<build>incompatible))?$")
        .unwrap()
});

impl VersionScheme for GoScheme {
    fn parse(&self, raw: &str) -> Result<Version, UpdateError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UpdateError::invalid_version(raw, "go"));
        }

        if Version::looks_like_git_sha(trimmed) {
            return Ok(Version::git_sha(trimmed));
        }

        let stripped = super::strip_v_prefix(trimmed);

        if let Some(caps) = PSEUDO_RE.captures(stripped) {
            let segments = release_segments(&caps["release"], raw)?;
            let ts = caps["ts"].parse::<u64>().unwrap_or(0);
            let mut prerelease = Vec::new();
            if let Some(tag) = caps.name("tag") {
                for token in tag.as_str().split('.') {
                    prerelease.push(match token.parse::<u64>() {
                        Ok(n) => Segment::Num(n),
                        Err(_) => Segment::Str(token.to_string()),
                    });
                }
            }
            prerelease.push(Segment::Num(ts));
            prerelease.push(Segment::Str(caps["sha"].to_string()));
            return Ok(Version {
                raw: trimmed.to_string(),
                epoch: 0,
                segments,
                prerelease,
                build: None,
                git_sha: false,
            });
        }

        let caps = TAGGED_RE
            .captures(stripped)
            .ok_or_else(|| UpdateError::invalid_version(raw, "go"))?;
        let segments = release_segments(&caps["release"], raw)?;
        let prerelease = caps
            .name("pre")
            .map(|m| {
                m.as_str()
                    .split('.')
                    .map(|token| match token.parse::<u64>() {
                        Ok(n) => Segment::Num(n),
                        Err(_) => Segment::Str(token.to_string()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Version {
            raw: trimmed.to_string(),
            epoch: 0,
            segments,
            prerelease,
            build: caps.name("build").map(|m| m.as_str().to_string()),
            git_sha: false,
        })
    }
}

fn release_segments(release: &str, raw: &str) -> Result<Vec<Segment>, UpdateError> {
    release
        .split('.')
        .map(|part| {
            part.parse::<u64>()
                .map(Segment::Num)
                .map_err(|_| UpdateError::invalid_version(raw, "go"))
        })
        .collect()
}
