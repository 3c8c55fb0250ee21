//! Version parsing and comparison for supported ecosystem grammars
//!
//! A generic segments representation (ordered integer/string tokens) underlies
//! comparison, so each ecosystem scheme only supplies its grammar and any
//! segment-extraction quirk (leading "v", epoch, build metadata). Versions
//! that look like full git commit hashes form a distinct comparison class:
//! never ordered against semantic versions, only equality-compared.

mod go;
mod pep440;
mod semver;

pub use go::GoScheme;
pub use pep440::Pep440Scheme;
pub use semver::SemverScheme;

use crate::domain::Ecosystem;
use crate::error::UpdateError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static GIT_SHA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// One ordered token of a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Numeric token, compared numerically
    Num(u64),
    /// String token, compared lexically and ordered after numerics
    Str(String),
}

impl Segment {
    fn cmp_segment(&self, other: &Segment) -> Ordering {
        match (self, other) {
            (Segment::Num(a), Segment::Num(b)) => a.cmp(b),
            (Segment::Str(a), Segment::Str(b)) => a.cmp(b),
            // Numeric identifiers always have lower precedence
            (Segment::Num(_), Segment::Str(_)) => Ordering::Less,
            (Segment::Str(_), Segment::Num(_)) => Ordering::Greater,
        }
    }
}

/// An ecosystem-parsed version value, immutable once constructed
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Raw string as written, kept for redisplay
    pub raw: String,
    /// Epoch (PEP 440 `N!`), zero elsewhere
    pub epoch: u64,
    /// Release segments
    pub segments: Vec<Segment>,
    /// Pre-release segments; empty means a full release
    pub prerelease: Vec<Segment>,
    /// Build metadata after a `+`, ignored in ordering
    pub build: Option<String>,
    /// True for 40-hex-char git commit hashes
    pub git_sha: bool,
}

impl Version {
    /// Constructs a release version from numeric segments
    pub fn from_parts(parts: &[u64]) -> Self {
        let raw = parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            epoch: 0,
            segments: parts.iter().map(|p| Segment::Num(*p)).collect(),
            prerelease: Vec::new(),
            build: None,
            git_sha: false,
        }
    }

    /// Constructs the git-sha comparison class for a full commit hash
    pub fn git_sha(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self {
            epoch: 0,
            segments: Vec::new(),
            prerelease: Vec::new(),
            build: None,
            git_sha: true,
            raw,
        }
    }

    /// Returns true if the raw string is a full git commit hash
    pub fn looks_like_git_sha(raw: &str) -> bool {
        GIT_SHA_RE.is_match(raw)
    }

    /// Derives a copy with the given prerelease segments (raw untouched
    /// callers use this for comparison bounds, not redisplay)
    pub fn with_prerelease(mut self, prerelease: Vec<Segment>) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// Returns true if this version carries prerelease segments
    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// Returns the numeric release segments, stopping at the first
    /// non-numeric token
    pub fn numeric_segments(&self) -> Vec<u64> {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Num(n) => Some(*n),
                Segment::Str(_) => None,
            })
            .collect()
    }

    /// Compares two versions. Returns `None` when the pair is not ordered:
    /// git shas against semantic versions, or two differing git shas.
    pub fn compare(&self, other: &Version) -> Option<Ordering> {
        if self.git_sha || other.git_sha {
            if self.git_sha && other.git_sha && self.raw == other.raw {
                return Some(Ordering::Equal);
            }
            return None;
        }

        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => {}
            other => return Some(other),
        }

        match cmp_release(&self.segments, &other.segments) {
            Ordering::Equal => {}
            other => return Some(other),
        }

        // Pre-release orders before the release it precedes
        Some(match (self.prerelease.is_empty(), other.prerelease.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => cmp_prerelease(&self.prerelease, &other.prerelease),
        })
    }
}

/// Release segments compare with zero-padding of the shorter list
fn cmp_release(a: &[Segment], b: &[Segment]) -> Ordering {
    let len = a.len().max(b.len());
    let zero = Segment::Num(0);
    for i in 0..len {
        let sa = a.get(i).unwrap_or(&zero);
        let sb = b.get(i).unwrap_or(&zero);
        match sa.cmp_segment(sb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Pre-release segments compare element-wise; a shorter matching prefix
/// orders first (1.0.0-alpha < 1.0.0-alpha.1)
fn cmp_prerelease(a: &[Segment], b: &[Segment]) -> Ordering {
    for (sa, sb) in a.iter().zip(b.iter()) {
        match sa.cmp_segment(sb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Capability interface for one ecosystem's version grammar
pub trait VersionScheme: Send + Sync {
    /// Parse a version string under this grammar
    fn parse(&self, raw: &str) -> Result<Version, UpdateError>;

    /// Non-throwing validity probe, used before parsing untrusted lockfile
    /// data
    fn correct(&self, raw: &str) -> bool {
        self.parse(raw).is_ok()
    }
}

/// Strips a single leading "v" for ecosystems that accept both forms
pub fn strip_v_prefix(raw: &str) -> &str {
    raw.strip_prefix('v').unwrap_or(raw)
}

/// Returns the version scheme for an ecosystem, resolved at startup
pub fn scheme_for(ecosystem: Ecosystem) -> &'static dyn VersionScheme {
    static SEMVER: SemverScheme = SemverScheme;
    static PEP440: Pep440Scheme = Pep440Scheme;
    static GO: GoScheme = GoScheme;

    match ecosystem {
        Ecosystem::Npm
        | Ecosystem::Bundler
        | Ecosystem::Cargo
        | Ecosystem::Nuget
        | Ecosystem::GitSubmodules => &SEMVER,
        Ecosystem::Pip => &PEP440,
        Ecosystem::GoModules => &GO,
    }
}
