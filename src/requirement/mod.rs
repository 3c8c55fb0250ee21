//! Version requirement parsing and satisfaction checks
//!
//! A requirement is one or more operator clauses AND-combined; OR-groups
//! (`||` separators) produce independent alternatives with standard union
//! semantics. Ecosystem shorthand is desugared into canonical clauses before
//! generic operator handling (see `desugar`).

mod desugar;

use crate::error::UpdateError;
use crate::version::{Version, VersionScheme};
use std::cmp::Ordering;
use std::fmt;

/// Canonical comparison operator of one clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        };
        write!(f, "{}", s)
    }
}

/// One operator + version constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub op: Op,
    pub version: Version,
}

impl Clause {
    /// Tests one clause against a version. Unordered pairs (git shas against
    /// semantic versions) only satisfy inequality.
    fn matches(&self, version: &Version) -> bool {
        match version.compare(&self.version) {
            Some(ord) => match self.op {
                Op::Eq => ord == Ordering::Equal,
                Op::NotEq => ord != Ordering::Equal,
                Op::Gt => ord == Ordering::Greater,
                Op::Gte => ord != Ordering::Less,
                Op::Lt => ord == Ordering::Less,
                Op::Lte => ord != Ordering::Greater,
            },
            None => self.op == Op::NotEq,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A parsed version requirement (AND-combined clauses)
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// Raw constraint string as written
    pub raw: String,
    clauses: Vec<Clause>,
}

impl Requirement {
    /// Parses one constraint string (no OR-groups) under an ecosystem grammar
    pub fn parse(raw: &str, scheme: &dyn VersionScheme) -> Result<Self, UpdateError> {
        let trimmed = raw.trim();
        let mut clauses = Vec::new();

        // Hyphen range splits into an explicit >= / <= pair
        if let Some((low, high)) = split_hyphen_range(trimmed) {
            let low_v = scheme
                .parse(low)
                .map_err(|_| UpdateError::bad_requirement(raw))?;
            let high_v = scheme
                .parse(high)
                .map_err(|_| UpdateError::bad_requirement(raw))?;
            clauses.push(Clause {
                op: Op::Gte,
                version: low_v,
            });
            clauses.push(Clause {
                op: Op::Lte,
                version: high_v,
            });
            return Ok(Self {
                raw: trimmed.to_string(),
                clauses,
            });
        }

        for part in merged_tokens(trimmed) {
            clauses.extend(desugar::clauses_for_token(&part, scheme)?);
        }

        Ok(Self {
            raw: trimmed.to_string(),
            clauses,
        })
    }

    /// Returns true when the version satisfies every clause. A pure function
    /// of the stored clauses.
    pub fn satisfied_by(&self, version: &Version) -> bool {
        self.clauses.iter().all(|clause| clause.matches(version))
    }

    /// Returns the canonical clauses (desugared form)
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True when the requirement admits every version
    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Parses an OR-separated constraint string into independent alternatives;
/// satisfaction holds if ANY alternative matches
pub fn requirements_array(
    raw: &str,
    scheme: &dyn VersionScheme,
) -> Result<Vec<Requirement>, UpdateError> {
    raw.split("||")
        .map(|alt| Requirement::parse(alt, scheme))
        .collect()
}

/// Returns true if any OR-alternative of the constraint admits the version
pub fn any_satisfied(
    raw: &str,
    version: &Version,
    scheme: &dyn VersionScheme,
) -> Result<bool, UpdateError> {
    Ok(requirements_array(raw, scheme)?
        .iter()
        .any(|req| req.satisfied_by(version)))
}

/// Computes the style-preserving edit to a constraint for an update landing
/// on the new version. Pinned, operator-prefixed and wildcard styles are
/// bumped so the manifest records the version the update moved to; range and
/// OR styles widen only when the target falls outside the admitted set.
pub fn updated_requirement(
    raw: &str,
    new_version: &Version,
    scheme: &dyn VersionScheme,
) -> Result<String, UpdateError> {
    let trimmed = raw.trim();

    // Trailing wildcard: rewrite the numeric prefix from the target, keep
    // the wildcard tail. A band already containing the target stays as
    // written.
    if trimmed.contains('.') {
        let last = trimmed.rsplit('.').next().unwrap_or("");
        if matches!(last, "x" | "X" | "*") {
            if any_satisfied(trimmed, new_version, scheme)? {
                return Ok(trimmed.to_string());
            }
            let prefix_len = trimmed
                .split('.')
                .take_while(|p| !matches!(*p, "x" | "X" | "*"))
                .count()
                .max(1);
            let stars = trimmed.split('.').count() - prefix_len;
            let keep = new_version.numeric_segments();
            let mut parts: Vec<String> = keep
                .iter()
                .take(prefix_len)
                .map(|p| p.to_string())
                .collect();
            for _ in 0..stars {
                parts.push(last.to_string());
            }
            return Ok(parts.join("."));
        }
    }

    // Single-prefix styles keep the operator and substitute the target
    // version, even when the old constraint already admits it
    for prefix in ["^", "~>", "~=", "~", ">=", "==", "=", ""] {
        let rest = match prefix {
            "" => trimmed,
            p => match trimmed.strip_prefix(p) {
                Some(rest) => rest,
                None => continue,
            },
        };
        let rest = rest.trim();
        if scheme.correct(rest) {
            let spacer = if trimmed.len() > prefix.len() + rest.len() {
                " "
            } else {
                ""
            };
            return Ok(format!("{}{}{}", prefix, spacer, new_version.raw));
        }
        if prefix.is_empty() {
            break;
        }
    }

    // Range and OR styles admitting the target stay as written
    if any_satisfied(trimmed, new_version, scheme)? {
        return Ok(trimmed.to_string());
    }

    // Hyphen range: move the upper end up to the new version
    if let Some((low, _)) = split_hyphen_range(trimmed) {
        return Ok(format!("{} - {}", low, new_version.raw));
    }

    // Compound ranges: widen the upper bound, preserve everything else
    let mut rewritten: Vec<String> = Vec::new();
    let mut widened = false;
    for part in split_clauses(trimmed) {
        if let Some(rest) = part.strip_prefix("<=") {
            if scheme.correct(rest.trim()) {
                rewritten.push(format!("<={}", new_version.raw));
                widened = true;
                continue;
            }
        }
        if let Some(rest) = part.strip_prefix('<') {
            let rest = rest.trim();
            if !rest.starts_with('=') && scheme.correct(rest) {
                rewritten.push(format!("<={}", new_version.raw));
                widened = true;
                continue;
            }
        }
        rewritten.push(part.to_string());
    }
    if widened {
        return Ok(rewritten.join(", "));
    }

    Err(UpdateError::bad_requirement(raw))
}

/// Splits `a - b` hyphen ranges; plain hyphens inside prerelease tags do not
/// count, the separator must be surrounded by whitespace
fn split_hyphen_range(raw: &str) -> Option<(&str, &str)> {
    let idx = raw.find(" - ")?;
    let (low, high) = raw.split_at(idx);
    Some((low.trim(), high[3..].trim()))
}

/// Splits AND-combined clause tokens on commas or whitespace
fn split_clauses(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .flat_map(|part| part.split_whitespace())
        .filter(|part| !part.is_empty())
}

/// Like `split_clauses`, but re-joins a dangling operator token with the
/// version that follows it (`">= 1.0.0"` is one clause)
fn merged_tokens(raw: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for token in split_clauses(raw) {
        let is_bare_op = !token.is_empty()
            && token
                .chars()
                .all(|c| matches!(c, '>' | '<' | '=' | '!' | '~' | '^'));
        if is_bare_op {
            merged.push(token.to_string());
        } else if let Some(last) = merged.last_mut() {
            let dangling = last
                .chars()
                .all(|c| matches!(c, '>' | '<' | '=' | '!' | '~' | '^'));
            if dangling {
                last.push_str(token);
            } else {
                merged.push(token.to_string());
            }
        } else {
            merged.push(token.to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{Pep440Scheme, SemverScheme};

    fn semver(raw: &str) -> Version {
        SemverScheme.parse(raw).unwrap()
    }

    fn req(raw: &str) -> Requirement {
        Requirement::parse(raw, &SemverScheme).unwrap()
    }

    #[test]
    fn test_caret_satisfaction() {
        let r = req("^1.2.3");
        assert!(r.satisfied_by(&semver("1.2.3")));
        assert!(r.satisfied_by(&semver("1.9.9")));
        assert!(!r.satisfied_by(&semver("2.0.0")));
        assert!(!r.satisfied_by(&semver("1.2.2")));
    }

    #[test]
    fn test_caret_excludes_next_band_prerelease() {
        // 2.0.0-rc1 orders below 2.0.0 but the sentinel keeps it out
        let r = req("^1.2.3");
        assert!(!r.satisfied_by(&semver("2.0.0-rc1")));
    }

    #[test]
    fn test_wildcard_satisfaction() {
        let r = req("1.2.x");
        assert!(r.satisfied_by(&semver("1.2.0")));
        assert!(r.satisfied_by(&semver("1.2.99")));
        assert!(!r.satisfied_by(&semver("1.3.0")));
    }

    #[test]
    fn test_tilde_satisfaction() {
        let r = req("~1.2.3");
        assert!(r.satisfied_by(&semver("1.2.9")));
        assert!(!r.satisfied_by(&semver("1.3.0")));
    }

    #[test]
    fn test_range_pair() {
        let r = req(">=1.0.0, <2.0.0");
        assert!(r.satisfied_by(&semver("1.5.0")));
        assert!(!r.satisfied_by(&semver("2.0.0")));
    }

    #[test]
    fn test_space_separated_range() {
        let r = req(">=1.0.0 <2.0.0");
        assert!(r.satisfied_by(&semver("1.5.0")));
        assert!(!r.satisfied_by(&semver("2.0.0")));
    }

    #[test]
    fn test_operator_with_space() {
        let r = req(">= 1.0.0");
        assert!(r.satisfied_by(&semver("1.0.0")));
        assert!(!r.satisfied_by(&semver("0.9.0")));

        let r = Requirement::parse("~> 2.1", &SemverScheme).unwrap();
        assert!(r.satisfied_by(&semver("2.1.5")));
        assert!(!r.satisfied_by(&semver("2.2.0")));
    }

    #[test]
    fn test_hyphen_range() {
        let r = req("1.0.0 - 2.0.0");
        assert!(r.satisfied_by(&semver("1.0.0")));
        assert!(r.satisfied_by(&semver("2.0.0")));
        assert!(!r.satisfied_by(&semver("2.0.1")));
    }

    #[test]
    fn test_or_groups_union() {
        let scheme = &SemverScheme;
        let alts = requirements_array("^1.0.0 || ^2.0.0", scheme).unwrap();
        assert_eq!(alts.len(), 2);
        assert!(any_satisfied("^1.0.0 || ^2.0.0", &semver("2.5.0"), scheme).unwrap());
        assert!(any_satisfied("^1.0.0 || ^2.0.0", &semver("1.5.0"), scheme).unwrap());
        assert!(!any_satisfied("^1.0.0 || ^2.0.0", &semver("3.0.0"), scheme).unwrap());
    }

    #[test]
    fn test_unconstrained() {
        assert!(req("*").is_unconstrained());
        assert!(req("*").satisfied_by(&semver("99.0.0")));
    }

    #[test]
    fn test_not_eq() {
        let r = req("!=1.5.0");
        assert!(r.satisfied_by(&semver("1.4.0")));
        assert!(!r.satisfied_by(&semver("1.5.0")));
    }

    #[test]
    fn test_pep440_compatible_operator() {
        let scheme = &Pep440Scheme;
        let r = Requirement::parse("~=2.28.0", scheme).unwrap();
        assert!(r.satisfied_by(&scheme.parse("2.28.5").unwrap()));
        assert!(!r.satisfied_by(&scheme.parse("2.29.0").unwrap()));
    }

    #[test]
    fn test_malformed_fails_with_raw() {
        let err = Requirement::parse(">>1.0", &SemverScheme).unwrap_err();
        match err {
            UpdateError::BadRequirement { raw } => assert!(raw.contains(">1.0")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_updated_requirement_caret() {
        // The target is already admitted; the floor still moves with it
        let got = updated_requirement("^1.0.0", &semver("1.3.0"), &SemverScheme).unwrap();
        assert_eq!(got, "^1.3.0");

        let got = updated_requirement("^1.0.0", &semver("2.1.0"), &SemverScheme).unwrap();
        assert_eq!(got, "^2.1.0");
    }

    #[test]
    fn test_updated_requirement_exact() {
        let got = updated_requirement("1.0.0", &semver("1.3.0"), &SemverScheme).unwrap();
        assert_eq!(got, "1.3.0");
    }

    #[test]
    fn test_updated_requirement_tilde() {
        let got = updated_requirement("~1.2.3", &semver("1.4.0"), &SemverScheme).unwrap();
        assert_eq!(got, "~1.4.0");
    }

    #[test]
    fn test_updated_requirement_wildcard() {
        let got = updated_requirement("1.2.x", &semver("1.4.0"), &SemverScheme).unwrap();
        assert_eq!(got, "1.4.x");

        // Already inside the band, kept as written
        let got = updated_requirement("1.2.x", &semver("1.2.5"), &SemverScheme).unwrap();
        assert_eq!(got, "1.2.x");
    }

    #[test]
    fn test_updated_requirement_hyphen_range() {
        let got = updated_requirement("1.0.0 - 2.0.0", &semver("2.5.0"), &SemverScheme).unwrap();
        assert_eq!(got, "1.0.0 - 2.5.0");
    }

    #[test]
    fn test_updated_requirement_range_admitting_target_is_unchanged() {
        let got = updated_requirement(">=1.0.0, <2.0.0", &semver("1.5.0"), &SemverScheme).unwrap();
        assert_eq!(got, ">=1.0.0, <2.0.0");

        let got = updated_requirement("1.0.0 - 2.0.0", &semver("1.5.0"), &SemverScheme).unwrap();
        assert_eq!(got, "1.0.0 - 2.0.0");
    }

    #[test]
    fn test_updated_requirement_compound_range() {
        let got =
            updated_requirement(">=1.0.0, <2.0.0", &semver("2.5.0"), &SemverScheme).unwrap();
        assert_eq!(got, ">=1.0.0, <=2.5.0");
    }

    #[test]
    fn test_widening_monotonicity() {
        // The widened constraint must still admit the original lower bound's
        // admissible versions, never narrow below them
        let cases = [("^1.0.0", "2.1.0"), ("~1.2.3", "1.4.0"), ("1.2.x", "1.4.0")];
        for (raw, target) in cases {
            let target_v = semver(target);
            let widened = updated_requirement(raw, &target_v, &SemverScheme).unwrap();
            let widened_req = Requirement::parse(&widened, &SemverScheme).unwrap();
            assert!(
                widened_req.satisfied_by(&target_v),
                "{} widened to {} must admit {}",
                raw,
                widened,
                target
            );
        }
    }

    #[test]
    fn test_requirement_display_keeps_raw() {
        assert_eq!(format!("{}", req("^1.2.3")), "^1.2.3");
    }
}
