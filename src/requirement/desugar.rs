//! Desugaring of ecosystem shorthand into canonical operator clauses
//!
//! Shorthand handled before generic operator parsing:
//! - caret `^1.2.3`: literal lower bound, upper bound increments the first
//!   non-zero-significant component and carries the prerelease-exclusion
//!   sentinel (`-0`) so `2.0.0-rc1`-like values stay outside the band
//! - tilde `~1.2.3` / `~>1.2.3` / `~=1.2.3`: pad to 3 components, then
//!   patch-level-only compatibility
//! - trailing wildcard `1.2.x` / `1.2.*`: compatible-within-prefix band

use super::{Clause, Op};
use crate::error::UpdateError;
use crate::version::{Segment, Version, VersionScheme};

/// Expands one constraint token into canonical clauses
pub(super) fn clauses_for_token(
    token: &str,
    scheme: &dyn VersionScheme,
) -> Result<Vec<Clause>, UpdateError> {
    let token = token.trim();

    // Unconstrained
    if token.is_empty() || token == "*" || token == "x" || token == "X" {
        return Ok(Vec::new());
    }

    if let Some(rest) = token.strip_prefix('^') {
        let version = parse_version(rest, token, scheme)?;
        return Ok(caret_clauses(&version));
    }

    for prefix in ["~>", "~=", "~"] {
        if let Some(rest) = token.strip_prefix(prefix) {
            let version = parse_version(rest.trim(), token, scheme)?;
            return Ok(tilde_clauses(&version));
        }
    }

    if has_trailing_wildcard(token) {
        return wildcard_clauses(token);
    }

    for (prefix, op) in [
        (">=", Op::Gte),
        ("<=", Op::Lte),
        ("!=", Op::NotEq),
        ("==", Op::Eq),
        (">", Op::Gt),
        ("<", Op::Lt),
        ("=", Op::Eq),
    ] {
        if let Some(rest) = token.strip_prefix(prefix) {
            let version = parse_version(rest.trim(), token, scheme)?;
            return Ok(vec![Clause { op, version }]);
        }
    }

    // Bare version means exact
    let version = parse_version(token, token, scheme)?;
    Ok(vec![Clause {
        op: Op::Eq,
        version,
    }])
}

fn parse_version(
    raw: &str,
    token: &str,
    scheme: &dyn VersionScheme,
) -> Result<Version, UpdateError> {
    scheme
        .parse(raw)
        .map_err(|_| UpdateError::bad_requirement(token))
}

fn has_trailing_wildcard(token: &str) -> bool {
    let last = token.rsplit('.').next().unwrap_or(token);
    matches!(last, "x" | "X" | "*") && token.contains('.')
}

/// Lower bound is the literal version; upper bound increments the first
/// non-zero-significant component
pub(super) fn caret_clauses(version: &Version) -> Vec<Clause> {
    let parts = version.numeric_segments();
    if parts.is_empty() {
        return vec![Clause {
            op: Op::Gte,
            version: version.clone(),
        }];
    }
    let pivot = parts.iter().position(|p| *p != 0).unwrap_or(
        // ^0.0.0 keeps the last component as the pivot
        parts.len() - 1,
    );

    let mut upper: Vec<u64> = parts[..=pivot.min(parts.len().saturating_sub(1))].to_vec();
    if let Some(last) = upper.last_mut() {
        *last += 1;
    }
    while upper.len() < 3 {
        upper.push(0);
    }

    vec![
        Clause {
            op: Op::Gte,
            version: version.clone(),
        },
        Clause {
            op: Op::Lt,
            version: exclusive_bound(&upper),
        },
    ]
}

/// Pads to 3 components, then allows patch-level movement only
pub(super) fn tilde_clauses(version: &Version) -> Vec<Clause> {
    let mut parts = version.numeric_segments();
    while parts.len() < 3 {
        parts.push(0);
    }

    let mut upper = parts.clone();
    upper.truncate(2);
    upper[1] += 1;
    upper.push(0);

    vec![
        Clause {
            op: Op::Gte,
            version: padded(version, &parts),
        },
        Clause {
            op: Op::Lt,
            version: exclusive_bound(&upper),
        },
    ]
}

/// `1.2.x` widens to "compatible within this prefix": >=1.2.0, <1.3.0
fn wildcard_clauses(token: &str) -> Result<Vec<Clause>, UpdateError> {
    let prefix: Vec<u64> = token
        .split('.')
        .take_while(|part| !matches!(*part, "x" | "X" | "*"))
        .map(|part| {
            part.parse::<u64>()
                .map_err(|_| UpdateError::bad_requirement(token))
        })
        .collect::<Result<_, _>>()?;

    if prefix.is_empty() {
        return Ok(Vec::new());
    }

    let mut lower = prefix.clone();
    while lower.len() < 3 {
        lower.push(0);
    }
    let mut upper = prefix;
    if let Some(last) = upper.last_mut() {
        *last += 1;
    }
    while upper.len() < 3 {
        upper.push(0);
    }

    Ok(vec![
        Clause {
            op: Op::Gte,
            version: Version::from_parts(&lower),
        },
        Clause {
            op: Op::Lt,
            version: exclusive_bound(&upper),
        },
    ])
}

/// Upper bound carrying the prerelease-exclusion sentinel
fn exclusive_bound(parts: &[u64]) -> Version {
    let mut version = Version::from_parts(parts).with_prerelease(vec![Segment::Num(0)]);
    version.raw.push_str("-0");
    version
}

fn padded(version: &Version, parts: &[u64]) -> Version {
    if version.numeric_segments().len() == parts.len() && !version.is_prerelease() {
        version.clone()
    } else if version.is_prerelease() {
        // Keep the prerelease lower bound intact, only pad release segments
        let mut padded = Version::from_parts(parts).with_prerelease(version.prerelease.clone());
        padded.raw = version.raw.clone();
        padded
    } else {
        Version::from_parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SemverScheme;

    fn expand(token: &str) -> Vec<Clause> {
        clauses_for_token(token, &SemverScheme).unwrap()
    }

    #[test]
    fn test_star_is_unconstrained() {
        assert!(expand("*").is_empty());
        assert!(expand("x").is_empty());
    }

    #[test]
    fn test_caret_major_band() {
        let clauses = expand("^1.2.3");
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].op, Op::Gte);
        assert_eq!(clauses[0].version.raw, "1.2.3");
        assert_eq!(clauses[1].op, Op::Lt);
        assert_eq!(clauses[1].version.numeric_segments(), vec![2, 0, 0]);
        assert!(clauses[1].version.is_prerelease(), "sentinel expected");
    }

    #[test]
    fn test_caret_zero_major() {
        let clauses = expand("^0.2.3");
        assert_eq!(clauses[1].version.numeric_segments(), vec![0, 3, 0]);
    }

    #[test]
    fn test_caret_zero_minor() {
        let clauses = expand("^0.0.3");
        assert_eq!(clauses[1].version.numeric_segments(), vec![0, 0, 4]);
    }

    #[test]
    fn test_tilde_patch_band() {
        let clauses = expand("~1.2.3");
        assert_eq!(clauses[0].version.numeric_segments(), vec![1, 2, 3]);
        assert_eq!(clauses[1].version.numeric_segments(), vec![1, 3, 0]);
    }

    #[test]
    fn test_tilde_pads_short_versions() {
        let clauses = expand("~1.2");
        assert_eq!(clauses[0].version.numeric_segments(), vec![1, 2, 0]);
        assert_eq!(clauses[1].version.numeric_segments(), vec![1, 3, 0]);
    }

    #[test]
    fn test_pessimistic_operator() {
        let clauses = expand("~> 2.1.0");
        assert_eq!(clauses[0].op, Op::Gte);
        assert_eq!(clauses[1].version.numeric_segments(), vec![2, 2, 0]);
    }

    #[test]
    fn test_wildcard_band() {
        let clauses = expand("1.2.x");
        assert_eq!(clauses[0].version.numeric_segments(), vec![1, 2, 0]);
        assert_eq!(clauses[1].version.numeric_segments(), vec![1, 3, 0]);
    }

    #[test]
    fn test_wildcard_major_band() {
        let clauses = expand("1.x");
        assert_eq!(clauses[0].version.numeric_segments(), vec![1, 0, 0]);
        assert_eq!(clauses[1].version.numeric_segments(), vec![2, 0, 0]);
    }

    #[test]
    fn test_plain_operators() {
        assert_eq!(expand(">=1.0.0")[0].op, Op::Gte);
        assert_eq!(expand(">1.0.0")[0].op, Op::Gt);
        assert_eq!(expand("<=1.0.0")[0].op, Op::Lte);
        assert_eq!(expand("<1.0.0")[0].op, Op::Lt);
        assert_eq!(expand("!=1.0.0")[0].op, Op::NotEq);
        assert_eq!(expand("==1.0.0")[0].op, Op::Eq);
        assert_eq!(expand("=1.0.0")[0].op, Op::Eq);
        assert_eq!(expand("1.0.0")[0].op, Op::Eq);
    }

    #[test]
    fn test_malformed_fails() {
        assert!(clauses_for_token("^banana", &SemverScheme).is_err());
        assert!(clauses_for_token(">=also.not.a.version!", &SemverScheme).is_err());
    }
}
