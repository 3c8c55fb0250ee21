//! Targeted textual patching of manifest and lock files
//!
//! Files are never re-serialized wholesale: that would destroy comments and
//! formatting. Each edit is applied in two phases so both halves stay
//! unit-testable on their own:
//! 1. locate the minimal textual span declaring one dependency, tolerant of
//!    quoting and whitespace variants and of inline vs. block/table styles
//! 2. substitute only the old token inside that span
//!
//! A run of edits that leaves the content byte-identical is an invariant
//! violation (`ContentNotChanged`): a no-op "update" means the resolver or a
//! span pattern is wrong, and must never pass as success.

use crate::domain::DependencyFile;
use crate::error::UpdateError;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::ops::Range;
use std::sync::LazyLock;

static CONTENT_HASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(?P<head>content-hash\s*=\s*")(?P<hash>[0-9a-fA-F]+)(?P<tail>")"#).unwrap()
});

/// One substitution scoped to a named declaration
#[derive(Debug, Clone)]
pub struct Edit {
    /// Dependency name whose declaration span the edit is confined to
    pub declaration: String,
    /// Exact token to replace inside the span
    pub old: String,
    /// Replacement token
    pub new: String,
}

impl Edit {
    pub fn new(
        declaration: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            declaration: declaration.into(),
            old: old.into(),
            new: new.into(),
        }
    }
}

/// Applies targeted edits to dependency file content
pub struct FilePatcher;

impl FilePatcher {
    /// Applies all edits and returns a new file value (copy-on-write).
    /// Fails with `ContentNotChanged` when the result equals the original.
    pub fn apply(file: &DependencyFile, edits: &[Edit]) -> Result<DependencyFile, UpdateError> {
        let mut content = file.content.clone();
        for edit in edits {
            content = apply_edit(&content, edit);
        }

        if content == file.content {
            return Err(UpdateError::content_not_changed(&file.name));
        }

        check_well_formed(&file.name, &content)?;
        Ok(file.with_content(content))
    }

    /// Recomputes the manifest-derived content hash and substitutes it into
    /// the lock file post-hoc. The native regeneration step cannot be handed
    /// the final manifest state up front, so the hash field is corrected
    /// after the fact. Locks without a hash field pass through unchanged.
    pub fn patch_content_hash(
        lock: &DependencyFile,
        manifest_content: &str,
    ) -> Result<DependencyFile, UpdateError> {
        let hash = compute_content_hash(manifest_content);
        let patched = CONTENT_HASH_RE
            .replace(&lock.content, format!("${{head}}{}${{tail}}", hash))
            .to_string();
        Ok(lock.with_content(patched))
    }
}

/// Replaces the first occurrence of the old token inside each declaration
/// span. Spans are processed back to front so earlier offsets stay valid.
fn apply_edit(content: &str, edit: &Edit) -> String {
    let mut spans = declaration_spans(content, &edit.declaration);
    if spans.is_empty() {
        spans = nested_spans(content, &edit.declaration)
            .into_iter()
            .map(|s| s.range)
            .collect();
    }

    let mut result = content.to_string();
    for span in spans.into_iter().rev() {
        let slice = &result[span.clone()];
        if let Some(pos) = slice.find(&edit.old) {
            let start = span.start + pos;
            result.replace_range(start..start + edit.old.len(), &edit.new);
        }
    }
    result
}

/// Finds the minimal spans declaring a dependency by name. Handles inline
/// declarations (`"name": "^1.0.0"`, `name = "1.0"`) and TOML-style block
/// tables (`[dependencies.name]` plus the lines beneath it).
pub fn declaration_spans(content: &str, name: &str) -> Vec<Range<usize>> {
    let escaped = regex::escape(name);

    let inline = Regex::new(&format!(
        r#"(?m)^[^\S\n]*["']?{escaped}["']?[^\S\n]*[:=][^\n]*"#
    ));
    let table = Regex::new(&format!(
        r#"(?m)^\[[A-Za-z0-9_."' -]*?["']?{escaped}["']?\][^\n]*\n(?:[^\[\n][^\n]*\n?|\n)*"#
    ));

    let mut spans: Vec<Range<usize>> = Vec::new();
    if let Ok(re) = inline {
        spans.extend(re.find_iter(content).map(|m| m.range()));
    }
    if let Ok(re) = table {
        spans.extend(re.find_iter(content).map(|m| m.range()));
    }
    spans.sort_by_key(|r| r.start);
    spans.dedup();
    spans
}

/// One matched declaration, with its exact text for deduplication
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationMatch {
    pub text: String,
    pub range: Range<usize>,
}

static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<([A-Za-z][A-Za-z0-9]*)\b[^>]*?>").unwrap());

/// Finds element-style declarations referencing a dependency by name,
/// tolerant of both self-closing (`<PackageReference ... />`) and block
/// (`<PackageReference ...>...</PackageReference>`) forms. Block interiors
/// are re-scanned recursively because declarations can contain other
/// declarations as substrings; duplicates are removed by exact text.
pub fn nested_spans(content: &str, name: &str) -> Vec<DeclarationMatch> {
    let mut matches: Vec<DeclarationMatch> = Vec::new();
    collect_element_matches(content, 0, name, &mut matches);

    matches.sort_by_key(|m| m.range.start);
    let mut deduped: Vec<DeclarationMatch> = Vec::new();
    for m in matches {
        if !deduped.iter().any(|seen| seen.text == m.text) {
            deduped.push(m);
        }
    }
    deduped
}

fn collect_element_matches(content: &str, base: usize, name: &str, out: &mut Vec<DeclarationMatch>) {
    let double_quoted = format!("\"{}\"", name);
    let single_quoted = format!("'{}'", name);

    for caps in OPEN_TAG_RE.captures_iter(content) {
        let tag = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let element = match caps.get(1) {
            Some(m) => m.as_str(),
            None => continue,
        };
        if !tag.as_str().contains(&double_quoted) && !tag.as_str().contains(&single_quoted) {
            continue;
        }

        if tag.as_str().ends_with("/>") {
            out.push(DeclarationMatch {
                text: tag.as_str().to_string(),
                range: base + tag.start()..base + tag.end(),
            });
            continue;
        }

        let closing = format!("</{}>", element);
        if let Some(offset) = content[tag.end()..].find(&closing) {
            let close_start = tag.end() + offset;
            let end = close_start + closing.len();
            out.push(DeclarationMatch {
                text: content[tag.start()..end].to_string(),
                range: base + tag.start()..base + end,
            });
            // Re-scan the interior for nested occurrences
            collect_element_matches(&content[tag.end()..close_start], base + tag.end(), name, out);
        }
    }
}

/// Sha-256 of the manifest content, hex-encoded; the same derivation the
/// native tooling applies to its hash field
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Structured re-validation for formats with a canonical parser; other
/// extensions pass through (the textual patch is the only guarantee there)
fn check_well_formed(name: &str, content: &str) -> Result<(), UpdateError> {
    if name.ends_with(".json") {
        serde_json::from_str::<serde_json::Value>(content)
            .map_err(|e| UpdateError::patch_rejected(name, e.to_string()))?;
    } else if name.ends_with(".toml") {
        // Table is the document type; Value would only accept a lone value
        content
            .parse::<toml::Table>()
            .map_err(|e| UpdateError::patch_rejected(name, e.to_string()))?;
    }
    Ok(())
}
