//! Output formatting for update results
//!
//! Human-readable text with colors, or JSON for machine processing.

use crate::domain::{BatchSummary, UpdateOutcome};
use colored::Colorize;
use std::io::Write;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Configuration for output formatting
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Minimal output: summary line only
    pub quiet: bool,
}

impl OutputConfig {
    pub fn from_cli(json: bool, quiet: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            quiet,
        }
    }
}

/// Semantic change class between two version strings, for display only
fn change_label(old: Option<&str>, new: &str) -> &'static str {
    let parse = |v: &str| -> Option<(u64, u64)> {
        let v = v.strip_prefix('v').unwrap_or(v);
        let mut parts = v.split(['.', '-', '+']);
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Some((major, minor))
    };
    match (old.and_then(parse), parse(new)) {
        (Some((old_major, old_minor)), Some((new_major, new_minor))) => {
            if new_major != old_major {
                "major"
            } else if new_minor != old_minor {
                "minor"
            } else {
                "patch"
            }
        }
        _ => "",
    }
}

/// Writes the batch summary in the configured format
pub fn render(summary: &BatchSummary, config: &OutputConfig, out: &mut dyn Write) -> std::io::Result<()> {
    match config.format {
        OutputFormat::Json => render_json(summary, out),
        OutputFormat::Text => render_text(summary, config.quiet, out),
    }
}

fn render_text(summary: &BatchSummary, quiet: bool, out: &mut dyn Write) -> std::io::Result<()> {
    if !quiet {
        for outcome in &summary.outcomes {
            match outcome {
                UpdateOutcome::Updated(updated) => {
                    let label = change_label(updated.previous_version.as_deref(), &updated.new_version);
                    let label = match label {
                        "major" => format!(" ({})", "major".red().bold()),
                        "minor" => format!(" ({})", "minor".yellow()),
                        "patch" => format!(" ({})", "patch".green()),
                        _ => String::new(),
                    };
                    writeln!(out, "{} {}{}", "updated".green().bold(), updated, label)?;
                }
                UpdateOutcome::NoUpdateNeeded { name } => {
                    writeln!(out, "{} {}", "up-to-date".dimmed(), name.dimmed())?;
                }
            }
        }
        for failure in &summary.failures {
            writeln!(out, "{} {}", "failed".red().bold(), failure)?;
        }
        if summary.halted {
            writeln!(out, "{}", "batch halted early".red().bold())?;
        }
    }

    writeln!(
        out,
        "{} updated, {} failed, {} total",
        summary.updated_count(),
        summary.failures.len(),
        summary.outcomes.len() + summary.failures.len(),
    )
}

fn render_json(summary: &BatchSummary, out: &mut dyn Write) -> std::io::Result<()> {
    let updated: Vec<_> = summary
        .outcomes
        .iter()
        .filter_map(|o| match o {
            UpdateOutcome::Updated(u) => Some(u),
            UpdateOutcome::NoUpdateNeeded { .. } => None,
        })
        .collect();
    let skipped: Vec<&str> = summary
        .outcomes
        .iter()
        .filter_map(|o| match o {
            UpdateOutcome::NoUpdateNeeded { name } => Some(name.as_str()),
            UpdateOutcome::Updated(_) => None,
        })
        .collect();
    let failures: Vec<_> = summary
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "dependency": f.dependency,
                "error": f.error.to_string(),
            })
        })
        .collect();

    let value = serde_json::json!({
        "updated": updated,
        "skipped": skipped,
        "failures": failures,
        "halted": summary.halted,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)
}
