//! Run reports.
//!
//! A [`Reporter`] turns a [`RunSummary`] into one string. The text form is
//! for terminals; the JSON form is for editors and CI and keeps its
//! top-level shape (`files`, `time`, `memory`) even when nothing was
//! fixed, so consumers never need existence checks.

use serde::Serialize;
use similar::TextDiff;

use crate::runner::{ApplyOutcome, RunSummary};

/// Renders a finished run.
pub trait Reporter {
    /// Name the command line selects this reporter by.
    fn format(&self) -> &'static str;

    fn generate(&self, summary: &RunSummary) -> String;
}

/// Looks up a reporter by its format name.
pub fn reporter_for(format: &str) -> Option<Box<dyn Reporter>> {
    match format {
        "text" => Some(Box::new(TextReporter)),
        "json" => Some(Box::new(JsonReporter)),
        _ => None,
    }
}

/// Line diff between the original and fixed source of one file.
pub fn unified_diff(original: &str, fixed: &str) -> String {
    TextDiff::from_lines(original, fixed)
        .unified_diff()
        .context_radius(3)
        .header("Original", "New")
        .to_string()
}

// ----- text -----------------------------------------------------------

/// Human-readable report: numbered fixed files with optional diffs, then
/// syntax errors, then processing errors, then a one-line summary.
pub struct TextReporter;

impl Reporter for TextReporter {
    fn format(&self) -> &'static str {
        "text"
    }

    fn generate(&self, summary: &RunSummary) -> String {
        let mut out = String::new();
        let mut counter = 0;

        for report in &summary.reports {
            let ApplyOutcome::Fixed { non_converged } = report.outcome else {
                continue;
            };
            counter += 1;
            out.push_str(&format!(
                "   {}) {} ({})\n",
                counter,
                report.path.display(),
                report.applied_fixers.join(", ")
            ));
            if non_converged {
                out.push_str("      pass limit reached before the file settled\n");
            }
            if let Some(diff) = &report.diff {
                out.push_str("      ---------- begin diff ----------\n");
                out.push_str(diff);
                if !diff.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str("      ----------- end diff -----------\n");
            }
        }
        if counter > 0 {
            out.push('\n');
        }

        let invalid: Vec<_> = summary
            .reports
            .iter()
            .filter_map(|report| match &report.outcome {
                ApplyOutcome::Invalid { diagnostics } => Some((report, diagnostics)),
                _ => None,
            })
            .collect();
        if !invalid.is_empty() {
            out.push_str("Files with syntax errors:\n");
            for (report, diagnostics) in invalid {
                let details: Vec<String> =
                    diagnostics.iter().map(|d| d.to_string()).collect();
                out.push_str(&format!(
                    "   {} ({})\n",
                    report.path.display(),
                    details.join("; ")
                ));
            }
            out.push('\n');
        }

        let errors: Vec<_> = summary
            .reports
            .iter()
            .filter_map(|report| match &report.outcome {
                ApplyOutcome::Exception { fixer, message } => Some((report, fixer, message)),
                _ => None,
            })
            .collect();
        if !errors.is_empty() {
            out.push_str("Errors:\n");
            for (report, fixer, message) in errors {
                match fixer {
                    Some(name) => out.push_str(&format!(
                        "   {} [{}]: {}\n",
                        report.path.display(),
                        name,
                        message
                    )),
                    None => {
                        out.push_str(&format!("   {}: {}\n", report.path.display(), message))
                    }
                }
            }
            out.push('\n');
        }

        let verb = if summary.dry_run {
            format!(
                "Found {} of {} files that can be fixed",
                summary.fixed_count(),
                summary.file_count()
            )
        } else {
            format!(
                "Fixed {} of {} files",
                summary.fixed_count(),
                summary.file_count()
            )
        };
        out.push_str(&format!(
            "{} in {:.3} seconds, {:.3} MB memory used\n",
            verb,
            summary.duration.as_secs_f64(),
            summary.memory_bytes as f64 / 1024.0 / 1024.0
        ));

        out
    }
}

// ----- json -----------------------------------------------------------

#[derive(Serialize)]
struct JsonReport<'a> {
    files: Vec<JsonFile<'a>>,
    time: JsonTime,
    memory: f64,
}

#[derive(Serialize)]
struct JsonTime {
    total: f64,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    name: String,
    #[serde(rename = "appliedFixers")]
    applied_fixers: &'a [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    diff: Option<&'a str>,
}

/// Machine-readable report listing the fixed files.
pub struct JsonReporter;

impl Reporter for JsonReporter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn generate(&self, summary: &RunSummary) -> String {
        let files = summary
            .reports
            .iter()
            .filter(|report| matches!(report.outcome, ApplyOutcome::Fixed { .. }))
            .map(|report| JsonFile {
                name: report.path.display().to_string(),
                applied_fixers: &report.applied_fixers,
                diff: report.diff.as_deref(),
            })
            .collect();
        let report = JsonReport {
            files,
            time: JsonTime {
                total: round3(summary.duration.as_secs_f64()),
            },
            memory: round3(summary.memory_bytes as f64 / 1024.0 / 1024.0),
        };
        // The structure contains only strings and numbers; serialization
        // cannot fail.
        serde_json::to_string_pretty(&report).unwrap_or_default()
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
