//! Output formatting for suggestions, specs and build reports.

use cmdgen_core::{
    Candidate, CommandSpec, ReleaseTrack, RenderOptions, ScoreBreakdown, ValidationOutcome,
    render_command,
};
use serde::Serialize;

use crate::report::BuildReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

/// A rendered candidate, as printed by `suggest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub command: String,
    pub path: String,
    pub release: ReleaseTrack,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    pub score: ScoreBreakdown,
    /// Live validation result, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationOutcome>,
}

impl Suggestion {
    pub fn from_candidate(tool: &str, candidate: &Candidate, options: &RenderOptions) -> Self {
        Self {
            command: render_command(tool, &candidate.spec, options),
            path: candidate.spec.path.clone(),
            release: candidate.spec.release,
            summary: candidate.spec.summary.clone(),
            score: candidate.score,
            validation: None,
        }
    }
}

/// Formats suggestions. In text mode each command is printed on its own
/// line; `explain` adds the score breakdown and summary below it.
pub fn format_suggestions(
    suggestions: &[Suggestion],
    format: OutputFormat,
    explain: bool,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(suggestions)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => serde_yaml::to_string(suggestions)
            .map_err(|e| format!("YAML serialization failed: {e}")),
        OutputFormat::Text => Ok(suggestions_to_text(suggestions, explain)),
    }
}

fn suggestions_to_text(suggestions: &[Suggestion], explain: bool) -> String {
    let mut out = String::new();
    for suggestion in suggestions {
        out.push_str(&suggestion.command);
        out.push('\n');
        if explain {
            let score = &suggestion.score;
            out.push_str(&format!(
                "  path: {} [{}]  score: {:.3} (overlap {:.2}, fuzzy {:.2}, verb {:.2})\n",
                suggestion.path,
                suggestion.release,
                score.total,
                score.overlap,
                score.fuzzy,
                score.verb_bonus
            ));
            if !suggestion.summary.is_empty() {
                out.push_str(&format!("  {}\n", suggestion.summary));
            }
        }
        if let Some(validation) = &suggestion.validation {
            let verdict = if validation.valid { "valid" } else { "invalid" };
            out.push_str(&format!("  validation: {verdict} ({})\n", validation.message));
        }
    }
    out
}

/// Formats one command spec.
pub fn format_spec(spec: &CommandSpec, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(spec).map_err(|e| format!("JSON serialization failed: {e}"))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(spec).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(spec_to_text(spec)),
    }
}

fn spec_to_text(spec: &CommandSpec) -> String {
    let mut out = format!("Command: {} [{}]\n", spec.path, spec.release);
    if !spec.summary.is_empty() {
        out.push_str(&format!("  {}\n", spec.summary));
    }
    if !spec.positionals.is_empty() {
        out.push_str(&format!("Positionals: {}\n", spec.positionals.join(", ")));
    }
    if !spec.flags.is_empty() {
        out.push_str(&format!("Flags ({}):\n", spec.flags.len()));
        for flag in &spec.flags {
            out.push_str(&format!("  {flag}\n"));
        }
    }
    out
}

/// Formats a build report.
pub fn format_report(report: &BuildReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => {
            let mut out = report.summary_line();
            out.push('\n');
            for warning in &report.warnings {
                out.push_str(&format!("  warning: {warning}\n"));
            }
            Ok(out)
        }
    }
}

/// Formats a validation outcome.
pub fn format_validation(outcome: &ValidationOutcome, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(outcome).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => {
            let verdict = if outcome.valid { "valid" } else { "invalid" };
            Ok(format!("{verdict}: {}\n", outcome.message))
        }
    }
}
