//! Help-text parsing for man-style CLI help pages.
//!
//! Help pages of the target CLI look like this:
//!
//! ```text
//! NAME
//!     gcloud run services describe - obtain details about a given service
//!
//! SYNOPSIS
//!     gcloud run services describe SERVICE [--region=REGION]
//!         [GCLOUD_WIDE_FLAG ...]
//!
//! FLAGS
//!      --region=REGION
//!         Region in which the resource can be found.
//!
//! GCLOUD WIDE FLAGS
//!     These flags are available to all commands: --account, --project.
//! ```
//!
//! Group pages list their children under `GROUPS` and `COMMANDS`. All
//! functions here take raw help text and normalize it first.

mod normalize;
mod sections;

use std::collections::BTreeSet;

use regex::Regex;
use std::sync::LazyLock;

pub use normalize::normalize_help_output;
pub use sections::{Section, section_header, split_sections};

static LISTING_ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z][a-z0-9_-]*)(?:\s{2,}\S.*)?$").expect("static regex must compile")
});
static FLAG_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:-[A-Za-z0-9],\s+)?--(\[no-\])?([a-z0-9][a-z0-9-]*)")
        .expect("static regex must compile")
});
static FLAG_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--(\[no-\])?([a-z0-9][a-z0-9-]*)").expect("static regex must compile")
});
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z0-9_-]*\b").expect("static regex must compile"));
static BARE_FLAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\[(]*--[a-z0-9][a-z0-9-]*$").expect("static regex must compile"));

/// Uppercase words in usage lines that are syntax, not placeholders.
const USAGE_KEYWORDS: &[&str] = &["USAGE", "FLAGS", "FLAG", "ARGS", "AND", "OR", "GCLOUD_WIDE_FLAG"];

/// Child entries of a group help page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    /// Sub-groups (descend further).
    pub groups: Vec<String>,
    /// Leaf commands.
    pub commands: Vec<String>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.commands.is_empty()
    }
}

/// Extracts `GROUPS` and `COMMANDS` entries.
///
/// Entries are indented lowercase tokens, alone on the line or followed by
/// two or more spaces and a description. The first entry fixes the indent;
/// lines at other indents (wrapped or deeper descriptions) are ignored.
///
/// # Examples
///
/// ```
/// use cmdgen_discovery::parser::parse_listing;
///
/// let help = "\
/// GROUPS
///     GROUP is one of the following:
///
///      revisions
///         View and manage your Cloud Run revisions.
///
/// COMMANDS
///     COMMAND is one of the following:
///
///      deploy
///         Create or update a Cloud Run service.
///      describe
///         Obtain details about a given service.
/// ";
///
/// let listing = parse_listing(help);
/// assert_eq!(listing.groups, vec!["revisions"]);
/// assert_eq!(listing.commands, vec!["deploy", "describe"]);
/// ```
pub fn parse_listing(help: &str) -> Listing {
    let normalized = normalize_help_output(help);
    let mut listing = Listing::default();

    for section in split_sections(&normalized).iter().filter(|s| s.is_listing()) {
        let entries = listing_entries(section);
        if section.header == "GROUPS" {
            listing.groups.extend(entries);
        } else {
            listing.commands.extend(entries);
        }
    }

    dedup_in_order(&mut listing.groups);
    dedup_in_order(&mut listing.commands);
    listing
}

fn listing_entries(section: &Section) -> Vec<String> {
    let mut entry_indent: Option<usize> = None;
    let mut entries = Vec::new();

    for line in &section.lines {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        let indent = line.len() - trimmed.len();
        if entry_indent.is_some_and(|expected| expected != indent) {
            continue;
        }
        if let Some(caps) = LISTING_ENTRY_RE.captures(trimmed) {
            entry_indent.get_or_insert(indent);
            entries.push(caps[1].to_string());
        }
    }
    entries
}

/// Extracts every flag defined at the start of a line inside a flag
/// section (`FLAGS`, `REQUIRED FLAGS`, `OPTIONAL FLAGS`, ...).
///
/// Wide-flag sections are excluded. `--[no-]name` yields both `--name`
/// and `--no-name`. The result is sorted and unique.
///
/// # Examples
///
/// ```
/// use cmdgen_discovery::parser::parse_flags;
///
/// let help = "\
/// DESCRIPTION
///     Use --platform to pick a target.
///
/// FLAGS
///      --region=REGION
///         Region, see also --zone.
///      --[no-]traffic
///         Route traffic.
/// ";
///
/// assert_eq!(parse_flags(help), vec!["--no-traffic", "--region", "--traffic"]);
/// ```
pub fn parse_flags(help: &str) -> Vec<String> {
    let normalized = normalize_help_output(help);
    let mut flags = BTreeSet::new();

    for section in split_sections(&normalized).iter().filter(|s| s.is_flags()) {
        for line in &section.lines {
            if let Some(caps) = FLAG_DEF_RE.captures(line) {
                insert_flag(&mut flags, caps.get(1).is_some(), &caps[2]);
            }
        }
    }

    flags.into_iter().collect()
}

/// Extracts every flag mentioned in a `... WIDE FLAGS` section.
pub fn parse_wide_flags(help: &str) -> Vec<String> {
    let normalized = normalize_help_output(help);
    let mut flags = BTreeSet::new();

    for section in split_sections(&normalized).iter().filter(|s| s.is_wide_flags()) {
        for caps in FLAG_MENTION_RE.captures_iter(&section.body()) {
            insert_flag(&mut flags, caps.get(1).is_some(), &caps[2]);
        }
    }

    flags.into_iter().collect()
}

fn insert_flag(flags: &mut BTreeSet<String>, negatable: bool, name: &str) {
    flags.insert(format!("--{name}"));
    if negatable {
        flags.insert(format!("--no-{name}"));
    }
}

/// Extracts positional placeholder names from the usage block.
///
/// The usage block is the `SYNOPSIS` or `USAGE` section, falling back to
/// the first line that starts with `<tool> ` (optionally after `Usage:`).
/// The leading `<tool> [release] <path>` is dropped; uppercase tokens are
/// collected in order, skipping syntax keywords and flag values
/// (`--flag=VALUE`, `--flag VALUE`).
///
/// # Examples
///
/// ```
/// use cmdgen_discovery::parser::parse_placeholders;
///
/// let help = "\
/// SYNOPSIS
///     gcloud run services describe SERVICE [--region=REGION]
///         [GCLOUD_WIDE_FLAG ...]
/// ";
///
/// assert_eq!(
///     parse_placeholders(help, "gcloud", "run services describe"),
///     vec!["SERVICE"]
/// );
/// ```
pub fn parse_placeholders(help: &str, tool: &str, path: &str) -> Vec<String> {
    let normalized = normalize_help_output(help);
    let Some(usage) = usage_block(&normalized, tool) else {
        return Vec::new();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let tail = strip_command_prefix(&tokens, tool, path);

    let mut placeholders: Vec<String> = Vec::new();
    let mut skip_value = false;
    for token in tail {
        if skip_value {
            skip_value = false;
            if token.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                continue;
            }
        }
        let bare = token.trim_start_matches(['[', '(']);
        if bare.starts_with('-') {
            // `--flag VALUE` only when the flag is not closed by a bracket.
            skip_value = !bare.contains('=') && BARE_FLAG_RE.is_match(token);
            continue;
        }
        for found in PLACEHOLDER_RE.find_iter(token) {
            let name = found.as_str();
            if USAGE_KEYWORDS.contains(&name) || placeholders.iter().any(|p| p == name) {
                continue;
            }
            placeholders.push(name.to_string());
        }
    }
    placeholders
}

fn usage_block(normalized: &str, tool: &str) -> Option<String> {
    let sections = split_sections(normalized);
    if let Some(section) = sections
        .iter()
        .find(|s| s.header == "SYNOPSIS" || s.header == "USAGE")
    {
        return Some(section.body());
    }

    let prefix = format!("{} ", cmdgen_core::tool_name(tool));
    normalized.lines().find_map(|line| {
        let trimmed = line.trim();
        let trimmed = trimmed
            .strip_prefix("Usage:")
            .or_else(|| trimmed.strip_prefix("usage:"))
            .map(str::trim_start)
            .unwrap_or(trimmed);
        trimmed.starts_with(&prefix).then(|| trimmed.to_string())
    })
}

fn strip_command_prefix<'a>(tokens: &[&'a str], tool: &str, path: &str) -> Vec<&'a str> {
    let mut rest = tokens;
    if let Some((first, tail)) = rest.split_first() {
        if *first == tool || *first == cmdgen_core::tool_name(tool) {
            rest = tail;
        }
    }
    if let Some((first, tail)) = rest.split_first() {
        if cmdgen_core::ReleaseTrack::from_token(first).is_some() {
            rest = tail;
        }
    }
    for expected in path.split_whitespace() {
        match rest.split_first() {
            Some((first, tail)) if *first == expected => rest = tail,
            _ => break,
        }
    }
    rest.to_vec()
}

/// One-line summary of a command.
///
/// Taken from the `NAME` line with its `<tool> <path> - ` prefix removed;
/// otherwise the first non-empty line that is not a section header.
///
/// # Examples
///
/// ```
/// use cmdgen_discovery::parser::parse_summary;
///
/// let help = "NAME\n    gcloud run services list - list available services\n";
/// assert_eq!(
///     parse_summary(help, "gcloud", "run services list"),
///     "list available services"
/// );
/// ```
pub fn parse_summary(help: &str, tool: &str, path: &str) -> String {
    let normalized = normalize_help_output(help);
    let sections = split_sections(&normalized);

    if let Some(name) = sections.iter().find(|s| s.header == "NAME") {
        if let Some(line) = name.lines.iter().map(|l| l.trim()).find(|l| !l.is_empty()) {
            let command = format!("{} {path}", cmdgen_core::tool_name(tool));
            let summary = line
                .split_once(" - ")
                .filter(|(head, _)| head.ends_with(path) || head.starts_with(&command))
                .map_or(line, |(_, rest)| rest);
            return summary.trim().to_string();
        }
    }

    normalized
        .lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with("NAME")
                && !line.starts_with("SYNOPSIS")
                && !line.starts_with("USAGE")
        })
        .unwrap_or_default()
        .to_string()
}

/// Returns `true` when the page lists sub-groups or sub-commands.
pub fn is_group_help(help: &str) -> bool {
    !parse_listing(help).is_empty()
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    items.retain(|item| seen.insert(item.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE_HELP: &str = "\
NAME
    gcloud run services describe - obtain details about a given service

SYNOPSIS
    gcloud run services describe (SERVICE : --namespace=NAMESPACE)
        [--region=REGION] [--format FORMAT] [--async] SECOND
        [GCLOUD_WIDE_FLAG ...]

DESCRIPTION
    Obtains details about a given service. Pass --verbose for more.

POSITIONAL ARGUMENTS
     Service resource - Service to describe. The arguments in this group
     can be used to specify the attributes of this resource.

FLAGS
     --region=REGION
        Region in which the resource can be found. Overrides --zone.

     --[no-]async
        Return immediately.

OTHER FLAGS
     --format=FORMAT
        Output format.

GCLOUD WIDE FLAGS
    These flags are available to all commands: --account, --billing-project,
    --configuration, --flags-file, --flatten, --format, --help,
    --impersonate-service-account, --log-http, --project, --quiet,
    --trace-token, --user-output-enabled, --verbosity.
";

    #[test]
    fn test_flags_only_from_flag_sections() {
        assert_eq!(
            parse_flags(DESCRIBE_HELP),
            vec!["--async", "--format", "--no-async", "--region"]
        );
    }

    #[test]
    fn test_wide_flags() {
        let wide = parse_wide_flags(DESCRIBE_HELP);
        assert_eq!(wide.len(), 14);
        assert!(wide.contains(&"--verbosity".to_string()));
        assert!(!wide.contains(&"--region".to_string()));
    }

    #[test]
    fn test_placeholders_skip_flag_values_and_keywords() {
        assert_eq!(
            parse_placeholders(DESCRIBE_HELP, "gcloud", "run services describe"),
            vec!["SERVICE", "SECOND"]
        );
    }

    #[test]
    fn test_placeholders_from_usage_line_fallback() {
        let help = "Usage: gcloud compute instances describe INSTANCE_NAME [optional flags]\n";
        assert_eq!(
            parse_placeholders(help, "gcloud", "compute instances describe"),
            vec!["INSTANCE_NAME"]
        );
    }

    #[test]
    fn test_placeholders_drop_release_prefix() {
        let help = "SYNOPSIS\n    gcloud beta run jobs execute JOB [--wait]\n";
        assert_eq!(parse_placeholders(help, "gcloud", "run jobs execute"), vec!["JOB"]);
    }

    #[test]
    fn test_tool_path_matches_help_by_file_name() {
        let usage = "Usage: gcloud compute instances describe INSTANCE_NAME [optional flags]\n";
        assert_eq!(
            parse_placeholders(usage, "/opt/sdk/bin/gcloud", "compute instances describe"),
            vec!["INSTANCE_NAME"]
        );
        assert_eq!(
            parse_placeholders(DESCRIBE_HELP, "/opt/sdk/bin/gcloud", "run services describe"),
            vec!["SERVICE", "SECOND"]
        );
        assert_eq!(
            parse_summary(DESCRIBE_HELP, "/opt/sdk/bin/gcloud", "run services describe"),
            "obtain details about a given service"
        );
    }

    #[test]
    fn test_summary_from_name_line() {
        assert_eq!(
            parse_summary(DESCRIBE_HELP, "gcloud", "run services describe"),
            "obtain details about a given service"
        );
    }

    #[test]
    fn test_summary_fallback() {
        let help = "\nList buckets in a project.\nUSAGE\n  gcloud storage buckets list\n";
        assert_eq!(
            parse_summary(help, "gcloud", "storage buckets list"),
            "List buckets in a project."
        );
    }

    #[test]
    fn test_listing_ignores_descriptions_at_other_indent() {
        let help = "\
COMMANDS
    COMMAND is one of the following:

     list
        list available services
     update
        update a service, e.g.
        multiple lines of description
     two-col    Also a command with an inline description.
";
        let listing = parse_listing(help);
        assert!(listing.groups.is_empty());
        assert_eq!(listing.commands, vec!["list", "update", "two-col"]);
        assert!(is_group_help(help));
        assert!(!is_group_help(DESCRIBE_HELP));
    }
}
