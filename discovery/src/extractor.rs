//! Per-command help extraction.
//!
//! Turns the help page of one command path into a [`CommandSpec`]. The
//! hinted release track is probed first, then `ga → beta → alpha`; the
//! first track whose help succeeds becomes the spec's release.

use cmdgen_core::{CommandSpec, ReleaseTrack};
use tracing::debug;

use crate::parser::{is_group_help, parse_flags, parse_placeholders, parse_summary};
use crate::runner::{CommandRunner, HelpProbe};

/// Result of describing one command path.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedCommand {
    pub spec: CommandSpec,
    /// The help page lists children; the path is a group, not a command.
    pub is_group: bool,
    /// No track produced help; `spec` only carries the path.
    pub minimal: bool,
}

/// Builds a spec from captured help text without running anything.
///
/// Flags are the scraped flags plus `wide_flags`.
///
/// # Examples
///
/// ```
/// use cmdgen_core::ReleaseTrack;
/// use cmdgen_discovery::extractor::spec_from_help;
///
/// let help = "\
/// NAME
///     gcloud pubsub topics list - list Cloud Pub/Sub topics
///
/// SYNOPSIS
///     gcloud pubsub topics list [--limit=LIMIT] [GCLOUD_WIDE_FLAG ...]
///
/// FLAGS
///      --limit=LIMIT
///         Maximum number of resources to list.
/// ";
///
/// let extracted = spec_from_help("gcloud", "pubsub topics list", ReleaseTrack::Ga, help, &["--project".to_string()]);
/// assert_eq!(extracted.spec.flags, vec!["--limit", "--project"]);
/// assert!(extracted.spec.positionals.is_empty());
/// assert_eq!(extracted.spec.summary, "list Cloud Pub/Sub topics");
/// assert!(!extracted.is_group);
/// ```
pub fn spec_from_help(
    tool: &str,
    path: &str,
    release: ReleaseTrack,
    help: &str,
    wide_flags: &[String],
) -> ExtractedCommand {
    let flags = parse_flags(help)
        .into_iter()
        .chain(wide_flags.iter().cloned());

    let spec = CommandSpec::new(path)
        .with_release(release)
        .with_flags(flags)
        .with_positionals(parse_placeholders(help, tool, path))
        .with_summary(&parse_summary(help, tool, path));

    ExtractedCommand {
        spec,
        is_group: is_group_help(help),
        minimal: false,
    }
}

/// Probes help for `path` and extracts its spec.
///
/// When every track fails the path is still returned as a minimal spec
/// (hinted release, no flags, no positionals) so it stays usable.
pub fn describe_command<R: CommandRunner>(
    probe: &HelpProbe<R>,
    path: &str,
    release_hint: ReleaseTrack,
    wide_flags: &[String],
) -> ExtractedCommand {
    for track in track_order(release_hint) {
        let output = probe.help(path, track);
        if output.success() {
            debug!(path, release = %track, "Parsed help");
            return spec_from_help(probe.name(), path, track, output.text(), wide_flags);
        }
        debug!(path, release = %track, exit_code = output.exit_code, "Help failed on track");
    }

    debug!(path, "No track produced help, keeping minimal spec");
    ExtractedCommand {
        spec: CommandSpec::new(path).with_release(release_hint),
        is_group: false,
        minimal: true,
    }
}

/// Hinted track first, then the remaining tracks from most stable.
fn track_order(hint: ReleaseTrack) -> Vec<ReleaseTrack> {
    let mut order = vec![hint];
    order.extend(ReleaseTrack::ALL.into_iter().filter(|track| *track != hint));
    order
}
