//! Type definitions for indexed command paths and ranking results.
//!
//! This module defines the data model shared by every generator: a
//! [`CommandSpec`] describes one leaf command of the target CLI, a
//! [`Candidate`] pairs a spec with its ranking score, and
//! [`ValidationOutcome`] carries the verdict of a live help check. The types
//! are designed for serialization with [`serde`] so an index can round-trip
//! through the JSON cache.

use serde::{Deserialize, Serialize};

/// Version of the index contract (semver).
///
/// Embedded in every [`CommandIndex`](crate::CommandIndex) so that a cache
/// written by an incompatible build is rejected instead of misread.
pub const INDEX_CONTRACT_VERSION: &str = "1.0.0";

/// Release track of a command surface.
///
/// Hierarchical CLIs often expose the same command on several tracks.
/// `Ga` commands are invoked directly; `Beta` and `Alpha` commands need the
/// track token right after the tool name (`gcloud beta run ...`).
///
/// # Examples
///
/// ```
/// use cmdgen_core::ReleaseTrack;
///
/// assert_eq!(ReleaseTrack::default(), ReleaseTrack::Ga);
/// assert_eq!(ReleaseTrack::Beta.prefix(), Some("beta"));
/// assert_eq!(ReleaseTrack::from_token("alpha"), Some(ReleaseTrack::Alpha));
/// assert_eq!(ReleaseTrack::from_token("run"), None);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseTrack {
    /// Generally available surface (no prefix).
    #[default]
    Ga,
    /// Beta surface.
    Beta,
    /// Alpha surface.
    Alpha,
}

impl ReleaseTrack {
    /// Tracks in order of preference, most stable first.
    pub const ALL: [ReleaseTrack; 3] = [ReleaseTrack::Ga, ReleaseTrack::Beta, ReleaseTrack::Alpha];

    /// Token inserted after the tool name, if any.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Ga => None,
            Self::Beta => Some("beta"),
            Self::Alpha => Some("alpha"),
        }
    }

    /// Parses a leading path token (`beta`, `alpha`) into a non-GA track.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "beta" => Some(Self::Beta),
            "alpha" => Some(Self::Alpha),
            _ => None,
        }
    }

    /// Short label used in reports (`ga`, `beta`, `alpha`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Ga => "ga",
            Self::Beta => "beta",
            Self::Alpha => "alpha",
        }
    }
}

impl std::fmt::Display for ReleaseTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Indexed description of one command of the target CLI.
///
/// `path` never includes the tool name or a release token; the track is
/// tracked separately in `release`. A spec with `resolved == false` was
/// discovered in the command listing but its help has not been parsed yet.
///
/// # Examples
///
/// ```
/// use cmdgen_core::{CommandSpec, ReleaseTrack};
///
/// let spec = CommandSpec::new("run services describe")
///     .with_flags(["--region", "--project", "--region"])
///     .with_positionals(["SERVICE"]);
///
/// assert_eq!(spec.path_tokens(), vec!["run", "services", "describe"]);
/// assert_eq!(spec.flags, vec!["--project", "--region"]);
/// assert!(spec.supports_flag("--region"));
/// assert_eq!(spec.release, ReleaseTrack::Ga);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Space-joined command path (e.g. "run services describe").
    pub path: String,
    /// Release track the help was found on.
    #[serde(default)]
    pub release: ReleaseTrack,
    /// Long flags accepted by the command, sorted and unique.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Uppercase placeholder names from the usage line, in order.
    #[serde(default)]
    pub positionals: Vec<String>,
    /// One-line description from the help text.
    #[serde(default)]
    pub summary: String,
    /// Whether the help text has been parsed for this path.
    #[serde(default = "default_resolved")]
    pub resolved: bool,
}

fn default_resolved() -> bool {
    true
}

impl CommandSpec {
    /// Creates a resolved spec with no flags or positionals.
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            release: ReleaseTrack::Ga,
            flags: Vec::new(),
            positionals: Vec::new(),
            summary: String::new(),
            resolved: true,
        }
    }

    /// Creates an unresolved (pending) spec for a listed path.
    pub fn pending(path: &str, release: ReleaseTrack) -> Self {
        Self {
            release,
            resolved: false,
            ..Self::new(path)
        }
    }

    /// Sets the release track.
    pub fn with_release(mut self, release: ReleaseTrack) -> Self {
        self.release = release;
        self
    }

    /// Replaces the flag list; the result is sorted and de-duplicated.
    pub fn with_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags = flags.into_iter().map(Into::into).collect();
        self.flags.sort();
        self.flags.dedup();
        self
    }

    /// Replaces the positional list, keeping first occurrences in order.
    pub fn with_positionals<I, S>(mut self, positionals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positionals.clear();
        for positional in positionals {
            let positional = positional.into();
            if !self.positionals.contains(&positional) {
                self.positionals.push(positional);
            }
        }
        self
    }

    /// Sets the one-line summary.
    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = summary.to_string();
        self
    }

    /// Returns the individual path tokens.
    pub fn path_tokens(&self) -> Vec<&str> {
        self.path.split_whitespace().collect()
    }

    /// Returns `true` if the command accepts the given long flag.
    pub fn supports_flag(&self, flag: &str) -> bool {
        self.flags.binary_search_by(|probe| probe.as_str().cmp(flag)).is_ok()
    }
}

/// Collapses runs of whitespace in a command path.
pub fn normalize_path(path: &str) -> String {
    path.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Per-component score of a ranked path.
///
/// `total` is the weighted sum used for ordering; the components are kept
/// for `--explain` output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Jaccard overlap of non-verb tokens.
    pub overlap: f64,
    /// Character-level similarity of the joined prompt and the path.
    pub fuzzy: f64,
    /// Bonus for verb agreement.
    pub verb_bonus: f64,
    /// Weighted total.
    pub total: f64,
}

/// A ranked command suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub spec: CommandSpec,
    pub score: ScoreBreakdown,
}

/// Result of checking a command string against live help output.
///
/// # Examples
///
/// ```
/// use cmdgen_core::ValidationOutcome;
///
/// let ok = ValidationOutcome::valid("run services describe");
/// assert!(ok.valid);
/// assert_eq!(ok.message, "OK");
///
/// let bad = ValidationOutcome::invalid("Empty command");
/// assert!(!bad.valid);
/// assert!(bad.resolved_path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
    /// Command path whose help text was used for the check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
    /// Flags not accepted by the resolved command.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_flags: Vec<String>,
}

impl ValidationOutcome {
    /// A passing outcome for the given resolved path.
    pub fn valid(resolved_path: &str) -> Self {
        Self {
            valid: true,
            message: "OK".to_string(),
            resolved_path: Some(resolved_path.to_string()),
            unknown_flags: Vec::new(),
        }
    }

    /// A failing outcome with a message and no resolved path.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
            resolved_path: None,
            unknown_flags: Vec::new(),
        }
    }
}

/// Checks a full command string against the target CLI.
///
/// Implemented by the live help validator in the discovery crate and
/// consumed by generators that need a syntax check without depending on
/// subprocess plumbing.
pub trait CommandValidator {
    fn validate(&self, command: &str) -> ValidationOutcome;
}

impl<T: CommandValidator + ?Sized> CommandValidator for &T {
    fn validate(&self, command: &str) -> ValidationOutcome {
        (**self).validate(command)
    }
}
