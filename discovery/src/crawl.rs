//! Command-tree discovery.
//!
//! The cheap path asks the tool for its full command list
//! (`<tool> meta list-commands`). When that is unavailable the tree is
//! walked through `--help` from the root, following `GROUPS` and
//! collecting `COMMANDS`.

use std::collections::{BTreeMap, HashSet};

use cmdgen_core::{ReleaseTrack, normalize_path, preferred_track, tool_name};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::parser::parse_listing;
use crate::runner::{CommandRunner, HelpProbe};

/// Default upper bound on help invocations during a crawl.
pub const DEFAULT_PROBE_BUDGET: usize = 4096;

/// Where the discovered paths came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverySource {
    ListCommands,
    HelpCrawl,
}

impl std::fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListCommands => write!(f, "list-commands"),
            Self::HelpCrawl => write!(f, "help-crawl"),
        }
    }
}

/// Discovered command paths, sorted by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCommands {
    pub source: DiscoverySource,
    /// Path and the most stable track it was listed on.
    pub paths: Vec<(String, ReleaseTrack)>,
    pub warnings: Vec<String>,
}

/// Lists the tool's commands, falling back to a help crawl.
pub fn discover_command_list<R: CommandRunner>(
    probe: &HelpProbe<R>,
    budget: usize,
) -> DiscoveredCommands {
    let listed = probe.list_commands();
    if listed.success() && !listed.stdout.trim().is_empty() {
        let paths = parse_command_list(&listed.stdout, probe.name());
        if !paths.is_empty() {
            info!(count = paths.len(), "Discovered commands via list-commands");
            return DiscoveredCommands {
                source: DiscoverySource::ListCommands,
                paths,
                warnings: Vec::new(),
            };
        }
    }

    debug!(exit_code = listed.exit_code, "list-commands unavailable, crawling help");
    let mut crawl = HelpCrawl {
        probe,
        budget,
        probes: 0,
        exhausted: false,
        visited: HashSet::new(),
        leaves: Vec::new(),
        warnings: Vec::new(),
    };
    crawl.run();

    let mut leaves = crawl.leaves;
    leaves.sort();
    leaves.dedup();
    info!(count = leaves.len(), probes = crawl.probes, "Discovered commands via help crawl");

    DiscoveredCommands {
        source: DiscoverySource::HelpCrawl,
        paths: leaves
            .into_iter()
            .map(|path| (path, ReleaseTrack::Ga))
            .collect(),
        warnings: crawl.warnings,
    }
}

/// Parses `meta list-commands` output into `(path, track)` pairs.
///
/// Only lines starting with `<tool> ` are kept. A path listed on several
/// tracks keeps the most stable one.
///
/// # Examples
///
/// ```
/// use cmdgen_core::ReleaseTrack;
/// use cmdgen_discovery::crawl::parse_command_list;
///
/// let out = "gcloud run services list\ngcloud beta run jobs list\ngcloud alpha run services list\n";
/// assert_eq!(
///     parse_command_list(out, "gcloud"),
///     vec![
///         ("run jobs list".to_string(), ReleaseTrack::Beta),
///         ("run services list".to_string(), ReleaseTrack::Ga),
///     ]
/// );
/// ```
pub fn parse_command_list(output: &str, tool: &str) -> Vec<(String, ReleaseTrack)> {
    let prefix = format!("{} ", tool_name(tool));
    let mut paths: BTreeMap<String, ReleaseTrack> = BTreeMap::new();

    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix(&prefix) else {
            continue;
        };
        let mut tokens = rest.split_whitespace().peekable();
        let track = tokens
            .peek()
            .and_then(|first| ReleaseTrack::from_token(first))
            .unwrap_or_default();
        if track != ReleaseTrack::Ga {
            tokens.next();
        }
        let path = normalize_path(&tokens.collect::<Vec<_>>().join(" "));
        if path.is_empty() {
            continue;
        }
        paths
            .entry(path)
            .and_modify(|existing| *existing = preferred_track(*existing, track))
            .or_insert(track);
    }

    paths.into_iter().collect()
}

struct HelpCrawl<'a, R> {
    probe: &'a HelpProbe<R>,
    budget: usize,
    probes: usize,
    exhausted: bool,
    visited: HashSet<String>,
    leaves: Vec<String>,
    warnings: Vec<String>,
}

impl<R: CommandRunner> HelpCrawl<'_, R> {
    fn run(&mut self) {
        let root = self.probe.help("", ReleaseTrack::Ga);
        self.probes += 1;
        if !root.success() {
            warn!(tool = self.probe.tool(), "Root help failed");
            self.warnings
                .push(format!("root help failed for '{}'", self.probe.tool()));
            return;
        }

        let listing = parse_listing(root.text());
        for command in listing.commands {
            self.leaves.push(command);
        }
        for group in listing.groups {
            if ReleaseTrack::from_token(&group).is_some() {
                continue;
            }
            self.walk(vec![group]);
        }
    }

    fn walk(&mut self, prefix: Vec<String>) {
        let path = prefix.join(" ");
        if !self.visited.insert(path.clone()) {
            return;
        }
        if self.probes >= self.budget {
            if !self.exhausted {
                self.exhausted = true;
                self.warnings.push(format!(
                    "probe budget of {} exhausted; command list is incomplete",
                    self.budget
                ));
            }
            return;
        }

        let help = self.probe.help(&path, ReleaseTrack::Ga);
        self.probes += 1;
        if !help.success() {
            debug!(path = %path, exit_code = help.exit_code, "Group help failed");
            self.warnings.push(format!("help failed for '{path}'"));
            return;
        }

        let listing = parse_listing(help.text());
        for command in listing.commands {
            self.leaves.push(format!("{path} {command}"));
        }
        for group in listing.groups {
            let mut child = prefix.clone();
            child.push(group);
            self.walk(child);
        }
    }
}
