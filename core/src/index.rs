use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{CommandSpec, ReleaseTrack};

/// Serializable index of the target CLI's command tree.
///
/// Commands are keyed by their space-joined path in a [`BTreeMap`], so
/// iteration order (and therefore ranking tie order and JSON output) is
/// deterministic.
///
/// # Examples
///
/// ```
/// use cmdgen_core::*;
///
/// let mut index = CommandIndex::new("gcloud", "2024-01-15T10:30:00Z");
/// index.insert(CommandSpec::new("run services describe"));
/// index.insert(CommandSpec::pending("run services list", ReleaseTrack::Ga));
///
/// assert_eq!(index.len(), 2);
/// assert_eq!(index.resolved_count(), 1);
/// assert_eq!(index.pending_paths(), vec!["run services list"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandIndex {
    /// Index contract version (populated from
    /// [`INDEX_CONTRACT_VERSION`](crate::INDEX_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    /// Target CLI binary the index was built from.
    pub tool: String,
    /// ISO-8601 timestamp of the build.
    pub generated_at: String,
    /// Indexed commands keyed by path.
    pub commands: BTreeMap<String, CommandSpec>,
}

impl CommandIndex {
    /// Creates an empty index for `tool`.
    pub fn new(tool: impl Into<String>, generated_at: impl Into<String>) -> Self {
        Self {
            schema_version: Some(crate::INDEX_CONTRACT_VERSION.to_string()),
            tool: tool.into(),
            generated_at: generated_at.into(),
            commands: BTreeMap::new(),
        }
    }

    /// Inserts or replaces the spec stored under its path.
    pub fn insert(&mut self, spec: CommandSpec) {
        self.commands.insert(spec.path.clone(), spec);
    }

    pub fn get(&self, path: &str) -> Option<&CommandSpec> {
        self.commands.get(path)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Paths whose help text has not been parsed yet.
    pub fn pending_paths(&self) -> Vec<&str> {
        self.commands
            .values()
            .filter(|spec| !spec.resolved)
            .map(|spec| spec.path.as_str())
            .collect()
    }

    /// Number of entries with parsed help.
    pub fn resolved_count(&self) -> usize {
        self.commands.values().filter(|spec| spec.resolved).count()
    }

    /// Iterates specs in path order.
    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.values()
    }
}

/// Filesystem identity of the target CLI executable.
///
/// Stored next to the index so a tool upgrade (new mtime or size)
/// invalidates the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolFingerprint {
    pub executable_path: String,
    pub mtime_secs: i64,
    pub size_bytes: u64,
}

/// Build metadata persisted beside the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub tool: String,
    /// SDK installation root reported by the tool, when available.
    pub sdk_root: Option<String>,
    pub commands_indexed: usize,
    #[serde(default)]
    pub commands_pending: usize,
    pub indexed_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<ToolFingerprint>,
}

impl IndexMeta {
    /// Summarizes an index; `sdk_root` and `fingerprint` are filled by the caller.
    pub fn for_index(index: &CommandIndex) -> Self {
        Self {
            tool: index.tool.clone(),
            sdk_root: None,
            commands_indexed: index.resolved_count(),
            commands_pending: index.len() - index.resolved_count(),
            indexed_at: index.generated_at.clone(),
            fingerprint: None,
        }
    }
}

/// Most stable of two tracks a path was listed on.
pub fn preferred_track(a: ReleaseTrack, b: ReleaseTrack) -> ReleaseTrack {
    a.min(b)
}
