//! On-disk index cache with fingerprint-based invalidation.
//!
//! The index and its metadata are stored as pretty JSON next to each
//! other: `<cache_dir>/<tool>_index.json` and `<tool>_meta.json`. The
//! metadata carries a [`ToolFingerprint`] (resolved executable path, mtime,
//! size) so that upgrading the tool invalidates the cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use cmdgen_core::{CommandIndex, IndexMeta, ToolFingerprint};
use tracing::debug;

use crate::error::Result;

/// A loaded index with its metadata.
#[derive(Debug, Clone)]
pub struct CachedIndex {
    pub index: CommandIndex,
    pub meta: IndexMeta,
}

/// File-backed index cache for one tool.
#[derive(Debug, Clone)]
pub struct IndexCache {
    cache_dir: PathBuf,
    stem: String,
}

impl IndexCache {
    /// Cache for `tool` (a binary name or path) under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>, tool: &str) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            stem: cache_stem(tool),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}_index.json", self.stem))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}_meta.json", self.stem))
    }

    /// Loads both files. Returns `None` when either is missing or unreadable.
    pub fn load(&self) -> Option<CachedIndex> {
        let index: CommandIndex = read_json(&self.index_path())?;
        let meta: IndexMeta = read_json(&self.meta_path())?;
        Some(CachedIndex { index, meta })
    }

    /// Writes both files, creating the cache directory.
    pub fn save(&self, index: &CommandIndex, meta: &IndexMeta) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)?;
        fs::write(self.index_path(), serde_json::to_string_pretty(index)?)?;
        fs::write(self.meta_path(), serde_json::to_string_pretty(meta)?)?;
        debug!(path = %self.index_path().display(), commands = index.len(), "Saved index");
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Ignoring unreadable cache file");
            None
        }
    }
}

/// File-name-safe stem from a tool name or path (`/opt/sdk/bin/gcloud` → `gcloud`).
fn cache_stem(tool: &str) -> String {
    let name = Path::new(tool)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| tool.to_string());
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "tool".to_string() } else { stem }
}

/// Fingerprints the executable `tool` resolves to.
///
/// Returns `None` when the tool cannot be found.
pub fn tool_fingerprint(tool: &str) -> Option<ToolFingerprint> {
    let exe_path = resolve_executable(tool)?;
    let metadata = fs::metadata(&exe_path).ok()?;
    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    Some(ToolFingerprint {
        executable_path: exe_path.display().to_string(),
        mtime_secs: mtime,
        size_bytes: metadata.len(),
    })
}

fn resolve_executable(tool: &str) -> Option<PathBuf> {
    let candidate = Path::new(tool);
    if candidate.components().count() > 1 {
        return fs::canonicalize(candidate).ok();
    }

    let output = Command::new("which").arg(tool).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path_str.is_empty() {
        return None;
    }
    // Resolve symlinks so an upgrade behind a stable symlink is noticed.
    fs::canonicalize(&path_str)
        .ok()
        .or_else(|| Some(PathBuf::from(path_str)))
}
