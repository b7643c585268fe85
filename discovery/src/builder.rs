//! Index lifecycle: reuse the cache, or discover and parse a fresh index.
//!
//! Building a complete index means one help invocation per command, which
//! for a large CLI takes a long time. Only paths under the configured
//! priority prefixes are parsed eagerly; everything else is stored as a
//! pending entry and parsed on demand with [`resolve_pending`].

use chrono::Utc;
use cmdgen_core::{
    Candidate, CommandIndex, CommandSpec, Config, INDEX_CONTRACT_VERSION, IndexMeta, ReleaseTrack,
    ToolFingerprint, choose_candidates, validate_index,
};
use tracing::{debug, info, warn};

use crate::cache::{CachedIndex, IndexCache, tool_fingerprint};
use crate::crawl::discover_command_list;
use crate::error::{DiscoveryError, Result};
use crate::extractor::{ExtractedCommand, describe_command};
use crate::report::BuildReport;
use crate::runner::{CommandRunner, HelpProbe};

/// Upper bound on rank-then-resolve rounds in [`BuiltIndex::top_candidates`].
pub const MAX_RESOLVE_ROUNDS: usize = 8;

/// An index ready for ranking, with its metadata and build report.
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub index: CommandIndex,
    pub meta: IndexMeta,
    pub report: BuildReport,
}

impl BuiltIndex {
    /// Parses help for every pending path in `paths`; returns how many
    /// entries changed.
    pub fn resolve<R: CommandRunner>(
        &mut self,
        probe: &HelpProbe<R>,
        paths: &[String],
        wide_flags: &[String],
    ) -> usize {
        paths
            .iter()
            .filter(|path| resolve_pending(probe, &mut self.index, path, wide_flags))
            .count()
    }

    /// Ranks `prompt` and resolves pending entries among the top `top_k`,
    /// re-ranking until every returned candidate is resolved.
    ///
    /// Resolving can drop a group or promote a command into the top slots,
    /// so one round is not enough. Stops after [`MAX_RESOLVE_ROUNDS`] or when
    /// a round changes nothing. Returns the candidates and how many entries
    /// changed in total.
    pub fn top_candidates<R: CommandRunner>(
        &mut self,
        probe: &HelpProbe<R>,
        prompt: &str,
        top_k: usize,
        wide_flags: &[String],
    ) -> (Vec<Candidate>, usize) {
        let mut changed = 0;
        let mut candidates = choose_candidates(&self.index, prompt, top_k);

        for round in 1..=MAX_RESOLVE_ROUNDS {
            let pending: Vec<String> = candidates
                .iter()
                .filter(|candidate| !candidate.spec.resolved)
                .map(|candidate| candidate.spec.path.clone())
                .collect();
            if pending.is_empty() {
                break;
            }

            let resolved = self.resolve(probe, &pending, wide_flags);
            debug!(round, pending = pending.len(), resolved, "Resolved candidates");
            if resolved == 0 {
                break;
            }
            changed += resolved;
            candidates = choose_candidates(&self.index, prompt, top_k);
        }

        if candidates.iter().any(|candidate| !candidate.spec.resolved) {
            warn!(prompt, "Returning unresolved candidates after resolve rounds");
        }
        (candidates, changed)
    }

    /// Recomputes the metadata counts and writes index and metadata.
    pub fn save(&mut self, cache: &IndexCache) -> Result<()> {
        let fresh = IndexMeta::for_index(&self.index);
        self.meta.commands_indexed = fresh.commands_indexed;
        self.meta.commands_pending = fresh.commands_pending;
        cache.save(&self.index, &self.meta)
    }
}

/// Builds or loads the index for the probe's tool.
pub struct IndexBuilder<'a, R> {
    probe: &'a HelpProbe<R>,
    config: &'a Config,
    cache: &'a IndexCache,
    fingerprint: Option<ToolFingerprint>,
}

impl<'a, R: CommandRunner> IndexBuilder<'a, R> {
    /// Builder that fingerprints the probe's tool on the filesystem.
    pub fn new(probe: &'a HelpProbe<R>, config: &'a Config, cache: &'a IndexCache) -> Self {
        Self {
            probe,
            config,
            cache,
            fingerprint: tool_fingerprint(probe.tool()),
        }
    }

    /// Overrides the tool fingerprint compared against the cache.
    pub fn with_fingerprint(mut self, fingerprint: Option<ToolFingerprint>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    /// Returns the cached index when still valid (and `force` is unset),
    /// otherwise discovers, parses and persists a new one.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::NoCommands`] when discovery finds nothing, or an
    /// I/O / JSON error when the cache cannot be written.
    pub fn build(&self, force: bool) -> Result<BuiltIndex> {
        if !force {
            if let Some(cached) = self.cache.load() {
                if self.cache_is_valid(&cached) {
                    info!(commands = cached.index.len(), "Using cached index");
                    let report = BuildReport {
                        tool: cached.index.tool.clone(),
                        cache_used: true,
                        indexed: cached.index.resolved_count(),
                        pending: cached.index.len() - cached.index.resolved_count(),
                        ..BuildReport::default()
                    };
                    return Ok(BuiltIndex {
                        index: cached.index,
                        meta: cached.meta,
                        report,
                    });
                }
            }
        }

        let tool = self.probe.tool();
        let discovered = discover_command_list(self.probe, self.config.index.probe_budget);
        if discovered.paths.is_empty() {
            return Err(DiscoveryError::NoCommands {
                tool: tool.to_string(),
            });
        }

        let (eager, lazy): (Vec<_>, Vec<_>) = discovered
            .paths
            .iter()
            .cloned()
            .partition(|(path, _)| self.config.index.is_priority(path));
        info!(
            eager = eager.len(),
            pending = lazy.len(),
            jobs = self.config.index.jobs,
            "Parsing help"
        );

        let extracted = self.extract_all(&eager)?;

        let mut report = BuildReport {
            tool: tool.to_string(),
            source: Some(discovered.source),
            discovered: discovered.paths.len(),
            warnings: discovered.warnings,
            ..BuildReport::default()
        };

        let mut index = CommandIndex::new(tool, Utc::now().to_rfc3339());
        for ExtractedCommand {
            spec,
            is_group,
            minimal,
        } in extracted
        {
            if is_group {
                debug!(path = %spec.path, "Dropping group help");
                report.skipped_groups += 1;
                continue;
            }
            if minimal {
                report
                    .warnings
                    .push(format!("no help available for '{}'", spec.path));
                report.minimal += 1;
            }
            index.insert(spec);
        }
        for (path, release) in lazy {
            index.insert(CommandSpec::pending(&path, release));
        }

        report.indexed = index.resolved_count();
        report.pending = index.len() - report.indexed;

        let mut meta = IndexMeta::for_index(&index);
        meta.sdk_root = self.probe.sdk_root();
        meta.fingerprint = self.fingerprint.clone();
        self.cache.save(&index, &meta)?;

        Ok(BuiltIndex {
            index,
            meta,
            report,
        })
    }

    fn cache_is_valid(&self, cached: &CachedIndex) -> bool {
        if cached.index.tool != self.probe.tool() || cached.index.is_empty() {
            return false;
        }
        if cached.index.schema_version.as_deref() != Some(INDEX_CONTRACT_VERSION) {
            debug!("Cached index has a different contract version");
            return false;
        }
        if cached.meta.fingerprint != self.fingerprint {
            info!("Tool fingerprint changed, rebuilding index");
            return false;
        }
        let errors = validate_index(&cached.index);
        if let Some(first) = errors.first() {
            warn!(errors = errors.len(), first = %first, "Cached index failed validation");
            return false;
        }
        true
    }

    fn extract_all(&self, paths: &[(String, ReleaseTrack)]) -> Result<Vec<ExtractedCommand>> {
        let wide_flags = &self.config.tool.wide_flags;
        let jobs = self.config.index.jobs.max(1);
        if jobs == 1 {
            return Ok(paths
                .iter()
                .map(|(path, release)| describe_command(self.probe, path, *release, wide_flags))
                .collect());
        }

        use rayon::prelude::*;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| DiscoveryError::WorkerPool(e.to_string()))?;

        Ok(pool.install(|| {
            paths
                .par_iter()
                .map(|(path, release)| describe_command(self.probe, path, *release, wide_flags))
                .collect()
        }))
    }
}

/// Convenience wrapper around [`IndexBuilder::build`].
pub fn build_index<R: CommandRunner>(
    probe: &HelpProbe<R>,
    config: &Config,
    cache: &IndexCache,
    force: bool,
) -> Result<BuiltIndex> {
    IndexBuilder::new(probe, config, cache).build(force)
}

/// Parses help for a pending entry and stores the result.
///
/// A path whose help turns out to be a group listing is removed. Returns
/// `true` when the index changed; resolved or unknown paths are left alone.
pub fn resolve_pending<R: CommandRunner>(
    probe: &HelpProbe<R>,
    index: &mut CommandIndex,
    path: &str,
    wide_flags: &[String],
) -> bool {
    let Some(spec) = index.get(path) else {
        return false;
    };
    if spec.resolved {
        return false;
    }

    let extracted = describe_command(probe, path, spec.release, wide_flags);
    if extracted.is_group {
        debug!(path, "Pending path is a group, removing");
        index.commands.remove(path);
    } else {
        index.insert(extracted.spec);
    }
    true
}
