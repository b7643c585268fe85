//! Crawl, index build, cache and validation flows against a scripted tool.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use cmdgen_core::{CommandValidator, Config, ReleaseTrack, ToolFingerprint};
use cmdgen_discovery::crawl::{DiscoverySource, discover_command_list};
use cmdgen_discovery::{
    CommandRunner, DiscoveryError, HelpProbe, HelpValidator, IndexBuilder, IndexCache, RunOutput,
    validate_command_string,
};

const BETA_JOBS_LIST_HELP: &str = "\
NAME
    gcloud beta run jobs list - list jobs

SYNOPSIS
    gcloud beta run jobs list [--region=REGION] [GCLOUD_WIDE_FLAG ...]

FLAGS
     --region=REGION
        Region in which to list jobs.
";

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {e}", path.display()))
}

/// Answers argv lookups from a table; anything else fails like an invalid
/// choice would. The binary is keyed by file name, so a full path to the
/// tool hits the same table.
struct FakeTool {
    responses: HashMap<String, RunOutput>,
    calls: Mutex<Vec<String>>,
}

impl FakeTool {
    fn gcloud() -> Self {
        let helps = [
            ("gcloud --help", "root-help.txt"),
            ("gcloud run --help", "run-help.txt"),
            ("gcloud run services --help", "run-services-help.txt"),
            ("gcloud run revisions --help", "run-revisions-help.txt"),
            ("gcloud run services describe --help", "run-services-describe-help.txt"),
            ("gcloud run services list --help", "run-services-list-help.txt"),
            ("gcloud compute --help", "compute-help.txt"),
            ("gcloud compute instances --help", "compute-instances-help.txt"),
            (
                "gcloud compute instances describe --help",
                "compute-instances-describe-help.txt",
            ),
            ("gcloud sql --help", "sql-help.txt"),
            ("gcloud sql instances --help", "sql-instances-help.txt"),
            ("gcloud sql instances describe --help", "sql-instances-describe-help.txt"),
        ];

        let mut responses: HashMap<String, RunOutput> = helps
            .iter()
            .map(|(argv, file)| (argv.to_string(), RunOutput::ok(fixture(file))))
            .collect();
        responses.insert(
            "gcloud beta run jobs list --help".to_string(),
            RunOutput::ok(BETA_JOBS_LIST_HELP),
        );
        responses.insert(
            "gcloud meta list-commands".to_string(),
            RunOutput::ok(fixture("list-commands.txt")),
        );
        responses.insert(
            "gcloud --format=value(installation.sdk_root) info".to_string(),
            RunOutput::ok("/opt/google-cloud-sdk\n"),
        );

        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn without_list_commands(mut self) -> Self {
        self.responses.remove("gcloud meta list-commands");
        self
    }

    fn broken() -> Self {
        Self {
            responses: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeTool {
    fn run(&self, argv: &[String], _timeout: Duration) -> RunOutput {
        let mut words: Vec<&str> = argv.iter().map(String::as_str).collect();
        if let Some(binary) = words.first_mut() {
            *binary = cmdgen_core::tool_name(*binary);
        }
        let key = words.join(" ");
        self.calls.lock().unwrap().push(key.clone());
        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| RunOutput::failed(format!("ERROR: (gcloud) Invalid choice: '{key}'")))
    }
}

fn fingerprint(mtime_secs: i64) -> Option<ToolFingerprint> {
    Some(ToolFingerprint {
        executable_path: "/opt/google-cloud-sdk/bin/gcloud".to_string(),
        mtime_secs,
        size_bytes: 4096,
    })
}

// ---- discovery ----

#[test]
fn test_list_commands_discovery() {
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let discovered = discover_command_list(&probe, 4096);

    assert_eq!(discovered.source, DiscoverySource::ListCommands);
    assert_eq!(discovered.paths.len(), 16);
    assert!(discovered.paths.contains(&("run services describe".to_string(), ReleaseTrack::Ga)));
    assert!(discovered.paths.contains(&("run jobs list".to_string(), ReleaseTrack::Beta)));
    assert!(discovered.warnings.is_empty());
}

#[test]
fn test_tool_path_discovers_and_parses_like_bare_name() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("/opt/google-cloud-sdk/bin/gcloud", FakeTool::gcloud());
    let discovered = discover_command_list(&probe, 4096);
    assert_eq!(discovered.source, DiscoverySource::ListCommands);
    assert_eq!(discovered.paths.len(), 16);

    let config = Config::default();
    let cache = IndexCache::new(dir.path(), probe.tool());
    let built = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(None)
        .build(false)
        .unwrap();
    assert_eq!(built.report.discovered, 16);
    assert_eq!(built.report.indexed, 7);

    let describe = built.index.get("run services describe").unwrap();
    assert_eq!(describe.positionals, vec!["SERVICE"]);
    assert_eq!(describe.summary, "obtain details about a given service");

    let validator = HelpValidator::new(probe, config.tool.wide_flags.clone());
    let invalid = validator.validate("/opt/google-cloud-sdk/bin/gcloud frobnicate widgets now");
    assert_eq!(
        invalid.message,
        "Invalid gcloud command structure: /opt/google-cloud-sdk/bin/gcloud frobnicate widgets now"
    );
}

#[test]
fn test_help_crawl_fallback() {
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud().without_list_commands());
    let discovered = discover_command_list(&probe, 4096);

    assert_eq!(discovered.source, DiscoverySource::HelpCrawl);
    let paths: Vec<&str> = discovered.paths.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "compute instances describe",
            "compute instances list",
            "run deploy",
            "run revisions list",
            "run services describe",
            "run services list",
            "sql instances describe",
            "version",
        ]
    );

    let calls = probe.runner().calls();
    assert!(!calls.iter().any(|c| c.starts_with("gcloud alpha") || c.starts_with("gcloud beta")));
}

#[test]
fn test_help_crawl_respects_budget() {
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud().without_list_commands());
    let discovered = discover_command_list(&probe, 3);

    let paths: Vec<&str> = discovered.paths.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(
        paths,
        vec!["compute instances describe", "compute instances list", "version"]
    );
    assert_eq!(
        discovered
            .warnings
            .iter()
            .filter(|w| w.contains("probe budget of 3 exhausted"))
            .count(),
        1
    );
    assert_eq!(probe.runner().calls().len(), 1 + 3);
}

// ---- index build ----

#[test]
fn test_build_parses_priority_paths_and_defers_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");

    let built = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(fingerprint(1))
        .build(false)
        .unwrap();

    let report = &built.report;
    assert!(!report.cache_used);
    assert_eq!(report.source, Some(DiscoverySource::ListCommands));
    assert_eq!(report.discovered, 16);
    assert_eq!(report.skipped_groups, 5);
    assert_eq!(report.minimal, 3);
    assert_eq!(report.indexed, 7);
    assert_eq!(report.pending, 4);

    let describe = built.index.get("run services describe").unwrap();
    assert_eq!(describe.release, ReleaseTrack::Ga);
    assert_eq!(describe.positionals, vec!["SERVICE"]);
    assert_eq!(
        describe.flags,
        vec![
            "--account",
            "--configuration",
            "--format",
            "--project",
            "--quiet",
            "--region",
            "--verbosity",
        ]
    );
    assert_eq!(describe.summary, "obtain details about a given service");

    let jobs = built.index.get("run jobs list").unwrap();
    assert_eq!(jobs.release, ReleaseTrack::Beta);
    assert!(jobs.supports_flag("--region"));

    assert!(built.index.get("run services").is_none());
    assert!(!built.index.get("sql instances describe").unwrap().resolved);
    assert_eq!(built.meta.sdk_root.as_deref(), Some("/opt/google-cloud-sdk"));
    assert!(dir.path().join("gcloud_index.json").is_file());
    assert!(dir.path().join("gcloud_meta.json").is_file());
}

#[test]
fn test_cached_index_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");
    let builder = IndexBuilder::new(&probe, &config, &cache).with_fingerprint(fingerprint(1));

    let first = builder.build(false).unwrap();
    let calls_after_first = probe.runner().calls().len();

    let second = builder.build(false).unwrap();
    assert!(second.report.cache_used);
    assert_eq!(second.report.source, None);
    assert_eq!(second.index.len(), first.index.len());
    assert_eq!(probe.runner().calls().len(), calls_after_first);
}

#[test]
fn test_fingerprint_change_and_force_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");

    IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(fingerprint(1))
        .build(false)
        .unwrap();

    let upgraded = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(fingerprint(2))
        .build(false)
        .unwrap();
    assert!(!upgraded.report.cache_used);
    assert_eq!(upgraded.meta.fingerprint, fingerprint(2));

    let forced = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(fingerprint(2))
        .build(true)
        .unwrap();
    assert!(!forced.report.cache_used);
}

#[test]
fn test_index_all_parses_everything() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let mut config = Config::default();
    config.index.index_all = true;
    let cache = IndexCache::new(dir.path(), "gcloud");

    let built = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(None)
        .build(false)
        .unwrap();
    assert_eq!(built.report.pending, 0);
    assert_eq!(
        built.index.get("sql instances describe").unwrap().positionals,
        vec!["INSTANCE"]
    );
}

#[test]
fn test_parallel_build_matches_sequential() {
    let config = Config::default();
    let mut parallel_config = Config::default();
    parallel_config.index.jobs = 4;

    let build = |config: &Config| {
        let dir = tempfile::tempdir().unwrap();
        let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
        let cache = IndexCache::new(dir.path(), "gcloud");
        IndexBuilder::new(&probe, config, &cache)
            .with_fingerprint(None)
            .build(false)
            .unwrap()
            .index
    };

    let sequential = build(&config);
    let parallel = build(&parallel_config);
    assert_eq!(sequential.commands, parallel.commands);
}

#[test]
fn test_resolve_pending_updates_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");

    let mut built = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(None)
        .build(false)
        .unwrap();

    let changed = built.resolve(
        &probe,
        &[
            "sql instances describe".to_string(),
            "sql instances".to_string(),
            "run services describe".to_string(),
        ],
        &config.tool.wide_flags,
    );
    assert_eq!(changed, 2);

    let sql = built.index.get("sql instances describe").unwrap();
    assert!(sql.resolved);
    assert_eq!(sql.positionals, vec!["INSTANCE"]);
    assert!(built.index.get("sql instances").is_none());

    built.save(&cache).unwrap();
    let reloaded = cache.load().unwrap();
    assert_eq!(reloaded.meta.commands_pending, 2);
    assert!(reloaded.index.get("sql instances describe").unwrap().resolved);
}

#[test]
fn test_top_candidates_resolve_until_no_pending_remain() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");

    let mut built = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(None)
        .build(false)
        .unwrap();
    assert!(!built.index.get("sql instances").unwrap().resolved);

    // "sql instances" ranks first but is a group; once it is dropped the
    // pending "sql instances describe" takes its place and needs a second round.
    let (candidates, changed) =
        built.top_candidates(&probe, "sql instances", 1, &config.tool.wide_flags);
    assert_eq!(changed, 2);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].spec.path, "sql instances describe");
    assert!(candidates[0].spec.resolved);
    assert_eq!(candidates[0].spec.positionals, vec!["INSTANCE"]);
    assert!(built.index.get("sql instances").is_none());

    let (again, changed) =
        built.top_candidates(&probe, "sql instances", 3, &config.tool.wide_flags);
    assert!(again.iter().all(|candidate| candidate.spec.resolved));
    assert_eq!(again[0].spec.path, "sql instances describe");
    assert!(changed <= 1);
}

#[test]
fn test_no_commands_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let probe = HelpProbe::with_runner("gcloud", FakeTool::broken());
    let config = Config::default();
    let cache = IndexCache::new(dir.path(), "gcloud");

    let err = IndexBuilder::new(&probe, &config, &cache)
        .with_fingerprint(None)
        .build(false)
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::NoCommands { .. }));
    assert!(err.to_string().contains("is the tool installed and on PATH?"));
}

// ---- validation ----

#[test]
fn test_validate_rendered_command() {
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let wide = Config::default().tool.wide_flags;

    let ok = validate_command_string(
        &probe,
        "gcloud run services describe <service> --region=<REGION> --project=<PROJECT_ID> --format=json",
        &wide,
    );
    assert!(ok.valid, "{}", ok.message);
    assert_eq!(ok.resolved_path.as_deref(), Some("run services describe"));

    let bad = validate_command_string(
        &probe,
        "gcloud run services describe <service> --bogus --zone=x --bogus",
        &wide,
    );
    assert!(!bad.valid);
    assert_eq!(bad.unknown_flags, vec!["--bogus", "--zone"]);

    let missing = validate_command_string(&probe, "gcloud run nope list", &wide);
    assert!(!missing.valid);
    assert_eq!(missing.message, "help failed for 'run nope list'");
}

#[test]
fn test_help_validator_progressive_prefixes() {
    let probe = HelpProbe::with_runner("gcloud", FakeTool::gcloud());
    let validator = HelpValidator::new(probe, Config::default().tool.wide_flags);

    let ok = validator.validate("gcloud run services describe SERVICE_NAME --region=REGION --project=PROJECT_ID");
    assert!(ok.valid, "{}", ok.message);
    assert_eq!(ok.resolved_path.as_deref(), Some("run services describe"));

    let unknown = validator.validate("gcloud run services describe SERVICE_NAME --zone=ZONE");
    assert!(!unknown.valid);
    assert_eq!(unknown.unknown_flags, vec!["--zone"]);

    // No FLAGS section: fall back to a containment check on the help text.
    let contained = validator.validate("gcloud sql instances describe INSTANCE --format=json");
    assert!(contained.valid, "{}", contained.message);
    let not_contained = validator.validate("gcloud sql instances describe INSTANCE --zone=ZONE");
    assert_eq!(not_contained.message, "Invalid flags: --zone");

    let calls_before = validator.probe().runner().calls().len();
    let invalid = validator.validate("gcloud frobnicate widgets now");
    assert_eq!(
        invalid.message,
        "Invalid gcloud command structure: gcloud frobnicate widgets now"
    );
    assert_eq!(validator.probe().runner().calls().len() - calls_before, 3);

    assert_eq!(validator.validate("").message, "Empty command");
}
