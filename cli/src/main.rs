use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use cmdgen_core::{CommandValidator, Config, ReleaseTrack, template};
use cmdgen_discovery::extractor::spec_from_help;
use cmdgen_discovery::output::{
    OutputFormat, Suggestion, format_report, format_spec, format_suggestions, format_validation,
};
use cmdgen_discovery::{
    DiscoveryError, HelpProbe, HelpValidator, IndexBuilder, IndexCache,
    validate_command_string,
};
use cmdgen_llm::{CommandGenerator, GeminiClient, GenerationOutcome};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const PROMPT_HINT: &str =
    "Please provide a prompt, e.g.: cmdgen suggest \"show Cloud Run service config\"";

#[derive(Debug, Parser)]
#[command(name = "cmdgen", version)]
#[command(about = "Turn plain-English requests into gcloud commands")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Configuration file (default: <config dir>/cmdgen/config.yaml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Target CLI binary.
    #[arg(long, global = true)]
    tool: Option<String>,
    /// Directory for the command index cache.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank indexed commands against a request and render the best ones.
    Suggest(SuggestArgs),
    /// Build or refresh the command index.
    Index(IndexArgs),
    /// Answer from the built-in template table (no tool or network needed).
    Template(PromptArgs),
    /// Generate with a language model, validating against live help.
    Generate(GenerateArgs),
    /// Check a command string against the tool's help output.
    Validate(ValidateArgs),
    /// Parse captured help text without running the tool.
    ParseHelp(ParseHelpArgs),
}

#[derive(Debug, Args)]
struct PromptArgs {
    /// What you want to do, in plain English.
    prompt: Vec<String>,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    /// What you want to do, in plain English.
    prompt: Vec<String>,
    /// Number of candidates to print.
    #[arg(long, default_value_t = 1)]
    top_k: usize,
    /// Show the score breakdown and summary for each candidate.
    #[arg(long)]
    explain: bool,
    /// Check each rendered command against live help.
    #[arg(long)]
    validate: bool,
    /// Rebuild the index before ranking.
    #[arg(long)]
    reindex: bool,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct IndexArgs {
    /// Ignore the cache and rebuild.
    #[arg(long)]
    force: bool,
    /// Parse help for every command instead of only priority prefixes.
    #[arg(long)]
    all: bool,
    /// Parallel help invocations while parsing.
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// What you want to do, in plain English.
    prompt: Vec<String>,
    /// Generate/validate rounds before giving up.
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Model name.
    #[arg(long)]
    model: Option<String>,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Command to check, quoted or as separate words.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
    /// Try shorter path prefixes when the full path has no help.
    #[arg(long)]
    prefixes: bool,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParseHelpArgs {
    /// Command path the help belongs to (e.g. "run services describe").
    #[arg(long)]
    path: String,
    /// File containing help text (default: stdin).
    #[arg(long)]
    input: Option<PathBuf>,
    /// Release track the help was captured from.
    #[arg(long, default_value = "ga")]
    release: String,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

/// An error message and the exit code it maps to.
#[derive(Debug)]
struct Failure {
    message: String,
    code: i32,
}

impl Failure {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Self::new(1, message)
    }
}

impl From<DiscoveryError> for Failure {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::NoCommands { .. } => Self::new(2, err.to_string()),
            err => Self::new(1, err.to_string()),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = load_config(&cli.global).and_then(|config| match cli.command {
        Command::Suggest(args) => run_suggest(&config, args),
        Command::Index(args) => run_index(config, args),
        Command::Template(args) => run_template(args),
        Command::Generate(args) => run_generate(config, args),
        Command::Validate(args) => run_validate(&config, args),
        Command::ParseHelp(args) => run_parse_help(&config, args),
    });

    if let Err(err) = result {
        eprintln!("error: {}", err.message);
        std::process::exit(err.code);
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(global: &GlobalArgs) -> Result<Config, Failure> {
    let mut config =
        Config::load_or_default(global.config.as_deref()).map_err(|e| e.to_string())?;
    if let Some(tool) = &global.tool {
        config.tool.binary = tool.clone();
    }
    if let Some(dir) = &global.cache_dir {
        config.index.cache_dir = Some(dir.clone());
    }
    Ok(config)
}

fn probe_for(config: &Config) -> HelpProbe {
    HelpProbe::new(&config.tool.binary)
        .with_help_timeout(Duration::from_secs(config.index.help_timeout_secs))
        .with_list_timeout(Duration::from_secs(config.index.list_timeout_secs))
}

fn cache_for(config: &Config) -> IndexCache {
    IndexCache::new(config.index.resolved_cache_dir(), &config.tool.binary)
}

/// Name used in rendered commands: the binary's file name.
fn tool_name(config: &Config) -> &str {
    cmdgen_core::tool_name(&config.tool.binary)
}

fn prompt_text(words: &[String]) -> Result<String, Failure> {
    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        return Err(Failure::new(1, PROMPT_HINT));
    }
    Ok(prompt)
}

fn run_suggest(config: &Config, args: SuggestArgs) -> Result<(), Failure> {
    let prompt = prompt_text(&args.prompt)?;
    let probe = probe_for(config);
    let cache = cache_for(config);

    let mut built = IndexBuilder::new(&probe, config, &cache).build(args.reindex)?;
    debug!(summary = %built.report.summary_line(), "Index ready");

    let top_k = args.top_k.max(1);
    let (candidates, changed) =
        built.top_candidates(&probe, &prompt, top_k, &config.tool.wide_flags);
    if changed > 0 {
        if let Err(err) = built.save(&cache) {
            warn!(error = %err, "Failed to persist resolved commands");
        }
    }
    if candidates.is_empty() {
        return Err(Failure::new(2, "No candidates found."));
    }

    let tool = tool_name(config);
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .map(|candidate| Suggestion::from_candidate(tool, candidate, &config.render))
        .collect();
    if args.validate {
        for suggestion in &mut suggestions {
            suggestion.validation = Some(validate_command_string(
                &probe,
                &suggestion.command,
                &config.tool.wide_flags,
            ));
        }
    }

    print!("{}", format_suggestions(&suggestions, args.format, args.explain)?);
    Ok(())
}

fn run_index(mut config: Config, args: IndexArgs) -> Result<(), Failure> {
    if args.all {
        config.index.index_all = true;
    }
    if let Some(jobs) = args.jobs {
        config.index.jobs = jobs;
    }

    let probe = probe_for(&config);
    let cache = cache_for(&config);
    let built = IndexBuilder::new(&probe, &config, &cache).build(args.force)?;

    print!("{}", format_report(&built.report, args.format)?);
    if args.format == OutputFormat::Text {
        println!("  cache: {}", cache.index_path().display());
    }
    Ok(())
}

fn run_template(args: PromptArgs) -> Result<(), Failure> {
    let prompt = prompt_text(&args.prompt)?;
    let command = template::generate(&prompt).map_err(|e| e.to_string())?;
    println!("{command}");
    Ok(())
}

fn run_generate(mut config: Config, args: GenerateArgs) -> Result<(), Failure> {
    let prompt = prompt_text(&args.prompt)?;
    if let Some(model) = args.model {
        config.llm.model = model;
    }
    let max_iterations = args.max_iterations.unwrap_or(config.llm.max_iterations);

    let client = GeminiClient::from_config(&config.llm).map_err(|e| e.to_string())?;
    let probe = HelpProbe::new(&config.tool.binary)
        .with_help_timeout(Duration::from_secs(config.llm.validation_timeout_secs));
    let validator = HelpValidator::new(probe, config.tool.wide_flags.clone());

    let outcome = CommandGenerator::new(tool_name(&config), client, validator)
        .with_max_iterations(max_iterations)
        .generate(&prompt);

    print!("{}", format_generation(&outcome, args.format)?);
    if outcome.success {
        Ok(())
    } else {
        let detail = outcome.last_error.as_deref().unwrap_or("no error recorded");
        Err(Failure::new(1, format!("{} (last error: {detail})", outcome.message)))
    }
}

fn format_generation(outcome: &GenerationOutcome, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(outcome)
            .map(|json| json + "\n")
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(outcome).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Text => Ok(outcome
            .command
            .as_ref()
            .map(|command| format!("{command}\n"))
            .unwrap_or_default()),
    }
}

fn run_validate(config: &Config, args: ValidateArgs) -> Result<(), Failure> {
    let command = match args.command.as_slice() {
        [single] => single.clone(),
        words => shlex::try_join(words.iter().map(String::as_str))
            .map_err(|e| format!("cannot quote command: {e}"))?,
    };

    let probe = probe_for(config);
    let outcome = if args.prefixes {
        HelpValidator::new(probe, config.tool.wide_flags.clone()).validate(&command)
    } else {
        validate_command_string(&probe, &command, &config.tool.wide_flags)
    };

    print!("{}", format_validation(&outcome, args.format)?);
    if outcome.valid {
        Ok(())
    } else {
        Err(Failure::new(1, "command is not valid"))
    }
}

fn run_parse_help(config: &Config, args: ParseHelpArgs) -> Result<(), Failure> {
    let release = ReleaseTrack::from_token(&args.release)
        .or_else(|| (args.release == "ga").then_some(ReleaseTrack::Ga))
        .ok_or_else(|| format!("unknown release track '{}'", args.release))?;

    let help = match &args.input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            buffer
        }
    };
    if help.trim().is_empty() {
        return Err(Failure::new(1, "no help text provided"));
    }

    let extracted = spec_from_help(
        tool_name(config),
        &args.path,
        release,
        &help,
        &config.tool.wide_flags,
    );
    if extracted.is_group {
        warn!(path = %args.path, "Help text lists sub-commands; this path is a group");
    }

    print!("{}", format_spec(&extracted.spec, args.format)?);
    Ok(())
}
