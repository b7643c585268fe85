//! Command rendering with placeholders.
//!
//! Turns an indexed [`CommandSpec`] into a command line the user can paste
//! and edit: positional arguments become `<lowercase>` placeholders and a
//! small set of commonly required flags is added only when the command
//! actually accepts them.

use serde::{Deserialize, Serialize};

use crate::CommandSpec;

/// A flag worth suggesting, with the placeholder used for its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferredFlag {
    pub flag: String,
    pub placeholder: String,
}

impl PreferredFlag {
    pub fn new(flag: &str, placeholder: &str) -> Self {
        Self {
            flag: flag.to_string(),
            placeholder: placeholder.to_string(),
        }
    }
}

/// Rendering knobs.
///
/// # Examples
///
/// ```
/// use cmdgen_core::RenderOptions;
///
/// let options = RenderOptions::default();
/// assert_eq!(options.max_positionals, 2);
/// assert_eq!(options.preferred_flags[0].flag, "--region");
/// assert_eq!(options.default_format.as_deref(), Some("json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Number of positional placeholders to show (enough to show the shape).
    pub max_positionals: usize,
    /// Flags added, in order, when the command supports them.
    pub preferred_flags: Vec<PreferredFlag>,
    /// Value for `--format` when supported; `None` disables it.
    pub default_format: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_positionals: 2,
            preferred_flags: vec![
                PreferredFlag::new("--region", "<REGION>"),
                PreferredFlag::new("--zone", "<ZONE>"),
                PreferredFlag::new("--location", "<LOCATION>"),
                PreferredFlag::new("--project", "<PROJECT_ID>"),
            ],
            default_format: Some("json".to_string()),
        }
    }
}

/// Renders a spec as a single command line.
///
/// # Examples
///
/// ```
/// use cmdgen_core::*;
///
/// let spec = CommandSpec::new("run services describe")
///     .with_release(ReleaseTrack::Beta)
///     .with_flags(["--region", "--project", "--format"])
///     .with_positionals(["SERVICE"]);
///
/// assert_eq!(
///     render_command("gcloud", &spec, &RenderOptions::default()),
///     "gcloud beta run services describe <service> --region=<REGION> --project=<PROJECT_ID> --format=json"
/// );
/// ```
pub fn render_command(tool: &str, spec: &CommandSpec, options: &RenderOptions) -> String {
    let mut tokens = vec![tool.to_string()];
    if let Some(prefix) = spec.release.prefix() {
        tokens.push(prefix.to_string());
    }
    tokens.extend(spec.path_tokens().into_iter().map(str::to_string));

    for positional in spec.positionals.iter().take(options.max_positionals) {
        tokens.push(format!("<{}>", positional.to_lowercase()));
    }

    apply_flag_placeholders(&mut tokens, spec, options);
    tokens.join(" ")
}

/// Appends supported preferred flags and `--format` to `tokens`.
///
/// A flag already present (compared on the key before `=`) is left alone,
/// so applying this to its own output changes nothing.
pub fn apply_flag_placeholders(tokens: &mut Vec<String>, spec: &CommandSpec, options: &RenderOptions) {
    for preferred in &options.preferred_flags {
        if spec.supports_flag(&preferred.flag) && !has_flag(tokens, &preferred.flag) {
            tokens.push(format!("{}={}", preferred.flag, preferred.placeholder));
        }
    }

    if let Some(format) = &options.default_format {
        if spec.supports_flag("--format") && !has_flag(tokens, "--format") {
            tokens.push(format!("--format={format}"));
        }
    }
}

/// Name a tool is invoked by in text: the file name of a configured path.
///
/// ```
/// assert_eq!(cmdgen_core::tool_name("/opt/sdk/bin/gcloud"), "gcloud");
/// assert_eq!(cmdgen_core::tool_name("gcloud"), "gcloud");
/// ```
pub fn tool_name(tool: &str) -> &str {
    std::path::Path::new(tool)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(tool)
}

/// Returns the flag key of a token (`--region=X` → `--region`).
pub fn flag_key(token: &str) -> &str {
    token.split_once('=').map_or(token, |(key, _)| key)
}

fn has_flag(tokens: &[String], flag: &str) -> bool {
    tokens.iter().any(|token| flag_key(token) == flag)
}
