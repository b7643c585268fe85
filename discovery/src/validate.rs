//! Live validation of command strings against the tool's help output.
//!
//! Nothing is executed except `--help`: the command path is checked by
//! asking for its help page, and every long flag in the command must be
//! one the page (or the tool-wide flag set) defines.

use std::collections::BTreeSet;

use cmdgen_core::{CommandValidator, ReleaseTrack, ValidationOutcome, flag_key, tool_name};
use tracing::debug;

use crate::parser::parse_flags;
use crate::runner::{CommandRunner, HelpProbe};

/// Checks a rendered command string.
///
/// The base path is every token after the tool name up to the first token
/// starting with `<` or `-`. The help for the base must succeed and every
/// `--flag` must be a scraped or wide flag; unknown flags are reported
/// sorted and unique.
pub fn validate_command_string<R: CommandRunner>(
    probe: &HelpProbe<R>,
    command: &str,
    wide_flags: &[String],
) -> ValidationOutcome {
    let tokens = match split_command(command, probe.tool()) {
        Ok(tokens) => tokens,
        Err(outcome) => return outcome,
    };

    let base: Vec<&str> = tokens
        .iter()
        .map(String::as_str)
        .take_while(|token| !token.starts_with('<') && !token.starts_with('-'))
        .collect();
    let base_path = base.join(" ");

    let help = probe.help(&base_path, ReleaseTrack::Ga);
    if !help.success() {
        return ValidationOutcome::invalid(format!("help failed for '{base_path}'"));
    }

    check_flags(&tokens, &base_path, parse_flags(help.text()), wide_flags)
}

fn check_flags(
    tokens: &[String],
    base_path: &str,
    scraped: Vec<String>,
    wide_flags: &[String],
) -> ValidationOutcome {
    let allowed: BTreeSet<String> = scraped.into_iter().chain(wide_flags.iter().cloned()).collect();
    let unknown: BTreeSet<&str> = provided_flags(tokens)
        .filter(|flag| !allowed.contains(*flag))
        .collect();

    if unknown.is_empty() {
        return ValidationOutcome::valid(base_path);
    }
    let unknown: Vec<String> = unknown.into_iter().map(str::to_string).collect();
    ValidationOutcome {
        valid: false,
        message: format!("Unknown flag(s) for '{base_path}': {}", unknown.join(", ")),
        resolved_path: Some(base_path.to_string()),
        unknown_flags: unknown,
    }
}

fn provided_flags(tokens: &[String]) -> impl Iterator<Item = &str> {
    tokens
        .iter()
        .filter(|token| token.starts_with("--") && token.len() > 2)
        .map(|token| flag_key(token))
}

/// Shell-splits `command` and drops a leading tool name.
fn split_command(command: &str, tool: &str) -> Result<Vec<String>, ValidationOutcome> {
    if command.trim().is_empty() {
        return Err(ValidationOutcome::invalid("Empty command"));
    }
    let Some(mut tokens) = shlex::split(command) else {
        return Err(ValidationOutcome::invalid(format!(
            "Could not parse command (unbalanced quotes?): {command}"
        )));
    };
    if tokens.first().is_some_and(|first| is_tool_token(first, tool)) {
        tokens.remove(0);
    }
    if tokens.is_empty() {
        return Err(ValidationOutcome::invalid("Empty command"));
    }
    Ok(tokens)
}

fn is_tool_token(token: &str, tool: &str) -> bool {
    token == tool || token == tool_name(tool)
}

/// Progressive-prefix validator used to check model output.
///
/// Model output uses uppercase placeholders (`SERVICE_NAME`), so the base
/// path also stops at any token containing an uppercase letter. Prefixes
/// are tried longest first until a help page succeeds. When that page has
/// no parseable flag section, flags are accepted if their name appears
/// anywhere in the help text.
#[derive(Debug, Clone)]
pub struct HelpValidator<R> {
    probe: HelpProbe<R>,
    wide_flags: Vec<String>,
}

impl<R: CommandRunner> HelpValidator<R> {
    pub fn new(probe: HelpProbe<R>, wide_flags: Vec<String>) -> Self {
        Self { probe, wide_flags }
    }

    pub fn probe(&self) -> &HelpProbe<R> {
        &self.probe
    }

    fn check(&self, command: &str) -> ValidationOutcome {
        let tokens = match split_command(command, self.probe.tool()) {
            Ok(tokens) => tokens,
            Err(outcome) => return outcome,
        };

        let base: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .take_while(|token| {
                !token.starts_with('<')
                    && !token.starts_with('-')
                    && !token.chars().any(|c| c.is_ascii_uppercase())
            })
            .collect();

        for len in (1..=base.len()).rev() {
            let path = base[..len].join(" ");
            let help = self.probe.help(&path, ReleaseTrack::Ga);
            if !help.success() {
                debug!(path = %path, exit_code = help.exit_code, "Prefix rejected");
                continue;
            }

            let scraped = parse_flags(help.text());
            if scraped.is_empty() {
                return self.check_contained(&tokens, &path, &help.combined());
            }
            return check_flags(&tokens, &path, scraped, &self.wide_flags);
        }

        ValidationOutcome::invalid(format!(
            "Invalid {} command structure: {command}",
            self.probe.name()
        ))
    }

    fn check_contained(&self, tokens: &[String], path: &str, help_text: &str) -> ValidationOutcome {
        let unknown: BTreeSet<&str> = provided_flags(tokens)
            .filter(|flag| !help_text.contains(flag) && !self.wide_flags.iter().any(|w| w == flag))
            .collect();
        if unknown.is_empty() {
            return ValidationOutcome::valid(path);
        }
        let unknown: Vec<String> = unknown.into_iter().map(str::to_string).collect();
        ValidationOutcome {
            valid: false,
            message: format!("Invalid flags: {}", unknown.join(", ")),
            resolved_path: Some(path.to_string()),
            unknown_flags: unknown,
        }
    }
}

impl<R: CommandRunner> CommandValidator for HelpValidator<R> {
    fn validate(&self, command: &str) -> ValidationOutcome {
        self.check(command)
    }
}
