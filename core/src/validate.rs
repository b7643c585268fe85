//! Index validation.
//!
//! Validates structural invariants of a [`CommandIndex`] before it is
//! trusted for ranking, catching corrupt caches (mismatched keys, release
//! tokens leaking into paths, malformed or duplicate flags) early.
//!
//! # Examples
//!
//! ```
//! use cmdgen_core::*;
//!
//! let mut index = CommandIndex::new("gcloud", "2024-01-01T00:00:00Z");
//! index.insert(CommandSpec::new("run services describe").with_flags(["--region"]));
//! assert!(validate_index(&index).is_empty());
//!
//! // Invalid: flag without leading dashes
//! let mut bad = CommandIndex::new("gcloud", "2024-01-01T00:00:00Z");
//! bad.insert(CommandSpec::new("run services describe").with_flags(["region"]));
//! assert!(!validate_index(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{CommandIndex, CommandSpec, ReleaseTrack};

/// Index validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexValidationError {
    /// Tool name is empty or whitespace-only.
    #[error("index tool cannot be empty")]
    EmptyTool,
    /// A spec has an empty path.
    #[error("command path cannot be empty")]
    EmptyPath,
    /// Map key and the spec's own path disagree.
    #[error("index key '{key}' does not match command path '{path}'")]
    KeyMismatch { key: String, path: String },
    /// A path token is not a plausible subcommand name.
    #[error("invalid path token '{token}' in '{path}'")]
    InvalidPathToken { path: String, token: String },
    /// A release token (`alpha`, `beta`) leaked into the path.
    #[error("release token in command path: {0}")]
    ReleaseInPath(String),
    /// A flag does not start with `--` or is too short.
    #[error("invalid flag format '{flag}' for '{path}'")]
    InvalidFlag { path: String, flag: String },
    /// Two flags of one command share the same name.
    #[error("duplicate flag '{flag}' for '{path}'")]
    DuplicateFlag { path: String, flag: String },
    /// Two positionals of one command share the same name.
    #[error("duplicate positional '{name}' for '{path}'")]
    DuplicatePositional { path: String, name: String },
}

/// Validates a full index, returning every problem found.
pub fn validate_index(index: &CommandIndex) -> Vec<IndexValidationError> {
    let mut errors = Vec::new();

    if index.tool.trim().is_empty() {
        errors.push(IndexValidationError::EmptyTool);
        return errors;
    }

    for (key, spec) in &index.commands {
        if key != &spec.path {
            errors.push(IndexValidationError::KeyMismatch {
                key: key.clone(),
                path: spec.path.clone(),
            });
        }
        errors.extend(validate_spec(spec));
    }

    errors
}

/// Validates a single command spec.
pub fn validate_spec(spec: &CommandSpec) -> Vec<IndexValidationError> {
    let mut errors = Vec::new();
    let tokens = spec.path_tokens();

    let Some(first) = tokens.first() else {
        errors.push(IndexValidationError::EmptyPath);
        return errors;
    };
    if ReleaseTrack::from_token(first).is_some() {
        errors.push(IndexValidationError::ReleaseInPath(spec.path.clone()));
    }

    for token in &tokens {
        if !is_path_token(token) {
            errors.push(IndexValidationError::InvalidPathToken {
                path: spec.path.clone(),
                token: (*token).to_string(),
            });
        }
    }

    let mut seen = HashSet::new();
    for flag in &spec.flags {
        if !flag.starts_with("--") || flag.len() < 3 {
            errors.push(IndexValidationError::InvalidFlag {
                path: spec.path.clone(),
                flag: flag.clone(),
            });
            continue;
        }
        if !seen.insert(flag.as_str()) {
            errors.push(IndexValidationError::DuplicateFlag {
                path: spec.path.clone(),
                flag: flag.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for name in &spec.positionals {
        if !seen.insert(name.as_str()) {
            errors.push(IndexValidationError::DuplicatePositional {
                path: spec.path.clone(),
                name: name.clone(),
            });
        }
    }

    errors
}

/// Lowercase subcommand token: alphanumerics, `-` and `_`, not starting with `-`.
pub fn is_path_token(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_lowercase() || first.is_ascii_digit())
        && chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
}
