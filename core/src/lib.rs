//! Core data model and heuristics for turning free-text intents into
//! command lines.
//!
//! This crate is free of subprocess and network plumbing:
//!
//! - [`CommandSpec`] / [`CommandIndex`]: indexed command paths of the
//!   target CLI with their flags and positional placeholders.
//! - [`canonicalize_tokens`]: synonym mapping from prompt words onto the
//!   CLI's vocabulary.
//! - [`choose_candidates`]: verb + overlap + fuzzy ranking of paths.
//! - [`render_command`]: placeholder rendering of a chosen spec.
//! - [`template::generate`]: static keyword-to-template generator.
//! - [`Config`]: YAML configuration shared by the other crates.
//!
//! Structural checks on a loaded index live in [`validate_index`].
//!
//! # Example
//!
//! ```
//! use cmdgen_core::*;
//!
//! let mut index = CommandIndex::new("gcloud", "2024-01-01T00:00:00Z");
//! index.insert(
//!     CommandSpec::new("run services describe")
//!         .with_flags(["--region", "--project", "--format"])
//!         .with_positionals(["SERVICE"]),
//! );
//! index.insert(CommandSpec::new("run services list").with_flags(["--region"]));
//!
//! let best = &choose_candidates(&index, "show Cloud Run service config", 1)[0];
//! assert_eq!(
//!     render_command("gcloud", &best.spec, &RenderOptions::default()),
//!     "gcloud run services describe <service> --region=<REGION> --project=<PROJECT_ID> --format=json"
//! );
//! ```

mod config;
mod index;
mod matcher;
mod render;
pub mod template;
mod types;
mod validate;
mod vocab;

pub use config::{
    Config, ConfigError, DEFAULT_PRIORITY_PREFIXES, DEFAULT_WIDE_FLAGS, IndexConfig, LlmConfig,
    ToolConfig,
};
pub use index::{CommandIndex, IndexMeta, ToolFingerprint, preferred_track};
pub use matcher::{choose_candidates, score_candidate, similarity_ratio};
pub use render::{
    PreferredFlag, RenderOptions, apply_flag_placeholders, flag_key, render_command, tool_name,
};
pub use template::TemplateError;
pub use types::*;
pub use validate::{IndexValidationError, is_path_token, validate_index, validate_spec};
pub use vocab::{CANONICAL_VERBS, canonicalize_tokens, is_canonical_verb, tokenize};
