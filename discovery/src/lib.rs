//! Live discovery of a hierarchical CLI's command tree.
//!
//! This crate builds and maintains the [`CommandIndex`] that ranking runs
//! on, by invoking the target CLI and parsing its help pages:
//!
//! - [`runner`]: subprocess execution with timeouts behind the
//!   [`CommandRunner`](runner::CommandRunner) trait.
//! - [`parser`]: man-style help parsing (listings, flags, placeholders).
//! - [`crawl`]: `meta list-commands` with a recursive help-crawl fallback.
//! - [`extractor`]: one help page to one [`CommandSpec`](cmdgen_core::CommandSpec).
//! - [`builder`] / [`cache`]: index build, lazy resolution and the JSON cache.
//! - [`validate`]: checking a command string against live help output.
//!
//! # Example
//!
//! ```
//! use cmdgen_core::ReleaseTrack;
//! use cmdgen_discovery::extractor::spec_from_help;
//!
//! let help = "\
//! NAME
//!     gcloud compute instances describe - describe a virtual machine instance
//!
//! SYNOPSIS
//!     gcloud compute instances describe INSTANCE_NAME [--zone=ZONE]
//!         [GCLOUD_WIDE_FLAG ...]
//!
//! FLAGS
//!      --zone=ZONE
//!         Zone of the instance to describe.
//! ";
//!
//! let spec = spec_from_help("gcloud", "compute instances describe", ReleaseTrack::Ga, help, &[]).spec;
//! assert_eq!(spec.positionals, vec!["INSTANCE_NAME"]);
//! assert_eq!(spec.flags, vec!["--zone"]);
//! ```
//!
//! [`CommandIndex`]: cmdgen_core::CommandIndex

pub mod builder;
pub mod cache;
pub mod crawl;
pub mod error;
pub mod extractor;
pub mod output;
pub mod parser;
pub mod report;
pub mod runner;
pub mod validate;

pub use builder::{BuiltIndex, IndexBuilder, MAX_RESOLVE_ROUNDS, build_index, resolve_pending};
pub use cache::{IndexCache, tool_fingerprint};
pub use error::DiscoveryError;
pub use runner::{CommandRunner, HelpProbe, ProcessRunner, RunOutput};
pub use validate::{HelpValidator, validate_command_string};
