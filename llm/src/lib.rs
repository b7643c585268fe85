//! Command generation through a generative-text model.
//!
//! The model is asked for a single command, the reply is cleaned up, and
//! the result is checked by a [`CommandValidator`](cmdgen_core::CommandValidator).
//! A rejected command is fed back into the next prompt until the
//! iteration limit is reached.

pub mod clean;
pub mod client;
pub mod error;
pub mod generator;
pub mod prompt;

pub use clean::clean_command;
pub use client::{GeminiClient, TextModel};
pub use error::LlmError;
pub use generator::{Attempt, CommandGenerator, GenerationOutcome};
pub use prompt::build_generation_prompt;
