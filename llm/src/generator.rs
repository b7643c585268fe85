//! Generate → validate → retry loop.

use cmdgen_core::CommandValidator;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clean::clean_command;
use crate::client::TextModel;
use crate::prompt::build_generation_prompt;

/// Default number of generate/validate rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// One round of the loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    pub iteration: usize,
    /// Cleaned command; empty when the model call failed.
    pub command: String,
    /// Validation message or API error for a failed round.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`CommandGenerator::generate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub message: String,
    /// Rounds used; on failure this is the iteration limit.
    pub iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub attempts: Vec<Attempt>,
}

/// Drives a [`TextModel`] until a [`CommandValidator`] accepts its output.
pub struct CommandGenerator<M, V> {
    tool: String,
    model: M,
    validator: V,
    max_iterations: usize,
}

impl<M: TextModel, V: CommandValidator> CommandGenerator<M, V> {
    pub fn new(tool: &str, model: M, validator: V) -> Self {
        Self {
            tool: tool.to_string(),
            model,
            validator,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the iteration limit (at least one round always runs).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn generate(&self, request: &str) -> GenerationOutcome {
        let mut previous_error: Option<String> = None;
        let mut attempts = Vec::new();

        for iteration in 1..=self.max_iterations {
            let prompt = build_generation_prompt(&self.tool, request, previous_error.as_deref());

            let raw = match self.model.complete(&prompt) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(iteration, error = %err, "Model request failed");
                    let message = err.to_string();
                    attempts.push(Attempt {
                        iteration,
                        command: String::new(),
                        error: Some(message.clone()),
                    });
                    previous_error = Some(message);
                    continue;
                }
            };

            let command = clean_command(&raw, &self.tool);
            debug!(iteration, command = %command, "Validating generated command");
            let outcome = self.validator.validate(&command);

            if outcome.valid {
                info!(iterations = iteration, "Generated command validated");
                attempts.push(Attempt {
                    iteration,
                    command: command.clone(),
                    error: None,
                });
                return GenerationOutcome {
                    success: true,
                    command: Some(command),
                    message: "Command generated and validated successfully".to_string(),
                    iterations: iteration,
                    last_error: None,
                    attempts,
                };
            }

            debug!(iteration, error = %outcome.message, "Generated command rejected");
            attempts.push(Attempt {
                iteration,
                command,
                error: Some(outcome.message.clone()),
            });
            previous_error = Some(outcome.message);
        }

        GenerationOutcome {
            success: false,
            command: None,
            message: format!(
                "Failed to generate valid command after {} attempts",
                self.max_iterations
            ),
            iterations: self.max_iterations,
            last_error: previous_error,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use cmdgen_core::ValidationOutcome;

    use super::*;
    use crate::error::{LlmError, Result};

    /// Replies from a script and records every prompt it sees.
    struct ScriptedModel {
        replies: RefCell<VecDeque<Result<String>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextModel for ScriptedModel {
        fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }

    /// Accepts only commands without `--bogus`.
    struct NoBogus;

    impl CommandValidator for NoBogus {
        fn validate(&self, command: &str) -> ValidationOutcome {
            if command.contains("--bogus") {
                ValidationOutcome::invalid("Unknown flag(s) for 'run services list': --bogus")
            } else {
                ValidationOutcome::valid("run services list")
            }
        }
    }

    #[test]
    fn test_first_try_success() {
        let model = ScriptedModel::new(vec![Ok("```bash\ngcloud run services list\n```".to_string())]);
        let outcome = CommandGenerator::new("gcloud", &model, NoBogus).generate("list services");

        assert!(outcome.success);
        assert_eq!(outcome.command.as_deref(), Some("gcloud run services list"));
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.message, "Command generated and validated successfully");
        assert_eq!(outcome.attempts.len(), 1);
    }

    #[test]
    fn test_retry_feeds_back_previous_error() {
        let model = ScriptedModel::new(vec![
            Ok("gcloud run services list --bogus".to_string()),
            Ok("gcloud run services list --region=REGION".to_string()),
        ]);
        let outcome = CommandGenerator::new("gcloud", &model, NoBogus).generate("list services");

        assert!(outcome.success);
        assert_eq!(outcome.iterations, 2);
        let prompts = model.prompts.borrow();
        assert!(!prompts[0].contains("PREVIOUS ATTEMPT FAILED"));
        assert!(prompts[1].contains("PREVIOUS ATTEMPT FAILED with error:\nUnknown flag(s) for 'run services list': --bogus"));
        assert_eq!(
            outcome.attempts[0].error.as_deref(),
            Some("Unknown flag(s) for 'run services list': --bogus")
        );
    }

    #[test]
    fn test_api_errors_are_retried_then_exhausted() {
        let model = ScriptedModel::new(vec![
            Err(LlmError::Status(503)),
            Ok("gcloud run services list --bogus".to_string()),
        ]);
        let outcome = CommandGenerator::new("gcloud", &model, NoBogus)
            .with_max_iterations(2)
            .generate("list services");

        assert!(!outcome.success);
        assert!(outcome.command.is_none());
        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.message, "Failed to generate valid command after 2 attempts");
        assert_eq!(
            outcome.last_error.as_deref(),
            Some("Unknown flag(s) for 'run services list': --bogus")
        );
        assert_eq!(outcome.attempts[0].command, "");
        assert_eq!(
            outcome.attempts[0].error.as_deref(),
            Some("API returned status 503")
        );
        assert!(!model.prompts.borrow()[1].contains("API error"));
        assert!(model.prompts.borrow()[1].contains("API returned status 503"));
    }

    #[test]
    fn test_zero_iterations_still_runs_once() {
        let model = ScriptedModel::new(vec![Ok("gcloud projects list".to_string())]);
        let outcome = CommandGenerator::new("gcloud", &model, NoBogus)
            .with_max_iterations(0)
            .generate("projects");
        assert!(outcome.success);
        assert_eq!(model.prompts.borrow().len(), 1);
    }
}
