//! Cleanup of raw model replies.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:bash|shell|sh)?\n?").expect("static regex must compile"));
static PROMPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[$#][ \t]*").expect("static regex must compile"));

/// Extracts the command from a model reply.
///
/// Code fences and shell prompt markers (`$`, `#`) are removed. The first
/// line starting with `tool` wins; otherwise the first non-empty line.
///
/// # Examples
///
/// ```
/// use cmdgen_llm::clean_command;
///
/// let raw = "Here you go:\n```bash\n$ gcloud compute instances list --project=PROJECT_ID\n```";
/// assert_eq!(
///     clean_command(raw, "gcloud"),
///     "gcloud compute instances list --project=PROJECT_ID"
/// );
/// ```
pub fn clean_command(raw: &str, tool: &str) -> String {
    let unfenced = FENCE_OPEN_RE.replace_all(raw, "");
    let unfenced = unfenced.replace("```", "");
    let stripped = PROMPT_RE.replace_all(&unfenced, "");

    let lines: Vec<&str> = stripped
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .find(|line| line.starts_with(tool))
        .or_else(|| lines.first())
        .map(|line| line.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_command_is_unchanged() {
        assert_eq!(
            clean_command("gcloud run services list\n", "gcloud"),
            "gcloud run services list"
        );
    }

    #[test]
    fn test_fence_without_language() {
        let raw = "```\ngcloud sql instances describe INSTANCE\n```\n";
        assert_eq!(clean_command(raw, "gcloud"), "gcloud sql instances describe INSTANCE");
    }

    #[test]
    fn test_hash_prompt_and_commentary() {
        let raw = "The command is\n#  gcloud projects list\nThis lists projects.";
        assert_eq!(clean_command(raw, "gcloud"), "gcloud projects list");
    }

    #[test]
    fn test_falls_back_to_first_line() {
        assert_eq!(clean_command("\n\n  run services list\nmore", "gcloud"), "run services list");
        assert_eq!(clean_command("   ", "gcloud"), "");
    }
}
