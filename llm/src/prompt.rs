//! Prompt construction.

/// Builds the generation prompt for `request`.
///
/// When `previous_error` is set, the prompt ends with the failure so the
/// model can correct its last answer.
///
/// # Examples
///
/// ```
/// use cmdgen_llm::build_generation_prompt;
///
/// let first = build_generation_prompt("gcloud", "list my VMs", None);
/// assert!(first.contains("list my VMs"));
/// assert!(!first.contains("PREVIOUS ATTEMPT FAILED"));
///
/// let retry = build_generation_prompt("gcloud", "list my VMs", Some("Unknown flag(s): --zonee"));
/// assert!(retry.contains("PREVIOUS ATTEMPT FAILED with error:\nUnknown flag(s): --zonee"));
/// ```
pub fn build_generation_prompt(tool: &str, request: &str, previous_error: Option<&str>) -> String {
    let mut prompt = format!(
        "You are an expert in Google Cloud Platform and {tool} CLI commands.

Generate a syntactically correct {tool} command based on this request:
{request}

CRITICAL RULES:
1. Output ONLY the {tool} command, nothing else
2. Use placeholders for actual values:
   - PROJECT_ID for project IDs
   - SERVICE_NAME for service names
   - REGION for regions (or use 'us-central1' as default)
   - INSTANCE_NAME for instance names
   - etc.
3. Ensure the command uses correct {tool} syntax
4. Use the most common and stable command structure
5. Include essential flags only
6. Do NOT add explanations, markdown, or code blocks

Example format:
{tool} run services describe SERVICE_NAME --project=PROJECT_ID --region=REGION

"
    );

    if let Some(error) = previous_error {
        prompt.push_str(&format!(
            "\nPREVIOUS ATTEMPT FAILED with error:\n{error}\n\nPlease correct the command and try again.\n"
        ));
    }
    prompt
}
