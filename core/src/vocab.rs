//! Prompt tokenization and synonym canonicalization.
//!
//! Free-text prompts are split into lowercase tokens and mapped onto the
//! vocabulary the target CLI uses in its command paths: verbs become one of
//! [`CANONICAL_VERBS`], resource nouns become their path spelling
//! (`vm` → `instances`, `cloud run` → `run`).

use std::collections::HashMap;
use std::sync::LazyLock;

/// Verbs that carry the operation of a command path.
pub const CANONICAL_VERBS: &[&str] = &["describe", "list", "create", "delete", "update", "deploy"];

/// Prompt verb → canonical path verb.
pub const VERB_SYNONYMS: &[(&str, &str)] = &[
    ("get", "describe"),
    ("show", "describe"),
    ("details", "describe"),
    ("describe", "describe"),
    ("inspect", "describe"),
    ("fetch", "describe"),
    ("list", "list"),
    ("ls", "list"),
    ("enumerate", "list"),
    ("create", "create"),
    ("make", "create"),
    ("new", "create"),
    ("deploy", "deploy"),
    ("apply", "update"),
    ("update", "update"),
    ("patch", "update"),
    ("set", "update"),
    ("delete", "delete"),
    ("remove", "delete"),
    ("rm", "delete"),
];

/// Prompt noun or phrase → path token.
pub const RESOURCE_SYNONYMS: &[(&str, &str)] = &[
    // Cloud Run
    ("cloudrun", "run"),
    ("cloud run", "run"),
    ("service", "services"),
    ("services", "services"),
    ("revision", "revisions"),
    ("revisions", "revisions"),
    ("job", "jobs"),
    ("jobs", "jobs"),
    // Compute
    ("compute engine", "compute"),
    ("vm", "instances"),
    ("vms", "instances"),
    ("instance", "instances"),
    ("instances", "instances"),
    ("firewall", "firewall-rules"),
    ("firewalls", "firewall-rules"),
    ("disk", "disks"),
    ("disks", "disks"),
    ("image", "images"),
    ("images", "images"),
    ("router", "routers"),
    ("routers", "routers"),
    ("mig", "instance-groups"),
    // IAM / projects
    ("project", "projects"),
    ("projects", "projects"),
    ("service account", "service-accounts"),
    ("service accounts", "service-accounts"),
    ("iam", "iam"),
    // Pub/Sub
    ("pubsub", "pubsub"),
    ("topic", "topics"),
    ("topics", "topics"),
    ("subscription", "subscriptions"),
    ("subscriptions", "subscriptions"),
    // Storage
    ("gcs", "storage"),
    ("storage bucket", "buckets"),
    ("bucket", "buckets"),
    ("buckets", "buckets"),
    // Artifacts, secrets, build
    ("artifact", "artifacts"),
    ("artifacts", "artifacts"),
    ("secret", "secrets"),
    ("secrets", "secrets"),
    ("cloud build", "builds"),
    ("build", "builds"),
    ("builds", "builds"),
];

static VERB_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| VERB_SYNONYMS.iter().copied().collect());

static RESOURCE_MAP: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| RESOURCE_SYNONYMS.iter().copied().collect());

/// Splits text on anything that is neither a word character nor `-` and
/// lowercases the pieces.
///
/// # Examples
///
/// ```
/// use cmdgen_core::tokenize;
///
/// assert_eq!(
///     tokenize("Show Cloud-Run service's config!"),
///     vec!["show", "cloud-run", "service", "s", "config"]
/// );
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '-'))
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Maps tokens onto canonical verbs and path nouns.
///
/// Adjacent token pairs are checked against multi-word resource phrases
/// before single tokens; a verb synonym takes precedence over a resource
/// synonym for the same token. Unknown tokens pass through unchanged.
///
/// # Examples
///
/// ```
/// use cmdgen_core::{canonicalize_tokens, tokenize};
///
/// let tokens = canonicalize_tokens(&tokenize("show Cloud Run service config"));
/// assert_eq!(tokens, vec!["describe", "run", "services", "config"]);
/// ```
pub fn canonicalize_tokens(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Some(next) = tokens.get(i + 1) {
            let phrase = format!("{} {}", tokens[i], next);
            if let Some(mapped) = RESOURCE_MAP.get(phrase.as_str()) {
                out.push((*mapped).to_string());
                i += 2;
                continue;
            }
        }

        let token = tokens[i].as_str();
        let mapped = VERB_MAP
            .get(token)
            .or_else(|| RESOURCE_MAP.get(token))
            .copied()
            .unwrap_or(token);
        out.push(mapped.to_string());
        i += 1;
    }
    out
}

/// Returns `true` for one of [`CANONICAL_VERBS`].
pub fn is_canonical_verb(token: &str) -> bool {
    CANONICAL_VERBS.contains(&token)
}
