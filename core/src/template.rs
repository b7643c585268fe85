//! Static template generator.
//!
//! A keyword heuristic over the lowercased prompt picks a product
//! ("service") and an action, and the pair selects one of a fixed set of
//! canonical command templates. No index and no subprocess are involved,
//! so the result is fully deterministic.

use thiserror::Error;

/// Template lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// No product hint found in the prompt.
    #[error(
        "Unsupported/ambiguous prompt. Try mentioning a product (e.g., 'Cloud Run', 'GKE', 'Compute Engine', 'Cloud SQL', 'Cloud Storage', or 'IAM')."
    )]
    Unsupported,
    /// A product and action were found but no template covers the pair.
    #[error("No safe template for: {service} + {action}.")]
    NoTemplate {
        service: &'static str,
        action: &'static str,
    },
}

const TEMPLATES: &[((&str, &str), &str)] = &[
    // Cloud Run
    (
        ("cloud_run", "describe"),
        "gcloud run services describe SERVICE_NAME --project=PROJECT_ID --region=REGION --format=yaml",
    ),
    (
        ("cloud_run", "list"),
        "gcloud run services list --project=PROJECT_ID --region=REGION",
    ),
    (
        ("cloud_run", "logs_read"),
        "gcloud run services logs read SERVICE_NAME --project=PROJECT_ID --limit=50",
    ),
    (
        ("cloud_run", "logs_tail"),
        "gcloud beta run services logs tail SERVICE_NAME --project=PROJECT_ID",
    ),
    (
        ("cloud_run", "revisions_list"),
        "gcloud run revisions list --service=SERVICE_NAME --region=REGION --project=PROJECT_ID",
    ),
    (
        ("cloud_run", "revisions_describe"),
        "gcloud run revisions describe REVISION_NAME --region=REGION --project=PROJECT_ID --format=yaml",
    ),
    // GKE
    (
        ("gke", "describe"),
        "gcloud container clusters describe CLUSTER_NAME --location=LOCATION --project=PROJECT_ID",
    ),
    (
        ("gke", "list"),
        "gcloud container clusters list --project=PROJECT_ID",
    ),
    // Compute Engine
    (
        ("compute", "describe"),
        "gcloud compute instances describe INSTANCE_NAME --zone=ZONE --project=PROJECT_ID",
    ),
    (
        ("compute", "list"),
        "gcloud compute instances list --project=PROJECT_ID",
    ),
    // Cloud SQL
    (
        ("cloud_sql", "describe"),
        "gcloud sql instances describe INSTANCE_NAME --project=PROJECT_ID",
    ),
    (
        ("cloud_sql", "list"),
        "gcloud sql instances list --project=PROJECT_ID",
    ),
    // Cloud Storage
    (
        ("storage", "describe"),
        "gcloud storage buckets describe gs://BUCKET_NAME --project=PROJECT_ID",
    ),
    (
        ("storage", "list"),
        "gcloud storage buckets list --project=PROJECT_ID",
    ),
    // IAM (project level)
    (
        ("iam", "policy"),
        "gcloud projects get-iam-policy PROJECT_ID --format=json",
    ),
];

const SERVICE_HINTS: &[(&str, &[&str])] = &[
    (
        "cloud_run",
        &["cloud run", "run service", "cloudrun", "run ", "cloud-run", "serverless run"],
    ),
    ("gke", &["gke", "kubernetes", "k8s", "cluster", "kubernetes engine"]),
    (
        "compute",
        &["compute engine", "compute", "vm", "instance", "vm instance", "gce"],
    ),
    (
        "cloud_sql",
        &["cloud sql", "sql instance", "postgres", "mysql", "cloudsql", "csql"],
    ),
    ("storage", &["cloud storage", "gcs", "bucket", "storage"]),
    (
        "iam",
        &["iam", "policy", "who has access", "permissions", "roles", "members", "access"],
    ),
];

const ACTION_HINTS: &[(&str, &[&str])] = &[
    (
        "describe",
        &[
            "describe",
            "config",
            "configuration",
            "settings",
            "details",
            "inspect",
            "spec",
            "yaml",
            "show config",
        ],
    ),
    ("list", &["list", "ls", "show all", "enumerate", "list all"]),
    (
        "logs_read",
        &["logs", "read logs", "view logs", "get logs", "error logs", "errors"],
    ),
    ("logs_tail", &["tail", "stream", "follow"]),
    (
        "revisions_list",
        &["revisions", "history", "previous versions", "all revisions"],
    ),
    ("revisions_describe", &["revision details", "describe revision"]),
    (
        "policy",
        &["iam policy", "policy", "who has access", "members", "roles", "permissions"],
    ),
];

/// Conflict resolution when several actions match.
const ACTION_PREFERENCE: &[&str] = &[
    "logs_tail",
    "logs_read",
    "revisions_describe",
    "revisions_list",
    "describe",
    "list",
    "policy",
];

/// Picks the product mentioned in the prompt.
///
/// The product with the longest matching hint wins; ties go to
/// declaration order. A first-match scan in declaration order would read
/// "cloud sql instance" as Compute (via "instance"), so matching on hint
/// length is deliberate.
pub fn pick_service(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    let mut best: Option<(&'static str, usize)> = None;
    for (service, hints) in SERVICE_HINTS {
        let longest = hints
            .iter()
            .filter(|hint| lower.contains(*hint))
            .map(|hint| hint.len())
            .max();
        if let Some(len) = longest {
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((service, len));
            }
        }
    }
    best.map(|(service, _)| service)
}

/// Picks the action for a product; defaults to `describe`.
pub fn pick_action(service: &str, text: &str) -> &'static str {
    if service == "iam" {
        return "policy";
    }
    let lower = text.to_lowercase();
    let matches: Vec<&'static str> = ACTION_HINTS
        .iter()
        .filter(|(_, hints)| hints.iter().any(|hint| lower.contains(hint)))
        .map(|(action, _)| *action)
        .collect();

    if matches.is_empty() {
        return "describe";
    }
    ACTION_PREFERENCE
        .iter()
        .copied()
        .find(|preferred| matches.contains(preferred))
        .unwrap_or(matches[0])
}

/// Returns the canonical template for a prompt.
///
/// # Examples
///
/// ```
/// use cmdgen_core::template::{generate, TemplateError};
///
/// assert_eq!(
///     generate("show config for my cloud run service").unwrap(),
///     "gcloud run services describe SERVICE_NAME --project=PROJECT_ID --region=REGION --format=yaml"
/// );
/// assert_eq!(generate("make me a sandwich"), Err(TemplateError::Unsupported));
/// ```
pub fn generate(prompt: &str) -> Result<&'static str, TemplateError> {
    let service = pick_service(prompt).ok_or(TemplateError::Unsupported)?;
    let action = pick_action(service, prompt);
    TEMPLATES
        .iter()
        .find(|((svc, act), _)| *svc == service && *act == action)
        .map(|(_, template)| *template)
        .ok_or(TemplateError::NoTemplate { service, action })
}
