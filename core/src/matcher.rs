//! Prompt-to-path ranking.
//!
//! Each indexed command path is scored against the canonicalized prompt
//! with a linear combination of three signals:
//!
//! - verb agreement between the prompt and the path (`0.5` when the path's
//!   verb is one the prompt asked for, `0.35` when both mention a verb but
//!   they differ),
//! - Jaccard overlap of the remaining (non-verb) tokens, weighted `0.55`,
//! - character-level similarity of the joined prompt and the path,
//!   weighted `0.35`.
//!
//! Ranking is deterministic: equal totals are ordered by path.

use std::cmp::Ordering;
use std::collections::HashSet;

use similar::TextDiff;

use crate::vocab::{canonicalize_tokens, is_canonical_verb, tokenize};
use crate::{Candidate, CommandIndex, ScoreBreakdown};

const OVERLAP_WEIGHT: f64 = 0.55;
const FUZZY_WEIGHT: f64 = 0.35;
const VERB_MATCH_BONUS: f64 = 0.5;
const VERB_PRESENT_BONUS: f64 = 0.35;

/// Character-level similarity in `[0, 1]` (`2·M / T`).
///
/// # Examples
///
/// ```
/// use cmdgen_core::similarity_ratio;
///
/// assert_eq!(similarity_ratio("run", "run"), 1.0);
/// assert_eq!(similarity_ratio("", ""), 1.0);
/// assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
/// ```
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Scores one command path against canonicalized prompt tokens.
///
/// # Examples
///
/// ```
/// use cmdgen_core::score_candidate;
///
/// let prompt = vec!["describe".to_string(), "run".to_string(), "services".to_string()];
/// let hit = score_candidate(&prompt, "run services describe");
/// let miss = score_candidate(&prompt, "compute disks list");
/// assert!(hit.total > miss.total);
/// assert_eq!(hit.verb_bonus, 0.5);
/// assert_eq!(miss.verb_bonus, 0.35);
/// ```
pub fn score_candidate(prompt_tokens: &[String], candidate_path: &str) -> ScoreBreakdown {
    let path_tokens: Vec<&str> = candidate_path.split_whitespace().collect();

    let prompt_verbs: HashSet<&str> = prompt_tokens
        .iter()
        .map(String::as_str)
        .filter(|token| is_canonical_verb(token))
        .collect();
    let path_verb = path_tokens.iter().copied().find(|token| is_canonical_verb(token));

    let verb_bonus = match path_verb {
        Some(verb) if prompt_verbs.contains(verb) => VERB_MATCH_BONUS,
        Some(_) if !prompt_verbs.is_empty() => VERB_PRESENT_BONUS,
        _ => 0.0,
    };

    let prompt_nouns: HashSet<&str> = prompt_tokens
        .iter()
        .map(String::as_str)
        .filter(|token| !is_canonical_verb(token))
        .collect();
    let path_nouns: HashSet<&str> = path_tokens
        .iter()
        .copied()
        .filter(|token| !is_canonical_verb(token))
        .collect();
    let shared = prompt_nouns.intersection(&path_nouns).count();
    let union = prompt_nouns.union(&path_nouns).count();
    let overlap = shared as f64 / union.max(1) as f64;

    let fuzzy = similarity_ratio(&prompt_tokens.join(" "), candidate_path);

    ScoreBreakdown {
        overlap,
        fuzzy,
        verb_bonus,
        total: OVERLAP_WEIGHT * overlap + FUZZY_WEIGHT * fuzzy + verb_bonus,
    }
}

/// Ranks every indexed path against `prompt` and returns the best `top_k`
/// (at least one when the index is not empty).
///
/// # Examples
///
/// ```
/// use cmdgen_core::*;
///
/// let mut index = CommandIndex::new("gcloud", "2024-01-01T00:00:00Z");
/// index.insert(CommandSpec::new("run services describe"));
/// index.insert(CommandSpec::new("run services list"));
/// index.insert(CommandSpec::new("compute instances list"));
///
/// let best = choose_candidates(&index, "show Cloud Run service config", 1);
/// assert_eq!(best[0].spec.path, "run services describe");
/// ```
pub fn choose_candidates(index: &CommandIndex, prompt: &str, top_k: usize) -> Vec<Candidate> {
    let tokens = canonicalize_tokens(&tokenize(prompt));
    let mut scored: Vec<Candidate> = index
        .specs()
        .map(|spec| Candidate {
            score: score_candidate(&tokens, &spec.path),
            spec: spec.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total
            .partial_cmp(&a.score.total)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.spec.path.cmp(&b.spec.path))
    });
    scored.truncate(top_k.max(1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandSpec;

    fn index_of(paths: &[&str]) -> CommandIndex {
        let mut index = CommandIndex::new("gcloud", "2024-01-01T00:00:00Z");
        for path in paths {
            index.insert(CommandSpec::new(path));
        }
        index
    }

    fn realistic_index() -> CommandIndex {
        index_of(&[
            "run services describe",
            "run services list",
            "run services delete",
            "run services update",
            "run revisions describe",
            "run revisions list",
            "run jobs describe",
            "run deploy",
            "compute instances describe",
            "compute instances list",
            "compute instances create",
            "compute firewall-rules list",
            "pubsub topics list",
            "pubsub subscriptions create",
            "storage buckets list",
            "storage buckets describe",
            "secrets list",
            "iam service-accounts create",
        ])
    }

    fn best(prompt: &str) -> String {
        choose_candidates(&realistic_index(), prompt, 1)[0].spec.path.clone()
    }

    #[test]
    fn test_cloud_run_service_config() {
        assert_eq!(best("show Cloud Run service config"), "run services describe");
    }

    #[test]
    fn test_list_vms() {
        assert_eq!(best("list my compute engine vms"), "compute instances list");
    }

    #[test]
    fn test_list_topics() {
        assert_eq!(best("enumerate pubsub topics"), "pubsub topics list");
    }

    #[test]
    fn test_create_service_account() {
        assert_eq!(best("make a new service account"), "iam service-accounts create");
    }

    #[test]
    fn test_verb_bonus_levels() {
        let tokens = vec!["list".to_string(), "buckets".to_string()];
        assert_eq!(score_candidate(&tokens, "storage buckets list").verb_bonus, 0.5);
        assert_eq!(score_candidate(&tokens, "storage buckets describe").verb_bonus, 0.35);
        assert_eq!(score_candidate(&tokens, "storage buckets").verb_bonus, 0.0);

        let nouns_only = vec!["buckets".to_string()];
        assert_eq!(score_candidate(&nouns_only, "storage buckets list").verb_bonus, 0.0);
    }

    #[test]
    fn test_overlap_is_jaccard_of_nouns() {
        let tokens = vec!["run".to_string(), "services".to_string(), "describe".to_string()];
        let score = score_candidate(&tokens, "run services describe");
        assert_eq!(score.overlap, 1.0);
        assert_eq!(score.fuzzy, 1.0);
        assert!((score.total - (0.55 + 0.35 + 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_ties_ordered_by_path() {
        let index = index_of(&["zeta list", "alpha list", "mid list"]);
        let ranked = choose_candidates(&index, "", 3);
        let paths: Vec<&str> = ranked.iter().map(|c| c.spec.path.as_str()).collect();
        assert_eq!(paths, vec!["alpha list", "mid list", "zeta list"]);
    }

    #[test]
    fn test_top_k_is_at_least_one() {
        let index = realistic_index();
        assert_eq!(choose_candidates(&index, "list", 0).len(), 1);
        assert_eq!(choose_candidates(&index, "list", 5).len(), 5);
        assert!(choose_candidates(&index_of(&[]), "list", 3).is_empty());
    }
}
