use gstbook_core::{Client, ClientId};
use serde::{Deserialize, Serialize};

use crate::fuzzy::{normalize, similarity, MatchType, NameProfile, DEFAULT_MATCH_THRESHOLD};

/// Shortest normalized name allowed to take part in a partial match.
const MIN_PARTIAL_LEN: usize = 3;

/// A client with its name normalized once per import.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedClient {
    pub id: ClientId,
    pub name: String,
    pub normalized_name: String,
}

/// Client names are encrypted at rest and cannot be compared inside the
/// database, so the whole list is decrypted and normalized up front.
pub fn prepare_clients_for_matching(clients: &[Client]) -> Vec<CachedClient> {
    clients
        .iter()
        .map(|c| CachedClient {
            id: c.id,
            name: c.name.clone(),
            normalized_name: normalize(&c.name, NameProfile::Client),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMatch {
    pub client_id: ClientId,
    pub client_name: String,
    pub score: f64,
    pub match_type: MatchType,
}

/// Matches free-text client names: exact, then partial containment, then
/// fuzzy similarity.
#[derive(Debug, Clone)]
pub struct ClientMatcher {
    pub threshold: f64,
}

impl Default for ClientMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl ClientMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn find_best_match(&self, client_text: &str, clients: &[CachedClient]) -> Option<ClientMatch> {
        let text = normalize(client_text, NameProfile::Client);
        if text.is_empty() || clients.is_empty() {
            return None;
        }
        let candidates = || clients.iter().filter(|c| !c.normalized_name.is_empty());

        if let Some(c) = candidates().find(|c| c.normalized_name == text) {
            return Some(to_match(c, 1.0, MatchType::Exact));
        }

        let partial = best_of(candidates().filter_map(|c| {
            partial_score(&text, &c.normalized_name).map(|score| (c, score))
        }));
        if let Some((c, score)) = partial.filter(|(_, s)| *s >= self.threshold) {
            return Some(to_match(c, score, MatchType::Partial));
        }

        best_of(candidates().map(|c| (c, similarity(&text, &c.normalized_name))))
            .filter(|(_, score)| *score >= self.threshold)
            .map(|(c, score)| to_match(c, score, MatchType::Fuzzy))
    }
}

/// `0.8 + 0.15 * shorter/longer`, capped at 0.95, when one name contains the
/// other and both are long enough to mean something.
fn partial_score(a: &str, b: &str) -> Option<f64> {
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len < MIN_PARTIAL_LEN || b_len < MIN_PARTIAL_LEN {
        return None;
    }
    if !a.contains(b) && !b.contains(a) {
        return None;
    }
    let ratio = a_len.min(b_len) as f64 / a_len.max(b_len) as f64;
    Some((0.8 + 0.15 * ratio).min(0.95))
}

/// Highest score wins; the earliest candidate keeps a tie.
fn best_of<'a>(
    scored: impl Iterator<Item = (&'a CachedClient, f64)>,
) -> Option<(&'a CachedClient, f64)> {
    scored.fold(None, |best, (c, score)| match best {
        Some((_, b)) if b >= score => best,
        _ => Some((c, score)),
    })
}

fn to_match(c: &CachedClient, score: f64, match_type: MatchType) -> ClientMatch {
    ClientMatch {
        client_id: c.id,
        client_name: c.name.clone(),
        score,
        match_type,
    }
}
