//! Name normalization and edit-distance similarity shared by the provider
//! and client matchers.

use serde::{Deserialize, Serialize};

/// The tier a name match was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    Exact,
    Alias,
    Contains,
    StartsWith,
    Partial,
    Fuzzy,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "exact"),
            MatchType::Alias => write!(f, "alias"),
            MatchType::Contains => write!(f, "contains"),
            MatchType::StartsWith => write!(f, "startsWith"),
            MatchType::Partial => write!(f, "partial"),
            MatchType::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Default minimum similarity for a fuzzy hit.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Which suffix set [`normalize`] strips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameProfile {
    /// Vendor names: legal-entity and country markers.
    Provider,
    /// Client legal names vary more, so company words are dropped too.
    Client,
}

const ENTITY_WORDS: &[&str] = &["pty", "ltd", "limited", "inc", "llc"];
const COMPANY_WORDS: &[&str] = &["corporation", "corp", "company", "co"];
const COUNTRY_WORDS: &[&str] = &["australia", "au"];

impl NameProfile {
    fn strips(self, word: &str) -> bool {
        ENTITY_WORDS.contains(&word)
            || COUNTRY_WORDS.contains(&word)
            || (self == NameProfile::Client && COMPANY_WORDS.contains(&word))
    }
}

/// Lowercases, drops everything outside `[a-z0-9]` and whitespace, removes
/// the profile's suffix words and collapses whitespace.
///
/// Works token by token so that a second pass never finds anything new:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(name: &str, profile: NameProfile) -> String {
    let cleaned: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|word| !profile.strips(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Character-level edit distance (insertions, deletions, substitutions).
///
/// Only two rows of the table are kept, each as long as the shorter input.
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let (long, short): (Vec<char>, Vec<char>) = {
        let a: Vec<char> = s1.chars().collect();
        let b: Vec<char> = s2.chars().collect();
        if a.len() >= b.len() { (a, b) } else { (b, a) }
    };
    if short.is_empty() {
        return long.len();
    }

    let mut above: Vec<usize> = (0..=short.len()).collect();
    let mut row = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitute = above[j] + usize::from(lc != sc);
            row[j + 1] = substitute.min(above[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut above, &mut row);
    }

    above[short.len()]
}

/// Similarity in `[0.0, 1.0]` of two already-normalized names.
///
/// Empty input scores 0 even against another empty string.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}
