use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::fuzzy::{normalize, similarity, MatchType, NameProfile, DEFAULT_MATCH_THRESHOLD};

/// Bank-statement spellings mapped to the canonical provider name they mean.
/// Keys are already in normalized form.
const PROVIDER_ALIASES: &[(&str, &str)] = &[
    ("ii net", "iiNet"),
    ("amazon web services", "AWS"),
    ("aws amazon", "AWS"),
    ("google cloud platform", "Google Cloud"),
    ("google cloud", "Google Cloud"),
    ("gcp", "Google Cloud"),
    ("microsoft azure", "Azure"),
    ("digital ocean", "DigitalOcean"),
    ("office 365", "Microsoft"),
    ("microsoft 365", "Microsoft"),
    ("msft", "Microsoft"),
    ("adobe systems", "Adobe"),
    ("creative cloud", "Adobe"),
    ("gh sponsors", "GitHub"),
    ("jira", "Atlassian"),
    ("confluence", "Atlassian"),
    ("bp connect", "BP"),
    ("bp express", "BP"),
    ("caltex", "Ampol"),
    ("ampol foodary", "Ampol"),
    ("7 eleven", "7-Eleven"),
    ("shell coles express", "Shell"),
    ("reddy express", "Shell"),
    ("aussie bb", "Aussie Broadband"),
    ("telstra corp", "Telstra"),
];

/// The single best provider for a piece of vendor text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMatch {
    /// The known provider name exactly as supplied by the caller.
    pub provider_name: String,
    pub score: f64,
    pub match_type: MatchType,
}

/// Matches free-text vendor strings against known provider names.
///
/// Tiers are tried in order and the first hit wins: alias, exact, contains,
/// starts-with, then the best fuzzy candidate at or above the threshold.
/// Every text that starts with a name also contains it, so the starts-with
/// tier never fires in practice; it stays so the `startsWith` label keeps
/// its meaning for callers.
#[derive(Debug, Clone)]
pub struct ProviderMatcher {
    pub threshold: f64,
}

impl Default for ProviderMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl ProviderMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn find_best_match<S: AsRef<str>>(
        &self,
        item_text: &str,
        known_providers: &[S],
    ) -> Option<ProviderMatch> {
        let item = normalize(item_text, NameProfile::Provider);
        if item.is_empty() || known_providers.is_empty() {
            return None;
        }

        let known: Vec<(&str, String)> = known_providers
            .iter()
            .map(|p| (p.as_ref(), normalize(p.as_ref(), NameProfile::Provider)))
            .filter(|(_, normalized)| !normalized.is_empty())
            .collect();

        let hit = |name: &str, score: f64, match_type: MatchType| ProviderMatch {
            provider_name: name.to_string(),
            score,
            match_type,
        };

        if let Some(name) = alias_target(&item, &known) {
            return Some(hit(name, 1.0, MatchType::Alias));
        }
        if let Some((name, _)) = known.iter().find(|(_, norm)| *norm == item) {
            return Some(hit(name, 1.0, MatchType::Exact));
        }
        if let Some((name, _)) = known.iter().find(|(_, norm)| item.contains(norm.as_str())) {
            return Some(hit(name, 0.9, MatchType::Contains));
        }
        if let Some((name, _)) = known.iter().find(|(_, norm)| item.starts_with(norm.as_str())) {
            return Some(hit(name, 0.85, MatchType::StartsWith));
        }

        let mut best: Option<(&str, f64)> = None;
        for (name, norm) in &known {
            let score = similarity(&item, norm);
            if score >= self.threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((name, score));
            }
        }
        best.map(|(name, score)| hit(name, score, MatchType::Fuzzy))
    }
}

/// Returns the known provider an alias phrase in `item` points at, if that
/// provider is in the list.
fn alias_target<'a>(item: &str, known: &[(&'a str, String)]) -> Option<&'a str> {
    let padded = format!(" {item} ");
    PROVIDER_ALIASES
        .iter()
        .filter(|(alias, _)| padded.contains(&format!(" {alias} ")))
        .find_map(|(_, canonical)| {
            let target = normalize(canonical, NameProfile::Provider);
            known
                .iter()
                .find(|(_, norm)| *norm == target)
                .map(|(name, _)| *name)
        })
}

// ── Keyword classification ────────────────────────────────────────────────────

const KEYWORD_PATTERNS: &[(&str, &str)] = &[
    (
        "hosting",
        r"\b(aws|amazon web services|azure|google cloud|gcp|digital ?ocean|linode|vultr|heroku|vercel|netlify|cloudflare|hosting|cloud)\b",
    ),
    (
        "software",
        r"\b(github|gitlab|atlassian|jira|slack|adobe|microsoft|office 365|jetbrains|figma|notion|dropbox|zoom|software|subscription|saas|licen[cs]e)\b",
    ),
    ("internet", r"\b(iinet|ii net|tpg|aussie broadband|superloop|internet|nbn|broadband)\b"),
    ("phone", r"\b(telstra|optus|vodafone|mobile|phone)\b"),
    ("office", r"\b(officeworks|stationery|office supplies|printer|toner|paper)\b"),
    ("furniture", r"\b(ikea|desk|chair|furniture)\b"),
    (
        "fuel",
        r"\b(bp|shell|caltex|ampol|7-eleven|fuel|petrol|diesel|parking|toll|linkt|e-?tag)\b",
    ),
    ("accounting", r"\b(xero|myob|quickbooks|accountant|accounting|bookkeep\w*|tax agent)\b"),
    ("legal", r"\b(lawyer|solicitor|legal|asic|conveyanc\w*)\b"),
];

fn keyword_regexes() -> &'static [(&'static str, Regex)] {
    static R: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    R.get_or_init(|| {
        KEYWORD_PATTERNS
            .iter()
            .map(|(keyword, pat)| (*keyword, Regex::new(pat).expect("invalid regex")))
            .collect()
    })
}

/// Buckets vendor text into expense keywords (`hosting`, `software`,
/// `internet`, `phone`, `office`, `furniture`, `fuel`, `accounting`,
/// `legal`). Used for category fallback, not for provider identity.
pub fn extract_keywords(item_text: &str) -> Vec<&'static str> {
    let text = item_text.to_lowercase();
    keyword_regexes()
        .iter()
        .filter(|(_, re)| re.is_match(&text))
        .map(|(keyword, _)| *keyword)
        .collect()
}
