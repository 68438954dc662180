use gstbook_core::{Category, CategoryId, Provider, FALLBACK_CATEGORY};
use serde::{Deserialize, Serialize};

use crate::provider_match::extract_keywords;

/// Candidate category names for each keyword bucket, most specific first.
const KEYWORD_CATEGORIES: &[(&str, &[&str])] = &[
    ("hosting", &["Hosting & Cloud", "Hosting", "Cloud Services", "Software & Subscriptions"]),
    ("software", &["Software & Subscriptions", "Software", "Subscriptions"]),
    ("internet", &["Internet", "Internet & Phone"]),
    ("phone", &["Phone", "Mobile Phone", "Internet & Phone"]),
    ("office", &["Office Supplies", "Office"]),
    ("furniture", &["Furniture & Equipment", "Furniture", "Equipment"]),
    ("fuel", &["Vehicle & Fuel", "Fuel", "Vehicle Expenses", "Motor Vehicle"]),
    ("accounting", &["Accounting Fees", "Accounting"]),
    ("legal", &["Legal Fees", "Legal"]),
];

/// Where a resolved category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategorySource {
    Csv,
    ProviderDefault,
    Keyword,
    Fallback,
    FirstAvailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCategory {
    pub id: CategoryId,
    pub name: String,
    pub source: CategorySource,
}

impl ResolvedCategory {
    fn new(category: &Category, source: CategorySource) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            source,
        }
    }
}

/// Picks the category for an expense row.
///
/// Order: the CSV's own category name, the provider's default, a category
/// suggested by the vendor text's keywords, "Other", then whatever category
/// comes first. `None` only when `categories` is empty.
pub fn resolve_category(
    csv_category: Option<&str>,
    provider: &Provider,
    item_text: &str,
    categories: &[Category],
) -> Option<ResolvedCategory> {
    if let Some(name) = csv_category.filter(|n| !n.trim().is_empty()) {
        if let Some(c) = categories.iter().find(|c| c.is_named(name)) {
            return Some(ResolvedCategory::new(c, CategorySource::Csv));
        }
    }

    if let Some(default_id) = provider.default_category_id {
        if let Some(c) = categories.iter().find(|c| c.id == default_id) {
            return Some(ResolvedCategory::new(c, CategorySource::ProviderDefault));
        }
    }

    if let Some(c) = keyword_category(item_text, categories) {
        return Some(ResolvedCategory::new(c, CategorySource::Keyword));
    }

    if let Some(c) = categories.iter().find(|c| c.is_named(FALLBACK_CATEGORY)) {
        return Some(ResolvedCategory::new(c, CategorySource::Fallback));
    }

    categories
        .first()
        .map(|c| ResolvedCategory::new(c, CategorySource::FirstAvailable))
}

fn keyword_category<'a>(item_text: &str, categories: &'a [Category]) -> Option<&'a Category> {
    extract_keywords(item_text).into_iter().find_map(|keyword| {
        let (_, candidates) = KEYWORD_CATEGORIES.iter().find(|(k, _)| *k == keyword)?;
        candidates
            .iter()
            .find_map(|name| categories.iter().find(|c| c.is_named(name)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gstbook_core::ProviderId;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: CategoryId(id),
            name: name.to_string(),
            tax_label: Some("G11".to_string()),
            is_deductible: true,
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            category(1, "Internet"),
            category(2, "Software & Subscriptions"),
            category(3, "Vehicle & Fuel"),
            category(4, "Other"),
        ]
    }

    fn provider(default_category: Option<i64>) -> Provider {
        Provider {
            id: ProviderId(10),
            name: "Acme".to_string(),
            is_international: false,
            default_category_id: default_category.map(CategoryId),
        }
    }

    #[test]
    fn csv_category_wins_case_insensitively() {
        let r = resolve_category(Some("internet"), &provider(Some(2)), "BP", &categories()).unwrap();
        assert_eq!(r.id, CategoryId(1));
        assert_eq!(r.source, CategorySource::Csv);
    }

    #[test]
    fn unknown_csv_category_falls_to_provider_default() {
        let r = resolve_category(Some("Snacks"), &provider(Some(2)), "BP", &categories()).unwrap();
        assert_eq!(r.id, CategoryId(2));
        assert_eq!(r.source, CategorySource::ProviderDefault);
    }

    #[test]
    fn dangling_provider_default_falls_to_keywords() {
        let r = resolve_category(None, &provider(Some(99)), "BP Connect", &categories()).unwrap();
        assert_eq!(r.name, "Vehicle & Fuel");
        assert_eq!(r.source, CategorySource::Keyword);
    }

    #[test]
    fn keyword_candidates_walk_to_available_name() {
        // "hosting" prefers "Hosting & Cloud" but settles for software.
        let r = resolve_category(None, &provider(None), "AWS", &categories()).unwrap();
        assert_eq!(r.name, "Software & Subscriptions");
    }

    #[test]
    fn falls_back_to_other_then_first() {
        let r = resolve_category(None, &provider(None), "Bakery", &categories()).unwrap();
        assert_eq!(r.name, "Other");
        assert_eq!(r.source, CategorySource::Fallback);

        let without_other = vec![category(5, "Travel"), category(6, "Meals")];
        let r = resolve_category(None, &provider(None), "Bakery", &without_other).unwrap();
        assert_eq!(r.name, "Travel");
        assert_eq!(r.source, CategorySource::FirstAvailable);
    }

    #[test]
    fn no_categories_resolves_nothing() {
        assert!(resolve_category(Some("Internet"), &provider(Some(1)), "iiNet", &[]).is_none());
    }
}
