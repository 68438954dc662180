use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ClientId, ProviderId};

/// A vendor expenses are paid to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    /// Overseas suppliers charge no Australian GST.
    pub is_international: bool,
    pub default_category_id: Option<CategoryId>,
}

/// A customer incomes are invoiced to.
///
/// Names are held encrypted at rest, so repositories hand them back already
/// decrypted and matching happens in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// BAS label purchases in this category are reported under (G10, G11).
    pub tax_label: Option<String>,
    pub is_deductible: bool,
}

impl Category {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(name.trim())
    }
}

/// Name of the catch-all category used when nothing more specific resolves.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Categories seeded into a fresh ledger: (name, tax label, deductible).
pub const DEFAULT_CATEGORIES: &[(&str, &str, bool)] = &[
    ("Hosting & Cloud", "G11", true),
    ("Software & Subscriptions", "G11", true),
    ("Internet", "G11", true),
    ("Phone", "G11", true),
    ("Office Supplies", "G11", true),
    ("Furniture & Equipment", "G10", true),
    ("Vehicle & Fuel", "G11", true),
    ("Accounting Fees", "G11", true),
    ("Legal Fees", "G11", true),
    ("Bank Fees", "G11", true),
    ("Travel", "G11", true),
    ("Education & Training", "G11", true),
    ("Personal", "", false),
    (FALLBACK_CATEGORY, "G11", true),
];
