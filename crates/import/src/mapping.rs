use serde::{Deserialize, Serialize};

/// Named CSV dialects an import can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Custom,
    Manual,
    CommBank,
    Amex,
    Nab,
    Westpac,
    Anz,
    Other,
}

impl ImportSource {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Manual => "manual",
            Self::CommBank => "commbank",
            Self::Amex => "amex",
            Self::Nab => "nab",
            Self::Westpac => "westpac",
            Self::Anz => "anz",
            Self::Other => "other",
        }
    }

    /// The source name written to the job ledger. Banks without a dedicated
    /// mapping are recorded as `other`.
    pub fn ledger_name(&self) -> &'static str {
        match self {
            Self::Nab | Self::Westpac | Self::Anz => Self::Other.key(),
            other => other.key(),
        }
    }

    /// Dedicated expense column layout, if this source has one. Sources
    /// without one fall back to header detection.
    pub fn expense_preset(&self) -> Option<ExpenseColumnMapping> {
        match self {
            Self::Custom | Self::Manual => Some(ExpenseColumnMapping::manual()),
            Self::CommBank => Some(ExpenseColumnMapping::bank("Date", "Description", "Debit")),
            Self::Amex => Some(ExpenseColumnMapping::bank("Date", "Description", "Amount")),
            Self::Nab | Self::Westpac | Self::Anz | Self::Other => None,
        }
    }

    /// Only the manual layout carries invoice data.
    pub fn income_preset(&self) -> Option<IncomeColumnMapping> {
        match self {
            Self::Custom | Self::Manual => Some(IncomeColumnMapping::default()),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for ImportSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "custom" => Ok(Self::Custom),
            "manual" => Ok(Self::Manual),
            "commbank" => Ok(Self::CommBank),
            "amex" => Ok(Self::Amex),
            "nab" => Ok(Self::Nab),
            "westpac" => Ok(Self::Westpac),
            "anz" => Ok(Self::Anz),
            "other" => Ok(Self::Other),
            other => Err(format!("Unknown import source: '{other}'")),
        }
    }
}

/// Literal header names for each expense field in one CSV dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseColumnMapping {
    pub date: String,
    pub item: String,
    pub total: String,
    #[serde(default)]
    pub gst: Option<String>,
    #[serde(default)]
    pub biz_percent: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExpenseColumnMapping {
    /// The hand-maintained spreadsheet layout.
    pub fn manual() -> Self {
        Self {
            date: "Date".to_string(),
            item: "Item".to_string(),
            total: "Total".to_string(),
            gst: Some("GST".to_string()),
            biz_percent: Some("Biz%".to_string()),
            category: Some("Category".to_string()),
            description: Some("Description".to_string()),
        }
    }

    fn bank(date: &str, item: &str, total: &str) -> Self {
        Self {
            date: date.to_string(),
            item: item.to_string(),
            total: total.to_string(),
            gst: None,
            biz_percent: None,
            category: None,
            description: None,
        }
    }
}

/// Literal header names for each income field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeColumnMapping {
    pub client: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub subtotal: String,
    pub gst: String,
    pub total: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Default for IncomeColumnMapping {
    fn default() -> Self {
        Self {
            client: "Client".to_string(),
            invoice_number: Some("Invoice #".to_string()),
            subtotal: "Subtotal".to_string(),
            gst: "GST".to_string(),
            total: "Total".to_string(),
            date: Some("Date".to_string()),
            description: Some("Description".to_string()),
        }
    }
}

// ── Header auto-detection ─────────────────────────────────────────────────────

const DATE_HEADERS: &[&str] = &["date", "transaction date"];
const ITEM_HEADERS: &[&str] = &["item", "description", "merchant", "vendor", "payee"];
const TOTAL_HEADERS: &[&str] = &["total", "amount", "debit", "value", "price"];
const GST_HEADERS: &[&str] = &["gst", "tax", "vat"];
const BIZ_HEADERS: &[&str] = &["biz%", "business", "business use"];
const CATEGORY_HEADERS: &[&str] = &["category", "cat", "type"];

fn find_header(headers: &[&str], synonyms: &[&str]) -> Option<String> {
    synonyms.iter().find_map(|synonym| {
        headers
            .iter()
            .find(|h| h.trim().eq_ignore_ascii_case(synonym))
            .map(|h| h.trim().to_string())
    })
}

/// Builds an expense mapping from whatever headers a file has. Returns
/// `None` unless date, item and total columns can all be located.
pub fn detect_mapping(headers: &[&str]) -> Option<ExpenseColumnMapping> {
    Some(ExpenseColumnMapping {
        date: find_header(headers, DATE_HEADERS)?,
        item: find_header(headers, ITEM_HEADERS)?,
        total: find_header(headers, TOTAL_HEADERS)?,
        gst: find_header(headers, GST_HEADERS),
        biz_percent: find_header(headers, BIZ_HEADERS),
        category: find_header(headers, CATEGORY_HEADERS),
        description: None,
    })
}
