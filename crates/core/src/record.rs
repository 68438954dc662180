use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ClientId, ImportJobId, ProviderId};

/// An expense ready to be written, resolved from one imported row.
///
/// Amounts are the full GST-inclusive figures; the business-use percentage
/// is stored alongside and applied by reporting, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub provider_id: ProviderId,
    pub category_id: CategoryId,
    pub date: NaiveDate,
    pub amount_cents: i64,
    pub gst_cents: i64,
    pub biz_percent: u8,
    pub description: Option<String>,
    pub import_job_id: Option<ImportJobId>,
}

/// An income ready to be written, resolved from one imported row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncome {
    pub client_id: ClientId,
    pub invoice_num: Option<String>,
    pub date: NaiveDate,
    pub subtotal_cents: i64,
    pub gst_cents: i64,
    /// Always `subtotal_cents + gst_cents`.
    pub total_cents: i64,
    pub description: Option<String>,
    pub is_paid: bool,
    pub paid_date: Option<NaiveDate>,
    pub import_job_id: Option<ImportJobId>,
}
