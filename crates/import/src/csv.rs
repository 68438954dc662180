use chrono::NaiveDate;
use csv::StringRecord;
use gstbook_core::{parse_currency, parse_date, parse_percentage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::{detect_mapping, ExpenseColumnMapping};

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("No data rows")]
    NoDataRows,
}

/// One expense line that survived the pre-filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedExpenseRow {
    /// 1-indexed position among the data rows, header excluded.
    pub row_number: usize,
    pub date: NaiveDate,
    /// Raw vendor text as it appeared in the file.
    pub item_name: String,
    /// GST-inclusive, always positive.
    pub total_cents: i64,
    pub gst_cents: i64,
    pub biz_percent: u8,
    pub category_name: Option<String>,
    pub description: Option<String>,
}

// ── Shared reader plumbing ────────────────────────────────────────────────────

pub(crate) fn reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.trim_start_matches('\u{feff}').as_bytes())
}

/// Header name to column index lookup for one file.
pub(crate) struct HeaderIndex {
    headers: Vec<String>,
}

impl HeaderIndex {
    pub(crate) fn read(reader: &mut csv::Reader<&[u8]>) -> Result<Self, CsvError> {
        let headers = reader.headers()?.iter().map(|h| h.to_string()).collect();
        Ok(Self { headers })
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub(crate) fn names(&self) -> Vec<&str> {
        self.headers.iter().map(String::as_str).collect()
    }
}

/// The trimmed value in column `idx`, or `""` when the column or cell is missing.
pub(crate) fn field(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or_default()
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

// ── Expense parsing ───────────────────────────────────────────────────────────

/// Parses expense rows, silently dropping anything that cannot become an
/// expense: missing date/item/total, spreadsheet "Total" lines, unreadable
/// dates, and totals that are blank, zero or negative.
pub fn parse_expenses(
    content: &str,
    mapping: &ExpenseColumnMapping,
) -> Result<Vec<ParsedExpenseRow>, CsvError> {
    let mut reader = reader(content);
    let headers = HeaderIndex::read(&mut reader)?;

    let date_col = headers.position(&mapping.date);
    let item_col = headers.position(&mapping.item);
    let total_col = headers.position(&mapping.total);
    let gst_col = mapping.gst.as_deref().and_then(|h| headers.position(h));
    let biz_col = mapping.biz_percent.as_deref().and_then(|h| headers.position(h));
    let category_col = mapping.category.as_deref().and_then(|h| headers.position(h));
    let description_col = mapping.description.as_deref().and_then(|h| headers.position(h));

    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        let row_number = idx + 1;

        let item = field(&record, item_col);
        let total_raw = field(&record, total_col);
        let date_raw = field(&record, date_col);
        if item.is_empty() || total_raw.is_empty() || date_raw.is_empty() {
            continue;
        }
        if is_summary_line(item) || is_summary_line(total_raw) {
            continue;
        }

        let Some(date) = parse_date(date_raw) else {
            continue;
        };
        let Some(total_cents) = parse_currency(total_raw).filter(|c| *c > 0) else {
            continue;
        };

        let gst_cents = parse_currency(field(&record, gst_col)).unwrap_or(0);
        let biz_percent = match biz_col {
            Some(_) => parse_percentage(field(&record, biz_col)),
            None => 100,
        };

        rows.push(ParsedExpenseRow {
            row_number,
            date,
            item_name: item.to_string(),
            total_cents,
            gst_cents,
            biz_percent,
            category_name: non_empty(field(&record, category_col)),
            description: non_empty(field(&record, description_col)),
        });
    }

    Ok(rows)
}

fn is_summary_line(value: &str) -> bool {
    value.to_lowercase().contains("total")
}

/// Reads only the header row and tries [`detect_mapping`] on it.
pub fn detect_expense_mapping(content: &str) -> Result<Option<ExpenseColumnMapping>, CsvError> {
    let mut reader = reader(content);
    let headers = HeaderIndex::read(&mut reader)?;
    Ok(detect_mapping(&headers.names()))
}
