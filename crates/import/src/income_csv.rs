use std::str::FromStr;

use chrono::NaiveDate;
use gstbook_core::{parse_date, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::csv::{field, non_empty, reader, CsvError, HeaderIndex};
use crate::mapping::IncomeColumnMapping;

/// One invoice line read from an income CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIncomeRow {
    pub row_number: usize,
    pub client_name: String,
    pub invoice_num: Option<String>,
    pub subtotal_cents: i64,
    pub gst_cents: i64,
    pub total_cents_from_csv: i64,
    /// `subtotal_cents + gst_cents`; the figure that gets stored.
    pub calculated_total_cents: i64,
    pub total_matches: bool,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Parses income rows. Rows without a client name are skipped; amounts that
/// cannot be read count as zero rather than dropping the row. Dates come
/// from the optional date column, else `default_date`, else today.
///
/// A file that yields no rows at all is an error.
pub fn parse_incomes(
    content: &str,
    mapping: &IncomeColumnMapping,
    default_date: Option<NaiveDate>,
) -> Result<Vec<ParsedIncomeRow>, CsvError> {
    let mut reader = reader(content);
    let headers = HeaderIndex::read(&mut reader)?;

    let client_col = headers.position(&mapping.client);
    let invoice_col = mapping.invoice_number.as_deref().and_then(|h| headers.position(h));
    let subtotal_col = headers.position(&mapping.subtotal);
    let gst_col = headers.position(&mapping.gst);
    let total_col = headers.position(&mapping.total);
    let date_col = mapping.date.as_deref().and_then(|h| headers.position(h));
    let description_col = mapping.description.as_deref().and_then(|h| headers.position(h));

    let fallback_date = default_date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;

        let client_name = field(&record, client_col);
        if client_name.is_empty() {
            continue;
        }

        let mut subtotal_cents = cents_or_zero(field(&record, subtotal_col));
        let mut gst_cents = cents_or_zero(field(&record, gst_col));
        let total_cents_from_csv = cents_or_zero(field(&record, total_col));
        // A sum past the i64 range is as unreadable as the amounts themselves.
        let calculated_total_cents = match subtotal_cents.checked_add(gst_cents) {
            Some(total) => total,
            None => {
                subtotal_cents = 0;
                gst_cents = 0;
                0
            }
        };

        rows.push(ParsedIncomeRow {
            row_number: idx + 1,
            client_name: client_name.to_string(),
            invoice_num: non_empty(field(&record, invoice_col)),
            subtotal_cents,
            gst_cents,
            total_cents_from_csv,
            calculated_total_cents,
            total_matches: total_cents_from_csv == calculated_total_cents,
            date: parse_date(field(&record, date_col)).unwrap_or(fallback_date),
            description: non_empty(field(&record, description_col)),
        });
    }

    if rows.is_empty() {
        return Err(CsvError::NoDataRows);
    }
    Ok(rows)
}

/// Invoice amounts: `$` and thousands separators stripped, anything else
/// unreadable is zero.
fn cents_or_zero(raw: &str) -> i64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    Decimal::from_str(&cleaned)
        .ok()
        .and_then(Money::from_decimal)
        .map_or(0, Money::to_cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> IncomeColumnMapping {
        IncomeColumnMapping::default()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_invoice_row_with_matching_total() {
        let data = "Client,Invoice #,Subtotal,GST,Total\nAida Tomescu,1,$560,$56,$616.00\n";
        let rows = parse_incomes(data, &mapping(), Some(date(2025, 9, 30))).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.client_name, "Aida Tomescu");
        assert_eq!(row.invoice_num.as_deref(), Some("1"));
        assert_eq!(row.subtotal_cents, 56_000);
        assert_eq!(row.gst_cents, 5_600);
        assert_eq!(row.calculated_total_cents, 61_600);
        assert!(row.total_matches);
        assert_eq!(row.date, date(2025, 9, 30));
    }

    #[test]
    fn mismatched_total_keeps_calculated_value() {
        let data = "Client,Subtotal,GST,Total\nAcme,$100,$10,$120\n";
        let rows = parse_incomes(data, &mapping(), None).unwrap();
        assert_eq!(rows[0].total_cents_from_csv, 12_000);
        assert_eq!(rows[0].calculated_total_cents, 11_000);
        assert!(!rows[0].total_matches);
    }

    #[test]
    fn unreadable_amounts_are_zero() {
        let data = "Client,Subtotal,GST,Total\nAcme,TBC,,(5.00)\n";
        let rows = parse_incomes(data, &mapping(), None).unwrap();
        assert_eq!(rows[0].subtotal_cents, 0);
        assert_eq!(rows[0].gst_cents, 0);
        assert_eq!(rows[0].total_cents_from_csv, 0);
        assert!(rows[0].total_matches);
    }

    #[test]
    fn oversized_amounts_are_zero() {
        let data = "Client,Subtotal,GST,Total\n\
                    Acme,50000000000000000,50000000000000000,1\n\
                    Acme,79228162514264337593543950335,10,20\n";
        let rows = parse_incomes(data, &mapping(), None).unwrap();
        assert_eq!(rows[0].subtotal_cents, 0);
        assert_eq!(rows[0].gst_cents, 0);
        assert_eq!(rows[0].calculated_total_cents, 0);
        assert_eq!(rows[0].total_cents_from_csv, 100);
        assert!(!rows[0].total_matches);
        assert_eq!(rows[1].subtotal_cents, 0);
        assert_eq!(rows[1].calculated_total_cents, 1000);
    }

    #[test]
    fn date_column_wins_over_default() {
        let data = "Client,Subtotal,GST,Total,Date\n\
                    Acme,100,10,110,15/08/2025\n\
                    Acme,100,10,110,someday\n";
        let rows = parse_incomes(data, &mapping(), Some(date(2025, 1, 1))).unwrap();
        assert_eq!(rows[0].date, date(2025, 8, 15));
        assert_eq!(rows[1].date, date(2025, 1, 1));
    }

    #[test]
    fn skips_rows_without_client() {
        let data = "Client,Subtotal,GST,Total\n,100,10,110\nGlobex,200,20,220\n";
        let rows = parse_incomes(data, &mapping(), None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 2);
    }

    #[test]
    fn no_rows_is_an_error() {
        let data = "Client,Subtotal,GST,Total\n,1,1,2\n";
        assert!(matches!(parse_incomes(data, &mapping(), None), Err(CsvError::NoDataRows)));
        assert!(matches!(parse_incomes("", &mapping(), None), Err(CsvError::NoDataRows)));
    }
}
