use std::time::Instant;

use gstbook_core::{
    ClientRepository, ImportJobId, ImportJobRepository, ImportKind, IncomeRepository, JobOutcome,
    Money, NewImportJob, NewIncome,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::client_match::{prepare_clients_for_matching, CachedClient, ClientMatch, ClientMatcher};
use crate::csv::CsvError;
use crate::error::ImportError;
use crate::income_csv::{parse_incomes, ParsedIncomeRow};
use crate::mapping::{ImportSource, IncomeColumnMapping};
use crate::options::IncomeImportOptions;

/// One income CSV upload.
#[derive(Debug, Clone)]
pub struct IncomeImportRequest<'a> {
    pub content: &'a str,
    pub source: Option<&'a str>,
    pub mapping: Option<IncomeColumnMapping>,
    pub options: IncomeImportOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRowResult {
    pub row_number: usize,
    pub success: bool,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub match_info: Option<ClientMatch>,
    #[serde(rename = "createdRecordPreview", skip_serializing_if = "Option::is_none")]
    pub income: Option<NewIncome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeImportResult {
    pub import_job_id: ImportJobId,
    pub total_rows: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub duplicate_count: usize,
    pub warning_count: usize,
    pub total_subtotal_cents: i64,
    pub total_gst_cents: i64,
    pub total_amount_cents: i64,
    pub processing_time_ms: u64,
    pub rows: Vec<IncomeRowResult>,
}

/// Turns an income CSV into incomes. Clients are matched in memory because
/// their names are only readable once decrypted.
pub struct IncomeImporter<S> {
    store: S,
}

impl<S> IncomeImporter<S>
where
    S: ClientRepository + IncomeRepository + ImportJobRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        name = "income_import",
        skip(self, request),
        fields(source = request.source.unwrap_or("custom"), dry_run = request.options.common.dry_run)
    )]
    pub async fn import(
        &self,
        request: IncomeImportRequest<'_>,
    ) -> Result<IncomeImportResult, ImportError> {
        let started = Instant::now();
        let options = &request.options;
        options.common.validate()?;

        let (mapping, source) = resolve_mapping(request.source, request.mapping.clone())?;
        let rows = parse_incomes(request.content, &mapping, options.default_date).map_err(
            |e| match e {
                CsvError::NoDataRows => ImportError::NoValidRows,
                other => ImportError::Csv(other),
            },
        )?;

        let clients = prepare_clients_for_matching(&self.store.find_all_clients().await?);

        let job = self
            .store
            .create_job(&NewImportJob {
                kind: ImportKind::Income,
                source: source.to_string(),
                total_rows: rows.len() as i64,
            })
            .await?;
        info!(job_id = %job.id, rows = rows.len(), "income import started");

        let matcher = ClientMatcher::new(options.common.match_threshold);
        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.process_row(row, &matcher, &clients, options, job.id).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    self.abort(job.id, rows.len(), &e).await;
                    return Err(e);
                }
            }
        }

        let candidates: Vec<NewIncome> = results.iter().filter_map(|r| r.income.clone()).collect();
        if !candidates.is_empty() && !options.common.dry_run {
            if let Err(e) = self.store.insert_incomes(&candidates).await {
                let e = ImportError::from(e);
                self.abort(job.id, rows.len(), &e).await;
                return Err(e);
            }
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let failed_count = results.len() - success_count;
        let duplicate_count = results.iter().filter(|r| r.is_duplicate).count();
        let warning_count = results.iter().filter(|r| r.warning.is_some()).count();
        let total_subtotal_cents = candidates
            .iter()
            .map(|i| i.subtotal_cents)
            .fold(0, i64::saturating_add);
        let total_gst_cents = candidates
            .iter()
            .map(|i| i.gst_cents)
            .fold(0, i64::saturating_add);
        let total_amount_cents = candidates
            .iter()
            .map(|i| i.total_cents)
            .fold(0, i64::saturating_add);

        let outcome = JobOutcome::from_counts(rows.len(), success_count, failed_count, duplicate_count);
        self.store.finalize_job(job.id, &outcome).await?;

        let processing_time_ms = started.elapsed().as_millis() as u64;
        info!(
            job_id = %job.id,
            status = %outcome.status,
            success_count,
            failed_count,
            duplicate_count,
            warning_count,
            processing_time_ms,
            "income import finished"
        );

        Ok(IncomeImportResult {
            import_job_id: job.id,
            total_rows: rows.len(),
            success_count,
            failed_count,
            duplicate_count,
            warning_count,
            total_subtotal_cents,
            total_gst_cents,
            total_amount_cents,
            processing_time_ms,
            rows: results,
        })
    }

    async fn process_row(
        &self,
        row: &ParsedIncomeRow,
        matcher: &ClientMatcher,
        clients: &[CachedClient],
        options: &IncomeImportOptions,
        job_id: ImportJobId,
    ) -> Result<IncomeRowResult, ImportError> {
        let warning = (!row.total_matches).then(|| {
            format!(
                "CSV total {} does not match subtotal + GST {}; using the calculated total",
                Money::from_cents(row.total_cents_from_csv),
                Money::from_cents(row.calculated_total_cents)
            )
        });
        let failed = |message: String, match_info: Option<ClientMatch>, is_duplicate: bool| {
            IncomeRowResult {
                row_number: row.row_number,
                success: false,
                is_duplicate,
                error: Some(message),
                warning: warning.clone(),
                match_info,
                income: None,
            }
        };

        let Some(matched) = matcher.find_best_match(&row.client_name, clients) else {
            warn!(row = row.row_number, client = %row.client_name, "no client match");
            return Ok(failed(
                format!("No matching client found for \"{}\"", row.client_name),
                None,
                false,
            ));
        };
        debug!(
            row = row.row_number,
            client_id = %matched.client_id,
            match_type = %matched.match_type,
            score = matched.score,
            "client matched"
        );

        if options.common.skip_duplicates {
            if let Some(invoice) = row.invoice_num.as_deref() {
                if self
                    .store
                    .income_exists_by_invoice(matched.client_id, invoice)
                    .await?
                {
                    warn!(row = row.row_number, invoice, "duplicate invoice");
                    let message = format!(
                        "Duplicate: invoice {invoice} for {} already exists",
                        matched.client_name
                    );
                    return Ok(failed(message, Some(matched), true));
                }
            }
            if self
                .store
                .income_exists(row.date, row.calculated_total_cents, matched.client_id)
                .await?
            {
                warn!(row = row.row_number, "duplicate income");
                let message = format!(
                    "Duplicate: an income from {} for {} on {} already exists",
                    matched.client_name,
                    Money::from_cents(row.calculated_total_cents),
                    row.date
                );
                return Ok(failed(message, Some(matched), true));
            }
        }

        let income = NewIncome {
            client_id: matched.client_id,
            invoice_num: row.invoice_num.clone(),
            date: row.date,
            subtotal_cents: row.subtotal_cents,
            gst_cents: row.gst_cents,
            total_cents: row.calculated_total_cents,
            description: row.description.clone(),
            is_paid: options.mark_as_paid,
            paid_date: options.mark_as_paid.then_some(row.date),
            import_job_id: Some(job_id),
        };

        Ok(IncomeRowResult {
            row_number: row.row_number,
            success: true,
            is_duplicate: false,
            error: None,
            warning,
            match_info: Some(matched),
            income: Some(income),
        })
    }

    async fn abort(&self, job_id: ImportJobId, attempted: usize, cause: &ImportError) {
        error!(job_id = %job_id, error = %cause, "income import aborted");
        let outcome = JobOutcome::aborted(attempted, cause.to_string());
        if let Err(e) = self.store.finalize_job(job_id, &outcome).await {
            warn!(job_id = %job_id, error = %e, "could not mark import job failed");
        }
    }
}

/// Incomes only come from the manual layout or an explicit mapping.
fn resolve_mapping(
    source: Option<&str>,
    mapping: Option<IncomeColumnMapping>,
) -> Result<(IncomeColumnMapping, &'static str), ImportError> {
    let parsed = source.map(|s| s.parse::<ImportSource>()).transpose();

    if let Some(mapping) = mapping {
        let name = parsed.ok().flatten().map_or(ImportSource::Custom.key(), |s| s.ledger_name());
        return Ok((mapping, name));
    }

    let source = parsed
        .map_err(ImportError::BadRequest)?
        .unwrap_or(ImportSource::Custom);
    let preset = source.income_preset().ok_or_else(|| {
        ImportError::BadRequest(format!("Source '{source}' has no income column mapping"))
    })?;
    Ok((preset, source.ledger_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_sources_have_income_layout() {
        let (m, name) = resolve_mapping(Some("manual"), None).unwrap();
        assert_eq!(m, IncomeColumnMapping::default());
        assert_eq!(name, "manual");
    }

    #[test]
    fn bank_source_has_no_income_layout() {
        assert!(matches!(
            resolve_mapping(Some("commbank"), None),
            Err(ImportError::BadRequest(_))
        ));
        assert!(matches!(
            resolve_mapping(Some("paypal"), None),
            Err(ImportError::BadRequest(_))
        ));
    }

    #[test]
    fn explicit_mapping_needs_no_source() {
        let mapping = IncomeColumnMapping {
            client: "Customer".to_string(),
            ..IncomeColumnMapping::default()
        };
        let (m, name) = resolve_mapping(None, Some(mapping.clone())).unwrap();
        assert_eq!(m, mapping);
        assert_eq!(name, "custom");
    }
}
