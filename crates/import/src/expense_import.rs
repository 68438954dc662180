use std::time::Instant;

use gstbook_core::{
    Category, CategoryRepository, ExpenseRepository, ImportJobId, ImportJobRepository, ImportKind,
    JobOutcome, Money, NewExpense, NewImportJob, Provider, ProviderRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::category::{resolve_category, ResolvedCategory};
use crate::csv::{detect_expense_mapping, parse_expenses, ParsedExpenseRow};
use crate::error::ImportError;
use crate::mapping::{ExpenseColumnMapping, ImportSource};
use crate::options::ImportOptions;
use crate::provider_match::{ProviderMatch, ProviderMatcher};

/// One expense CSV upload.
#[derive(Debug, Clone)]
pub struct ExpenseImportRequest<'a> {
    pub content: &'a str,
    /// Named dialect; ignored for column layout when `mapping` is given.
    pub source: Option<&'a str>,
    pub mapping: Option<ExpenseColumnMapping>,
    pub options: ImportOptions,
}

/// Per-row audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRowResult {
    pub row_number: usize,
    pub success: bool,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub match_info: Option<ProviderMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_category: Option<ResolvedCategory>,
    #[serde(rename = "createdRecordPreview", skip_serializing_if = "Option::is_none")]
    pub expense: Option<NewExpense>,
}

impl ExpenseRowResult {
    fn failed(row: &ParsedExpenseRow, message: String) -> Self {
        Self {
            row_number: row.row_number,
            success: false,
            is_duplicate: false,
            error: Some(message),
            warning: None,
            match_info: None,
            resolved_category: None,
            expense: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseImportResult {
    pub import_job_id: ImportJobId,
    pub total_rows: usize,
    pub success_count: usize,
    /// Failed rows, duplicates included.
    pub failed_count: usize,
    pub duplicate_count: usize,
    pub total_amount_cents: i64,
    pub total_gst_cents: i64,
    pub processing_time_ms: u64,
    pub rows: Vec<ExpenseRowResult>,
}

/// Turns an expense CSV into expenses: parse, match each row to a provider,
/// resolve its category, reject duplicates, settle GST, then write every
/// surviving row in one transaction and close the import job.
pub struct ExpenseImporter<S> {
    store: S,
}

impl<S> ExpenseImporter<S>
where
    S: ProviderRepository + CategoryRepository + ExpenseRepository + ImportJobRepository,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        name = "expense_import",
        skip(self, request),
        fields(source = request.source.unwrap_or("custom"), dry_run = request.options.dry_run)
    )]
    pub async fn import(
        &self,
        request: ExpenseImportRequest<'_>,
    ) -> Result<ExpenseImportResult, ImportError> {
        let started = Instant::now();
        let options = &request.options;
        options.validate()?;

        let (mapping, source) =
            resolve_mapping(request.content, request.source, request.mapping.clone())?;
        let rows = parse_expenses(request.content, &mapping)?;

        let providers = self.store.find_all_providers().await?;
        let categories = self.store.find_all_categories().await?;

        let job = self
            .store
            .create_job(&NewImportJob {
                kind: ImportKind::Expense,
                source: source.to_string(),
                total_rows: rows.len() as i64,
            })
            .await?;
        info!(job_id = %job.id, rows = rows.len(), "expense import started");

        let matcher = ProviderMatcher::new(options.match_threshold);
        let provider_names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
        let context = RowContext {
            matcher: &matcher,
            provider_names: &provider_names,
            providers: &providers,
            categories: &categories,
            options,
            job_id: job.id,
        };

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.process_row(row, &context).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    self.abort(job.id, rows.len(), &e).await;
                    return Err(e);
                }
            }
        }

        let candidates: Vec<NewExpense> = results.iter().filter_map(|r| r.expense.clone()).collect();
        if !candidates.is_empty() && !options.dry_run {
            if let Err(e) = self.store.insert_expenses(&candidates).await {
                let e = ImportError::from(e);
                self.abort(job.id, rows.len(), &e).await;
                return Err(e);
            }
        }

        let success_count = results.iter().filter(|r| r.success).count();
        let failed_count = results.len() - success_count;
        let duplicate_count = results.iter().filter(|r| r.is_duplicate).count();
        let total_amount_cents = candidates
            .iter()
            .map(|e| e.amount_cents)
            .fold(0, i64::saturating_add);
        let total_gst_cents = candidates
            .iter()
            .map(|e| e.gst_cents)
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
            processing_time_ms,
            "expense import finished"
        );

        Ok(ExpenseImportResult {
            import_job_id: job.id,
            total_rows: rows.len(),
            success_count,
            failed_count,
            duplicate_count,
            total_amount_cents,
            total_gst_cents,
            processing_time_ms,
            rows: results,
        })
    }

    async fn process_row(
        &self,
        row: &ParsedExpenseRow,
        ctx: &RowContext<'_>,
    ) -> Result<ExpenseRowResult, ImportError> {
        let Some(matched) = ctx.matcher.find_best_match(&row.item_name, ctx.provider_names) else {
            warn!(row = row.row_number, item = %row.item_name, "no provider match");
            return Ok(ExpenseRowResult::failed(
                row,
                format!("No matching provider found for \"{}\"", row.item_name),
            ));
        };
        debug!(
            row = row.row_number,
            provider = %matched.provider_name,
            match_type = %matched.match_type,
            score = matched.score,
            "provider matched"
        );

        let Some(provider) = ctx.providers.iter().find(|p| p.name == matched.provider_name) else {
            return Ok(ExpenseRowResult {
                match_info: Some(matched.clone()),
                ..ExpenseRowResult::failed(
                    row,
                    format!("Provider \"{}\" not found", matched.provider_name),
                )
            });
        };

        let Some(category) = resolve_category(
            row.category_name.as_deref(),
            provider,
            &row.item_name,
            ctx.categories,
        ) else {
            warn!(row = row.row_number, "no category available");
            return Ok(ExpenseRowResult {
                match_info: Some(matched),
                ..ExpenseRowResult::failed(row, "No category could be resolved".to_string())
            });
        };

        if ctx.options.skip_duplicates
            && self
                .store
                .expense_exists(row.date, row.total_cents, provider.id)
                .await?
        {
            warn!(row = row.row_number, provider = %provider.name, "duplicate expense");
            return Ok(ExpenseRowResult {
                is_duplicate: true,
                match_info: Some(matched),
                resolved_category: Some(category),
                ..ExpenseRowResult::failed(
                    row,
                    format!(
                        "Duplicate: an expense from {} for {} on {} already exists",
                        provider.name,
                        Money::from_cents(row.total_cents),
                        row.date
                    ),
                )
            });
        }

        let expense = NewExpense {
            provider_id: provider.id,
            category_id: category.id,
            date: row.date,
            amount_cents: row.total_cents,
            gst_cents: resolve_gst(row, provider),
            biz_percent: row.biz_percent,
            description: row.description.clone().or_else(|| Some(row.item_name.clone())),
            import_job_id: Some(ctx.job_id),
        };

        Ok(ExpenseRowResult {
            row_number: row.row_number,
            success: true,
            is_duplicate: false,
            error: None,
            warning: None,
            match_info: Some(matched),
            resolved_category: Some(category),
            expense: Some(expense),
        })
    }

    async fn abort(&self, job_id: ImportJobId, attempted: usize, cause: &ImportError) {
        error!(job_id = %job_id, error = %cause, "expense import aborted");
        let outcome = JobOutcome::aborted(attempted, cause.to_string());
        if let Err(e) = self.store.finalize_job(job_id, &outcome).await {
            warn!(job_id = %job_id, error = %e, "could not mark import job failed");
        }
    }
}

struct RowContext<'a> {
    matcher: &'a ProviderMatcher,
    provider_names: &'a [&'a str],
    providers: &'a [Provider],
    categories: &'a [Category],
    options: &'a ImportOptions,
    job_id: ImportJobId,
}

/// Overseas providers charge no GST. Otherwise a missing GST figure is
/// backed out of the GST-inclusive total; a supplied one is kept as is.
fn resolve_gst(row: &ParsedExpenseRow, provider: &Provider) -> i64 {
    if provider.is_international {
        0
    } else if row.gst_cents == 0 && row.total_cents > 0 {
        Money::from_cents(row.total_cents).gst_component().to_cents()
    } else {
        row.gst_cents
    }
}

/// Picks the column layout and the source name for the ledger. An explicit
/// mapping wins; otherwise the named source's preset, or header detection
/// for banks that have none.
fn resolve_mapping(
    content: &str,
    source: Option<&str>,
    mapping: Option<ExpenseColumnMapping>,
) -> Result<(ExpenseColumnMapping, &'static str), ImportError> {
    let parsed = source
        .map(|s| s.parse::<ImportSource>())
        .transpose();

    if let Some(mapping) = mapping {
        let name = parsed.ok().flatten().map_or(ImportSource::Custom.key(), |s| s.ledger_name());
        return Ok((mapping, name));
    }

    let source = parsed
        .map_err(ImportError::BadRequest)?
        .unwrap_or(ImportSource::Custom);

    if let Some(preset) = source.expense_preset() {
        return Ok((preset, source.ledger_name()));
    }
    let detected = detect_expense_mapping(content)?.ok_or_else(|| {
        ImportError::BadRequest(format!(
            "No column mapping for source '{source}' and the CSV headers could not be recognised"
        ))
    })?;
    Ok((detected, source.ledger_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use gstbook_core::ProviderId;

    fn row(total: i64, gst: i64) -> ParsedExpenseRow {
        ParsedExpenseRow {
            row_number: 1,
            date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            item_name: "iiNet".to_string(),
            total_cents: total,
            gst_cents: gst,
            biz_percent: 100,
            category_name: None,
            description: None,
        }
    }

    fn provider(international: bool) -> Provider {
        Provider {
            id: ProviderId(1),
            name: "iiNet".to_string(),
            is_international: international,
            default_category_id: None,
        }
    }

    #[test]
    fn gst_backed_out_when_missing() {
        assert_eq!(resolve_gst(&row(11_000, 0), &provider(false)), 1_000);
    }

    #[test]
    fn supplied_gst_is_kept() {
        assert_eq!(resolve_gst(&row(11_000, 950), &provider(false)), 950);
    }

    #[test]
    fn international_provider_is_gst_free() {
        assert_eq!(resolve_gst(&row(11_000, 1_000), &provider(true)), 0);
    }

    #[test]
    fn explicit_mapping_beats_source() {
        let custom = ExpenseColumnMapping::manual();
        let (m, name) = resolve_mapping("", Some("amex"), Some(custom.clone())).unwrap();
        assert_eq!(m, custom);
        assert_eq!(name, "amex");
    }

    #[test]
    fn unknown_source_without_mapping_is_bad_request() {
        let err = resolve_mapping("", Some("monzo"), None).unwrap_err();
        assert!(matches!(err, ImportError::BadRequest(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn absent_source_uses_manual_layout() {
        let (m, name) = resolve_mapping("", None, None).unwrap();
        assert_eq!(m, ExpenseColumnMapping::manual());
        assert_eq!(name, "custom");
    }

    #[test]
    fn stub_bank_detects_headers() {
        let (m, name) = resolve_mapping("Date,Payee,Amount\n", Some("westpac"), None).unwrap();
        assert_eq!(m.item, "Payee");
        assert_eq!(name, "other");

        let err = resolve_mapping("Foo,Bar\n", Some("nab"), None).unwrap_err();
        assert!(matches!(err, ImportError::BadRequest(_)));
    }
}
