mod common;

use chrono::NaiveDate;
use gstbook_core::{ImportJobRepository, ImportJobStatus, ImportKind, IncomeRepository};
use gstbook_import::{
    ImportError, IncomeImportOptions, IncomeImportRequest, IncomeImportResult, IncomeImporter,
    MatchType,
};
use gstbook_storage::SqliteStore;

const HEADER: &str = "Client,Invoice #,Subtotal,GST,Total,Date\n";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(content: &str) -> IncomeImportRequest<'_> {
    IncomeImportRequest {
        content,
        source: None,
        mapping: None,
        options: IncomeImportOptions::default(),
    }
}

async fn run(
    store: &SqliteStore,
    request: IncomeImportRequest<'_>,
) -> Result<IncomeImportResult, ImportError> {
    IncomeImporter::new(store.clone()).import(request).await
}

#[tokio::test]
async fn invoice_row_becomes_an_income() {
    let (_dir, store) = common::store().await;
    let aida = common::client(&store, "Aida Tomescu").await;

    let csv = format!("{HEADER}Aida Tomescu,1,$560,$56,$616.00,30/09/2025\n");
    let result = run(&store, request(&csv)).await.unwrap();

    assert_eq!(result.total_rows, 1);
    assert_eq!(result.success_count, 1);
    assert_eq!(result.warning_count, 0);
    assert_eq!(result.total_subtotal_cents, 56_000);
    assert_eq!(result.total_gst_cents, 5_600);
    assert_eq!(result.total_amount_cents, 61_600);

    let row = &result.rows[0];
    assert!(row.warning.is_none());
    let matched = row.match_info.as_ref().unwrap();
    assert_eq!(matched.match_type, MatchType::Exact);
    assert_eq!(matched.client_id, aida);

    let income = row.income.as_ref().unwrap();
    assert_eq!(income.invoice_num.as_deref(), Some("1"));
    assert_eq!(income.subtotal_cents, 56_000);
    assert_eq!(income.gst_cents, 5_600);
    assert_eq!(income.total_cents, 61_600);
    assert_eq!(income.date, date(2025, 9, 30));
    assert!(!income.is_paid);
    assert!(income.paid_date.is_none());

    assert_eq!(store.count_incomes().await.unwrap(), 1);
    let job = store.find_job(result.import_job_id).await.unwrap().unwrap();
    assert_eq!(job.kind, ImportKind::Income);
    assert_eq!(job.source, "custom");
    assert_eq!(job.status, ImportJobStatus::Completed);
}

#[tokio::test]
async fn mismatched_total_is_a_warning_and_the_sum_is_stored() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme Pty Ltd").await;

    let csv = format!("{HEADER}Acme,,$100,$10,$120,2025-09-01\n");
    let result = run(&store, request(&csv)).await.unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.warning_count, 1);
    let row = &result.rows[0];
    assert!(row.success);
    assert!(row.warning.is_some());
    let income = row.income.as_ref().unwrap();
    assert_eq!(income.total_cents, 11_000);
    assert!(income.invoice_num.is_none());
}

#[tokio::test]
async fn no_rows_is_rejected_before_a_job_exists() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme").await;

    let err = run(&store, request(HEADER)).await.unwrap_err();
    assert!(matches!(err, ImportError::NoValidRows));
    assert!(err.is_client_error());
    assert!(store.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn only_manual_sources_carry_invoices() {
    let (_dir, store) = common::store().await;
    let csv = format!("{HEADER}Acme,1,100,10,110,2025-09-01\n");

    let mut req = request(&csv);
    req.source = Some("commbank");
    assert!(matches!(run(&store, req).await, Err(ImportError::BadRequest(_))));
    assert!(store.list_jobs().await.unwrap().is_empty());
}

#[tokio::test]
async fn partial_name_matches_a_client() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Globex").await;
    let acme = common::client(&store, "Acme Corporation Pty Ltd").await;

    let csv = format!("{HEADER}Acme Holdings,7,$200,$20,$220,2025-09-02\n");
    let result = run(&store, request(&csv)).await.unwrap();

    let matched = result.rows[0].match_info.as_ref().unwrap();
    assert_eq!(matched.match_type, MatchType::Partial);
    assert_eq!(matched.client_id, acme);
    assert!(matched.score > 0.8 && matched.score < 0.95);
}

#[tokio::test]
async fn unknown_client_fails_the_row() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Aida Tomescu").await;

    let csv = format!("{HEADER}Initech,2,$100,$10,$110,2025-09-03\n");
    let result = run(&store, request(&csv)).await.unwrap();

    assert_eq!(result.success_count, 0);
    assert_eq!(
        result.rows[0].error.as_deref(),
        Some("No matching client found for \"Initech\"")
    );
    let job = store.find_job(result.import_job_id).await.unwrap().unwrap();
    assert_eq!(job.status, ImportJobStatus::Failed);
    assert_eq!(store.count_incomes().await.unwrap(), 0);
}

#[tokio::test]
async fn duplicates_by_invoice_then_by_amount() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme").await;

    let first = format!("{HEADER}Acme,INV-1,$100,$10,$110,2025-09-01\n");
    run(&store, request(&first)).await.unwrap();

    let again = format!(
        "{HEADER}Acme,INV-1,$500,$50,$550,2025-10-01\n\
         Acme,,$100,$10,$110,2025-09-01\n\
         Acme,INV-2,$300,$30,$330,2025-10-02\n"
    );
    let result = run(&store, request(&again)).await.unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(result.duplicate_count, 2);
    assert!(result.rows[0].is_duplicate);
    assert!(result.rows[0].error.as_deref().unwrap().contains("INV-1"));
    assert!(result.rows[1].is_duplicate);
    assert!(result.rows[2].success);
    assert_eq!(store.count_incomes().await.unwrap(), 2);

    let job = store.find_job(result.import_job_id).await.unwrap().unwrap();
    assert_eq!(job.status, ImportJobStatus::Completed);
    assert_eq!(job.skipped_count, 2);
}

#[tokio::test]
async fn default_date_and_mark_as_paid() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme").await;

    let csv = "Client,Subtotal,GST,Total\nAcme,$100,$10,$110\n";
    let mut req = request(csv);
    req.options.default_date = Some(date(2025, 6, 30));
    req.options.mark_as_paid = true;
    let result = run(&store, req).await.unwrap();

    let income = result.rows[0].income.as_ref().unwrap();
    assert_eq!(income.date, date(2025, 6, 30));
    assert!(income.is_paid);
    assert_eq!(income.paid_date, Some(date(2025, 6, 30)));
}

#[tokio::test]
async fn dry_run_then_rollback() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme").await;
    let csv = format!("{HEADER}Acme,1,$100,$10,$110,2025-09-01\nAcme,2,$200,$20,$220,2025-09-02\n");

    let mut dry = request(&csv);
    dry.options.common.dry_run = true;
    let preview = run(&store, dry).await.unwrap();
    assert_eq!(preview.success_count, 2);
    assert_eq!(store.count_incomes().await.unwrap(), 0);

    let result = run(&store, request(&csv)).await.unwrap();
    assert_eq!(store.count_incomes().await.unwrap(), 2);
    assert_eq!(store.rollback_job(result.import_job_id).await.unwrap(), 2);
    assert_eq!(store.count_incomes().await.unwrap(), 0);

    let jobs = store.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, result.import_job_id);
    assert_eq!(jobs[0].status, ImportJobStatus::RolledBack);
    assert!(store.rollback_job(preview.import_job_id).await.is_ok());
}
