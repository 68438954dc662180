//! A batch insert that fails after rows were processed must fail the job,
//! keep the store error, and write no records.

mod common;

use async_trait::async_trait;
use chrono::NaiveDate;
use gstbook_core::{
    Category, CategoryRepository, Client, ClientId, ClientRepository, ExpenseId,
    ExpenseRepository, ImportJob, ImportJobId, ImportJobRepository, ImportJobStatus, IncomeId,
    IncomeRepository, JobOutcome, NewExpense, NewImportJob, NewIncome, Provider, ProviderId,
    ProviderRepository, StoreError,
};
use gstbook_import::{
    ExpenseImportRequest, ExpenseImporter, ImportError, ImportOptions, IncomeImportOptions,
    IncomeImportRequest, IncomeImporter,
};
use gstbook_storage::SqliteStore;

/// Delegates to SQLite but refuses every batch insert.
struct DiskFull(SqliteStore);

fn disk_full() -> StoreError {
    StoreError::Database("disk full".into())
}

#[async_trait]
impl ProviderRepository for DiskFull {
    async fn find_all_providers(&self) -> Result<Vec<Provider>, StoreError> {
        self.0.find_all_providers().await
    }
}

#[async_trait]
impl CategoryRepository for DiskFull {
    async fn find_all_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.0.find_all_categories().await
    }
}

#[async_trait]
impl ClientRepository for DiskFull {
    async fn find_all_clients(&self) -> Result<Vec<Client>, StoreError> {
        self.0.find_all_clients().await
    }
}

#[async_trait]
impl ExpenseRepository for DiskFull {
    async fn expense_exists(
        &self,
        date: NaiveDate,
        amount_cents: i64,
        provider_id: ProviderId,
    ) -> Result<bool, StoreError> {
        self.0.expense_exists(date, amount_cents, provider_id).await
    }

    async fn insert_expenses(&self, _: &[NewExpense]) -> Result<Vec<ExpenseId>, StoreError> {
        Err(disk_full())
    }

    async fn count_expenses(&self) -> Result<i64, StoreError> {
        self.0.count_expenses().await
    }
}

#[async_trait]
impl IncomeRepository for DiskFull {
    async fn income_exists_by_invoice(
        &self,
        client_id: ClientId,
        invoice_num: &str,
    ) -> Result<bool, StoreError> {
        self.0.income_exists_by_invoice(client_id, invoice_num).await
    }

    async fn income_exists(
        &self,
        date: NaiveDate,
        total_cents: i64,
        client_id: ClientId,
    ) -> Result<bool, StoreError> {
        self.0.income_exists(date, total_cents, client_id).await
    }

    async fn insert_incomes(&self, _: &[NewIncome]) -> Result<Vec<IncomeId>, StoreError> {
        Err(disk_full())
    }

    async fn count_incomes(&self) -> Result<i64, StoreError> {
        self.0.count_incomes().await
    }
}

#[async_trait]
impl ImportJobRepository for DiskFull {
    async fn create_job(&self, job: &NewImportJob) -> Result<ImportJob, StoreError> {
        self.0.create_job(job).await
    }

    async fn finalize_job(&self, id: ImportJobId, outcome: &JobOutcome) -> Result<(), StoreError> {
        self.0.finalize_job(id, outcome).await
    }

    async fn find_job(&self, id: ImportJobId) -> Result<Option<ImportJob>, StoreError> {
        self.0.find_job(id).await
    }

    async fn list_jobs(&self) -> Result<Vec<ImportJob>, StoreError> {
        self.0.list_jobs().await
    }

    async fn rollback_job(&self, id: ImportJobId) -> Result<u64, StoreError> {
        self.0.rollback_job(id).await
    }
}

async fn only_job(store: &SqliteStore) -> ImportJob {
    let mut jobs = store.list_jobs().await.unwrap();
    assert_eq!(jobs.len(), 1);
    jobs.remove(0)
}

#[tokio::test]
async fn failed_expense_batch_fails_the_job() {
    let (_dir, store) = common::store().await;
    common::provider(&store, "iiNet", false).await;
    common::provider(&store, "Officeworks", false).await;

    let csv = "Date,Item,Total,GST,Biz%,Category\n\
               2025-07-15,iiNet,$110.00,,100,Internet\n\
               2025-07-16,Officeworks,$55.00,$5.00,100,\n";
    let result = ExpenseImporter::new(DiskFull(store.clone()))
        .import(ExpenseImportRequest {
            content: csv,
            source: Some("manual"),
            mapping: None,
            options: ImportOptions::default(),
        })
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ImportError::Store(StoreError::Database(_))));
    assert!(!err.is_client_error());

    let job = only_job(&store).await;
    assert_eq!(job.status, ImportJobStatus::Failed);
    assert_eq!(job.total_rows, 2);
    assert_eq!(job.imported_count, 0);
    assert_eq!(job.failed_count, 2);
    assert!(job.error_message.as_deref().unwrap().contains("disk full"));
    assert!(job.completed_at.is_some());
    assert_eq!(store.count_expenses().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_income_batch_fails_the_job() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Aida Tomescu").await;

    let csv = "Client,Invoice #,Subtotal,GST,Total,Date\n\
               Aida Tomescu,1,$560,$56,$616,30/09/2025\n";
    let result = IncomeImporter::new(DiskFull(store.clone()))
        .import(IncomeImportRequest {
            content: csv,
            source: None,
            mapping: None,
            options: IncomeImportOptions::default(),
        })
        .await;

    assert!(matches!(result, Err(ImportError::Store(StoreError::Database(_)))));

    let job = only_job(&store).await;
    assert_eq!(job.status, ImportJobStatus::Failed);
    assert_eq!(job.failed_count, 1);
    assert_eq!(job.error_message.as_deref(), Some("Database error: disk full"));
    assert_eq!(store.count_incomes().await.unwrap(), 0);
}

#[tokio::test]
async fn dry_run_never_reaches_the_batch_insert() {
    let (_dir, store) = common::store().await;
    common::client(&store, "Acme").await;

    let csv = "Client,Subtotal,GST,Total\nAcme,$100,$10,$110\n";
    let mut options = IncomeImportOptions::default();
    options.common.dry_run = true;
    let result = IncomeImporter::new(DiskFull(store.clone()))
        .import(IncomeImportRequest {
            content: csv,
            source: None,
            mapping: None,
            options,
        })
        .await
        .unwrap();

    assert_eq!(result.success_count, 1);
    assert_eq!(only_job(&store).await.status, ImportJobStatus::Completed);
}
