use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::ids::{ClientId, ExpenseId, ImportJobId, IncomeId, ProviderId};
use crate::import_job::{ImportJob, ImportJobStatus, JobOutcome, NewImportJob};
use crate::record::{NewExpense, NewIncome};
use crate::reference::{Category, Client, Provider};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Import job not found: {0}")]
    JobNotFound(ImportJobId),
    #[error("Import job {0} is {1} and cannot be rolled back")]
    InvalidJobState(ImportJobId, ImportJobStatus),
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

// Reference tables are small and loaded whole, once per import.

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_all_providers(&self) -> Result<Vec<Provider>, StoreError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_all_categories(&self) -> Result<Vec<Category>, StoreError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Every client with its name already decrypted.
    async fn find_all_clients(&self) -> Result<Vec<Client>, StoreError>;
}

#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn expense_exists(
        &self,
        date: NaiveDate,
        amount_cents: i64,
        provider_id: ProviderId,
    ) -> Result<bool, StoreError>;

    /// Writes the whole batch in one transaction; nothing is kept on failure.
    async fn insert_expenses(&self, expenses: &[NewExpense]) -> Result<Vec<ExpenseId>, StoreError>;

    async fn count_expenses(&self) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait IncomeRepository: Send + Sync {
    async fn income_exists_by_invoice(
        &self,
        client_id: ClientId,
        invoice_num: &str,
    ) -> Result<bool, StoreError>;

    async fn income_exists(
        &self,
        date: NaiveDate,
        total_cents: i64,
        client_id: ClientId,
    ) -> Result<bool, StoreError>;

    /// Writes the whole batch in one transaction; nothing is kept on failure.
    async fn insert_incomes(&self, incomes: &[NewIncome]) -> Result<Vec<IncomeId>, StoreError>;

    async fn count_incomes(&self) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait ImportJobRepository: Send + Sync {
    async fn create_job(&self, job: &NewImportJob) -> Result<ImportJob, StoreError>;

    async fn finalize_job(&self, id: ImportJobId, outcome: &JobOutcome) -> Result<(), StoreError>;

    async fn find_job(&self, id: ImportJobId) -> Result<Option<ImportJob>, StoreError>;

    async fn list_jobs(&self) -> Result<Vec<ImportJob>, StoreError>;

    /// Deletes every record created by a completed job and marks it rolled
    /// back. Returns the number of records removed. Rolling back a job that
    /// is not `completed` (including one already rolled back) is an error.
    async fn rollback_job(&self, id: ImportJobId) -> Result<u64, StoreError>;
}
