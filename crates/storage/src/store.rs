use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use gstbook_core::{
    Category, CategoryId, CategoryRepository, Client, ClientId, ClientRepository, ExpenseId,
    ExpenseRepository, ImportJob, ImportJobId, ImportJobRepository, ImportJobStatus, IncomeId,
    IncomeRepository, JobOutcome, NewExpense, NewImportJob, NewIncome, Provider, ProviderId,
    ProviderRepository, StoreError,
};
use std::path::Path;
use tracing::{debug, info};

use crate::db::{create_db, DbPool};

type JobRow = (
    i64,
    String,
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
);

const JOB_COLUMNS: &str = "id, kind, source, status, total_rows, imported_count, failed_count, \
                           skipped_count, error_message, created_at, completed_at";

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn row_to_job(r: JobRow) -> Result<ImportJob, StoreError> {
    Ok(ImportJob {
        id: ImportJobId(r.0),
        kind: r.1.parse().map_err(StoreError::Corrupt)?,
        source: r.2,
        status: r.3.parse().map_err(StoreError::Corrupt)?,
        total_rows: r.4,
        imported_count: r.5,
        failed_count: r.6,
        skipped_count: r.7,
        error_message: r.8,
        created_at: r.9,
        completed_at: r.10,
    })
}

/// Every repository the import pipeline needs, backed by one SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(create_db(path).await.map_err(db_err)?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl ProviderRepository for SqliteStore {
    async fn find_all_providers(&self) -> Result<Vec<Provider>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, i64, Option<i64>)>(
            "SELECT id, name, is_international, default_category_id FROM providers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Provider {
                id: ProviderId(r.0),
                name: r.1,
                is_international: r.2 != 0,
                default_category_id: r.3.map(CategoryId),
            })
            .collect())
    }
}

#[async_trait]
impl CategoryRepository for SqliteStore {
    async fn find_all_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String, Option<String>, i64)>(
            "SELECT id, name, tax_label, is_deductible FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: CategoryId(r.0),
                name: r.1,
                tax_label: r.2,
                is_deductible: r.3 != 0,
            })
            .collect())
    }
}

#[async_trait]
impl ClientRepository for SqliteStore {
    async fn find_all_clients(&self) -> Result<Vec<Client>, StoreError> {
        let rows = sqlx::query_as::<_, (i64, String)>("SELECT id, name FROM clients ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|r| Client {
                id: ClientId(r.0),
                name: r.1,
            })
            .collect())
    }
}

#[async_trait]
impl ExpenseRepository for SqliteStore {
    async fn expense_exists(
        &self,
        date: NaiveDate,
        amount_cents: i64,
        provider_id: ProviderId,
    ) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM expenses WHERE date = ? AND amount_cents = ? AND provider_id = ?)",
        )
        .bind(date)
        .bind(amount_cents)
        .bind(provider_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(found != 0)
    }

    async fn insert_expenses(&self, expenses: &[NewExpense]) -> Result<Vec<ExpenseId>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut ids = Vec::with_capacity(expenses.len());

        for e in expenses {
            let result = sqlx::query(
                r#"
                INSERT INTO expenses (provider_id, category_id, date, amount_cents, gst_cents, biz_percent, description, import_job_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(e.provider_id.0)
            .bind(e.category_id.0)
            .bind(e.date)
            .bind(e.amount_cents)
            .bind(e.gst_cents)
            .bind(e.biz_percent as i64)
            .bind(&e.description)
            .bind(e.import_job_id.map(|j| j.0))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            ids.push(ExpenseId(result.last_insert_rowid()));
        }

        tx.commit().await.map_err(db_err)?;
        debug!(count = ids.len(), "expenses inserted");
        Ok(ids)
    }

    async fn count_expenses(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM expenses")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl IncomeRepository for SqliteStore {
    async fn income_exists_by_invoice(
        &self,
        client_id: ClientId,
        invoice_num: &str,
    ) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM incomes WHERE client_id = ? AND invoice_num = ?)",
        )
        .bind(client_id.0)
        .bind(invoice_num)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(found != 0)
    }

    async fn income_exists(
        &self,
        date: NaiveDate,
        total_cents: i64,
        client_id: ClientId,
    ) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM incomes WHERE date = ? AND total_cents = ? AND client_id = ?)",
        )
        .bind(date)
        .bind(total_cents)
        .bind(client_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(found != 0)
    }

    async fn insert_incomes(&self, incomes: &[NewIncome]) -> Result<Vec<IncomeId>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut ids = Vec::with_capacity(incomes.len());

        for i in incomes {
            let result = sqlx::query(
                r#"
                INSERT INTO incomes (client_id, invoice_num, date, subtotal_cents, gst_cents, total_cents, description, is_paid, paid_date, import_job_id)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(i.client_id.0)
            .bind(&i.invoice_num)
            .bind(i.date)
            .bind(i.subtotal_cents)
            .bind(i.gst_cents)
            .bind(i.total_cents)
            .bind(&i.description)
            .bind(i.is_paid as i64)
            .bind(i.paid_date)
            .bind(i.import_job_id.map(|j| j.0))
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            ids.push(IncomeId(result.last_insert_rowid()));
        }

        tx.commit().await.map_err(db_err)?;
        debug!(count = ids.len(), "incomes inserted");
        Ok(ids)
    }

    async fn count_incomes(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM incomes")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ImportJobRepository for SqliteStore {
    async fn create_job(&self, job: &NewImportJob) -> Result<ImportJob, StoreError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO import_jobs (kind, source, status, total_rows, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(job.kind.to_string())
        .bind(&job.source)
        .bind(ImportJobStatus::Pending.to_string())
        .bind(job.total_rows)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = ImportJobId(result.last_insert_rowid());
        debug!(job_id = %id, kind = %job.kind, source = %job.source, "import job created");

        Ok(ImportJob {
            id,
            kind: job.kind,
            source: job.source.clone(),
            status: ImportJobStatus::Pending,
            total_rows: job.total_rows,
            imported_count: 0,
            failed_count: 0,
            skipped_count: 0,
            error_message: None,
            created_at,
            completed_at: None,
        })
    }

    async fn finalize_job(&self, id: ImportJobId, outcome: &JobOutcome) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE import_jobs
            SET status = ?, imported_count = ?, failed_count = ?, skipped_count = ?,
                error_message = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(outcome.status.to_string())
        .bind(outcome.imported_count)
        .bind(outcome.failed_count)
        .bind(outcome.skipped_count)
        .bind(&outcome.error_message)
        .bind(Utc::now())
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::JobNotFound(id));
        }
        Ok(())
    }

    async fn find_job(&self, id: ImportJobId) -> Result<Option<ImportJob>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM import_jobs WHERE id = ?"
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(row_to_job).transpose()
    }

    async fn list_jobs(&self) -> Result<Vec<ImportJob>, StoreError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM import_jobs ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(row_to_job).collect()
    }

    async fn rollback_job(&self, id: ImportJobId) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let status = sqlx::query_scalar::<_, String>("SELECT status FROM import_jobs WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(StoreError::JobNotFound(id))?;
        let status: ImportJobStatus = status.parse().map_err(StoreError::Corrupt)?;
        if status != ImportJobStatus::Completed {
            return Err(StoreError::InvalidJobState(id, status));
        }

        let expenses = sqlx::query("DELETE FROM expenses WHERE import_job_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();
        let incomes = sqlx::query("DELETE FROM incomes WHERE import_job_id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        sqlx::query("UPDATE import_jobs SET status = ? WHERE id = ?")
            .bind(ImportJobStatus::RolledBack.to_string())
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        info!(job_id = %id, expenses, incomes, "import job rolled back");
        Ok(expenses + incomes)
    }
}
