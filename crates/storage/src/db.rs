use gstbook_core::{CategoryId, ClientId, ProviderId, DEFAULT_CATEGORIES};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&format!("sqlite:{}?mode=rwc", path.display()))
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA cache_size = -32000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            tax_label TEXT,
            is_deductible INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS providers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            is_international INTEGER NOT NULL DEFAULT 0,
            default_category_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (default_category_id) REFERENCES categories(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            source TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            total_rows INTEGER NOT NULL DEFAULT 0,
            imported_count INTEGER NOT NULL DEFAULT 0,
            failed_count INTEGER NOT NULL DEFAULT 0,
            skipped_count INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            created_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            date TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            gst_cents INTEGER NOT NULL DEFAULT 0,
            biz_percent INTEGER NOT NULL DEFAULT 100,
            description TEXT,
            import_job_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (provider_id) REFERENCES providers(id),
            FOREIGN KEY (category_id) REFERENCES categories(id),
            FOREIGN KEY (import_job_id) REFERENCES import_jobs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS incomes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id INTEGER NOT NULL,
            invoice_num TEXT,
            date TEXT NOT NULL,
            subtotal_cents INTEGER NOT NULL,
            gst_cents INTEGER NOT NULL DEFAULT 0,
            total_cents INTEGER NOT NULL,
            description TEXT,
            is_paid INTEGER NOT NULL DEFAULT 0,
            paid_date TEXT,
            import_job_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (client_id) REFERENCES clients(id),
            FOREIGN KEY (import_job_id) REFERENCES import_jobs(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_expenses_duplicate ON expenses (date, amount_cents, provider_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_expenses_job ON expenses (import_job_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_incomes_invoice ON incomes (client_id, invoice_num)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_incomes_job ON incomes (import_job_id)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn seed_default_categories(pool: &DbPool) -> Result<(), sqlx::Error> {
    for (name, tax_label, is_deductible) in DEFAULT_CATEGORIES {
        sqlx::query(
            "INSERT OR IGNORE INTO categories (name, tax_label, is_deductible) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(if tax_label.is_empty() { None } else { Some(*tax_label) })
        .bind(*is_deductible as i64)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn get_category_by_name(
    pool: &DbPool,
    name: &str,
) -> Result<Option<CategoryId>, sqlx::Error> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM categories WHERE name = ? COLLATE NOCASE",
    )
    .bind(name.trim())
    .fetch_optional(pool)
    .await?;

    Ok(id.map(CategoryId))
}

pub async fn insert_provider(
    pool: &DbPool,
    name: &str,
    is_international: bool,
    default_category_id: Option<CategoryId>,
) -> Result<ProviderId, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO providers (name, is_international, default_category_id) VALUES (?, ?, ?)",
    )
    .bind(name.trim())
    .bind(is_international as i64)
    .bind(default_category_id.map(|c| c.0))
    .execute(pool)
    .await?;

    Ok(ProviderId(result.last_insert_rowid()))
}

pub async fn insert_client(pool: &DbPool, name: &str) -> Result<ClientId, sqlx::Error> {
    let result = sqlx::query("INSERT INTO clients (name) VALUES (?)")
        .bind(name.trim())
        .execute(pool)
        .await?;

    Ok(ClientId(result.last_insert_rowid()))
}
