use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use gstbook_core::{CategoryRepository, ImportJobId, ImportJobRepository};
use gstbook_import::{
    ExpenseColumnMapping, ExpenseImportRequest, ExpenseImporter, ImportOptions,
    IncomeColumnMapping, IncomeImportOptions, IncomeImportRequest, IncomeImporter,
};
use gstbook_storage::{
    create_db, get_category_by_name, insert_client, insert_provider, seed_default_categories,
    SqliteStore,
};
use serde::Serialize;
use tracing::{debug, info};

/// Import flags shared by both record kinds.
#[derive(Debug, Clone)]
pub struct ImportFlags {
    pub file: PathBuf,
    pub source: Option<String>,
    pub mapping: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub allow_duplicates: bool,
    pub dry_run: bool,
}

impl ImportFlags {
    fn options(&self, defaults: &ImportOptions) -> ImportOptions {
        ImportOptions {
            match_threshold: self.threshold.unwrap_or(defaults.match_threshold),
            skip_duplicates: defaults.skip_duplicates && !self.allow_duplicates,
            dry_run: self.dry_run || defaults.dry_run,
        }
    }

    fn read_content(&self) -> anyhow::Result<String> {
        std::fs::read_to_string(&self.file)
            .with_context(|| format!("reading {}", self.file.display()))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_mapping<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    debug!(path = %path.display(), "loading column mapping");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading column mapping {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing column mapping {}", path.display()))
}

pub async fn init(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let pool = create_db(db_path).await?;
    seed_default_categories(&pool).await?;
    info!(path = %db_path.display(), "database initialized");
    println!("Initialized {}", db_path.display());
    Ok(())
}

pub async fn add_provider(
    store: &SqliteStore,
    name: &str,
    international: bool,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let default_category_id = match category {
        Some(name) => match get_category_by_name(store.pool(), name).await? {
            Some(id) => Some(id),
            None => bail!("Unknown category: '{name}'"),
        },
        None => None,
    };
    let id = insert_provider(store.pool(), name, international, default_category_id).await?;
    println!("Added provider {id}: {name}");
    Ok(())
}

pub async fn add_client(store: &SqliteStore, name: &str) -> anyhow::Result<()> {
    let id = insert_client(store.pool(), name).await?;
    println!("Added client {id}: {name}");
    Ok(())
}

pub async fn list_categories(store: &SqliteStore) -> anyhow::Result<()> {
    for category in store.find_all_categories().await? {
        let label = category.tax_label.as_deref().unwrap_or("-");
        let deductible = if category.is_deductible { "" } else { "  (not deductible)" };
        println!("{:>3}  {:<28} {label}{deductible}", category.id, category.name);
    }
    Ok(())
}

pub async fn import_expenses(
    store: &SqliteStore,
    flags: &ImportFlags,
    defaults: &ImportOptions,
) -> anyhow::Result<()> {
    let content = flags.read_content()?;
    let mapping = flags
        .mapping
        .as_deref()
        .map(read_mapping::<ExpenseColumnMapping>)
        .transpose()?;

    let importer = ExpenseImporter::new(store.clone());
    let result = importer
        .import(ExpenseImportRequest {
            content: &content,
            source: flags.source.as_deref(),
            mapping,
            options: flags.options(defaults),
        })
        .await?;
    info!(
        file = %flags.file.display(),
        job_id = %result.import_job_id,
        imported = result.success_count,
        failed = result.failed_count,
        "expenses imported"
    );
    print_json(&result)
}

pub async fn import_incomes(
    store: &SqliteStore,
    flags: &ImportFlags,
    defaults: &ImportOptions,
    default_date: Option<NaiveDate>,
    mark_as_paid: bool,
) -> anyhow::Result<()> {
    let content = flags.read_content()?;
    let mapping = flags
        .mapping
        .as_deref()
        .map(read_mapping::<IncomeColumnMapping>)
        .transpose()?;

    let importer = IncomeImporter::new(store.clone());
    let result = importer
        .import(IncomeImportRequest {
            content: &content,
            source: flags.source.as_deref(),
            mapping,
            options: IncomeImportOptions {
                common: flags.options(defaults),
                default_date,
                mark_as_paid,
            },
        })
        .await?;
    info!(
        file = %flags.file.display(),
        job_id = %result.import_job_id,
        imported = result.success_count,
        failed = result.failed_count,
        "incomes imported"
    );
    print_json(&result)
}

pub async fn list_jobs(store: &SqliteStore) -> anyhow::Result<()> {
    print_json(&store.list_jobs().await?)
}

pub async fn rollback(store: &SqliteStore, job_id: i64) -> anyhow::Result<()> {
    let id = ImportJobId(job_id);
    let deleted = store.rollback_job(id).await?;
    info!(job_id = %id, deleted, "import job rolled back");
    println!("Rolled back import job {id}: {deleted} records deleted");
    Ok(())
}
