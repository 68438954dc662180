use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use gstbook_storage::SqliteStore;
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

use commands::ImportFlags;
use settings::Settings;

#[derive(Parser)]
#[command(name = "gstbook", about = "GST bookkeeping for Australian freelancers.")]
struct Cli {
    /// Settings file (default: gstbook.toml in the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database, overriding the settings file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed the default categories.
    Init,
    /// Manage providers.
    Provider {
        #[command(subcommand)]
        command: ProviderCommands,
    },
    /// Manage clients.
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },
    /// Inspect categories.
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Import a CSV file of expenses or incomes.
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// List import jobs, newest first.
    Jobs,
    /// Delete every record created by a completed import job.
    Rollback {
        /// Import job id
        job_id: i64,
    },
}

#[derive(Subcommand)]
enum ProviderCommands {
    /// Add a provider.
    Add {
        name: String,
        /// Overseas supplier that charges no GST
        #[arg(long)]
        international: bool,
        /// Default category name
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Add a client.
    Add { name: String },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// List all categories.
    List,
}

#[derive(clap::Args)]
struct CommonImportArgs {
    /// CSV file to import
    file: PathBuf,
    /// Source format: custom, manual, commbank, amex, nab, westpac, anz, other
    #[arg(long)]
    source: Option<String>,
    /// TOML file with an explicit column mapping
    #[arg(long)]
    mapping: Option<PathBuf>,
    /// Minimum fuzzy match score between 0 and 1
    #[arg(long)]
    threshold: Option<f64>,
    /// Import rows even if a matching record already exists
    #[arg(long = "allow-duplicates")]
    allow_duplicates: bool,
    /// Check every row without writing any records
    #[arg(long = "dry-run")]
    dry_run: bool,
}

impl From<CommonImportArgs> for ImportFlags {
    fn from(args: CommonImportArgs) -> Self {
        Self {
            file: args.file,
            source: args.source,
            mapping: args.mapping,
            threshold: args.threshold,
            allow_duplicates: args.allow_duplicates,
            dry_run: args.dry_run,
        }
    }
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import expenses.
    Expenses {
        #[command(flatten)]
        args: CommonImportArgs,
    },
    /// Import incomes.
    Incomes {
        #[command(flatten)]
        args: CommonImportArgs,
        /// Date for rows without one (default: today)
        #[arg(long = "default-date", value_parser = parse_date_arg)]
        default_date: Option<NaiveDate>,
        /// Record the incomes as paid on their invoice date
        #[arg(long = "mark-paid")]
        mark_paid: bool,
    },
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    gstbook_core::parse_date(s).ok_or_else(|| format!("unrecognised date: '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = match cli.db {
        Some(path) => path,
        None => settings.database_path()?,
    };

    if let Commands::Init = cli.command {
        return commands::init(&db_path).await;
    }

    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;

    match cli.command {
        Commands::Init => Ok(()),
        Commands::Provider { command } => match command {
            ProviderCommands::Add {
                name,
                international,
                category,
            } => commands::add_provider(&store, &name, international, category.as_deref()).await,
        },
        Commands::Client { command } => match command {
            ClientCommands::Add { name } => commands::add_client(&store, &name).await,
        },
        Commands::Category { command } => match command {
            CategoryCommands::List => commands::list_categories(&store).await,
        },
        Commands::Import { command } => match command {
            ImportCommands::Expenses { args } => {
                commands::import_expenses(&store, &args.into(), &settings.import).await
            }
            ImportCommands::Incomes {
                args,
                default_date,
                mark_paid,
            } => {
                commands::import_incomes(
                    &store,
                    &args.into(),
                    &settings.import,
                    default_date,
                    mark_paid,
                )
                .await
            }
        },
        Commands::Jobs => commands::list_jobs(&store).await,
        Commands::Rollback { job_id } => commands::rollback(&store, job_id).await,
    }
}
