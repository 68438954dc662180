pub mod date;
pub mod ids;
pub mod import_job;
pub mod money;
pub mod record;
pub mod reference;
pub mod store;

pub use date::parse_date;
pub use ids::{CategoryId, ClientId, ExpenseId, ImportJobId, IncomeId, ProviderId};
pub use import_job::{ImportJob, ImportJobStatus, ImportKind, JobOutcome, NewImportJob};
pub use money::{parse_currency, parse_percentage, Money, GST_INCLUSIVE_DIVISOR};
pub use record::{NewExpense, NewIncome};
pub use reference::{Category, Client, Provider, DEFAULT_CATEGORIES, FALLBACK_CATEGORY};
pub use store::{
    CategoryRepository, ClientRepository, ExpenseRepository, ImportJobRepository,
    IncomeRepository, ProviderRepository, StoreError,
};
