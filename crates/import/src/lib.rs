pub mod category;
pub mod client_match;
pub mod csv;
pub mod error;
pub mod expense_import;
pub mod fuzzy;
pub mod income_csv;
pub mod income_import;
pub mod mapping;
pub mod options;
pub mod provider_match;

pub use category::{resolve_category, CategorySource, ResolvedCategory};
pub use client_match::{prepare_clients_for_matching, CachedClient, ClientMatch, ClientMatcher};
pub use csv::{detect_expense_mapping, parse_expenses, CsvError, ParsedExpenseRow};
pub use error::ImportError;
pub use expense_import::{ExpenseImportRequest, ExpenseImportResult, ExpenseImporter, ExpenseRowResult};
pub use fuzzy::{levenshtein_distance, normalize, similarity, MatchType, NameProfile, DEFAULT_MATCH_THRESHOLD};
pub use income_csv::{parse_incomes, ParsedIncomeRow};
pub use income_import::{IncomeImportRequest, IncomeImportResult, IncomeImporter, IncomeRowResult};
pub use mapping::{detect_mapping, ExpenseColumnMapping, ImportSource, IncomeColumnMapping};
pub use options::{ImportOptions, IncomeImportOptions};
pub use provider_match::{extract_keywords, ProviderMatch, ProviderMatcher};

