use gstbook_core::StoreError;
use thiserror::Error;

use crate::csv::CsvError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("No valid rows found in CSV")]
    NoValidRows,
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Whether the caller sent something unusable, as opposed to the import
    /// failing on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::NoValidRows | Self::Csv(_))
    }
}
