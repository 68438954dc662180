use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::fuzzy::DEFAULT_MATCH_THRESHOLD;

/// Knobs shared by expense and income imports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Minimum fuzzy similarity, `0.0..=1.0`.
    pub match_threshold: f64,
    pub skip_duplicates: bool,
    /// Run every check and open the job, but write no records.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            skip_duplicates: true,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    pub fn from_toml(toml_content: &str) -> Result<Self, ImportError> {
        let options: Self = toml::from_str(toml_content)
            .map_err(|e| ImportError::BadRequest(format!("Invalid import options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ImportError> {
        if !self.match_threshold.is_finite() || !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ImportError::BadRequest(format!(
                "matchThreshold must be between 0 and 1, got {}",
                self.match_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeImportOptions {
    #[serde(flatten)]
    pub common: ImportOptions,
    /// Used for rows without a readable date; today when unset.
    pub default_date: Option<NaiveDate>,
    pub mark_as_paid: bool,
}
