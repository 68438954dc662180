use std::path::{Path, PathBuf};

use anyhow::Context;
use gstbook_import::ImportOptions;
use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "gstbook.toml";
const DATABASE_FILE: &str = "gstbook.db";

/// Contents of `gstbook.toml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file; defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Defaults for every import; command-line flags override them.
    pub import: ImportOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            log_filter: "info".to_string(),
            import: ImportOptions::default(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("au", "gstbook", "gstbook")
}

impl Settings {
    /// Reads `explicit`, else `gstbook.toml` in the platform config
    /// directory. A missing default file yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match project_dirs() {
                Some(dirs) => dirs.config_dir().join(SETTINGS_FILE),
                None => return Ok(Self::default()),
            },
        };
        if explicit.is_none() && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let settings: Self = toml::from_str(content)?;
        settings.import.validate()?;
        Ok(settings)
    }

    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = project_dirs().context("no home directory to keep the database in")?;
        Ok(dirs.data_dir().join(DATABASE_FILE))
    }
}
