use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

use crate::domain::entities::page::{SortDirection, DEFAULT_PAGE_SIZE};

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_TABLE: &str = "companies";

const ENV_DB_PATH: &str = "GRID_DB_PATH";
const ENV_TABLE: &str = "GRID_TABLE";
const ENV_PAGE_SIZE: &str = "GRID_PAGE_SIZE";
const ENV_SORT_ORDER: &str = "GRID_SORT_ORDER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    pub db_path: PathBuf,
    pub schema: String,
    pub table: String,
    pub page_size: u64,
    /// Initial direction of the id sort.
    pub sort_order: SortDirection,
}

pub fn default_db_path() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("com", "hellhbbd", "company-grid")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))?;
    Ok(project_dirs.data_local_dir().join("companies.sqlite"))
}

impl GridConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from a variable lookup. Unset variables use the
    /// defaults; unparsable ones are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup(ENV_DB_PATH).filter(|value| !value.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let table = lookup(ENV_TABLE)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string());

        let page_size = match lookup(ENV_PAGE_SIZE) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(size) if size > 0 => size,
                _ => {
                    tracing::warn!(value = %raw, "invalid {ENV_PAGE_SIZE}, using default");
                    DEFAULT_PAGE_SIZE
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        let sort_order = lookup(ENV_SORT_ORDER)
            .map(|raw| SortDirection::parse(&raw))
            .unwrap_or_default();

        Ok(Self {
            db_path,
            schema: DEFAULT_SCHEMA.to_string(),
            table,
            page_size,
            sort_order,
        })
    }
}
