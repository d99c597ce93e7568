//! Core runtime configuration.
//!
//! Resolved once at process startup and passed into the database and service
//! constructors; nothing below this layer reads the environment.

use std::path::{Path, PathBuf};

use crate::db::DbLocation;

/// Environment variable naming the SQLite file. `:memory:` selects an in-memory store.
pub const DATABASE_PATH_ENV: &str = "HMS_DATABASE_PATH";

/// Environment variable holding a `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "HMS_LOG";

pub const DEFAULT_DATABASE_PATH: &str = "hms_database.db";
pub const DEFAULT_LOG_FILTER: &str = "hms_core=info";

const IN_MEMORY: &str = ":memory:";

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    database: DbLocation,
    log_filter: String,
}

impl CoreConfig {
    pub fn new(database: DbLocation, log_filter: impl Into<String>) -> Self {
        Self {
            database,
            log_filter: log_filter.into(),
        }
    }

    /// Read configuration from `HMS_DATABASE_PATH` and `HMS_LOG`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = match non_blank(DATABASE_PATH_ENV) {
            Some(path) if path.trim() == IN_MEMORY => DbLocation::Memory,
            Some(path) => DbLocation::File(PathBuf::from(path)),
            None => DbLocation::File(PathBuf::from(DEFAULT_DATABASE_PATH)),
        };
        let log_filter = non_blank(LOG_FILTER_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.into());

        Self {
            database,
            log_filter,
        }
    }

    pub fn database(&self) -> &DbLocation {
        &self.database
    }

    /// Database file path, `None` for an in-memory store.
    pub fn database_path(&self) -> Option<&Path> {
        match &self.database {
            DbLocation::File(path) => Some(path),
            DbLocation::Memory => None,
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
