//! Database layer: connection lifecycle, schema and patient rows.

mod patients;
mod schema;

pub use patients::*;
pub use schema::*;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::{system_clock, SharedClock};

/// Store-level failures.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0} failed, no rows affected")]
    NoRowsAffected(&'static str),

    #[error("Inserting patient failed, no ID obtained")]
    MissingGeneratedId,
}

pub type DbResult<T> = Result<T, StorageError>;

/// Supplies a live connection, opening it on demand.
pub trait ConnectionProvider {
    /// Return the open connection, reconnecting if it was closed.
    fn acquire(&mut self) -> DbResult<&Connection>;

    /// Release the connection. Safe to call when never opened or already closed.
    fn close(&mut self);
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

impl DbLocation {
    fn connect(&self) -> DbResult<Connection> {
        let conn = match self {
            DbLocation::File(path) => Connection::open(path)?,
            DbLocation::Memory => Connection::open_in_memory()?,
        };
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }
}

/// Database connection wrapper.
///
/// Owns at most one SQLite connection. An in-memory database starts over
/// empty once it has been closed and re-acquired.
#[derive(Debug)]
pub struct Database {
    location: DbLocation,
    conn: Option<Connection>,
    clock: SharedClock,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_clock(path, system_clock())
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_in_memory_with_clock(system_clock())
    }

    /// Open database at path, resolving default timestamps from `clock`.
    pub fn open_with_clock<P: AsRef<Path>>(path: P, clock: SharedClock) -> DbResult<Self> {
        Self::open_at(DbLocation::File(path.as_ref().to_path_buf()), clock)
    }

    /// Create in-memory database resolving default timestamps from `clock`.
    pub fn open_in_memory_with_clock(clock: SharedClock) -> DbResult<Self> {
        Self::open_at(DbLocation::Memory, clock)
    }

    /// Open the database described by `location`, e.g. from [`CoreConfig`](crate::config::CoreConfig).
    pub fn open_at(location: DbLocation, clock: SharedClock) -> DbResult<Self> {
        let conn = location.connect()?;
        debug!(?location, "database opened");
        Ok(Self {
            location,
            conn: Some(conn),
            clock,
        })
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn clock(&self) -> &SharedClock {
        &self.clock
    }
}

impl ConnectionProvider for Database {
    fn acquire(&mut self) -> DbResult<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = self.location.connect()?;
                debug!(location = ?self.location, "database reopened");
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => debug!(location = ?self.location, "database closed"),
                Err((_, e)) => warn!(error = %e, "error closing database connection"),
            }
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}
