//! SQLite record store for census tracts.
//!
//! One table, `census_tracts`, keyed by the 11-character tract id. The
//! store is written once by the seeder and only read while serving.
//!
//! ## Mapping
//!
//! Rows become [`CensusTract`] values through a single explicit
//! `CensusTract::from_row`; there is no dynamic row-to-object layer.

pub mod schema;
pub mod tracts;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

pub use tracts::{CensusTract, IncomeGroup, IncomeGroupSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("census tract {0} not found")]
    NotFound(String),

    #[error("census tract {0} already exists")]
    DuplicateKey(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Record store over a single SQLite connection.
pub struct TractStore {
    conn: Mutex<Connection>,
}

impl TractStore {
    /// Open or create the database file. `":memory:"` opens a private
    /// in-memory database.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        if path == ":memory:" {
            return Self::open_in_memory();
        }

        info!(path = %path, "Opening SQLite database");
        let conn = Connection::open(Path::new(path))?;

        // WAL lets concurrent readers proceed while the seeder writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory SQLite database");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `f` with the connection held.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.conn()?;
        f(&conn)
    }
}
