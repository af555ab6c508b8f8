//! SQLite storage bootstrap, schema migrations and transaction scoping.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the member store.
//! - Apply schema migrations in deterministic order.
//! - Provide the explicit unit-of-work boundary used by services and HTTP.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not touch data before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod transaction;

pub use open::{open_db, open_db_at, open_db_in_memory, IN_MEMORY_LOCATION};
pub use transaction::with_transaction;

pub type DbResult<T> = Result<T, DbError>;

/// Storage bootstrap failure.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The member store was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// `open_db_at` got a location that names neither a file nor `:memory:`.
    InvalidLocation(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "member store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidLocation(location) => {
                write!(f, "invalid database location `{location}`")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::InvalidLocation(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
