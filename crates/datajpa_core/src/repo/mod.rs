//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for members and teams.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Writes validate the record before any SQL mutation.
//! - Point lookups report absence as `Ok(None)`, never as an error.
//! - Constraint failures raised by the engine surface as
//!   `RepoError::ConstraintViolation`, unchanged in meaning.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::member::MemberValidationError;
use crate::model::team::TeamValidationError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod member_repo;
pub mod team_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by member and team persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field validation before reaching storage.
    Validation(MemberValidationError),
    /// Team failed field validation before reaching storage.
    InvalidTeam(TeamValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Storage rejected the write (dangling or still-referenced team).
    ConstraintViolation(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTeam(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation(details) => write!(f, "constraint violation: {details}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidTeam(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MemberValidationError> for RepoError {
    fn from(value: MemberValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TeamValidationError> for RepoError {
    fn from(value: TeamValidationError) -> Self {
        Self::InvalidTeam(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(message.clone().unwrap_or_else(|| err.to_string()))
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Verifies that `conn` is migrated and exposes `table` with `columns`.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }

    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

/// Converts a SQLite `COUNT(*)` result into an unsigned count.
pub(crate) fn count_from_db(value: i64, table: &str) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}` for {table}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
