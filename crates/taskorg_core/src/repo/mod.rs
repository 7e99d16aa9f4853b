//! Persistence for projects, tasks and the audit log.
//!
//! # Responsibility
//! - Define the `TaskRepository` contract and its SQLite implementation.
//! - Keep SQL out of the service layer.
//!
//! # Invariants
//! - Every mutation and its audit row commit in one transaction.
//! - Absent rows are reported as `bool`/`Option`, never as errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::date::DateError;
use crate::model::history::EntityType;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod history_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for organizer persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Storage-engine failure; fatal for the triggering operation.
    Db(DbError),
    /// Insert collided with an existing primary key.
    DuplicateKey { entity: EntityType, id: String },
    /// Date text or date arithmetic failed.
    MalformedDate(DateError),
    /// Connection schema is not at the version this build expects.
    UninitializedStore {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted value does not map onto the domain model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey { entity, id } => write!(f, "{entity} already exists: {id}"),
            Self::MalformedDate(err) => write!(f, "{err}"),
            Self::UninitializedStore {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MalformedDate(err) => Some(err),
            Self::DuplicateKey { .. } => None,
            Self::UninitializedStore { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DateError> for RepoError {
    fn from(value: DateError) -> Self {
        Self::MalformedDate(value)
    }
}

/// Maps an insert failure, turning key collisions into `DuplicateKey`.
pub(crate) fn map_insert_error(err: rusqlite::Error, entity: EntityType, id: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return RepoError::DuplicateKey {
                entity,
                id: id.to_string(),
            };
        }
    }
    err.into()
}
