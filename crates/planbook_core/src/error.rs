//! Core error taxonomy.
//!
//! # Responsibility
//! - Give every mutation and query a single typed failure surface.
//!
//! # Invariants
//! - A failed operation applies no partial state change; the transaction
//!   that produced the error is rolled back before the error is returned.
//! - Errors are returned to the caller, never swallowed into logs.

use crate::db::DbError;
use crate::model::entity::{EntityId, EntityKind, ValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure surface shared by the entity store, relation repositories,
/// mutation engine, and query facade.
#[derive(Debug)]
pub enum CoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Malformed input, uniqueness violation, empty edit, or self-parenting.
    Validation(ValidationError),
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// Hierarchy operation would make a task its own transitive ancestor.
    Cycle { task: EntityId, ancestor: EntityId },
    /// Privileged wipe requested without the correct confirmation token.
    Unauthorized,
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Cycle { task, ancestor } => write!(
                f,
                "parenting task {task} under {ancestor} would create a cycle"
            ),
            Self::Unauthorized => write!(f, "wipe rejected: wrong confirmation token"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Cycle { .. } => None,
            Self::Unauthorized => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
