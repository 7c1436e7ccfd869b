//! Guarded repository layer over the memo schema.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity group.
//! - Route every read and write through the access evaluator before SQL.
//!
//! # Invariants
//! - Rows the acting identity cannot `Select` are reported as absent, never
//!   as forbidden.
//! - Writes that fail their rule surface `RepoError::PermissionDenied`.
//! - Repositories never issue SQL that rewrites an owner column.

use crate::access::{EntityKind, Operation};
use crate::db::DbError;
use crate::model::common::ModelValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod activity_repo;
pub mod guard;
pub mod inbox_repo;
pub mod memo_repo;
pub mod reaction_repo;
pub mod resource_repo;
pub mod system_repo;
pub mod user_repo;

pub use guard::AccessGuard;
pub use user_repo::{load_identity, provision_user};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every entity group.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Row is missing or not visible to the acting identity.
    NotFound { entity: EntityKind, key: String },
    /// Row is visible but the requested write is not allowed.
    PermissionDenied {
        entity: EntityKind,
        operation: Operation,
    },
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(entity: EntityKind, key: impl Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns whether this error is an authorization rejection.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::PermissionDenied { entity, operation } => {
                write!(f, "permission denied: {operation} on {entity}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::PermissionDenied { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
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

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Parses one checked enumeration column, rejecting unknown stored values.
pub(crate) fn parse_enum<T>(
    value: &str,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> RepoResult<T> {
    parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid value `{value}` in {column}"))
    })
}

/// Applies `offset`/`limit` after row-level filtering.
pub(crate) fn paginate<T>(rows: Vec<T>, limit: Option<u32>, offset: u32) -> Vec<T> {
    let skipped = rows.into_iter().skip(offset as usize);
    match limit {
        Some(limit) => skipped.take(limit as usize).collect(),
        None => skipped.collect(),
    }
}
