//! Row-level access control and guarded persistence for memo data.
//!
//! The [`access`] module is the pure decision core; everything under
//! [`repo`] routes storage calls through it.

pub mod access;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use access::{
    authorize, authorize_update, Anonymous, Decision, EntityKind, Identity, IdentityContext,
    Operation, Role, RowView, UserId, Visibility, RULES,
};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use repo::{load_identity, provision_user, RepoError, RepoResult};
pub use service::memo_service::{CommentOutcome, MemoService, MemoServiceError};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
