//! Request-scoped access guard used by every repository.
//!
//! # Responsibility
//! - Snapshot the acting identity for one logical request.
//! - Translate evaluator decisions into repository results.
//!
//! # Invariants
//! - A row that fails `Select` maps to `NotFound` for every operation.
//! - Denials are logged at `debug` with entity/operation metadata only.

use crate::access::{
    authorize, authorize_update, Decision, EntityKind, Identity, IdentityContext, Operation,
    RowView,
};
use crate::repo::{RepoError, RepoResult};
use log::debug;
use std::fmt::Display;

/// Acting identity bound to one repository instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessGuard {
    identity: Option<Identity>,
}

impl AccessGuard {
    pub fn new(ctx: &impl IdentityContext) -> Self {
        Self {
            identity: ctx.current_identity(),
        }
    }

    /// Raw decision for one request.
    pub fn decide(&self, operation: Operation, row: &RowView) -> Decision {
        authorize(self.identity, row.kind(), operation, row)
    }

    /// Returns whether the acting identity may read `row`.
    pub fn can_read(&self, row: &RowView) -> bool {
        self.decide(Operation::Select, row).is_allowed()
    }

    /// Keeps only rows the acting identity may read.
    pub fn filter_readable<T>(&self, rows: Vec<T>, view: impl Fn(&T) -> RowView) -> Vec<T> {
        rows.into_iter().filter(|row| self.can_read(&view(row))).collect()
    }

    /// Checks a write against the row being written (WITH CHECK).
    pub fn require_insert(&self, row: &RowView) -> RepoResult<()> {
        self.require(Operation::Insert, row)
    }

    /// Checks an operation on an existing row (USING).
    ///
    /// Rows the identity cannot read are reported as `NotFound` under `key`.
    pub fn require_existing(
        &self,
        operation: Operation,
        row: &RowView,
        key: impl Display,
    ) -> RepoResult<()> {
        if operation != Operation::Select && !self.can_read(row) {
            self.log_denied(row.kind(), Operation::Select);
            return Err(RepoError::not_found(row.kind(), key));
        }
        self.require(operation, row).map_err(|err| match operation {
            Operation::Select => RepoError::not_found(row.kind(), &key),
            _ => err,
        })
    }

    /// Checks an update on both the current and the proposed row.
    pub fn require_update(
        &self,
        current: &RowView,
        proposed: &RowView,
        key: impl Display,
    ) -> RepoResult<()> {
        let entity = current.kind();
        if !self.can_read(current) {
            self.log_denied(entity, Operation::Select);
            return Err(RepoError::not_found(entity, key));
        }
        match authorize_update(self.identity, current, proposed) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                self.log_denied(entity, Operation::Update);
                Err(RepoError::PermissionDenied {
                    entity,
                    operation: Operation::Update,
                })
            }
        }
    }

    fn require(&self, operation: Operation, row: &RowView) -> RepoResult<()> {
        match self.decide(operation, row) {
            Decision::Allow => Ok(()),
            Decision::Deny => {
                self.log_denied(row.kind(), operation);
                Err(RepoError::PermissionDenied {
                    entity: row.kind(),
                    operation,
                })
            }
        }
    }

    fn log_denied(&self, entity: EntityKind, operation: Operation) {
        match self.identity {
            Some(identity) => debug!(
                "event=access_check module=repo status=deny entity={} operation={} user_id={} role={}",
                entity, operation, identity.user_id, identity.role
            ),
            None => debug!(
                "event=access_check module=repo status=deny entity={} operation={} user_id=anonymous",
                entity, operation
            ),
        }
    }
}
