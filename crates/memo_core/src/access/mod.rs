//! Row-level access control.
//!
//! # Responsibility
//! - Own the rule table that decides, per entity and operation, whether an
//!   acting identity may touch a row.
//! - Define the identity accessor contract hosts implement.
//!
//! # Invariants
//! - Evaluation is a pure function of its inputs and safe to call from any
//!   thread without synchronization.
//! - Every storage access in `repo` is routed through `authorize` first.

pub mod evaluator;
pub mod identity;
pub mod row;
pub mod rule;

pub use evaluator::{authorize, authorize_update, matching_rule, Decision};
pub use identity::{Anonymous, Identity, IdentityContext, Role, RoleParseError, UserId};
pub use row::{EntityKind, Operation, OwnerField, RowView, Visibility};
pub use rule::{rules_for, Predicate, Rule, RULES};
