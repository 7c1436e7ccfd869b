//! Domain records for the memo schema.
//!
//! # Responsibility
//! - Define typed rows, creation inputs and checked enumerations.
//! - Project each row to the `RowView` the access rules evaluate.
//!
//! # Invariants
//! - Every owner-scoped row carries exactly one owner identity, set at
//!   creation and never rewritten.
//! - Creation inputs are validated before any storage write.

pub mod activity;
pub mod common;
pub mod inbox;
pub mod memo;
pub mod reaction;
pub mod resource;
pub mod system;
pub mod user;
