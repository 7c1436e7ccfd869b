//! Declarative row rule table.
//!
//! # Responsibility
//! - Hold the per-entity, per-operation rules as static data.
//! - Evaluate one rule's predicate and role gate against a row.
//!
//! # Invariants
//! - Rules are permissive: a request is allowed when any matching rule passes.
//! - An (entity, operation) pair with no rule is denied.
//! - Anonymous callers fail every predicate except `Unconditional`, and every
//!   role gate.

use crate::access::identity::{Identity, Role};
use crate::access::row::{EntityKind, Operation, OwnerField, RowView, Visibility};
use std::fmt::{Display, Formatter};

const ALL_OPS: &[Operation] = &[
    Operation::Select,
    Operation::Insert,
    Operation::Update,
    Operation::Delete,
];
const SELECT: &[Operation] = &[Operation::Select];
const INSERT: &[Operation] = &[Operation::Insert];
const UPDATE: &[Operation] = &[Operation::Update];
const WRITES: &[Operation] = &[Operation::Insert, Operation::Update, Operation::Delete];
const INSERT_DELETE: &[Operation] = &[Operation::Insert, Operation::Delete];

/// Condition part of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Always true, including for anonymous callers.
    Unconditional,
    /// True for any present identity.
    Authenticated,
    /// `identity == row.<field>`
    Owner(OwnerField),
    /// `identity` equals any of the listed fields.
    AnyOwner(&'static [OwnerField]),
    /// `identity == row.<field>` or the row is `PUBLIC`. Still requires a
    /// present identity.
    OwnerOrPublic(OwnerField),
}

impl Predicate {
    /// Evaluates this predicate. Missing identity fails every comparison.
    pub fn holds(&self, identity: Option<Identity>, row: &RowView) -> bool {
        let Some(identity) = identity else {
            return matches!(self, Self::Unconditional);
        };
        let is_owner = |field: OwnerField| row.owner_field(field) == Some(identity.user_id);

        match *self {
            Self::Unconditional | Self::Authenticated => true,
            Self::Owner(field) => is_owner(field),
            Self::AnyOwner(fields) => fields.iter().copied().any(is_owner),
            Self::OwnerOrPublic(field) => {
                is_owner(field) || row.visibility() == Some(Visibility::Public)
            }
        }
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unconditional => write!(f, "true"),
            Self::Authenticated => write!(f, "identity IS NOT NULL"),
            Self::Owner(field) => write!(f, "identity = {}", field.column()),
            Self::AnyOwner(fields) => {
                for (index, field) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, " OR ")?;
                    }
                    write!(f, "identity = {}", field.column())?;
                }
                Ok(())
            }
            Self::OwnerOrPublic(field) => write!(
                f,
                "identity = {} OR visibility = 'PUBLIC'",
                field.column()
            ),
        }
    }
}

/// One permissive rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub name: &'static str,
    pub entity: EntityKind,
    pub operations: &'static [Operation],
    pub predicate: Predicate,
    /// Minimum role of the acting identity, checked in addition to `predicate`.
    pub required_role: Option<Role>,
}

impl Rule {
    pub fn applies_to(&self, entity: EntityKind, operation: Operation) -> bool {
        self.entity == entity && self.operations.contains(&operation)
    }

    /// Role gate plus predicate.
    pub fn permits(&self, identity: Option<Identity>, row: &RowView) -> bool {
        if let Some(required) = self.required_role {
            match identity {
                Some(identity) if identity.role.satisfies(required) => {}
                _ => return false,
            }
        }
        self.predicate.holds(identity, row)
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let ops = self
            .operations
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join("|");
        write!(f, "{} on {} [{}]: {}", self.name, self.entity, ops, self.predicate)?;
        if let Some(role) = self.required_role {
            write!(f, " (role >= {role})")?;
        }
        Ok(())
    }
}

const fn rule(
    name: &'static str,
    entity: EntityKind,
    operations: &'static [Operation],
    predicate: Predicate,
) -> Rule {
    Rule {
        name,
        entity,
        operations,
        predicate,
        required_role: None,
    }
}

const fn admin_rule(
    name: &'static str,
    entity: EntityKind,
    operations: &'static [Operation],
) -> Rule {
    Rule {
        name,
        entity,
        operations,
        predicate: Predicate::Unconditional,
        required_role: Some(Role::Admin),
    }
}

/// Complete rule table.
pub const RULES: &[Rule] = &[
    admin_rule("migration_history_admin", EntityKind::MigrationHistory, ALL_OPS),
    rule(
        "system_setting_read",
        EntityKind::SystemSetting,
        SELECT,
        Predicate::Authenticated,
    ),
    admin_rule("system_setting_write", EntityKind::SystemSetting, WRITES),
    rule("user_read", EntityKind::User, SELECT, Predicate::Authenticated),
    rule(
        "user_update_self",
        EntityKind::User,
        UPDATE,
        Predicate::Owner(OwnerField::Id),
    ),
    rule(
        "user_setting_owner",
        EntityKind::UserSetting,
        ALL_OPS,
        Predicate::Owner(OwnerField::UserId),
    ),
    rule(
        "memo_read",
        EntityKind::Memo,
        SELECT,
        Predicate::OwnerOrPublic(OwnerField::CreatorId),
    ),
    rule(
        "memo_write_owner",
        EntityKind::Memo,
        WRITES,
        Predicate::Owner(OwnerField::CreatorId),
    ),
    rule(
        "memo_organizer_owner",
        EntityKind::MemoOrganizer,
        ALL_OPS,
        Predicate::Owner(OwnerField::UserId),
    ),
    // Open rule: no ownership binding to either memo endpoint.
    rule(
        "memo_relation_open",
        EntityKind::MemoRelation,
        ALL_OPS,
        Predicate::Unconditional,
    ),
    rule(
        "resource_owner",
        EntityKind::Resource,
        ALL_OPS,
        Predicate::Owner(OwnerField::CreatorId),
    ),
    rule(
        "activity_owner",
        EntityKind::Activity,
        ALL_OPS,
        Predicate::Owner(OwnerField::CreatorId),
    ),
    rule(
        "idp_read",
        EntityKind::IdentityProvider,
        SELECT,
        Predicate::Authenticated,
    ),
    admin_rule("idp_write", EntityKind::IdentityProvider, WRITES),
    rule(
        "inbox_read_participant",
        EntityKind::Inbox,
        SELECT,
        Predicate::AnyOwner(&[OwnerField::ReceiverId, OwnerField::SenderId]),
    ),
    rule(
        "inbox_insert_sender",
        EntityKind::Inbox,
        INSERT,
        Predicate::Owner(OwnerField::SenderId),
    ),
    rule(
        "inbox_update_receiver",
        EntityKind::Inbox,
        UPDATE,
        Predicate::Owner(OwnerField::ReceiverId),
    ),
    rule(
        "reaction_read",
        EntityKind::Reaction,
        SELECT,
        Predicate::Authenticated,
    ),
    rule(
        "reaction_write_owner",
        EntityKind::Reaction,
        INSERT_DELETE,
        Predicate::Owner(OwnerField::CreatorId),
    ),
];

/// Rules matching one (entity, operation) pair.
pub fn rules_for(entity: EntityKind, operation: Operation) -> impl Iterator<Item = &'static Rule> {
    RULES
        .iter()
        .filter(move |rule| rule.applies_to(entity, operation))
}
