//! Entity kinds, operations and the row projection seen by rules.
//!
//! # Responsibility
//! - Name every guarded table and the four operation kinds.
//! - Carry only ownership/visibility fields of a candidate row.
//!
//! # Invariants
//! - `RowView::kind()` is the single source of truth for which entity a view
//!   belongs to.

use crate::access::identity::UserId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Guarded table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    MigrationHistory,
    SystemSetting,
    User,
    UserSetting,
    Memo,
    MemoOrganizer,
    MemoRelation,
    Resource,
    Activity,
    IdentityProvider,
    Inbox,
    Reaction,
}

impl EntityKind {
    /// Every guarded table, in schema order.
    pub const ALL: [EntityKind; 12] = [
        EntityKind::MigrationHistory,
        EntityKind::SystemSetting,
        EntityKind::User,
        EntityKind::UserSetting,
        EntityKind::Memo,
        EntityKind::MemoOrganizer,
        EntityKind::MemoRelation,
        EntityKind::Resource,
        EntityKind::Activity,
        EntityKind::IdentityProvider,
        EntityKind::Inbox,
        EntityKind::Reaction,
    ];

    /// Backing table name.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::MigrationHistory => "migration_history",
            Self::SystemSetting => "system_setting",
            Self::User => "user",
            Self::UserSetting => "user_setting",
            Self::Memo => "memo",
            Self::MemoOrganizer => "memo_organizer",
            Self::MemoRelation => "memo_relation",
            Self::Resource => "resource",
            Self::Activity => "activity",
            Self::IdentityProvider => "idp",
            Self::Inbox => "inbox",
            Self::Reaction => "reaction",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Data-access operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Select,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Select,
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Memo visibility level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Readable by every authenticated identity.
    Public,
    /// Readable only by the creator under the current rules.
    Protected,
    /// Readable only by the creator.
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Protected => "PROTECTED",
            Self::Private => "PRIVATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUBLIC" => Some(Self::Public),
            "PROTECTED" => Some(Self::Protected),
            "PRIVATE" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Identity-bearing column referenced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerField {
    /// `user.id`
    Id,
    /// `user_setting.user_id`, `memo_organizer.user_id`
    UserId,
    /// `creator_id` on memo/resource/activity/reaction
    CreatorId,
    /// `inbox.sender_id`
    SenderId,
    /// `inbox.receiver_id`
    ReceiverId,
}

impl OwnerField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UserId => "user_id",
            Self::CreatorId => "creator_id",
            Self::SenderId => "sender_id",
            Self::ReceiverId => "receiver_id",
        }
    }
}

/// Ownership and visibility fields of one candidate row.
///
/// Global configuration tables carry no fields because their rules never
/// look at row content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowView {
    MigrationHistory,
    SystemSetting,
    User {
        id: UserId,
    },
    UserSetting {
        user_id: UserId,
    },
    Memo {
        creator_id: UserId,
        visibility: Visibility,
    },
    MemoOrganizer {
        user_id: UserId,
    },
    MemoRelation {
        memo_id: i64,
        related_memo_id: i64,
    },
    Resource {
        creator_id: UserId,
    },
    Activity {
        creator_id: UserId,
    },
    IdentityProvider,
    Inbox {
        sender_id: UserId,
        receiver_id: UserId,
    },
    Reaction {
        creator_id: UserId,
    },
}

impl RowView {
    /// Entity this view belongs to.
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::MigrationHistory => EntityKind::MigrationHistory,
            Self::SystemSetting => EntityKind::SystemSetting,
            Self::User { .. } => EntityKind::User,
            Self::UserSetting { .. } => EntityKind::UserSetting,
            Self::Memo { .. } => EntityKind::Memo,
            Self::MemoOrganizer { .. } => EntityKind::MemoOrganizer,
            Self::MemoRelation { .. } => EntityKind::MemoRelation,
            Self::Resource { .. } => EntityKind::Resource,
            Self::Activity { .. } => EntityKind::Activity,
            Self::IdentityProvider => EntityKind::IdentityProvider,
            Self::Inbox { .. } => EntityKind::Inbox,
            Self::Reaction { .. } => EntityKind::Reaction,
        }
    }

    /// Reads one identity-bearing field; `None` when this entity has no such
    /// column.
    pub fn owner_field(&self, field: OwnerField) -> Option<UserId> {
        match (self, field) {
            (Self::User { id }, OwnerField::Id) => Some(*id),
            (Self::UserSetting { user_id }, OwnerField::UserId)
            | (Self::MemoOrganizer { user_id }, OwnerField::UserId) => Some(*user_id),
            (Self::Memo { creator_id, .. }, OwnerField::CreatorId)
            | (Self::Resource { creator_id }, OwnerField::CreatorId)
            | (Self::Activity { creator_id }, OwnerField::CreatorId)
            | (Self::Reaction { creator_id }, OwnerField::CreatorId) => Some(*creator_id),
            (Self::Inbox { sender_id, .. }, OwnerField::SenderId) => Some(*sender_id),
            (Self::Inbox { receiver_id, .. }, OwnerField::ReceiverId) => Some(*receiver_id),
            _ => None,
        }
    }

    /// Memo visibility; `None` for every other entity.
    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            Self::Memo { visibility, .. } => Some(*visibility),
            _ => None,
        }
    }

    /// All identity-bearing fields of this row, used to detect owner rewrites.
    pub fn owner_fields(&self) -> Vec<(OwnerField, UserId)> {
        [
            OwnerField::Id,
            OwnerField::UserId,
            OwnerField::CreatorId,
            OwnerField::SenderId,
            OwnerField::ReceiverId,
        ]
        .into_iter()
        .filter_map(|field| self.owner_field(field).map(|value| (field, value)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, OwnerField, RowView, Visibility};

    #[test]
    fn row_view_reports_matching_kind() {
        let row = RowView::Inbox {
            sender_id: 1,
            receiver_id: 2,
        };
        assert_eq!(row.kind(), EntityKind::Inbox);
        assert_eq!(RowView::SystemSetting.kind(), EntityKind::SystemSetting);
    }

    #[test]
    fn owner_field_reads_only_columns_the_entity_has() {
        let memo = RowView::Memo {
            creator_id: 7,
            visibility: Visibility::Private,
        };
        assert_eq!(memo.owner_field(OwnerField::CreatorId), Some(7));
        assert_eq!(memo.owner_field(OwnerField::UserId), None);
        assert_eq!(memo.visibility(), Some(Visibility::Private));

        let inbox = RowView::Inbox {
            sender_id: 1,
            receiver_id: 2,
        };
        assert_eq!(
            inbox.owner_fields(),
            vec![(OwnerField::SenderId, 1), (OwnerField::ReceiverId, 2)]
        );
    }

    #[test]
    fn visibility_round_trips_stored_values() {
        for value in [Visibility::Public, Visibility::Protected, Visibility::Private] {
            assert_eq!(Visibility::parse(value.as_str()), Some(value));
        }
        assert_eq!(Visibility::parse("public"), None);
    }

    #[test]
    fn every_entity_has_distinct_table_name() {
        let mut names: Vec<&str> = EntityKind::ALL.iter().map(|kind| kind.table_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EntityKind::ALL.len());
    }
}
