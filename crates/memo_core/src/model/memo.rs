//! Memo, per-user organizer and memo relation records.
//!
//! # Responsibility
//! - Define the note body record and its two satellite tables.
//!
//! # Invariants
//! - `uid` is unique and independent of `id`.
//! - `creator_id` is set once at creation.
//! - A relation never links a memo to itself.

use crate::access::{RowView, UserId, Visibility};
use crate::model::common::{generate_uid, is_valid_uid, ModelValidationError, RowStatus};
use serde::{Deserialize, Serialize};

/// Numeric primary key of a `memo` row.
pub type MemoId = i64;

/// Persisted `memo` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub id: MemoId,
    pub uid: String,
    pub creator_id: UserId,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub row_status: RowStatus,
    pub content: String,
    pub visibility: Visibility,
    pub pinned: bool,
}

impl Memo {
    pub fn row_view(&self) -> RowView {
        RowView::Memo {
            creator_id: self.creator_id,
            visibility: self.visibility,
        }
    }
}

/// Creation input. `creator_id` is self-asserted by the caller and checked
/// against the acting identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemo {
    pub uid: String,
    pub creator_id: UserId,
    pub content: String,
    pub visibility: Visibility,
}

impl NewMemo {
    /// Private memo with a generated uid.
    pub fn new(creator_id: UserId, content: impl Into<String>) -> Self {
        Self {
            uid: generate_uid(),
            creator_id,
            content: content.into(),
            visibility: Visibility::Private,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn row_view(&self) -> RowView {
        RowView::Memo {
            creator_id: self.creator_id,
            visibility: self.visibility,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !is_valid_uid(&self.uid) {
            return Err(ModelValidationError::InvalidUid(self.uid.clone()));
        }
        Ok(())
    }
}

/// Owner patch for a memo. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoPatch {
    pub content: Option<String>,
    pub visibility: Option<Visibility>,
    pub row_status: Option<RowStatus>,
    pub pinned: Option<bool>,
}

impl MemoPatch {
    /// Applies this patch to a copy of `memo`.
    pub fn apply_to(&self, memo: &Memo) -> Memo {
        let mut next = memo.clone();
        if let Some(content) = &self.content {
            next.content = content.clone();
        }
        if let Some(visibility) = self.visibility {
            next.visibility = visibility;
        }
        if let Some(row_status) = self.row_status {
            next.row_status = row_status;
        }
        if let Some(pinned) = self.pinned {
            next.pinned = pinned;
        }
        next
    }
}

/// Per-user organization metadata on a memo. Not memo ownership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoOrganizer {
    pub memo_id: MemoId,
    pub user_id: UserId,
    pub pinned: bool,
}

impl MemoOrganizer {
    pub fn row_view(&self) -> RowView {
        RowView::MemoOrganizer {
            user_id: self.user_id,
        }
    }
}

/// Relation kind between two memos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Reference,
    Comment,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "REFERENCE",
            Self::Comment => "COMMENT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "REFERENCE" => Some(Self::Reference),
            "COMMENT" => Some(Self::Comment),
            _ => None,
        }
    }
}

/// Directed link `memo_id -> related_memo_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoRelation {
    pub memo_id: MemoId,
    pub related_memo_id: MemoId,
    #[serde(rename = "type")]
    pub kind: RelationType,
}

impl MemoRelation {
    pub fn new(memo_id: MemoId, related_memo_id: MemoId, kind: RelationType) -> Self {
        Self {
            memo_id,
            related_memo_id,
            kind,
        }
    }

    pub fn row_view(&self) -> RowView {
        RowView::MemoRelation {
            memo_id: self.memo_id,
            related_memo_id: self.related_memo_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.memo_id == self.related_memo_id {
            return Err(ModelValidationError::SelfRelation(self.memo_id));
        }
        Ok(())
    }
}
