//! Reaction records.

use crate::access::{RowView, UserId};
use crate::model::common::{require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type ReactionId = i64;

/// Persisted `reaction` row, unique per `(creator_id, content_id, reaction_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: ReactionId,
    pub created_ts: i64,
    pub creator_id: UserId,
    /// Reacted-to content name, e.g. `memos/<uid>`.
    pub content_id: String,
    pub reaction_type: String,
}

impl Reaction {
    pub fn row_view(&self) -> RowView {
        RowView::Reaction {
            creator_id: self.creator_id,
        }
    }
}

/// Creation input for one reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub creator_id: UserId,
    pub content_id: String,
    pub reaction_type: String,
}

impl NewReaction {
    pub fn new(
        creator_id: UserId,
        content_id: impl Into<String>,
        reaction_type: impl Into<String>,
    ) -> Self {
        Self {
            creator_id,
            content_id: content_id.into(),
            reaction_type: reaction_type.into(),
        }
    }

    /// Reaction on a memo addressed by its public uid.
    pub fn on_memo(creator_id: UserId, memo_uid: &str, reaction_type: impl Into<String>) -> Self {
        Self::new(creator_id, memo_content_id(memo_uid), reaction_type)
    }

    pub fn row_view(&self) -> RowView {
        RowView::Reaction {
            creator_id: self.creator_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty(&self.content_id, "reaction.content_id")?;
        require_non_empty(&self.reaction_type, "reaction.reaction_type")
    }
}

/// Content name for a memo.
pub fn memo_content_id(memo_uid: &str) -> String {
    format!("memos/{memo_uid}")
}
