//! Activity log records.
//!
//! Rows are append-mostly; only the creator reads them back.

use crate::access::{RowView, UserId};
use crate::model::common::{require_non_empty, ModelValidationError};
use crate::model::memo::MemoId;
use serde::{Deserialize, Serialize};

pub type ActivityId = i64;

/// Activity type recorded when a memo receives a comment.
pub const ACTIVITY_TYPE_MEMO_COMMENT: &str = "memo.comment";

/// Severity of an activity entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    #[default]
    Info,
    Warn,
    Error,
}

impl ActivityLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "INFO" => Some(Self::Info),
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Persisted `activity` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub creator_id: UserId,
    pub created_ts: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub level: ActivityLevel,
    /// JSON text.
    pub payload: String,
}

impl Activity {
    pub fn row_view(&self) -> RowView {
        RowView::Activity {
            creator_id: self.creator_id,
        }
    }
}

/// Creation input for one activity entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub creator_id: UserId,
    pub kind: String,
    pub level: ActivityLevel,
    pub payload: String,
}

impl NewActivity {
    pub fn new(creator_id: UserId, kind: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            creator_id,
            kind: kind.into(),
            level: ActivityLevel::Info,
            payload: payload.into(),
        }
    }

    pub fn row_view(&self) -> RowView {
        RowView::Activity {
            creator_id: self.creator_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty(&self.kind, "activity.type")
    }
}

/// JSON payload stored for [`ACTIVITY_TYPE_MEMO_COMMENT`] entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoCommentPayload {
    /// The comment memo.
    pub memo_id: MemoId,
    /// The memo being commented on.
    pub related_memo_id: MemoId,
}

/// Envelope for typed activity payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub memo_comment: Option<MemoCommentPayload>,
}
