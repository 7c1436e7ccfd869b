//! Inbox message records.
//!
//! # Invariants
//! - Two actors per row: the sender creates, only the receiver changes
//!   `status`.

use crate::access::{RowView, UserId};
use crate::model::activity::ActivityId;
use serde::{Deserialize, Serialize};

pub type InboxId = i64;

/// Inbox message state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboxStatus {
    #[default]
    Unread,
    Archived,
}

impl InboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unread => "UNREAD",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "UNREAD" => Some(Self::Unread),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Persisted `inbox` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: InboxId,
    pub created_ts: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: InboxStatus,
    /// JSON text.
    pub message: String,
}

impl InboxMessage {
    pub fn row_view(&self) -> RowView {
        RowView::Inbox {
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
        }
    }
}

/// Creation input for one inbox message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInboxMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub message: String,
}

impl NewInboxMessage {
    pub fn new(sender_id: UserId, receiver_id: UserId, message: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            message: message.into(),
        }
    }

    pub fn row_view(&self) -> RowView {
        RowView::Inbox {
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
        }
    }
}

/// Kind of notification carried by an inbox message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboxMessageType {
    MemoComment,
}

/// JSON body stored in `inbox.message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMessageBody {
    #[serde(rename = "type")]
    pub kind: InboxMessageType,
    /// Activity that produced this notification.
    pub activity_id: Option<ActivityId>,
}
