//! Memo comment and pin use-cases.
//!
//! # Responsibility
//! - Create comment memos linked to their parent via a `COMMENT` relation.
//! - Notify the parent's creator through an activity plus an inbox message.
//! - Manage the acting user's per-memo pin state.
//!
//! # Invariants
//! - Every step runs through guarded repositories bound to the service's
//!   single acting identity.
//! - The writes of one comment commit together or not at all.
//! - A comment inherits its parent's visibility.
//! - Commenting on one's own memo records no activity and sends no message.

use crate::access::{Identity, IdentityContext};
use crate::model::activity::{
    Activity, ActivityPayload, MemoCommentPayload, NewActivity, ACTIVITY_TYPE_MEMO_COMMENT,
};
use crate::model::inbox::{InboxMessage, InboxMessageBody, InboxMessageType, NewInboxMessage};
use crate::model::memo::{Memo, MemoId, MemoOrganizer, MemoRelation, NewMemo, RelationType};
use crate::repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
use crate::repo::inbox_repo::{InboxRepository, SqliteInboxRepository};
use crate::repo::memo_repo::{MemoRepository, SqliteMemoRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for memo use-cases.
#[derive(Debug)]
pub enum MemoServiceError {
    /// No acting identity was supplied.
    Unauthenticated,
    /// Target memo does not exist or is hidden from the acting identity.
    MemoNotFound(MemoId),
    /// Persistence-layer failure or rejection.
    Repo(RepoError),
    /// Notification payload could not be encoded.
    Payload(serde_json::Error),
}

impl Display for MemoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "authentication required"),
            Self::MemoNotFound(id) => write!(f, "memo not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Payload(err) => write!(f, "invalid notification payload: {err}"),
        }
    }
}

impl Error for MemoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Payload(err) => Some(err),
            Self::Unauthenticated | Self::MemoNotFound(_) => None,
        }
    }
}

impl From<RepoError> for MemoServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for MemoServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Payload(value)
    }
}

/// Result of one comment creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentOutcome {
    pub comment: Memo,
    /// Present when the parent belongs to someone else.
    pub activity: Option<Activity>,
    /// Present when the parent belongs to someone else.
    pub notification: Option<InboxMessage>,
}

/// Memo service facade over guarded repositories on one connection.
pub struct MemoService<'conn> {
    conn: &'conn Connection,
    actor: Option<Identity>,
    memos: SqliteMemoRepository<'conn>,
    activities: SqliteActivityRepository<'conn>,
    inbox: SqliteInboxRepository<'conn>,
}

impl<'conn> MemoService<'conn> {
    /// Creates a service whose repositories all act as `ctx`'s identity.
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        let actor = ctx.current_identity();
        Self {
            conn,
            actor,
            memos: SqliteMemoRepository::new(conn, &actor),
            activities: SqliteActivityRepository::new(conn, &actor),
            inbox: SqliteInboxRepository::new(conn, &actor),
        }
    }

    /// Creates a comment on `parent_id` and notifies the parent's creator.
    ///
    /// Runs in one `IMMEDIATE` transaction, or joins the caller's open
    /// transaction on the same connection.
    pub fn create_comment(
        &self,
        parent_id: MemoId,
        content: impl Into<String>,
    ) -> Result<CommentOutcome, MemoServiceError> {
        let actor = self.require_actor()?;
        let tx = if self.conn.is_autocommit() {
            Some(
                Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
                    .map_err(RepoError::from)?,
            )
        } else {
            None
        };

        let outcome = match self.write_comment(actor, parent_id, content.into()) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "event=memo_comment module=service status=rollback parent_id={} error={}",
                    parent_id, err
                );
                return Err(err);
            }
        };
        if let Some(tx) = tx {
            tx.commit().map_err(RepoError::from)?;
        }

        info!(
            "event=memo_comment module=service status=ok memo_id={} parent_id={} notified={}",
            outcome.comment.id,
            parent_id,
            outcome.notification.is_some()
        );
        Ok(outcome)
    }

    fn write_comment(
        &self,
        actor: Identity,
        parent_id: MemoId,
        content: String,
    ) -> Result<CommentOutcome, MemoServiceError> {
        let parent = self
            .memos
            .get_memo(parent_id)?
            .ok_or(MemoServiceError::MemoNotFound(parent_id))?;

        let comment = self.memos.create_memo(
            &NewMemo::new(actor.user_id, content).with_visibility(parent.visibility),
        )?;
        self.memos.create_relation(&MemoRelation::new(
            comment.id,
            parent.id,
            RelationType::Comment,
        ))?;

        if parent.creator_id == actor.user_id {
            return Ok(CommentOutcome {
                comment,
                activity: None,
                notification: None,
            });
        }

        let payload = ActivityPayload {
            memo_comment: Some(MemoCommentPayload {
                memo_id: comment.id,
                related_memo_id: parent.id,
            }),
        };
        let activity = self.activities.create_activity(&NewActivity::new(
            actor.user_id,
            ACTIVITY_TYPE_MEMO_COMMENT,
            serde_json::to_string(&payload)?,
        ))?;

        let body = InboxMessageBody {
            kind: InboxMessageType::MemoComment,
            activity_id: Some(activity.id),
        };
        let notification = self.inbox.create_message(&NewInboxMessage::new(
            actor.user_id,
            parent.creator_id,
            serde_json::to_string(&body)?,
        ))?;

        Ok(CommentOutcome {
            comment,
            activity: Some(activity),
            notification: Some(notification),
        })
    }

    /// Lists visible comments on `parent_id`, oldest first.
    pub fn list_comments(&self, parent_id: MemoId) -> Result<Vec<Memo>, MemoServiceError> {
        let parent = self
            .memos
            .get_memo(parent_id)?
            .ok_or(MemoServiceError::MemoNotFound(parent_id))?;

        let mut comments = Vec::new();
        for relation in self.memos.list_relations(parent.id)? {
            if relation.kind != RelationType::Comment || relation.related_memo_id != parent.id {
                continue;
            }
            if let Some(comment) = self.memos.get_memo(relation.memo_id)? {
                comments.push(comment);
            }
        }
        comments.sort_by(|left, right| {
            left.created_ts
                .cmp(&right.created_ts)
                .then(left.id.cmp(&right.id))
        });
        Ok(comments)
    }

    /// Pins or unpins a visible memo for the acting user only.
    pub fn set_pinned(&self, memo_id: MemoId, pinned: bool) -> Result<(), MemoServiceError> {
        let actor = self.require_actor()?;
        let memo = self
            .memos
            .get_memo(memo_id)?
            .ok_or(MemoServiceError::MemoNotFound(memo_id))?;
        self.memos.upsert_organizer(&MemoOrganizer {
            memo_id: memo.id,
            user_id: actor.user_id,
            pinned,
        })?;
        Ok(())
    }

    /// Returns whether the acting user pinned `memo_id`.
    pub fn is_pinned(&self, memo_id: MemoId) -> Result<bool, MemoServiceError> {
        let actor = self.require_actor()?;
        Ok(self
            .memos
            .get_organizer(memo_id, actor.user_id)?
            .is_some_and(|organizer| organizer.pinned))
    }

    fn require_actor(&self) -> Result<Identity, MemoServiceError> {
        self.actor.ok_or(MemoServiceError::Unauthenticated)
    }
}
