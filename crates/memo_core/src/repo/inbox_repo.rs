//! Inbox repository.
//!
//! # Responsibility
//! - Deliver messages from a sender to a receiver.
//! - Let the receiver mark messages read/archived.
//!
//! # Invariants
//! - Only the two participants see a message.
//! - Only the sender creates a message; only the receiver changes it.
//! - Messages are never deleted through this layer.

use crate::access::{EntityKind, IdentityContext};
use crate::model::inbox::{InboxId, InboxMessage, InboxStatus, NewInboxMessage};
use crate::repo::guard::AccessGuard;
use crate::repo::{paginate, parse_enum, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const INBOX_SELECT_SQL: &str = "SELECT
    id,
    created_ts,
    sender_id,
    receiver_id,
    status,
    message
FROM inbox";

/// Query options for listing inbox messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboxListQuery {
    pub status: Option<InboxStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait InboxRepository {
    fn create_message(&self, message: &NewInboxMessage) -> RepoResult<InboxMessage>;
    fn get_message(&self, id: InboxId) -> RepoResult<Option<InboxMessage>>;
    /// Lists messages the acting identity sent or received, newest first.
    fn list_messages(&self, query: &InboxListQuery) -> RepoResult<Vec<InboxMessage>>;
    fn update_status(&self, id: InboxId, status: InboxStatus) -> RepoResult<InboxMessage>;
}

pub struct SqliteInboxRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteInboxRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_message(&self, id: InboxId) -> RepoResult<Option<InboxMessage>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{INBOX_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_inbox_row(row)?)),
            None => Ok(None),
        }
    }
}

impl InboxRepository for SqliteInboxRepository<'_> {
    fn create_message(&self, message: &NewInboxMessage) -> RepoResult<InboxMessage> {
        self.guard.require_insert(&message.row_view())?;

        self.conn.execute(
            "INSERT INTO inbox (sender_id, receiver_id, message) VALUES (?1, ?2, ?3);",
            params![message.sender_id, message.receiver_id, message.message],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_message(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Inbox, id))
    }

    fn get_message(&self, id: InboxId) -> RepoResult<Option<InboxMessage>> {
        Ok(self
            .find_message(id)?
            .filter(|message| self.guard.can_read(&message.row_view())))
    }

    fn list_messages(&self, query: &InboxListQuery) -> RepoResult<Vec<InboxMessage>> {
        let mut sql = format!("{INBOX_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_ts DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_inbox_row(row)?);
        }

        let readable = self.guard.filter_readable(messages, InboxMessage::row_view);
        Ok(paginate(readable, query.limit, query.offset))
    }

    fn update_status(&self, id: InboxId, status: InboxStatus) -> RepoResult<InboxMessage> {
        let current = self
            .find_message(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Inbox, id))?;
        self.guard
            .require_update(&current.row_view(), &current.row_view(), id)?;

        self.conn.execute(
            "UPDATE inbox SET status = ?2 WHERE id = ?1;",
            params![id, status.as_str()],
        )?;

        self.find_message(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Inbox, id))
    }
}

fn parse_inbox_row(row: &Row<'_>) -> RepoResult<InboxMessage> {
    let status_text: String = row.get("status")?;
    Ok(InboxMessage {
        id: row.get("id")?,
        created_ts: row.get("created_ts")?,
        sender_id: row.get("sender_id")?,
        receiver_id: row.get("receiver_id")?,
        status: parse_enum(&status_text, "inbox.status", InboxStatus::parse)?,
        message: row.get("message")?,
    })
}
