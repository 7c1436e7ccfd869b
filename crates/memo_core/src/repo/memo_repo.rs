//! Memo, memo organizer and memo relation repository.
//!
//! # Responsibility
//! - Provide guarded CRUD over `memo` and its satellite tables.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Memo reads return only rows the acting identity may `Select`
//!   (own memos plus `PUBLIC` ones).
//! - `creator_id` is written once by `create_memo` and never updated.
//! - Organizer rows are self-asserted: `user_id` must be the acting identity.

use crate::access::{EntityKind, IdentityContext, Operation, UserId, Visibility};
use crate::model::common::RowStatus;
use crate::model::memo::{
    Memo, MemoId, MemoOrganizer, MemoPatch, MemoRelation, NewMemo, RelationType,
};
use crate::repo::guard::AccessGuard;
use crate::repo::{bool_to_int, int_to_bool, paginate, parse_enum, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const MEMO_SELECT_SQL: &str = "SELECT
    id,
    uid,
    creator_id,
    created_ts,
    updated_ts,
    row_status,
    content,
    visibility,
    pinned
FROM memo";

/// Query options for listing memos.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoListQuery {
    pub creator_id: Option<UserId>,
    pub visibility: Option<Visibility>,
    pub include_archived: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for memos and their per-user/relation metadata.
pub trait MemoRepository {
    fn create_memo(&self, memo: &NewMemo) -> RepoResult<Memo>;
    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>>;
    fn get_memo_by_uid(&self, uid: &str) -> RepoResult<Option<Memo>>;
    /// Lists readable memos ordered by `created_ts DESC, id DESC`.
    fn list_memos(&self, query: &MemoListQuery) -> RepoResult<Vec<Memo>>;
    fn update_memo(&self, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo>;
    fn delete_memo(&self, id: MemoId) -> RepoResult<()>;

    fn upsert_organizer(&self, organizer: &MemoOrganizer) -> RepoResult<()>;
    fn get_organizer(&self, memo_id: MemoId, user_id: UserId)
        -> RepoResult<Option<MemoOrganizer>>;
    fn delete_organizer(&self, memo_id: MemoId, user_id: UserId) -> RepoResult<()>;

    fn create_relation(&self, relation: &MemoRelation) -> RepoResult<()>;
    /// Lists relations where `memo_id` is either endpoint.
    fn list_relations(&self, memo_id: MemoId) -> RepoResult<Vec<MemoRelation>>;
    fn delete_relation(&self, relation: &MemoRelation) -> RepoResult<()>;
}

/// SQLite-backed memo repository bound to one acting identity.
pub struct SqliteMemoRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteMemoRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_memo(&self, id: MemoId) -> RepoResult<Option<Memo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMO_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_memo_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_organizer(&self, memo_id: MemoId, user_id: UserId) -> RepoResult<Option<MemoOrganizer>> {
        let stored = self
            .conn
            .query_row(
                "SELECT memo_id, user_id, pinned FROM memo_organizer
                 WHERE memo_id = ?1 AND user_id = ?2;",
                params![memo_id, user_id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?)),
            )
            .optional()?;
        match stored {
            Some((memo_id, user_id, pinned)) => Ok(Some(MemoOrganizer {
                memo_id,
                user_id,
                pinned: int_to_bool(pinned, "memo_organizer.pinned")?,
            })),
            None => Ok(None),
        }
    }
}

impl MemoRepository for SqliteMemoRepository<'_> {
    fn create_memo(&self, memo: &NewMemo) -> RepoResult<Memo> {
        memo.validate()?;
        self.guard.require_insert(&memo.row_view())?;

        self.conn.execute(
            "INSERT INTO memo (uid, creator_id, content, visibility)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                memo.uid,
                memo.creator_id,
                memo.content,
                memo.visibility.as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_memo(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Memo, id))
    }

    fn get_memo(&self, id: MemoId) -> RepoResult<Option<Memo>> {
        Ok(self
            .find_memo(id)?
            .filter(|memo| self.guard.can_read(&memo.row_view())))
    }

    fn get_memo_by_uid(&self, uid: &str) -> RepoResult<Option<Memo>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEMO_SELECT_SQL} WHERE uid = ?1;"))?;
        let mut rows = stmt.query(params![uid])?;
        let memo = match rows.next()? {
            Some(row) => Some(parse_memo_row(row)?),
            None => None,
        };
        Ok(memo.filter(|memo| self.guard.can_read(&memo.row_view())))
    }

    fn list_memos(&self, query: &MemoListQuery) -> RepoResult<Vec<Memo>> {
        let mut sql = format!("{MEMO_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_archived {
            sql.push_str(" AND row_status = 'NORMAL'");
        }
        if let Some(creator_id) = query.creator_id {
            sql.push_str(" AND creator_id = ?");
            bind_values.push(Value::Integer(creator_id));
        }
        if let Some(visibility) = query.visibility {
            sql.push_str(" AND visibility = ?");
            bind_values.push(Value::Text(visibility.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_ts DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push(parse_memo_row(row)?);
        }

        let readable = self.guard.filter_readable(memos, Memo::row_view);
        Ok(paginate(readable, query.limit, query.offset))
    }

    fn update_memo(&self, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo> {
        let current = self
            .find_memo(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Memo, id))?;
        let proposed = patch.apply_to(&current);
        self.guard
            .require_update(&current.row_view(), &proposed.row_view(), id)?;

        self.conn.execute(
            "UPDATE memo
             SET
                content = ?2,
                visibility = ?3,
                row_status = ?4,
                pinned = ?5,
                updated_ts = strftime('%s', 'now')
             WHERE id = ?1;",
            params![
                id,
                proposed.content,
                proposed.visibility.as_str(),
                proposed.row_status.as_str(),
                bool_to_int(proposed.pinned),
            ],
        )?;

        self.find_memo(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Memo, id))
    }

    fn delete_memo(&self, id: MemoId) -> RepoResult<()> {
        let current = self
            .find_memo(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Memo, id))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), id)?;
        self.conn
            .execute("DELETE FROM memo WHERE id = ?1;", params![id])?;
        Ok(())
    }

    fn upsert_organizer(&self, organizer: &MemoOrganizer) -> RepoResult<()> {
        let key = format!("{}/{}", organizer.memo_id, organizer.user_id);
        match self.find_organizer(organizer.memo_id, organizer.user_id)? {
            Some(current) => {
                self.guard
                    .require_update(&current.row_view(), &organizer.row_view(), key)?;
                self.conn.execute(
                    "UPDATE memo_organizer SET pinned = ?3 WHERE memo_id = ?1 AND user_id = ?2;",
                    params![
                        organizer.memo_id,
                        organizer.user_id,
                        bool_to_int(organizer.pinned)
                    ],
                )?;
            }
            None => {
                self.guard.require_insert(&organizer.row_view())?;
                self.conn.execute(
                    "INSERT INTO memo_organizer (memo_id, user_id, pinned) VALUES (?1, ?2, ?3);",
                    params![
                        organizer.memo_id,
                        organizer.user_id,
                        bool_to_int(organizer.pinned)
                    ],
                )?;
            }
        }
        Ok(())
    }

    fn get_organizer(
        &self,
        memo_id: MemoId,
        user_id: UserId,
    ) -> RepoResult<Option<MemoOrganizer>> {
        Ok(self
            .find_organizer(memo_id, user_id)?
            .filter(|organizer| self.guard.can_read(&organizer.row_view())))
    }

    fn delete_organizer(&self, memo_id: MemoId, user_id: UserId) -> RepoResult<()> {
        let key = format!("{memo_id}/{user_id}");
        let current = self
            .find_organizer(memo_id, user_id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::MemoOrganizer, &key))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), &key)?;
        self.conn.execute(
            "DELETE FROM memo_organizer WHERE memo_id = ?1 AND user_id = ?2;",
            params![memo_id, user_id],
        )?;
        Ok(())
    }

    fn create_relation(&self, relation: &MemoRelation) -> RepoResult<()> {
        relation.validate()?;
        self.guard.require_insert(&relation.row_view())?;
        self.conn.execute(
            "INSERT OR IGNORE INTO memo_relation (memo_id, related_memo_id, type)
             VALUES (?1, ?2, ?3);",
            params![
                relation.memo_id,
                relation.related_memo_id,
                relation.kind.as_str()
            ],
        )?;
        Ok(())
    }

    fn list_relations(&self, memo_id: MemoId) -> RepoResult<Vec<MemoRelation>> {
        let mut stmt = self.conn.prepare(
            "SELECT memo_id, related_memo_id, type FROM memo_relation
             WHERE memo_id = ?1 OR related_memo_id = ?1
             ORDER BY memo_id ASC, related_memo_id ASC, type ASC;",
        )?;
        let mut rows = stmt.query(params![memo_id])?;
        let mut relations = Vec::new();
        while let Some(row) = rows.next()? {
            let kind_text: String = row.get(2)?;
            relations.push(MemoRelation {
                memo_id: row.get(0)?,
                related_memo_id: row.get(1)?,
                kind: parse_enum(&kind_text, "memo_relation.type", RelationType::parse)?,
            });
        }
        Ok(self.guard.filter_readable(relations, MemoRelation::row_view))
    }

    fn delete_relation(&self, relation: &MemoRelation) -> RepoResult<()> {
        let key = format!(
            "{}/{}/{}",
            relation.memo_id,
            relation.related_memo_id,
            relation.kind.as_str()
        );
        self.guard
            .require_existing(Operation::Delete, &relation.row_view(), &key)?;
        let changed = self.conn.execute(
            "DELETE FROM memo_relation
             WHERE memo_id = ?1 AND related_memo_id = ?2 AND type = ?3;",
            params![
                relation.memo_id,
                relation.related_memo_id,
                relation.kind.as_str()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::MemoRelation, key));
        }
        Ok(())
    }
}

fn parse_memo_row(row: &Row<'_>) -> RepoResult<Memo> {
    let status_text: String = row.get("row_status")?;
    let visibility_text: String = row.get("visibility")?;

    Ok(Memo {
        id: row.get("id")?,
        uid: row.get("uid")?,
        creator_id: row.get("creator_id")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        row_status: parse_enum(&status_text, "memo.row_status", RowStatus::parse)?,
        content: row.get("content")?,
        visibility: parse_enum(&visibility_text, "memo.visibility", Visibility::parse)?,
        pinned: int_to_bool(row.get("pinned")?, "memo.pinned")?,
    })
}
