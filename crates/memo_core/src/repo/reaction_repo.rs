//! Reaction repository.
//!
//! # Invariants
//! - Any authenticated identity reads reactions; writes stay with the creator.
//! - One row per `(creator_id, content_id, reaction_type)`; repeats are no-ops.

use crate::access::{EntityKind, IdentityContext, Operation};
use crate::model::reaction::{NewReaction, Reaction, ReactionId};
use crate::repo::guard::AccessGuard;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait ReactionRepository {
    /// Inserts a reaction, returning the existing row on repeats.
    fn upsert_reaction(&self, reaction: &NewReaction) -> RepoResult<Reaction>;
    /// Lists readable reactions on one content name, oldest first.
    fn list_reactions(&self, content_id: &str) -> RepoResult<Vec<Reaction>>;
    fn delete_reaction(&self, id: ReactionId) -> RepoResult<()>;
}

pub struct SqliteReactionRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteReactionRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_reaction(&self, id: ReactionId) -> RepoResult<Option<Reaction>> {
        let reaction = self
            .conn
            .query_row(
                "SELECT id, created_ts, creator_id, content_id, reaction_type
                 FROM reaction WHERE id = ?1;",
                params![id],
                parse_reaction_row,
            )
            .optional()?;
        Ok(reaction)
    }
}

impl ReactionRepository for SqliteReactionRepository<'_> {
    fn upsert_reaction(&self, reaction: &NewReaction) -> RepoResult<Reaction> {
        reaction.validate()?;
        self.guard.require_insert(&reaction.row_view())?;

        self.conn.execute(
            "INSERT OR IGNORE INTO reaction (creator_id, content_id, reaction_type)
             VALUES (?1, ?2, ?3);",
            params![reaction.creator_id, reaction.content_id, reaction.reaction_type],
        )?;

        let stored = self
            .conn
            .query_row(
                "SELECT id, created_ts, creator_id, content_id, reaction_type
                 FROM reaction
                 WHERE creator_id = ?1 AND content_id = ?2 AND reaction_type = ?3;",
                params![reaction.creator_id, reaction.content_id, reaction.reaction_type],
                parse_reaction_row,
            )
            .optional()?;
        stored.ok_or_else(|| {
            RepoError::not_found(
                EntityKind::Reaction,
                format!("{}/{}", reaction.content_id, reaction.reaction_type),
            )
        })
    }

    fn list_reactions(&self, content_id: &str) -> RepoResult<Vec<Reaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_ts, creator_id, content_id, reaction_type
             FROM reaction
             WHERE content_id = ?1
             ORDER BY created_ts ASC, id ASC;",
        )?;
        let reactions = stmt
            .query_map(params![content_id], parse_reaction_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.guard.filter_readable(reactions, Reaction::row_view))
    }

    fn delete_reaction(&self, id: ReactionId) -> RepoResult<()> {
        let current = self
            .find_reaction(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Reaction, id))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), id)?;
        self.conn
            .execute("DELETE FROM reaction WHERE id = ?1;", params![id])?;
        Ok(())
    }
}

fn parse_reaction_row(row: &Row<'_>) -> rusqlite::Result<Reaction> {
    Ok(Reaction {
        id: row.get(0)?,
        created_ts: row.get(1)?,
        creator_id: row.get(2)?,
        content_id: row.get(3)?,
        reaction_type: row.get(4)?,
    })
}
