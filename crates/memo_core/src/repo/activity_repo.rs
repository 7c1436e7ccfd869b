//! Activity log repository.
//!
//! # Invariants
//! - Activities are readable and writable only by their creator.
//! - Rows are never updated in place.

use crate::access::{EntityKind, IdentityContext, Operation};
use crate::model::activity::{Activity, ActivityId, ActivityLevel, NewActivity};
use crate::repo::guard::AccessGuard;
use crate::repo::{paginate, parse_enum, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

pub trait ActivityRepository {
    fn create_activity(&self, activity: &NewActivity) -> RepoResult<Activity>;
    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>>;
    /// Lists readable activities newest first.
    fn list_activities(&self, limit: Option<u32>, offset: u32) -> RepoResult<Vec<Activity>>;
    fn delete_activity(&self, id: ActivityId) -> RepoResult<()>;
}

pub struct SqliteActivityRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteActivityRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        let stored = self
            .conn
            .query_row(
                "SELECT id, creator_id, created_ts, type, level, payload
                 FROM activity WHERE id = ?1;",
                params![id],
                read_columns,
            )
            .optional()?;
        stored.map(into_activity).transpose()
    }
}

impl ActivityRepository for SqliteActivityRepository<'_> {
    fn create_activity(&self, activity: &NewActivity) -> RepoResult<Activity> {
        activity.validate()?;
        self.guard.require_insert(&activity.row_view())?;

        self.conn.execute(
            "INSERT INTO activity (creator_id, type, level, payload) VALUES (?1, ?2, ?3, ?4);",
            params![
                activity.creator_id,
                activity.kind,
                activity.level.as_str(),
                activity.payload,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_activity(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Activity, id))
    }

    fn get_activity(&self, id: ActivityId) -> RepoResult<Option<Activity>> {
        Ok(self
            .find_activity(id)?
            .filter(|activity| self.guard.can_read(&activity.row_view())))
    }

    fn list_activities(&self, limit: Option<u32>, offset: u32) -> RepoResult<Vec<Activity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, creator_id, created_ts, type, level, payload
             FROM activity
             ORDER BY created_ts DESC, id DESC;",
        )?;
        let stored = stmt
            .query_map([], read_columns)?
            .collect::<Result<Vec<_>, _>>()?;
        let activities = stored
            .into_iter()
            .map(into_activity)
            .collect::<RepoResult<Vec<_>>>()?;

        let readable = self.guard.filter_readable(activities, Activity::row_view);
        Ok(paginate(readable, limit, offset))
    }

    fn delete_activity(&self, id: ActivityId) -> RepoResult<()> {
        let current = self
            .find_activity(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Activity, id))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), id)?;
        self.conn
            .execute("DELETE FROM activity WHERE id = ?1;", params![id])?;
        Ok(())
    }
}

type ActivityColumns = (i64, i64, i64, String, String, String);

fn read_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActivityColumns> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_activity(columns: ActivityColumns) -> RepoResult<Activity> {
    let (id, creator_id, created_ts, kind, level_text, payload) = columns;
    Ok(Activity {
        id,
        creator_id,
        created_ts,
        kind,
        level: parse_enum(&level_text, "activity.level", ActivityLevel::parse)?,
        payload,
    })
}
