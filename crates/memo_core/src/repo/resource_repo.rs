//! Attachment repository.
//!
//! # Invariants
//! - Resources are private to their creator for every operation.
//! - `creator_id` is fixed at insert time.

use crate::access::{EntityKind, IdentityContext, Operation};
use crate::model::memo::MemoId;
use crate::model::resource::{NewResource, Resource, ResourceId, ResourcePatch, StorageType};
use crate::repo::guard::AccessGuard;
use crate::repo::{paginate, parse_enum, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const RESOURCE_SELECT_SQL: &str = "SELECT
    id,
    uid,
    creator_id,
    created_ts,
    updated_ts,
    filename,
    blob,
    type,
    size,
    memo_id,
    storage_type,
    reference
FROM resource";

/// Query options for listing attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceListQuery {
    pub memo_id: Option<MemoId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

pub trait ResourceRepository {
    fn create_resource(&self, resource: &NewResource) -> RepoResult<Resource>;
    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>>;
    fn get_resource_by_uid(&self, uid: &str) -> RepoResult<Option<Resource>>;
    /// Lists readable resources ordered by `created_ts DESC, id DESC`.
    fn list_resources(&self, query: &ResourceListQuery) -> RepoResult<Vec<Resource>>;
    fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> RepoResult<Resource>;
    fn delete_resource(&self, id: ResourceId) -> RepoResult<()>;
}

/// SQLite-backed attachment repository bound to one acting identity.
pub struct SqliteResourceRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteResourceRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_one(&self, column: &str, value: Value) -> RepoResult<Option<Resource>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RESOURCE_SELECT_SQL} WHERE {column} = ?1;"))?;
        let mut rows = stmt.query(params![value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_resource_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        self.find_one("id", Value::Integer(id))
    }
}

impl ResourceRepository for SqliteResourceRepository<'_> {
    fn create_resource(&self, resource: &NewResource) -> RepoResult<Resource> {
        resource.validate()?;
        self.guard.require_insert(&resource.row_view())?;

        self.conn.execute(
            "INSERT INTO resource (
                uid,
                creator_id,
                filename,
                blob,
                type,
                size,
                memo_id,
                storage_type,
                reference
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                resource.uid,
                resource.creator_id,
                resource.filename,
                resource.blob,
                resource.mime_type,
                resource.size,
                resource.memo_id,
                resource.storage_type.as_str(),
                resource.reference,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_resource(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Resource, id))
    }

    fn get_resource(&self, id: ResourceId) -> RepoResult<Option<Resource>> {
        Ok(self
            .find_resource(id)?
            .filter(|resource| self.guard.can_read(&resource.row_view())))
    }

    fn get_resource_by_uid(&self, uid: &str) -> RepoResult<Option<Resource>> {
        Ok(self
            .find_one("uid", Value::Text(uid.to_string()))?
            .filter(|resource| self.guard.can_read(&resource.row_view())))
    }

    fn list_resources(&self, query: &ResourceListQuery) -> RepoResult<Vec<Resource>> {
        let mut sql = RESOURCE_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(memo_id) = query.memo_id {
            sql.push_str(" WHERE memo_id = ?");
            bind_values.push(Value::Integer(memo_id));
        }
        sql.push_str(" ORDER BY created_ts DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut resources = Vec::new();
        while let Some(row) = rows.next()? {
            resources.push(parse_resource_row(row)?);
        }

        let readable = self.guard.filter_readable(resources, Resource::row_view);
        Ok(paginate(readable, query.limit, query.offset))
    }

    fn update_resource(&self, id: ResourceId, patch: &ResourcePatch) -> RepoResult<Resource> {
        patch.validate()?;
        let current = self
            .find_resource(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Resource, id))?;
        let proposed = patch.apply_to(&current);
        self.guard
            .require_update(&current.row_view(), &proposed.row_view(), id)?;

        self.conn.execute(
            "UPDATE resource
             SET
                filename = ?2,
                memo_id = ?3,
                reference = ?4,
                updated_ts = strftime('%s', 'now')
             WHERE id = ?1;",
            params![id, proposed.filename, proposed.memo_id, proposed.reference],
        )?;

        self.find_resource(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Resource, id))
    }

    fn delete_resource(&self, id: ResourceId) -> RepoResult<()> {
        let current = self
            .find_resource(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::Resource, id))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), id)?;
        self.conn
            .execute("DELETE FROM resource WHERE id = ?1;", params![id])?;
        Ok(())
    }
}

fn parse_resource_row(row: &Row<'_>) -> RepoResult<Resource> {
    let storage_text: String = row.get("storage_type")?;

    Ok(Resource {
        id: row.get("id")?,
        uid: row.get("uid")?,
        creator_id: row.get("creator_id")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        filename: row.get("filename")?,
        blob: row.get("blob")?,
        mime_type: row.get("type")?,
        size: row.get("size")?,
        memo_id: row.get("memo_id")?,
        storage_type: parse_enum(&storage_text, "resource.storage_type", StorageType::parse)?,
        reference: row.get("reference")?,
    })
}
