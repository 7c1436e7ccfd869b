//! Instance-wide configuration repository.
//!
//! # Responsibility
//! - Guard system settings, identity providers and migration history.
//!
//! # Invariants
//! - Any authenticated identity reads settings and identity providers.
//! - Writes, and every migration history access, need an administrator.

use crate::access::{EntityKind, IdentityContext, Operation, RowView};
use crate::model::system::{
    IdentityProvider, IdentityProviderId, IdentityProviderType, MigrationRecord,
    NewIdentityProvider, SystemSetting,
};
use crate::repo::guard::AccessGuard;
use crate::repo::{parse_enum, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait SystemRepository {
    fn get_system_setting(&self, name: &str) -> RepoResult<Option<SystemSetting>>;
    fn list_system_settings(&self) -> RepoResult<Vec<SystemSetting>>;
    /// Inserts or replaces one setting keyed by `name`.
    fn upsert_system_setting(&self, setting: &SystemSetting) -> RepoResult<()>;
    fn delete_system_setting(&self, name: &str) -> RepoResult<()>;

    fn create_identity_provider(
        &self,
        provider: &NewIdentityProvider,
    ) -> RepoResult<IdentityProvider>;
    fn get_identity_provider(&self, id: IdentityProviderId)
        -> RepoResult<Option<IdentityProvider>>;
    fn list_identity_providers(&self) -> RepoResult<Vec<IdentityProvider>>;
    /// Replaces every mutable column of one provider.
    fn update_identity_provider(&self, provider: &IdentityProvider) -> RepoResult<()>;
    fn delete_identity_provider(&self, id: IdentityProviderId) -> RepoResult<()>;

    /// Lists applied migrations in apply order.
    fn list_migration_history(&self) -> RepoResult<Vec<MigrationRecord>>;
}

pub struct SqliteSystemRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteSystemRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_setting(&self, name: &str) -> RepoResult<Option<SystemSetting>> {
        let setting = self
            .conn
            .query_row(
                "SELECT name, value, description FROM system_setting WHERE name = ?1;",
                params![name],
                parse_setting_row,
            )
            .optional()?;
        Ok(setting)
    }

    fn find_provider(&self, id: IdentityProviderId) -> RepoResult<Option<IdentityProvider>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, type, identifier_filter, config FROM idp WHERE id = ?1;",
        )?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_provider_row(row)?)),
            None => Ok(None),
        }
    }
}

impl SystemRepository for SqliteSystemRepository<'_> {
    fn get_system_setting(&self, name: &str) -> RepoResult<Option<SystemSetting>> {
        Ok(self
            .find_setting(name)?
            .filter(|setting| self.guard.can_read(&setting.row_view())))
    }

    fn list_system_settings(&self) -> RepoResult<Vec<SystemSetting>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, value, description FROM system_setting ORDER BY name ASC;",
        )?;
        let settings = stmt
            .query_map([], parse_setting_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.guard.filter_readable(settings, SystemSetting::row_view))
    }

    fn upsert_system_setting(&self, setting: &SystemSetting) -> RepoResult<()> {
        setting.validate()?;
        match self.find_setting(&setting.name)? {
            Some(current) => self.guard.require_update(
                &current.row_view(),
                &setting.row_view(),
                &setting.name,
            )?,
            None => self.guard.require_insert(&setting.row_view())?,
        }

        self.conn.execute(
            "INSERT INTO system_setting (name, value, description)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                description = excluded.description;",
            params![setting.name, setting.value, setting.description],
        )?;
        Ok(())
    }

    fn delete_system_setting(&self, name: &str) -> RepoResult<()> {
        let current = self
            .find_setting(name)?
            .ok_or_else(|| RepoError::not_found(EntityKind::SystemSetting, name))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), name)?;
        self.conn
            .execute("DELETE FROM system_setting WHERE name = ?1;", params![name])?;
        Ok(())
    }

    fn create_identity_provider(
        &self,
        provider: &NewIdentityProvider,
    ) -> RepoResult<IdentityProvider> {
        provider.validate()?;
        self.guard.require_insert(&RowView::IdentityProvider)?;

        self.conn.execute(
            "INSERT INTO idp (name, type, identifier_filter, config) VALUES (?1, ?2, ?3, ?4);",
            params![
                provider.name,
                provider.kind.as_str(),
                provider.identifier_filter,
                provider.config,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.find_provider(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::IdentityProvider, id))
    }

    fn get_identity_provider(
        &self,
        id: IdentityProviderId,
    ) -> RepoResult<Option<IdentityProvider>> {
        Ok(self
            .find_provider(id)?
            .filter(|provider| self.guard.can_read(&provider.row_view())))
    }

    fn list_identity_providers(&self) -> RepoResult<Vec<IdentityProvider>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, type, identifier_filter, config FROM idp ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut providers = Vec::new();
        while let Some(row) = rows.next()? {
            providers.push(parse_provider_row(row)?);
        }
        Ok(self.guard.filter_readable(providers, IdentityProvider::row_view))
    }

    fn update_identity_provider(&self, provider: &IdentityProvider) -> RepoResult<()> {
        let current = self
            .find_provider(provider.id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::IdentityProvider, provider.id))?;
        self.guard
            .require_update(&current.row_view(), &provider.row_view(), provider.id)?;

        self.conn.execute(
            "UPDATE idp
             SET name = ?2, type = ?3, identifier_filter = ?4, config = ?5
             WHERE id = ?1;",
            params![
                provider.id,
                provider.name,
                provider.kind.as_str(),
                provider.identifier_filter,
                provider.config,
            ],
        )?;
        Ok(())
    }

    fn delete_identity_provider(&self, id: IdentityProviderId) -> RepoResult<()> {
        let current = self
            .find_provider(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::IdentityProvider, id))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), id)?;
        self.conn
            .execute("DELETE FROM idp WHERE id = ?1;", params![id])?;
        Ok(())
    }

    fn list_migration_history(&self) -> RepoResult<Vec<MigrationRecord>> {
        if !self.guard.can_read(&RowView::MigrationHistory) {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "SELECT version, created_ts FROM migration_history ORDER BY version ASC;",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(MigrationRecord {
                    version: row.get(0)?,
                    created_ts: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn parse_setting_row(row: &Row<'_>) -> rusqlite::Result<SystemSetting> {
    Ok(SystemSetting {
        name: row.get(0)?,
        value: row.get(1)?,
        description: row.get(2)?,
    })
}

fn parse_provider_row(row: &Row<'_>) -> RepoResult<IdentityProvider> {
    let kind_text: String = row.get(2)?;
    Ok(IdentityProvider {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: parse_enum(&kind_text, "idp.type", IdentityProviderType::parse)?,
        identifier_filter: row.get(3)?,
        config: row.get(4)?,
    })
}
