//! User and user-setting repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Expose account reads, self-service profile updates and per-user
//!   key/value settings.
//! - Provide host-side entry points for account provisioning and identity
//!   resolution.
//!
//! # Invariants
//! - Account reads require an authenticated identity.
//! - Only the account itself updates its profile; `role` is never written.
//! - Settings are visible and writable only by their owner.

use crate::access::{EntityKind, Identity, IdentityContext, Operation, Role, UserId};
use crate::model::common::RowStatus;
use crate::model::user::{NewUser, User, UserPatch, UserSetting};
use crate::repo::guard::AccessGuard;
use crate::repo::{parse_enum, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    created_ts,
    updated_ts,
    row_status,
    username,
    role,
    email,
    nickname,
    password_hash,
    avatar_url,
    description
FROM user";

/// Repository interface for accounts and their settings.
pub trait UserRepository {
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<User>;
    fn get_setting(&self, user_id: UserId, key: &str) -> RepoResult<Option<UserSetting>>;
    fn list_settings(&self, user_id: UserId) -> RepoResult<Vec<UserSetting>>;
    /// Inserts or replaces one `(user_id, key)` setting.
    fn upsert_setting(&self, setting: &UserSetting) -> RepoResult<()>;
    fn delete_setting(&self, user_id: UserId, key: &str) -> RepoResult<()>;
}

/// SQLite-backed user repository bound to one acting identity.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
    guard: AccessGuard,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection, ctx: &impl IdentityContext) -> Self {
        Self {
            conn,
            guard: AccessGuard::new(ctx),
        }
    }

    fn find_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_setting(&self, user_id: UserId, key: &str) -> RepoResult<Option<UserSetting>> {
        let setting = self
            .conn
            .query_row(
                "SELECT user_id, key, value FROM user_setting WHERE user_id = ?1 AND key = ?2;",
                params![user_id, key],
                |row| {
                    Ok(UserSetting {
                        user_id: row.get(0)?,
                        key: row.get(1)?,
                        value: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(setting)
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        Ok(self
            .find_user(id)?
            .filter(|user| self.guard.can_read(&user.row_view())))
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query(params![username])?;
        let user = match rows.next()? {
            Some(row) => Some(parse_user_row(row)?),
            None => None,
        };
        Ok(user.filter(|user| self.guard.can_read(&user.row_view())))
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(self.guard.filter_readable(users, User::row_view))
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<User> {
        patch.validate()?;
        let current = self
            .find_user(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::User, id))?;
        // Profile patches cannot touch `id`, so both sides share one view.
        self.guard
            .require_update(&current.row_view(), &current.row_view(), id)?;

        self.conn.execute(
            "UPDATE user
             SET
                username = COALESCE(?2, username),
                email = COALESCE(?3, email),
                nickname = COALESCE(?4, nickname),
                avatar_url = COALESCE(?5, avatar_url),
                description = COALESCE(?6, description),
                row_status = COALESCE(?7, row_status),
                updated_ts = strftime('%s', 'now')
             WHERE id = ?1;",
            params![
                id,
                patch.username.as_deref(),
                patch.email.as_deref(),
                patch.nickname.as_deref(),
                patch.avatar_url.as_deref(),
                patch.description.as_deref(),
                patch.row_status.map(RowStatus::as_str),
            ],
        )?;

        self.find_user(id)?
            .ok_or_else(|| RepoError::not_found(EntityKind::User, id))
    }

    fn get_setting(&self, user_id: UserId, key: &str) -> RepoResult<Option<UserSetting>> {
        Ok(self
            .find_setting(user_id, key)?
            .filter(|setting| self.guard.can_read(&setting.row_view())))
    }

    fn list_settings(&self, user_id: UserId) -> RepoResult<Vec<UserSetting>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, key, value FROM user_setting WHERE user_id = ?1 ORDER BY key ASC;",
        )?;
        let settings = stmt
            .query_map(params![user_id], |row| {
                Ok(UserSetting {
                    user_id: row.get(0)?,
                    key: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.guard.filter_readable(settings, UserSetting::row_view))
    }

    fn upsert_setting(&self, setting: &UserSetting) -> RepoResult<()> {
        setting.validate()?;
        let key = format!("{}/{}", setting.user_id, setting.key);
        match self.find_setting(setting.user_id, &setting.key)? {
            Some(current) => {
                self.guard
                    .require_update(&current.row_view(), &setting.row_view(), key)?;
                self.conn.execute(
                    "UPDATE user_setting SET value = ?3 WHERE user_id = ?1 AND key = ?2;",
                    params![setting.user_id, setting.key, setting.value],
                )?;
            }
            None => {
                self.guard.require_insert(&setting.row_view())?;
                self.conn.execute(
                    "INSERT INTO user_setting (user_id, key, value) VALUES (?1, ?2, ?3);",
                    params![setting.user_id, setting.key, setting.value],
                )?;
            }
        }
        Ok(())
    }

    fn delete_setting(&self, user_id: UserId, key: &str) -> RepoResult<()> {
        let row_key = format!("{user_id}/{key}");
        let current = self
            .find_setting(user_id, key)?
            .ok_or_else(|| RepoError::not_found(EntityKind::UserSetting, &row_key))?;
        self.guard
            .require_existing(Operation::Delete, &current.row_view(), &row_key)?;
        self.conn.execute(
            "DELETE FROM user_setting WHERE user_id = ?1 AND key = ?2;",
            params![user_id, key],
        )?;
        Ok(())
    }
}

/// Resolves the acting identity for an already-authenticated user id.
///
/// Host-side helper: reads the stored role without row rules because the
/// caller has not acted as anyone yet. Archived accounts resolve to `None`.
pub fn load_identity(conn: &Connection, user_id: UserId) -> RepoResult<Option<Identity>> {
    let stored = conn
        .query_row(
            "SELECT role, row_status FROM user WHERE id = ?1;",
            params![user_id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    let Some((role_text, status_text)) = stored else {
        return Ok(None);
    };
    let role = Role::parse(&role_text)
        .map_err(|err| RepoError::InvalidData(format!("{err} in user.role")))?;
    let status = parse_enum(&status_text, "user.row_status", RowStatus::parse)?;
    if status == RowStatus::Archived {
        return Ok(None);
    }
    Ok(Some(Identity::new(user_id, role)))
}

/// Creates one account on behalf of the host's sign-up or admin flow.
///
/// No row rule covers `user` inserts; the host decides who may provision
/// accounts before calling this.
pub fn provision_user(conn: &Connection, new_user: &NewUser) -> RepoResult<User> {
    new_user.validate()?;
    conn.execute(
        "INSERT INTO user (username, role, email, nickname, password_hash)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            new_user.username,
            new_user.role.as_str(),
            new_user.email,
            new_user.nickname,
            new_user.password_hash,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        "event=user_provision module=repo status=ok user_id={} role={}",
        id, new_user.role
    );

    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => parse_user_row(row),
        None => Err(RepoError::not_found(EntityKind::User, id)),
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text)
        .map_err(|err| RepoError::InvalidData(format!("{err} in user.role")))?;
    let status_text: String = row.get("row_status")?;

    Ok(User {
        id: row.get("id")?,
        created_ts: row.get("created_ts")?,
        updated_ts: row.get("updated_ts")?,
        row_status: parse_enum(&status_text, "user.row_status", RowStatus::parse)?,
        username: row.get("username")?,
        role,
        email: row.get("email")?,
        nickname: row.get("nickname")?,
        password_hash: row.get("password_hash")?,
        avatar_url: row.get("avatar_url")?,
        description: row.get("description")?,
    })
}
