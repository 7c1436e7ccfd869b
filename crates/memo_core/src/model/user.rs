//! User and per-user setting records.
//!
//! # Invariants
//! - `username` is unique and matches the username pattern.
//! - `role` never changes through self-service updates.

use crate::access::{Identity, Role, RowView, UserId};
use crate::model::common::{is_valid_username, ModelValidationError, RowStatus};
use serde::{Deserialize, Serialize};

/// Persisted `user` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub row_status: RowStatus,
    pub username: String,
    pub role: Role,
    pub email: String,
    pub nickname: String,
    /// Opaque credential hash produced by the host.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: String,
    pub description: String,
}

impl User {
    pub fn row_view(&self) -> RowView {
        RowView::User { id: self.id }
    }

    /// Identity this account acts as.
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.role)
    }
}

/// Registration input for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub role: Role,
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, role: Role, password_hash: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            nickname: username.clone(),
            username,
            role,
            email: String::new(),
            password_hash: password_hash.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !is_valid_username(&self.username) {
            return Err(ModelValidationError::InvalidUsername(self.username.clone()));
        }
        if self.password_hash.is_empty() {
            return Err(ModelValidationError::EmptyField("password_hash"));
        }
        Ok(())
    }
}

/// Self-service profile patch. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
    pub row_status: Option<RowStatus>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(username) = &self.username {
            if !is_valid_username(username) {
                return Err(ModelValidationError::InvalidUsername(username.clone()));
            }
        }
        Ok(())
    }
}

/// Persisted `user_setting` row keyed by `(user_id, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSetting {
    pub user_id: UserId,
    pub key: String,
    pub value: String,
}

impl UserSetting {
    pub fn new(user_id: UserId, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            user_id,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn row_view(&self) -> RowView {
        RowView::UserSetting {
            user_id: self.user_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        crate::model::common::require_non_empty(&self.key, "user_setting.key")
    }
}
