//! Global configuration records: system settings, identity providers and
//! migration history.
//!
//! # Invariants
//! - None of these rows is owner-scoped.
//! - Writes are reserved for administrator identities.

use crate::access::RowView;
use crate::model::common::{require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};

pub type IdentityProviderId = i64;

/// Persisted `system_setting` row keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSetting {
    pub name: String,
    pub value: String,
    pub description: String,
}

impl SystemSetting {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: String::new(),
        }
    }

    pub fn row_view(&self) -> RowView {
        RowView::SystemSetting
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty(&self.name, "system_setting.name")
    }
}

/// Identity provider protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityProviderType {
    Oauth2,
}

impl IdentityProviderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oauth2 => "OAUTH2",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "OAUTH2" => Some(Self::Oauth2),
            _ => None,
        }
    }
}

/// Persisted `idp` row. `config` is opaque JSON owned by the SSO layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProvider {
    pub id: IdentityProviderId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IdentityProviderType,
    pub identifier_filter: String,
    pub config: String,
}

impl IdentityProvider {
    pub fn row_view(&self) -> RowView {
        RowView::IdentityProvider
    }
}

/// Creation input for one identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentityProvider {
    pub name: String,
    pub kind: IdentityProviderType,
    pub identifier_filter: String,
    pub config: String,
}

impl NewIdentityProvider {
    pub fn oauth2(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: IdentityProviderType::Oauth2,
            identifier_filter: String::new(),
            config: config.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty(&self.name, "idp.name")
    }
}

/// Persisted `migration_history` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    pub version: String,
    pub created_ts: i64,
}
