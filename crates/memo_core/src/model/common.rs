//! Shared model enums and validation errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static UID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,30}[a-zA-Z0-9])?$").expect("valid uid regex")
});
static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,31}$").expect("valid username regex")
});

/// Archive state shared by users and memos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    #[default]
    Normal,
    Archived,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Archived => "ARCHIVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NORMAL" => Some(Self::Normal),
            "ARCHIVED" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Generates a fresh public uid for memos and resources.
pub fn generate_uid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Returns whether `value` is an acceptable public uid.
pub fn is_valid_uid(value: &str) -> bool {
    UID_RE.is_match(value)
}

/// Returns whether `value` is an acceptable username.
pub fn is_valid_username(value: &str) -> bool {
    USERNAME_RE.is_match(value)
}

/// Record-level validation failures raised before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    InvalidUsername(String),
    InvalidUid(String),
    EmptyField(&'static str),
    SelfRelation(i64),
    NegativeSize(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::InvalidUid(value) => write!(f, "invalid uid: `{value}`"),
            Self::EmptyField(name) => write!(f, "field must not be empty: {name}"),
            Self::SelfRelation(memo_id) => {
                write!(f, "memo {memo_id} cannot be related to itself")
            }
            Self::NegativeSize(size) => write!(f, "resource size must not be negative: {size}"),
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_non_empty(
    value: &str,
    name: &'static str,
) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyField(name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{generate_uid, is_valid_uid, is_valid_username};

    #[test]
    fn generated_uid_is_valid() {
        let uid = generate_uid();
        assert_eq!(uid.len(), 32);
        assert!(is_valid_uid(&uid));
    }

    #[test]
    fn uid_rejects_leading_or_trailing_dash_and_overlong_values() {
        assert!(is_valid_uid("a"));
        assert!(is_valid_uid("memo-2024"));
        assert!(!is_valid_uid("-memo"));
        assert!(!is_valid_uid("memo-"));
        assert!(!is_valid_uid(&"a".repeat(33)));
        assert!(!is_valid_uid("has space"));
    }

    #[test]
    fn username_accepts_underscore_but_not_symbols() {
        assert!(is_valid_username("steven_1"));
        assert!(!is_valid_username("_steven"));
        assert!(!is_valid_username("steven!"));
        assert!(!is_valid_username(""));
    }
}
