//! Acting identity and the accessor contract hosts implement.
//!
//! # Responsibility
//! - Define the identity value every rule is evaluated against.
//! - Define the accessor trait through which hosts hand the identity in.
//!
//! # Invariants
//! - Identity is always passed explicitly; core keeps no ambient session state.
//! - Role ordering is `User < Admin < Host`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Numeric primary key of a `user` row.
pub type UserId = i64;

/// Account role stored in `user.role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular account.
    User,
    /// Workspace administrator.
    Admin,
    /// Instance owner. Satisfies every role requirement.
    Host,
}

impl Role {
    /// Stored string value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::Host => "HOST",
        }
    }

    /// Parses one stored role value. Matching is exact.
    pub fn parse(value: &str) -> Result<Self, RoleParseError> {
        match value {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "HOST" => Ok(Self::Host),
            other => Err(RoleParseError(other.to_string())),
        }
    }

    /// Returns whether this role meets `required`.
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(pub String);

impl Display for RoleParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported role: {}", self.0)
    }
}

impl Error for RoleParseError {}

/// Authenticated acting user.
///
/// The role travels with the id so role-gated rules can be decided without a
/// storage round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Shorthand for a regular account.
    pub fn user(user_id: UserId) -> Self {
        Self::new(user_id, Role::User)
    }
}

/// Source of the acting identity for one logical request.
///
/// Returns `None` for anonymous callers. Implementations must not perform
/// authentication here; the value is trusted as given.
pub trait IdentityContext {
    fn current_identity(&self) -> Option<Identity>;
}

impl IdentityContext for Identity {
    fn current_identity(&self) -> Option<Identity> {
        Some(*self)
    }
}

impl IdentityContext for Option<Identity> {
    fn current_identity(&self) -> Option<Identity> {
        *self
    }
}

/// Context with no acting user.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityContext for Anonymous {
    fn current_identity(&self) -> Option<Identity> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{Anonymous, Identity, IdentityContext, Role, RoleParseError};

    #[test]
    fn role_ordering_places_host_above_admin_above_user() {
        assert!(Role::Host.satisfies(Role::Admin));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(!Role::User.satisfies(Role::Admin));
        assert!(Role::User.satisfies(Role::User));
    }

    #[test]
    fn parses_stored_role_values_exactly() {
        assert_eq!(Role::parse("HOST").expect("host"), Role::Host);
        assert_eq!(Role::parse("ADMIN").expect("admin"), Role::Admin);
        assert_eq!(Role::parse("USER").expect("user"), Role::User);
        assert_eq!(
            Role::parse("admin").expect_err("lowercase must fail"),
            RoleParseError("admin".to_string())
        );
    }

    #[test]
    fn accessor_impls_return_given_identity() {
        let identity = Identity::user(7);
        assert_eq!(identity.current_identity(), Some(identity));
        assert_eq!(Some(identity).current_identity(), Some(identity));
        assert_eq!(None::<Identity>.current_identity(), None);
        assert_eq!(Anonymous.current_identity(), None);
    }
}
