//! Row-level authorization decision function.
//!
//! # Responsibility
//! - Decide allow/deny for `{identity, entity, operation, row}`.
//! - Apply USING and WITH CHECK semantics for updates.
//!
//! # Invariants
//! - Pure: no I/O, no shared state, no logging.
//! - A row view of a different entity than requested is a caller bug and
//!   panics instead of being reported as a denial.

use crate::access::identity::Identity;
use crate::access::row::{EntityKind, Operation, RowView};
use crate::access::rule::{rules_for, Rule};

/// Authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny
        }
    }
}

/// Decides whether `identity` may perform `operation` on `row` of `entity`.
///
/// For `Select`, `Update` and `Delete` the row is the existing row (USING).
/// For `Insert` it is the row being written (WITH CHECK). Use
/// [`authorize_update`] to check both sides of an update at once.
///
/// # Panics
/// - When `row.kind() != entity`.
pub fn authorize(
    identity: Option<Identity>,
    entity: EntityKind,
    operation: Operation,
    row: &RowView,
) -> Decision {
    assert_eq!(
        row.kind(),
        entity,
        "row view of `{}` passed for entity `{}`",
        row.kind(),
        entity
    );
    Decision::from_bool(matching_rule(identity, operation, row).is_some())
}

/// Returns the first rule that permits the request, if any.
pub fn matching_rule(
    identity: Option<Identity>,
    operation: Operation,
    row: &RowView,
) -> Option<&'static Rule> {
    rules_for(row.kind(), operation).find(|rule| rule.permits(identity, row))
}

/// Decides an update: USING on `current`, WITH CHECK on `proposed`.
///
/// Owner columns are immutable after creation, so a proposed row whose owner
/// fields differ from the current row is denied even when both sides pass
/// their rules.
///
/// # Panics
/// - When `current` and `proposed` belong to different entities.
pub fn authorize_update(
    identity: Option<Identity>,
    current: &RowView,
    proposed: &RowView,
) -> Decision {
    let entity = current.kind();
    if current.owner_fields() != proposed.owner_fields() {
        assert_eq!(proposed.kind(), entity, "update changes entity kind");
        return Decision::Deny;
    }

    let using = authorize(identity, entity, Operation::Update, current);
    let with_check = authorize(identity, entity, Operation::Update, proposed);
    Decision::from_bool(using.is_allowed() && with_check.is_allowed())
}

#[cfg(test)]
mod tests {
    use super::{authorize, authorize_update, matching_rule, Decision};
    use crate::access::identity::{Identity, Role};
    use crate::access::row::{EntityKind, Operation, RowView, Visibility};

    fn memo(creator_id: i64, visibility: Visibility) -> RowView {
        RowView::Memo {
            creator_id,
            visibility,
        }
    }

    #[test]
    fn owner_reads_private_memo_and_others_do_not() {
        let row = memo(7, Visibility::Private);
        assert_eq!(
            authorize(Some(Identity::user(7)), EntityKind::Memo, Operation::Select, &row),
            Decision::Allow
        );
        assert_eq!(
            authorize(Some(Identity::user(9)), EntityKind::Memo, Operation::Select, &row),
            Decision::Deny
        );
    }

    #[test]
    fn admin_role_does_not_bypass_owner_rules() {
        let row = memo(7, Visibility::Private);
        let host = Identity::new(1, Role::Host);
        assert_eq!(
            authorize(Some(host), EntityKind::Memo, Operation::Select, &row),
            Decision::Deny
        );
    }

    #[test]
    fn matching_rule_names_the_permitting_rule() {
        let row = memo(7, Visibility::Public);
        let rule = matching_rule(Some(Identity::user(9)), Operation::Select, &row)
            .expect("public memo readable");
        assert_eq!(rule.name, "memo_read");
        assert!(matching_rule(Some(Identity::user(9)), Operation::Update, &row).is_none());
    }

    #[test]
    fn update_that_rewrites_owner_is_denied() {
        let current = memo(7, Visibility::Private);
        let proposed = memo(9, Visibility::Private);
        assert_eq!(
            authorize_update(Some(Identity::user(7)), &current, &proposed),
            Decision::Deny
        );
    }

    #[test]
    fn update_checks_both_rows() {
        let current = memo(7, Visibility::Private);
        let proposed = memo(7, Visibility::Public);
        assert_eq!(
            authorize_update(Some(Identity::user(7)), &current, &proposed),
            Decision::Allow
        );
        assert_eq!(
            authorize_update(Some(Identity::user(9)), &current, &proposed),
            Decision::Deny
        );
    }

    #[test]
    #[should_panic(expected = "row view of `inbox` passed for entity `memo`")]
    fn mismatched_row_view_panics() {
        let row = RowView::Inbox {
            sender_id: 1,
            receiver_id: 2,
        };
        let _ = authorize(Some(Identity::user(1)), EntityKind::Memo, Operation::Select, &row);
    }
}
