use memo_core::access::{rules_for, OwnerField};
use memo_core::{
    authorize, authorize_update, Decision, EntityKind, Identity, Operation, Role, RowView,
    UserId, Visibility, RULES,
};

const IDENTITIES: &[UserId] = &[1, 2, 3, 7, 9];
const VISIBILITIES: [Visibility; 3] = [
    Visibility::Public,
    Visibility::Protected,
    Visibility::Private,
];

fn decide(identity: Option<Identity>, operation: Operation, row: &RowView) -> Decision {
    authorize(identity, row.kind(), operation, row)
}

fn user(id: UserId) -> Option<Identity> {
    Some(Identity::user(id))
}

/// One sample row per entity, owned by `owner` where the entity has owners.
fn sample_rows(owner: UserId) -> Vec<RowView> {
    vec![
        RowView::MigrationHistory,
        RowView::SystemSetting,
        RowView::User { id: owner },
        RowView::UserSetting { user_id: owner },
        RowView::Memo {
            creator_id: owner,
            visibility: Visibility::Private,
        },
        RowView::MemoOrganizer { user_id: owner },
        RowView::MemoRelation {
            memo_id: 10,
            related_memo_id: 11,
        },
        RowView::Resource { creator_id: owner },
        RowView::Activity { creator_id: owner },
        RowView::IdentityProvider,
        RowView::Inbox {
            sender_id: owner,
            receiver_id: owner + 1,
        },
        RowView::Reaction { creator_id: owner },
    ]
}

#[test]
fn public_memo_is_readable_by_every_authenticated_identity() {
    for &creator_id in IDENTITIES {
        let row = RowView::Memo {
            creator_id,
            visibility: Visibility::Public,
        };
        for &actor in IDENTITIES {
            assert_eq!(decide(user(actor), Operation::Select, &row), Decision::Allow);
        }
        assert_eq!(decide(None, Operation::Select, &row), Decision::Deny);
    }
}

#[test]
fn non_public_memo_is_readable_only_by_its_creator() {
    for visibility in [Visibility::Protected, Visibility::Private] {
        for &creator_id in IDENTITIES {
            let row = RowView::Memo {
                creator_id,
                visibility,
            };
            for &actor in IDENTITIES {
                let expected = if actor == creator_id {
                    Decision::Allow
                } else {
                    Decision::Deny
                };
                assert_eq!(decide(user(actor), Operation::Select, &row), expected);
            }
        }
    }
}

fn assert_owner_only(make_row: fn(UserId) -> RowView, operations: &[Operation]) {
    for &owner in IDENTITIES {
        let row = make_row(owner);
        for &operation in operations {
            assert_eq!(decide(None, operation, &row), Decision::Deny);
            for &actor in IDENTITIES {
                let expected = if actor == owner {
                    Decision::Allow
                } else {
                    Decision::Deny
                };
                assert_eq!(
                    decide(user(actor), operation, &row),
                    expected,
                    "{operation} on {} by {actor}",
                    row.kind()
                );
            }
        }
    }
}

#[test]
fn single_owner_updates_and_deletes_require_the_owner() {
    let update_delete = [Operation::Update, Operation::Delete];
    assert_owner_only(|id| RowView::User { id }, &[Operation::Update]);
    assert_owner_only(|user_id| RowView::UserSetting { user_id }, &update_delete);
    assert_owner_only(
        |creator_id| RowView::Memo {
            creator_id,
            visibility: Visibility::Public,
        },
        &update_delete,
    );
    assert_owner_only(|user_id| RowView::MemoOrganizer { user_id }, &update_delete);
    assert_owner_only(|creator_id| RowView::Resource { creator_id }, &update_delete);
    assert_owner_only(|creator_id| RowView::Activity { creator_id }, &update_delete);
    assert_owner_only(|creator_id| RowView::Reaction { creator_id }, &[Operation::Delete]);
}

#[test]
fn inserts_with_spoofed_owner_are_denied() {
    let insert = [Operation::Insert];
    assert_owner_only(
        |creator_id| RowView::Memo {
            creator_id,
            visibility: Visibility::Public,
        },
        &insert,
    );
    assert_owner_only(|creator_id| RowView::Resource { creator_id }, &insert);
    assert_owner_only(|creator_id| RowView::Reaction { creator_id }, &insert);
    assert_owner_only(|user_id| RowView::MemoOrganizer { user_id }, &insert);
    assert_owner_only(|creator_id| RowView::Activity { creator_id }, &insert);
}

#[test]
fn inbox_rules_split_sender_and_receiver() {
    let row = RowView::Inbox {
        sender_id: 1,
        receiver_id: 2,
    };
    for &actor in IDENTITIES {
        let participant = actor == 1 || actor == 2;
        assert_eq!(
            decide(user(actor), Operation::Select, &row).is_allowed(),
            participant
        );
        assert_eq!(
            decide(user(actor), Operation::Insert, &row).is_allowed(),
            actor == 1
        );
        assert_eq!(
            decide(user(actor), Operation::Update, &row).is_allowed(),
            actor == 2
        );
        assert_eq!(decide(user(actor), Operation::Delete, &row), Decision::Deny);
    }
}

#[test]
fn anonymous_is_denied_everything_except_memo_relation() {
    for row in sample_rows(7) {
        for operation in Operation::ALL {
            let expected = if row.kind() == EntityKind::MemoRelation {
                Decision::Allow
            } else {
                Decision::Deny
            };
            assert_eq!(
                decide(None, operation, &row),
                expected,
                "{operation} on {}",
                row.kind()
            );
        }
    }
}

#[test]
fn every_entity_has_a_sample_row() {
    let kinds: Vec<EntityKind> = sample_rows(1).iter().map(RowView::kind).collect();
    assert_eq!(kinds, EntityKind::ALL.to_vec());
}

#[test]
fn pairs_without_rules_are_denied_for_everyone() {
    let uncovered = [
        (RowView::User { id: 7 }, Operation::Insert),
        (RowView::User { id: 7 }, Operation::Delete),
        (
            RowView::Inbox {
                sender_id: 7,
                receiver_id: 7,
            },
            Operation::Delete,
        ),
        (RowView::Reaction { creator_id: 7 }, Operation::Update),
    ];
    for (row, operation) in uncovered {
        assert_eq!(rules_for(row.kind(), operation).count(), 0);
        for role in [Role::User, Role::Admin, Role::Host] {
            let identity = Some(Identity::new(7, role));
            assert_eq!(decide(identity, operation, &row), Decision::Deny);
        }
    }
}

#[test]
fn role_gated_rules_require_admin_or_host() {
    let gated = [
        (RowView::MigrationHistory, Operation::ALL.to_vec()),
        (
            RowView::SystemSetting,
            vec![Operation::Insert, Operation::Update, Operation::Delete],
        ),
        (
            RowView::IdentityProvider,
            vec![Operation::Insert, Operation::Update, Operation::Delete],
        ),
    ];
    for (row, operations) in gated {
        for operation in operations {
            assert_eq!(
                decide(Some(Identity::new(5, Role::User)), operation, &row),
                Decision::Deny
            );
            assert_eq!(
                decide(Some(Identity::new(5, Role::Admin)), operation, &row),
                Decision::Allow
            );
            assert_eq!(
                decide(Some(Identity::new(5, Role::Host)), operation, &row),
                Decision::Allow
            );
            assert_eq!(decide(None, operation, &row), Decision::Deny);
        }
    }

    for row in [RowView::SystemSetting, RowView::IdentityProvider] {
        assert_eq!(
            decide(Some(Identity::new(5, Role::User)), Operation::Select, &row),
            Decision::Allow
        );
    }
}

#[test]
fn only_admin_rules_carry_a_role_gate() {
    for rule in RULES {
        let gated_entity = matches!(
            rule.entity,
            EntityKind::MigrationHistory | EntityKind::SystemSetting | EntityKind::IdentityProvider
        );
        if rule.required_role.is_some() {
            assert!(gated_entity, "{rule}");
            assert_eq!(rule.required_role, Some(Role::Admin));
        }
    }
}

#[test]
fn memo_visibility_flip_scenario() {
    let private = RowView::Memo {
        creator_id: 7,
        visibility: Visibility::Private,
    };
    assert_eq!(decide(user(7), Operation::Insert, &private), Decision::Allow);
    assert_eq!(decide(user(9), Operation::Select, &private), Decision::Deny);

    let public = RowView::Memo {
        creator_id: 7,
        visibility: Visibility::Public,
    };
    assert_eq!(
        authorize_update(user(7), &private, &public),
        Decision::Allow
    );
    assert_eq!(decide(user(9), Operation::Select, &public), Decision::Allow);
    assert_eq!(decide(user(9), Operation::Update, &public), Decision::Deny);
    assert_eq!(authorize_update(user(9), &public, &public), Decision::Deny);
}

#[test]
fn inbox_archive_scenario() {
    let row = RowView::Inbox {
        sender_id: 1,
        receiver_id: 2,
    };
    assert_eq!(decide(user(1), Operation::Select, &row), Decision::Allow);
    assert_eq!(decide(user(2), Operation::Select, &row), Decision::Allow);
    assert_eq!(decide(user(3), Operation::Select, &row), Decision::Deny);
    assert_eq!(authorize_update(user(1), &row, &row), Decision::Deny);
    assert_eq!(authorize_update(user(2), &row, &row), Decision::Allow);
}

#[test]
fn visibility_never_grants_writes() {
    for visibility in VISIBILITIES {
        let row = RowView::Memo {
            creator_id: 7,
            visibility,
        };
        for operation in [Operation::Update, Operation::Delete] {
            assert_eq!(decide(user(9), operation, &row), Decision::Deny);
        }
    }
}

#[test]
fn owner_field_lookup_matches_row_shape() {
    let row = RowView::Inbox {
        sender_id: 1,
        receiver_id: 2,
    };
    assert_eq!(row.owner_field(OwnerField::SenderId), Some(1));
    assert_eq!(row.owner_field(OwnerField::ReceiverId), Some(2));
    assert_eq!(row.owner_field(OwnerField::CreatorId), None);
}
