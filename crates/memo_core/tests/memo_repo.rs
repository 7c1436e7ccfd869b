use memo_core::db::open_db_in_memory;
use memo_core::model::common::RowStatus;
use memo_core::model::memo::{MemoOrganizer, MemoPatch, MemoRelation, NewMemo, RelationType};
use memo_core::model::user::NewUser;
use memo_core::repo::memo_repo::{MemoListQuery, MemoRepository, SqliteMemoRepository};
use memo_core::{provision_user, Anonymous, EntityKind, Identity, RepoError, Role, Visibility};
use rusqlite::{params, Connection};

fn setup() -> (Connection, Identity, Identity) {
    let conn = open_db_in_memory().unwrap();
    let alice = provision_user(&conn, &NewUser::new("alice", Role::User, "hash")).unwrap();
    let bob = provision_user(&conn, &NewUser::new("bob", Role::User, "hash")).unwrap();
    (conn, alice.identity(), bob.identity())
}

#[test]
fn owner_creates_and_reads_private_memo_others_cannot() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let memo = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "secret"))
        .unwrap();
    assert_eq!(memo.visibility, Visibility::Private);
    assert_eq!(memo.creator_id, alice.user_id);

    assert_eq!(alice_repo.get_memo(memo.id).unwrap(), Some(memo.clone()));
    assert_eq!(
        alice_repo.get_memo_by_uid(&memo.uid).unwrap().map(|m| m.id),
        Some(memo.id)
    );

    let bob_repo = SqliteMemoRepository::new(&conn, &bob);
    assert_eq!(bob_repo.get_memo(memo.id).unwrap(), None);
    assert_eq!(bob_repo.get_memo_by_uid(&memo.uid).unwrap(), None);
    assert_eq!(
        SqliteMemoRepository::new(&conn, &Anonymous)
            .get_memo(memo.id)
            .unwrap(),
        None
    );
}

#[test]
fn create_memo_for_someone_else_is_denied() {
    let (conn, alice, bob) = setup();
    let err = SqliteMemoRepository::new(&conn, &alice)
        .create_memo(&NewMemo::new(bob.user_id, "spoofed"))
        .unwrap_err();
    assert!(err.is_permission_denied());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM memo;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn invalid_uid_is_rejected_before_storage() {
    let (conn, alice, _) = setup();
    let mut memo = NewMemo::new(alice.user_id, "body");
    memo.uid = "-bad-".to_string();
    let err = SqliteMemoRepository::new(&conn, &alice)
        .create_memo(&memo)
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn visibility_flip_makes_memo_readable_but_not_writable() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let bob_repo = SqliteMemoRepository::new(&conn, &bob);
    let memo = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "draft"))
        .unwrap();

    let hidden_update = bob_repo
        .update_memo(
            memo.id,
            &MemoPatch {
                content: Some("hijack".to_string()),
                ..MemoPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        hidden_update,
        RepoError::NotFound {
            entity: EntityKind::Memo,
            ..
        }
    ));

    let published = alice_repo
        .update_memo(
            memo.id,
            &MemoPatch {
                visibility: Some(Visibility::Public),
                ..MemoPatch::default()
            },
        )
        .unwrap();
    assert_eq!(published.visibility, Visibility::Public);
    assert_eq!(published.content, "draft");

    assert_eq!(bob_repo.get_memo(memo.id).unwrap().map(|m| m.id), Some(memo.id));
    let visible_update = bob_repo
        .update_memo(
            memo.id,
            &MemoPatch {
                content: Some("hijack".to_string()),
                ..MemoPatch::default()
            },
        )
        .unwrap_err();
    assert!(visible_update.is_permission_denied());
    assert!(bob_repo.delete_memo(memo.id).unwrap_err().is_permission_denied());

    assert_eq!(
        alice_repo.get_memo(memo.id).unwrap().map(|m| m.content),
        Some("draft".to_string())
    );
}

#[test]
fn list_memos_filters_hidden_rows_before_paginating() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let bob_repo = SqliteMemoRepository::new(&conn, &bob);

    let first = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "public one").with_visibility(Visibility::Public))
        .unwrap();
    alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "private"))
        .unwrap();
    let third = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "public two").with_visibility(Visibility::Public))
        .unwrap();
    let own = bob_repo
        .create_memo(&NewMemo::new(bob.user_id, "bob private"))
        .unwrap();

    let visible: Vec<i64> = bob_repo
        .list_memos(&MemoListQuery::default())
        .unwrap()
        .into_iter()
        .map(|memo| memo.id)
        .collect();
    assert_eq!(visible, vec![own.id, third.id, first.id]);

    let page: Vec<i64> = bob_repo
        .list_memos(&MemoListQuery {
            limit: Some(1),
            offset: 1,
            ..MemoListQuery::default()
        })
        .unwrap()
        .into_iter()
        .map(|memo| memo.id)
        .collect();
    assert_eq!(page, vec![third.id]);

    let alice_only = bob_repo
        .list_memos(&MemoListQuery {
            creator_id: Some(alice.user_id),
            ..MemoListQuery::default()
        })
        .unwrap();
    assert_eq!(alice_only.len(), 2);

    assert_eq!(
        alice_repo
            .list_memos(&MemoListQuery::default())
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn archived_memos_are_excluded_unless_requested() {
    let (conn, alice, _) = setup();
    let repo = SqliteMemoRepository::new(&conn, &alice);
    let memo = repo
        .create_memo(&NewMemo::new(alice.user_id, "old"))
        .unwrap();
    repo.update_memo(
        memo.id,
        &MemoPatch {
            row_status: Some(RowStatus::Archived),
            ..MemoPatch::default()
        },
    )
    .unwrap();

    assert!(repo.list_memos(&MemoListQuery::default()).unwrap().is_empty());
    let all = repo
        .list_memos(&MemoListQuery {
            include_archived: true,
            ..MemoListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].row_status, RowStatus::Archived);
}

#[test]
fn owner_deletes_memo() {
    let (conn, alice, _) = setup();
    let repo = SqliteMemoRepository::new(&conn, &alice);
    let memo = repo
        .create_memo(&NewMemo::new(alice.user_id, "bye"))
        .unwrap();
    repo.delete_memo(memo.id).unwrap();
    assert_eq!(repo.get_memo(memo.id).unwrap(), None);
    assert!(matches!(
        repo.delete_memo(memo.id).unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn organizer_rows_are_private_to_their_user() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let bob_repo = SqliteMemoRepository::new(&conn, &bob);
    let memo = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "shared").with_visibility(Visibility::Public))
        .unwrap();

    bob_repo
        .upsert_organizer(&MemoOrganizer {
            memo_id: memo.id,
            user_id: bob.user_id,
            pinned: true,
        })
        .unwrap();
    let spoofed = bob_repo
        .upsert_organizer(&MemoOrganizer {
            memo_id: memo.id,
            user_id: alice.user_id,
            pinned: true,
        })
        .unwrap_err();
    assert!(spoofed.is_permission_denied());

    assert_eq!(
        bob_repo
            .get_organizer(memo.id, bob.user_id)
            .unwrap()
            .map(|organizer| organizer.pinned),
        Some(true)
    );
    assert_eq!(alice_repo.get_organizer(memo.id, bob.user_id).unwrap(), None);
    assert!(matches!(
        alice_repo.delete_organizer(memo.id, bob.user_id).unwrap_err(),
        RepoError::NotFound {
            entity: EntityKind::MemoOrganizer,
            ..
        }
    ));

    bob_repo
        .upsert_organizer(&MemoOrganizer {
            memo_id: memo.id,
            user_id: bob.user_id,
            pinned: false,
        })
        .unwrap();
    assert_eq!(
        bob_repo
            .get_organizer(memo.id, bob.user_id)
            .unwrap()
            .map(|organizer| organizer.pinned),
        Some(false)
    );
    bob_repo.delete_organizer(memo.id, bob.user_id).unwrap();
    assert_eq!(bob_repo.get_organizer(memo.id, bob.user_id).unwrap(), None);
}

#[test]
fn relations_are_open_to_any_caller() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let first = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "a"))
        .unwrap();
    let second = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "b"))
        .unwrap();

    let relation = MemoRelation::new(first.id, second.id, RelationType::Reference);
    SqliteMemoRepository::new(&conn, &bob)
        .create_relation(&relation)
        .unwrap();
    assert_eq!(
        SqliteMemoRepository::new(&conn, &Anonymous)
            .list_relations(second.id)
            .unwrap(),
        vec![relation.clone()]
    );

    let self_relation = MemoRelation::new(first.id, first.id, RelationType::Reference);
    assert!(matches!(
        alice_repo.create_relation(&self_relation).unwrap_err(),
        RepoError::Validation(_)
    ));

    alice_repo.delete_relation(&relation).unwrap();
    assert!(alice_repo.list_relations(first.id).unwrap().is_empty());
    assert!(matches!(
        alice_repo.delete_relation(&relation).unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn deleting_memo_cascades_to_organizer_relations_and_resources() {
    let (conn, alice, bob) = setup();
    let alice_repo = SqliteMemoRepository::new(&conn, &alice);
    let parent = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "parent").with_visibility(Visibility::Public))
        .unwrap();
    let other = alice_repo
        .create_memo(&NewMemo::new(alice.user_id, "other"))
        .unwrap();
    alice_repo
        .create_relation(&MemoRelation::new(other.id, parent.id, RelationType::Reference))
        .unwrap();
    SqliteMemoRepository::new(&conn, &bob)
        .upsert_organizer(&MemoOrganizer {
            memo_id: parent.id,
            user_id: bob.user_id,
            pinned: true,
        })
        .unwrap();
    conn.execute(
        "INSERT INTO resource (uid, creator_id, filename, memo_id) VALUES ('res1', ?1, 'a.txt', ?2);",
        params![alice.user_id, parent.id],
    )
    .unwrap();

    alice_repo.delete_memo(parent.id).unwrap();

    for table in ["memo_organizer", "memo_relation", "resource"] {
        let remaining: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0, "{table} rows survived memo delete");
    }
}
