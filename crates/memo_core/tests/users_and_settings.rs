use memo_core::db::open_db_in_memory;
use memo_core::model::common::RowStatus;
use memo_core::model::user::{NewUser, UserPatch, UserSetting};
use memo_core::repo::user_repo::{SqliteUserRepository, UserRepository};
use memo_core::{load_identity, provision_user, Anonymous, Identity, RepoError, Role};

#[test]
fn provision_and_load_identity_round_trip_roles() {
    let conn = open_db_in_memory().unwrap();
    let host = provision_user(&conn, &NewUser::new("root", Role::Host, "hash")).unwrap();
    assert_eq!(host.role, Role::Host);
    assert_eq!(
        load_identity(&conn, host.id).unwrap(),
        Some(Identity::new(host.id, Role::Host))
    );
    assert_eq!(load_identity(&conn, 9999).unwrap(), None);
}

#[test]
fn provision_rejects_invalid_username() {
    let conn = open_db_in_memory().unwrap();
    let err = provision_user(&conn, &NewUser::new("-bad name", Role::User, "hash")).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
}

#[test]
fn archived_user_has_no_identity() {
    let conn = open_db_in_memory().unwrap();
    let user = provision_user(&conn, &NewUser::new("leaver", Role::User, "hash")).unwrap();
    SqliteUserRepository::new(&conn, &user.identity())
        .update_user(
            user.id,
            &UserPatch {
                row_status: Some(RowStatus::Archived),
                ..UserPatch::default()
            },
        )
        .unwrap();
    assert_eq!(load_identity(&conn, user.id).unwrap(), None);
}

#[test]
fn accounts_are_readable_by_authenticated_callers_only() {
    let conn = open_db_in_memory().unwrap();
    let alice = provision_user(&conn, &NewUser::new("alice", Role::User, "hash")).unwrap();
    let bob = provision_user(&conn, &NewUser::new("bob", Role::User, "hash")).unwrap();

    let bob_repo = SqliteUserRepository::new(&conn, &bob.identity());
    assert_eq!(bob_repo.get_user(alice.id).unwrap(), Some(alice.clone()));
    assert_eq!(
        bob_repo.get_user_by_username("alice").unwrap().map(|u| u.id),
        Some(alice.id)
    );
    assert_eq!(bob_repo.list_users().unwrap().len(), 2);

    let anonymous = SqliteUserRepository::new(&conn, &Anonymous);
    assert_eq!(anonymous.get_user(alice.id).unwrap(), None);
    assert!(anonymous.list_users().unwrap().is_empty());
}

#[test]
fn profile_updates_are_self_service() {
    let conn = open_db_in_memory().unwrap();
    let alice = provision_user(&conn, &NewUser::new("alice", Role::User, "hash")).unwrap();
    let bob = provision_user(&conn, &NewUser::new("bob", Role::User, "hash")).unwrap();
    let patch = UserPatch {
        nickname: Some("Al".to_string()),
        ..UserPatch::default()
    };

    let err = SqliteUserRepository::new(&conn, &bob.identity())
        .update_user(alice.id, &patch)
        .unwrap_err();
    assert!(err.is_permission_denied());

    let admin = Identity::new(bob.id, Role::Admin);
    assert!(SqliteUserRepository::new(&conn, &admin)
        .update_user(alice.id, &patch)
        .unwrap_err()
        .is_permission_denied());

    let updated = SqliteUserRepository::new(&conn, &alice.identity())
        .update_user(alice.id, &patch)
        .unwrap();
    assert_eq!(updated.nickname, "Al");
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.role, Role::User);
}

#[test]
fn settings_are_private_to_their_owner() {
    let conn = open_db_in_memory().unwrap();
    let alice = provision_user(&conn, &NewUser::new("alice", Role::User, "hash")).unwrap();
    let bob = provision_user(&conn, &NewUser::new("bob", Role::User, "hash")).unwrap();
    let alice_repo = SqliteUserRepository::new(&conn, &alice.identity());
    let bob_repo = SqliteUserRepository::new(&conn, &bob.identity());

    alice_repo
        .upsert_setting(&UserSetting::new(alice.id, "locale", "en"))
        .unwrap();
    alice_repo
        .upsert_setting(&UserSetting::new(alice.id, "locale", "fr"))
        .unwrap();
    assert_eq!(
        alice_repo
            .get_setting(alice.id, "locale")
            .unwrap()
            .map(|setting| setting.value),
        Some("fr".to_string())
    );

    assert!(bob_repo
        .upsert_setting(&UserSetting::new(alice.id, "theme", "dark"))
        .unwrap_err()
        .is_permission_denied());
    assert_eq!(bob_repo.get_setting(alice.id, "locale").unwrap(), None);
    assert!(bob_repo.list_settings(alice.id).unwrap().is_empty());
    assert!(matches!(
        bob_repo.delete_setting(alice.id, "locale").unwrap_err(),
        RepoError::NotFound { .. }
    ));

    alice_repo.delete_setting(alice.id, "locale").unwrap();
    assert!(alice_repo.list_settings(alice.id).unwrap().is_empty());
}
