mod common;

use common::*;
use groupvault::api::error::AppError;
use groupvault::entities::group_memberships::Role;
use groupvault::services::access::{self, ANY_MEMBER, MANAGERS, OWNER_ONLY};

#[tokio::test]
async fn test_authorize_outcomes_per_role() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let carol = register(&state, "carol").await;
    let dave = register(&state, "dave").await;
    let group = create_group(&state, &alice, "design").await;
    add(&state, &alice, &group, "bob", Role::Admin).await;
    add(&state, &alice, &group, "carol", Role::Member).await;

    // Every member passes a member-level check
    for user in [&alice, &bob, &carol] {
        access::authorize(&state.db, user, &group, ANY_MEMBER)
            .await
            .unwrap();
    }

    access::authorize(&state.db, &bob, &group, MANAGERS)
        .await
        .unwrap();
    let err = access::authorize(&state.db, &carol, &group, MANAGERS)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));

    // An admin does not pass an owner-only check
    let err = access::authorize(&state.db, &bob, &group, OWNER_ONLY)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));

    let err = access::authorize(&state.db, &dave, &group, ANY_MEMBER)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));
}

#[tokio::test]
async fn test_authorize_unknown_group_is_not_found() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;

    let err = access::authorize(&state.db, &alice, "no-such-group", ANY_MEMBER)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_outsider_cannot_touch_group_files() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let eve = register(&state, "eve").await;
    let group = create_group(&state, &alice, "private").await;

    let file = state
        .file_service
        .upload(&alice, &group, new_upload("notes.txt", b"secret"))
        .await
        .unwrap();

    let err = state.file_service.list(&eve, &group).await.unwrap_err();
    assert!(matches!(err, AppError::NotAMember));

    let err = state
        .file_service
        .download(&eve, &group, &file.id)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AppError::NotAMember));

    let err = state
        .file_service
        .upload(&eve, &group, new_upload("x.txt", b"x"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));

    let err = state
        .file_service
        .delete(&eve, &group, &file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotAMember));

    let err = state.group_service.members(&eve, &group).await.unwrap_err();
    assert!(matches!(err, AppError::NotAMember));
}

#[tokio::test]
async fn test_member_cannot_delete_others_file_but_uploader_can() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let carol = register(&state, "carol").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Member).await;
    add(&state, &alice, &group, "carol", Role::Member).await;

    let file = state
        .file_service
        .upload(&bob, &group, new_upload("bob.txt", b"from bob"))
        .await
        .unwrap();

    let err = state
        .file_service
        .delete(&carol, &group, &file.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));
    assert_eq!(state.file_service.list(&carol, &group).await.unwrap().len(), 1);

    state
        .file_service
        .delete(&bob, &group, &file.id)
        .await
        .unwrap();
    assert!(state.file_service.list(&carol, &group).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_can_delete_any_file() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let carol = register(&state, "carol").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Admin).await;
    add(&state, &alice, &group, "carol", Role::Member).await;

    let file = state
        .file_service
        .upload(&carol, &group, new_upload("carol.txt", b"from carol"))
        .await
        .unwrap();

    state
        .file_service
        .delete(&bob, &group, &file.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_plain_member_cannot_manage_membership() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    register(&state, "carol").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Member).await;

    let err = state
        .group_service
        .add_member(&bob, &group, "carol", Role::Member)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));

    let err = state
        .group_service
        .remove_member(&bob, &group, "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));

    let err = state
        .group_service
        .delete_group(&bob, &group)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));
}

#[tokio::test]
async fn test_only_owner_grants_owner_role() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    register(&state, "carol").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Admin).await;

    let err = state
        .group_service
        .add_member(&bob, &group, "carol", Role::Owner)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));

    add(&state, &alice, &group, "carol", Role::Owner).await;
    assert_eq!(state.group_service.owner_count(&group).await.unwrap(), 2);
}

#[tokio::test]
async fn test_admin_cannot_remove_owner() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    register(&state, "carol").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Admin).await;
    add(&state, &alice, &group, "carol", Role::Owner).await;

    let err = state
        .group_service
        .remove_member(&bob, &group, "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientPermission));
    assert_eq!(state.group_service.owner_count(&group).await.unwrap(), 2);
}
