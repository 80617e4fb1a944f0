mod common;

use common::*;
use groupvault::entities::activities::ActivityKind;
use groupvault::entities::group_memberships::Role;
use groupvault::services::activity::MAX_ACTIVITY_LIMIT;

#[tokio::test]
async fn test_operations_append_entries_newest_first() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Member).await;

    let file = state
        .file_service
        .upload(&bob, &group, new_upload("report.pdf", b"0123456789"))
        .await
        .unwrap();
    let _ = state
        .file_service
        .download(&alice, &group, &file.id)
        .await
        .ok()
        .unwrap();
    state
        .file_service
        .delete(&alice, &group, &file.id)
        .await
        .unwrap();
    state
        .group_service
        .remove_member(&alice, &group, "bob")
        .await
        .unwrap();

    let entries = state
        .activity
        .recent_for_groups(&[group.clone()], 50)
        .await
        .unwrap();
    let kinds: Vec<ActivityKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActivityKind::UserRemoved,
            ActivityKind::Delete,
            ActivityKind::Download,
            ActivityKind::Upload,
            ActivityKind::UserJoined,
            ActivityKind::GroupCreated,
        ]
    );

    let upload = &entries[3];
    assert_eq!(upload.user_id, bob);
    assert_eq!(upload.file_id.as_deref(), Some(file.id.as_str()));
    let metadata = upload.metadata.as_ref().unwrap();
    assert_eq!(metadata["filename"], "report.pdf");
    assert_eq!(metadata["size"], 10);

    let removed = &entries[0];
    assert_eq!(removed.user_id, alice);
    assert_eq!(removed.metadata.as_ref().unwrap()["target_username"], "bob");
}

#[tokio::test]
async fn test_failed_operations_leave_no_trace() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Member).await;

    let file = state
        .file_service
        .upload(&alice, &group, new_upload("a.txt", b"a"))
        .await
        .unwrap();

    assert!(state.file_service.download(&alice, &group, "missing").await.is_err());
    assert!(state.file_service.delete(&bob, &group, &file.id).await.is_err());
    assert!(state.file_service.upload(&bob, &group, new_upload("e.txt", b"")).await.is_err());
    assert!(state.group_service.remove_member(&alice, &group, "alice").await.is_err());

    let entries = state
        .activity
        .recent_for_groups(&[group.clone()], 50)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| matches!(
        e.kind,
        ActivityKind::GroupCreated | ActivityKind::UserJoined | ActivityKind::Upload
    )));
}

#[tokio::test]
async fn test_history_outlives_deleted_group() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let group = create_group(&state, &alice, "short-lived").await;
    state
        .file_service
        .upload(&alice, &group, new_upload("a.txt", b"a"))
        .await
        .unwrap();
    state
        .group_service
        .delete_group(&alice, &group)
        .await
        .unwrap();

    let entries = state
        .activity
        .recent_for_groups(&[group.clone()], 50)
        .await
        .unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, ActivityKind::GroupDeleted);
    assert_eq!(entries[0].metadata.as_ref().unwrap()["files_soft_deleted"], 1);

    // No longer a member of anything, yet authored history stays visible
    let feed = state.activity.recent_for_user(&alice, 50).await.unwrap();
    assert_eq!(feed.len(), 3);
    assert_eq!(feed[0].kind, ActivityKind::GroupDeleted);
    assert_eq!(feed[0].group_id.as_deref(), Some(group.as_str()));
}

#[tokio::test]
async fn test_user_feed_keeps_own_entries_after_leaving() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let group = create_group(&state, &alice, "team").await;
    add(&state, &alice, &group, "bob", Role::Member).await;
    state
        .file_service
        .upload(&bob, &group, new_upload("b.txt", b"b"))
        .await
        .unwrap();
    state
        .file_service
        .upload(&alice, &group, new_upload("a.txt", b"a"))
        .await
        .unwrap();
    state
        .group_service
        .remove_member(&alice, &group, "bob")
        .await
        .unwrap();

    let feed = state.activity.recent_for_user(&bob, 50).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].kind, ActivityKind::Upload);
    assert_eq!(feed[0].user_id, bob);
}

#[tokio::test]
async fn test_user_feed_spans_own_groups_only() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let bob = register(&state, "bob").await;
    let shared = create_group(&state, &alice, "shared").await;
    let private = create_group(&state, &alice, "private").await;
    let other = create_group(&state, &bob, "other").await;
    add(&state, &alice, &shared, "bob", Role::Member).await;

    let feed = state.activity.recent_for_user(&bob, 50).await.unwrap();
    assert!(!feed.is_empty());
    assert!(feed.iter().all(|e| {
        let g = e.group_id.as_deref();
        g == Some(shared.as_str()) || g == Some(other.as_str())
    }));
    assert!(feed.iter().all(|e| e.group_id.as_deref() != Some(private.as_str())));

    let loner = register(&state, "loner").await;
    assert!(state.activity.recent_for_user(&loner, 50).await.unwrap().is_empty());
    assert!(state.activity.recent_for_groups(&[], 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_limit_is_clamped() {
    let (state, _) = test_state().await;
    let alice = register(&state, "alice").await;
    let group = create_group(&state, &alice, "busy").await;

    for i in 0..(MAX_ACTIVITY_LIMIT + 5) {
        state
            .file_service
            .upload(&alice, &group, new_upload(&format!("f{}.txt", i), b"x"))
            .await
            .unwrap();
    }

    let groups = [group.clone()];
    assert_eq!(state.activity.recent_for_groups(&groups, 0).await.unwrap().len(), 1);
    assert_eq!(state.activity.recent_for_groups(&groups, 3).await.unwrap().len(), 3);
    assert_eq!(
        state.activity.recent_for_groups(&groups, 10_000).await.unwrap().len() as u64,
        MAX_ACTIVITY_LIMIT
    );
}
