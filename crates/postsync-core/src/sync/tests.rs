use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::engine::AUTO_DRAIN_SUMMARY_CAPACITY;
use super::{DeleteOutcome, PostSyncEngine};
use crate::config::EngineConfig;
use crate::connectivity::ConnectivitySignal;
use crate::models::{MergedEntry, PendingStatus, Post, RemotePost, SyncStatus};
use crate::remote::{MockRemoteStore, RemoteOp};
use crate::services::DatabaseService;
use crate::Error;

type Engine = PostSyncEngine<MockRemoteStore>;

fn remote(id: i64) -> RemotePost {
    RemotePost {
        id,
        title: format!("Remote {id}"),
        body: format!("Body {id}"),
        user_id: Some(1),
    }
}

fn remote_range(ids: std::ops::RangeInclusive<i64>) -> Vec<RemotePost> {
    ids.map(remote).collect()
}

async fn engine_with(remote: MockRemoteStore, online: bool) -> Arc<Engine> {
    let store = DatabaseService::open_in_memory().await.unwrap();
    Arc::new(PostSyncEngine::new(
        store,
        Arc::new(remote),
        Arc::new(ConnectivitySignal::new(online)),
        EngineConfig::default(),
    ))
}

#[tokio::test(flavor = "multi_thread")]
async fn online_mutations_reach_remote_store() {
    let engine = engine_with(MockRemoteStore::with_posts([remote(1)]), true).await;

    let created = engine.create_post("  Hello  ", "World").await.unwrap();
    assert_eq!(created.title, "Hello");
    assert_eq!(created.server_id, Some(2));
    assert!(created.is_converged());
    assert!(created.created_locally);

    let tracked = engine.track_remote_post(&remote(1)).await.unwrap();
    let updated = engine
        .update_post(&tracked.local_id, Some("Edited".to_string()), None)
        .await
        .unwrap();
    assert!(updated.is_converged());
    assert_eq!(updated.body, "Body 1");
    assert_eq!(engine.remote().post(1).unwrap().title, "Edited");

    let outcome = engine.delete_post(&tracked.local_id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Removed);
    assert!(engine.remote().post(1).is_none());
    assert!(engine.is_remote_deleted(1));
    assert!(matches!(
        engine.get_post(&tracked.local_id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_mutations_converge_after_drain() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(1..=2)), true).await;
    let fetched = engine.track_remote_post(&remote(1)).await.unwrap();
    let doomed = engine.track_remote_post(&remote(2)).await.unwrap();

    engine.connectivity().set_online(false);
    let first = engine.create_post("First", "one").await.unwrap();
    let second = engine.create_post("Second", "two").await.unwrap();
    let second = engine
        .update_post(&second.local_id, None, Some("two, edited".to_string()))
        .await
        .unwrap();
    let fetched = engine
        .update_post(&fetched.local_id, Some("Offline edit".to_string()), None)
        .await
        .unwrap();
    assert_eq!(
        engine.delete_post(&doomed.local_id).await.unwrap(),
        DeleteOutcome::Queued
    );
    assert_eq!(engine.remote().mutation_calls(), 0);

    for post in [&first, &second, &fetched] {
        assert!(post.pending_status.is_pending(), "{post:?}");
    }
    assert_eq!(fetched.sync_status, SyncStatus::NeedsSync);
    assert_eq!(
        engine.get_post(&doomed.local_id).await.unwrap().pending_status,
        PendingStatus::Delete
    );

    engine.connectivity().set_online(true);
    let summary = engine.drain_pending().await.unwrap();
    assert_eq!(summary.success, 4);
    assert_eq!(summary.failure, 0);

    for before in [&first, &second, &fetched] {
        let after = engine.get_post(&before.local_id).await.unwrap();
        assert_eq!(after.pending_status, PendingStatus::None);
        assert_eq!(after.sync_status, SyncStatus::Synced);
        assert_eq!(after.title, before.title);
        assert_eq!(after.body, before.body);
        assert!(after.server_id.is_some());
        assert_eq!(after.last_sync_error, None);
    }
    let second_remote = engine
        .get_post(&second.local_id)
        .await
        .unwrap()
        .server_id
        .and_then(|id| engine.remote().post(id))
        .unwrap();
    assert_eq!(second_remote.body, "two, edited");
    assert_eq!(engine.remote().post(1).unwrap().title, "Offline edit");

    assert!(engine.get_post(&doomed.local_id).await.is_err());
    assert!(engine.remote().post(2).is_none());
    assert!(engine.is_remote_deleted(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn second_drain_with_no_mutations_is_empty() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    engine.create_post("A", "a").await.unwrap();
    engine.create_post("B", "b").await.unwrap();

    engine.connectivity().set_online(true);
    let first = engine.drain_pending().await.unwrap();
    assert_eq!(first.success, 2);

    let second = engine.drain_pending().await.unwrap();
    assert_eq!(second.attempted(), 0);
    assert_eq!(engine.remote().calls(RemoteOp::Create), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn merged_view_prefers_tracked_posts() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(1..=3)), true).await;

    let mut one = Post::from_remote(&remote(1));
    one.created_at = 2_000;
    let mut two = Post::from_remote(&remote(2));
    two.created_at = 1_000;
    engine.store().create_posts(&[one, two]).await.unwrap();

    let view = engine.get_merged_view(0, 10).await.unwrap();

    let shape = view
        .iter()
        .map(|entry| (entry.is_local(), entry.server_id()))
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        vec![(true, Some(1)), (true, Some(2)), (false, Some(3))]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn remotely_deleted_ids_stay_hidden_from_stale_pages() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(4..=6)), true).await;
    engine.remote().set_stale_deletes(true);

    let tracked = engine.track_remote_post(&remote(5)).await.unwrap();
    engine.delete_post(&tracked.local_id).await.unwrap();
    assert!(engine.remote().post(5).is_some());

    let view = engine.get_merged_view(0, 10).await.unwrap();
    assert_eq!(view.server_ids(), vec![4, 6]);
    assert!(matches!(
        engine.track_remote_post(&remote(5)).await,
        Err(Error::InvalidState(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn partial_drain_failure_keeps_failed_post_queued() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    let ok_a = engine.create_post("A", "a").await.unwrap();
    let broken = engine.create_post("B", "b").await.unwrap();
    let ok_c = engine.create_post("C", "c").await.unwrap();
    engine.remote().fail_title("B");

    engine.connectivity().set_online(true);
    let summary = engine.drain_pending().await.unwrap();

    assert_eq!(summary.success, 2);
    assert_eq!(summary.failure, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].contains(&broken.local_id.to_string()));

    let broken = engine.get_post(&broken.local_id).await.unwrap();
    assert_eq!(broken.pending_status, PendingStatus::Create);
    assert_eq!(broken.sync_status, SyncStatus::Failed);
    assert!(broken.last_sync_error.is_some());
    for id in [ok_a.local_id, ok_c.local_id] {
        assert!(engine.get_post(&id).await.unwrap().is_converged());
    }

    engine.remote().clear_failures();
    let retry = engine.drain_pending().await.unwrap();
    assert_eq!((retry.success, retry.failure), (1, 0));
}

#[tokio::test(flavor = "multi_thread")]
async fn local_only_delete_is_removed_without_remote_call() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    let post = engine.create_post("Draft", "body").await.unwrap();
    assert_eq!(post.sync_status, SyncStatus::LocalOnly);

    assert_eq!(
        engine.delete_post(&post.local_id).await.unwrap(),
        DeleteOutcome::Queued
    );
    let tombstone = engine.get_post(&post.local_id).await.unwrap();
    assert!(tombstone.is_deleted);
    assert_eq!(tombstone.pending_status, PendingStatus::Delete);
    assert!(engine.refresh_merged_view().await.unwrap().is_empty());

    engine.connectivity().set_online(true);
    let summary = engine.drain_pending().await.unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(engine.remote().mutation_calls(), 0);
    assert!(engine.get_post(&post.local_id).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_counts_local_states() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(10..=12)), true).await;
    engine.get_merged_view(0, 10).await.unwrap();
    let edited = engine.track_remote_post(&remote(10)).await.unwrap();
    engine.track_remote_post(&remote(11)).await.unwrap();

    engine.connectivity().set_online(false);
    engine.create_post("Local A", "a").await.unwrap();
    engine.create_post("Local B", "b").await.unwrap();
    engine
        .update_post(&edited.local_id, Some("Queued edit".to_string()), None)
        .await
        .unwrap();

    let stats = engine.dashboard_stats().await.unwrap();
    assert_eq!(stats.local_only_count, 2);
    assert_eq!(stats.needs_sync_count, 1);
    assert_eq!(stats.total_count, 5);
    assert_eq!(stats.recent.len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn mutations_reject_unknown_and_tombstoned_posts() {
    let engine = engine_with(MockRemoteStore::with_posts([remote(7)]), false).await;
    let unknown = crate::models::PostId::new();

    assert!(matches!(
        engine.update_post(&unknown, Some("x".to_string()), None).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        engine.delete_post(&unknown).await,
        Err(Error::NotFound(_))
    ));

    let tracked = engine.track_remote_post(&remote(7)).await.unwrap();
    engine.delete_post(&tracked.local_id).await.unwrap();
    assert!(matches!(
        engine.delete_post(&tracked.local_id).await,
        Err(Error::InvalidState(_))
    ));
    assert!(matches!(
        engine.update_post(&tracked.local_id, None, Some("b".to_string())).await,
        Err(Error::InvalidState(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_blank_title() {
    let engine = engine_with(MockRemoteStore::new(), true).await;
    assert!(matches!(
        engine.create_post("   ", "body").await,
        Err(Error::InvalidInput(_))
    ));
    assert_eq!(engine.remote().mutation_calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_remote_update_still_updates_locally() {
    let engine = engine_with(MockRemoteStore::with_posts([remote(3)]), true).await;
    let tracked = engine.track_remote_post(&remote(3)).await.unwrap();
    engine.remote().fail_server_id(3);

    let updated = engine
        .update_post(&tracked.local_id, Some("Kept".to_string()), None)
        .await
        .unwrap();

    assert_eq!(updated.title, "Kept");
    assert_eq!(updated.pending_status, PendingStatus::Update);
    assert_eq!(updated.sync_status, SyncStatus::NeedsSync);
    assert!(updated.last_sync_error.unwrap().contains("503"));
    assert_eq!(engine.get_post(&tracked.local_id).await.unwrap().title, "Kept");

    let summary = engine.drain_pending().await.unwrap();
    assert_eq!(summary.failure, 1);
    let failed = engine.get_post(&tracked.local_id).await.unwrap();
    assert_eq!(failed.pending_status, PendingStatus::Update);
    assert_eq!(failed.sync_status, SyncStatus::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn online_edit_carries_earlier_queued_edit() {
    let engine = engine_with(MockRemoteStore::with_posts([remote(1)]), true).await;
    let tracked = engine.track_remote_post(&remote(1)).await.unwrap();

    engine.connectivity().set_online(false);
    engine
        .update_post(&tracked.local_id, Some("Offline title".to_string()), None)
        .await
        .unwrap();

    engine.connectivity().set_online(true);
    let updated = engine
        .update_post(&tracked.local_id, None, Some("Online body".to_string()))
        .await
        .unwrap();
    assert!(updated.is_converged());

    let server = engine.remote().post(1).unwrap();
    assert_eq!(server.title, "Offline title");
    assert_eq!(server.body, "Online body");
    assert_eq!(engine.drain_pending().await.unwrap().attempted(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_edit_of_failed_create_stays_failed() {
    let engine = engine_with(MockRemoteStore::new(), true).await;
    engine.remote().fail_title("Draft");
    let post = engine.create_post("Draft", "v1").await.unwrap();
    engine.drain_pending().await.unwrap();
    assert_eq!(
        engine.get_post(&post.local_id).await.unwrap().sync_status,
        SyncStatus::Failed
    );

    engine.connectivity().set_online(false);
    let edited = engine
        .update_post(&post.local_id, None, Some("v2".to_string()))
        .await
        .unwrap();
    assert_eq!(edited.pending_status, PendingStatus::Create);
    assert_eq!(edited.sync_status, SyncStatus::Failed);

    engine.remote().clear_failures();
    engine.connectivity().set_online(true);
    assert_eq!(engine.drain_pending().await.unwrap().success, 1);
    assert!(engine.get_post(&post.local_id).await.unwrap().is_converged());
}

#[tokio::test(flavor = "multi_thread")]
async fn unsynced_local_post_edit_rides_on_queued_create() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    let post = engine.create_post("Draft", "v1").await.unwrap();

    let edited = engine
        .update_post(&post.local_id, None, Some("v2".to_string()))
        .await
        .unwrap();
    assert_eq!(edited.pending_status, PendingStatus::Create);
    assert_eq!(edited.sync_status, SyncStatus::LocalOnly);

    engine.connectivity().set_online(true);
    engine.drain_pending().await.unwrap();

    let synced = engine.get_post(&post.local_id).await.unwrap();
    let server_id = synced.server_id.unwrap();
    assert_eq!(engine.remote().post(server_id).unwrap().body, "v2");
    assert_eq!(engine.remote().calls(RemoteOp::Create), 1);
    assert_eq!(engine.remote().calls(RemoteOp::Update), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn queued_update_of_app_created_post_resolves_locally() {
    let engine = engine_with(MockRemoteStore::new(), true).await;
    let post = engine.create_post("Synced", "body").await.unwrap();

    engine.connectivity().set_online(false);
    let queued = engine
        .update_post(&post.local_id, Some("Later".to_string()), None)
        .await
        .unwrap();
    assert_eq!(queued.pending_status, PendingStatus::Update);

    engine.connectivity().set_online(true);
    let summary = engine.drain_pending().await.unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(engine.remote().calls(RemoteOp::Update), 0);
    assert!(engine.get_post(&post.local_id).await.unwrap().is_converged());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_of_post_missing_remotely_settles() {
    let engine = engine_with(MockRemoteStore::new(), true).await;
    let tracked = engine.track_remote_post(&remote(99)).await.unwrap();

    let outcome = engine.delete_post(&tracked.local_id).await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Removed);
    assert!(engine.is_remote_deleted(99));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_page_fetch_keeps_cached_items() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(1..=3)), true).await;
    let loaded = engine.get_merged_view(0, 10).await.unwrap();
    assert_eq!(loaded.len(), 3);

    engine.remote().fail_op(RemoteOp::List, true);
    assert!(matches!(
        engine.get_merged_view(1, 10).await,
        Err(Error::Remote(_))
    ));
    assert_eq!(engine.refresh_merged_view().await.unwrap(), loaded);

    engine.connectivity().set_online(false);
    assert!(engine.get_merged_view(0, 10).await.is_err());
    assert!(matches!(
        engine.get_merged_view(0, 0).await,
        Err(Error::InvalidInput(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn next_page_appends_until_short_page() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(1..=15)), true).await;

    let first = engine.get_merged_view(0, 10).await.unwrap();
    assert_eq!(first.len(), 10);
    assert!(engine.can_load_more());

    let second = engine.load_next_page().await.unwrap();
    assert_eq!(second.server_ids(), (1..=15).collect::<Vec<_>>());
    assert!(!engine.can_load_more());

    let third = engine.load_next_page().await.unwrap();
    assert_eq!(third.len(), 15);
    assert_eq!(engine.remote().calls(RemoteOp::List), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn next_page_offline_makes_no_remote_call() {
    let engine = engine_with(MockRemoteStore::with_posts(remote_range(1..=3)), false).await;
    let view = engine.load_next_page().await.unwrap();
    assert!(view.is_empty());
    assert_eq!(engine.remote().calls(RemoteOp::List), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn tracking_is_idempotent_per_server_id() {
    let engine = engine_with(MockRemoteStore::with_posts([remote(8)]), true).await;
    let first = engine.track_remote_post(&remote(8)).await.unwrap();
    let again = engine.track_remote_post(&remote(8)).await.unwrap();
    assert_eq!(first.local_id, again.local_id);

    let view = engine.get_merged_view(0, 10).await.unwrap();
    assert_eq!(view.len(), 1);
    assert!(matches!(&view.entries[0], MergedEntry::Local(post) if !post.created_locally));
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_drains_dispatch_each_post_once() {
    let remote = MockRemoteStore::new().with_latency(Duration::from_millis(20));
    let engine = engine_with(remote, false).await;
    for title in ["A", "B", "C"] {
        engine.create_post(title, "body").await.unwrap();
    }
    engine.connectivity().set_online(true);

    let (first, second) = tokio::join!(engine.drain_pending(), engine.drain_pending());
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.success + second.success, 3);
    assert_eq!(first.failure + second.failure, 0);
    assert_eq!(engine.remote().calls(RemoteOp::Create), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_drain_runs_on_reconnect() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    let mut auto = engine.spawn_auto_drain();

    engine.create_post("Queued", "body").await.unwrap();
    engine.connectivity().set_online(true);

    let summary = tokio::time::timeout(Duration::from_secs(2), auto.next_summary())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.success, 1);
    assert_eq!(engine.dashboard_stats().await.unwrap().local_only_count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_drain_ignores_state_at_subscription() {
    let engine = engine_with(MockRemoteStore::new(), true).await;
    engine.connectivity().set_online(false);
    engine.create_post("Queued", "body").await.unwrap();
    engine.connectivity().set_online(true);

    let mut auto = engine.spawn_auto_drain();
    let idle = tokio::time::timeout(Duration::from_millis(100), auto.next_summary()).await;
    assert!(idle.is_err());
    assert_eq!(engine.remote().calls(RemoteOp::Create), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn unread_auto_drain_summaries_are_bounded() {
    let engine = engine_with(MockRemoteStore::new(), false).await;
    let mut auto = engine.spawn_auto_drain();
    let cycles = AUTO_DRAIN_SUMMARY_CAPACITY + 3;

    for cycle in 1..=cycles {
        engine.create_post("Queued", "body").await.unwrap();
        engine.connectivity().set_online(true);
        tokio::time::timeout(Duration::from_secs(2), async {
            while engine.remote().calls(RemoteOp::Create) < cycle {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        engine.connectivity().set_online(false);
    }
    // Let the last drain publish before reading frees buffer slots.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut buffered = 0;
    while let Ok(Some(_)) =
        tokio::time::timeout(Duration::from_millis(100), auto.next_summary()).await
    {
        buffered += 1;
    }
    assert_eq!(buffered, AUTO_DRAIN_SUMMARY_CAPACITY);
}
