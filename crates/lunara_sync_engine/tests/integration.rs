//! Integration tests for the practice sync engine.

use lunara_core::{PracticeContent, PracticeEntry, PracticeType};
use lunara_storage::{FileStore, InMemoryStore};
use lunara_sync_engine::{
    ConnectivitySignal, MockRemoteStore, PracticeSyncEngine, SyncConfig,
};
use std::sync::Arc;
use std::time::Duration;

type Engine<L> = PracticeSyncEngine<L, Arc<MockRemoteStore>>;

fn config() -> SyncConfig {
    SyncConfig::new("user-1")
        .with_rng_seed(7)
        .with_immediate_push(false)
}

fn open(
    config: SyncConfig,
) -> (Engine<Arc<InMemoryStore>>, Arc<InMemoryStore>, Arc<MockRemoteStore>) {
    let local = Arc::new(InMemoryStore::new());
    let remote = Arc::new(MockRemoteStore::new());
    let engine =
        PracticeSyncEngine::open(config, Arc::clone(&local), Arc::clone(&remote)).unwrap();
    (engine, local, remote)
}

fn reflection(response: &str) -> PracticeContent {
    PracticeContent::Reflection {
        prompt: "What helped today?".into(),
        response: response.into(),
    }
}

async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn offline_sync_is_a_noop() {
    let (engine, _local, remote) = open(config());
    engine.create_entry(reflection("rest"), None).unwrap();

    engine.sync_pending_entries().await.unwrap();

    assert_eq!(remote.upsert_calls(), 0);
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test]
async fn concurrent_sync_call_is_a_noop() {
    // P5: a second call starting before the first settles performs no
    // additional network round trips.
    let (engine, _local, remote) = open(config());
    engine.set_online(true).await;
    engine.create_entry(reflection("one"), None).unwrap();
    engine.create_entry(reflection("two"), None).unwrap();

    remote.pause_writes();
    let first = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.sync_pending_entries().await })
    };
    {
        let remote = Arc::clone(&remote);
        wait_for(move || remote.upsert_calls() == 2).await;
    }
    assert!(engine.is_syncing());
    assert!(engine.status().is_syncing);

    // Second call while the first is in flight: silent no-op.
    engine.sync_pending_entries().await.unwrap();
    assert_eq!(remote.upsert_calls(), 2);

    remote.resume_writes();
    first.await.unwrap().unwrap();

    assert_eq!(remote.upsert_calls(), 2);
    assert_eq!(engine.pending_count(), 0);
    assert!(!engine.is_syncing());
    assert!(engine.get_entries(None).iter().all(|e| e.synced));
    assert_eq!(remote.entries_for("user-1").len(), 2);
}

#[tokio::test]
async fn edit_during_in_flight_push_stays_queued() {
    // Confirmation names the revision that went over the wire; an edit
    // landing mid-push must not be marked synced by the stale push.
    let (engine, _local, remote) = open(config());
    engine.set_online(true).await;
    let entry = engine.create_entry(reflection("first draft"), None).unwrap();

    remote.pause_writes();
    let pass = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.sync_pending_entries().await })
    };
    {
        let remote = Arc::clone(&remote);
        wait_for(move || remote.upsert_calls() == 1).await;
    }
    engine
        .update_entry(&entry.entry_id, reflection("second draft"))
        .unwrap();

    remote.resume_writes();
    pass.await.unwrap().unwrap();

    let revised = engine.get_entry(&entry.entry_id).unwrap();
    assert!(!revised.synced);
    assert_eq!(engine.pending_count(), 1);

    // The next pass carries the revision through.
    engine.sync_pending_entries().await.unwrap();
    assert!(engine.get_entry(&entry.entry_id).unwrap().synced);
    assert_eq!(
        remote.entry("user-1", &entry.entry_id).unwrap().content,
        reflection("second draft")
    );
}

#[tokio::test]
async fn offline_create_then_initial_sync_pushes_once() {
    // P6: an entry created offline is pushed after reconnect, marked
    // synced, and not duplicated.
    let (engine, _local, remote) = open(config());

    let entry = engine.create_entry(reflection("walk"), None).unwrap();
    assert!(!entry.synced);
    assert_eq!(engine.pending_count(), 1);
    assert_eq!(remote.upsert_calls(), 0);

    engine.set_online(true).await;
    engine.initial_sync().await.unwrap();

    let local_entries = engine.get_entries(None);
    assert_eq!(local_entries.len(), 1);
    assert!(local_entries[0].synced);
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(remote.entries_for("user-1").len(), 1);
}

#[tokio::test]
async fn initial_sync_pulls_before_pushing() {
    let (engine, _local, remote) = open(config());
    remote.seed_entry(
        "user-1",
        sample_remote_entry("reflection_100_remote", "from another device"),
    );
    let local = engine.create_entry(reflection("local note"), None).unwrap();

    engine.set_online(true).await;
    engine.initial_sync().await.unwrap();

    // Both the remote snapshot and the pending local entry survive.
    let entries = engine.get_entries(None);
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.synced));
    assert!(engine.get_entry("reflection_100_remote").is_some());
    assert!(remote.entry("user-1", &local.entry_id).is_some());
}

#[tokio::test]
async fn remote_wins_on_fetch() {
    // P7: a remote revision overwrites an unsynced local edit.
    let (engine, _local, remote) = open(config());
    engine
        .create_entry(reflection("local draft"), Some("reflection_1_aaaaaa".into()))
        .unwrap();
    remote.seed_entry(
        "user-1",
        sample_remote_entry("reflection_1_aaaaaa", "remote revision"),
    );

    engine.fetch_from_backend().await.unwrap();

    let merged = engine.get_entry("reflection_1_aaaaaa").unwrap();
    assert_eq!(merged.content, reflection("remote revision"));
    assert!(merged.synced);
    assert_eq!(engine.pending_count(), 0);
}

#[tokio::test]
async fn failed_upserts_stay_queued_and_retry() {
    let (engine, _local, remote) = open(config());
    engine.set_online(true).await;
    remote.set_fail_writes(true);

    let entry = engine.create_entry(reflection("rough day"), None).unwrap();
    engine.sync_pending_entries().await.unwrap();

    assert_eq!(remote.upsert_calls(), 1);
    assert_eq!(engine.pending_count(), 1);
    assert!(!engine.get_entry(&entry.entry_id).unwrap().synced);

    remote.set_fail_writes(false);
    engine.sync_pending_entries().await.unwrap();

    assert_eq!(engine.pending_count(), 0);
    assert!(engine.get_entry(&entry.entry_id).unwrap().synced);
}

#[tokio::test]
async fn one_failure_does_not_block_other_entries() {
    // Per-entry best effort: a failing id leaves only itself queued.
    let (engine, _local, remote) = open(config());
    engine.set_online(true).await;
    engine.create_entry(reflection("one"), None).unwrap();
    engine.create_entry(reflection("two"), None).unwrap();

    // Fail the whole first pass, then let the retry succeed; both paths
    // go through the same queue.
    remote.set_fail_writes(true);
    engine.sync_pending_entries().await.unwrap();
    assert_eq!(engine.pending_count(), 2);

    remote.set_fail_writes(false);
    engine.sync_pending_entries().await.unwrap();
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(remote.entries_for("user-1").len(), 2);
}

#[tokio::test]
async fn fetch_failure_leaves_local_state_untouched() {
    let (engine, _local, remote) = open(config());
    let entry = engine.create_entry(reflection("draft"), None).unwrap();
    remote.set_fail_reads(true);

    engine.fetch_from_backend().await.unwrap();

    assert_eq!(remote.get_all_calls(), 1);
    let unchanged = engine.get_entry(&entry.entry_id).unwrap();
    assert!(!unchanged.synced);
    assert_eq!(engine.pending_count(), 1);
    assert!(!engine.is_syncing());

    // The in-progress flag was cleared, so a later fetch goes through.
    remote.set_fail_reads(false);
    engine.fetch_from_backend().await.unwrap();
    assert_eq!(remote.get_all_calls(), 2);
}

#[tokio::test]
async fn reconnect_flushes_pending_entries() {
    let (engine, _local, remote) = open(config());
    let entry = engine.create_entry(reflection("offline note"), None).unwrap();

    engine.set_online(true).await;

    assert!(engine.get_entry(&entry.entry_id).unwrap().synced);
    assert_eq!(engine.pending_count(), 0);
    assert_eq!(remote.entries_for("user-1").len(), 1);

    // Going offline only flips the flag.
    engine.set_online(false).await;
    assert!(!engine.is_online());
}

#[tokio::test]
async fn connectivity_signal_drives_the_engine() {
    let (engine, _local, remote) = open(config());
    let signal = ConnectivitySignal::new(false);
    engine.attach_connectivity(&signal);

    engine.create_entry(reflection("queued"), None).unwrap();
    signal.set_online(true);

    {
        let engine = engine.clone();
        wait_for(move || engine.is_online() && engine.pending_count() == 0).await;
    }
    assert_eq!(remote.entries_for("user-1").len(), 1);
}

#[tokio::test]
async fn immediate_push_syncs_a_created_entry() {
    let (engine, _local, remote) = open(config().with_immediate_push(true));
    engine.set_online(true).await;

    let entry = engine.create_entry(reflection("quick"), None).unwrap();
    // The call returned before the push settled.
    {
        let engine = engine.clone();
        let id = entry.entry_id.clone();
        wait_for(move || engine.get_entry(&id).unwrap().synced).await;
    }
    assert_eq!(engine.pending_count(), 0);
    assert!(remote.entry("user-1", &entry.entry_id).is_some());
}

#[tokio::test]
async fn immediate_push_failure_is_swallowed() {
    let (engine, _local, remote) = open(config().with_immediate_push(true));
    engine.set_online(true).await;
    remote.set_fail_writes(true);

    let entry = engine.create_entry(reflection("flaky network"), None).unwrap();
    {
        let remote = Arc::clone(&remote);
        wait_for(move || remote.upsert_calls() >= 1).await;
    }

    // The create succeeded locally and the entry is still queued.
    assert!(!engine.get_entry(&entry.entry_id).unwrap().synced);
    assert_eq!(engine.pending_count(), 1);
}

#[tokio::test]
async fn local_delete_is_resurrected_by_fetch() {
    // Deletes do not propagate to the remote store; a later fetch
    // brings the entry back.
    let (engine, _local, remote) = open(config());
    let entry = engine.create_entry(reflection("short lived"), None).unwrap();
    engine.set_online(true).await;
    assert!(remote.entry("user-1", &entry.entry_id).is_some());

    engine.delete_entry(&entry.entry_id).unwrap();
    assert!(engine.get_entries(None).is_empty());

    engine.fetch_from_backend().await.unwrap();
    let resurrected = engine.get_entry(&entry.entry_id).unwrap();
    assert!(resurrected.synced);
}

#[tokio::test]
async fn status_subscription_observes_a_sync_pass() {
    let (engine, _local, _remote) = open(config());
    let rx = engine.subscribe();
    assert_eq!(rx.try_recv().unwrap().pending_count, 0);

    engine.create_entry(reflection("note"), None).unwrap();
    engine.set_online(true).await;

    let statuses: Vec<_> = rx.try_iter().collect();
    assert!(statuses.iter().any(|s| s.pending_count == 1));
    assert!(statuses.iter().any(|s| s.is_syncing));
    let last = statuses.last().unwrap();
    assert!(last.is_online);
    assert!(!last.is_syncing);
    assert_eq!(last.pending_count, 0);
    assert!(last.last_sync_time.is_some());
}

#[tokio::test]
async fn engine_state_survives_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let remote = Arc::new(MockRemoteStore::new());

    let entry_id;
    {
        let store = FileStore::open(&path).unwrap();
        let engine =
            PracticeSyncEngine::open(config(), store, Arc::clone(&remote)).unwrap();
        entry_id = engine
            .create_entry(reflection("before restart"), None)
            .unwrap()
            .entry_id;
    }

    let store = FileStore::open(&path).unwrap();
    let engine = PracticeSyncEngine::open(config(), store, Arc::clone(&remote)).unwrap();
    assert_eq!(engine.pending_count(), 1);
    assert_eq!(
        engine.get_entry(&entry_id).unwrap().content,
        reflection("before restart")
    );

    engine.set_online(true).await;
    assert!(remote.entry("user-1", &entry_id).is_some());
}

#[tokio::test]
async fn filtered_reads_never_touch_the_network() {
    let (engine, _local, remote) = open(config());
    engine.create_entry(reflection("one"), None).unwrap();
    engine
        .create_entry(
            PracticeContent::Gratitude {
                items: vec!["rain".into()],
            },
            None,
        )
        .unwrap();

    let reflections = engine.get_entries(Some(PracticeType::Reflection));
    assert_eq!(reflections.len(), 1);
    assert_eq!(remote.get_all_calls(), 0);
    assert_eq!(remote.upsert_calls(), 0);
}

fn sample_remote_entry(entry_id: &str, response: &str) -> PracticeEntry {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let mut rng = StdRng::seed_from_u64(0);
    PracticeEntry::new(
        "user-1",
        reflection(response),
        Some(entry_id.to_string()),
        chrono::Utc::now(),
        &mut rng,
    )
}
