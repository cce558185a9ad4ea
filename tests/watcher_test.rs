//! End-to-end watcher behavior against a real file system.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pathwatch::{ChangeEvent, EventKinds, FileWatcher, FnProcessor, LogProcessor};
use tempfile::TempDir;

type CallLog = Arc<Mutex<Vec<(usize, Vec<ChangeEvent>)>>>;

/// Processor that records each call with a global sequence number.
fn recording(name: &str, seq: Arc<AtomicUsize>) -> (Arc<dyn pathwatch::EventProcessor>, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::clone(&log);
    let processor = Arc::new(FnProcessor::new(name, move |batch: &[ChangeEvent]| {
        let n = seq.fetch_add(1, Ordering::SeqCst);
        calls.lock().push((n, batch.to_vec()));
    }));
    (processor, log)
}

async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread")]
async fn test_batch_fans_out_to_both_processors_in_order() {
    let dir = TempDir::new().unwrap();
    let seq = Arc::new(AtomicUsize::new(0));
    let (p1, log1) = recording("p1", Arc::clone(&seq));
    let (p2, log2) = recording("p2", Arc::clone(&seq));

    let (_config, watcher) = FileWatcher::builder()
        .watch(dir.path())
        .for_events(EventKinds::CREATE | EventKinds::MODIFY)
        .infinite(true)
        .processor_arc(p1)
        .processor_arc(p2)
        .build()
        .unwrap();

    watcher.start().unwrap();
    // Give the platform subscription a moment to become effective
    tokio::time::sleep(Duration::from_millis(250)).await;

    fs::write(dir.path().join("new.txt"), "hello").unwrap();

    let delivered = wait_for(|| !log1.lock().is_empty() && !log2.lock().is_empty()).await;
    watcher.stop();
    assert!(delivered, "no events delivered within timeout");

    let calls1 = log1.lock();
    let calls2 = log2.lock();

    // Registration-order synchronous fan-out: for each dispatched batch,
    // p1 runs before p2 and both see identical contents.
    let (seq1, batch1) = &calls1[0];
    let (seq2, batch2) = &calls2[0];
    assert!(seq1 < seq2, "p1 must be invoked before p2");
    assert_eq!(batch1, batch2);
    assert!(
        batch1
            .iter()
            .all(|e| e.path.starts_with(dir.path())),
        "events must concern the watched tree"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_recursive_watcher_subscribes_whole_subtree() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();

    let (_config, watcher) = FileWatcher::builder()
        .watch(dir.path())
        .for_events(EventKinds::all())
        .recursive(true)
        .infinite(true)
        .processor(LogProcessor::new())
        .build()
        .unwrap();

    watcher.start().unwrap();
    // Root + a + a/b
    assert_eq!(watcher.subscription_count(), 3);
    watcher.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stop_discards_subscriptions_and_allows_restart() {
    let dir = TempDir::new().unwrap();

    let (_config, watcher) = FileWatcher::builder()
        .watch(dir.path())
        .for_events(EventKinds::all())
        .infinite(true)
        .processor(LogProcessor::new())
        .build()
        .unwrap();

    watcher.start().unwrap();
    assert!(watcher.is_running());
    assert_eq!(watcher.subscription_count(), 1);

    watcher.stop();
    assert!(!watcher.is_running());
    assert_eq!(watcher.subscription_count(), 0);

    // Restart is allowed and rebuilds the registry
    watcher.start().unwrap();
    assert!(watcher.is_running());
    assert_eq!(watcher.subscription_count(), 1);
    watcher.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_start_leaves_running_without_subscriptions() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("gone");

    let (_config, watcher) = FileWatcher::builder()
        .watch(&missing)
        .for_events(EventKinds::all())
        .processor(LogProcessor::new())
        .build()
        .unwrap();

    assert!(watcher.start().is_err());
    // The flag is set before registration; the caller is expected to stop()
    assert!(watcher.is_running());
    assert_eq!(watcher.subscription_count(), 0);

    watcher.stop();
    assert!(!watcher.is_running());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_kind_filter_suppresses_unsubscribed_events() {
    let dir = TempDir::new().unwrap();
    let seq = Arc::new(AtomicUsize::new(0));
    let (processor, log) = recording("deletes-only", seq);

    let (_config, watcher) = FileWatcher::builder()
        .watch(dir.path())
        .for_events(EventKinds::DELETE)
        .infinite(true)
        .processor_arc(processor)
        .build()
        .unwrap();

    watcher.start().unwrap();
    tokio::time::sleep(Duration::from_millis(250)).await;

    let file = dir.path().join("doomed.txt");
    fs::write(&file, "x").unwrap();
    fs::remove_file(&file).unwrap();

    let delivered = wait_for(|| !log.lock().is_empty()).await;
    watcher.stop();
    assert!(delivered, "no delete delivered within timeout");

    let calls = log.lock();
    assert!(
        calls
            .iter()
            .flat_map(|(_, batch)| batch.iter())
            .all(|e| e.kind == pathwatch::EventKind::Delete),
        "only delete events may pass the filter"
    );
}
