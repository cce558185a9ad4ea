//! A single-path file watcher: subtree registration, the blocking event
//! consumption loop, and synchronous fan-out to processors.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::WatchError;
use crate::event::{ChangeEvent, EventKind, EventKinds, classify};
use crate::processor::EventProcessor;
use crate::registrar::SubtreeRegistrar;
use crate::registry::SubscriptionRegistry;

/// Shared, ordered processor set.
///
/// Dispatch iterates under the lock so a concurrent `add_processor` can
/// never be observed mid-batch.
type Processors = Arc<Mutex<Vec<Arc<dyn EventProcessor>>>>;

/// Watches one root path and dispatches change batches to its processors.
///
/// Built through [`FileWatcher::builder`]; the path, recursion, and kinds
/// are fixed at build time. `start` and `stop` may be called any number of
/// times.
pub struct FileWatcher {
    path: PathBuf,
    kinds: EventKinds,
    recursive: bool,
    infinite: bool,
    running: Arc<AtomicBool>,
    processors: Processors,
    /// Populated on start, cleared on stop.
    subscriptions: Arc<Mutex<SubscriptionRegistry>>,
    active: Mutex<Option<ActiveWatch>>,
}

/// State of one run: dropping it releases every platform subscription.
struct ActiveWatch {
    _registrar: SubtreeRegistrar,
    _loop_task: tokio::task::JoinHandle<()>,
    cancel: CancellationToken,
}

impl FileWatcher {
    /// Start a fluent builder.
    pub fn builder() -> crate::builder::FileWatcherBuilder {
        crate::builder::FileWatcherBuilder::new()
    }

    pub(crate) fn new(
        path: PathBuf,
        kinds: EventKinds,
        recursive: bool,
        infinite: bool,
        initially_running: bool,
        processors: Vec<Arc<dyn EventProcessor>>,
    ) -> Self {
        Self {
            path,
            kinds,
            recursive,
            infinite,
            running: Arc::new(AtomicBool::new(initially_running)),
            processors: Arc::new(Mutex::new(processors)),
            subscriptions: Arc::new(Mutex::new(SubscriptionRegistry::new())),
            active: Mutex::new(None),
        }
    }

    /// The root path this watcher covers. Fixed for the watcher's lifetime.
    pub fn watched_path(&self) -> &Path {
        &self.path
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    pub fn kinds(&self) -> EventKinds {
        self.kinds
    }

    /// Whether `start` has been called without a matching `stop`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of live platform subscriptions (zero while stopped).
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }

    /// Register another processor; safe before or after `start`.
    ///
    /// Processors are unique by identity: adding the same `Arc` twice is a
    /// no-op. Dispatch order is registration order.
    pub fn add_processor(&self, processor: Arc<dyn EventProcessor>) {
        let mut processors = self.processors.lock();
        if !processors.iter().any(|p| Arc::ptr_eq(p, &processor)) {
            processors.push(processor);
        }
    }

    pub fn processor_count(&self) -> usize {
        self.processors.lock().len()
    }

    /// Subscribe the subtree and run the watch loop on a dedicated task.
    ///
    /// Sets the running flag before registering, so a registration failure
    /// leaves the watcher running with no active subscriptions; the caller
    /// should `stop` it. Starting an already-active watcher is a no-op and
    /// issues no second set of subscriptions.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), WatchError> {
        let mut active = self.active.lock();
        self.running.store(true, Ordering::SeqCst);

        if active.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(256);
        let backend = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = tx.blocking_send(res);
        })?;

        let mut registrar = SubtreeRegistrar::new(backend);
        let registry = registrar.register_all(&self.path, self.recursive)?;

        crate::log_event!(
            "watcher",
            "started",
            "{} with {} subscriptions",
            self.path.display(),
            registry.len()
        );
        *self.subscriptions.lock() = registry;

        let cancel = CancellationToken::new();
        let loop_task = tokio::spawn(watch_loop(
            rx,
            WatchContext {
                root: self.path.clone(),
                kinds: self.kinds,
                infinite: self.infinite,
                running: Arc::clone(&self.running),
                subscriptions: Arc::clone(&self.subscriptions),
                processors: Arc::clone(&self.processors),
            },
            cancel.clone(),
        ));

        *active = Some(ActiveWatch {
            _registrar: registrar,
            _loop_task: loop_task,
            cancel,
        });
        Ok(())
    }

    /// Stop watching: clears the running flag, discards the subscription
    /// registry, and cancels the loop's wait.
    ///
    /// The cancellation token unblocks a loop parked on the next batch, so
    /// stopping never waits for an incidental event to arrive.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.subscriptions.lock().clear();

        if let Some(active) = self.active.lock().take() {
            active.cancel.cancel();
            crate::log_event!("watcher", "stopped", "{}", self.path.display());
        }
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Everything the loop task needs from its watcher.
struct WatchContext {
    root: PathBuf,
    kinds: EventKinds,
    infinite: bool,
    running: Arc<AtomicBool>,
    subscriptions: Arc<Mutex<SubscriptionRegistry>>,
    processors: Processors,
}

/// Consume batches until cancelled, the channel closes, or a single batch
/// has been dispatched for a non-infinite watcher.
async fn watch_loop(
    mut rx: mpsc::Receiver<notify::Result<notify::Event>>,
    ctx: WatchContext,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => {
                crate::debug_event!("loop", "cancelled", "{}", ctx.root.display());
                break;
            }
            next = rx.recv() => match next {
                None => break,
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    tracing::error!("[loop] backend event error: {e}");
                    continue;
                }
            },
        };

        let batch = resolve_batch(&event, &ctx);
        if batch.is_empty() {
            continue;
        }

        dispatch(&ctx.processors, &batch);

        if !(ctx.running.load(Ordering::SeqCst) && ctx.infinite) {
            crate::debug_event!("loop", "exiting after batch", "{}", ctx.root.display());
            break;
        }
    }
}

/// Resolve a platform event into the batch to dispatch.
///
/// Each event path must resolve to a live subscription handle; unresolved
/// paths are the expected shutdown race and are dropped silently. Kinds
/// outside the watcher's filter are dropped before resolution.
fn resolve_batch(event: &notify::Event, ctx: &WatchContext) -> Vec<ChangeEvent> {
    let Some(kind) = classify(event) else {
        return Vec::new();
    };
    if !ctx.kinds.admits(kind) {
        return Vec::new();
    }

    let subscriptions = ctx.subscriptions.lock();

    // Overflow carries no usable paths; report it against the root, but
    // only while subscriptions are live.
    if kind == EventKind::Overflow {
        if subscriptions.is_empty() {
            return Vec::new();
        }
        return vec![ChangeEvent::new(ctx.root.clone(), kind)];
    }

    let mut batch = Vec::with_capacity(event.paths.len());
    for path in &event.paths {
        match subscriptions.resolve(path) {
            Some(handle) => {
                if let Some(dir) = subscriptions.path_for(handle) {
                    crate::debug_event!("loop", "resolved", "{handle} {}", dir.display());
                }
                batch.push(ChangeEvent::new(path.clone(), kind));
            }
            None => {
                crate::debug_event!("loop", "stale handle", "{}", path.display());
            }
        }
    }
    batch
}

/// Fan a batch out to every processor, synchronously, in registration
/// order, holding the processors lock for the whole pass.
fn dispatch(processors: &Mutex<Vec<Arc<dyn EventProcessor>>>, batch: &[ChangeEvent]) {
    let processors = processors.lock();
    for processor in processors.iter() {
        crate::debug_event!(processor.name(), "dispatch", "{} events", batch.len());
        processor.process(batch);
    }
}
