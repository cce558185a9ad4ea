//! Subscription registry: opaque handles mapped to the directories they
//! were issued for.
//!
//! The registry is rebuilt every time a watcher starts and discarded when
//! it stops. Resolving an event path against an empty or rebuilt registry
//! yields no handle, which the watch loop treats as a stale subscription
//! and skips.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque token correlating a ready notification back to its directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Bidirectional handle <-> directory mapping for one watcher run.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_handle: HashMap<SubscriptionHandle, PathBuf>,
    by_dir: HashMap<PathBuf, SubscriptionHandle>,
    next_id: u64,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new handle for a subscribed directory.
    ///
    /// Re-subscribing a directory returns its existing handle.
    pub fn issue(&mut self, dir: impl Into<PathBuf>) -> SubscriptionHandle {
        let dir = dir.into();
        if let Some(handle) = self.by_dir.get(&dir) {
            return *handle;
        }

        let handle = SubscriptionHandle(self.next_id);
        self.next_id += 1;
        self.by_handle.insert(handle, dir.clone());
        self.by_dir.insert(dir, handle);
        handle
    }

    /// The directory a handle was issued for, if still registered.
    pub fn path_for(&self, handle: SubscriptionHandle) -> Option<&Path> {
        self.by_handle.get(&handle).map(PathBuf::as_path)
    }

    /// The handle issued for a directory, if any.
    pub fn handle_for(&self, dir: &Path) -> Option<SubscriptionHandle> {
        self.by_dir.get(dir).copied()
    }

    /// Resolve an event path to the handle that covers it.
    ///
    /// Events name either a subscribed directory itself or an entry inside
    /// one, so the lookup tries the path and then its parent.
    pub fn resolve(&self, event_path: &Path) -> Option<SubscriptionHandle> {
        self.handle_for(event_path)
            .or_else(|| event_path.parent().and_then(|p| self.handle_for(p)))
    }

    /// Number of issued subscriptions.
    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    /// Whether no subscriptions are registered.
    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Discard all subscriptions.
    pub fn clear(&mut self) {
        self.by_handle.clear();
        self.by_dir.clear();
    }
}
