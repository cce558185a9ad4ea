//! Subtree registration: subscribing a root path, or a whole directory
//! tree, to platform change notifications.

use std::path::Path;

use notify::{RecursiveMode, Watcher};
use walkdir::WalkDir;

use crate::error::WatchError;
use crate::registry::SubscriptionRegistry;

/// Issues platform subscriptions and owns the backend watcher.
///
/// The backend must stay alive for subscriptions to keep delivering;
/// dropping the registrar cancels every subscription it issued.
pub struct SubtreeRegistrar {
    watcher: notify::RecommendedWatcher,
}

impl SubtreeRegistrar {
    /// Wrap a backend watcher.
    pub fn new(watcher: notify::RecommendedWatcher) -> Self {
        Self { watcher }
    }

    /// Subscribe `root`, or with `recursive` the pre-order traversal of the
    /// tree rooted there, one subscription per directory.
    ///
    /// Each directory is subscribed before its children are visited, so a
    /// child's events cannot race ahead of its parent's subscription. A
    /// subdirectory created while the walk is in flight may still be
    /// missed; that window is accepted.
    ///
    /// Any traversal or subscription failure aborts the whole registration.
    /// Subscriptions already issued in the failed attempt are not rolled
    /// back here; the caller stops the watcher to release them.
    pub fn register_all(
        &mut self,
        root: &Path,
        recursive: bool,
    ) -> Result<SubscriptionRegistry, WatchError> {
        let mut registry = SubscriptionRegistry::new();

        if !recursive {
            self.subscribe(root, &mut registry)?;
            return Ok(registry);
        }

        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                WatchError::registration(path, e)
            })?;

            if entry.file_type().is_dir() {
                self.subscribe(entry.path(), &mut registry)?;
            }
        }

        Ok(registry)
    }

    fn subscribe(
        &mut self,
        dir: &Path,
        registry: &mut SubscriptionRegistry,
    ) -> Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::registration(dir, e))?;

        let handle = registry.issue(dir);
        crate::debug_event!("registrar", "subscribed", "{handle} -> {}", dir.display());
        Ok(())
    }
}
