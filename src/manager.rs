//! The watcher registry: lifecycle operations over a collection of
//! watchers keyed by path, with well-defined response codes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::builder::FileWatcherBuilder;
use crate::config::WatcherConfig;
use crate::error::WatchError;
use crate::watcher::FileWatcher;

/// Response codes for manager operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerResponse {
    Watching,
    NotWatching,
    NoWatcherFound,
    AlreadyWatching,
    Valid,
    NotValid,
    MissingFileWatcher,
    NotRemoved,
    Removed,
}

struct WatcherEntry {
    config: WatcherConfig,
    watcher: Option<Arc<FileWatcher>>,
}

/// Owns the `path -> (config, watcher)` map and serializes structural
/// mutation against concurrent reads.
///
/// One entry per distinct path: re-registering a path overwrites the
/// previous entry, so callers check `is_watching` first when overwrite is
/// undesired. Check-then-act sequences across separate calls are not
/// atomic; two concurrent `start_watching` calls on one path may both
/// reach `start`, which itself refuses to issue duplicate subscriptions.
#[derive(Default)]
pub struct FileWatcherManager {
    watchers: DashMap<PathBuf, WatcherEntry>,
}

impl FileWatcherManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent registration: a builder whose `register` inserts the built
    /// pair into this manager.
    pub fn add_file_watcher(&self) -> RegisteringBuilder<'_> {
        RegisteringBuilder {
            manager: self,
            builder: FileWatcher::builder(),
        }
    }

    /// Register a built pair under the watcher's path, overwriting any
    /// previous entry for it.
    pub fn register(&self, config: WatcherConfig, watcher: FileWatcher) {
        let path = watcher.watched_path().to_path_buf();
        self.watchers.insert(
            path,
            WatcherEntry {
                config,
                watcher: Some(Arc::new(watcher)),
            },
        );
    }

    /// Register configuration for a path with no watcher instance yet.
    ///
    /// `is_watching` reports such entries as `MissingFileWatcher`.
    pub fn register_configuration(&self, path: impl Into<PathBuf>, config: WatcherConfig) {
        self.watchers.insert(
            path.into(),
            WatcherEntry {
                config,
                watcher: None,
            },
        );
    }

    /// Report the watch status of a path.
    pub fn is_watching(&self, path: &Path) -> ManagerResponse {
        match self.watchers.get(path) {
            None => ManagerResponse::NoWatcherFound,
            Some(entry) => match &entry.watcher {
                None => ManagerResponse::MissingFileWatcher,
                Some(watcher) if watcher.is_running() => ManagerResponse::Watching,
                Some(_) => ManagerResponse::NotWatching,
            },
        }
    }

    /// Start the watcher for a path.
    ///
    /// No-op returning the current status when the path is unregistered,
    /// already watching, or holds no watcher instance. Registration
    /// failures propagate to the caller.
    pub fn start_watching(&self, path: &Path) -> Result<ManagerResponse, WatchError> {
        let watcher = match self.watchers.get(path) {
            None => return Ok(ManagerResponse::NoWatcherFound),
            Some(entry) => match &entry.watcher {
                None => return Ok(ManagerResponse::MissingFileWatcher),
                Some(watcher) if watcher.is_running() => return Ok(ManagerResponse::Watching),
                Some(watcher) => Arc::clone(watcher),
            },
        };

        watcher.start()?;
        Ok(ManagerResponse::Watching)
    }

    /// Stop the watcher for a path.
    ///
    /// Answers `NoWatcherFound` unless the path is currently `Watching`.
    pub fn stop_watching(&self, path: &Path) -> ManagerResponse {
        let watcher = match self.watchers.get(path) {
            Some(entry) => match &entry.watcher {
                Some(watcher) if watcher.is_running() => Arc::clone(watcher),
                _ => return ManagerResponse::NoWatcherFound,
            },
            None => return ManagerResponse::NoWatcherFound,
        };

        watcher.stop();
        ManagerResponse::NotWatching
    }

    /// Start every registered watcher, collecting one result per path.
    ///
    /// A registration failure on one path does not abort the others; the
    /// failed path is reported as `NotWatching`.
    pub fn start_all(&self) -> HashMap<PathBuf, ManagerResponse> {
        let mut results = HashMap::new();
        for path in self.watched_paths() {
            let response = match self.start_watching(&path) {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("[manager] start failed for {}: {e}", path.display());
                    ManagerResponse::NotWatching
                }
            };
            results.insert(path, response);
        }
        results
    }

    /// Stop every registered watcher, collecting one result per path.
    pub fn stop_all(&self) -> HashMap<PathBuf, ManagerResponse> {
        let mut results = HashMap::new();
        for path in self.watched_paths() {
            let response = self.stop_watching(&path);
            results.insert(path, response);
        }
        results
    }

    /// Remove a path's entry, stopping its watcher first if it is running.
    pub fn delete_file_watcher(&self, path: &Path) -> ManagerResponse {
        if self.is_watching(path) == ManagerResponse::Watching {
            self.stop_watching(path);
        }

        match self.watchers.remove(path) {
            Some(_) => ManagerResponse::Removed,
            None => ManagerResponse::NotRemoved,
        }
    }

    /// All registered paths, watching or not.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.watchers.iter().map(|e| e.key().clone()).collect()
    }

    /// The stored configuration for a path, if registered.
    pub fn watcher_configuration(&self, path: &Path) -> Option<WatcherConfig> {
        self.watchers.get(path).map(|e| e.config.clone())
    }

    /// The watcher instance for a path, if registered and present.
    pub fn file_watcher(&self, path: &Path) -> Option<Arc<FileWatcher>> {
        self.watchers.get(path).and_then(|e| e.watcher.clone())
    }
}

/// A [`FileWatcherBuilder`] bound to a manager: `register` builds the pair
/// and inserts it under the watched path.
pub struct RegisteringBuilder<'a> {
    manager: &'a FileWatcherManager,
    builder: FileWatcherBuilder,
}

impl<'a> RegisteringBuilder<'a> {
    /// Apply builder steps to the underlying [`FileWatcherBuilder`].
    pub fn with(mut self, f: impl FnOnce(FileWatcherBuilder) -> FileWatcherBuilder) -> Self {
        self.builder = f(self.builder);
        self
    }

    /// Build and register, answering `Valid` on success and `NotValid`
    /// when validation fails.
    pub fn register(self) -> ManagerResponse {
        match self.builder.build() {
            Ok((config, watcher)) => {
                self.manager.register(config, watcher);
                ManagerResponse::Valid
            }
            Err(e) => {
                tracing::warn!("[manager] watcher rejected: {e}");
                ManagerResponse::NotValid
            }
        }
    }
}
