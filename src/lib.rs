//! Multi-watcher file system change notification engine.
//!
//! A [`FileWatcher`] subscribes a path (optionally a whole directory
//! subtree) to platform change notifications and delivers batched change
//! events to its registered [`EventProcessor`]s. A [`FileWatcherManager`]
//! owns a collection of watchers keyed by path and exposes lifecycle
//! operations with [`ManagerResponse`] codes.
//!
//! # Architecture
//!
//! ```text
//! FileWatcherManager
//!   - path -> (WatcherConfig, FileWatcher)
//!         |
//! FileWatcher (one task per running watcher)
//!   - SubtreeRegistrar: one subscription per directory
//!   - SubscriptionRegistry: handle -> path, rebuilt each start
//!   - watch loop: cancellable wait, resolve, dispatch
//!         |
//! EventProcessors (ordered synchronous fan-out)
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod manager;
pub mod processor;
pub mod registrar;
pub mod registry;
pub mod watcher;

pub use builder::{FileWatcherBuilder, WatcherConfigBuilder};
pub use config::{LoggingConfig, Settings, WatcherConfig};
pub use error::WatchError;
pub use event::{ChangeEvent, EventKind, EventKinds};
pub use manager::{FileWatcherManager, ManagerResponse};
pub use processor::{EventProcessor, FnProcessor, LogProcessor};
pub use registrar::SubtreeRegistrar;
pub use registry::{SubscriptionHandle, SubscriptionRegistry};
pub use watcher::FileWatcher;
