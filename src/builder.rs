//! Fluent construction of a validated `(WatcherConfig, FileWatcher)` pair.
//!
//! The nested configuration builder holds a typed reference to its parent
//! and hands the completed child back through [`WatcherConfigBuilder::done`]
//! — ordinary method calls, no name-derived dispatch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WatcherConfig;
use crate::error::WatchError;
use crate::event::EventKinds;
use crate::processor::EventProcessor;
use crate::watcher::FileWatcher;

/// Builder for a [`FileWatcher`] and its metadata.
///
/// Mandatory before `build`: a path, a non-empty kinds filter, and at
/// least one processor. Validation happens at build time, never deferred
/// to `start`.
pub struct FileWatcherBuilder {
    path: Option<PathBuf>,
    kinds: EventKinds,
    recursive: bool,
    infinite: bool,
    initially_running: bool,
    processors: Vec<Arc<dyn EventProcessor>>,
    config: WatcherConfig,
}

impl FileWatcherBuilder {
    pub fn new() -> Self {
        Self {
            path: None,
            kinds: EventKinds::empty(),
            recursive: false,
            infinite: false,
            initially_running: false,
            processors: Vec::new(),
            config: WatcherConfig::default(),
        }
    }

    /// Set the path to watch. Mandatory; fixed once built.
    pub fn watch(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the event kinds to subscribe to. Mandatory, must be non-empty.
    pub fn for_events(mut self, kinds: EventKinds) -> Self {
        self.kinds = kinds;
        self
    }

    /// Include every descendant directory. Only valid for directory paths.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Keep consuming batches instead of exiting after the first.
    pub fn infinite(mut self, infinite: bool) -> Self {
        self.infinite = infinite;
        self
    }

    /// Mark the watcher as running before `start` is ever called.
    pub fn initially_running(mut self, running: bool) -> Self {
        self.initially_running = running;
        self
    }

    /// Add a processor. Call repeatedly to add more; at least one is
    /// mandatory.
    pub fn processor(mut self, processor: impl EventProcessor + 'static) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    /// Add an already-shared processor.
    pub fn processor_arc(mut self, processor: Arc<dyn EventProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    /// Descend into the metadata builder.
    pub fn configure(self) -> WatcherConfigBuilder {
        WatcherConfigBuilder {
            config: WatcherConfig::default(),
            parent: self,
        }
    }

    /// Whether the current state would pass `build` validation.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    fn validate(&self) -> Result<&PathBuf, WatchError> {
        let path = self.path.as_ref().ok_or_else(|| WatchError::InvalidConfig {
            reason: "no path to watch was set".to_string(),
        })?;

        if self.kinds.is_empty() {
            return Err(WatchError::InvalidConfig {
                reason: "no event kinds to watch for".to_string(),
            });
        }

        if self.processors.is_empty() {
            return Err(WatchError::InvalidConfig {
                reason: "at least one event processor is required".to_string(),
            });
        }

        if self.recursive && !path.is_dir() {
            return Err(WatchError::InvalidConfig {
                reason: format!(
                    "recursive watch requires a directory, got {}",
                    path.display()
                ),
            });
        }

        Ok(path)
    }

    /// Validate and produce the configuration and watcher.
    pub fn build(self) -> Result<(WatcherConfig, FileWatcher), WatchError> {
        let path = self.validate()?.clone();

        let watcher = FileWatcher::new(
            path,
            self.kinds,
            self.recursive,
            self.infinite,
            self.initially_running,
            self.processors,
        );
        Ok((self.config, watcher))
    }

    fn accept_config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }
}

impl Default for FileWatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Nested builder for the per-watcher metadata.
///
/// Finished with [`done`](Self::done), which returns the parent builder
/// with the completed configuration attached.
pub struct WatcherConfigBuilder {
    config: WatcherConfig,
    parent: FileWatcherBuilder,
}

impl WatcherConfigBuilder {
    /// Timeout handed to downstream consumers.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Per-watcher log verbosity.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = Some(level.into());
        self
    }

    /// Outbound notification channel identifier.
    pub fn channel(mut self, channel: impl Into<String>) -> Self {
        self.config.channel = Some(channel.into());
        self
    }

    /// Hand the completed configuration back to the parent builder.
    pub fn done(self) -> FileWatcherBuilder {
        self.parent.accept_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::LogProcessor;

    #[test]
    fn test_build_without_processor_fails() {
        let builder = FileWatcher::builder()
            .watch("/tmp")
            .for_events(EventKinds::all());

        assert!(!builder.is_valid());
        assert!(matches!(
            builder.build(),
            Err(WatchError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_build_without_path_fails() {
        let result = FileWatcher::builder()
            .for_events(EventKinds::all())
            .processor(LogProcessor::new())
            .build();

        assert!(matches!(result, Err(WatchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_build_without_kinds_fails() {
        let result = FileWatcher::builder()
            .watch("/tmp")
            .processor(LogProcessor::new())
            .build();

        assert!(matches!(result, Err(WatchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_recursive_requires_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let result = FileWatcher::builder()
            .watch(file.path())
            .for_events(EventKinds::all())
            .recursive(true)
            .processor(LogProcessor::new())
            .build();

        assert!(matches!(result, Err(WatchError::InvalidConfig { .. })));
    }

    #[test]
    fn test_nested_config_builder_round_trip() {
        let (config, watcher) = FileWatcher::builder()
            .watch("/tmp")
            .for_events(EventKinds::CREATE | EventKinds::MODIFY)
            .infinite(true)
            .configure()
            .timeout(Duration::from_secs(30))
            .log_level("debug")
            .channel("ops")
            .done()
            .processor(LogProcessor::new())
            .build()
            .unwrap();

        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.channel.as_deref(), Some("ops"));

        assert_eq!(watcher.watched_path(), std::path::Path::new("/tmp"));
        assert!(watcher.is_infinite());
        assert!(!watcher.is_recursive());
        assert!(!watcher.is_running());
        assert_eq!(watcher.processor_count(), 1);
    }
}
