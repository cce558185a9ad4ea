//! Change event model: kinds, subscription filters, and batches.

use std::fmt;
use std::path::PathBuf;

use bitflags::bitflags;
use serde::Serialize;

/// Classification of a single file system change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A file or directory was created.
    Create,
    /// Contents or metadata changed.
    Modify,
    /// A file or directory was removed.
    Delete,
    /// The platform dropped events; the watched tree should be rescanned.
    Overflow,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Create => "create",
            EventKind::Modify => "modify",
            EventKind::Delete => "delete",
            EventKind::Overflow => "overflow",
        };
        f.write_str(s)
    }
}

bitflags! {
    /// Set of event kinds a watcher subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventKinds: u8 {
        const CREATE = 1 << 0;
        const MODIFY = 1 << 1;
        const DELETE = 1 << 2;
        const OVERFLOW = 1 << 3;
    }
}

impl EventKinds {
    /// Whether this filter admits the given kind.
    pub fn admits(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Create => self.contains(EventKinds::CREATE),
            EventKind::Modify => self.contains(EventKinds::MODIFY),
            EventKind::Delete => self.contains(EventKinds::DELETE),
            EventKind::Overflow => self.contains(EventKinds::OVERFLOW),
        }
    }
}

/// One change delivered to processors: the affected path and what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Map a platform event to the engine's classification.
///
/// Access and unclassified events carry no kind and are dropped before
/// dispatch. A rescan flag from the backend overrides the kind: it means
/// events were lost, which processors see as [`EventKind::Overflow`].
pub(crate) fn classify(event: &notify::Event) -> Option<EventKind> {
    if event.need_rescan() {
        return Some(EventKind::Overflow);
    }

    match event.kind {
        notify::EventKind::Create(_) => Some(EventKind::Create),
        notify::EventKind::Modify(_) => Some(EventKind::Modify),
        notify::EventKind::Remove(_) => Some(EventKind::Delete),
        _ => None,
    }
}
