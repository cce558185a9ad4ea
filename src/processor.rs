//! The consumer capability: processors invoked with each batch of changes.

use crate::event::ChangeEvent;

/// A consumer of change event batches.
///
/// Processors are invoked synchronously, in registration order, each
/// receiving the full batch. Implementations must not panic for expected
/// event kinds; a slow processor delays every processor behind it.
pub trait EventProcessor: Send + Sync {
    /// Processor name for logging.
    fn name(&self) -> &str;

    /// Consume one batch of changes.
    fn process(&self, batch: &[ChangeEvent]);
}

/// Processor that logs every event through the tracing stack.
#[derive(Debug, Default)]
pub struct LogProcessor;

impl LogProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl EventProcessor for LogProcessor {
    fn name(&self) -> &str {
        "log"
    }

    fn process(&self, batch: &[ChangeEvent]) {
        for event in batch {
            crate::log_event!(self.name(), event.kind, "{}", event.path.display());
        }
    }
}

/// Adapts a closure into a processor.
pub struct FnProcessor<F> {
    name: String,
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&[ChangeEvent]) + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> EventProcessor for FnProcessor<F>
where
    F: Fn(&[ChangeEvent]) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, batch: &[ChangeEvent]) {
        (self.f)(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use std::sync::Mutex;

    #[test]
    fn test_fn_processor_receives_batch() {
        let seen: Mutex<Vec<ChangeEvent>> = Mutex::new(Vec::new());
        let processor = FnProcessor::new("collect", |batch: &[ChangeEvent]| {
            seen.lock().unwrap().extend_from_slice(batch);
        });

        let batch = vec![ChangeEvent::new("/tmp/a.txt", EventKind::Create)];
        processor.process(&batch);

        assert_eq!(processor.name(), "collect");
        assert_eq!(*seen.lock().unwrap(), batch);
    }
}
