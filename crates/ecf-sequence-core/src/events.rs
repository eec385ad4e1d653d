//! Event sink: where allocation events are reported.

use std::sync::Arc;

/// A fire-and-forget destination for human-readable events.
///
/// Implementations must not fail the caller; errors writing the event are
/// swallowed or logged by the sink itself.
pub trait EventSink: Send + Sync {
    fn record(&self, message: &str);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _message: &str) {}
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, message: &str) {
        (**self).record(message)
    }
}

impl<T: EventSink + ?Sized> EventSink for Box<T> {
    fn record(&self, message: &str) {
        (**self).record(message)
    }
}
