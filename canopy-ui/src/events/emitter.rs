use std::fmt;
use std::sync::{Arc, Weak};

use canopy_types::Tag;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

use super::{EventQueue, RawEvent};

/// Collects events from every emitter of a scheduler until the next beat drains them.
#[derive(Debug, Default)]
pub struct EventDispatcher {
    queue: Mutex<EventQueue>,
}

impl EventDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn dispatch(&self, event: RawEvent) {
        trace!(tag = event.tag, name = %event.name, "event dispatched");
        self.queue.lock().push(event);
    }

    /// Queues a continuous event, replacing a pending one with the same tag and name.
    pub fn dispatch_unique(&self, event: RawEvent) {
        trace!(tag = event.tag, name = %event.name, "unique event dispatched");
        self.queue.lock().push_unique(event);
    }

    /// Takes every queued event in dispatch order.
    pub fn drain(&self) -> Vec<RawEvent> {
        self.queue.lock().drain().collect()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

/// Per-family handle the host uses to send events toward the producer.
///
/// Stable across every revision of the family, so views compare it by identity.
pub struct EventEmitter {
    tag: Tag,
    dispatcher: Weak<EventDispatcher>,
}

impl EventEmitter {
    pub fn new(tag: Tag, dispatcher: &Arc<EventDispatcher>) -> Self {
        Self {
            tag,
            dispatcher: Arc::downgrade(dispatcher),
        }
    }

    /// Emitter whose events go nowhere.
    pub fn detached(tag: Tag) -> Self {
        Self {
            tag,
            dispatcher: Weak::new(),
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Returns false when the dispatcher is gone and the event was dropped.
    pub fn dispatch(&self, name: &str, payload: Value) -> bool {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => {
                dispatcher.dispatch(RawEvent::new(self.tag, name, payload));
                true
            }
            None => false,
        }
    }

    pub fn dispatch_unique(&self, name: &str, payload: Value) -> bool {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => {
                dispatcher.dispatch_unique(RawEvent::new(self.tag, name, payload));
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("tag", &self.tag)
            .field("attached", &(self.dispatcher.strong_count() > 0))
            .finish()
    }
}
