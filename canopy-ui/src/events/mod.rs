mod emitter;
mod queue;

pub use emitter::{EventDispatcher, EventEmitter};
pub use queue::EventQueue;

use canopy_types::Tag;
use serde_json::Value;
use smartstring::{LazyCompact, SmartString};

/// Event raised by the host for one node, on its way back to the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub tag: Tag,
    pub name: SmartString<LazyCompact>,
    pub payload: Value,
}

impl RawEvent {
    pub fn new(tag: Tag, name: &str, payload: Value) -> Self {
        Self {
            tag,
            name: SmartString::from(name),
            payload,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }
}
