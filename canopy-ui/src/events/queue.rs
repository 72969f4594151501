use std::collections::VecDeque;

use super::RawEvent;

/// Events waiting for the next beat, oldest first.
///
/// Continuous events such as scrolling are pushed with
/// [`push_unique`](Self::push_unique): a newer event of the same name for the
/// same node replaces the queued one in place, so the consumer only sees the
/// latest value at the position of the first.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<RawEvent>,
    coalesced: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawEvent) {
        self.events.push_back(event);
    }

    pub fn push_unique(&mut self, event: RawEvent) {
        let queued = self
            .events
            .iter_mut()
            .rev()
            .find(|queued| queued.tag == event.tag && queued.name == event.name);
        match queued {
            Some(queued) => {
                queued.payload = event.payload;
                self.coalesced += 1;
            }
            None => self.events.push_back(event),
        }
    }

    pub fn drain(&mut self) -> impl Iterator<Item = RawEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events folded into an earlier one since the queue was created.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
