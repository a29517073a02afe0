//! Time-ordered event queue.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::circuit::NodeId;

/// A pending "recompute this node" request.
///
/// Events order by `(time, sequence)`. Sequence numbers are unique, so
/// events scheduled for the same tick come out in the order they went in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Event {
    pub time: u64,
    pub sequence: u64,
    pub node: NodeId,
}

/// Priority queue of events plus the logical clock.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Event>>,
    time: u64,
    sequence: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `node` for `delay` ticks after the current time.
    ///
    /// A delay past the end of the clock lands on `u64::MAX`.
    pub fn schedule(&mut self, node: NodeId, delay: u64) -> Event {
        self.sequence += 1;
        let event = Event {
            time: self.time.saturating_add(delay),
            sequence: self.sequence,
            node,
        };
        self.heap.push(Reverse(event));
        event
    }

    /// Take the earliest event and move the clock up to it.
    ///
    /// The clock never runs backwards.
    pub fn pop(&mut self) -> Option<Event> {
        let Reverse(event) = self.heap.pop()?;
        self.time = self.time.max(event.time);
        Some(event)
    }

    /// Earliest event without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(e)| e)
    }

    /// Current logical time in ticks.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop pending events. The clock and sequence counter keep their values.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
