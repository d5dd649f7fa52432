//! The event queue: a min-heap of start events only (spec §3 "Event", §4.1).
//!
//! Completion is never stored as an event — it is recomputed from live
//! state at every step by the completion search in `scheduler.rs`. Only
//! *start* events (arrivals and tool starts) ever sit in the queue, which is
//! why this type is shaped like a plain deadline heap rather than a general
//! event system: structurally the same `(timestamp, tiebreak)` min-heap as
//! a timer wheel.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::ids::RequestId;
use crate::time::SimTime;

/// A start event payload (spec §3 "Event" tag).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Event {
    /// A new request arrives and should be materialized from its DAG.
    RequestArrival { request_type: String },
    /// A specific DAG node of an already-materialized request becomes
    /// eligible to start.
    ToolStart { request: RequestId, node: String },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct QueuedEvent {
    time: SimTime,
    tiebreak: u64,
    event: Event,
}

impl PartialEq for QueuedEvent {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.tiebreak == other.tiebreak
    }
}
impl Eq for QueuedEvent {}

impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest timestamp
        // first, with the lower tiebreak ordinal winning ties (spec §4.1:
        // "events scheduled earlier in wall time win ties in simulated
        // time").
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.tiebreak.cmp(&self.tiebreak))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-priority queue of start events, ordered by `(timestamp, tiebreak)`.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventQueue {
    heap: BinaryHeap<QueuedEvent>,
    next_tiebreak: u64,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a start event at `time`, assigning it the next tiebreak
    /// ordinal. Tiebreak assignment is monotonically increasing for the
    /// life of the queue, giving deterministic ordering for equal
    /// timestamps regardless of push order from different producers.
    pub fn push(&mut self, event: Event, time: SimTime) {
        let tiebreak = self.next_tiebreak;
        self.next_tiebreak += 1;
        self.heap.push(QueuedEvent { time, tiebreak, event });
    }

    /// The timestamp of the earliest queued event, or [`SimTime::INFINITY`]
    /// if the queue is empty.
    #[must_use]
    pub fn peek_time(&self) -> SimTime {
        self.heap.peek().map_or(SimTime::INFINITY, |e| e.time)
    }

    /// Removes and returns the earliest `(time, event)` pair.
    pub fn pop_earliest(&mut self) -> Option<(SimTime, Event)> {
        self.heap.pop().map(|e| (e.time, e.event))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
