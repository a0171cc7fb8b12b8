//! Recognizer deadlines.
//!
//! Recognizers such as long press or multi-tap need to act when time passes
//! without any pointer event. The engine never reads a wall clock: deadlines are
//! stored in a min-heap keyed by an explicit timestamp and fired when the host
//! advances the clock.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a scheduled deadline.
    pub struct DeadlineId;
}

#[derive(Debug)]
struct DeadlineData<T> {
    at: Duration,
    payload: T,
}

/// An entry in the deadline heap (min-heap by fire time, then by scheduling
/// order).
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    id: DeadlineId,
    at: Duration,
    seq: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Pending deadlines, each carrying a payload returned when it fires.
///
/// Cancelled deadlines are removed from the arena immediately and skipped
/// lazily when they reach the top of the heap.
#[derive(Debug)]
pub struct DeadlineQueue<T> {
    deadlines: SlotMap<DeadlineId, DeadlineData<T>>,
    queue: BinaryHeap<QueueEntry>,
    next_seq: u64,
}

impl<T> DeadlineQueue<T> {
    pub fn new() -> Self {
        Self {
            deadlines: SlotMap::with_key(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `payload` to fire once the clock reaches `at`.
    pub fn schedule(&mut self, at: Duration, payload: T) -> DeadlineId {
        let id = self.deadlines.insert(DeadlineData { at, payload });
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(QueueEntry { id, at, seq });
        tracing::trace!(target: targets::DEADLINE, ?id, ?at, "deadline scheduled");
        id
    }

    /// Cancel a pending deadline, returning its payload. Unknown or already
    /// fired ids return `None`.
    pub fn cancel(&mut self, id: DeadlineId) -> Option<T> {
        self.deadlines.remove(id).map(|d| d.payload)
    }

    pub fn is_pending(&self, id: DeadlineId) -> bool {
        self.deadlines.contains_key(id)
    }

    /// When the deadline `id` fires, if it is still pending.
    pub fn fire_time(&self, id: DeadlineId) -> Option<Duration> {
        self.deadlines.get(id).map(|d| d.at)
    }

    /// The earliest pending fire time.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        self.discard_stale();
        self.queue.peek().map(|entry| entry.at)
    }

    /// Remove and return every deadline due at or before `now`, in fire order,
    /// together with its scheduled time.
    #[tracing::instrument(skip(self), target = "horizon_gesture::deadline", level = "trace")]
    pub fn pop_expired(&mut self, now: Duration) -> Vec<(DeadlineId, Duration, T)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.peek() {
            if entry.at > now {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            let Some(data) = self.deadlines.remove(entry.id) else {
                continue;
            };
            tracing::trace!(target: targets::DEADLINE, id = ?entry.id, at = ?data.at, "deadline fired");
            fired.push((entry.id, data.at, data.payload));
        }
        fired
    }

    /// Number of pending deadlines.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.deadlines.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

impl<T> Default for DeadlineQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
