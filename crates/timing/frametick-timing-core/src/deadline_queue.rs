//! Min-ordered queue of timer deadlines.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::CallbackId;

/// A queued deadline. Ordering looks at `target_time` only, so entries sharing a
/// deadline come out in no particular order.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    pub target_time: u64,
    pub id: CallbackId,
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.target_time == other.target_time
    }
}

impl Eq for Deadline {}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Deadline {
    fn cmp(&self, other: &Self) -> Ordering {
        self.target_time.cmp(&other.target_time)
    }
}

#[derive(Debug, Default, Clone)]
pub struct DeadlineQueue {
    heap: BinaryHeap<Reverse<Deadline>>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, deadline: Deadline) {
        self.heap.push(Reverse(deadline));
    }

    pub fn peek_min(&self) -> Option<Deadline> {
        self.heap.peek().map(|Reverse(d)| *d)
    }

    pub fn pop_min(&mut self) -> Option<Deadline> {
        self.heap.pop().map(|Reverse(d)| d)
    }

    /// Pop the minimum only if it is strictly before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<Deadline> {
        match self.peek_min() {
            Some(d) if d.target_time < now => self.pop_min(),
            _ => None,
        }
    }

    /// Remove every entry for `id`, wherever it sits in the heap. O(n).
    pub fn remove_by_id(&mut self, id: CallbackId) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(d)| d.id != id);
        self.heap.len() != before
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
