//! Timer engine: deadline queue plus id index behind one lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use hashbrown::HashMap;

use crate::deadline_queue::{Deadline, DeadlineQueue};
use crate::CallbackId;

/// A registered timer. `target_time` is on the monotonic frame time base.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timer {
    pub id: CallbackId,
    pub target_time: u64,
    pub interval: u64,
    pub repeat: bool,
}

impl Timer {
    fn deadline(&self) -> Deadline {
        Deadline {
            target_time: self.target_time,
            id: self.id,
        }
    }
}

/// Every id in `by_id` has exactly one entry in `queue` except while it is being fired.
#[derive(Debug, Default)]
struct TimerState {
    queue: DeadlineQueue,
    by_id: HashMap<CallbackId, Timer>,
}

#[derive(Debug, Default)]
pub struct TimerEngine {
    state: Mutex<TimerState>,
}

/// Monotonic deadline for a timer requested at `scheduling_time_ms` (wall clock)
/// with `duration_ms`, compensating for the time the request spent in transit.
pub fn target_time_for(
    duration_ms: i64,
    scheduling_time_ms: f64,
    monotonic_now_ms: u64,
    wall_now_ms: f64,
) -> u64 {
    let adjusted = (scheduling_time_ms - wall_now_ms + duration_ms as f64).max(0.0);
    monotonic_now_ms.saturating_add(adjusted as u64)
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `timer`, replacing any live timer with the same id.
    pub fn insert(&self, timer: Timer) {
        let mut state = self.lock();
        if state.by_id.insert(timer.id, timer).is_some() {
            log::warn!("timer {} re-registered; replacing previous deadline", timer.id);
            state.queue.remove_by_id(timer.id);
        }
        state.queue.insert(timer.deadline());
    }

    /// Build and register a timer from a script-layer request.
    pub fn create_timer(
        &self,
        id: CallbackId,
        duration_ms: i64,
        scheduling_time_ms: f64,
        repeat: bool,
        monotonic_now_ms: u64,
        wall_now_ms: f64,
    ) -> Timer {
        let timer = Timer {
            id,
            target_time: target_time_for(
                duration_ms,
                scheduling_time_ms,
                monotonic_now_ms,
                wall_now_ms,
            ),
            interval: duration_ms.max(0) as u64,
            repeat,
        };
        self.insert(timer);
        timer
    }

    /// Cancel `id`. Unknown or already-fired ids are ignored; returns whether a timer
    /// was removed.
    pub fn delete_timer(&self, id: CallbackId) -> bool {
        let mut state = self.lock();
        if state.by_id.remove(&id).is_some() {
            state.queue.remove_by_id(id);
            true
        } else {
            false
        }
    }

    /// Fire every timer whose deadline is strictly before `frame_time_ms`.
    ///
    /// Repeating timers are re-queued at `frame_time_ms + interval`; one-shot timers
    /// leave the index. The lock is released before the batch is returned.
    pub fn on_tick(&self, frame_time_ms: u64) -> Vec<CallbackId> {
        let mut fired = Vec::new();
        let mut guard = self.lock();
        let TimerState { queue, by_id } = &mut *guard;
        while let Some(deadline) = queue.pop_due(frame_time_ms) {
            let Some(timer) = by_id.get_mut(&deadline.id) else {
                continue;
            };
            fired.push(timer.id);
            if timer.repeat {
                timer.target_time = frame_time_ms.saturating_add(timer.interval);
                queue.insert(timer.deadline());
            } else {
                by_id.remove(&deadline.id);
            }
        }
        fired
    }

    /// Whether a tick at `frame_time_ms` would fire anything.
    pub fn has_due(&self, frame_time_ms: u64) -> bool {
        self.lock()
            .queue
            .peek_min()
            .is_some_and(|d| d.target_time < frame_time_ms)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.lock().queue.peek_min().map(|d| d.target_time)
    }

    pub fn get(&self, id: CallbackId) -> Option<Timer> {
        self.lock().by_id.get(&id).copied()
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.lock().by_id.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
