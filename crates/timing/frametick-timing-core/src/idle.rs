//! Best-effort idle callbacks that piggyback on the frame clock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::config::IdleConfig;
use crate::CallbackId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdleCallback {
    pub id: CallbackId,
    pub enqueue_order: u64,
}

/// Idle callbacks released on one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct IdleBatch {
    pub ids: Vec<CallbackId>,
    /// Wall-clock time (epoch millis) at which the current frame started.
    pub frame_start_ms: f64,
}

#[derive(Debug, Default)]
struct IdleState {
    pending: IndexMap<CallbackId, IdleCallback>,
    next_order: u64,
}

/// FIFO of pending idle requests with its own lock.
///
/// Requests may be starved for as long as frames stay busy.
#[derive(Debug)]
pub struct IdleDispatcher {
    config: IdleConfig,
    state: Mutex<IdleState>,
}

impl IdleDispatcher {
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            state: Mutex::new(IdleState::default()),
        }
    }

    pub fn config(&self) -> &IdleConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, IdleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `id`. A request that is already pending keeps its place.
    pub fn create_idle_callback(&self, id: CallbackId) {
        let mut state = self.lock();
        if state.pending.contains_key(&id) {
            log::debug!("idle callback {id} already pending");
            return;
        }
        let enqueue_order = state.next_order;
        state.next_order += 1;
        state.pending.insert(id, IdleCallback { id, enqueue_order });
    }

    /// Drop a pending request. Returns whether anything was removed.
    pub fn delete_idle_callback(&self, id: CallbackId) -> bool {
        self.lock().pending.shift_remove(&id).is_some()
    }

    /// Remaining frame budget for a frame stamped `frame_time_ms`, observed at
    /// `monotonic_now_ms`.
    pub fn remaining_budget(&self, frame_time_ms: u64, monotonic_now_ms: u64) -> u64 {
        let elapsed = monotonic_now_ms.saturating_sub(frame_time_ms);
        self.config.frame_budget_ms.saturating_sub(elapsed)
    }

    /// Release up to `max_batch` pending requests, oldest first, if at least
    /// `min_remaining_ms` of the frame is left.
    pub fn on_tick(
        &self,
        frame_time_ms: u64,
        monotonic_now_ms: u64,
        wall_now_ms: f64,
    ) -> Option<IdleBatch> {
        if self.remaining_budget(frame_time_ms, monotonic_now_ms) < self.config.min_remaining_ms {
            return None;
        }
        let ids: Vec<CallbackId> = {
            let mut state = self.lock();
            if state.pending.is_empty() {
                return None;
            }
            let take = state.pending.len().min(self.config.max_batch);
            state.pending.drain(..take).map(|(id, _)| id).collect()
        };
        let elapsed = monotonic_now_ms.saturating_sub(frame_time_ms);
        Some(IdleBatch {
            ids,
            frame_start_ms: wall_now_ms - elapsed as f64,
        })
    }

    pub fn pending_ids(&self) -> Vec<CallbackId> {
        self.lock().pending.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for IdleDispatcher {
    fn default() -> Self {
        Self::new(IdleConfig::default())
    }
}
