//! Outbound interface toward the script layer.

use std::sync::{Mutex, PoisonError};

use crate::CallbackId;

/// Receives fired batches. Each method is called at most once per tick and never
/// with an empty batch.
pub trait TimersSink: Send + Sync {
    fn call_timers(&self, ids: &[CallbackId]);
    fn call_idle_callbacks(&self, ids: &[CallbackId], frame_start_ms: f64);
}

#[derive(Clone, Debug, PartialEq)]
pub enum SinkCall {
    Timers(Vec<CallbackId>),
    Idle {
        ids: Vec<CallbackId>,
        frame_start_ms: f64,
    },
}

/// Sink that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<SinkCall> {
        std::mem::take(&mut *self.calls.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All timer ids fired so far, in call order.
    pub fn fired_timers(&self) -> Vec<CallbackId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Timers(ids) => Some(ids),
                SinkCall::Idle { .. } => None,
            })
            .flatten()
            .collect()
    }

    fn push(&self, call: SinkCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl TimersSink for RecordingSink {
    fn call_timers(&self, ids: &[CallbackId]) {
        self.push(SinkCall::Timers(ids.to_vec()));
    }

    fn call_idle_callbacks(&self, ids: &[CallbackId], frame_start_ms: f64) {
        self.push(SinkCall::Idle {
            ids: ids.to_vec(),
            frame_start_ms,
        });
    }
}
