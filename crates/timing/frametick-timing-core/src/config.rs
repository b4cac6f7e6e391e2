//! Configuration for the timing subsystem.

use serde::{Deserialize, Serialize};

use crate::error::TimingError;

/// Nominal frame length used to estimate the remaining budget of a frame.
pub const DEFAULT_FRAME_BUDGET_MS: u64 = 17;
/// Idle callbacks only run when at least this much of the frame is left.
pub const DEFAULT_MIN_REMAINING_MS: u64 = 12;
/// Upper bound on idle callbacks emitted per tick.
pub const DEFAULT_MAX_IDLE_BATCH: usize = 5;

/// Policy knobs for the idle dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub frame_budget_ms: u64,
    pub min_remaining_ms: u64,
    pub max_batch: usize,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            min_remaining_ms: DEFAULT_MIN_REMAINING_MS,
            max_batch: DEFAULT_MAX_IDLE_BATCH,
        }
    }
}

impl IdleConfig {
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.max_batch == 0 {
            return Err(TimingError::InvalidConfig(
                "idle.max_batch must be at least 1".into(),
            ));
        }
        if self.min_remaining_ms > self.frame_budget_ms {
            return Err(TimingError::InvalidConfig(format!(
                "idle.min_remaining_ms ({}) exceeds idle.frame_budget_ms ({})",
                self.min_remaining_ms, self.frame_budget_ms
            )));
        }
        Ok(())
    }
}

/// Top-level configuration for [`Timing`](crate::Timing) and its dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub idle: IdleConfig,
    /// Start paused and detached from the clock until the host resumes.
    pub start_paused: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            idle: IdleConfig::default(),
            start_paused: true,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), TimingError> {
        self.idle.validate()
    }
}
