use serde::Serialize;

use crate::spring::Spring;
use crate::types::{NodeId, SpringConfig};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SpringPhase {
    NotStarted,
    Running,
    AtRest,
}

/// Drives a value node with a [`Spring`] until the spring comes to rest.
#[derive(Debug, Clone)]
pub struct SpringDriverNode {
    pub drives: NodeId,
    config: SpringConfig,
    spring: Spring,
    phase: SpringPhase,
    last_time_ms: u64,
}

impl SpringDriverNode {
    pub fn new(drives: NodeId, config: SpringConfig) -> Self {
        Self {
            drives,
            spring: Spring::new(&config),
            config,
            phase: SpringPhase::NotStarted,
            last_time_ms: 0,
        }
    }

    pub fn config(&self) -> &SpringConfig {
        &self.config
    }

    pub fn phase(&self) -> SpringPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SpringPhase::AtRest
    }

    pub fn value(&self) -> f64 {
        self.spring.value()
    }

    /// Advance to `frame_time_ms` and return the new value for the driven node.
    ///
    /// The first step adopts `current_value` as the starting point and consumes no
    /// time. Returns `None` once the spring is at rest.
    pub fn step(&mut self, frame_time_ms: u64, current_value: f64) -> Option<f64> {
        match self.phase {
            SpringPhase::AtRest => return None,
            SpringPhase::NotStarted => {
                self.last_time_ms = frame_time_ms;
                self.spring.set_current_value(current_value);
                self.phase = SpringPhase::Running;
            }
            SpringPhase::Running => {}
        }
        let elapsed_ms = frame_time_ms.saturating_sub(self.last_time_ms);
        self.spring.advance(elapsed_ms as f64 / 1000.0);
        self.last_time_ms = frame_time_ms;
        if self.spring.is_at_rest() {
            self.phase = SpringPhase::AtRest;
        }
        Some(self.spring.value())
    }
}
