//! The timing module: host-facing registration calls plus the two frame listeners.

use std::sync::{Arc, OnceLock};

use crate::clock::TimeSource;
use crate::config::TimingConfig;
use crate::error::TimingError;
use crate::idle::IdleDispatcher;
use crate::lifecycle::{FrameInfo, FrameListener};
use crate::sink::TimersSink;
use crate::timers::{Timer, TimerEngine};
use crate::CallbackId;

/// Timers and idle callbacks for one session. Registration methods take `&self`
/// and may be called from any thread; ticks arrive through the listeners returned by
/// [`Timing::timer_listener`] and [`Timing::idle_listener`].
pub struct Timing {
    config: TimingConfig,
    time: Arc<dyn TimeSource>,
    timers: TimerEngine,
    idle: IdleDispatcher,
    sink: OnceLock<Arc<dyn TimersSink>>,
}

impl std::fmt::Debug for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timing")
            .field("config", &self.config)
            .field("timers", &self.timers.len())
            .field("idle", &self.idle.len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl Timing {
    pub fn new(config: TimingConfig, time: Arc<dyn TimeSource>) -> Result<Self, TimingError> {
        config.validate()?;
        Ok(Self {
            idle: IdleDispatcher::new(config.idle.clone()),
            config,
            time,
            timers: TimerEngine::new(),
            sink: OnceLock::new(),
        })
    }

    /// Install the outbound sink. Returns `false` if one was already installed.
    pub fn initialize(&self, sink: Arc<dyn TimersSink>) -> bool {
        let installed = self.sink.set(sink).is_ok();
        if !installed {
            log::warn!("timing already initialized; keeping the first sink");
        }
        installed
    }

    pub fn is_initialized(&self) -> bool {
        self.sink.get().is_some()
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    pub fn idle(&self) -> &IdleDispatcher {
        &self.idle
    }

    /// `scheduling_time_ms` is the wall-clock time at which the script layer asked
    /// for the timer; the transit delay is subtracted from `duration_ms`.
    pub fn create_timer(
        &self,
        id: CallbackId,
        duration_ms: i64,
        scheduling_time_ms: f64,
        repeat: bool,
    ) -> Timer {
        self.timers.create_timer(
            id,
            duration_ms,
            scheduling_time_ms,
            repeat,
            self.time.monotonic_millis(),
            self.time.wall_millis(),
        )
    }

    pub fn delete_timer(&self, id: CallbackId) {
        if !self.timers.delete_timer(id) {
            log::debug!("delete_timer({id}): not live");
        }
    }

    pub fn create_idle_callback(&self, id: CallbackId) {
        self.idle.create_idle_callback(id);
    }

    pub fn delete_idle_callback(&self, id: CallbackId) {
        self.idle.delete_idle_callback(id);
    }

    /// Listener firing due timers on each tick.
    pub fn timer_listener(self: &Arc<Self>) -> Arc<dyn FrameListener> {
        Arc::new(TimerFrameListener {
            timing: self.clone(),
        })
    }

    /// Listener releasing idle callbacks on each tick.
    pub fn idle_listener(self: &Arc<Self>) -> Arc<dyn FrameListener> {
        Arc::new(IdleFrameListener {
            timing: self.clone(),
        })
    }

    fn fire_timers(&self, frame: FrameInfo) -> Result<(), TimingError> {
        let frame_ms = frame.frame_time_ms();
        // Checked before draining so a missing sink never swallows a batch.
        let Some(sink) = self.sink.get() else {
            return if self.timers.has_due(frame_ms) {
                Err(TimingError::SinkNotInitialized)
            } else {
                Ok(())
            };
        };
        let fired = self.timers.on_tick(frame_ms);
        if !fired.is_empty() {
            log::debug!("frame {frame_ms}ms: firing {} timer(s)", fired.len());
            sink.call_timers(&fired);
        }
        Ok(())
    }

    fn fire_idle(&self, frame: FrameInfo) -> Result<(), TimingError> {
        let Some(sink) = self.sink.get() else {
            return if self.idle.is_empty() {
                Ok(())
            } else {
                Err(TimingError::SinkNotInitialized)
            };
        };
        let batch = self.idle.on_tick(
            frame.frame_time_ms(),
            self.time.monotonic_millis(),
            self.time.wall_millis(),
        );
        if let Some(batch) = batch {
            log::debug!("releasing {} idle callback(s)", batch.ids.len());
            sink.call_idle_callbacks(&batch.ids, batch.frame_start_ms);
        }
        Ok(())
    }
}

struct TimerFrameListener {
    timing: Arc<Timing>,
}

impl FrameListener for TimerFrameListener {
    fn name(&self) -> &str {
        "timers"
    }

    fn on_tick(&self, frame: FrameInfo) -> Result<(), TimingError> {
        self.timing.fire_timers(frame)
    }
}

struct IdleFrameListener {
    timing: Arc<Timing>,
}

impl FrameListener for IdleFrameListener {
    fn name(&self) -> &str {
        "idle"
    }

    fn on_tick(&self, frame: FrameInfo) -> Result<(), TimingError> {
        self.timing.fire_idle(frame)
    }
}
