//! frametick-orchestrator
//!
//! Wires the timing core and the animated node registry to a single frame clock.
//! Every tick runs timers first, then animated nodes, then idle callbacks with
//! whatever budget is left in the frame.

pub mod config;
pub mod controllers;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;

use frametick_animated::FrameUpdate;
use frametick_timing::{
    nanos_to_millis, ClockSource, FrameDispatcher, TimeSource, Timing, TimersSink,
};

pub use crate::config::OrchestratorConfig;
pub use crate::controllers::{AnimatedController, PropsSink};

/// Outcome of one [`Orchestrator::step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorFrame {
    pub epoch: u64,
    pub frame_time_ms: u64,
    /// False when the dispatcher was paused and no listener ran.
    pub dispatched: bool,
    pub animated: FrameUpdate,
}

pub struct Orchestrator {
    pub epoch: u64,
    config: OrchestratorConfig,
    dispatcher: FrameDispatcher,
    timing: Arc<Timing>,
    animated: Arc<AnimatedController>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("epoch", &self.epoch)
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("animated", &self.animated)
            .finish()
    }
}

impl Orchestrator {
    /// Build the timing core and animated controller and subscribe them to `clock`.
    ///
    /// With the default config the orchestrator starts paused; call
    /// [`Orchestrator::on_host_resume`] once the host is in the foreground.
    pub fn new(
        clock: Arc<dyn ClockSource>,
        time: Arc<dyn TimeSource>,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let timing = Arc::new(
            Timing::new(config.timing.clone(), time).context("building timing core")?,
        );
        let animated = Arc::new(AnimatedController::new());
        let dispatcher = FrameDispatcher::new(clock, config.timing.start_paused);
        dispatcher.register(timing.timer_listener());
        dispatcher.register(animated.clone());
        dispatcher.register(timing.idle_listener());
        log::info!(
            "orchestrator ready ({} listeners, start_paused={})",
            dispatcher.listener_count(),
            config.timing.start_paused
        );
        Ok(Self {
            epoch: 0,
            config,
            dispatcher,
            timing,
            animated,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn timing(&self) -> &Arc<Timing> {
        &self.timing
    }

    pub fn animated(&self) -> &Arc<AnimatedController> {
        &self.animated
    }

    pub fn dispatcher(&self) -> &FrameDispatcher {
        &self.dispatcher
    }

    /// Install the outbound timers sink. Returns false if one was already installed.
    pub fn initialize(&self, sink: Arc<dyn TimersSink>) -> bool {
        self.timing.initialize(sink)
    }

    pub fn set_props_sink(&self, sink: Arc<dyn PropsSink>) -> bool {
        self.animated.set_props_sink(sink)
    }

    pub fn on_host_resume(&self) -> Result<()> {
        self.dispatcher
            .on_host_resume()
            .context("resuming frame dispatcher")
    }

    pub fn on_host_pause(&self) {
        self.dispatcher.on_host_pause();
    }

    pub fn on_host_destroy(&self) {
        self.dispatcher.on_host_destroy();
    }

    /// Dispatch one frame stamped `frame_time_nanos` to every listener.
    ///
    /// Listeners all run even if one fails; the first failure is returned.
    pub fn step(&mut self, frame_time_nanos: u64) -> Result<OrchestratorFrame> {
        self.epoch = self.epoch.wrapping_add(1);
        let dispatched = !self.dispatcher.is_paused();
        // Drop anything left by clock-driven ticks so the frame only reports this one.
        self.animated.take_last_update();
        let result = self.dispatcher.tick(frame_time_nanos);
        let animated = self.animated.take_last_update().unwrap_or_default();
        result.with_context(|| format!("frame {} failed", self.epoch))?;
        Ok(OrchestratorFrame {
            epoch: self.epoch,
            frame_time_ms: nanos_to_millis(frame_time_nanos),
            dispatched,
            animated,
        })
    }
}
