//! frametick-timing-core
//!
//! Timers and idle callbacks that fire on frame boundaries. A [`ClockSource`]
//! delivers one timestamp per display refresh to a [`FrameDispatcher`], which fans
//! the tick out to every registered [`FrameListener`] unless the subsystem is paused.
//!
//! - [`TimerEngine`] keeps a [`DeadlineQueue`] of one-shot and repeating timers and
//!   reports every id whose deadline is strictly before the tick.
//! - [`IdleDispatcher`] hands out a bounded batch of idle callbacks when enough of the
//!   frame budget is left.
//! - [`Timing`] glues both to a [`TimersSink`] and the host's registration calls.

pub mod clock;
pub mod config;
pub mod deadline_queue;
pub mod error;
pub mod idle;
pub mod lifecycle;
pub mod pause;
pub mod sink;
pub mod timers;
pub mod timing;

/// Caller-assigned identifier shared by timers and idle callbacks.
pub type CallbackId = i32;

pub use clock::{
    nanos_to_millis, ClockSource, FrameCallback, ManualClock, SystemTimeSource, TimeSource,
};
pub use config::{IdleConfig, TimingConfig};
pub use deadline_queue::{Deadline, DeadlineQueue};
pub use error::TimingError;
pub use idle::{IdleBatch, IdleCallback, IdleDispatcher};
pub use lifecycle::{FrameDispatcher, FrameInfo, FrameListener};
pub use pause::PauseController;
pub use sink::{RecordingSink, SinkCall, TimersSink};
pub use timers::{Timer, TimerEngine};
pub use timing::Timing;
