//! Fan-out of clock ticks and host lifecycle signals to registered listeners.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{nanos_to_millis, ClockSource, FrameCallback};
use crate::error::TimingError;
use crate::pause::PauseController;

/// Timestamp of the tick being dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    pub frame_time_nanos: u64,
}

impl FrameInfo {
    pub fn from_nanos(frame_time_nanos: u64) -> Self {
        Self { frame_time_nanos }
    }

    pub fn frame_time_ms(&self) -> u64 {
        nanos_to_millis(self.frame_time_nanos)
    }
}

/// Capability set of a component driven by the frame clock.
pub trait FrameListener: Send + Sync {
    fn name(&self) -> &str;
    fn on_tick(&self, frame: FrameInfo) -> Result<(), TimingError>;
    fn on_pause(&self) {}
    fn on_resume(&self) {}
    fn on_destroy(&self) {}
}

struct TickFanout {
    pause: Arc<PauseController>,
    listeners: Mutex<Vec<Arc<dyn FrameListener>>>,
    ticks: AtomicU64,
}

impl TickFanout {
    fn snapshot(&self) -> Vec<Arc<dyn FrameListener>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run every listener; a failing listener does not starve the ones after it.
    fn dispatch(&self, frame: FrameInfo) -> Result<(), TimingError> {
        if self.pause.is_paused() {
            return Ok(());
        }
        self.ticks.fetch_add(1, Ordering::Relaxed);
        let mut first_err = None;
        for listener in self.snapshot() {
            if let Err(err) = listener.on_tick(frame) {
                log::error!("listener '{}' failed on tick: {err}", listener.name());
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

impl FrameCallback for TickFanout {
    fn do_frame(&self, frame_time_nanos: u64) {
        // Errors were already logged per listener; the clock has nobody to report to.
        let _ = self.dispatch(FrameInfo::from_nanos(frame_time_nanos));
    }
}

/// Subscribes to a [`ClockSource`] on behalf of all listeners and routes host
/// pause / resume / destroy signals to them.
pub struct FrameDispatcher {
    pause: Arc<PauseController>,
    fanout: Arc<TickFanout>,
    callback: Arc<dyn FrameCallback>,
}

impl std::fmt::Debug for FrameDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDispatcher")
            .field("pause", &self.pause)
            .field("listeners", &self.listener_count())
            .field("ticks", &self.ticks())
            .finish()
    }
}

impl FrameDispatcher {
    pub fn new(clock: Arc<dyn ClockSource>, start_paused: bool) -> Self {
        let pause = Arc::new(PauseController::new(clock, start_paused));
        let fanout = Arc::new(TickFanout {
            pause: pause.clone(),
            listeners: Mutex::new(Vec::new()),
            ticks: AtomicU64::new(0),
        });
        let callback: Arc<dyn FrameCallback> = fanout.clone();
        let dispatcher = Self {
            pause,
            fanout,
            callback,
        };
        if !start_paused {
            dispatcher.pause.attach(&dispatcher.callback);
        }
        dispatcher
    }

    pub fn register(&self, listener: Arc<dyn FrameListener>) {
        log::debug!("frame listener '{}' registered", listener.name());
        self.fanout
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.fanout
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn pause_controller(&self) -> &PauseController {
        &self.pause
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Ticks that reached the listeners (paused ticks are not counted).
    pub fn ticks(&self) -> u64 {
        self.fanout.ticks.load(Ordering::Relaxed)
    }

    pub fn on_host_resume(&self) -> Result<(), TimingError> {
        if let Err(err) = self.pause.resume(&self.callback) {
            log::warn!("host resume ignored: {err}");
            return Err(err);
        }
        log::debug!("frame dispatcher resumed");
        for listener in self.fanout.snapshot() {
            listener.on_resume();
        }
        Ok(())
    }

    pub fn on_host_pause(&self) {
        self.pause.pause(&self.callback);
        log::debug!("frame dispatcher paused");
        for listener in self.fanout.snapshot() {
            listener.on_pause();
        }
    }

    pub fn on_host_destroy(&self) {
        self.pause.destroy(&self.callback);
        log::debug!("frame dispatcher destroyed");
        for listener in self.fanout.snapshot() {
            listener.on_destroy();
        }
    }

    /// Dispatch one tick directly, bypassing the clock. Honours the pause flag.
    pub fn tick(&self, frame_time_nanos: u64) -> Result<(), TimingError> {
        self.fanout.dispatch(FrameInfo::from_nanos(frame_time_nanos))
    }
}

impl Drop for FrameDispatcher {
    // The clock holds the callback, which holds the pause controller, which holds the clock.
    fn drop(&mut self) {
        self.pause.detach(&self.callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[derive(Default)]
    struct Recorder {
        ticks: Mutex<Vec<u64>>,
        events: Mutex<Vec<&'static str>>,
        fail: bool,
    }

    impl FrameListener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_tick(&self, frame: FrameInfo) -> Result<(), TimingError> {
            self.ticks.lock().unwrap().push(frame.frame_time_ms());
            if self.fail {
                Err(TimingError::SinkNotInitialized)
            } else {
                Ok(())
            }
        }

        fn on_pause(&self) {
            self.events.lock().unwrap().push("pause");
        }

        fn on_resume(&self) {
            self.events.lock().unwrap().push("resume");
        }

        fn on_destroy(&self) {
            self.events.lock().unwrap().push("destroy");
        }
    }

    #[test]
    fn paused_dispatcher_is_detached_from_the_clock() {
        let clock = Arc::new(ManualClock::new(16, 0.0));
        let dispatcher = FrameDispatcher::new(clock.clone(), true);
        let recorder = Arc::new(Recorder::default());
        dispatcher.register(recorder.clone());

        clock.frame();
        assert!(recorder.ticks.lock().unwrap().is_empty());
        assert_eq!(clock.subscriber_count(), 0);

        dispatcher.on_host_resume().expect("resume");
        clock.frame();
        clock.advance(16);
        clock.frame();
        assert_eq!(*recorder.ticks.lock().unwrap(), vec![16, 32]);

        dispatcher.on_host_pause();
        clock.advance(16);
        clock.frame();
        assert_eq!(recorder.ticks.lock().unwrap().len(), 2);
        assert_eq!(dispatcher.ticks(), 2);
        assert_eq!(*recorder.events.lock().unwrap(), vec!["resume", "pause"]);
    }

    #[test]
    fn manual_tick_respects_pause_flag() {
        let clock = Arc::new(ManualClock::default());
        let dispatcher = FrameDispatcher::new(clock, true);
        let recorder = Arc::new(Recorder::default());
        dispatcher.register(recorder.clone());
        dispatcher.tick(5_000_000).expect("paused tick is a no-op");
        assert!(recorder.ticks.lock().unwrap().is_empty());
    }

    #[test]
    fn destroy_detaches_permanently() {
        let clock = Arc::new(ManualClock::default());
        let dispatcher = FrameDispatcher::new(clock.clone(), false);
        assert_eq!(clock.subscriber_count(), 1);
        dispatcher.on_host_destroy();
        assert_eq!(clock.subscriber_count(), 0);
        assert_eq!(dispatcher.on_host_resume(), Err(TimingError::Destroyed));
        assert_eq!(clock.subscriber_count(), 0);
        assert!(dispatcher.is_paused());
    }

    #[test]
    fn dropping_dispatcher_unsubscribes_and_releases_listeners() {
        let clock = Arc::new(ManualClock::default());
        let recorder = Arc::new(Recorder::default());
        let dispatcher = FrameDispatcher::new(clock.clone(), false);
        dispatcher.register(recorder.clone());
        assert_eq!(clock.subscriber_count(), 1);
        assert_eq!(Arc::strong_count(&recorder), 2);

        drop(dispatcher);
        assert_eq!(clock.subscriber_count(), 0);
        assert_eq!(Arc::strong_count(&recorder), 1);
        clock.frame();
        assert!(recorder.ticks.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_listener_does_not_block_others() {
        let clock = Arc::new(ManualClock::default());
        let dispatcher = FrameDispatcher::new(clock, false);
        let bad = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let good = Arc::new(Recorder::default());
        dispatcher.register(bad);
        dispatcher.register(good.clone());
        let err = dispatcher.tick(1_000_000).expect_err("bad listener fails");
        assert_eq!(err, TimingError::SinkNotInitialized);
        assert_eq!(*good.ticks.lock().unwrap(), vec![1]);
    }
}
