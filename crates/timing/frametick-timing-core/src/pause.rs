//! Pause flag plus the clock subscription it controls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::clock::{ClockSource, FrameCallback};
use crate::error::TimingError;

/// Owns the process-wide pause flag. The flag is read lock-free on every tick;
/// toggling it also attaches or detaches the frame callback so a paused
/// subsystem receives no ticks at all.
pub struct PauseController {
    clock: Arc<dyn ClockSource>,
    paused: AtomicBool,
    destroyed: AtomicBool,
    /// Whether the frame callback is currently posted to the clock.
    posted: Mutex<bool>,
}

impl std::fmt::Debug for PauseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PauseController")
            .field("paused", &self.is_paused())
            .field("destroyed", &self.is_destroyed())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl PauseController {
    pub fn new(clock: Arc<dyn ClockSource>, start_paused: bool) -> Self {
        Self {
            clock,
            paused: AtomicBool::new(start_paused),
            destroyed: AtomicBool::new(false),
            posted: Mutex::new(false),
        }
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    pub fn is_attached(&self) -> bool {
        *self.posted.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pause(&self, callback: &Arc<dyn FrameCallback>) {
        self.paused.store(true, Ordering::Release);
        self.detach(callback);
    }

    pub fn resume(&self, callback: &Arc<dyn FrameCallback>) -> Result<(), TimingError> {
        if self.is_destroyed() {
            return Err(TimingError::Destroyed);
        }
        self.paused.store(false, Ordering::Release);
        self.attach(callback);
        Ok(())
    }

    /// Pause and detach for good; later resumes fail with [`TimingError::Destroyed`].
    pub fn destroy(&self, callback: &Arc<dyn FrameCallback>) {
        self.destroyed.store(true, Ordering::Release);
        self.paused.store(true, Ordering::Release);
        self.detach(callback);
    }

    /// Post the callback unless already posted.
    pub fn attach(&self, callback: &Arc<dyn FrameCallback>) {
        let mut posted = self.posted.lock().unwrap_or_else(PoisonError::into_inner);
        if !*posted && !self.is_destroyed() {
            self.clock.post_frame_callback(callback.clone());
            *posted = true;
        }
    }

    pub fn detach(&self, callback: &Arc<dyn FrameCallback>) {
        let mut posted = self.posted.lock().unwrap_or_else(PoisonError::into_inner);
        if *posted {
            self.clock.remove_frame_callback(callback);
            *posted = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    struct Noop;

    impl FrameCallback for Noop {
        fn do_frame(&self, _frame_time_nanos: u64) {}
    }

    #[test]
    fn toggles_flag_and_subscription_together() {
        let clock = Arc::new(ManualClock::default());
        let pause = PauseController::new(clock.clone(), true);
        let cb: Arc<dyn FrameCallback> = Arc::new(Noop);

        assert!(pause.is_paused());
        assert_eq!(clock.subscriber_count(), 0);

        pause.resume(&cb).expect("resume");
        pause.resume(&cb).expect("resume twice");
        assert!(!pause.is_paused());
        assert_eq!(clock.subscriber_count(), 1);

        pause.pause(&cb);
        assert!(pause.is_paused());
        assert!(!pause.is_attached());
        assert_eq!(clock.subscriber_count(), 0);
    }

    #[test]
    fn destroy_is_permanent() {
        let clock = Arc::new(ManualClock::default());
        let pause = PauseController::new(clock.clone(), false);
        let cb: Arc<dyn FrameCallback> = Arc::new(Noop);
        pause.attach(&cb);
        pause.destroy(&cb);
        assert_eq!(clock.subscriber_count(), 0);
        assert_eq!(pause.resume(&cb), Err(TimingError::Destroyed));
        pause.attach(&cb);
        assert_eq!(clock.subscriber_count(), 0);
    }
}
