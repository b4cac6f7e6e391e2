//! Clock seams: the periodic frame signal and the time readings the components need.
//!
//! Frame timestamps and [`TimeSource::monotonic_millis`] share one monotonic time base;
//! [`TimeSource::wall_millis`] is epoch time and is only used to translate between the
//! script layer's clock and the monotonic one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const NANOS_PER_MILLI: u64 = 1_000_000;

#[inline]
pub fn nanos_to_millis(nanos: u64) -> u64 {
    nanos / NANOS_PER_MILLI
}

/// Receives one call per display refresh while subscribed to a [`ClockSource`].
pub trait FrameCallback: Send + Sync {
    fn do_frame(&self, frame_time_nanos: u64);
}

/// External periodic signal generator (the display's vsync).
pub trait ClockSource: Send + Sync {
    fn post_frame_callback(&self, callback: Arc<dyn FrameCallback>);
    fn remove_frame_callback(&self, callback: &Arc<dyn FrameCallback>);
}

/// Time readings used by registration and idle budgeting.
pub trait TimeSource: Send + Sync {
    /// Milliseconds on the same base as frame timestamps.
    fn monotonic_millis(&self) -> u64;
    /// Milliseconds since the Unix epoch.
    fn wall_millis(&self) -> f64;
}

/// [`TimeSource`] backed by `Instant` and `SystemTime`.
///
/// Hosts stamping frames themselves should use [`SystemTimeSource::monotonic_nanos`]
/// so that frame times and deadlines agree.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn monotonic_nanos(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn monotonic_millis(&self) -> u64 {
        nanos_to_millis(self.monotonic_nanos())
    }

    fn wall_millis(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven clock for tests and hosts that own their frame loop.
///
/// Acts both as the [`TimeSource`] and as the [`ClockSource`]; [`ManualClock::frame`]
/// delivers the current monotonic time to every posted callback.
#[derive(Default)]
pub struct ManualClock {
    monotonic_ms: AtomicU64,
    wall_ms_bits: AtomicU64,
    callbacks: Mutex<Vec<Arc<dyn FrameCallback>>>,
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("monotonic_ms", &self.monotonic_millis())
            .field("wall_ms", &self.wall_millis())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ManualClock {
    pub fn new(monotonic_ms: u64, wall_ms: f64) -> Self {
        Self {
            monotonic_ms: AtomicU64::new(monotonic_ms),
            wall_ms_bits: AtomicU64::new(wall_ms.to_bits()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn set_monotonic_millis(&self, ms: u64) {
        self.monotonic_ms.store(ms, Ordering::SeqCst);
    }

    pub fn set_wall_millis(&self, ms: f64) {
        self.wall_ms_bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Move both clocks forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.monotonic_ms.fetch_add(ms, Ordering::SeqCst);
        self.set_wall_millis(self.wall_millis() + ms as f64);
    }

    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver one frame stamped with the current monotonic time.
    pub fn frame(&self) {
        self.frame_at(self.monotonic_millis() * NANOS_PER_MILLI);
    }

    /// Deliver one frame with an explicit timestamp.
    pub fn frame_at(&self, frame_time_nanos: u64) {
        // Snapshot so callbacks may unsubscribe while being called.
        let callbacks: Vec<Arc<dyn FrameCallback>> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for cb in callbacks {
            cb.do_frame(frame_time_nanos);
        }
    }
}

impl TimeSource for ManualClock {
    fn monotonic_millis(&self) -> u64 {
        self.monotonic_ms.load(Ordering::SeqCst)
    }

    fn wall_millis(&self) -> f64 {
        f64::from_bits(self.wall_ms_bits.load(Ordering::SeqCst))
    }
}

impl ClockSource for ManualClock {
    fn post_frame_callback(&self, callback: Arc<dyn FrameCallback>) {
        let mut callbacks = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !callbacks
            .iter()
            .any(|cb| std::ptr::addr_eq(Arc::as_ptr(cb), Arc::as_ptr(&callback)))
        {
            callbacks.push(callback);
        }
    }

    fn remove_frame_callback(&self, callback: &Arc<dyn FrameCallback>) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|cb| !std::ptr::addr_eq(Arc::as_ptr(cb), Arc::as_ptr(callback)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(AtomicU64);

    impl FrameCallback for Counter {
        fn do_frame(&self, frame_time_nanos: u64) {
            self.0.store(frame_time_nanos, Ordering::SeqCst);
        }
    }

    #[test]
    fn nanos_truncate_to_millis() {
        assert_eq!(nanos_to_millis(16_999_999), 16);
        assert_eq!(nanos_to_millis(17_000_000), 17);
    }

    #[test]
    fn manual_clock_delivers_frames_until_removed() {
        let clock = ManualClock::new(100, 1_000.0);
        let counter = Arc::new(Counter(AtomicU64::new(0)));
        let cb: Arc<dyn FrameCallback> = counter.clone();

        clock.post_frame_callback(cb.clone());
        clock.post_frame_callback(cb.clone());
        assert_eq!(clock.subscriber_count(), 1, "posting twice is idempotent");

        clock.frame();
        assert_eq!(counter.0.load(Ordering::SeqCst), 100_000_000);

        clock.remove_frame_callback(&cb);
        clock.advance(16);
        clock.frame();
        assert_eq!(counter.0.load(Ordering::SeqCst), 100_000_000);
        assert_eq!(clock.monotonic_millis(), 116);
        assert_eq!(clock.wall_millis(), 1_016.0);
    }
}
