use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{Result, TimeSource, millis_since};

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source that returns elapsed time since construction,
/// offset from a user-defined epoch.
///
/// This avoids wall-clock adjustments (e.g., NTP or daylight savings changes)
/// while still aligning timestamps to a fixed origin.
///
/// The epoch offset is captured once from the wall clock at construction; a
/// background thread then advances a shared counter from a monotonic
/// [`Instant`]. The thread exits once every clone has been dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    epoch_offset: u64, // in milliseconds
}

impl MonotonicClock {
    /// Constructs a monotonic clock using `epoch` (a [`Duration`] since
    /// 1970-01-01 UTC) as the origin (t = 0).
    ///
    /// # Errors
    ///
    /// Returns [`Error::EpochInFuture`] if the current system time is earlier
    /// than the given epoch.
    ///
    /// # Example
    ///
    /// ```
    /// use flakeid::{DEFAULT_EPOCH, MonotonicClock, TimeSource};
    ///
    /// let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
    /// let first = clock.current_millis();
    /// std::thread::sleep(std::time::Duration::from_millis(5));
    ///
    /// // The ticker may lag by a tick, but it never goes backwards.
    /// assert!(clock.current_millis() >= first);
    /// ```
    ///
    /// [`Error::EpochInFuture`]: crate::Error::EpochInFuture
    pub fn try_with_epoch(epoch: Duration) -> Result<Self> {
        let start = Instant::now();
        let offset = millis_since(epoch)?;

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                // Absolute target time of the next tick
                let target = start + Duration::from_millis(tick);

                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                // Align to next tick after the current actual time
                tick = now_ms + 1;
            }
        });

        let _ = inner._handle.set(handle);

        Ok(Self {
            inner,
            epoch_offset: offset,
        })
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the number of milliseconds since the configured epoch, based on
    /// the elapsed monotonic time since construction.
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_EPOCH, Error, unix_millis};

    #[test]
    fn tracks_wall_clock_from_epoch() {
        let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
        let expected = unix_millis() - DEFAULT_EPOCH.as_millis() as u64;
        assert!(clock.current_millis().abs_diff(expected) < 1_000);
    }

    #[test]
    fn never_goes_backwards() {
        let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
        let mut last = clock.current_millis();
        for _ in 0..10_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn rejects_future_epoch() {
        let epoch = Duration::from_millis(unix_millis() + 3_600_000);
        assert!(matches!(
            MonotonicClock::try_with_epoch(epoch),
            Err(Error::EpochInFuture { .. })
        ));
    }
}
