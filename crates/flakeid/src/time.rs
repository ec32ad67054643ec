use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Default epoch: Friday, January 1, 2010 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_262_304_000_000);

/// A trait for time sources that return a monotonic or wall-clock timestamp.
///
/// This abstraction allows you to plug in a real system clock, a monotonic
/// timer, or a mocked time source in tests. The unit is **milliseconds**
/// relative to the time source's epoch.
///
/// # Example
///
/// ```
/// use flakeid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured epoch.
    fn current_millis(&self) -> u64;

    /// Like [`TimeSource::current_millis`], but reports a clock that cannot
    /// produce a valid reading. Generators read time through this method.
    ///
    /// # Errors
    ///
    /// The default implementation never fails.
    fn try_current_millis(&self) -> Result<u64> {
        Ok(self.current_millis())
    }
}

/// Milliseconds between the UNIX epoch and now, according to the wall clock.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Milliseconds elapsed between `epoch` and the current wall-clock time.
///
/// # Errors
///
/// Returns [`Error::EpochInFuture`] if the wall clock is earlier than `epoch`.
pub fn millis_since(epoch: Duration) -> Result<u64> {
    let epoch_ms = epoch.as_millis() as u64;
    unix_millis()
        .checked_sub(epoch_ms)
        .ok_or(Error::EpochInFuture { epoch_ms })
}

/// A wall-clock time source that reads [`SystemTime`] on every call.
///
/// Unlike [`MonotonicClock`], this clock follows NTP adjustments and may move
/// backwards. Generators detect that and report [`Error::ClockSkew`]. If the
/// wall clock falls behind the epoch after construction,
/// [`TimeSource::try_current_millis`] fails with [`Error::EpochInFuture`] and
/// [`TimeSource::current_millis`] saturates to zero.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    epoch_ms: u64,
}

impl SystemClock {
    /// # Errors
    ///
    /// Returns [`Error::EpochInFuture`] if the wall clock is earlier than
    /// `epoch`.
    pub fn try_with_epoch(epoch: Duration) -> Result<Self> {
        millis_since(epoch)?;
        Ok(Self {
            epoch_ms: epoch.as_millis() as u64,
        })
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        unix_millis().saturating_sub(self.epoch_ms)
    }

    fn try_current_millis(&self) -> Result<u64> {
        unix_millis()
            .checked_sub(self.epoch_ms)
            .ok_or(Error::EpochInFuture {
                epoch_ms: self.epoch_ms,
            })
    }
}

impl<T: TimeSource + ?Sized> TimeSource for std::sync::Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn try_current_millis(&self) -> Result<u64> {
        (**self).try_current_millis()
    }
}
