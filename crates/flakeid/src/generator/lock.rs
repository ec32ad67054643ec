use core::cmp::Ordering;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, ExhaustionPolicy, FlakeGenerator, FlakeId, IdGenStatus, Result, TimeSource,
    generator::policy::check_timestamp,
};

/// A lock-based generator suitable for multi-threaded environments.
///
/// The last issued ID is kept behind a [`parking_lot::Mutex`], so concurrent
/// callers are served in lock acquisition order and never observe the same
/// discriminator twice within a millisecond.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access across threads is important
///
/// ## See Also
/// - [`AtomicFlakeGenerator`]
/// - [`MultiFlakeGenerator`]
///
/// [`AtomicFlakeGenerator`]: crate::AtomicFlakeGenerator
/// [`MultiFlakeGenerator`]: crate::MultiFlakeGenerator
pub struct LockFlakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<FlakeId>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<FlakeId>,
    time: T,
    policy: ExhaustionPolicy,
}

impl<T> LockFlakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator with a zeroed timestamp and sequence.
    ///
    /// `machine_id` is masked to 10 bits; use [`validate_machine_id`] first if
    /// the value comes from user input.
    ///
    /// # Example
    /// ```
    /// use flakeid::{DEFAULT_EPOCH, FlakeGenerator, LockFlakeGenerator, MonotonicClock};
    ///
    /// let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
    /// let generator = LockFlakeGenerator::new(0, clock);
    ///
    /// let id = generator.next_id_blocking().unwrap();
    /// assert_eq!(id.machine_id(), 0);
    /// ```
    ///
    /// [`validate_machine_id`]: crate::validate_machine_id
    pub fn new(machine_id: u64, time: T) -> Self {
        Self::from_components(0, machine_id, 0, time)
    }

    /// Creates a new generator from explicit component values.
    ///
    /// Primarily useful for restoring state or for tests that need to start
    /// right before sequence exhaustion.
    pub fn from_components(timestamp: u64, machine_id: u64, sequence: u64, time: T) -> Self {
        let id = FlakeId::from_components(timestamp, machine_id, sequence);
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(id)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(id),
            time,
            policy: ExhaustionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn machine_id(&self) -> u64 {
        self.state.lock().machine_id()
    }

    /// Attempts to generate the next available ID.
    ///
    /// # Returns
    /// - `Ok(IdGenStatus::Ready { id })`: A new ID is available
    /// - `Ok(IdGenStatus::Pending { yield_for })`: The time to wait (in
    ///   milliseconds) before trying again
    ///
    /// # Errors
    /// - [`Error::ClockSkew`] if the time source went backwards
    /// - [`Error::EpochInFuture`] if the time source is behind its epoch
    /// - [`Error::TimestampOverflow`] past the 42-bit horizon
    /// - [`Error::DiscriminatorExhausted`] under [`ExhaustionPolicy::Fail`]
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        let mut id = self.state.lock();

        // Sampled under the lock so a concurrent caller can never have stored
        // a newer timestamp than the one we read.
        let now = check_timestamp(self.time.try_current_millis()?)?;

        let current_ts = id.timestamp();
        match now.cmp(&current_ts) {
            Ordering::Equal => {
                if id.has_sequence_room() {
                    *id = id.increment_sequence();
                    Ok(IdGenStatus::Ready { id: *id })
                } else {
                    self.cold_exhausted(now)
                }
            }
            Ordering::Greater => {
                *id = id.rollover_to_timestamp(now);
                Ok(IdGenStatus::Ready { id: *id })
            }
            Ordering::Less => Err(Error::ClockSkew {
                now,
                last: current_ts,
            }),
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_exhausted(&self, timestamp: u64) -> Result<IdGenStatus> {
        match self.policy {
            ExhaustionPolicy::Wait => Ok(IdGenStatus::Pending { yield_for: 1 }),
            ExhaustionPolicy::Fail => Err(Error::DiscriminatorExhausted { timestamp }),
        }
    }
}

impl<T> FlakeGenerator for LockFlakeGenerator<T>
where
    T: TimeSource,
{
    fn try_next_id(&self) -> Result<IdGenStatus> {
        self.try_next_id()
    }
}
