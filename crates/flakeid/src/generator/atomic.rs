use core::cmp;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, ExhaustionPolicy, FlakeGenerator, FlakeId, IdGenStatus, Result, TimeSource,
    generator::policy::check_timestamp,
};

/// A lock-free generator suitable for multi-threaded environments.
///
/// The last issued ID lives in an [`AtomicU64`] and is advanced with a
/// compare-and-swap. A lost race is reported as `Pending { yield_for: 0 }`,
/// so the caller retries immediately.
///
/// ## Recommended When
/// - You're in a multi-threaded environment
/// - Fair access is sacrificed for higher throughput
pub struct AtomicFlakeGenerator<T>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    time: T,
    policy: ExhaustionPolicy,
}

impl<T> AtomicFlakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator with a zeroed timestamp and sequence.
    ///
    /// # Example
    /// ```
    /// use flakeid::{AtomicFlakeGenerator, DEFAULT_EPOCH, FlakeGenerator, MonotonicClock};
    ///
    /// let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
    /// let generator = AtomicFlakeGenerator::new(7, clock);
    ///
    /// let id = generator.next_id_blocking().unwrap();
    /// assert_eq!(id.machine_id(), 7);
    /// ```
    pub fn new(machine_id: u64, time: T) -> Self {
        Self::from_components(0, machine_id, 0, time)
    }

    pub fn from_components(timestamp: u64, machine_id: u64, sequence: u64, time: T) -> Self {
        let initial = FlakeId::from_components(timestamp, machine_id, sequence);
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial.to_raw())),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial.to_raw()),
            time,
            policy: ExhaustionPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attempts to generate the next available ID.
    ///
    /// # Errors
    /// - [`Error::ClockSkew`] if the time source went backwards
    /// - [`Error::EpochInFuture`] if the time source is behind its epoch
    /// - [`Error::TimestampOverflow`] past the 42-bit horizon
    /// - [`Error::DiscriminatorExhausted`] under [`ExhaustionPolicy::Fail`]
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        // Load the state before sampling the clock: any timestamp it holds was
        // read from the clock before our load, so `now` cannot be older.
        let current_raw = self.state.load(Ordering::Acquire);
        let current_id = FlakeId::from_raw(current_raw);
        let current_ts = current_id.timestamp();

        let now = check_timestamp(self.time.try_current_millis()?)?;

        let next_id = match now.cmp(&current_ts) {
            cmp::Ordering::Equal => {
                if current_id.has_sequence_room() {
                    current_id.increment_sequence()
                } else {
                    return match self.policy {
                        ExhaustionPolicy::Wait => Ok(IdGenStatus::Pending { yield_for: 1 }),
                        ExhaustionPolicy::Fail => {
                            Err(Error::DiscriminatorExhausted { timestamp: now })
                        }
                    };
                }
            }
            cmp::Ordering::Greater => current_id.rollover_to_timestamp(now),
            cmp::Ordering::Less => {
                return Err(Error::ClockSkew {
                    now,
                    last: current_ts,
                });
            }
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(IdGenStatus::Ready { id: next_id })
        } else {
            // Another thread won the race
            Ok(IdGenStatus::Pending { yield_for: 0 })
        }
    }
}

impl<T> FlakeGenerator for AtomicFlakeGenerator<T>
where
    T: TimeSource,
{
    fn try_next_id(&self) -> Result<IdGenStatus> {
        self.try_next_id()
    }
}
