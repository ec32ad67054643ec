use portable_atomic::{AtomicUsize, Ordering};

use crate::{
    Error, ExhaustionPolicy, FlakeGenerator, IdGenStatus, LockFlakeGenerator, Result, TimeSource,
    validate_machine_ids,
};

/// Round-robins over one [`LockFlakeGenerator`] per machine ID.
///
/// Every delegate owns a distinct machine ID, so the combined discriminator
/// space per millisecond is `4096 * machine_ids.len()`. A request only reports
/// [`IdGenStatus::Pending`] once every delegate has exhausted its sequence.
///
/// # Ordering
///
/// The timestamp part (`id >> 22`) never decreases across calls, and IDs that
/// share a machine ID strictly increase. IDs from different machine IDs in the
/// same millisecond are *not* ordered by value: machine 0's next ID sorts
/// below machine 1's previous one. Use a single [`LockFlakeGenerator`] when
/// the full 64-bit value must be monotonic.
pub struct MultiFlakeGenerator<T>
where
    T: TimeSource + Clone,
{
    delegates: Vec<LockFlakeGenerator<T>>,
    cursor: AtomicUsize,
    time: T,
    policy: ExhaustionPolicy,
}

impl<T> MultiFlakeGenerator<T>
where
    T: TimeSource + Clone,
{
    /// # Errors
    ///
    /// - [`Error::NoMachineIds`] if `machine_ids` is empty
    /// - [`Error::MachineIdOutOfRange`] if any ID exceeds 10 bits
    /// - [`Error::DuplicateMachineId`] if an ID is listed twice
    pub fn try_new(machine_ids: &[u64], time: T) -> Result<Self> {
        validate_machine_ids(machine_ids)?;

        let delegates = machine_ids
            .iter()
            .map(|&machine_id| LockFlakeGenerator::new(machine_id, time.clone()))
            .collect();

        Ok(Self {
            delegates,
            cursor: AtomicUsize::new(0),
            time,
            policy: ExhaustionPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn num_generators(&self) -> usize {
        self.delegates.len()
    }

    /// Attempts to generate the next available ID, starting from the
    /// delegate after the one used last.
    ///
    /// # Errors
    ///
    /// Propagates the first delegate error, or
    /// [`Error::DiscriminatorExhausted`] when every delegate is exhausted
    /// under [`ExhaustionPolicy::Fail`].
    pub fn try_next_id(&self) -> Result<IdGenStatus> {
        let len = self.delegates.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;
        let mut wait = u64::MAX;

        for offset in 0..len {
            match self.delegates[(start + offset) % len].try_next_id()? {
                IdGenStatus::Ready { id } => return Ok(IdGenStatus::Ready { id }),
                IdGenStatus::Pending { yield_for } => wait = wait.min(yield_for),
            }
        }

        match self.policy {
            ExhaustionPolicy::Wait => Ok(IdGenStatus::Pending { yield_for: wait }),
            ExhaustionPolicy::Fail => Err(Error::DiscriminatorExhausted {
                timestamp: self.time.current_millis(),
            }),
        }
    }
}

impl<T> FlakeGenerator for MultiFlakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn try_next_id(&self) -> Result<IdGenStatus> {
        self.try_next_id()
    }
}
