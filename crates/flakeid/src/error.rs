/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `flakeid` can emit.
///
/// Sequence exhaustion is normally not an error: generators report
/// [`IdGenStatus::Pending`] and the caller waits for the next tick. Only a
/// generator configured with [`ExhaustionPolicy::Fail`] surfaces
/// [`Error::DiscriminatorExhausted`].
///
/// [`IdGenStatus::Pending`]: crate::IdGenStatus::Pending
/// [`ExhaustionPolicy::Fail`]: crate::ExhaustionPolicy::Fail
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The clock reported a time earlier than the last issued timestamp.
    ///
    /// Both values are milliseconds since the configured epoch.
    #[error("clock moved backwards: now {now}ms is behind last issued {last}ms")]
    ClockSkew { now: u64, last: u64 },

    /// The system clock is earlier than the configured epoch.
    #[error("system clock is before the configured epoch ({epoch_ms}ms since UNIX epoch)")]
    EpochInFuture { epoch_ms: u64 },

    /// All 4096 sequence values of the current millisecond were handed out.
    #[error("discriminator space exhausted for timestamp {timestamp}ms")]
    DiscriminatorExhausted { timestamp: u64 },

    /// The elapsed milliseconds no longer fit in the timestamp field.
    #[error("timestamp {timestamp}ms exceeds the {max}ms representable by the id layout")]
    TimestampOverflow { timestamp: u64, max: u64 },

    /// A machine id does not fit in the machine id field.
    #[error("machine id {machine_id} exceeds maximum {max}")]
    MachineIdOutOfRange { machine_id: u64, max: u64 },

    /// A multi-generator was given the same machine id twice.
    #[error("machine id {machine_id} listed more than once")]
    DuplicateMachineId { machine_id: u64 },

    /// A multi-generator needs at least one machine id.
    #[error("at least one machine id is required")]
    NoMachineIds,
}
