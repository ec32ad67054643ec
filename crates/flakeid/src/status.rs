use crate::FlakeId;

/// Represents the result of attempting to generate a new [`FlakeId`].
///
/// - [`IdGenStatus::Ready`] indicates a new ID was successfully generated.
/// - [`IdGenStatus::Pending`] means the sequence for the current millisecond
///   is exhausted and the caller should retry after `yield_for` milliseconds.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use flakeid::{FlakeGenerator, IdGenStatus, LockFlakeGenerator, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1
///     }
/// }
///
/// let generator = LockFlakeGenerator::new(0, FixedTime);
/// match generator.try_next_id().unwrap() {
///     IdGenStatus::Ready { id } => println!("ID: {}", id.timestamp()),
///     IdGenStatus::Pending { yield_for } => println!("Back off for: {yield_for}ms"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdGenStatus {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: FlakeId,
    },
    /// No ID could be generated because the sequence has been exhausted for
    /// the current tick, or a lock-free update lost a race.
    Pending {
        /// Milliseconds to wait before trying again. Zero means retry
        /// immediately.
        yield_for: u64,
    },
}
