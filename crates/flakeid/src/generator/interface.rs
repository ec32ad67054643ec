use core::time::Duration;

use crate::{FlakeId, IdGenStatus, Result};

/// A minimal interface for generating [`FlakeId`]s.
///
/// Implementations hold the discriminator/clock state behind their own
/// synchronization, so a shared reference is enough to generate.
pub trait FlakeGenerator {
    /// Attempts to generate the next available ID.
    ///
    /// The returned [`IdGenStatus`] contains either:
    /// - the newly generated ID, or
    /// - a duration to yield/sleep if the timestamp sequence is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockSkew`] if the clock is behind the last issued timestamp
    /// - [`Error::TimestampOverflow`] if the timestamp field is exhausted
    /// - [`Error::DiscriminatorExhausted`] under [`ExhaustionPolicy::Fail`]
    ///
    /// [`Error::ClockSkew`]: crate::Error::ClockSkew
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    /// [`Error::DiscriminatorExhausted`]: crate::Error::DiscriminatorExhausted
    /// [`ExhaustionPolicy::Fail`]: crate::ExhaustionPolicy::Fail
    fn try_next_id(&self) -> Result<IdGenStatus>;

    /// Generates the next ID, blocking the current thread while the sequence
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`FlakeGenerator::try_next_id`].
    fn next_id_blocking(&self) -> Result<FlakeId> {
        loop {
            match self.try_next_id()? {
                IdGenStatus::Ready { id } => return Ok(id),
                IdGenStatus::Pending { yield_for: 0 } => std::thread::yield_now(),
                IdGenStatus::Pending { yield_for } => {
                    std::thread::sleep(Duration::from_millis(yield_for));
                }
            }
        }
    }
}

impl<G: FlakeGenerator + ?Sized> FlakeGenerator for std::sync::Arc<G> {
    fn try_next_id(&self) -> Result<IdGenStatus> {
        (**self).try_next_id()
    }
}
