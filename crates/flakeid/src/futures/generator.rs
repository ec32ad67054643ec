use core::{future::Future, time::Duration};

use super::SleepProvider;
use crate::{FlakeGenerator, FlakeId, IdGenStatus, Result};

/// Extension trait for asynchronously generating [`FlakeId`]s.
///
/// When the generator reports [`IdGenStatus::Pending`], the future sleeps for
/// the indicated number of milliseconds using `S` and retries, so an exhausted
/// millisecond never blocks a runtime worker thread.
pub trait FlakeGeneratorAsyncExt {
    /// Returns a future that resolves to the next available ID.
    ///
    /// # Errors
    ///
    /// Resolves to an error if the generator encounters one; the future does
    /// not retry errors.
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<FlakeId>> + Send
    where
        S: SleepProvider;
}

impl<G> FlakeGeneratorAsyncExt for G
where
    G: FlakeGenerator + Sync,
{
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<FlakeId>> + Send
    where
        S: SleepProvider,
    {
        async move {
            loop {
                let dur = match self.try_next_id()? {
                    IdGenStatus::Ready { id } => return Ok(id),
                    IdGenStatus::Pending { yield_for } => Duration::from_millis(yield_for),
                };
                S::sleep_for(dur).await;
            }
        }
    }
}
