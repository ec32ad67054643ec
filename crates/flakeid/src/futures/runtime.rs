use core::time::Duration;

use crate::futures::SleepProvider;

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on Tokio.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    async fn sleep_for(dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// Yields to the scheduler instead of arming a timer. Lower latency under
/// light load, more scheduler churn under heavy load.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    async fn sleep_for(_dur: Duration) {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, sync::Arc};

    use futures::future::try_join_all;

    use super::*;
    use crate::{
        AtomicFlakeGenerator, DEFAULT_EPOCH, FlakeGenerator, FlakeGeneratorAsyncExt, FlakeId,
        LockFlakeGenerator, MonotonicClock, MultiFlakeGenerator, Result,
    };

    const TASKS: usize = 1_000;
    const IDS_PER_TASK: usize = 16;

    fn clock() -> MonotonicClock {
        MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap()
    }

    async fn generate_concurrently<G, S>(generator: G) -> Result<HashSet<FlakeId>>
    where
        G: FlakeGenerator + Send + Sync + 'static,
        S: SleepProvider + 'static,
    {
        let generator = Arc::new(generator);
        let tasks = (0..TASKS).map(|_| {
            let generator = Arc::clone(&generator);
            tokio::spawn(async move {
                let mut ids = Vec::with_capacity(IDS_PER_TASK);
                for _ in 0..IDS_PER_TASK {
                    ids.push(generator.try_next_id_async::<S>().await?);
                }
                Ok::<_, crate::Error>(ids)
            })
        });

        let mut seen = HashSet::with_capacity(TASKS * IDS_PER_TASK);
        for ids in try_join_all(tasks).await.expect("task panicked") {
            for id in ids? {
                assert!(seen.insert(id), "duplicate id {id:?}");
            }
        }
        Ok(seen)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn lock_generates_unique_ids_sleep() -> Result<()> {
        let generator = LockFlakeGenerator::new(0, clock());
        let seen = generate_concurrently::<_, TokioSleep>(generator).await?;
        assert_eq!(seen.len(), TASKS * IDS_PER_TASK);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn atomic_generates_unique_ids_yield() -> Result<()> {
        let generator = AtomicFlakeGenerator::new(0, clock());
        let seen = generate_concurrently::<_, TokioYield>(generator).await?;
        assert_eq!(seen.len(), TASKS * IDS_PER_TASK);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn multi_generates_unique_ids_sleep() -> Result<()> {
        let generator = MultiFlakeGenerator::try_new(&[0, 1], clock())?;
        let seen = generate_concurrently::<_, TokioSleep>(generator).await?;
        assert_eq!(seen.len(), TASKS * IDS_PER_TASK);
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_sequence_waits_for_next_tick() -> Result<()> {
        let generator = LockFlakeGenerator::new(0, clock());
        // 4097 ids cannot fit in a single millisecond
        let first = generator.try_next_id_async::<TokioSleep>().await?;
        let mut last = first;
        for _ in 0..=FlakeId::max_sequence() {
            last = generator.try_next_id_async::<TokioSleep>().await?;
        }
        assert!(last.timestamp() > first.timestamp());
        Ok(())
    }
}
