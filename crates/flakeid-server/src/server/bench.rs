//! Local throughput estimate, with no network involved.

use core::{fmt, time::Duration};
use std::time::Instant;

use flakeid::{FlakeGenerator, IdGenStatus};

use crate::server::error::Result;

/// Outcome of [`run`].
#[derive(Clone, Copy, Debug)]
pub struct BenchReport {
    pub ids: u64,
    pub elapsed: Duration,
    pub machines: usize,
}

impl BenchReport {
    pub fn ids_per_ms(&self) -> f64 {
        let ms = self.elapsed.as_secs_f64() * 1000.0;
        if ms == 0.0 { 0.0 } else { self.ids as f64 / ms }
    }

    pub fn ids_per_machine_per_ms(&self) -> f64 {
        self.ids_per_ms() / self.machines.max(1) as f64
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Generated {} ids in {} ms",
            self.ids,
            self.elapsed.as_millis()
        )?;
        writeln!(f, "{:.2} ids/ms", self.ids_per_ms())?;
        write!(f, "{:.2} ids/machine/ms", self.ids_per_machine_per_ms())
    }
}

/// Generates IDs on the current thread for `duration`.
///
/// Pending results are spun on rather than slept on, so the figure reflects
/// the generator's ceiling and not the timer's resolution. An exhausted
/// millisecond under [`ExhaustionPolicy::Fail`] counts as pending too.
///
/// [`ExhaustionPolicy::Fail`]: flakeid::ExhaustionPolicy::Fail
pub fn run<G>(generator: &G, machines: usize, duration: Duration) -> Result<BenchReport>
where
    G: FlakeGenerator,
{
    let start = Instant::now();
    let mut ids = 0u64;

    while start.elapsed() < duration {
        match generator.try_next_id() {
            Ok(IdGenStatus::Ready { .. }) => ids += 1,
            Ok(IdGenStatus::Pending { .. }) | Err(flakeid::Error::DiscriminatorExhausted { .. }) => {
                core::hint::spin_loop();
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(BenchReport {
        ids,
        elapsed: start.elapsed(),
        machines,
    })
}
