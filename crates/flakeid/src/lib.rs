//! Snowflake-style 64-bit identifiers.
//!
//! A [`FlakeId`] packs milliseconds since a configurable epoch into its high
//! 42 bits and a 22-bit discriminator (10-bit machine ID, 12-bit sequence)
//! into the low bits. Generators hand out unique, time-ordered IDs from any
//! number of threads:
//!
//! ```
//! use flakeid::{DEFAULT_EPOCH, FlakeGenerator, LockFlakeGenerator, MonotonicClock, decode};
//!
//! let clock = MonotonicClock::try_with_epoch(DEFAULT_EPOCH).unwrap();
//! let generator = LockFlakeGenerator::new(1, clock);
//!
//! let id = generator.next_id_blocking().unwrap();
//! assert_eq!(decode(id.to_i64()), id.timestamp());
//! ```

mod error;
#[cfg(feature = "async-tokio")]
mod futures;
mod generator;
mod id;
mod mono_clock;
mod status;
mod time;

pub use crate::error::*;
#[cfg(feature = "async-tokio")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::mono_clock::*;
pub use crate::status::*;
pub use crate::time::*;
