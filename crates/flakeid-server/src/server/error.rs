//! Error types for the ID service.
//!
//! Every variant terminates the affected connection; none of them is ever
//! turned into a reply on the wire.

use std::io;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the ID service, the probe client and the CLI.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connect, accept, read or write failure.
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// The peer sent a byte that is not a recognized opcode.
    #[error("Protocol error: unrecognized opcode 0x{opcode:02x}")]
    Protocol { opcode: u8 },

    /// The peer closed the stream in the middle of a frame.
    #[error("Protocol error: stream closed after {received} of {expected} bytes")]
    ShortRead { received: usize, expected: usize },

    /// The peer sent nothing for longer than the configured idle timeout.
    #[error("Connection idle for longer than {0:?}")]
    IdleTimeout(std::time::Duration),

    /// Underlying ID generation failed.
    #[error("ID error: {0}")]
    Generator(#[from] flakeid::Error),

    /// A CLI argument or environment variable failed validation.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
}
