//! TCP service implementation.
//!
//! - [`config`] - concrete clock and generator types used by the binary.
//! - [`handler`] - the accept loop and per-connection request handling
//!   (`IdService`).

pub mod config;
pub mod handler;
