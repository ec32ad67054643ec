pub mod bench;
pub mod config;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod service;
pub mod telemetry;
