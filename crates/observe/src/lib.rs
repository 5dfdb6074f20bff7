//! Initialization logic for logging. Libraries in this workspace only emit
//! `tracing` events; binaries and tests install a subscriber through this
//! crate.
pub mod config;
pub mod tracing;

pub use config::Config;
