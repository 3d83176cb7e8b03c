//! Logging initialization.
//!
//! All components log through the `tracing` facade. The binary installs a
//! subscriber once at startup; tests install their own scoped subscriber to
//! capture events instead.

#[cfg(test)]
pub(crate) mod capture;
mod tracing_init;

pub use tracing_init::*;
