//! Tracing/logging setup shared by binaries and tests embedding the order engine.
//!
//! The engine only emits `tracing` events; installing a subscriber is left to
//! the host process through [`init`] or [`init_with`].

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init_with(self::tracing::LogConfig::from_env());
}

pub use self::tracing::{LogConfig, LogFormat, init_with};

/// Subscriber configuration (filters, formats).
pub mod tracing;
