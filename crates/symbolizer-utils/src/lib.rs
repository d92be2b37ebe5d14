//! # Symbolizer Utilities
//!
//! Shared logging infrastructure for the symbolizer tools.
//!
//! The core library only emits `tracing` events; binaries call one of the
//! initializers here once at startup to decide where those events go.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    init_logging, init_logging_to_file, init_logging_with_level, LogFormat, LogGuard, LogLevel, LoggingError,
};
pub use tracing::{debug, error, info, trace, warn};
