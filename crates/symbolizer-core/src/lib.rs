//! # symbolizer-core
//!
//! Address symbolization and symbol resolution against a crash dump or trace
//! snapshot, backed by an external debugging engine.
//!
//! This crate provides:
//! - A [`Session`] that stages the engine, loads a snapshot and waits until
//!   it is queryable
//! - Address → `module+offset` / `symbol+displacement` symbolization with a
//!   per-session cache
//! - `module!symbol` → address resolution
//!
//! ## Platform Support
//!
//! - **Windows**: Uses the DbgEng engine (`dbgeng.dll`, `dbghelp.dll`, ...)
//! - **Other platforms**: The session, cache and resolver build and run
//!   against any [`engine::DebugEngine`] implementation, but there is no
//!   engine backend; [`engine::create_engine`] reports `EngineUnavailable`
//!
//! ## Why unsafe code is needed
//!
//! The engine backend calls COM interfaces exported by native libraries.
//! Those calls are wrapped in safe capability objects in [`platform`]; the
//! rest of the crate is safe code.

#![allow(unsafe_code)] // Required for the DbgEng COM bindings

pub mod cache;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod handles;
pub mod platform;
pub mod prelude;
pub mod resolver;
pub mod session;
pub mod snapshot;
pub mod staging;
pub mod types;

pub use engine::{create_engine, DebugEngine};
// Re-export commonly used types
pub use error::{Result, SymbolizerError};
pub use session::{Session, SessionOptions, SessionState};
pub use types::{Address, TraceStyle};
