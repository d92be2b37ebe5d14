//! # Types
//!
//! Plain value types shared by the session, the resolver and the engine
//! backends.
//!
//! None of these know about the debugging engine. They describe what the
//! caller asks for (an [`Address`], a [`TraceStyle`]) and what the build
//! targets ([`Architecture`]).

pub mod address;
pub mod style;
pub mod target;

// Re-export all public types
pub use address::Address;
pub use style::TraceStyle;
pub use target::{Architecture, SYSTEM, VERSION};
