//! Common module for library exports

pub use crate::diagnostics::{DiagnosticSink, TracingSink};
pub use crate::engine::{create_engine, DebugEngine, EngineStatus};
pub use crate::error::{Result, SymbolizerError};
pub use crate::session::{Session, SessionOptions, SessionState};
pub use crate::staging::DependencyLayout;
pub use crate::types::{Address, Architecture, TraceStyle};
