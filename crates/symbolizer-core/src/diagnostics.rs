//! # Engine Diagnostics
//!
//! Where the debugging engine's own output goes.
//!
//! The engine prints progress and symbol-loading chatter the same way it would
//! into a debugger's command window. A session forwards that text to a
//! [`DiagnosticSink`] handed to it at construction. The sink is only ever used
//! for tracing; nothing it receives influences the outcome of a call.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use symbolizer_core::diagnostics::TracingSink;
//! use symbolizer_core::engine::create_engine;
//! use symbolizer_core::session::{Session, SessionOptions};
//!
//! let options = SessionOptions::default().with_diagnostics(Arc::new(TracingSink));
//! let mut session = Session::with_options(create_engine()?, options);
//! session.initialize("crash.dmp", None)?;
//! # Ok::<(), symbolizer_core::SymbolizerError>(())
//! ```

use tracing::debug;

/// Receiver for engine output text.
///
/// `text` is passed through as the engine produced it, usually one line with
/// its trailing newline.
pub trait DiagnosticSink
{
    /// Consume one chunk of engine output.
    fn output(&self, text: &str);
}

/// Forwards engine output to `tracing` at debug level
///
/// Events are emitted under the `symbolizer::engine` target, so they can be
/// enabled on their own with `RUST_LOG=symbolizer::engine=debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink
{
    fn output(&self, text: &str)
    {
        let text = text.trim_end();
        if !text.is_empty() {
            debug!(target: "symbolizer::engine", "{text}");
        }
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str),
{
    fn output(&self, text: &str)
    {
        self(text);
    }
}
