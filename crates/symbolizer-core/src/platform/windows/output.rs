//! # Engine Output Callbacks
//!
//! `IDebugOutputCallbacks` implementation that forwards everything the engine
//! prints into a [`DiagnosticSink`].
//!
//! The engine holds a COM reference to the callbacks object; the sink is kept
//! alive by that object for as long as the engine references it.

use std::sync::Arc;

use ::windows::Win32::System::Diagnostics::Debug::Extensions::{IDebugOutputCallbacks, IDebugOutputCallbacks_Impl};
use windows_core::{implement, PCSTR};

use crate::diagnostics::DiagnosticSink;

/// COM object handed to `IDebugClient::SetOutputCallbacks`.
#[implement(IDebugOutputCallbacks)]
pub struct OutputForwarder
{
    sink: Arc<dyn DiagnosticSink>,
}

impl OutputForwarder
{
    /// Wrap `sink` into an `IDebugOutputCallbacks` interface.
    pub fn into_callbacks(sink: Arc<dyn DiagnosticSink>) -> IDebugOutputCallbacks
    {
        OutputForwarder { sink }.into()
    }
}

impl IDebugOutputCallbacks_Impl for OutputForwarder_Impl
{
    fn Output(&self, _mask: u32, text: &PCSTR) -> windows_core::Result<()>
    {
        if text.is_null() {
            return Ok(());
        }

        // SAFETY: the engine passes a NUL-terminated string valid for the
        // duration of the call.
        let text = unsafe { text.to_string() }.unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned());
        self.sink.output(&text);
        Ok(())
    }
}
