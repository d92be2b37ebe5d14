//! # DbgEng Status Codes
//!
//! DbgEng methods return `HRESULT`s, surfaced by the `windows` crate as
//! `windows_core::Error`. This module converts those into [`EngineStatus`]
//! so the rest of the crate never sees a platform type.
//!
//! Common values:
//!
//! - `E_FAIL` (`0x80004005`): generic failure, e.g. no module at an address
//! - `E_NOINTERFACE` (`0x80004002`): the engine is too old for the interface
//! - `E_INVALIDARG` (`0x80070057`): bad argument, e.g. a malformed symbol name
//! - `E_OUTOFMEMORY` (`0x8007000e`)
//!
//! ## References
//!
//! - [DbgEng return values](https://learn.microsoft.com/en-us/windows-hardware/drivers/debugger/hresult-values)

use crate::engine::EngineStatus;

/// Convert a `windows_core::Error` into its raw `HRESULT`.
///
/// This allows us to use `map_err(EngineStatus::from)` on COM calls:
///
/// ```rust,ignore
/// let control = client.cast::<IDebugControl3>().map_err(EngineStatus::from)?;
/// ```
impl From<windows_core::Error> for EngineStatus
{
    fn from(err: windows_core::Error) -> Self
    {
        EngineStatus(err.code().0)
    }
}
