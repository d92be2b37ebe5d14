//! # Platform-Specific Engine Backends
//!
//! Each platform with a debugging engine has a submodule implementing the
//! capability traits of [`crate::engine`] on top of it:
//!
//! - **Windows**: DbgEng, the engine behind WinDbg
//!   - See: [Debugger Engine Reference](https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/dbgeng/)
//!
//! Only the current platform's backend is compiled.

#[cfg(windows)]
pub mod windows;
