//! # Windows Debugging Engine (DbgEng)
//!
//! Engine backend built on DbgEng, the engine behind WinDbg and cdb.
//!
//! DbgEng is a set of COM interfaces exported by `dbgeng.dll`. A session goes
//! through them like this:
//!
//! - `DebugCreate()`: create an `IDebugClient5`
//! - `QueryInterface`: derive `IDebugControl3` and `IDebugSymbols3` from it
//! - `IDebugClient::OpenDumpFileWide()`: attach the crash dump by handle
//! - `IDebugControl::WaitForEvent()`: let the engine deliver the dump's last
//!   event; the dump is not queryable before that
//! - `IDebugSymbols::GetModuleByOffset()` / `GetModuleNameString()` /
//!   `GetNameByOffset()` / `GetOffsetByName()`: the actual queries
//!
//! ## Dependencies
//!
//! - **windows crate**: generated bindings for the DbgEng interfaces
//! - **windows-core**: `HRESULT` errors and the `#[implement]` macro for the
//!   output callbacks
//!
//! `dbgeng.dll` must be loaded from the executable's directory together with
//! `dbghelp.dll`, `symsrv.dll` and `dbgcore.dll`; see [`crate::staging`].
//!
//! ## References
//!
//! - [dbgeng.h](https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/dbgeng/)
//! - [IDebugClient::OpenDumpFile](https://learn.microsoft.com/en-us/windows-hardware/drivers/ddi/dbgeng/nf-dbgeng-idebugclient-opendumpfile)
//! - `sdk\samples\dumpstk` in the Debugging Tools for Windows

pub mod dbgeng;
pub mod error;
pub mod output;

pub use dbgeng::DbgEng;
