//! # DbgEng Capabilities
//!
//! Capability objects wrapping the DbgEng COM interfaces.
//!
//! | capability                     | interface        |
//! |--------------------------------|------------------|
//! | [`ClientCapability`]           | `IDebugClient5`  |
//! | [`ControlCapability`]          | `IDebugControl3` |
//! | [`SymbolCapability`]           | `IDebugSymbols3` |
//!
//! COM references are released by the `windows` crate when the interface
//! values drop. The client additionally ends its session first.

use std::ffi::CString;
use std::iter;
use std::os::windows::ffi::OsStrExt;
use std::os::windows::io::AsRawHandle;
use std::path::Path;
use std::sync::Arc;

use ::windows::Win32::System::Diagnostics::Debug::Extensions::{
    DebugCreate, IDebugClient5, IDebugControl3, IDebugSymbols3, DEBUG_END_ACTIVE_DETACH,
    DEBUG_MODNAME_MODULE, DEBUG_WAIT_DEFAULT,
};
use ::windows::Win32::System::Threading::INFINITE;
use tracing::{debug, warn};
use windows_core::{Interface, PCSTR, PCWSTR};

use super::output::OutputForwarder;
use crate::diagnostics::DiagnosticSink;
use crate::engine::{
    ClientCapability, ControlCapability, DebugEngine, EngineResult, EngineStatus, ModuleLocation, SymbolCapability,
    SymbolHit,
};
use crate::snapshot::SnapshotFile;
use crate::types::Address;

/// `SYMOPT_DEBUG`: the symbol handler narrates its lookups through the
/// output callbacks.
const SYMOPT_DEBUG: u32 = 0x8000_0000;

/// The DbgEng engine
///
/// Loading `dbgeng.dll` happens on the first [`DebugEngine::create_client`]
/// call, after the session has staged the support libraries next to the
/// executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbgEng;

impl DbgEng
{
    /// Create the engine provider. Nothing is loaded yet.
    pub fn new() -> Self
    {
        DbgEng
    }
}

impl DebugEngine for DbgEng
{
    fn name(&self) -> &str
    {
        "dbgeng"
    }

    fn create_client(&self) -> EngineResult<Box<dyn ClientCapability>>
    {
        debug!("Initializing the debugger instance");
        let client = unsafe { DebugCreate::<IDebugClient5>() }.map_err(EngineStatus::from)?;
        Ok(Box::new(DbgEngClient { client }))
    }
}

/// `IDebugClient5` wrapper; ends the session on drop.
pub struct DbgEngClient
{
    client: IDebugClient5,
}

impl ClientCapability for DbgEngClient
{
    fn control(&self) -> EngineResult<Box<dyn ControlCapability>>
    {
        let control = self.client.cast::<IDebugControl3>().map_err(EngineStatus::from)?;
        Ok(Box::new(DbgEngControl { control }))
    }

    fn symbols(&self) -> EngineResult<Box<dyn SymbolCapability>>
    {
        let symbols = self.client.cast::<IDebugSymbols3>().map_err(EngineStatus::from)?;
        Ok(Box::new(DbgEngSymbols { symbols }))
    }

    fn set_output(&self, sink: Arc<dyn DiagnosticSink>) -> EngineResult<()>
    {
        // The engine keeps its own reference to the callbacks object.
        let callbacks = OutputForwarder::into_callbacks(sink);
        unsafe { self.client.SetOutputCallbacks(&callbacks) }.map_err(EngineStatus::from)
    }

    fn open_snapshot(&self, snapshot: &SnapshotFile) -> EngineResult<()>
    {
        let path = to_wide(snapshot.path());
        let handle = snapshot.file().as_raw_handle() as usize as u64;
        unsafe { self.client.OpenDumpFileWide(PCWSTR(path.as_ptr()), handle) }.map_err(EngineStatus::from)
    }
}

impl Drop for DbgEngClient
{
    fn drop(&mut self)
    {
        // Best effort detach - the reference is released right after regardless
        if let Err(err) = unsafe { self.client.EndSession(DEBUG_END_ACTIVE_DETACH) } {
            warn!("EndSession failed with {}", EngineStatus::from(err));
        }
    }
}

/// `IDebugControl3` wrapper.
pub struct DbgEngControl
{
    control: IDebugControl3,
}

impl ControlCapability for DbgEngControl
{
    fn wait_for_event(&self) -> EngineResult<()>
    {
        unsafe { self.control.WaitForEvent(DEBUG_WAIT_DEFAULT, INFINITE) }.map_err(EngineStatus::from)
    }
}

/// `IDebugSymbols3` wrapper.
pub struct DbgEngSymbols
{
    symbols: IDebugSymbols3,
}

impl SymbolCapability for DbgEngSymbols
{
    fn set_symbol_path(&self, path: &Path) -> EngineResult<()>
    {
        let path = to_wide(path);
        unsafe { self.symbols.SetSymbolPathWide(PCWSTR(path.as_ptr())) }.map_err(EngineStatus::from)
    }

    fn enable_symbol_diagnostics(&self) -> EngineResult<()>
    {
        unsafe { self.symbols.AddSymbolOptions(SYMOPT_DEBUG) }.map_err(EngineStatus::from)
    }

    fn module_by_offset(&self, address: Address) -> EngineResult<ModuleLocation>
    {
        let mut index = 0u32;
        let mut base = 0u64;
        unsafe {
            self.symbols
                .GetModuleByOffset(address.value(), 0, Some(&raw mut index), Some(&raw mut base))
        }
        .map_err(EngineStatus::from)?;

        Ok(ModuleLocation {
            index,
            base: Address::from(base),
        })
    }

    fn module_name(&self, module: &ModuleLocation) -> EngineResult<String>
    {
        let base = module.base.value();

        // Size query first so the name is never truncated by a fixed buffer.
        let mut size = 0u32;
        unsafe {
            self.symbols
                .GetModuleNameString(DEBUG_MODNAME_MODULE, module.index, base, None, Some(&raw mut size))
        }
        .map_err(EngineStatus::from)?;

        let mut buffer = vec![0u8; size.max(1) as usize];
        unsafe {
            self.symbols.GetModuleNameString(
                DEBUG_MODNAME_MODULE,
                module.index,
                base,
                Some(buffer.as_mut_slice()),
                Some(&raw mut size),
            )
        }
        .map_err(EngineStatus::from)?;

        Ok(from_c_buffer(&buffer))
    }

    fn name_by_offset(&self, address: Address) -> EngineResult<SymbolHit>
    {
        let mut size = 0u32;
        unsafe { self.symbols.GetNameByOffset(address.value(), None, Some(&raw mut size), None) }
            .map_err(EngineStatus::from)?;

        let mut buffer = vec![0u8; size.max(1) as usize];
        let mut displacement = 0u64;
        unsafe {
            self.symbols.GetNameByOffset(
                address.value(),
                Some(buffer.as_mut_slice()),
                Some(&raw mut size),
                Some(&raw mut displacement),
            )
        }
        .map_err(EngineStatus::from)?;

        Ok(SymbolHit {
            name: from_c_buffer(&buffer),
            displacement,
        })
    }

    fn offset_by_name(&self, name: &str) -> EngineResult<Address>
    {
        let name = CString::new(name).map_err(|_| EngineStatus::INVALID_ARG)?;
        let offset = unsafe { self.symbols.GetOffsetByName(PCSTR(name.as_ptr().cast())) }.map_err(EngineStatus::from)?;
        Ok(Address::from(offset))
    }
}

fn to_wide(path: &Path) -> Vec<u16>
{
    path.as_os_str().encode_wide().chain(iter::once(0)).collect()
}

fn from_c_buffer(buffer: &[u8]) -> String
{
    let len = buffer.iter().position(|b| *b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..len]).into_owned()
}
