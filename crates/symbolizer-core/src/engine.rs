//! # Engine Capabilities
//!
//! The interface between a [`Session`](crate::session::Session) and the
//! external debugging engine.
//!
//! The engine is an opaque, stateful, handle-based subsystem. It is reached
//! through three nested capabilities, each derived from the previous one:
//!
//! ```text
//! DebugEngine ──create_client()──▶ ClientCapability ──control()──▶ ControlCapability
//!                                                  └──symbols()──▶ SymbolCapability
//! ```
//!
//! Every capability object owns its engine handle. Dropping it releases the
//! handle; dropping a [`ClientCapability`] additionally ends the debugging
//! session with an active detach. The session keeps them in
//! [`EngineHandles`](crate::handles::EngineHandles), which fixes the release
//! order.
//!
//! ## Backends
//!
//! - [`crate::platform`]: `dbgeng.dll` on Windows, returned by [`create_engine`]
//! - Any other implementation can be handed to
//!   [`Session::new`](crate::session::Session::new) directly
//!
//! None of these capabilities are thread-safe. The engine is a single-owner,
//! one-call-at-a-time resource, so none of the traits require `Send` or
//! `Sync`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::snapshot::SnapshotFile;
use crate::staging::SUPPORT_LIBRARIES;
use crate::types::Address;

/// Longest module or symbol name the resolver accepts, in bytes.
///
/// Longer names are rejected with
/// [`SymbolizerError::NameTooLong`](crate::error::SymbolizerError::NameTooLong)
/// rather than truncated.
pub const MAX_NAME_LEN: usize = 1024;

/// Status code reported by the engine when an operation fails
///
/// The engine speaks `HRESULT`s. The value is kept as-is so it can be
/// logged and looked up; the `Display` form matches what the engine's own
/// tooling prints (`hr=0x80004005`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineStatus(pub i32);

impl EngineStatus
{
    /// Unspecified failure (`E_FAIL`).
    pub const FAIL: Self = EngineStatus(0x8000_4005_u32 as i32);
    /// The requested interface is not supported (`E_NOINTERFACE`).
    pub const NO_INTERFACE: Self = EngineStatus(0x8000_4002_u32 as i32);
    /// The engine returned data that contradicts itself (`E_UNEXPECTED`).
    pub const UNEXPECTED: Self = EngineStatus(0x8000_FFFF_u32 as i32);
    /// The operation is not implemented on this platform (`E_NOTIMPL`).
    pub const NOT_IMPLEMENTED: Self = EngineStatus(0x8000_4001_u32 as i32);
    /// An argument was rejected before reaching the engine (`E_INVALIDARG`).
    pub const INVALID_ARG: Self = EngineStatus(0x8007_0057_u32 as i32);

    /// Raw status code.
    pub const fn code(self) -> i32
    {
        self.0
    }

    /// Status code reinterpreted as the unsigned `HRESULT` bit pattern.
    #[allow(clippy::cast_sign_loss)]
    pub const fn hresult(self) -> u32
    {
        self.0 as u32
    }
}

impl fmt::Display for EngineStatus
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "hr=0x{:08x}", self.hresult())
    }
}

/// Result of a single engine call.
pub type EngineResult<T> = std::result::Result<T, EngineStatus>;

/// A loaded module found by [`SymbolCapability::module_by_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleLocation
{
    /// Engine-side index of the module.
    pub index: u32,
    /// Address the module is loaded at.
    pub base: Address,
}

/// The best symbol at or before an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolHit
{
    /// Symbol name as reported by the engine (`module!function`).
    pub name: String,
    /// Distance from the symbol start to the queried address.
    pub displacement: u64,
}

/// Provider of engine client capabilities
///
/// This is the entry point into an engine backend. Implementations are
/// cheap to construct; nothing is loaded until [`create_client`] is called.
///
/// [`create_client`]: DebugEngine::create_client
pub trait DebugEngine
{
    /// Short name for diagnostics (`"dbgeng"`).
    fn name(&self) -> &str;

    /// Native support libraries that must sit next to the executable
    /// before a client can be created.
    fn support_libraries(&self) -> &[&str]
    {
        &SUPPORT_LIBRARIES
    }

    /// Acquire the top-level client capability.
    fn create_client(&self) -> EngineResult<Box<dyn ClientCapability>>;
}

/// Top-level client capability
///
/// Dropping the client ends the debugging session (active detach) and
/// releases the underlying handle.
pub trait ClientCapability
{
    /// Derive the control capability.
    fn control(&self) -> EngineResult<Box<dyn ControlCapability>>;

    /// Derive the symbol-query capability.
    fn symbols(&self) -> EngineResult<Box<dyn SymbolCapability>>;

    /// Forward engine output text to `sink`.
    fn set_output(&self, sink: Arc<dyn DiagnosticSink>) -> EngineResult<()>;

    /// Hand an opened snapshot file to the engine for parsing.
    ///
    /// The engine reads the data through the handle in `snapshot`; its path
    /// is only used for naming.
    fn open_snapshot(&self, snapshot: &SnapshotFile) -> EngineResult<()>;
}

/// Execution control capability.
pub trait ControlCapability
{
    /// Block until the engine has materialized the snapshot's last
    /// recorded event. There is no timeout.
    fn wait_for_event(&self) -> EngineResult<()>;
}

/// Symbol-query capability
///
/// All queries run against the snapshot the client opened. They are only
/// meaningful after [`ControlCapability::wait_for_event`] succeeded.
pub trait SymbolCapability
{
    /// Replace the engine's symbol search path.
    fn set_symbol_path(&self, path: &Path) -> EngineResult<()>;

    /// Make the symbol handler report its internal decisions (symbol file
    /// lookups, server downloads) through the output callbacks.
    fn enable_symbol_diagnostics(&self) -> EngineResult<()>;

    /// Find the loaded module containing `address`.
    fn module_by_offset(&self, address: Address) -> EngineResult<ModuleLocation>;

    /// Display name of a module found by [`module_by_offset`].
    ///
    /// [`module_by_offset`]: SymbolCapability::module_by_offset
    fn module_name(&self, module: &ModuleLocation) -> EngineResult<String>;

    /// Best symbol at or before `address`.
    fn name_by_offset(&self, address: Address) -> EngineResult<SymbolHit>;

    /// Address of a symbol given in `module!symbol` notation.
    fn offset_by_name(&self, name: &str) -> EngineResult<Address>;
}

/// Create the debugging engine for the current platform
///
/// ## Example
///
/// ```rust,no_run
/// use symbolizer_core::engine::create_engine;
/// use symbolizer_core::Session;
///
/// let mut session = Session::new(create_engine()?);
/// session.initialize("crash.dmp", None)?;
/// # Ok::<(), symbolizer_core::SymbolizerError>(())
/// ```
///
/// ## Platform Support
///
/// - Windows: returns [`DbgEng`](crate::platform::windows::DbgEng)
/// - Everything else: `EngineUnavailable`, there is no engine to load
///
/// ## Errors
///
/// `EngineUnavailable` when the platform has no engine backend.
pub fn create_engine() -> Result<Box<dyn DebugEngine>>
{
    #[cfg(windows)]
    {
        Ok(Box::new(crate::platform::windows::DbgEng::new()))
    }

    #[cfg(not(windows))]
    {
        Err(crate::error::SymbolizerError::EngineUnavailable {
            operation: "create_engine",
            status: EngineStatus::NOT_IMPLEMENTED,
        })
    }
}
