//! # Symbolization Session
//!
//! One debugging-engine session against one snapshot, plus its cache.
//!
//! ## Lifecycle
//!
//! 1. Create: `Session::new(engine)` (nothing is loaded yet)
//! 2. Initialize: `initialize(snapshot, symbol_path)`, exactly once
//! 3. Query: `symbolize()` / `resolve()` any number of times, in any order
//! 4. Drop: every engine handle and the snapshot file are released
//!
//! ```text
//!                 initialize() ok
//! Uninitialized ──────────────────▶ Ready
//!       │
//!       │ initialize() failed
//!       ▼
//!    Failed
//! ```
//!
//! Queries are only legal in `Ready`. In any other state they fail with
//! `NotReady` before the engine is touched.
//!
//! ## Thread Safety
//!
//! A session is **not** thread-safe and is neither `Send` nor `Sync`. Hosts
//! that symbolize from several threads either serialize access to one session
//! or open one session per thread; caches are never shared.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::{CacheStats, SymbolCache};
use crate::diagnostics::DiagnosticSink;
use crate::engine::{DebugEngine, EngineStatus};
use crate::error::{Result, SymbolizerError};
use crate::handles::EngineHandles;
use crate::resolver;
use crate::snapshot::SnapshotFile;
use crate::staging::{DependencyLayout, StagedLibrary};
use crate::types::{Address, TraceStyle};

/// Initialization state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState
{
    /// `initialize()` has not been called yet.
    Uninitialized,
    /// The snapshot is loaded and queries are legal.
    Ready,
    /// `initialize()` failed; the session cannot be used.
    Failed,
}

impl fmt::Display for SessionState
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        write!(f, "{label}")
    }
}

/// Construction-time configuration of a [`Session`].
#[derive(Clone, Default)]
pub struct SessionOptions
{
    /// Where the engine support libraries are checked and staged from.
    /// `None` uses the running executable's directory and the default
    /// debugger install directory.
    pub layout: Option<DependencyLayout>,
    /// Receiver for engine output. When set, the symbol handler's own
    /// diagnostics are enabled as well.
    pub diagnostics: Option<Arc<dyn DiagnosticSink>>,
    /// Style used by [`Session::symbolize_default`].
    pub default_style: TraceStyle,
}

impl fmt::Debug for SessionOptions
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("SessionOptions")
            .field("layout", &self.layout)
            .field("diagnostics", &self.diagnostics.is_some())
            .field("default_style", &self.default_style)
            .finish()
    }
}

impl SessionOptions
{
    /// Use an explicit dependency layout.
    #[must_use]
    pub fn with_layout(mut self, layout: DependencyLayout) -> Self
    {
        self.layout = Some(layout);
        self
    }

    /// Forward engine output to `sink`.
    #[must_use]
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self
    {
        self.diagnostics = Some(sink);
        self
    }

    /// Style used when the caller does not pick one.
    #[must_use]
    pub fn with_default_style(mut self, style: TraceStyle) -> Self
    {
        self.default_style = style;
        self
    }
}

/// A symbolization session against one snapshot
///
/// ## Example
///
/// ```rust,no_run
/// use symbolizer_core::engine::create_engine;
/// use symbolizer_core::types::{Address, TraceStyle};
/// use symbolizer_core::Session;
///
/// let mut session = Session::new(create_engine()?);
/// session.initialize("crash.dmp", None)?;
///
/// let symbol = session.symbolize(Address::from(0x7ff8_0000_1234), TraceStyle::Modoff)?;
/// println!("{symbol}");
///
/// let address = session.resolve("ntdll!NtClose")?;
/// println!("{address}");
/// # Ok::<(), symbolizer_core::SymbolizerError>(())
/// ```
pub struct Session
{
    /// Engine handles; `Some` only while `Ready`. Declared first so they are
    /// released before anything else the session owns.
    handles: Option<EngineHandles>,
    engine: Box<dyn DebugEngine>,
    options: SessionOptions,
    state: SessionState,
    cache: SymbolCache,
    snapshot_path: Option<PathBuf>,
    symbol_path: Option<PathBuf>,
    staged: Vec<StagedLibrary>,
}

impl fmt::Debug for Session
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("Session")
            .field("engine", &self.engine.name())
            .field("state", &self.state)
            .field("snapshot_path", &self.snapshot_path)
            .field("symbol_path", &self.symbol_path)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl Session
{
    /// Create an uninitialized session with default options.
    pub fn new(engine: Box<dyn DebugEngine>) -> Self
    {
        Self::with_options(engine, SessionOptions::default())
    }

    /// Create an uninitialized session.
    pub fn with_options(engine: Box<dyn DebugEngine>, options: SessionOptions) -> Self
    {
        Self {
            handles: None,
            engine,
            options,
            state: SessionState::Uninitialized,
            cache: SymbolCache::new(),
            snapshot_path: None,
            symbol_path: None,
            staged: Vec::new(),
        }
    }

    /// Check the paths, then create and initialize a session in one go.
    ///
    /// ## Errors
    ///
    /// - `InvalidArgument`: the snapshot or symbol path does not exist
    /// - Any error of [`Session::initialize`]
    pub fn open(
        engine: Box<dyn DebugEngine>,
        snapshot_path: impl AsRef<Path>,
        symbol_path: Option<&Path>,
        options: SessionOptions,
    ) -> Result<Self>
    {
        let snapshot_path = snapshot_path.as_ref();
        if !snapshot_path.exists() {
            return Err(SymbolizerError::InvalidArgument(format!(
                "snapshot {} does not exist",
                snapshot_path.display()
            )));
        }
        if let Some(path) = symbol_path {
            if !path.exists() {
                return Err(SymbolizerError::InvalidArgument(format!(
                    "symbol path {} does not exist",
                    path.display()
                )));
            }
        }

        let mut session = Self::with_options(engine, options);
        session.initialize(snapshot_path, symbol_path)?;
        Ok(session)
    }

    /// Load `snapshot_path` into the engine and make the session queryable.
    ///
    /// Steps, each a hard gate:
    ///
    /// 1. Stage the engine support libraries next to the executable
    /// 2. Create the client capability
    /// 3. Derive the control and symbol-query capabilities
    /// 4. Apply `symbol_path`, if given (a failure is only a warning)
    /// 5. Open the snapshot file
    /// 6. Have the engine parse it
    /// 7. Wait for the snapshot's last event
    ///
    /// A failing step releases everything acquired before it and leaves the
    /// session `Failed`.
    ///
    /// ## Errors
    ///
    /// - `InvalidState`: the session is not `Uninitialized`
    /// - `MissingDependency`: step 1
    /// - `EngineUnavailable`: steps 2 and 3
    /// - `SnapshotOpenFailed`: step 5
    /// - `SnapshotParseFailed`: step 6
    /// - `EventWaitFailed`: step 7
    /// - `Io`: the executable's directory cannot be determined or a copy failed
    pub fn initialize(&mut self, snapshot_path: impl AsRef<Path>, symbol_path: Option<&Path>) -> Result<()>
    {
        if self.state != SessionState::Uninitialized {
            return Err(SymbolizerError::InvalidState { state: self.state });
        }

        let snapshot_path = snapshot_path.as_ref();
        info!("Initializing {} session for {}", self.engine.name(), snapshot_path.display());

        match self.acquire(snapshot_path, symbol_path) {
            Ok(handles) => {
                self.handles = Some(handles);
                self.state = SessionState::Ready;
                self.snapshot_path = Some(snapshot_path.to_path_buf());
                self.symbol_path = symbol_path.map(Path::to_path_buf);
                info!("Snapshot {} is ready", snapshot_path.display());
                Ok(())
            }
            Err(err) => {
                self.state = SessionState::Failed;
                error!("Failed to initialize session for {}: {err}", snapshot_path.display());
                Err(err)
            }
        }
    }

    fn acquire(&mut self, snapshot_path: &Path, symbol_path: Option<&Path>) -> Result<EngineHandles>
    {
        let layout = match &self.options.layout {
            Some(layout) => layout.clone(),
            None => DependencyLayout::for_current_exe()?,
        };
        debug!("Staging engine support libraries into {}", layout.executable_dir.display());
        self.staged = layout.stage(self.engine.support_libraries())?;

        debug!("Creating the debugging client");
        let client = self
            .engine
            .create_client()
            .map_err(|status| engine_unavailable("DebugCreate", status))?;
        let control = client
            .control()
            .map_err(|status| engine_unavailable("QueryInterface(control)", status))?;
        let symbols = client
            .symbols()
            .map_err(|status| engine_unavailable("QueryInterface(symbols)", status))?;
        let mut handles = EngineHandles::new(client, control, symbols);

        if let Some(path) = symbol_path {
            if let Err(status) = handles.symbols().set_symbol_path(path) {
                warn!("SetSymbolPath({}) failed with {status}, using the default search path", path.display());
            }
        }

        if let Some(sink) = &self.options.diagnostics {
            if let Err(status) = handles.symbols().enable_symbol_diagnostics() {
                warn!("Enabling symbol diagnostics failed with {status}");
            }
            if let Err(status) = handles.client().set_output(Arc::clone(sink)) {
                warn!("Installing engine output callbacks failed with {status}");
            }
        }

        debug!("Opening the snapshot file");
        let snapshot = SnapshotFile::open(snapshot_path)?;

        debug!("Parsing the snapshot file");
        handles
            .load_snapshot(snapshot)
            .map_err(|status| SymbolizerError::SnapshotParseFailed {
                path: snapshot_path.to_path_buf(),
                status,
            })?;

        // The engine only attaches to the snapshot once the last event recorded
        // in it has been delivered; modules and threads are not queryable before.
        debug!("Waiting for the snapshot event");
        handles
            .control()
            .wait_for_event()
            .map_err(|status| SymbolizerError::EventWaitFailed { status })?;

        Ok(handles)
    }

    fn ready_handles(&self) -> Result<&EngineHandles>
    {
        match (self.state, &self.handles) {
            (SessionState::Ready, Some(handles)) => Ok(handles),
            (state, _) => Err(SymbolizerError::NotReady { state }),
        }
    }

    /// Symbolize `address` in `style`.
    ///
    /// An address that was symbolized before is answered from the cache
    /// without touching the engine, whatever `style` is asked for this time.
    /// The returned string is the cached entry itself.
    ///
    /// ## Errors
    ///
    /// - `NotReady`: the session is not initialized
    /// - `ResolutionFailed`, `NameTooLong`: the engine could not symbolize the
    ///   address; nothing is cached and the session stays usable
    pub fn symbolize(&mut self, address: Address, style: TraceStyle) -> Result<&str>
    {
        let symbols = match (self.state, &self.handles) {
            (SessionState::Ready, Some(handles)) => handles.symbols(),
            (state, _) => return Err(SymbolizerError::NotReady { state }),
        };

        self.cache
            .get_or_try_insert_with(address, || resolver::symbolize(symbols, address, style))
    }

    /// Symbolize `address` in the session's default style.
    ///
    /// ## Errors
    ///
    /// Same as [`Session::symbolize`].
    pub fn symbolize_default(&mut self, address: Address) -> Result<&str>
    {
        let style = self.options.default_style;
        self.symbolize(address, style)
    }

    /// Resolve a `module!symbol` name to an address. Never cached.
    ///
    /// ## Errors
    ///
    /// - `NotReady`: the session is not initialized
    /// - `InvalidArgument`: the name is empty
    /// - `ResolutionFailed`: the engine does not know the symbol
    pub fn resolve(&self, name: &str) -> Result<Address>
    {
        let handles = self.ready_handles()?;
        resolver::resolve_name(handles.symbols(), name)
    }

    /// Current initialization state.
    pub fn state(&self) -> SessionState
    {
        self.state
    }

    /// Whether queries are legal.
    pub fn is_ready(&self) -> bool
    {
        self.state == SessionState::Ready
    }

    /// Snapshot the session was initialized with.
    pub fn snapshot_path(&self) -> Option<&Path>
    {
        self.snapshot_path.as_deref()
    }

    /// Symbol path the session was initialized with.
    pub fn symbol_path(&self) -> Option<&Path>
    {
        self.symbol_path.as_deref()
    }

    /// Support libraries found or staged during initialization.
    pub fn staged_libraries(&self) -> &[StagedLibrary]
    {
        &self.staged
    }

    /// Style used by [`Session::symbolize_default`].
    pub fn default_style(&self) -> TraceStyle
    {
        self.options.default_style
    }

    /// Change the style used by [`Session::symbolize_default`].
    ///
    /// Already cached addresses keep their string.
    pub fn set_default_style(&mut self, style: TraceStyle)
    {
        self.options.default_style = style;
    }

    /// Cached string for `address`, if it was symbolized before.
    pub fn cached(&self, address: Address) -> Option<&str>
    {
        self.cache.get(address)
    }

    /// Cache counters.
    pub fn cache_stats(&self) -> CacheStats
    {
        self.cache.stats()
    }

    /// Release the engine and the snapshot now instead of at drop.
    pub fn close(self)
    {
        let stats = self.cache.stats();
        debug!(
            hits = stats.hits,
            misses = stats.misses,
            failures = stats.failures,
            entries = stats.entries,
            "Closing {} session",
            self.engine.name()
        );
    }
}

fn engine_unavailable(operation: &'static str, status: EngineStatus) -> SymbolizerError
{
    error!("{operation} failed with {status}");
    SymbolizerError::EngineUnavailable { operation, status }
}
