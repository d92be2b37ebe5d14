//! # Error Types
//!
//! Error handling for symbolization sessions.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineStatus;
use crate::session::SessionState;

/// Main error type for symbolization operations
///
/// Every failure is reported to the caller as a value; nothing in this crate
/// terminates the process or retries on its own. A caller that wants
/// retry-on-transient-failure has to loop at its own layer.
///
/// ## Error Categories
///
/// 1. **Initialization errors** (fatal to that `initialize` call):
///    MissingDependency, EngineUnavailable, SnapshotOpenFailed,
///    SnapshotParseFailed, EventWaitFailed
/// 2. **Query errors** (the session stays usable): ResolutionFailed,
///    NameTooLong
/// 3. **Usage errors**: NotReady, InvalidState, InvalidArgument
/// 4. **I/O errors**: Io (staging copies, locating the executable)
#[derive(Error, Debug)]
pub enum SymbolizerError
{
    /// A native support library of the engine could not be found
    ///
    /// The library is looked up next to the running executable first and
    /// then in the installed debugger package for the build architecture.
    /// `searched` lists every location that was tried.
    #[error("Missing engine support library {library} (searched: {})", display_paths(.searched))]
    MissingDependency
    {
        /// File name of the missing library
        library: String,
        /// Locations that were checked
        searched: Vec<PathBuf>,
    },

    /// The engine refused to hand out a capability
    ///
    /// Raised when the client capability cannot be created, or when the
    /// control or symbol-query capability cannot be derived from it.
    #[error("Debugging engine unavailable: {operation} failed with {status}")]
    EngineUnavailable
    {
        /// Engine operation that failed
        operation: &'static str,
        /// Status reported by the engine
        status: EngineStatus,
    },

    /// The snapshot file could not be opened for reading
    ///
    /// `source` carries the OS error; use [`SymbolizerError::os_error`] to get
    /// the raw code.
    #[error("Failed to open snapshot {}: {source}", .path.display())]
    SnapshotOpenFailed
    {
        /// Snapshot path as given by the caller
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The engine could not parse the file as a snapshot
    #[error("Failed to parse snapshot {}: {status}", .path.display())]
    SnapshotParseFailed
    {
        /// Snapshot path as given by the caller
        path: PathBuf,
        /// Status reported by the engine
        status: EngineStatus,
    },

    /// Waiting for the snapshot's last event failed
    ///
    /// Until this wait succeeds the snapshot's modules and threads are not
    /// queryable, so the session cannot become ready.
    #[error("Waiting for the snapshot event failed with {status}")]
    EventWaitFailed
    {
        /// Status reported by the engine
        status: EngineStatus,
    },

    /// A symbolization or symbol lookup failed
    ///
    /// Non-fatal: the session remains ready and nothing was cached.
    #[error("{operation}({target}) failed with {status}")]
    ResolutionFailed
    {
        /// Engine operation that failed
        operation: &'static str,
        /// The address or symbol name being resolved
        target: String,
        /// Status reported by the engine
        status: EngineStatus,
    },

    /// The engine returned a name longer than [`MAX_NAME_LEN`](crate::engine::MAX_NAME_LEN)
    ///
    /// Names are never truncated; the query fails instead and nothing is cached.
    #[error("{operation} returned a name of {length} bytes (maximum supported is {max})")]
    NameTooLong
    {
        /// Engine operation that produced the name
        operation: &'static str,
        /// Length of the returned name in bytes
        length: usize,
        /// Maximum supported length in bytes
        max: usize,
    },

    /// A query was issued while the session is not ready
    ///
    /// ## Solution
    ///
    /// Call `initialize()` and check that it succeeded before querying.
    #[error("Session is not ready (state: {state})")]
    NotReady
    {
        /// State the session was in
        state: SessionState,
    },

    /// `initialize()` was called on a session that already went through it
    #[error("Session cannot be initialized from state {state}")]
    InvalidState
    {
        /// State the session was in
        state: SessionState,
    },

    /// Invalid argument passed by the caller
    ///
    /// Examples:
    /// - Snapshot path that does not exist
    /// - Unparsable address in a trace file
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error (staging copies, locating the running executable, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SymbolizerError
{
    /// Whether this error can only come out of `initialize()`.
    #[must_use]
    pub fn is_initialization_error(&self) -> bool
    {
        matches!(
            self,
            SymbolizerError::MissingDependency { .. }
                | SymbolizerError::EngineUnavailable { .. }
                | SymbolizerError::SnapshotOpenFailed { .. }
                | SymbolizerError::SnapshotParseFailed { .. }
                | SymbolizerError::EventWaitFailed { .. }
        )
    }

    /// Engine status code attached to this error, if any.
    #[must_use]
    pub fn engine_status(&self) -> Option<EngineStatus>
    {
        match self {
            SymbolizerError::EngineUnavailable { status, .. }
            | SymbolizerError::SnapshotParseFailed { status, .. }
            | SymbolizerError::EventWaitFailed { status }
            | SymbolizerError::ResolutionFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// OS error code attached to this error, if any.
    #[must_use]
    pub fn os_error(&self) -> Option<i32>
    {
        match self {
            SymbolizerError::SnapshotOpenFailed { source, .. } | SymbolizerError::Io(source) => source.raw_os_error(),
            _ => None,
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String
{
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for `Result<T, SymbolizerError>`
///
/// ```rust
/// use symbolizer_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SymbolizerError>;
