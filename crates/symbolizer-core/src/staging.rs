//! # Dependency Staging
//!
//! The debugging engine is a set of native libraries that have to be loadable
//! from the directory of the running executable. The copies shipped with the
//! operating system are old and lack symbol server support, so the libraries
//! from an installed debugger package are used instead.
//!
//! Before a session creates any engine capability, every library is looked up:
//!
//! 1. Next to the running executable: nothing to do
//! 2. In the installed debugger package for the build architecture: copied
//!    next to the executable
//! 3. Neither: initialization fails with `MissingDependency`
//!
//! ## References
//!
//! - [Using SymSrv: Installation](https://learn.microsoft.com/en-us/windows/win32/debug/using-symsrv)

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tracing::{debug, info};

use crate::error::{Result, SymbolizerError};
use crate::types::Architecture;

/// Libraries the DbgEng engine needs next to the executable.
pub const SUPPORT_LIBRARIES: [&str; 4] = ["dbghelp.dll", "symsrv.dll", "dbgeng.dll", "dbgcore.dll"];

/// Root of the debugger package installed by the Windows SDK.
pub const DEBUGGER_INSTALL_ROOT: &str = r"C:\Program Files (x86)\Windows Kits\10\Debuggers";

/// Per-architecture directory of the installed debugger package.
pub static DEFAULT_INSTALL_DIR: Lazy<PathBuf> =
    Lazy::new(|| Path::new(DEBUGGER_INSTALL_ROOT).join(Architecture::current().debugger_dir()));

/// Where the support libraries are expected and where they are staged from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyLayout
{
    /// Directory of the running executable; libraries must end up here.
    pub executable_dir: PathBuf,
    /// Directory of an installed debugger package to copy missing libraries from.
    pub install_dir: PathBuf,
}

/// Outcome of staging a single library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedLibrary
{
    /// The library was already next to the executable.
    AlreadyPresent(PathBuf),
    /// The library was copied from `from` to `to`.
    Copied
    {
        /// Source inside the installed debugger package
        from: PathBuf,
        /// Destination next to the executable
        to: PathBuf,
    },
}

impl StagedLibrary
{
    /// Path of the library next to the executable.
    pub fn path(&self) -> &Path
    {
        match self {
            StagedLibrary::AlreadyPresent(path) => path,
            StagedLibrary::Copied { to, .. } => to,
        }
    }
}

impl DependencyLayout
{
    /// Build a layout from explicit directories.
    pub fn new(executable_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>) -> Self
    {
        Self {
            executable_dir: executable_dir.into(),
            install_dir: install_dir.into(),
        }
    }

    /// Layout for the running executable and the default debugger install
    /// directory.
    ///
    /// ## Errors
    ///
    /// - `Io`: the path of the running executable cannot be determined
    pub fn for_current_exe() -> Result<Self>
    {
        let exe = std::env::current_exe()?;
        let executable_dir = exe
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| SymbolizerError::InvalidArgument(format!("{} has no parent directory", exe.display())))?;

        Ok(Self::new(executable_dir, DEFAULT_INSTALL_DIR.as_path()))
    }

    /// Make sure every library in `libraries` sits next to the executable.
    ///
    /// Libraries are processed in order; the first one that cannot be found
    /// aborts staging. Copies made for earlier libraries are left in place,
    /// they are valid on their own.
    ///
    /// ## Errors
    ///
    /// - `MissingDependency`: a library is in neither directory
    /// - `Io`: copying a library failed
    pub fn stage(&self, libraries: &[&str]) -> Result<Vec<StagedLibrary>>
    {
        libraries.iter().map(|library| self.stage_one(library)).collect()
    }

    fn stage_one(&self, library: &str) -> Result<StagedLibrary>
    {
        let local = self.executable_dir.join(library);
        if local.is_file() {
            debug!("Found {} next to the executable", library);
            return Ok(StagedLibrary::AlreadyPresent(local));
        }

        let installed = self.install_dir.join(library);
        if !installed.is_file() {
            return Err(SymbolizerError::MissingDependency {
                library: library.to_string(),
                searched: vec![local, installed],
            });
        }

        fs::copy(&installed, &local)?;
        info!("Copied {} into {}", installed.display(), self.executable_dir.display());

        Ok(StagedLibrary::Copied {
            from: installed,
            to: local,
        })
    }
}
