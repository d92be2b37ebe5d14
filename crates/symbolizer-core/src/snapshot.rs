//! Snapshot file handle owned by a session.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SymbolizerError};

/// `FILE_SHARE_READ`: other openers may read, nobody may write or delete.
#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;

/// An opened crash dump or trace snapshot
///
/// The engine parses the snapshot through this handle, so it has to stay open
/// for as long as the engine session lives. The session releases it last,
/// after the client capability has detached.
#[derive(Debug)]
pub struct SnapshotFile
{
    path: PathBuf,
    file: File,
}

impl SnapshotFile
{
    /// Open `path` for reading.
    ///
    /// On Windows the file is opened with read sharing only, so the snapshot
    /// cannot change underneath the engine.
    ///
    /// ## Errors
    ///
    /// - `SnapshotOpenFailed`: the file cannot be opened; carries the OS error
    pub fn open(path: impl AsRef<Path>) -> Result<Self>
    {
        let path = path.as_ref();

        let mut options = OpenOptions::new();
        options.read(true);
        #[cfg(windows)]
        {
            use std::os::windows::fs::OpenOptionsExt;
            options.share_mode(FILE_SHARE_READ);
        }

        let file = options.open(path).map_err(|source| SymbolizerError::SnapshotOpenFailed {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Path the snapshot was opened from.
    pub fn path(&self) -> &Path
    {
        &self.path
    }

    /// The underlying OS file.
    pub fn file(&self) -> &File
    {
        &self.file
    }
}

impl Drop for SnapshotFile
{
    fn drop(&mut self)
    {
        debug!(path = %self.path.display(), "Closing snapshot");
    }
}
