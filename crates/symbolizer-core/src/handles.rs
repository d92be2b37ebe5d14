//! # Owned Engine Handles
//!
//! RAII ownership of everything a session acquires from the engine.
//!
//! The three capabilities are bundled as soon as the last of them has been
//! derived, and the snapshot file joins the bundle the moment it is opened.
//! From then on the bundle is the only owner: if a later initialization step
//! fails, dropping it releases exactly what was acquired so far, and a ready
//! session releases it once when it goes away. There are no paired
//! acquire/release calls anywhere.
//!
//! Before the bundle exists (while the capabilities are being derived), the
//! already acquired capabilities are plain locals and are dropped by the
//! early return, newest first.
//!
//! ## Release order
//!
//! Fields are dropped in declaration order:
//!
//! 1. symbol-query capability
//! 2. control capability
//! 3. client capability (ends the session with an active detach)
//! 4. snapshot file

use tracing::trace;

use crate::engine::{ClientCapability, ControlCapability, EngineResult, SymbolCapability};
use crate::snapshot::SnapshotFile;

/// The capability handles and snapshot file owned by one session.
///
/// Field order is the release order. Do not reorder.
pub struct EngineHandles
{
    symbols: Box<dyn SymbolCapability>,
    control: Box<dyn ControlCapability>,
    client: Box<dyn ClientCapability>,
    snapshot: Option<SnapshotFile>,
}

impl EngineHandles
{
    /// Bundle the three capabilities derived from one client.
    pub fn new(
        client: Box<dyn ClientCapability>,
        control: Box<dyn ControlCapability>,
        symbols: Box<dyn SymbolCapability>,
    ) -> Self
    {
        Self {
            symbols,
            control,
            client,
            snapshot: None,
        }
    }

    /// Take ownership of `snapshot` and hand it to the engine for parsing.
    ///
    /// The file is owned by the bundle before the engine sees it, so it is
    /// closed after the client detaches even when parsing fails.
    pub fn load_snapshot(&mut self, snapshot: SnapshotFile) -> EngineResult<()>
    {
        let snapshot = self.snapshot.insert(snapshot);
        self.client.open_snapshot(snapshot)
    }

    /// The client capability.
    pub fn client(&self) -> &dyn ClientCapability
    {
        self.client.as_ref()
    }

    /// The control capability.
    pub fn control(&self) -> &dyn ControlCapability
    {
        self.control.as_ref()
    }

    /// The symbol-query capability.
    pub fn symbols(&self) -> &dyn SymbolCapability
    {
        self.symbols.as_ref()
    }
}

impl Drop for EngineHandles
{
    fn drop(&mut self)
    {
        // Fields are released right after this, in declaration order.
        match &self.snapshot {
            Some(snapshot) => trace!("Releasing engine handles for {}", snapshot.path().display()),
            None => trace!("Releasing engine handles"),
        }
    }
}
