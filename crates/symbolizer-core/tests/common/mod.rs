//! Scripted debugging engine shared by the integration tests
//!
//! `MockEngine` answers symbol queries from a small in-memory module and
//! symbol table, records every call it receives and every capability it
//! releases, and can be told to fail at any initialization step.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use symbolizer_core::diagnostics::DiagnosticSink;
use symbolizer_core::engine::{
    ClientCapability, ControlCapability, DebugEngine, EngineResult, EngineStatus, ModuleLocation, SymbolCapability,
    SymbolHit,
};
use symbolizer_core::snapshot::SnapshotFile;
use symbolizer_core::staging::{DependencyLayout, SUPPORT_LIBRARIES};
use symbolizer_core::types::Address;
use symbolizer_core::{Session, SessionOptions};
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const KERNEL32_BASE: u64 = 0x7ff8_1000_0000;
pub const NTDLL_BASE: u64 = 0x7ff8_2000_0000;
pub const CREATE_FILE_W: u64 = KERNEL32_BASE + 0x1000;
pub const NT_CLOSE: u64 = NTDLL_BASE + 0x5000;

/// A module loaded in the scripted snapshot.
#[derive(Debug, Clone)]
pub struct MockModule
{
    pub name: String,
    pub base: u64,
    pub size: u64,
}

/// A symbol known to the scripted engine.
#[derive(Debug, Clone)]
pub struct MockSymbol
{
    pub name: String,
    pub address: u64,
    pub size: u64,
}

/// What the engine knows and where it fails.
#[derive(Debug, Clone, Default)]
pub struct Script
{
    pub modules: Vec<MockModule>,
    pub symbols: Vec<MockSymbol>,
    pub fail_create: Option<EngineStatus>,
    pub fail_control: Option<EngineStatus>,
    pub fail_symbols: Option<EngineStatus>,
    pub fail_symbol_path: Option<EngineStatus>,
    pub fail_open: Option<EngineStatus>,
    pub fail_wait: Option<EngineStatus>,
    /// Text written to the output sink once it is installed.
    pub output: Vec<String>,
    /// While set, every address query fails with `E_FAIL`.
    pub offline: Rc<Cell<bool>>,
}

impl Script
{
    /// kernel32 and ntdll with one exported function each.
    pub fn sample() -> Self
    {
        Self {
            modules: vec![
                MockModule {
                    name: "kernel32".to_string(),
                    base: KERNEL32_BASE,
                    size: 0x10_0000,
                },
                MockModule {
                    name: "ntdll".to_string(),
                    base: NTDLL_BASE,
                    size: 0x20_0000,
                },
            ],
            symbols: vec![
                MockSymbol {
                    name: "kernel32!CreateFileW".to_string(),
                    address: CREATE_FILE_W,
                    size: 0x200,
                },
                MockSymbol {
                    name: "ntdll!NtClose".to_string(),
                    address: NT_CLOSE,
                    size: 0x40,
                },
            ],
            ..Self::default()
        }
    }

    pub fn with_module(mut self, name: &str, base: u64, size: u64) -> Self
    {
        self.modules.push(MockModule {
            name: name.to_string(),
            base,
            size,
        });
        self
    }

    pub fn with_symbol(mut self, name: &str, address: u64, size: u64) -> Self
    {
        self.symbols.push(MockSymbol {
            name: name.to_string(),
            address,
            size,
        });
        self
    }
}

/// Everything the engine observed.
#[derive(Debug, Default)]
pub struct Recorder
{
    /// Engine calls in order, e.g. `"module_by_offset"`.
    pub calls: Vec<String>,
    /// Released capabilities in order: `"symbols"`, `"control"`, `"client"`.
    pub released: Vec<&'static str>,
    /// Symbol path handed to the engine, if any.
    pub symbol_path: Option<PathBuf>,
    /// Snapshot handed to the engine, if any.
    pub snapshot: Option<PathBuf>,
}

impl Recorder
{
    pub fn count(&self, call: &str) -> usize
    {
        self.calls.iter().filter(|c| c.as_str() == call).count()
    }

    /// Engine calls made after initialization, i.e. queries.
    pub fn queries(&self) -> usize
    {
        self.calls
            .iter()
            .filter(|c| {
                matches!(
                    c.as_str(),
                    "module_by_offset" | "module_name" | "name_by_offset" | "offset_by_name"
                )
            })
            .count()
    }
}

pub type Shared = Rc<RefCell<Recorder>>;

/// Scripted [`DebugEngine`].
pub struct MockEngine
{
    script: Rc<Script>,
    recorder: Shared,
}

impl MockEngine
{
    pub fn new(script: Script) -> (Box<dyn DebugEngine>, Shared)
    {
        let recorder = Shared::default();
        let engine = MockEngine {
            script: Rc::new(script),
            recorder: Rc::clone(&recorder),
        };
        (Box::new(engine), recorder)
    }
}

impl DebugEngine for MockEngine
{
    fn name(&self) -> &str
    {
        "mock"
    }

    fn create_client(&self) -> EngineResult<Box<dyn ClientCapability>>
    {
        self.recorder.borrow_mut().calls.push("create_client".to_string());
        if let Some(status) = self.script.fail_create {
            return Err(status);
        }
        Ok(Box::new(MockClient {
            script: Rc::clone(&self.script),
            recorder: Rc::clone(&self.recorder),
        }))
    }
}

struct MockClient
{
    script: Rc<Script>,
    recorder: Shared,
}

impl ClientCapability for MockClient
{
    fn control(&self) -> EngineResult<Box<dyn ControlCapability>>
    {
        self.recorder.borrow_mut().calls.push("control".to_string());
        if let Some(status) = self.script.fail_control {
            return Err(status);
        }
        Ok(Box::new(MockControl {
            script: Rc::clone(&self.script),
            recorder: Rc::clone(&self.recorder),
        }))
    }

    fn symbols(&self) -> EngineResult<Box<dyn SymbolCapability>>
    {
        self.recorder.borrow_mut().calls.push("symbols".to_string());
        if let Some(status) = self.script.fail_symbols {
            return Err(status);
        }
        Ok(Box::new(MockSymbols {
            script: Rc::clone(&self.script),
            recorder: Rc::clone(&self.recorder),
        }))
    }

    fn set_output(&self, sink: Arc<dyn DiagnosticSink>) -> EngineResult<()>
    {
        self.recorder.borrow_mut().calls.push("set_output".to_string());
        for text in &self.script.output {
            sink.output(text);
        }
        Ok(())
    }

    fn open_snapshot(&self, snapshot: &SnapshotFile) -> EngineResult<()>
    {
        let mut recorder = self.recorder.borrow_mut();
        recorder.calls.push("open_snapshot".to_string());
        recorder.snapshot = Some(snapshot.path().to_path_buf());
        match self.script.fail_open {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

impl Drop for MockClient
{
    fn drop(&mut self)
    {
        self.recorder.borrow_mut().released.push("client");
        tracing::debug!("Released client");
    }
}

struct MockControl
{
    script: Rc<Script>,
    recorder: Shared,
}

impl ControlCapability for MockControl
{
    fn wait_for_event(&self) -> EngineResult<()>
    {
        self.recorder.borrow_mut().calls.push("wait_for_event".to_string());
        match self.script.fail_wait {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

impl Drop for MockControl
{
    fn drop(&mut self)
    {
        self.recorder.borrow_mut().released.push("control");
        tracing::debug!("Released control");
    }
}

struct MockSymbols
{
    script: Rc<Script>,
    recorder: Shared,
}

impl MockSymbols
{
    fn record(&self, call: &str)
    {
        self.recorder.borrow_mut().calls.push(call.to_string());
    }
}

impl SymbolCapability for MockSymbols
{
    fn set_symbol_path(&self, path: &Path) -> EngineResult<()>
    {
        self.record("set_symbol_path");
        if let Some(status) = self.script.fail_symbol_path {
            return Err(status);
        }
        self.recorder.borrow_mut().symbol_path = Some(path.to_path_buf());
        Ok(())
    }

    fn enable_symbol_diagnostics(&self) -> EngineResult<()>
    {
        self.record("enable_symbol_diagnostics");
        Ok(())
    }

    fn module_by_offset(&self, address: Address) -> EngineResult<ModuleLocation>
    {
        self.record("module_by_offset");
        if self.script.offline.get() {
            return Err(EngineStatus::FAIL);
        }
        let address = address.value();
        self.script
            .modules
            .iter()
            .enumerate()
            .find(|(_, module)| address >= module.base && address - module.base < module.size)
            .map(|(index, module)| ModuleLocation {
                index: index as u32,
                base: Address::from(module.base),
            })
            .ok_or(EngineStatus::FAIL)
    }

    fn module_name(&self, module: &ModuleLocation) -> EngineResult<String>
    {
        self.record("module_name");
        self.script
            .modules
            .get(module.index as usize)
            .map(|module| module.name.clone())
            .ok_or(EngineStatus::INVALID_ARG)
    }

    fn name_by_offset(&self, address: Address) -> EngineResult<SymbolHit>
    {
        self.record("name_by_offset");
        if self.script.offline.get() {
            return Err(EngineStatus::FAIL);
        }
        let address = address.value();
        self.script
            .symbols
            .iter()
            .find(|symbol| address >= symbol.address && address - symbol.address < symbol.size)
            .map(|symbol| SymbolHit {
                name: symbol.name.clone(),
                displacement: address - symbol.address,
            })
            .ok_or(EngineStatus::FAIL)
    }

    fn offset_by_name(&self, name: &str) -> EngineResult<Address>
    {
        self.record("offset_by_name");
        self.script
            .symbols
            .iter()
            .find(|symbol| symbol.name == name)
            .map(|symbol| Address::from(symbol.address))
            .ok_or(EngineStatus::FAIL)
    }
}

impl Drop for MockSymbols
{
    fn drop(&mut self)
    {
        self.recorder.borrow_mut().released.push("symbols");
        tracing::debug!("Released symbols");
    }
}

/// Messages of every event emitted while [`EventLog::capture`] runs.
#[derive(Debug, Clone, Default)]
pub struct EventLog
{
    messages: Arc<Mutex<Vec<String>>>,
}

impl EventLog
{
    /// Run `f` with this log as the thread's subscriber.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T
    {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn messages(&self) -> Vec<String>
    {
        self.messages.lock().unwrap().clone()
    }

    /// What was released, in order: the mock capabilities report
    /// `"Released <name>"`, the snapshot file `"Closing snapshot"`.
    pub fn releases(&self) -> Vec<String>
    {
        self.messages()
            .into_iter()
            .filter_map(|message| match message.as_str() {
                "Closing snapshot" => Some("snapshot".to_string()),
                other => other.strip_prefix("Released ").map(str::to_string),
            })
            .collect()
    }
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_>
{
    fn record_debug(&mut self, field: &Field, value: &dyn Debug)
    {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for EventLog
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>)
    {
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            self.messages.lock().unwrap().push(message);
        }
    }
}

/// Temporary executable directory, debugger install directory and snapshot.
pub struct Fixture
{
    pub root: TempDir,
    pub layout: DependencyLayout,
    pub snapshot: PathBuf,
}

impl Fixture
{
    /// Every support library already sits next to the "executable".
    pub fn new() -> Self
    {
        let fixture = Self::bare();
        for library in SUPPORT_LIBRARIES {
            fs::write(fixture.layout.executable_dir.join(library), b"MZ").expect("write library");
        }
        fixture
    }

    /// Empty executable and install directories.
    pub fn bare() -> Self
    {
        let root = tempfile::tempdir().expect("create temp dir");
        let executable_dir = root.path().join("bin");
        let install_dir = root.path().join("Debuggers").join("x64");
        fs::create_dir_all(&executable_dir).expect("create bin dir");
        fs::create_dir_all(&install_dir).expect("create install dir");

        let snapshot = root.path().join("crash.dmp");
        fs::write(&snapshot, b"MDMP\x93\xa7\x00\x00").expect("write snapshot");

        Self {
            layout: DependencyLayout::new(executable_dir, install_dir),
            root,
            snapshot,
        }
    }

    pub fn options(&self) -> SessionOptions
    {
        SessionOptions::default().with_layout(self.layout.clone())
    }

    /// A session over `script`, not initialized yet.
    pub fn session(&self, script: Script) -> (Session, Shared)
    {
        let (engine, recorder) = MockEngine::new(script);
        (Session::with_options(engine, self.options()), recorder)
    }

    /// A ready session over `script`. The recorder is cleared after
    /// initialization so it only sees queries.
    pub fn ready_session(&self, script: Script) -> (Session, Shared)
    {
        let (mut session, recorder) = self.session(script);
        session.initialize(&self.snapshot, None).expect("initialize session");
        recorder.borrow_mut().calls.clear();
        (session, recorder)
    }
}
