//! Build target description.

use std::fmt;

/// Architecture the symbolizer was compiled for
///
/// The debugging engine libraries ship per architecture, so this decides
/// which directory of an installed debugger package the support libraries
/// are staged from.
///
/// ## Example
///
/// ```rust
/// use symbolizer_core::types::Architecture;
///
/// match Architecture::current() {
///     Architecture::X64 => println!("64-bit x86"),
///     Architecture::X86 => println!("32-bit x86"),
///     Architecture::Arm64 => println!("ARM64"),
///     Architecture::Unknown(name) => println!("unsupported: {name}"),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture
{
    /// 32-bit x86
    X86,
    /// 64-bit x86 (Intel/AMD)
    X64,
    /// 64-bit ARM
    Arm64,
    /// Any other architecture. The debugger package has no libraries for it.
    Unknown(&'static str),
}

impl Architecture
{
    /// Architecture of the running binary, decided at compile time.
    pub const fn current() -> Self
    {
        #[cfg(target_arch = "x86")]
        {
            Architecture::X86
        }

        #[cfg(target_arch = "x86_64")]
        {
            Architecture::X64
        }

        #[cfg(target_arch = "aarch64")]
        {
            Architecture::Arm64
        }

        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Architecture::Unknown(std::env::consts::ARCH)
        }
    }

    /// Name of the per-architecture directory inside an installed debugger
    /// package (`...\Debuggers\x64`, for instance).
    #[must_use]
    pub const fn debugger_dir(self) -> &'static str
    {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
            Architecture::Arm64 => "arm64",
            Architecture::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Architecture
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.debugger_dir())
    }
}

/// Version of the symbolizer crates.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Operating system the symbolizer was compiled for.
pub const SYSTEM: &str = std::env::consts::OS;
