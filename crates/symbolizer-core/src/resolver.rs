//! # Resolver
//!
//! The two uncached symbolization algorithms and symbol-name lookup.
//!
//! These functions talk to the engine directly and know nothing about the
//! cache; [`Session`](crate::session::Session) wraps them with it.
//!
//! ## Output formats
//!
//! | style        | format                      | example              |
//! |--------------|-----------------------------|----------------------|
//! | `Modoff`     | `<module>+0x<address-base>` | `kernel32+0x1234`    |
//! | `FullSymbol` | `<symbol>+0x<displacement>` | `nt!KiSystemCall64+0x15` |
//!
//! Offsets are lowercase hexadecimal without padding (`+0x0` for an exact hit).

use tracing::error;

use crate::engine::{EngineStatus, SymbolCapability, MAX_NAME_LEN};
use crate::error::{Result, SymbolizerError};
use crate::types::{Address, TraceStyle};

/// Symbolize `address` in the requested `style`, bypassing any cache.
///
/// ## Errors
///
/// - `ResolutionFailed`: the engine could not answer
/// - `NameTooLong`: the engine returned a name longer than [`MAX_NAME_LEN`]
pub fn symbolize(symbols: &dyn SymbolCapability, address: Address, style: TraceStyle) -> Result<String>
{
    match style {
        TraceStyle::Modoff => symbolize_modoff(symbols, address),
        TraceStyle::FullSymbol => symbolize_full(symbols, address),
    }
}

/// `module+0xoffset` symbolization.
///
/// ## Errors
///
/// - `ResolutionFailed`: no module contains the address, its name cannot be
///   retrieved, or the engine reports a base above the address
/// - `NameTooLong`: the module name exceeds [`MAX_NAME_LEN`]
pub fn symbolize_modoff(symbols: &dyn SymbolCapability, address: Address) -> Result<String>
{
    let module = symbols
        .module_by_offset(address)
        .map_err(|status| resolution_failed("GetModuleByOffset", address, status))?;

    let name = symbols
        .module_name(&module)
        .map_err(|status| resolution_failed("GetModuleNameString", address, status))?;
    check_name_len("GetModuleNameString", &name)?;

    let offset = address
        .offset_from(module.base)
        .ok_or_else(|| resolution_failed("GetModuleByOffset", address, EngineStatus::UNEXPECTED))?;

    Ok(format_modoff(&name, offset))
}

/// `symbol+0xdisplacement` symbolization.
///
/// ## Errors
///
/// - `ResolutionFailed`: the engine has no symbol for the address
/// - `NameTooLong`: the symbol name exceeds [`MAX_NAME_LEN`]
pub fn symbolize_full(symbols: &dyn SymbolCapability, address: Address) -> Result<String>
{
    let hit = symbols
        .name_by_offset(address)
        .map_err(|status| resolution_failed("GetNameByOffset", address, status))?;
    check_name_len("GetNameByOffset", &hit.name)?;

    Ok(format_full(&hit.name, hit.displacement))
}

/// Resolve a `module!symbol` name to its address. Never cached.
///
/// ## Errors
///
/// - `InvalidArgument`: the name is empty
/// - `ResolutionFailed`: the engine does not know the symbol
pub fn resolve_name(symbols: &dyn SymbolCapability, name: &str) -> Result<Address>
{
    if name.trim().is_empty() {
        return Err(SymbolizerError::InvalidArgument("empty symbol name".to_string()));
    }

    symbols.offset_by_name(name).map_err(|status| {
        error!("GetOffsetByName('{name}') failed with {status}");
        SymbolizerError::ResolutionFailed {
            operation: "GetOffsetByName",
            target: name.to_string(),
            status,
        }
    })
}

/// Render a module-relative location.
///
/// ```rust
/// use symbolizer_core::resolver::format_modoff;
///
/// assert_eq!(format_modoff("kernel32", 0x1234), "kernel32+0x1234");
/// assert_eq!(format_modoff("ntdll", 0), "ntdll+0x0");
/// ```
pub fn format_modoff(module: &str, offset: u64) -> String
{
    format!("{module}+{offset:#x}")
}

/// Render a symbol-relative location.
///
/// ```rust
/// use symbolizer_core::resolver::format_full;
///
/// assert_eq!(format_full("nt!KiSystemCall64", 0x15), "nt!KiSystemCall64+0x15");
/// ```
pub fn format_full(symbol: &str, displacement: u64) -> String
{
    format!("{symbol}+{displacement:#x}")
}

fn check_name_len(operation: &'static str, name: &str) -> Result<()>
{
    if name.len() > MAX_NAME_LEN {
        error!("{operation} returned a {} byte name, refusing to truncate", name.len());
        return Err(SymbolizerError::NameTooLong {
            operation,
            length: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

fn resolution_failed(operation: &'static str, address: Address, status: EngineStatus) -> SymbolizerError
{
    error!("{operation}({address}) failed with {status}");
    SymbolizerError::ResolutionFailed {
        operation,
        target: address.to_string(),
        status,
    }
}
