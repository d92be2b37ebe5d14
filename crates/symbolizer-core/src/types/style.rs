//! Symbolization output styles.

use std::fmt;
use std::str::FromStr;

/// How an address is rendered once resolved
///
/// The style only matters on the uncached path. Once an address has been
/// symbolized in a session, later lookups return the cached string no matter
/// which style they ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TraceStyle
{
    /// `module+0xoffset`, the offset being relative to the module base.
    ///
    /// Cheap for the engine (no symbol files needed) and stable across
    /// machines, which makes it the usual choice for coverage traces.
    Modoff,
    /// `symbol+0xdisplacement` using the nearest symbol at or before the
    /// address. Requires symbols to be reachable through the symbol path.
    #[default]
    FullSymbol,
}

impl fmt::Display for TraceStyle
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            TraceStyle::Modoff => "modoff",
            TraceStyle::FullSymbol => "fullsymbol",
        };
        write!(f, "{label}")
    }
}

impl FromStr for TraceStyle
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "modoff" | "mod" | "module" => Ok(TraceStyle::Modoff),
            "fullsymbol" | "full" | "symbol" | "sym" => Ok(TraceStyle::FullSymbol),
            _ => Err(format!("Unknown trace style: {s}. Use 'modoff' or 'fullsymbol'")),
        }
    }
}
