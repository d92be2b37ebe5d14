//! Trace file parsing and replay statistics.
//!
//! A trace is a text file with one instruction address per line, as written
//! by coverage and execution tracers. Blank lines are skipped, and so is
//! everything after a `#`. Traces are read lazily, one line at a time.

use std::collections::HashSet;
use std::fmt;
use std::io::{self, BufRead, Lines};
use std::num::ParseIntError;

use symbolizer_core::types::Address;

/// How bare trace addresses are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Radix
{
    /// Hexadecimal, `0x` prefix and WinDbg `` ` `` separators optional
    #[default]
    Hex,
    /// Plain decimal
    Decimal,
}

impl Radix
{
    /// Parse one address in this radix.
    pub fn parse(self, text: &str) -> Result<Address, ParseIntError>
    {
        match self {
            Radix::Hex => Address::from_hex(text),
            Radix::Decimal => text.trim().parse::<u64>().map(Address::from),
        }
    }
}

/// One meaningful line of a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEntry
{
    /// A parsed address
    Address(Address),
    /// A line that is not an address; `line` is 1-based
    Invalid
    {
        line: usize,
        text: String,
    },
}

/// Parse line number `line` of a trace. `None` for blank and comment-only lines.
pub fn parse_line(line: usize, text: &str, radix: Radix) -> Option<TraceEntry>
{
    let content = match text.split_once('#') {
        Some((before, _)) => before,
        None => text,
    }
    .trim();

    if content.is_empty() {
        return None;
    }

    Some(match radix.parse(content) {
        Ok(address) => TraceEntry::Address(address),
        Err(_) => TraceEntry::Invalid {
            line,
            text: content.to_string(),
        },
    })
}

/// Lazy iterator over the entries of a trace, see [`read_entries`].
pub struct Entries<R>
{
    lines: Lines<R>,
    line: usize,
    radix: Radix,
}

impl<R: BufRead> Iterator for Entries<R>
{
    type Item = io::Result<TraceEntry>;

    fn next(&mut self) -> Option<Self::Item>
    {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e)),
            };
            self.line += 1;
            if let Some(entry) = parse_line(self.line, &text, self.radix) {
                return Some(Ok(entry));
            }
        }
    }
}

/// Iterate over the entries of a trace.
///
/// Only I/O errors of `reader` are yielded as errors; malformed lines become
/// [`TraceEntry::Invalid`].
pub fn read_entries<R: BufRead>(reader: R, radix: Radix) -> Entries<R>
{
    Entries {
        lines: reader.lines(),
        line: 0,
        radix,
    }
}

/// Counters printed after a replay.
#[derive(Debug, Default)]
pub struct ReplayStats
{
    unique: HashSet<Address>,
    /// Addresses written to the output
    pub lines: usize,
    /// Addresses that could not be symbolized
    pub failures: usize,
    /// Trace lines that were not addresses
    pub invalid: usize,
    /// Lookups answered from the session cache
    pub cache_hits: u64,
}

impl ReplayStats
{
    /// Count one symbolized (or failed) address.
    pub fn record(&mut self, address: Address, resolved: bool)
    {
        self.lines += 1;
        self.unique.insert(address);
        if !resolved {
            self.failures += 1;
        }
    }

    /// Number of distinct addresses seen.
    pub fn unique(&self) -> usize
    {
        self.unique.len()
    }
}

impl fmt::Display for ReplayStats
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{} lines, {} unique addresses, {} failed, {} invalid, {} cache hits",
            self.lines,
            self.unique(),
            self.failures,
            self.invalid,
            self.cache_hits
        )
    }
}
