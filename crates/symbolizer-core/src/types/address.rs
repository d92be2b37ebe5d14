//! Instruction address type.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Strongly typed instruction address inside a loaded snapshot
///
/// Traces and crash dumps record addresses as bare 64-bit integers. This
/// newtype keeps them apart from the other `u64` values flowing through the
/// resolver (module offsets, symbol displacements, engine indices).
///
/// ## Example
///
/// ```rust
/// use symbolizer_core::types::Address;
///
/// let addr = Address::from(0x7ff8_0000_1234);
/// let base = Address::from(0x7ff8_0000_0000);
/// assert_eq!(addr.offset_from(base), Some(0x1234));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// Equivalent to `Address::from(value)` but usable in const contexts.
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    ///
    /// Use this when handing the address to the debugging engine, which
    /// only understands plain 64-bit offsets.
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Distance from `base` to this address
    ///
    /// Returns `None` when `base` lies above the address, which means the
    /// address cannot belong to a module loaded at `base`.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use symbolizer_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.offset_from(Address::from(0x800)), Some(0x800));
    /// assert_eq!(addr.offset_from(Address::from(0x2000)), None);
    /// ```
    pub fn offset_from(self, base: Address) -> Option<u64>
    {
        self.0.checked_sub(base.0)
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ## Example
    ///
    /// ```rust
    /// use symbolizer_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Parse hexadecimal text, with or without a `0x` prefix
    ///
    /// WinDbg's `` ` `` separators and surrounding whitespace are ignored.
    ///
    /// ```rust
    /// use symbolizer_core::types::Address;
    ///
    /// assert_eq!(Address::from_hex("1000").unwrap(), Address::from(0x1000));
    /// assert_eq!(Address::from_hex("00000001`40001000").unwrap(), Address::from(0x1_4000_1000));
    /// ```
    pub fn from_hex(text: &str) -> Result<Self, ParseIntError>
    {
        let cleaned: String = text.trim().chars().filter(|c| *c != '`').collect();
        let digits = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
            .unwrap_or(&cleaned);
        u64::from_str_radix(digits, 16).map(Address)
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Parse an address the way trace files write them
///
/// Hexadecimal when the text has a `0x`/`0X` prefix, contains an `a-f` digit,
/// contains WinDbg's `` ` `` separator (e.g. `00007ff8`00001234`), or is
/// zero-padded (a leading `0` followed by more digits). Anything else is
/// decimal. Surrounding whitespace is ignored. Use [`Address::from_hex`] when
/// the radix is known.
///
/// ```rust
/// use symbolizer_core::types::Address;
///
/// assert_eq!("0x1000".parse::<Address>().unwrap(), Address::from(0x1000));
/// assert_eq!("4096".parse::<Address>().unwrap(), Address::from(0x1000));
/// assert_eq!("0000000140001000".parse::<Address>().unwrap(), Address::from(0x1_4000_1000));
/// assert_eq!("7ff8`0000abcd".parse::<Address>().unwrap(), Address::from(0x7ff8_0000_abcd));
/// ```
impl FromStr for Address
{
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let text = s.trim();

        let is_hex = text.starts_with("0x")
            || text.starts_with("0X")
            || text.contains('`')
            || (text.len() > 1 && text.starts_with('0'))
            || text.chars().any(|c| matches!(c, 'a'..='f' | 'A'..='F'));

        if is_hex {
            return Address::from_hex(text);
        }

        text.parse::<u64>().map(Address)
    }
}
