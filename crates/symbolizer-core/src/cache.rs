//! # Resolution Cache
//!
//! Memo of already symbolized addresses.
//!
//! Resolving an address through the engine is slow (module lookups, symbol
//! file loads), while a trace usually executes a much smaller number of
//! *unique* addresses than it has lines. Remembering every successful result
//! for the lifetime of the session turns the replay of a long trace into a
//! handful of engine calls.
//!
//! ## Keying
//!
//! Entries are keyed by address only, not by trace style. Once an address is
//! cached, asking for it again in another style returns the string produced
//! by the first successful request.
//!
//! ## Invalidation
//!
//! There is none. The snapshot behind a session is immutable once loaded, so
//! a cached entry is valid for as long as the session exists.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::Address;

/// Hit/miss counters of a [`SymbolCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats
{
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to be resolved and were inserted.
    pub misses: u64,
    /// Lookups whose resolution failed (nothing inserted).
    pub failures: u64,
    /// Number of cached addresses.
    pub entries: usize,
}

/// Address-keyed cache of symbolized strings
///
/// The cache is only ever filled through [`get_or_try_insert_with`], which
/// inserts a complete entry or nothing at all.
///
/// ## Thread Safety
///
/// The cache is not thread-safe and is never shared between sessions.
///
/// [`get_or_try_insert_with`]: SymbolCache::get_or_try_insert_with
#[derive(Debug, Default)]
pub struct SymbolCache
{
    entries: HashMap<Address, String>,
    hits: u64,
    misses: u64,
    failures: u64,
}

impl SymbolCache
{
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Return the cached string for `address`, resolving it with `resolve`
    /// on a miss.
    ///
    /// The returned reference points at the stored entry, so repeated
    /// lookups observe the very same string.
    ///
    /// ## Errors
    ///
    /// Whatever `resolve` returns. The cache is left untouched in that case.
    pub fn get_or_try_insert_with<F>(&mut self, address: Address, resolve: F) -> Result<&str>
    where
        F: FnOnce() -> Result<String>,
    {
        match self.entries.entry(address) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                Ok(entry.into_mut().as_str())
            }
            Entry::Vacant(entry) => match resolve() {
                Ok(symbol) => {
                    self.misses += 1;
                    Ok(entry.insert(symbol).as_str())
                }
                Err(err) => {
                    self.failures += 1;
                    Err(err)
                }
            },
        }
    }

    /// Cached string for `address`, without resolving.
    pub fn get(&self, address: Address) -> Option<&str>
    {
        self.entries.get(&address).map(String::as_str)
    }

    /// Whether `address` has been cached.
    pub fn contains(&self, address: Address) -> bool
    {
        self.entries.contains_key(&address)
    }

    /// Number of cached addresses.
    pub fn len(&self) -> usize
    {
        self.entries.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats
    {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            failures: self.failures,
            entries: self.entries.len(),
        }
    }
}
