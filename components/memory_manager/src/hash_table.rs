//! Open-addressing symbol table.
//!
//! Maps byte-slice keys to slot indices. Collisions are resolved in three
//! stages: the primary slot `h1 % cap`, the double-hash slot
//! `(h1 + h2) % cap`, then a linear probe starting at `h1 + h2`. Keys are
//! copied into the table's own [`Arena`], so callers may pass borrowed
//! source text.
//!
//! There is no deletion. Growth happens only through [`SymbolTable::resize`].

use crate::arena::{Arena, ArenaSlice};
use thiserror::Error;

/// Slot count used by [`SymbolTable::new`].
pub const DEFAULT_CAPACITY: usize = 2048;

/// Shift applied by the secondary hash.
const DJB2_SHIFT: u32 = 33;

/// Errors raised when reserving a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// Every slot along the probe path is occupied.
    #[error("symbol table is full ({capacity} slots)")]
    Full {
        /// Capacity of the table at the time of the failure
        capacity: usize,
    },
    /// Empty keys, or keys too long for the key arena, cannot be stored.
    #[error("invalid symbol table key of length {0}")]
    InvalidKey(usize),
}

/// 64-bit FNV-1a.
pub fn fnv1a(data: &[u8]) -> u64 {
    let mut h: u64 = 2_166_136_261;
    for &b in data {
        h ^= u64::from(b);
        h = h.wrapping_mul(16_777_619);
    }
    h
}

/// djb2 with a configurable shift.
pub fn djb2(data: &[u8], shift: u32) -> u64 {
    let mut h: u64 = 5381;
    for &b in data {
        h = h
            .wrapping_shl(shift)
            .wrapping_add(h)
            .wrapping_add(u64::from(b));
    }
    h
}

/// Hash table mapping identifiers to slot indices.
///
/// # Examples
///
/// ```
/// use memory_manager::SymbolTable;
///
/// let mut table = SymbolTable::with_capacity(16);
/// let slot = table.reserve(b"x").unwrap();
/// assert_eq!(table.query(b"x"), Some(slot));
/// assert_eq!(table.query(b"y"), None);
/// ```
#[derive(Debug)]
pub struct SymbolTable {
    slots: Vec<Option<ArenaSlice<u8>>>,
    keys: Arena<u8>,
    count: usize,
}

impl SymbolTable {
    /// Creates a table with [`DEFAULT_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a table with `capacity` slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        SymbolTable {
            slots: vec![None; capacity.max(1)],
            keys: Arena::new(),
            count: 0,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no key has been reserved.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Fraction of occupied slots, between 0 and 1. Not enforced.
    pub fn load(&self) -> f32 {
        self.count as f32 / self.capacity() as f32
    }

    /// Key stored in `slot`, if any.
    pub fn key(&self, slot: usize) -> Option<&[u8]> {
        let stored = (*self.slots.get(slot)?)?;
        self.keys.slice(stored)
    }

    /// Iterates over `(slot, key)` pairs of occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.slots.iter().enumerate().filter_map(move |(slot, stored)| {
            let key = self.keys.slice((*stored)?)?;
            Some((slot, key))
        })
    }

    /// Claims a free slot for `key` and returns its index.
    ///
    /// The key is not deduplicated: reserving the same key twice claims two
    /// slots. Existing keys are never moved.
    pub fn reserve(&mut self, key: &[u8]) -> Result<usize, TableError> {
        if key.is_empty() || key.len() >= self.keys.block_size() {
            return Err(TableError::InvalidKey(key.len()));
        }
        let slot = free_slot(&self.slots, key).ok_or(TableError::Full {
            capacity: self.capacity(),
        })?;
        let stored = self.keys.alloc_slice(key);
        self.slots[slot] = Some(stored);
        self.count += 1;
        Ok(slot)
    }

    /// Finds the slot holding `key`.
    ///
    /// The linear stage stops at the first empty slot: keys that spilled past
    /// their double-hash slot were inserted contiguously, so a gap proves the
    /// key is absent.
    pub fn query(&self, key: &[u8]) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        let cap = self.capacity() as u64;
        let h1 = fnv1a(key);

        let primary = (h1 % cap) as usize;
        if self.key(primary) == Some(key) {
            return Some(primary);
        }

        let h2 = djb2(key, DJB2_SHIFT);
        let base = h1.wrapping_add(h2);
        let secondary = (base % cap) as usize;
        if self.key(secondary) == Some(key) {
            return Some(secondary);
        }

        for i in 0..cap {
            let slot = (base.wrapping_add(i) % cap) as usize;
            match self.key(slot) {
                None => return None,
                Some(stored) if stored == key => return Some(slot),
                Some(_) => {}
            }
        }
        None
    }

    /// Rehashes every key into `new_capacity` slots.
    ///
    /// Returns the `(old_slot, new_slot)` pairs so callers can move any data
    /// indexed by slot. Shrinking is not supported: a capacity not larger
    /// than the current one leaves the table untouched and returns nothing.
    pub fn resize(&mut self, new_capacity: usize) -> Vec<(usize, usize)> {
        if new_capacity <= self.capacity() {
            return Vec::new();
        }
        let mut fresh: Vec<Option<ArenaSlice<u8>>> = vec![None; new_capacity];
        let mut moves = Vec::with_capacity(self.count);

        for (old_slot, stored) in self.slots.iter().enumerate() {
            let Some(stored) = *stored else { continue };
            let Some(key) = self.keys.slice(stored) else {
                continue;
            };
            // The new table is strictly larger than the number of keys.
            if let Some(new_slot) = free_slot(&fresh, key) {
                fresh[new_slot] = Some(stored);
                moves.push((old_slot, new_slot));
            }
        }

        self.slots = fresh;
        moves
    }

    /// Forgets every key and releases the key arena. Capacity is kept.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.keys.reset();
        self.count = 0;
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

fn free_slot(slots: &[Option<ArenaSlice<u8>>], key: &[u8]) -> Option<usize> {
    probe(slots.len(), key, |slot| slots[slot].is_none())
}

/// Walks the reserve probe path and returns the first slot accepted by `is_free`.
fn probe(capacity: usize, key: &[u8], is_free: impl Fn(usize) -> bool) -> Option<usize> {
    let cap = capacity as u64;
    let h1 = fnv1a(key);

    let primary = (h1 % cap) as usize;
    if is_free(primary) {
        return Some(primary);
    }

    let base = h1.wrapping_add(djb2(key, DJB2_SHIFT));
    let secondary = (base % cap) as usize;
    if is_free(secondary) {
        return Some(secondary);
    }

    (0..cap)
        .map(|i| (base.wrapping_add(i) % cap) as usize)
        .find(|&slot| is_free(slot))
}
