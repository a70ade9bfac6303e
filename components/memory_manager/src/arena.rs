//! Block-based arena allocator.
//!
//! An [`Arena`] owns a list of fixed-capacity blocks. Allocations are
//! appended to the tail block; when it lacks room a fresh block is appended
//! and allocation continues there. Nothing is ever freed individually and
//! nothing is ever moved, so handles stay valid until [`Arena::reset`].
//!
//! Handles ([`ArenaId`], [`ArenaSlice`]) are arena-relative indices that
//! carry the arena generation. A handle taken before a `reset` no longer
//! resolves afterwards, which makes aliasing released memory impossible.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Default number of elements per block.
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

/// Handle to a single element stored in an [`Arena`].
pub struct ArenaId<T> {
    generation: u32,
    block: u32,
    offset: u32,
    _marker: PhantomData<fn() -> T>,
}

/// Handle to a contiguous run of elements stored in an [`Arena`].
pub struct ArenaSlice<T> {
    generation: u32,
    block: u32,
    offset: u32,
    len: u32,
    _marker: PhantomData<fn() -> T>,
}

/// Untyped arena handle.
///
/// Used where a value must point into an arena whose element type lives in
/// a crate further up the dependency graph (a function object pointing at
/// its AST entry node, for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawArenaId {
    generation: u32,
    block: u32,
    offset: u32,
}

impl<T> ArenaId<T> {
    /// Forgets the element type of this handle.
    pub fn erase(self) -> RawArenaId {
        RawArenaId {
            generation: self.generation,
            block: self.block,
            offset: self.offset,
        }
    }

    /// Block index this handle points into.
    pub fn block(&self) -> usize {
        self.block as usize
    }

    /// Offset of the element inside its block.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }
}

impl RawArenaId {
    /// Reattaches an element type to an erased handle.
    ///
    /// The caller is responsible for pairing the handle with the arena it
    /// came from; resolving it against any other arena yields an unrelated
    /// element or `None`.
    pub fn typed<T>(self) -> ArenaId<T> {
        ArenaId {
            generation: self.generation,
            block: self.block,
            offset: self.offset,
            _marker: PhantomData,
        }
    }
}

impl<T> ArenaSlice<T> {
    /// An empty slice that resolves against any arena.
    pub fn empty() -> Self {
        ArenaSlice {
            generation: 0,
            block: 0,
            offset: 0,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Number of elements covered by this slice.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns true if the slice covers no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle to the `index`-th element of the slice.
    pub fn get(&self, index: usize) -> Option<ArenaId<T>> {
        if index >= self.len() {
            return None;
        }
        Some(ArenaId {
            generation: self.generation,
            block: self.block,
            offset: self.offset + index as u32,
            _marker: PhantomData,
        })
    }
}

// Manual impls: derives would put needless bounds on `T`.

impl<T> Clone for ArenaId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaId<T> {}

impl<T> PartialEq for ArenaId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.block == other.block
            && self.offset == other.offset
    }
}

impl<T> Eq for ArenaId<T> {}

impl<T> Hash for ArenaId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.generation.hash(state);
        self.block.hash(state);
        self.offset.hash(state);
    }
}

impl<T> fmt::Debug for ArenaId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaId({}:{}@{})", self.generation, self.block, self.offset)
    }
}

impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> PartialEq for ArenaSlice<T> {
    fn eq(&self, other: &Self) -> bool {
        self.generation == other.generation
            && self.block == other.block
            && self.offset == other.offset
            && self.len == other.len
    }
}

impl<T> Eq for ArenaSlice<T> {}

impl<T> fmt::Debug for ArenaSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArenaSlice({}:{}@{}+{})",
            self.generation, self.block, self.offset, self.len
        )
    }
}

/// Append-only allocator releasing all of its allocations together.
///
/// # Examples
///
/// ```
/// use memory_manager::Arena;
///
/// let mut arena: Arena<u32> = Arena::new();
/// let id = arena.alloc(7);
/// assert_eq!(arena.get(id), Some(&7));
///
/// arena.reset();
/// assert_eq!(arena.get(id), None);
/// ```
#[derive(Debug)]
pub struct Arena<T> {
    blocks: Vec<Vec<T>>,
    block_size: usize,
    total_allocated: usize,
    generation: u32,
}

impl<T: Default> Arena<T> {
    /// Creates an empty arena with [`DEFAULT_BLOCK_SIZE`] blocks.
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates an empty arena whose blocks hold `block_size` elements.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is smaller than 2.
    pub fn with_block_size(block_size: usize) -> Self {
        assert!(block_size > 1, "arena block size must be at least 2");
        Arena {
            blocks: Vec::new(),
            block_size,
            total_allocated: 0,
            generation: 0,
        }
    }

    /// Allocates `len` default-initialized elements, contiguous in one block.
    ///
    /// # Panics
    ///
    /// Panics if `len` is not strictly smaller than the block size.
    pub fn allocate(&mut self, len: usize) -> ArenaSlice<T> {
        assert!(
            len < self.block_size,
            "arena allocation of {} elements exceeds block size {}",
            len,
            self.block_size
        );

        let needs_block = match self.blocks.last() {
            Some(tail) => tail.len() + len > self.block_size,
            None => true,
        };
        if needs_block {
            self.blocks.push(Vec::with_capacity(self.block_size));
        }

        let block = self.blocks.len() - 1;
        let tail = &mut self.blocks[block];
        let offset = tail.len();
        tail.extend((0..len).map(|_| T::default()));
        self.total_allocated += len;

        ArenaSlice {
            generation: self.generation,
            block: block as u32,
            offset: offset as u32,
            len: len as u32,
            _marker: PhantomData,
        }
    }

    /// Stores a single value and returns its handle.
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        let slice = self.allocate(1);
        let id = ArenaId {
            generation: slice.generation,
            block: slice.block,
            offset: slice.offset,
            _marker: PhantomData,
        };
        self.blocks[id.block()][id.offset()] = value;
        id
    }

    /// Releases every block. All handles issued so far become stale.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.total_allocated = 0;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Resets every stored element to its default value, keeping the blocks.
    pub fn clear(&mut self) {
        for block in &mut self.blocks {
            for item in block.iter_mut() {
                *item = T::default();
            }
        }
    }
}

impl<T: Default + Clone> Arena<T> {
    /// Copies `items` into the arena.
    pub fn alloc_slice(&mut self, items: &[T]) -> ArenaSlice<T> {
        let slice = self.allocate(items.len());
        if let Some(dest) = self.slice_mut(slice) {
            dest.clone_from_slice(items);
        }
        slice
    }
}

impl<T> Arena<T> {
    /// Resolves a handle. Returns `None` for handles issued before the last reset.
    pub fn get(&self, id: ArenaId<T>) -> Option<&T> {
        if id.generation != self.generation {
            return None;
        }
        self.blocks.get(id.block())?.get(id.offset())
    }

    /// Mutable counterpart of [`Arena::get`].
    pub fn get_mut(&mut self, id: ArenaId<T>) -> Option<&mut T> {
        if id.generation != self.generation {
            return None;
        }
        self.blocks.get_mut(id.block())?.get_mut(id.offset())
    }

    /// Resolves a slice handle.
    pub fn slice(&self, slice: ArenaSlice<T>) -> Option<&[T]> {
        if slice.is_empty() {
            return Some(&[]);
        }
        if slice.generation != self.generation {
            return None;
        }
        let start = slice.offset as usize;
        self.blocks
            .get(slice.block as usize)?
            .get(start..start + slice.len())
    }

    /// Mutable counterpart of [`Arena::slice`].
    pub fn slice_mut(&mut self, slice: ArenaSlice<T>) -> Option<&mut [T]> {
        if slice.is_empty() {
            return Some(&mut []);
        }
        if slice.generation != self.generation {
            return None;
        }
        let start = slice.offset as usize;
        self.blocks
            .get_mut(slice.block as usize)?
            .get_mut(start..start + slice.len())
    }

    /// Number of elements handed out since creation or the last reset.
    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }

    /// Number of live blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Capacity of each block, in elements.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Current generation, bumped by every reset.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T: Default> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
