//! Memory Manager - arena allocation and symbol tables
//!
//! This component provides:
//! - Block-based arena allocation with generation-checked handles
//! - An open-addressing symbol table (primary, double-hash, linear probe)
//!
//! Every AST node, runtime object and scope key in the workspace lives in
//! one of these arenas. Memory is released in bulk, never per allocation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod arena;
pub mod hash_table;

// Re-export main types
pub use arena::{Arena, ArenaId, ArenaSlice, RawArenaId, DEFAULT_BLOCK_SIZE};
pub use hash_table::{djb2, fnv1a, SymbolTable, TableError, DEFAULT_CAPACITY};
