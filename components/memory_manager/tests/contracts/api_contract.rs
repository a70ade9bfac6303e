//! Contract tests verifying the memory_manager API.
//! These tests exercise the exported types through the public surface only.

use memory_manager::{Arena, SymbolTable, TableError, DEFAULT_BLOCK_SIZE, DEFAULT_CAPACITY};

/// Arena contract: new() uses the default block size
#[test]
fn contract_arena_default_block_size() {
    let arena: Arena<u8> = Arena::new();
    assert_eq!(arena.block_size(), DEFAULT_BLOCK_SIZE);
    assert_eq!(arena.block_count(), 0);
}

/// Arena contract: allocate(len) returns zeroed memory
#[test]
fn contract_arena_allocate_zeroed() {
    let mut arena: Arena<u64> = Arena::new();
    let slice = arena.allocate(32);
    assert!(arena.slice(slice).unwrap().iter().all(|&v| v == 0));
    assert_eq!(arena.total_allocated(), 32);
}

/// Arena contract: handed-out elements are never moved by later allocations
#[test]
fn contract_arena_handles_are_stable() {
    let mut arena: Arena<u32> = Arena::with_block_size(4);
    let ids: Vec<_> = (0..20).map(|i| arena.alloc(i)).collect();
    assert!(arena.block_count() >= 5);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(arena.get(*id), Some(&(i as u32)));
    }
}

/// Arena contract: reset() then allocate() yields fresh zeroed memory in a new block
#[test]
fn contract_arena_reset_fresh_block() {
    let mut arena: Arena<u8> = Arena::new();
    let before = arena.alloc_slice(&[0xAA; 64]);
    let generation = arena.generation();

    arena.reset();
    let after = arena.allocate(64);

    assert_ne!(arena.generation(), generation);
    assert_eq!(arena.block_count(), 1);
    assert!(arena.slice(before).is_none());
    assert_eq!(arena.slice(after).unwrap(), &[0u8; 64][..]);
}

/// SymbolTable contract: N distinct keys below capacity keep their slots
#[test]
fn contract_symbol_table_slots_are_stable() {
    let mut table = SymbolTable::new();
    assert_eq!(table.capacity(), DEFAULT_CAPACITY);

    let mut reserved = Vec::new();
    for i in 0..500 {
        let key = format!("ident{}", i);
        let slot = table.reserve(key.as_bytes()).unwrap();
        reserved.push((key, slot));
    }
    for (key, slot) in &reserved {
        assert_eq!(table.query(key.as_bytes()), Some(*slot));
        assert_eq!(table.key(*slot), Some(key.as_bytes()));
    }
    assert_eq!(table.query(b"never_inserted"), None);
    assert!(table.load() > 0.2 && table.load() < 0.3);
}

/// SymbolTable contract: reserve() on a saturated table fails without moving keys
#[test]
fn contract_symbol_table_full() {
    let mut table = SymbolTable::with_capacity(3);
    let a = table.reserve(b"a").unwrap();
    table.reserve(b"b").unwrap();
    table.reserve(b"c").unwrap();

    assert!(matches!(table.reserve(b"d"), Err(TableError::Full { .. })));
    assert_eq!(table.query(b"a"), Some(a));
}

/// SymbolTable contract: resize() rehashes every key
#[test]
fn contract_symbol_table_resize() {
    let mut table = SymbolTable::with_capacity(16);
    for i in 0..12 {
        table.reserve(format!("k{}", i).as_bytes()).unwrap();
    }
    let moves = table.resize(128);
    assert_eq!(moves.len(), 12);
    assert_eq!(table.len(), 12);
    for i in 0..12 {
        assert!(table.query(format!("k{}", i).as_bytes()).is_some());
    }
}
