//! Memory Manager and Interpreter Integration Tests
//!
//! Tests the integration between memory_manager, the object model and the
//! interpreter's scopes: arenas own runtime objects and syntax trees, symbol
//! tables map names to scope slots.

use core_types::{serialize_to_string, Object, Properties, SerializeOptions, TypeTag, Value};
use interpreter::{Interpreter, Scope};
use memory_manager::{Arena, SymbolTable, TableError};
use parser::Parser;

/// Test: a reset arena hands out fresh default memory in a new block
#[test]
fn test_arena_reset_gives_fresh_memory() {
    let mut arena: Arena<Object> = Arena::with_block_size(4);
    let first = arena.alloc(Object::int(7));
    arena.allocate(2);
    assert_eq!(arena.block_count(), 1);

    arena.reset();
    assert_eq!(arena.get(first), None);
    assert_eq!(arena.block_count(), 0);

    let fresh = arena.allocate(3);
    assert_eq!(arena.block_count(), 1);
    let items = arena.slice(fresh).unwrap();
    assert!(items.iter().all(|o| o.value == Value::Null));
}

/// Test: composite objects keep their members in an arena
#[test]
fn test_object_members_live_in_arena() {
    let mut arena = Arena::new();
    let mut object = Object::object(Properties::NONE);
    object.append(&mut arena, Object::int(1).named("a")).unwrap();
    object.append(&mut arena, Object::string("x").named("b")).unwrap();

    assert_eq!(arena.total_allocated(), 2);
    assert_eq!(object.member(&arena, "a").unwrap().value, Value::Int(1));

    let text = serialize_to_string(&object, &arena, &SerializeOptions::compact()).unwrap();
    assert_eq!(text, r#"{ a = 1, b = "x" }"#);
}

/// Test: arrays of objects store handles into the arena
#[test]
fn test_array_of_objects() {
    let mut arena = Arena::new();
    let array = Object::array_of(&mut arena, vec![Object::int(1), Object::string("s")]);
    assert!(array.is_array());
    assert_eq!(array.tag(), TypeTag::Object);

    let id = array.array_get_object(1).unwrap().unwrap();
    assert_eq!(arena.get(id).unwrap().value, Value::String(b"s".to_vec()));
}

/// Test: symbol table slots are stable and absent keys miss
#[test]
fn test_symbol_table_slot_stability() {
    let mut table = SymbolTable::with_capacity(64);
    let names = ["alpha", "beta", "gamma", "delta", "epsilon"];
    let slots: Vec<usize> = names
        .iter()
        .map(|n| table.reserve(n.as_bytes()).unwrap())
        .collect();

    for (name, slot) in names.iter().zip(&slots) {
        assert_eq!(table.query(name.as_bytes()), Some(*slot));
    }
    assert_eq!(table.query(b"zeta"), None);
    assert_eq!(table.len(), names.len());
}

/// Test: a full table refuses new keys
#[test]
fn test_symbol_table_full() {
    let mut table = SymbolTable::with_capacity(2);
    table.reserve(b"a").unwrap();
    table.reserve(b"b").unwrap();
    assert_eq!(table.reserve(b"c"), Err(TableError::Full { capacity: 2 }));
}

/// Test: resizing moves keys and reports where they went
#[test]
fn test_symbol_table_resize() {
    let mut table = SymbolTable::with_capacity(8);
    let slot = table.reserve(b"kept").unwrap();
    let moves = table.resize(32);

    assert_eq!(table.capacity(), 32);
    let new_slot = moves
        .iter()
        .find(|(old, _)| *old == slot)
        .map(|(_, new)| *new)
        .unwrap();
    assert_eq!(table.query(b"kept"), Some(new_slot));
}

/// Test: scopes tie the symbol table to object slots
#[test]
fn test_scope_slots_follow_table() {
    let mut scope = Scope::with_capacity(16);
    let slot = scope.insert("x", Object::int(1)).unwrap();
    let again = scope.assign("x", Object::int(2)).unwrap();

    assert_eq!(slot, again);
    assert_eq!(scope.slot_of("x"), Some(slot));
    assert_eq!(scope.lookup("x").unwrap().value, Value::Int(2));
}

/// Test: syntax tree nodes live in the parser's arena
#[test]
fn test_ast_arena_grows_with_source() {
    let small = Parser::new("x = 1").parse().unwrap();
    let large = Parser::new("x = 1\ny = [1, 2, 3, 4]\nz = { a = 1, b = 2 }").parse().unwrap();
    assert!(large.len() > small.len());
    assert!(!small.is_empty());
}

/// Test: each run releases the previous run's objects
#[test]
fn test_interpreter_releases_objects_between_runs() {
    let mut interpreter = Interpreter::new();
    let ast = Parser::new("main() { return [{ a = 1 }, { b = 2 }] }").parse().unwrap();

    interpreter.run(&ast).unwrap();
    let after_first = interpreter.context().objects.total_allocated();
    assert!(after_first > 0);

    interpreter.run(&ast).unwrap();
    assert_eq!(interpreter.context().objects.total_allocated(), after_first);
}

/// Test: function argument descriptors live in the functions scope arena
#[test]
fn test_function_descriptors_in_scope_arena() {
    let source = "f(a int, b string) { return a }\ng() { return 1 }";
    let ast = Parser::new(source).parse().unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.run(&ast).ok();

    let functions = &interpreter.context().functions;
    assert_eq!(functions.len(), 2);
    assert_eq!(functions.temp().total_allocated(), 2);
    match &functions.lookup("f").unwrap().value {
        Value::Function(descriptor) => {
            let args = functions.temp().slice(descriptor.arguments).unwrap();
            let names: Vec<_> = args.iter().filter_map(Object::name).collect();
            assert_eq!(names, vec!["a", "b"]);
        }
        other => panic!("expected function, got {:?}", other),
    }
}
