//! Integration test suite for the Duct workspace
//!
//! This crate provides integration tests that verify components work
//! together correctly across component boundaries.

/// Re-export components for test convenience
pub mod components {
    pub use core_types;
    pub use duct_cli;
    pub use interpreter;
    pub use memory_manager;
    pub use parser;
}
