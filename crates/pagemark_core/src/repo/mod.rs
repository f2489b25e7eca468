//! Page-indexed annotation storage.
//!
//! # Responsibility
//! - Define the store contract the coordination layer writes through.
//! - Provide the in-process store used for one document session.
//!
//! # Invariants
//! - Page collections are disjoint: an id lives on at most one page.
//! - Duplicate creates and orphan updates/deletes are no-ops, never errors.

pub mod annotation_repo;
pub mod delta;
pub mod memory_store;
