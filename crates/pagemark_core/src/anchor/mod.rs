//! Anchor modality and page context.
//!
//! # Responsibility
//! - Decide which overlay engine owns an annotation.
//! - Stamp page context onto annotation targets.
//!
//! # Invariants
//! - Both operations are pure: inputs are never mutated.

pub mod classify;
pub mod enrich;
