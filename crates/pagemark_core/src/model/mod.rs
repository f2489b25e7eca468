//! Annotation data model shared by every coordination component.
//!
//! # Responsibility
//! - Define the canonical annotation/selector/page shapes.
//! - Mirror the Web Annotation wire convention (`id`, `body`,
//!   `target.selector[]`) so values pass through overlay engines unchanged.
//!
//! # Invariants
//! - Annotations are treated as immutable values between components; every
//!   transformation returns a new value.

pub mod annotation;
pub mod page;
pub mod selector;
