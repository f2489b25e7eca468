//! Page coordination services.
//!
//! # Responsibility
//! - Drive page navigation, overlay lifecycle and the event pipeline.
//! - Keep hosts decoupled from overlay and store details.

pub mod lifecycle;
pub mod navigator;
pub mod normalizer;
pub mod viewer_session;
