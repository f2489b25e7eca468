//! Overlay engine contracts.
//!
//! # Responsibility
//! - Describe the capabilities the core needs from the text-anchored and
//!   image-anchored overlay engines.
//! - Provide the event channel both engines report through.
//!
//! # Invariants
//! - Overlay instances are created per page by an `OverlayFactory` and are
//!   never reused across pages.
//! - Overlays hold display-local copies only; every change they make reaches
//!   the store through `OverlayEventSink`.

pub mod events;
pub mod guard;

use crate::model::annotation::{Annotation, AnnotationId};
use crate::render::SurfaceId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use events::{EventOrigin, OverlayEvent, OverlayEventKind, OverlayEventSink};
pub use guard::OverlayGuard;

/// User interaction mode of the annotation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionMode {
    /// Select text or draw to create annotations.
    #[default]
    Annotation,
    /// Link existing annotations with relationships.
    Relations,
    /// Image overlay exclusively receives pointer events.
    Image,
}

impl InteractionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Annotation => "ANNOTATION",
            Self::Relations => "RELATIONS",
            Self::Image => "IMAGE",
        }
    }
}

/// Capabilities shared by both overlay engines.
pub trait OverlayEngine {
    /// Replaces every displayed annotation.
    fn set_annotations(&mut self, annotations: Vec<Annotation>);
    fn add_annotation(&mut self, annotation: Annotation);
    fn remove_annotation(&mut self, id: &AnnotationId);
    /// Releases listeners and surface state. Called exactly once.
    fn destroy(&mut self);
}

/// Overlay anchored to the selectable text layer.
pub trait TextOverlay: OverlayEngine {
    /// Switches between creation and relationship-linking interaction.
    fn set_mode(&mut self, mode: InteractionMode);
}

/// Overlay anchored to the rendered page canvas.
pub trait ImageOverlay: OverlayEngine {
    /// Highlights `annotation`, or clears the selection with `None`.
    fn select_annotation(&mut self, annotation: Option<&Annotation>);
    /// Grants (`true`) or withdraws exclusive pointer-event capture.
    fn set_pointer_capture(&mut self, exclusive: bool);
}

/// Builds fresh overlay instances for one displayed page.
pub trait OverlayFactory {
    /// `options` is the caller's opaque text overlay configuration.
    fn create_text_overlay(
        &mut self,
        text_layer: SurfaceId,
        options: &Value,
        sink: OverlayEventSink,
    ) -> Result<Box<dyn TextOverlay>, OverlayError>;

    fn create_image_overlay(
        &mut self,
        canvas: SurfaceId,
        sink: OverlayEventSink,
    ) -> Result<Box<dyn ImageOverlay>, OverlayError>;
}

/// Overlay engine construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// Engine rejected the surface it was asked to attach to.
    Attach(String),
    /// Engine rejected the supplied configuration.
    Config(String),
}

impl Display for OverlayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attach(message) => write!(f, "overlay failed to attach: {message}"),
            Self::Config(message) => write!(f, "overlay rejected configuration: {message}"),
        }
    }
}

impl Error for OverlayError {}
