//! Rendering collaborator contract.
//!
//! # Responsibility
//! - Describe what the core asks of the component that decodes and draws
//!   pages, without owning any pixel data.
//!
//! # Invariants
//! - Rendering is asynchronous: `request_render` only starts the work. The
//!   host reports completion later with the same `RenderTicket`.
//! - Surfaces are owned by the renderer and referenced by `SurfaceId` only.

use crate::model::page::PageNumber;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque handle to a canvas or text-layer surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identifies one navigation attempt.
///
/// `generation` grows on every navigation, so a completion carrying an older
/// generation belongs to an abandoned page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTicket {
    pub page: PageNumber,
    pub generation: u64,
}

/// Render job handed to the collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub ticket: RenderTicket,
    pub scale: f32,
}

/// Page decoding/drawing collaborator.
pub trait PageRenderer {
    /// Starts drawing the page image and populating its text layer.
    ///
    /// The host later reports `image_drawn` and `text_layer_ready` (or a
    /// failure) for `request.ticket`.
    fn request_render(&mut self, request: RenderRequest) -> Result<(), RenderError>;
    /// Removes a canvas surface from the page container.
    fn release_canvas(&mut self, canvas: SurfaceId);
    /// Empties the contents of a text-layer surface.
    fn clear_text_layer(&mut self, text_layer: SurfaceId);
}

/// Rendering collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Page object could not be decoded.
    Decode { page: PageNumber, message: String },
    /// Page image could not be drawn.
    Draw { page: PageNumber, message: String },
    /// Text content could not be extracted or laid out.
    TextLayer { page: PageNumber, message: String },
}

impl RenderError {
    pub fn page(&self) -> PageNumber {
        match self {
            Self::Decode { page, .. } | Self::Draw { page, .. } | Self::TextLayer { page, .. } => {
                *page
            }
        }
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode { page, message } => write!(f, "failed to decode page {page}: {message}"),
            Self::Draw { page, message } => write!(f, "failed to draw page {page}: {message}"),
            Self::TextLayer { page, message } => {
                write!(f, "failed to build text layer for page {page}: {message}")
            }
        }
    }
}

impl Error for RenderError {}
