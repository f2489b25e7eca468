//! Page-scoped annotation coordination for document viewers.
//!
//! Hosts own decoding, drawing and the two overlay engines; this crate owns
//! which page is live, which overlay instances are bound to it, and the one
//! annotation store every overlay edit is funnelled into.

pub mod anchor;
pub mod config;
pub mod logging;
pub mod model;
pub mod overlay;
pub mod render;
pub mod repo;
pub mod service;

pub use anchor::classify::{classify, modality_of, Modality, Partition};
pub use anchor::enrich::enrich;
pub use config::{ConfigError, ViewerConfig, DEFAULT_RENDER_SCALE};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::annotation::{Annotation, AnnotationId, AnnotationValidationError, Target};
pub use model::page::{PageNumber, PageNumberError};
pub use model::selector::Selector;
pub use overlay::{
    ImageOverlay, InteractionMode, OverlayEngine, OverlayError, OverlayEventSink, OverlayFactory,
    TextOverlay,
};
pub use render::{PageRenderer, RenderError, RenderRequest, RenderTicket, SurfaceId};
pub use repo::annotation_repo::{AnnotationRepository, StoreOutcome};
pub use repo::delta::{diff_annotations, AnnotationDelta};
pub use repo::memory_store::MemoryAnnotationStore;
pub use service::lifecycle::{LifecycleError, LifecyclePhase, PageLifecycle, SignalOutcome};
pub use service::navigator::{DocumentNavigator, NavigationError};
pub use service::normalizer::{AnnotationEvent, AnnotationObserver, EventNormalizer};
pub use service::viewer_session::{ViewerError, ViewerSession};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
