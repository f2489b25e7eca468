//! Page lifecycle controller.
//!
//! # Responsibility
//! - Own the displayed page's surfaces and the two overlay instances bound
//!   to them.
//! - Tear down and rebuild overlay state on every page transition.
//! - Route interaction modes and selection mirroring to the live overlays.
//!
//! # Invariants
//! - Teardown of the previous page completes before the next render request
//!   is issued, so two overlay instances never observe the same surface.
//! - Only the latest ticket may attach overlays; stale completions are
//!   discarded. A stale canvas is released; a stale text layer is left alone,
//!   since hosts reuse one container and the page owning it clears it on
//!   teardown.
//! - Overlays are attached only after both the page image and its text layer
//!   are ready.
//! - Every exit from `Active` destroys both overlays, removes the canvas and
//!   clears the text layer, in that order.

use crate::anchor::classify::{classify, modality_of, Modality, Partition};
use crate::model::annotation::Annotation;
use crate::model::page::PageNumber;
use crate::overlay::{
    EventOrigin, ImageOverlay, InteractionMode, OverlayEngine, OverlayError, OverlayEvent,
    OverlayEventSink, OverlayFactory, OverlayGuard, TextOverlay,
};
use crate::render::{PageRenderer, RenderError, RenderRequest, RenderTicket, SurfaceId};
use crate::repo::annotation_repo::AnnotationRepository;
use crate::repo::delta::AnnotationDelta;
use log::{debug, error, info, warn};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Sender;

/// Observable controller phase.
///
/// Teardown runs synchronously inside a single call and is never observable
/// between calls, so it has no phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Empty,
    Rendering,
    Active,
}

/// Completion signal reported by the host for an in-flight render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderSignal {
    ImageDrawn(SurfaceId),
    TextLayerReady(SurfaceId),
}

/// What a render signal did to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalOutcome {
    /// Recorded; still waiting for the other half of the render.
    Pending,
    /// Both overlays are live on this page.
    Attached(PageNumber),
    /// Signal belonged to an abandoned navigation and was discarded.
    Stale,
}

/// Lifecycle failures surfaced to the navigation caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    Render(RenderError),
    OverlayInit {
        page: PageNumber,
        modality: Modality,
        source: OverlayError,
    },
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(err) => write!(f, "{err}"),
            Self::OverlayInit {
                page,
                modality,
                source,
            } => write!(
                f,
                "{} overlay init failed on page {page}: {source}",
                modality.as_str()
            ),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Render(err) => Some(err),
            Self::OverlayInit { source, .. } => Some(source),
        }
    }
}

#[derive(Debug)]
struct PendingPage {
    ticket: RenderTicket,
    canvas: Option<SurfaceId>,
    text_layer: Option<SurfaceId>,
}

struct ActivePage {
    ticket: RenderTicket,
    canvas: SurfaceId,
    text_layer: SurfaceId,
    text: OverlayGuard<dyn TextOverlay>,
    image: OverlayGuard<dyn ImageOverlay>,
}

enum PageState {
    Empty,
    Rendering(PendingPage),
    /// Placeholder while `teardown` releases the previous state.
    TearingDown,
    Active(ActivePage),
}

/// Page display state machine bound to one renderer and overlay factory.
pub struct PageLifecycle<R: PageRenderer, F: OverlayFactory> {
    renderer: R,
    factory: F,
    events: Sender<OverlayEvent>,
    text_options: Value,
    scale: f32,
    mode: InteractionMode,
    state: PageState,
}

impl<R: PageRenderer, F: OverlayFactory> PageLifecycle<R, F> {
    pub fn new(
        renderer: R,
        factory: F,
        events: Sender<OverlayEvent>,
        text_options: Value,
        scale: f32,
        mode: InteractionMode,
    ) -> Self {
        Self {
            renderer,
            factory,
            events,
            text_options,
            scale,
            mode,
            state: PageState::Empty,
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self.state {
            PageState::Empty | PageState::TearingDown => LifecyclePhase::Empty,
            PageState::Rendering(_) => LifecyclePhase::Rendering,
            PageState::Active(_) => LifecyclePhase::Active,
        }
    }

    /// Ticket of the page being rendered or displayed.
    pub fn ticket(&self) -> Option<RenderTicket> {
        match &self.state {
            PageState::Rendering(pending) => Some(pending.ticket),
            PageState::Active(active) => Some(active.ticket),
            PageState::Empty | PageState::TearingDown => None,
        }
    }

    /// Page whose overlays are currently live.
    pub fn active_page(&self) -> Option<PageNumber> {
        match &self.state {
            PageState::Active(active) => Some(active.ticket.page),
            _ => None,
        }
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Starts displaying `ticket.page`.
    ///
    /// Tears the previous page down first, then issues the render request.
    /// A ticket for the page already rendering or displayed is a no-op.
    ///
    /// # Errors
    /// - `Render` when the renderer refuses the request; state is `Empty`.
    pub fn begin(&mut self, ticket: RenderTicket) -> Result<(), LifecycleError> {
        if self.ticket().map(|current| current.page) == Some(ticket.page) {
            debug!(
                "event=page_begin module=lifecycle status=skipped page={}",
                ticket.page
            );
            return Ok(());
        }

        self.teardown();
        self.state = PageState::Rendering(PendingPage {
            ticket,
            canvas: None,
            text_layer: None,
        });

        let request = RenderRequest {
            ticket,
            scale: self.scale,
        };
        if let Err(err) = self.renderer.request_render(request) {
            self.state = PageState::Empty;
            warn!(
                "event=page_render module=lifecycle status=error page={} generation={} error={}",
                ticket.page, ticket.generation, err
            );
            return Err(LifecycleError::Render(err));
        }

        info!(
            "event=page_render module=lifecycle status=requested page={} generation={} scale={}",
            ticket.page, ticket.generation, self.scale
        );
        Ok(())
    }

    /// Releases the current page: overlays first, then canvas, then text layer.
    pub fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, PageState::TearingDown) {
            PageState::Empty | PageState::TearingDown => {}
            PageState::Rendering(pending) => {
                if let Some(canvas) = pending.canvas {
                    self.renderer.release_canvas(canvas);
                }
                if let Some(text_layer) = pending.text_layer {
                    self.renderer.clear_text_layer(text_layer);
                }
                debug!(
                    "event=page_teardown module=lifecycle status=ok phase=rendering page={}",
                    pending.ticket.page
                );
            }
            PageState::Active(active) => {
                let ActivePage {
                    ticket,
                    canvas,
                    text_layer,
                    text,
                    image,
                } = active;
                drop(text);
                drop(image);
                self.renderer.release_canvas(canvas);
                self.renderer.clear_text_layer(text_layer);
                info!(
                    "event=page_teardown module=lifecycle status=ok phase=active page={} generation={}",
                    ticket.page,
                    ticket.generation
                );
            }
        }
        self.state = PageState::Empty;
    }

    /// Host report: the page image for `ticket` is drawn on `canvas`.
    pub fn image_drawn<S>(
        &mut self,
        ticket: RenderTicket,
        canvas: SurfaceId,
        store: &S,
    ) -> Result<SignalOutcome, LifecycleError>
    where
        S: AnnotationRepository + ?Sized,
    {
        self.on_signal(ticket, RenderSignal::ImageDrawn(canvas), store)
    }

    /// Host report: the text layer for `ticket` is populated.
    pub fn text_layer_ready<S>(
        &mut self,
        ticket: RenderTicket,
        text_layer: SurfaceId,
        store: &S,
    ) -> Result<SignalOutcome, LifecycleError>
    where
        S: AnnotationRepository + ?Sized,
    {
        self.on_signal(ticket, RenderSignal::TextLayerReady(text_layer), store)
    }

    /// Host report: rendering `ticket` failed.
    ///
    /// # Errors
    /// - `Render` when `ticket` is the in-flight page; state becomes `Empty`.
    ///   Failures of abandoned tickets return `Ok(SignalOutcome::Stale)`.
    pub fn render_failed(
        &mut self,
        ticket: RenderTicket,
        err: RenderError,
    ) -> Result<SignalOutcome, LifecycleError> {
        if !self.is_rendering(ticket) {
            debug!(
                "event=page_render module=lifecycle status=stale_failure page={} generation={}",
                ticket.page, ticket.generation
            );
            return Ok(SignalOutcome::Stale);
        }

        self.teardown();
        error!(
            "event=page_render module=lifecycle status=error page={} generation={} error={}",
            ticket.page, ticket.generation, err
        );
        Err(LifecycleError::Render(err))
    }

    /// Changes the interaction mode without touching overlay instances.
    ///
    /// Returns whether live overlays were reconfigured.
    pub fn set_mode(&mut self, mode: InteractionMode) -> bool {
        self.mode = mode;
        match &mut self.state {
            PageState::Active(active) => {
                apply_mode(&mut *active.text, &mut *active.image, mode);
                debug!(
                    "event=mode_change module=lifecycle status=applied mode={} page={}",
                    mode.as_str(),
                    active.ticket.page
                );
                true
            }
            _ => false,
        }
    }

    /// Mirrors a text-overlay selection into the image overlay.
    ///
    /// Ignored unless `generation` belongs to the live page.
    pub fn mirror_selection(&mut self, generation: u64, annotation: &Annotation) -> bool {
        match &mut self.state {
            PageState::Active(active) if active.ticket.generation == generation => {
                active.image.select_annotation(Some(annotation));
                true
            }
            _ => false,
        }
    }

    /// Pushes a page delta into the live overlays, routed by modality.
    pub fn apply_delta(&mut self, page: PageNumber, delta: &AnnotationDelta) -> bool {
        let PageState::Active(active) = &mut self.state else {
            return false;
        };
        if active.ticket.page != page || delta.is_empty() {
            return false;
        }

        for removed in &delta.removed {
            match modality_of(removed) {
                Modality::Text => active.text.remove_annotation(&removed.id),
                Modality::Image => active.image.remove_annotation(&removed.id),
            }
        }
        for (before, after) in &delta.changed {
            match modality_of(before) {
                Modality::Text => active.text.remove_annotation(&before.id),
                Modality::Image => active.image.remove_annotation(&before.id),
            }
            match modality_of(after) {
                Modality::Text => active.text.add_annotation(after.clone()),
                Modality::Image => active.image.add_annotation(after.clone()),
            }
        }
        for added in &delta.added {
            match modality_of(added) {
                Modality::Text => active.text.add_annotation(added.clone()),
                Modality::Image => active.image.add_annotation(added.clone()),
            }
        }

        debug!(
            "event=overlay_delta module=lifecycle status=applied page={} added={} removed={} changed={}",
            page,
            delta.added.len(),
            delta.removed.len(),
            delta.changed.len()
        );
        true
    }

    fn is_rendering(&self, ticket: RenderTicket) -> bool {
        matches!(&self.state, PageState::Rendering(pending) if pending.ticket == ticket)
    }

    fn canvas_in_use(&self, canvas: SurfaceId) -> bool {
        match &self.state {
            PageState::Rendering(pending) => pending.canvas == Some(canvas),
            PageState::Active(active) => active.canvas == canvas,
            PageState::Empty | PageState::TearingDown => false,
        }
    }

    fn discard(&mut self, ticket: RenderTicket, signal: RenderSignal) {
        // The text-layer container may already be filling for the newer page,
        // even before that page reports it.
        if let RenderSignal::ImageDrawn(canvas) = signal {
            if !self.canvas_in_use(canvas) {
                self.renderer.release_canvas(canvas);
            }
        }
        debug!(
            "event=page_attach module=lifecycle status=stale page={} generation={}",
            ticket.page, ticket.generation
        );
    }

    fn on_signal<S>(
        &mut self,
        ticket: RenderTicket,
        signal: RenderSignal,
        store: &S,
    ) -> Result<SignalOutcome, LifecycleError>
    where
        S: AnnotationRepository + ?Sized,
    {
        if !self.is_rendering(ticket) {
            self.discard(ticket, signal);
            return Ok(SignalOutcome::Stale);
        }

        let PageState::Rendering(pending) = &mut self.state else {
            return Ok(SignalOutcome::Stale);
        };
        let replaced = match signal {
            RenderSignal::ImageDrawn(canvas) => pending
                .canvas
                .replace(canvas)
                .filter(|old| *old != canvas)
                .map(RenderSignal::ImageDrawn),
            RenderSignal::TextLayerReady(text_layer) => pending
                .text_layer
                .replace(text_layer)
                .filter(|old| *old != text_layer)
                .map(RenderSignal::TextLayerReady),
        };
        let ready = pending.canvas.zip(pending.text_layer);

        match replaced {
            Some(RenderSignal::ImageDrawn(old)) => self.renderer.release_canvas(old),
            Some(RenderSignal::TextLayerReady(old)) => self.renderer.clear_text_layer(old),
            None => {}
        }

        let Some((canvas, text_layer)) = ready else {
            return Ok(SignalOutcome::Pending);
        };
        self.state = PageState::Empty;
        self.attach(ticket, canvas, text_layer, store)
    }

    fn attach<S>(
        &mut self,
        ticket: RenderTicket,
        canvas: SurfaceId,
        text_layer: SurfaceId,
        store: &S,
    ) -> Result<SignalOutcome, LifecycleError>
    where
        S: AnnotationRepository + ?Sized,
    {
        let page = ticket.page;
        let Partition { text, image } = classify(store.get_annotations(page));
        let (text_count, image_count) = (text.len(), image.len());

        let text_sink = self.sink(ticket, Modality::Text);
        let mut text_overlay =
            match self
                .factory
                .create_text_overlay(text_layer, &self.text_options, text_sink)
            {
                Ok(overlay) => OverlayGuard::new(overlay),
                Err(source) => {
                    return Err(self.fail_attach(ticket, canvas, text_layer, Modality::Text, source))
                }
            };
        text_overlay.set_annotations(text);

        let image_sink = self.sink(ticket, Modality::Image);
        let mut image_overlay = match self.factory.create_image_overlay(canvas, image_sink) {
            Ok(overlay) => OverlayGuard::new(overlay),
            Err(source) => {
                drop(text_overlay);
                return Err(self.fail_attach(ticket, canvas, text_layer, Modality::Image, source));
            }
        };
        image_overlay.set_annotations(image);

        apply_mode(&mut *text_overlay, &mut *image_overlay, self.mode);
        self.state = PageState::Active(ActivePage {
            ticket,
            canvas,
            text_layer,
            text: text_overlay,
            image: image_overlay,
        });

        info!(
            "event=page_attach module=lifecycle status=ok page={} generation={} text={} image={} mode={}",
            page,
            ticket.generation,
            text_count,
            image_count,
            self.mode.as_str()
        );
        Ok(SignalOutcome::Attached(page))
    }

    fn fail_attach(
        &mut self,
        ticket: RenderTicket,
        canvas: SurfaceId,
        text_layer: SurfaceId,
        modality: Modality,
        source: OverlayError,
    ) -> LifecycleError {
        self.renderer.release_canvas(canvas);
        self.renderer.clear_text_layer(text_layer);
        self.state = PageState::Empty;
        error!(
            "event=page_attach module=lifecycle status=error page={} generation={} overlay={} error={}",
            ticket.page,
            ticket.generation,
            modality.as_str(),
            source
        );
        LifecycleError::OverlayInit {
            page: ticket.page,
            modality,
            source,
        }
    }

    fn sink(&self, ticket: RenderTicket, modality: Modality) -> OverlayEventSink {
        OverlayEventSink::new(
            EventOrigin {
                page: ticket.page,
                generation: ticket.generation,
                modality,
            },
            self.events.clone(),
        )
    }
}

impl<R: PageRenderer, F: OverlayFactory> Drop for PageLifecycle<R, F> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply_mode(text: &mut dyn TextOverlay, image: &mut dyn ImageOverlay, mode: InteractionMode) {
    match mode {
        InteractionMode::Image => image.set_pointer_capture(true),
        InteractionMode::Annotation | InteractionMode::Relations => {
            image.set_pointer_capture(false);
            text.set_mode(mode);
        }
    }
}
