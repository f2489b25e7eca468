//! Viewer session facade.
//!
//! # Responsibility
//! - Give hosts one entry point for navigation, render completions, modes,
//!   bulk loads and observer subscriptions.
//! - Drain overlay events into the store between host calls.
//!
//! # Invariants
//! - Pending overlay events are drained before any page transition or bulk
//!   load, so edits made on a page reach the store before it is torn down.
//! - A navigation whose render or overlay init failed leaves no current
//!   page; requesting the same page again retries it.

use crate::config::{ConfigError, ViewerConfig};
use crate::model::annotation::Annotation;
use crate::model::page::PageNumber;
use crate::overlay::{InteractionMode, OverlayEvent, OverlayFactory};
use crate::render::{PageRenderer, RenderError, RenderTicket, SurfaceId};
use crate::repo::annotation_repo::AnnotationRepository;
use crate::repo::delta::{diff_annotations, AnnotationDelta};
use crate::repo::memory_store::MemoryAnnotationStore;
use crate::service::lifecycle::{LifecycleError, LifecyclePhase, PageLifecycle, SignalOutcome};
use crate::service::navigator::{DocumentNavigator, NavigationError};
use crate::service::normalizer::{AnnotationObserver, Dispatch, EventNormalizer};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver};

/// Errors surfaced by session operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerError {
    Navigation(NavigationError),
    Lifecycle(LifecycleError),
    Config(ConfigError),
}

impl Display for ViewerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Navigation(err) => write!(f, "{err}"),
            Self::Lifecycle(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ViewerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Navigation(err) => Some(err),
            Self::Lifecycle(err) => Some(err),
            Self::Config(err) => Some(err),
        }
    }
}

impl From<NavigationError> for ViewerError {
    fn from(value: NavigationError) -> Self {
        Self::Navigation(value)
    }
}

impl From<LifecycleError> for ViewerError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<ConfigError> for ViewerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// One open document view with its annotation layer.
pub struct ViewerSession<R, F, S = MemoryAnnotationStore>
where
    R: PageRenderer,
    F: OverlayFactory,
    S: AnnotationRepository,
{
    lifecycle: PageLifecycle<R, F>,
    navigator: DocumentNavigator,
    store: S,
    normalizer: EventNormalizer,
    events: Receiver<OverlayEvent>,
}

impl<R: PageRenderer, F: OverlayFactory> ViewerSession<R, F, MemoryAnnotationStore> {
    /// Creates a session backed by an empty in-memory store.
    pub fn new(renderer: R, factory: F, config: ViewerConfig) -> Result<Self, ConfigError> {
        Self::with_store(renderer, factory, MemoryAnnotationStore::new(), config)
    }
}

impl<R, F, S> ViewerSession<R, F, S>
where
    R: PageRenderer,
    F: OverlayFactory,
    S: AnnotationRepository,
{
    /// Creates a session over a caller-provided store.
    ///
    /// # Errors
    /// - Returns `ConfigError` when `config` fails validation.
    pub fn with_store(
        renderer: R,
        factory: F,
        store: S,
        config: ViewerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (sender, events) = mpsc::channel();
        let lifecycle = PageLifecycle::new(
            renderer,
            factory,
            sender,
            config.text_overlay,
            config.scale,
            config.initial_mode,
        );
        info!(
            "event=session_init module=session status=ok scale={} mode={}",
            config.scale,
            config.initial_mode.as_str()
        );
        Ok(Self {
            lifecycle,
            navigator: DocumentNavigator::new(),
            store,
            normalizer: EventNormalizer::new(),
            events,
        })
    }

    /// Opens a document with `page_count` pages and starts rendering page 1.
    ///
    /// Any previously displayed page is torn down first.
    pub fn open(&mut self, page_count: u32) -> Result<RenderTicket, ViewerError> {
        self.pump_events();
        self.lifecycle.teardown();
        let ticket = self.navigator.open(page_count)?;
        info!(
            "event=document_open module=session status=ok pages={}",
            page_count
        );
        self.start(ticket)?;
        Ok(ticket)
    }

    /// Requests an explicit page. `Ok(None)` when it is already current.
    pub fn go_to(&mut self, page: u32) -> Result<Option<RenderTicket>, ViewerError> {
        self.pump_events();
        let ticket = self.navigator.go_to(page)?;
        self.start_optional(ticket)
    }

    /// Jumps back to page 1.
    pub fn first_page(&mut self) -> Result<Option<RenderTicket>, ViewerError> {
        self.pump_events();
        let ticket = self.navigator.first()?;
        self.start_optional(ticket)
    }

    /// Requests the next page; stays put on the last page.
    pub fn next_page(&mut self) -> Result<Option<RenderTicket>, ViewerError> {
        self.pump_events();
        let ticket = self.navigator.next()?;
        self.start_optional(ticket)
    }

    /// Requests the previous page; stays put on the first page.
    pub fn previous_page(&mut self) -> Result<Option<RenderTicket>, ViewerError> {
        self.pump_events();
        let ticket = self.navigator.previous()?;
        self.start_optional(ticket)
    }

    /// Host report: the page image of `ticket` is drawn on `canvas`.
    pub fn image_drawn(
        &mut self,
        ticket: RenderTicket,
        canvas: SurfaceId,
    ) -> Result<SignalOutcome, ViewerError> {
        self.pump_events();
        let outcome = self.lifecycle.image_drawn(ticket, canvas, &self.store);
        self.settle(ticket, outcome)
    }

    /// Host report: the text layer of `ticket` is populated in `text_layer`.
    pub fn text_layer_ready(
        &mut self,
        ticket: RenderTicket,
        text_layer: SurfaceId,
    ) -> Result<SignalOutcome, ViewerError> {
        self.pump_events();
        let outcome = self.lifecycle.text_layer_ready(ticket, text_layer, &self.store);
        self.settle(ticket, outcome)
    }

    /// Host report: rendering `ticket` failed.
    pub fn render_failed(
        &mut self,
        ticket: RenderTicket,
        err: RenderError,
    ) -> Result<SignalOutcome, ViewerError> {
        let outcome = self.lifecycle.render_failed(ticket, err);
        self.settle(ticket, outcome)
    }

    /// Changes the interaction mode. Returns whether live overlays changed.
    pub fn set_mode(&mut self, mode: InteractionMode) -> bool {
        self.lifecycle.set_mode(mode)
    }

    /// `ANNOTATION` -> `RELATIONS`; any other mode -> `ANNOTATION`.
    pub fn toggle_relations_mode(&mut self) -> InteractionMode {
        let next = match self.lifecycle.mode() {
            InteractionMode::Annotation => InteractionMode::Relations,
            InteractionMode::Relations | InteractionMode::Image => InteractionMode::Annotation,
        };
        self.set_mode(next);
        next
    }

    pub fn mode(&self) -> InteractionMode {
        self.lifecycle.mode()
    }

    /// Replaces the whole store and pushes the displayed page's difference
    /// into its live overlays.
    ///
    /// Returns the delta applied to the displayed page (empty when no page is
    /// displayed or nothing on it changed).
    pub fn load_annotations(&mut self, all: Vec<Annotation>) -> AnnotationDelta {
        self.pump_events();
        let active = self.lifecycle.active_page();
        let before = active
            .map(|page| self.store.get_annotations(page))
            .unwrap_or_default();

        let total = all.len();
        self.store.set_annotations(all);

        let Some(page) = active else {
            info!(
                "event=annotations_load module=session status=ok total={} active_page=none",
                total
            );
            return AnnotationDelta::default();
        };
        let delta = diff_annotations(&before, &self.store.get_annotations(page));
        self.lifecycle.apply_delta(page, &delta);
        info!(
            "event=annotations_load module=session status=ok total={} active_page={} added={} removed={} changed={}",
            total,
            page,
            delta.added.len(),
            delta.removed.len(),
            delta.changed.len()
        );
        delta
    }

    /// Drains queued overlay events through the normalizer.
    ///
    /// Returns the number of events processed.
    pub fn pump_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.events.try_recv() {
            processed += 1;
            match self.normalizer.dispatch(&mut self.store, event) {
                Dispatch::MirrorSelection {
                    generation,
                    annotation,
                } => {
                    if !self.lifecycle.mirror_selection(generation, &annotation) {
                        debug!(
                            "event=selection_mirror module=session status=stale generation={}",
                            generation
                        );
                    }
                }
                Dispatch::Applied(_) | Dispatch::Rejected(_) | Dispatch::Ignored => {}
            }
        }
        processed
    }

    /// Registers an observer for normalized create/update/delete events.
    pub fn subscribe(&mut self, observer: impl AnnotationObserver + 'static) {
        self.normalizer.subscribe(Box::new(observer));
    }

    /// Store contents of `page`, after draining pending events.
    pub fn annotations_on(&mut self, page: PageNumber) -> Vec<Annotation> {
        self.pump_events();
        self.store.get_annotations(page)
    }

    pub fn current_page(&self) -> Option<PageNumber> {
        self.navigator.current()
    }

    pub fn page_count(&self) -> u32 {
        self.navigator.page_count()
    }

    pub fn position_label(&self) -> String {
        self.navigator.position_label()
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    pub fn active_page(&self) -> Option<PageNumber> {
        self.lifecycle.active_page()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn renderer(&self) -> &R {
        self.lifecycle.renderer()
    }

    pub fn factory(&self) -> &F {
        self.lifecycle.factory()
    }

    /// Releases the displayed page and forgets the document's annotations.
    ///
    /// Pending overlay events are still delivered to observers first.
    /// `open` may be called again afterwards.
    pub fn close(&mut self) {
        self.pump_events();
        self.lifecycle.teardown();
        self.navigator.close();
        self.store.clear();
        info!("event=document_close module=session status=ok");
    }

    fn start_optional(
        &mut self,
        ticket: Option<RenderTicket>,
    ) -> Result<Option<RenderTicket>, ViewerError> {
        match ticket {
            Some(ticket) => {
                self.start(ticket)?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    fn start(&mut self, ticket: RenderTicket) -> Result<(), ViewerError> {
        if let Err(err) = self.lifecycle.begin(ticket) {
            self.navigator.forget(ticket);
            return Err(err.into());
        }
        Ok(())
    }

    fn settle(
        &mut self,
        ticket: RenderTicket,
        outcome: Result<SignalOutcome, LifecycleError>,
    ) -> Result<SignalOutcome, ViewerError> {
        outcome.map_err(|err| {
            self.navigator.forget(ticket);
            ViewerError::from(err)
        })
    }
}
