#![allow(dead_code)]

use pagemark_core::overlay::EventOrigin;
use pagemark_core::{
    Annotation, AnnotationId, ImageOverlay, InteractionMode, Modality, OverlayEngine,
    OverlayError, OverlayEventSink, OverlayFactory, PageNumber, PageRenderer, RenderError,
    RenderRequest, RenderTicket, SignalOutcome, SurfaceId, TextOverlay, ViewerConfig,
    ViewerSession,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Text-layer container reused by every page, like a single DOM node.
pub const TEXT_LAYER: SurfaceId = SurfaceId::new(1);

pub fn canvas_for(ticket: RenderTicket) -> SurfaceId {
    SurfaceId::new(1_000 + ticket.generation)
}

pub fn page(value: u32) -> PageNumber {
    PageNumber::new(value).unwrap()
}

#[derive(Debug)]
pub struct OverlayRecord {
    pub origin: EventOrigin,
    pub surface: SurfaceId,
    pub sink: OverlayEventSink,
    pub options: Option<Value>,
    pub annotations: Vec<Annotation>,
    pub mode: Option<InteractionMode>,
    pub pointer_capture: Option<bool>,
    pub selected: Option<AnnotationId>,
    pub destroyed: bool,
}

impl OverlayRecord {
    pub fn ids(&self) -> Vec<&str> {
        self.annotations.iter().map(|a| a.id.as_str()).collect()
    }
}

/// Everything the fake host records, shared with the test body.
#[derive(Debug, Default)]
pub struct HostState {
    pub journal: Vec<String>,
    pub requests: Vec<RenderRequest>,
    pub fail_render: Option<RenderError>,
    pub fail_text: Option<OverlayError>,
    pub fail_image: Option<OverlayError>,
    pub overlays: Vec<OverlayRecord>,
}

pub type Host = Rc<RefCell<HostState>>;

pub fn host() -> Host {
    Rc::new(RefCell::new(HostState::default()))
}

pub struct FakeRenderer {
    host: Host,
}

impl PageRenderer for FakeRenderer {
    fn request_render(&mut self, request: RenderRequest) -> Result<(), RenderError> {
        let mut host = self.host.borrow_mut();
        if let Some(err) = host.fail_render.take() {
            return Err(err);
        }
        host.journal.push(format!("render p{}", request.ticket.page));
        host.requests.push(request);
        Ok(())
    }

    fn release_canvas(&mut self, canvas: SurfaceId) {
        self.host
            .borrow_mut()
            .journal
            .push(format!("release canvas {}", canvas.get()));
    }

    fn clear_text_layer(&mut self, text_layer: SurfaceId) {
        self.host
            .borrow_mut()
            .journal
            .push(format!("clear text_layer {}", text_layer.get()));
    }
}

struct FakeOverlay {
    host: Host,
    index: usize,
}

impl FakeOverlay {
    fn with_record(&self, f: impl FnOnce(&mut OverlayRecord)) {
        let mut host = self.host.borrow_mut();
        f(&mut host.overlays[self.index]);
    }
}

impl OverlayEngine for FakeOverlay {
    fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        self.with_record(|record| record.annotations = annotations);
    }

    fn add_annotation(&mut self, annotation: Annotation) {
        self.with_record(|record| record.annotations.push(annotation));
    }

    fn remove_annotation(&mut self, id: &AnnotationId) {
        self.with_record(|record| record.annotations.retain(|a| &a.id != id));
    }

    fn destroy(&mut self) {
        let mut host = self.host.borrow_mut();
        let record = &mut host.overlays[self.index];
        record.destroyed = true;
        let entry = format!(
            "destroy {} p{}",
            record.origin.modality.as_str(),
            record.origin.page
        );
        host.journal.push(entry);
    }
}

impl TextOverlay for FakeOverlay {
    fn set_mode(&mut self, mode: InteractionMode) {
        self.with_record(|record| record.mode = Some(mode));
    }
}

impl ImageOverlay for FakeOverlay {
    fn select_annotation(&mut self, annotation: Option<&Annotation>) {
        let id = annotation.map(|a| a.id.clone());
        self.with_record(|record| record.selected = id);
    }

    fn set_pointer_capture(&mut self, exclusive: bool) {
        self.with_record(|record| record.pointer_capture = Some(exclusive));
    }
}

pub struct FakeOverlayFactory {
    host: Host,
}

impl FakeOverlayFactory {
    fn build(
        &self,
        surface: SurfaceId,
        options: Option<&Value>,
        sink: OverlayEventSink,
    ) -> FakeOverlay {
        let mut host = self.host.borrow_mut();
        let origin = sink.origin();
        host.journal.push(format!(
            "create {} p{}",
            origin.modality.as_str(),
            origin.page
        ));
        host.overlays.push(OverlayRecord {
            origin,
            surface,
            sink,
            options: options.cloned(),
            annotations: Vec::new(),
            mode: None,
            pointer_capture: None,
            selected: None,
            destroyed: false,
        });
        FakeOverlay {
            host: Rc::clone(&self.host),
            index: host.overlays.len() - 1,
        }
    }
}

impl OverlayFactory for FakeOverlayFactory {
    fn create_text_overlay(
        &mut self,
        text_layer: SurfaceId,
        options: &Value,
        sink: OverlayEventSink,
    ) -> Result<Box<dyn TextOverlay>, OverlayError> {
        if let Some(err) = self.host.borrow_mut().fail_text.take() {
            return Err(err);
        }
        Ok(Box::new(self.build(text_layer, Some(options), sink)))
    }

    fn create_image_overlay(
        &mut self,
        canvas: SurfaceId,
        sink: OverlayEventSink,
    ) -> Result<Box<dyn ImageOverlay>, OverlayError> {
        if let Some(err) = self.host.borrow_mut().fail_image.take() {
            return Err(err);
        }
        Ok(Box::new(self.build(canvas, None, sink)))
    }
}

pub type TestSession = ViewerSession<FakeRenderer, FakeOverlayFactory>;

pub fn session_with(host: &Host, config: ViewerConfig) -> TestSession {
    ViewerSession::new(
        FakeRenderer {
            host: Rc::clone(host),
        },
        FakeOverlayFactory {
            host: Rc::clone(host),
        },
        config,
    )
    .unwrap()
}

pub fn session(host: &Host) -> TestSession {
    session_with(host, ViewerConfig::default())
}

/// Reports both render completions for `ticket`.
pub fn finish_render(session: &mut TestSession, ticket: RenderTicket) -> SignalOutcome {
    let first = session.image_drawn(ticket, canvas_for(ticket)).unwrap();
    assert_eq!(first, SignalOutcome::Pending);
    session.text_layer_ready(ticket, TEXT_LAYER).unwrap()
}

/// Opens `page_count` pages and fully renders page 1.
pub fn open_rendered(host: &Host, page_count: u32) -> (TestSession, RenderTicket) {
    let mut session = session(host);
    let ticket = session.open(page_count).unwrap();
    assert_eq!(finish_render(&mut session, ticket), SignalOutcome::Attached(page(1)));
    (session, ticket)
}

/// Index of the live (not destroyed) overlay of `modality`.
pub fn live(host: &Host, modality: Modality) -> usize {
    host.borrow()
        .overlays
        .iter()
        .rposition(|record| record.origin.modality == modality && !record.destroyed)
        .unwrap()
}

pub fn live_sink(host: &Host, modality: Modality) -> OverlayEventSink {
    let index = live(host, modality);
    host.borrow().overlays[index].sink.clone()
}

pub fn live_ids(host: &Host, modality: Modality) -> Vec<String> {
    let index = live(host, modality);
    host.borrow().overlays[index]
        .ids()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Annotation already stamped with page `on`.
pub fn placed(id: &str, selector: pagemark_core::Selector, on: u32) -> Annotation {
    pagemark_core::enrich(&Annotation::new(id, vec![selector]), page(on))
}
