//! Overlay event channel.
//!
//! Both engines of a page receive a sink bound to the same page and
//! generation; the tag carries the emitting modality for internal routing
//! only. Outside observers never see which engine produced an event.

use crate::anchor::classify::Modality;
use crate::model::annotation::Annotation;
use crate::model::page::PageNumber;
use log::debug;
use std::sync::mpsc::Sender;

/// Where an overlay event was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventOrigin {
    pub page: PageNumber,
    pub generation: u64,
    pub modality: Modality,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEventKind {
    Created(Annotation),
    Updated {
        updated: Annotation,
        previous: Annotation,
    },
    Deleted(Annotation),
    Selected(Annotation),
}

impl OverlayEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Updated { .. } => "update",
            Self::Deleted(_) => "delete",
            Self::Selected(_) => "select",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEvent {
    pub origin: EventOrigin,
    pub kind: OverlayEventKind,
}

/// Handle an overlay engine reports create/update/delete/select through.
#[derive(Debug, Clone)]
pub struct OverlayEventSink {
    origin: EventOrigin,
    sender: Sender<OverlayEvent>,
}

impl OverlayEventSink {
    pub fn new(origin: EventOrigin, sender: Sender<OverlayEvent>) -> Self {
        Self { origin, sender }
    }

    pub fn origin(&self) -> EventOrigin {
        self.origin
    }

    pub fn created(&self, annotation: Annotation) {
        self.emit(OverlayEventKind::Created(annotation));
    }

    /// Reports an edit; engines pass both the new and the previous value.
    pub fn updated(&self, updated: Annotation, previous: Annotation) {
        self.emit(OverlayEventKind::Updated { updated, previous });
    }

    pub fn deleted(&self, annotation: Annotation) {
        self.emit(OverlayEventKind::Deleted(annotation));
    }

    pub fn selected(&self, annotation: Annotation) {
        self.emit(OverlayEventKind::Selected(annotation));
    }

    fn emit(&self, kind: OverlayEventKind) {
        let label = kind.as_str();
        let event = OverlayEvent {
            origin: self.origin,
            kind,
        };
        if self.sender.send(event).is_err() {
            debug!(
                "event=overlay_event module=overlay status=dropped kind={} page={} generation={}",
                label, self.origin.page, self.origin.generation
            );
        }
    }
}
