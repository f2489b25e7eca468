//! Event normalizer.
//!
//! # Responsibility
//! - Funnel create/update/delete events of both overlay engines through one
//!   enrich -> store -> notify pipeline.
//! - Turn text-overlay selections into image-overlay selection requests.
//!
//! # Invariants
//! - Observers receive the same enriched value the store holds.
//! - Observers never learn which overlay produced an event.
//! - Store no-ops (duplicate create, orphan update/delete) are absorbed and
//!   not forwarded.

use crate::anchor::classify::Modality;
use crate::anchor::enrich::enrich;
use crate::model::annotation::{Annotation, AnnotationValidationError};
use crate::overlay::{OverlayEvent, OverlayEventKind};
use crate::repo::annotation_repo::{AnnotationRepository, StoreOutcome};
use log::{debug, warn};

/// Annotation change reported to outside observers.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationEvent {
    Created(Annotation),
    Updated {
        updated: Annotation,
        previous: Annotation,
    },
    Deleted(Annotation),
}

/// Outside listener for normalized annotation changes.
pub trait AnnotationObserver {
    fn notify(&mut self, event: &AnnotationEvent);
}

impl<F> AnnotationObserver for F
where
    F: FnMut(&AnnotationEvent),
{
    fn notify(&mut self, event: &AnnotationEvent) {
        self(event)
    }
}

/// What dispatching one overlay event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Applied(StoreOutcome),
    Rejected(AnnotationValidationError),
    /// Text selection the image overlay of `generation` should mirror.
    MirrorSelection {
        generation: u64,
        annotation: Annotation,
    },
    Ignored,
}

#[derive(Default)]
pub struct EventNormalizer {
    observers: Vec<Box<dyn AnnotationObserver>>,
}

impl EventNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn AnnotationObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Runs one overlay event through the pipeline.
    pub fn dispatch<S>(&mut self, store: &mut S, event: OverlayEvent) -> Dispatch
    where
        S: AnnotationRepository + ?Sized,
    {
        let OverlayEvent { origin, kind } = event;
        let label = kind.as_str();
        let page = origin.page;

        let (outcome, notification) = match kind {
            OverlayEventKind::Created(annotation) => {
                let enriched = enrich(&annotation, page);
                if let Err(err) = enriched.validate() {
                    return self.reject(label, origin.modality, err);
                }
                let outcome = store.create_annotation(enriched.clone());
                (outcome, AnnotationEvent::Created(enriched))
            }
            OverlayEventKind::Updated { updated, previous } => {
                let updated = enrich(&updated, page);
                let previous = enrich(&previous, page);
                if let Err(err) = updated.validate() {
                    return self.reject(label, origin.modality, err);
                }
                let outcome = store.update_annotation(updated.clone(), &previous);
                (outcome, AnnotationEvent::Updated { updated, previous })
            }
            OverlayEventKind::Deleted(annotation) => {
                let enriched = enrich(&annotation, page);
                let outcome = store.delete_annotation(&enriched);
                (outcome, AnnotationEvent::Deleted(enriched))
            }
            OverlayEventKind::Selected(annotation) => {
                return match origin.modality {
                    Modality::Text => Dispatch::MirrorSelection {
                        generation: origin.generation,
                        annotation: enrich(&annotation, page),
                    },
                    Modality::Image => Dispatch::Ignored,
                };
            }
        };

        debug!(
            "event=annotation_{} module=normalizer status={} page={} generation={}",
            label,
            outcome.as_str(),
            page,
            origin.generation
        );
        if outcome.changed() {
            for observer in &mut self.observers {
                observer.notify(&notification);
            }
        }
        Dispatch::Applied(outcome)
    }

    fn reject(
        &self,
        label: &str,
        modality: Modality,
        err: AnnotationValidationError,
    ) -> Dispatch {
        warn!(
            "event=annotation_{} module=normalizer status=rejected overlay={} error={}",
            label,
            modality.as_str(),
            err
        );
        Dispatch::Rejected(err)
    }
}
