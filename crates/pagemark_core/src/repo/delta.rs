//! Page-level annotation diff.
//!
//! Used when a bulk reload lands while a page is displayed: only the
//! difference between the page's old and new contents is pushed to the live
//! overlays instead of resetting them.

use crate::model::annotation::{Annotation, AnnotationId};
use std::collections::HashMap;

/// Changes between two snapshots of one page, matched by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationDelta {
    pub added: Vec<Annotation>,
    pub removed: Vec<Annotation>,
    /// `(before, after)` pairs whose contents differ.
    pub changed: Vec<(Annotation, Annotation)>,
}

impl AnnotationDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Computes the delta from `before` to `after`.
///
/// Output lists follow the order of the snapshot they come from.
pub fn diff_annotations(before: &[Annotation], after: &[Annotation]) -> AnnotationDelta {
    let previous: HashMap<&AnnotationId, &Annotation> =
        before.iter().map(|annotation| (&annotation.id, annotation)).collect();
    let next: HashMap<&AnnotationId, &Annotation> =
        after.iter().map(|annotation| (&annotation.id, annotation)).collect();

    let mut delta = AnnotationDelta::default();
    for annotation in after {
        match previous.get(&annotation.id) {
            None => delta.added.push(annotation.clone()),
            Some(old) if *old != annotation => {
                delta.changed.push(((*old).clone(), annotation.clone()));
            }
            Some(_) => {}
        }
    }
    delta.removed = before
        .iter()
        .filter(|annotation| !next.contains_key(&annotation.id))
        .cloned()
        .collect();
    delta
}
