//! Annotation store contract.

use crate::model::annotation::Annotation;
use crate::model::page::PageNumber;

/// Result of one store mutation.
///
/// None of these are errors; no-op variants record expected races between
/// overlay-local state and the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted(PageNumber),
    /// Create for an id that already exists; nothing changed.
    Duplicate(PageNumber),
    Replaced(PageNumber),
    Moved { from: PageNumber, to: PageNumber },
    Removed(PageNumber),
    /// Update/delete for an annotation the store does not hold.
    Orphan,
    /// Create for an annotation without any resolvable page.
    Unplaced,
}

impl StoreOutcome {
    /// Whether the store contents changed.
    pub fn changed(self) -> bool {
        matches!(
            self,
            Self::Inserted(_) | Self::Replaced(_) | Self::Moved { .. } | Self::Removed(_)
        )
    }

    /// Stable label used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inserted(_) => "inserted",
            Self::Duplicate(_) => "duplicate",
            Self::Replaced(_) => "replaced",
            Self::Moved { .. } => "moved",
            Self::Removed(_) => "removed",
            Self::Orphan => "orphan",
            Self::Unplaced => "unplaced",
        }
    }
}

/// Store interface for page-scoped annotation collections.
pub trait AnnotationRepository {
    /// Replaces the whole store contents.
    fn set_annotations(&mut self, all: Vec<Annotation>);
    /// Returns the annotations of one page in insertion order.
    fn get_annotations(&self, page: PageNumber) -> Vec<Annotation>;
    fn create_annotation(&mut self, annotation: Annotation) -> StoreOutcome;
    fn update_annotation(&mut self, updated: Annotation, previous: &Annotation) -> StoreOutcome;
    fn delete_annotation(&mut self, annotation: &Annotation) -> StoreOutcome;
    /// Drops every annotation, placed or not.
    fn clear(&mut self);
}
