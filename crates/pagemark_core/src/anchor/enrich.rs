//! Target enricher.
//!
//! Applied identically when an annotation enters the store and when it is
//! reported outward, so both sides observe one enriched shape.

use crate::model::annotation::Annotation;
use crate::model::page::PageNumber;
use crate::model::selector::Selector;

/// Returns a copy of `annotation` addressed to `page`.
///
/// Every `TextPositionSelector` gains `page`; other selectors pass through.
/// `target.page` is set as well so image and relationship annotations stay
/// page-addressable. A top-level `page` member is dropped, since it would
/// otherwise disagree with `page` once the annotation moves.
pub fn enrich(annotation: &Annotation, page: PageNumber) -> Annotation {
    let mut enriched = annotation.clone();
    enriched.target.page = Some(page);
    enriched.extra.remove("page");
    for selector in &mut enriched.target.selector {
        if let Selector::TextPosition(position) = selector {
            position.page = Some(page);
        }
    }
    enriched
}
