//! In-process annotation store.
//!
//! # Responsibility
//! - Own the authoritative annotation set for one document session.
//! - Answer per-page queries in stable insertion order.
//!
//! # Invariants
//! - `index` maps every placed id to the page list holding it.
//! - Empty page lists are dropped, so `pages()` only yields populated pages.
//! - Unplaced annotations are kept aside and never returned by page queries.
//! - Placed annotations are held enriched for their page, bulk loads included.

use crate::anchor::enrich::enrich;
use crate::model::annotation::{Annotation, AnnotationId};
use crate::model::page::PageNumber;
use crate::repo::annotation_repo::{AnnotationRepository, StoreOutcome};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Page-indexed in-memory store.
#[derive(Debug, Default)]
pub struct MemoryAnnotationStore {
    pages: BTreeMap<PageNumber, Vec<Annotation>>,
    index: HashMap<AnnotationId, PageNumber>,
    unplaced: Vec<Annotation>,
}

impl MemoryAnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of placed annotations.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.unplaced.is_empty()
    }

    /// Annotations from the last bulk load that carried no page.
    pub fn unplaced(&self) -> &[Annotation] {
        &self.unplaced
    }

    /// Pages holding at least one annotation, ascending.
    pub fn pages(&self) -> impl Iterator<Item = PageNumber> + '_ {
        self.pages.keys().copied()
    }

    pub fn page_of(&self, id: &AnnotationId) -> Option<PageNumber> {
        self.index.get(id).copied()
    }

    fn insert(&mut self, page: PageNumber, annotation: Annotation) {
        self.index.insert(annotation.id.clone(), page);
        self.pages.entry(page).or_default().push(annotation);
    }

    fn take(&mut self, page: PageNumber, position: usize) -> Option<Annotation> {
        let list = self.pages.get_mut(&page)?;
        if position >= list.len() {
            return None;
        }
        let removed = list.remove(position);
        if list.is_empty() {
            self.pages.remove(&page);
        }
        self.index.remove(&removed.id);
        Some(removed)
    }

    fn id_at(&self, page: PageNumber, position: usize) -> Option<&AnnotationId> {
        self.pages
            .get(&page)
            .and_then(|list| list.get(position))
            .map(|annotation| &annotation.id)
    }

    /// Finds `previous` by id, falling back to an exact target + body match.
    fn locate(&self, previous: &Annotation) -> Option<(PageNumber, usize)> {
        if let Some(&page) = self.index.get(&previous.id) {
            let position = self
                .pages
                .get(&page)?
                .iter()
                .position(|annotation| annotation.id == previous.id)?;
            return Some((page, position));
        }

        let same_shape = |annotation: &Annotation| {
            annotation.target == previous.target && annotation.body == previous.body
        };
        match previous.resolved_page() {
            Some(page) => {
                let position = self.pages.get(&page)?.iter().position(same_shape)?;
                Some((page, position))
            }
            None => self.pages.iter().find_map(|(page, list)| {
                list.iter().position(same_shape).map(|position| (*page, position))
            }),
        }
    }
}

impl AnnotationRepository for MemoryAnnotationStore {
    fn set_annotations(&mut self, all: Vec<Annotation>) {
        self.clear();
        let mut duplicates = 0usize;
        for annotation in all {
            match annotation.resolved_page() {
                Some(_) if self.index.contains_key(&annotation.id) => duplicates += 1,
                Some(page) => self.insert(page, enrich(&annotation, page)),
                None => self.unplaced.push(annotation),
            }
        }
        debug!(
            "event=store_bulk_load module=repo status=ok placed={} unplaced={} duplicates={} pages={}",
            self.index.len(),
            self.unplaced.len(),
            duplicates,
            self.pages.len()
        );
    }

    fn get_annotations(&self, page: PageNumber) -> Vec<Annotation> {
        self.pages.get(&page).cloned().unwrap_or_default()
    }

    fn create_annotation(&mut self, annotation: Annotation) -> StoreOutcome {
        let Some(page) = annotation.resolved_page() else {
            return StoreOutcome::Unplaced;
        };
        if let Some(&existing) = self.index.get(&annotation.id) {
            return StoreOutcome::Duplicate(existing);
        }

        self.unplaced.retain(|candidate| candidate.id != annotation.id);
        self.insert(page, annotation);
        StoreOutcome::Inserted(page)
    }

    fn update_annotation(&mut self, updated: Annotation, previous: &Annotation) -> StoreOutcome {
        let Some((from, position)) = self.locate(previous) else {
            return StoreOutcome::Orphan;
        };

        if self.id_at(from, position) != Some(&updated.id) {
            if let Some(&holder) = self.index.get(&updated.id) {
                return StoreOutcome::Duplicate(holder);
            }
        }

        let to = updated.resolved_page().unwrap_or(from);
        if to == from {
            let Some(slot) = self
                .pages
                .get_mut(&from)
                .and_then(|list| list.get_mut(position))
            else {
                return StoreOutcome::Orphan;
            };
            let replaced = std::mem::replace(slot, updated);
            self.index.remove(&replaced.id);
            self.index.insert(slot.id.clone(), from);
            return StoreOutcome::Replaced(from);
        }

        if self.take(from, position).is_none() {
            return StoreOutcome::Orphan;
        }
        self.insert(to, updated);
        StoreOutcome::Moved { from, to }
    }

    fn delete_annotation(&mut self, annotation: &Annotation) -> StoreOutcome {
        let Some(&page) = self.index.get(&annotation.id) else {
            return StoreOutcome::Orphan;
        };
        let position = self
            .pages
            .get(&page)
            .and_then(|list| list.iter().position(|stored| stored.id == annotation.id));

        match position.and_then(|position| self.take(page, position)) {
            Some(_) => StoreOutcome::Removed(page),
            None => {
                self.index.remove(&annotation.id);
                StoreOutcome::Orphan
            }
        }
    }

    fn clear(&mut self) {
        self.pages.clear();
        self.index.clear();
        self.unplaced.clear();
    }
}
