//! Document navigator.
//!
//! # Responsibility
//! - Track the requested page and the document page count.
//! - Issue one `RenderTicket` per navigation, with a fresh generation.
//!
//! # Invariants
//! - Requested pages stay within `1..=page_count`.
//! - Requesting the page that is already current issues no ticket.
//! - `generation` never decreases, even across `close`/`open`.

use crate::model::page::PageNumber;
use crate::render::RenderTicket;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Navigation request errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationError {
    /// No document is open.
    NoDocument,
    /// Document has zero pages.
    EmptyDocument,
    /// Explicit request outside `1..=page_count`.
    OutOfRange { requested: u32, page_count: u32 },
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDocument => write!(f, "no document is open"),
            Self::EmptyDocument => write!(f, "document has no pages"),
            Self::OutOfRange {
                requested,
                page_count,
            } => write!(
                f,
                "page {requested} is out of range; document has {page_count} pages"
            ),
        }
    }
}

impl Error for NavigationError {}

#[derive(Debug, Default)]
pub struct DocumentNavigator {
    page_count: u32,
    current: Option<PageNumber>,
    generation: u64,
}

impl DocumentNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a document and requests its first page.
    pub fn open(&mut self, page_count: u32) -> Result<RenderTicket, NavigationError> {
        if page_count == 0 {
            return Err(NavigationError::EmptyDocument);
        }
        self.page_count = page_count;
        self.current = None;
        Ok(self.issue(PageNumber::FIRST))
    }

    /// Forgets the open document; later requests fail with `NoDocument`.
    pub fn close(&mut self) {
        self.page_count = 0;
        self.current = None;
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Most recently requested page.
    pub fn current(&self) -> Option<PageNumber> {
        self.current
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `ticket` is the latest navigation.
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        ticket.generation == self.generation && self.current == Some(ticket.page)
    }

    /// Requests an explicit page.
    ///
    /// Returns `Ok(None)` when `page` is already current.
    pub fn go_to(&mut self, page: u32) -> Result<Option<RenderTicket>, NavigationError> {
        self.ensure_open()?;
        let target = PageNumber::new(page)
            .ok()
            .filter(|target| target.get() <= self.page_count)
            .ok_or(NavigationError::OutOfRange {
                requested: page,
                page_count: self.page_count,
            })?;
        Ok(self.request(target))
    }

    /// Requests page 1.
    pub fn first(&mut self) -> Result<Option<RenderTicket>, NavigationError> {
        self.ensure_open()?;
        Ok(self.request(PageNumber::FIRST))
    }

    /// Requests the following page, staying on the last one.
    pub fn next(&mut self) -> Result<Option<RenderTicket>, NavigationError> {
        self.ensure_open()?;
        let target = match self.current {
            Some(current) => current
                .next()
                .filter(|next| next.get() <= self.page_count)
                .unwrap_or(current),
            None => PageNumber::FIRST,
        };
        Ok(self.request(target))
    }

    /// Requests the preceding page, staying on the first one.
    pub fn previous(&mut self) -> Result<Option<RenderTicket>, NavigationError> {
        self.ensure_open()?;
        let target = self
            .current
            .and_then(PageNumber::previous)
            .or(self.current)
            .unwrap_or(PageNumber::FIRST);
        Ok(self.request(target))
    }

    /// Drops `ticket`'s page as current after its render failed, so the same
    /// page can be requested again.
    pub fn forget(&mut self, ticket: RenderTicket) {
        if self.is_current(ticket) {
            self.current = None;
        }
    }

    /// `"{current} / {page_count}"`, with `-` while nothing is requested.
    pub fn position_label(&self) -> String {
        match self.current {
            Some(page) => format!("{page} / {}", self.page_count),
            None => format!("- / {}", self.page_count),
        }
    }

    fn ensure_open(&self) -> Result<(), NavigationError> {
        if self.page_count == 0 {
            return Err(NavigationError::NoDocument);
        }
        Ok(())
    }

    fn request(&mut self, target: PageNumber) -> Option<RenderTicket> {
        if self.current == Some(target) {
            return None;
        }
        Some(self.issue(target))
    }

    fn issue(&mut self, page: PageNumber) -> RenderTicket {
        self.generation += 1;
        self.current = Some(page);
        RenderTicket {
            page,
            generation: self.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentNavigator, NavigationError};

    #[test]
    fn requires_open_document() {
        let mut navigator = DocumentNavigator::new();
        assert_eq!(navigator.next().unwrap_err(), NavigationError::NoDocument);
        assert_eq!(
            navigator.open(0).unwrap_err(),
            NavigationError::EmptyDocument
        );
    }

    #[test]
    fn clamps_to_document_bounds() {
        let mut navigator = DocumentNavigator::new();
        let first = navigator.open(2).expect("open");
        assert_eq!(first.page.get(), 1);

        assert!(navigator.previous().expect("previous").is_none());
        let second = navigator.next().expect("next").expect("ticket");
        assert_eq!(second.page.get(), 2);
        assert!(navigator.next().expect("next at end").is_none());
        assert_eq!(navigator.position_label(), "2 / 2");

        let back = navigator.first().expect("first").expect("ticket");
        assert_eq!(back.page.get(), 1);
    }

    #[test]
    fn rejects_out_of_range_and_zero() {
        let mut navigator = DocumentNavigator::new();
        navigator.open(3).expect("open");
        assert_eq!(
            navigator.go_to(4).unwrap_err(),
            NavigationError::OutOfRange {
                requested: 4,
                page_count: 3
            }
        );
        assert!(navigator.go_to(0).is_err());
    }

    #[test]
    fn same_page_is_noop_and_generations_grow() {
        let mut navigator = DocumentNavigator::new();
        let first = navigator.open(5).expect("open");
        assert!(navigator.go_to(1).expect("same page").is_none());

        let third = navigator.go_to(3).expect("go_to").expect("ticket");
        assert!(third.generation > first.generation);
        assert!(navigator.is_current(third));
        assert!(!navigator.is_current(first));
    }

    #[test]
    fn forget_allows_retrying_failed_page() {
        let mut navigator = DocumentNavigator::new();
        let ticket = navigator.open(2).expect("open");
        navigator.forget(ticket);
        assert_eq!(navigator.position_label(), "- / 2");
        assert!(navigator.go_to(1).expect("retry").is_some());
    }
}
