//! Page addressing.
//!
//! # Invariants
//! - Page numbers are 1-based; `0` is rejected at construction and on decode.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::NonZeroU32;

/// 1-based page number inside one paginated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    /// First page of every document.
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    pub fn new(value: u32) -> Result<Self, PageNumberError> {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(PageNumberError::Zero)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns the following page, or `None` on `u32` overflow.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Returns the preceding page, or `None` on the first page.
    pub fn previous(self) -> Option<Self> {
        NonZeroU32::new(self.get() - 1).map(Self)
    }
}

impl TryFrom<u32> for PageNumber {
    type Error = PageNumberError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageNumber> for u32 {
    fn from(value: PageNumber) -> Self {
        value.get()
    }
}

impl Display for PageNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page number construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumberError {
    Zero,
}

impl Display for PageNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => write!(f, "page numbers are 1-based; got 0"),
        }
    }
}

impl Error for PageNumberError {}

#[cfg(test)]
mod tests {
    use super::{PageNumber, PageNumberError};

    #[test]
    fn rejects_zero() {
        assert_eq!(PageNumber::new(0).unwrap_err(), PageNumberError::Zero);
    }

    #[test]
    fn steps_between_neighbours() {
        let first = PageNumber::FIRST;
        assert_eq!(first.get(), 1);
        assert_eq!(first.previous(), None);

        let second = first.next().expect("page 2");
        assert_eq!(second.get(), 2);
        assert_eq!(second.previous(), Some(first));
    }

    #[test]
    fn decodes_from_plain_integer() {
        let page: PageNumber = serde_json::from_value(serde_json::json!(7)).unwrap();
        assert_eq!(page.get(), 7);
        assert!(serde_json::from_value::<PageNumber>(serde_json::json!(0)).is_err());
    }
}
