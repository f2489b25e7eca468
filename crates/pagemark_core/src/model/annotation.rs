//! Annotation domain model.
//!
//! # Responsibility
//! - Define the canonical annotation record exchanged between core,
//!   overlay engines and outside observers.
//! - Resolve which page an annotation belongs to.
//!
//! # Invariants
//! - `id` is unique across the whole document, not just one page.
//! - `body` entries are opaque and passed through unchanged.
//! - `target.selector` is always emitted as a list, even when a single
//!   selector object was received.

use crate::model::page::PageNumber;
use crate::model::selector::Selector;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque, document-unique annotation identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(String);

impl AnnotationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a fresh `#<uuid>` identifier, the shape overlay engines use.
    pub fn generate() -> Self {
        Self(format!("#{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for AnnotationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What an annotation points at.
///
/// A target without selectors is a relationship link between two other
/// annotations; it is still page-scoped through `page`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub selector: Vec<Selector>,
    /// Page the annotation was created on. Set by the enricher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageNumber>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical unit of user-attached metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    #[serde(default, deserialize_with = "one_or_many")]
    pub body: Vec<Value>,
    #[serde(default)]
    pub target: Target,
    /// Remaining Web Annotation members (`@context`, `type`, `motivation`...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    /// Creates an annotation with an empty body anchored by `selectors`.
    pub fn new(id: impl Into<AnnotationId>, selectors: Vec<Selector>) -> Self {
        Self {
            id: id.into(),
            body: Vec::new(),
            target: Target {
                selector: selectors,
                ..Target::default()
            },
            extra: Map::new(),
        }
    }

    pub fn with_body(mut self, body: Vec<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.target.selector
    }

    /// Whether this annotation only links other annotations.
    pub fn is_relationship(&self) -> bool {
        self.target.selector.is_empty()
    }

    /// Page this annotation belongs to.
    ///
    /// Reads `target.page` first, then the first paged `TextPositionSelector`,
    /// then a top-level `page` member left by older exports.
    /// Returns `None` for annotations that were never placed on a page.
    pub fn resolved_page(&self) -> Option<PageNumber> {
        self.target
            .page
            .or_else(|| {
                self.target.selector.iter().find_map(|selector| match selector {
                    Selector::TextPosition(position) => position.page,
                    _ => None,
                })
            })
            .or_else(|| {
                self.extra
                    .get("page")
                    .and_then(Value::as_u64)
                    .and_then(|raw| u32::try_from(raw).ok())
                    .and_then(|raw| PageNumber::new(raw).ok())
            })
    }

    /// Validates structural invariants of the annotation.
    ///
    /// # Errors
    /// - `BlankId` when `id` is empty after trim.
    /// - `InvertedTextRange` when a text position ends before it starts.
    /// - `MalformedFragment` when an `xywh=` fragment value does not parse.
    pub fn validate(&self) -> Result<(), AnnotationValidationError> {
        if self.id.is_blank() {
            return Err(AnnotationValidationError::BlankId);
        }

        for selector in &self.target.selector {
            match selector {
                Selector::TextPosition(position) if position.end < position.start => {
                    return Err(AnnotationValidationError::InvertedTextRange {
                        start: position.start,
                        end: position.end,
                    });
                }
                Selector::Fragment(fragment)
                    if fragment.value.trim_start().starts_with("xywh=")
                        && fragment.region().is_none() =>
                {
                    return Err(AnnotationValidationError::MalformedFragment(
                        fragment.value.clone(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Annotation validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValidationError {
    BlankId,
    InvertedTextRange { start: u64, end: u64 },
    MalformedFragment(String),
}

impl Display for AnnotationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId => write!(f, "annotation id must not be blank"),
            Self::InvertedTextRange { start, end } => {
                write!(f, "text position end ({end}) must be >= start ({start})")
            }
            Self::MalformedFragment(value) => {
                write!(f, "fragment selector value is not a valid xywh region: {value}")
            }
        }
    }
}

impl Error for AnnotationValidationError {}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(values)) => values,
        Some(OneOrMany::One(value)) => vec![value],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::{Annotation, AnnotationId, AnnotationValidationError};
    use crate::model::page::PageNumber;
    use crate::model::selector::{Selector, TextPosition};
    use serde_json::Map;

    fn paged_position(page: u32) -> Selector {
        Selector::TextPosition(TextPosition {
            start: 0,
            end: 4,
            page: Some(PageNumber::new(page).unwrap()),
            extra: Map::new(),
        })
    }

    #[test]
    fn generated_ids_are_hash_prefixed_and_unique() {
        let first = AnnotationId::generate();
        let second = AnnotationId::generate();
        assert!(first.as_str().starts_with('#'));
        assert_ne!(first, second);
    }

    #[test]
    fn resolved_page_prefers_target_page() {
        let mut annotation = Annotation::new("a", vec![paged_position(2)]);
        assert_eq!(annotation.resolved_page().map(PageNumber::get), Some(2));

        annotation.target.page = Some(PageNumber::new(5).unwrap());
        assert_eq!(annotation.resolved_page().map(PageNumber::get), Some(5));
    }

    #[test]
    fn unpaged_annotation_has_no_page() {
        let annotation = Annotation::new("a", vec![Selector::fragment("xywh=1,1,1,1")]);
        assert_eq!(annotation.resolved_page(), None);
    }

    #[test]
    fn validate_rejects_blank_id_and_inverted_range() {
        let blank = Annotation::new("  ", vec![]);
        assert_eq!(blank.validate(), Err(AnnotationValidationError::BlankId));

        let inverted = Annotation::new("a", vec![Selector::text_position(9, 3)]);
        assert_eq!(
            inverted.validate(),
            Err(AnnotationValidationError::InvertedTextRange { start: 9, end: 3 })
        );
    }

    #[test]
    fn validate_rejects_garbled_media_fragment() {
        let annotation = Annotation::new("a", vec![Selector::fragment("xywh=ten,10,5,5")]);
        assert!(matches!(
            annotation.validate(),
            Err(AnnotationValidationError::MalformedFragment(_))
        ));

        let opaque = Annotation::new("b", vec![Selector::fragment("page=3")]);
        assert!(opaque.validate().is_ok());
    }
}
