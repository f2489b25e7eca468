//! Typed anchor descriptors.
//!
//! # Responsibility
//! - Decode/encode Web Annotation selectors keyed by their `type` member.
//! - Expose which selectors anchor to rendered image geometry.
//!
//! # Invariants
//! - Unknown selector types round-trip verbatim as `Selector::Other`.
//! - Members a known selector does not model are preserved in `extra`.

use crate::model::page::PageNumber;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// `type` value of character-offset text anchors.
pub const TEXT_POSITION_SELECTOR: &str = "TextPositionSelector";
/// `type` value of quoted-text anchors.
pub const TEXT_QUOTE_SELECTOR: &str = "TextQuoteSelector";
/// `type` value of media-fragment image anchors.
pub const FRAGMENT_SELECTOR: &str = "FragmentSelector";
/// `type` value of SVG shape image anchors.
pub const SVG_SELECTOR: &str = "SvgSelector";

static MEDIA_FRAGMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^xywh=(?:(pixel|percent):)?(-?\d+(?:\.\d+)?),(-?\d+(?:\.\d+)?),(\d+(?:\.\d+)?),(\d+(?:\.\d+)?)$",
    )
    .expect("valid media fragment regex")
});

/// Character range inside the extracted text of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPosition {
    pub start: u64,
    pub end: u64,
    /// Stamped by the enricher; absent on annotations fresh from an overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<PageNumber>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextQuote {
    pub exact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Region of the rendered canvas, usually `xywh=` media-fragment syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub value: String,
    #[serde(
        rename = "conformsTo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub conforms_to: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Fragment {
    /// Parses `value` as a media-fragment rectangle.
    ///
    /// Returns `None` when the value is not in `xywh=` form.
    pub fn region(&self) -> Option<FragmentRegion> {
        let caps = MEDIA_FRAGMENT_RE.captures(self.value.trim())?;
        let unit = match caps.get(1).map(|m| m.as_str()) {
            Some("percent") => FragmentUnit::Percent,
            _ => FragmentUnit::Pixel,
        };
        let number = |idx: usize| caps.get(idx)?.as_str().parse::<f64>().ok();
        Some(FragmentRegion {
            unit,
            x: number(2)?,
            y: number(3)?,
            width: number(4)?,
            height: number(5)?,
        })
    }
}

/// Free-form SVG shape drawn over the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svg {
    pub value: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentUnit {
    Pixel,
    Percent,
}

/// Rectangle decoded from a media fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FragmentRegion {
    pub unit: FragmentUnit,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One anchor descriptor of an annotation target.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    TextPosition(TextPosition),
    TextQuote(TextQuote),
    Fragment(Fragment),
    Svg(Svg),
    /// Selector type this crate does not interpret; kept as received.
    Other(Value),
}

impl Selector {
    /// Builds an un-paged text position selector.
    pub fn text_position(start: u64, end: u64) -> Self {
        Self::TextPosition(TextPosition {
            start,
            end,
            page: None,
            extra: Map::new(),
        })
    }

    pub fn text_quote(exact: impl Into<String>) -> Self {
        Self::TextQuote(TextQuote {
            exact: exact.into(),
            prefix: None,
            suffix: None,
            extra: Map::new(),
        })
    }

    pub fn fragment(value: impl Into<String>) -> Self {
        Self::Fragment(Fragment {
            value: value.into(),
            conforms_to: None,
            extra: Map::new(),
        })
    }

    pub fn svg(value: impl Into<String>) -> Self {
        Self::Svg(Svg {
            value: value.into(),
            extra: Map::new(),
        })
    }

    /// Wire `type` of this selector.
    pub fn kind(&self) -> &str {
        match self {
            Self::TextPosition(_) => TEXT_POSITION_SELECTOR,
            Self::TextQuote(_) => TEXT_QUOTE_SELECTOR,
            Self::Fragment(_) => FRAGMENT_SELECTOR,
            Self::Svg(_) => SVG_SELECTOR,
            Self::Other(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default(),
        }
    }

    /// Whether this selector anchors to canvas geometry rather than text.
    pub fn is_image_anchor(&self) -> bool {
        matches!(self, Self::Fragment(_) | Self::Svg(_))
    }

    fn to_value(&self) -> serde_json::Result<Value> {
        let payload = match self {
            Self::TextPosition(inner) => serde_json::to_value(inner)?,
            Self::TextQuote(inner) => serde_json::to_value(inner)?,
            Self::Fragment(inner) => serde_json::to_value(inner)?,
            Self::Svg(inner) => serde_json::to_value(inner)?,
            Self::Other(value) => return Ok(value.clone()),
        };
        let Value::Object(mut members) = payload else {
            return Err(<serde_json::Error as serde::ser::Error>::custom(
                "selector payload must be an object",
            ));
        };
        members.insert("type".to_string(), Value::String(self.kind().to_string()));
        Ok(Value::Object(members))
    }

    fn from_value(value: Value) -> serde_json::Result<Self> {
        let Value::Object(mut members) = value else {
            return Err(<serde_json::Error as serde::de::Error>::custom(
                "selector must be a JSON object",
            ));
        };
        let kind = members
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match kind.as_str() {
            TEXT_POSITION_SELECTOR => {
                members.remove("type");
                serde_json::from_value(Value::Object(members)).map(Self::TextPosition)
            }
            TEXT_QUOTE_SELECTOR => {
                members.remove("type");
                serde_json::from_value(Value::Object(members)).map(Self::TextQuote)
            }
            FRAGMENT_SELECTOR => {
                members.remove("type");
                serde_json::from_value(Value::Object(members)).map(Self::Fragment)
            }
            SVG_SELECTOR => {
                members.remove("type");
                serde_json::from_value(Value::Object(members)).map(Self::Svg)
            }
            _ => Ok(Self::Other(Value::Object(members))),
        }
    }
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}
