//! Viewer session configuration.
//!
//! # Invariants
//! - `scale` is finite and strictly positive.
//! - `text_overlay` is a JSON object (or `null`); its members are opaque to
//!   core and handed to the text overlay factory unchanged.

use crate::overlay::InteractionMode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default page render scale.
pub const DEFAULT_RENDER_SCALE: f32 = 1.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Viewport scale passed with every render request.
    pub scale: f32,
    /// Interaction mode applied to the first attached page.
    pub initial_mode: InteractionMode,
    /// Styling/behavior options forwarded to the text overlay.
    pub text_overlay: Value,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RENDER_SCALE,
            initial_mode: InteractionMode::default(),
            text_overlay: Value::Object(Map::new()),
        }
    }
}

impl ViewerConfig {
    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if !matches!(self.text_overlay, Value::Object(_) | Value::Null) {
            return Err(ConfigError::TextOverlayNotObject);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Parse(String),
    InvalidScale(f32),
    TextOverlayNotObject,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid viewer config: {message}"),
            Self::InvalidScale(value) => {
                write!(f, "render scale must be finite and > 0, got {value}")
            }
            Self::TextOverlayNotObject => write!(f, "text_overlay options must be a JSON object"),
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig, DEFAULT_RENDER_SCALE};
    use crate::overlay::InteractionMode;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ViewerConfig::from_json_str("{}").expect("defaults");
        assert_eq!(config.scale, DEFAULT_RENDER_SCALE);
        assert_eq!(config.initial_mode, InteractionMode::Annotation);
        assert!(config.text_overlay.is_object());
    }

    #[test]
    fn reads_mode_and_passthrough_options() {
        let config = ViewerConfig::from_json_str(
            r#"{"scale": 1.25, "initial_mode": "RELATIONS", "text_overlay": {"readOnly": true}}"#,
        )
        .expect("valid config");
        assert_eq!(config.scale, 1.25);
        assert_eq!(config.initial_mode, InteractionMode::Relations);
        assert_eq!(config.text_overlay["readOnly"], true);
    }

    #[test]
    fn rejects_non_positive_scale_and_scalar_options() {
        assert_eq!(
            ViewerConfig::from_json_str(r#"{"scale": 0}"#).unwrap_err(),
            ConfigError::InvalidScale(0.0)
        );
        assert_eq!(
            ViewerConfig::from_json_str(r#"{"text_overlay": 3}"#).unwrap_err(),
            ConfigError::TextOverlayNotObject
        );
        assert!(matches!(
            ViewerConfig::from_json_str("not json").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }
}
