//! Policy constants for the viewer.
//!
//! Defaults reproduce the behavior of the shipped viewer: 4x maximum zoom,
//! 0.01 scale units per wheel delta unit, 0.1 per zoom button press.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key that must be held for the wheel to zoom instead of scroll.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomModifier {
    #[default]
    Control,
    Meta,
    Alt,
    Shift,
    /// Control on most platforms, Command on macOS.
    ControlOrMeta,
}

impl ZoomModifier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::Meta => "meta",
            Self::Alt => "alt",
            Self::Shift => "shift",
            Self::ControlOrMeta => "control-or-meta",
        }
    }

    #[must_use]
    pub const fn is_held(self, modifiers: Modifiers) -> bool {
        match self {
            Self::Control => modifiers.ctrl,
            Self::Meta => modifiers.meta,
            Self::Alt => modifiers.alt,
            Self::Shift => modifiers.shift,
            Self::ControlOrMeta => modifiers.ctrl || modifiers.meta,
        }
    }
}

impl fmt::Display for ZoomModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoomModifier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "control" | "ctrl" => Ok(Self::Control),
            "meta" | "cmd" | "command" => Ok(Self::Meta),
            "alt" | "option" => Ok(Self::Alt),
            "shift" => Ok(Self::Shift),
            "control-or-meta" | "ctrl-or-cmd" => Ok(Self::ControlOrMeta),
            other => Err(format!("unknown zoom modifier '{other}'")),
        }
    }
}

/// Keyboard modifier state sampled with an input event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub alt: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        meta: false,
        alt: false,
        shift: false,
    };

    #[must_use]
    pub const fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Upper zoom bound, independent of image and viewport size.
    pub max_scale: f64,
    /// Scale units per wheel delta unit.
    pub wheel_sensitivity: f64,
    /// Scale increment of the +/- buttons.
    pub zoom_step: f64,
    /// Granularity of the zoom slider.
    pub slider_step: f64,
    /// Transform transition length when not dragging; 0 disables it.
    pub transition_ms: u32,
    pub zoom_modifier: ZoomModifier,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_scale: 4.0,
            wheel_sensitivity: 0.01,
            zoom_step: 0.1,
            slider_step: 0.1,
            transition_ms: 100,
            zoom_modifier: ZoomModifier::Control,
        }
    }
}

impl ViewerConfig {
    /// Collect every out-of-range field instead of stopping at the first.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let positive = [
            ("maxScale", self.max_scale),
            ("wheelSensitivity", self.wheel_sensitivity),
            ("zoomStep", self.zoom_step),
            ("sliderStep", self.slider_step),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError::new(
                    field,
                    value.to_string(),
                    "must be a positive finite number",
                ));
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Error)]
#[error("invalid {field} = {value}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    #[must_use]
    pub fn new(field: &str, value: impl Into<String>, message: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.max_scale, 4.0);
        assert_eq!(config.wheel_sensitivity, 0.01);
        assert_eq!(config.zoom_step, 0.1);
        assert_eq!(config.zoom_modifier, ZoomModifier::Control);
    }

    #[test]
    fn validate_collects_all_bad_fields() {
        let config = ViewerConfig {
            max_scale: 0.0,
            wheel_sensitivity: f64::NAN,
            zoom_step: -0.1,
            ..ViewerConfig::default()
        };
        let fields: Vec<_> = config
            .validate()
            .into_iter()
            .map(|err| err.field)
            .collect();
        assert_eq!(fields, vec!["maxScale", "wheelSensitivity", "zoomStep"]);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"maxScale": 8, "zoomModifier": "meta"}"#)
                .expect("parse config");
        assert_eq!(config.max_scale, 8.0);
        assert_eq!(config.zoom_modifier, ZoomModifier::Meta);
        assert_eq!(config.zoom_step, 0.1);
    }

    #[test]
    fn modifier_matching() {
        let ctrl = Modifiers::ctrl();
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert!(ZoomModifier::Control.is_held(ctrl));
        assert!(!ZoomModifier::Control.is_held(meta));
        assert!(ZoomModifier::ControlOrMeta.is_held(meta));
        assert!(!ZoomModifier::Shift.is_held(Modifiers::NONE));
    }

    #[test]
    fn modifier_parses_aliases() {
        assert_eq!("Ctrl".parse::<ZoomModifier>(), Ok(ZoomModifier::Control));
        assert_eq!("cmd".parse::<ZoomModifier>(), Ok(ZoomModifier::Meta));
        assert!("hyper".parse::<ZoomModifier>().is_err());
        assert_eq!(ZoomModifier::ControlOrMeta.to_string(), "control-or-meta");
    }
}
