#![forbid(unsafe_code)]

//! Turns a `ViewState` into what a renderer needs: a CSS transform string,
//! a transition hint and the zoom slider's range.

mod transform;

pub use transform::{RenderTransform, image_to_viewport, viewport_to_image};

use std::fmt::Write;

use pz_core::{Size, ViewState, ViewerConfig};
use serde::{Deserialize, Serialize};

/// CSS `transform` value for an image styled with `transform-origin: center`.
///
/// CSS scales around the element's center, so the translation is shifted by
/// half the size change to keep the rendered top-left at `state.position`.
#[must_use]
pub fn css_transform(state: &ViewState, image: Size) -> String {
    let s = state.scale;
    let tx = state.position.x - (image.width - s * image.width) / 2.0;
    let ty = state.position.y - (image.height - s * image.height) / 2.0;

    let mut out = String::with_capacity(48);
    let _ = write!(
        out,
        "translate({}px, {}px) scale({})",
        fmt_num(tx),
        fmt_num(ty),
        fmt_num(s)
    );
    out
}

/// Transition duration in milliseconds, or `None` while a drag is in
/// progress so the image tracks the pointer directly.
#[must_use]
pub const fn transition_hint(state: &ViewState, config: &ViewerConfig) -> Option<u32> {
    if state.is_dragging {
        None
    } else {
        Some(config.transition_ms)
    }
}

/// CSS `transition` value matching [`transition_hint`].
#[must_use]
pub fn css_transition(state: &ViewState, config: &ViewerConfig) -> String {
    match transition_hint(state, config) {
        Some(ms) => format!("transform {ms}ms"),
        None => "none".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub value: f64,
}

impl SliderRange {
    #[must_use]
    pub fn from_state(state: &ViewState, config: &ViewerConfig) -> Self {
        Self {
            min: state.min_scale,
            max: config.max_scale.max(state.min_scale),
            step: config.slider_step,
            value: state.scale,
        }
    }
}

/// Everything a frontend applies after one store update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderFrame {
    pub transform: String,
    pub transition: String,
    pub transition_ms: Option<u32>,
    pub matrix: RenderTransform,
    pub slider: SliderRange,
}

impl RenderFrame {
    #[must_use]
    pub fn new(state: &ViewState, image: Size, config: &ViewerConfig) -> Self {
        Self {
            transform: css_transform(state, image),
            transition: css_transition(state, config),
            transition_ms: transition_hint(state, config),
            matrix: RenderTransform::from_state(state),
            slider: SliderRange::from_state(state, config),
        }
    }
}

/// Format a number for CSS output: integers without a fraction, everything
/// else with at most four decimals.
fn fmt_num(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    let formatted = format!("{n:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
