//! Input vocabulary of the coordinator.

use pz_core::Modifiers;
use serde::{Deserialize, Serialize};

/// Continuous gesture streams; at most one is active at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    Drag,
    Pinch,
}

impl GestureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drag => "drag",
            Self::Pinch => "pinch",
        }
    }
}

/// Per-kind value carried by a gesture update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GesturePayload {
    /// Total pointer movement since the drag began, not a per-frame delta.
    Drag { dx: f64, dy: f64 },
    /// Absolute scale reported by the pinch recognizer.
    Pinch { scale: f64 },
}

impl GesturePayload {
    #[must_use]
    pub const fn kind(&self) -> GestureKind {
        match self {
            Self::Drag { .. } => GestureKind::Drag,
            Self::Pinch { .. } => GestureKind::Pinch,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    #[must_use]
    pub const fn sign(self) -> f64 {
        match self {
            Self::In => 1.0,
            Self::Out => -1.0,
        }
    }
}

/// One wheel tick with the modifier state sampled alongside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WheelInput {
    /// Positive when scrolling down.
    pub delta_y: f64,
    pub modifiers: Modifiers,
}

/// Flat form of every input channel, used by recorded sessions and bindings
/// that prefer a single dispatch entry point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    DragStart,
    DragMove { dx: f64, dy: f64 },
    DragEnd,
    PinchStart,
    Pinch { scale: f64 },
    PinchEnd,
    Wheel(WheelInput),
    Slider { value: f64 },
    ZoomIn,
    ZoomOut,
}
