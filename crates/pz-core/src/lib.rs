#![forbid(unsafe_code)]

mod config;
mod store;

pub use config::{ConfigError, Modifiers, ViewerConfig, ZoomModifier};
pub use store::{SubscriptionId, ViewStore};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in viewport pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Translate by the given movement.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both dimensions are finite and strictly positive.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// Viewport and image natural size for one interaction. Never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewportGeometry {
    pub viewport: Size,
    pub image: Size,
}

impl ViewportGeometry {
    #[must_use]
    pub const fn new(viewport: Size, image: Size) -> Self {
        Self { viewport, image }
    }

    /// Reject degenerate dimensions before any division happens.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.viewport.is_positive() {
            return Err(GeometryError::InvalidViewport {
                width: self.viewport.width,
                height: self.viewport.height,
            });
        }
        if !self.image.is_positive() {
            return Err(GeometryError::InvalidImage {
                width: self.image.width,
                height: self.image.height,
            });
        }
        Ok(())
    }
}

/// The single view transform driven by user input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub scale: f64,
    /// Top-left of the scaled image relative to the viewport's top-left.
    pub position: Point,
    /// Scale at which the image exactly fits the viewport.
    pub min_scale: f64,
    /// Presentation hint only; true between drag start and drag end.
    pub is_dragging: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            position: Point::ZERO,
            min_scale: 1.0,
            is_dragging: false,
        }
    }
}

impl ViewState {
    /// Merge the supplied fields, returning whether anything changed.
    pub fn merge(&mut self, update: &ViewStateUpdate) -> bool {
        let before = *self;
        if let Some(scale) = update.scale {
            self.scale = scale;
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(min_scale) = update.min_scale {
            self.min_scale = min_scale;
        }
        if let Some(is_dragging) = update.is_dragging {
            self.is_dragging = is_dragging;
        }
        *self != before
    }
}

/// Partial view state; `None` fields are left untouched by a merge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewStateUpdate {
    pub scale: Option<f64>,
    pub position: Option<Point>,
    pub min_scale: Option<f64>,
    pub is_dragging: Option<bool>,
}

impl ViewStateUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub const fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// Scale and position together, so no reader sees one without the other.
    #[must_use]
    pub const fn with_transform(self, scale: f64, position: Point) -> Self {
        self.with_scale(scale).with_position(position)
    }

    #[must_use]
    pub const fn with_min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = Some(min_scale);
        self
    }

    #[must_use]
    pub const fn with_dragging(mut self, is_dragging: bool) -> Self {
        self.is_dragging = Some(is_dragging);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Error)]
pub enum GeometryError {
    #[error("viewport must have positive finite dimensions, got {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
    #[error("image must have positive finite dimensions, got {width}x{height}")]
    InvalidImage { width: f64, height: f64 },
    #[error("scale must be positive and finite, got {scale}")]
    InvalidScale { scale: f64 },
}

impl GeometryError {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidViewport { .. } => "panzoom/geometry/viewport",
            Self::InvalidImage { .. } => "panzoom/geometry/image",
            Self::InvalidScale { .. } => "panzoom/geometry/scale",
        }
    }
}

/// Failure signal from the image loader collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("image failed to load: {reason}")]
pub struct ImageLoadError {
    pub reason: String,
}

impl ImageLoadError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ViewerErrorCode {
    #[default]
    InvalidGeometry,
    ImageLoadFailed,
    InvalidConfig,
    Serialization,
    Unavailable,
}

impl ViewerErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidGeometry => "panzoom/error/geometry",
            Self::ImageLoadFailed => "panzoom/error/image-load",
            Self::InvalidConfig => "panzoom/error/config",
            Self::Serialization => "panzoom/error/serialize",
            Self::Unavailable => "panzoom/error/unavailable",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Error)]
pub enum ViewerError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),
    #[error("image load failed: {reason}")]
    ImageLoadFailed { reason: String },
    #[error("invalid viewer config: {reason}")]
    InvalidConfig { reason: String },
    #[error("serialization failed: {reason}")]
    Serialization { reason: String },
    /// The viewer was destroyed or the target has no DOM.
    #[error("viewer unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ViewerError {
    #[must_use]
    pub const fn code(&self) -> ViewerErrorCode {
        match self {
            Self::InvalidGeometry(_) => ViewerErrorCode::InvalidGeometry,
            Self::ImageLoadFailed { .. } => ViewerErrorCode::ImageLoadFailed,
            Self::InvalidConfig { .. } => ViewerErrorCode::InvalidConfig,
            Self::Serialization { .. } => ViewerErrorCode::Serialization,
            Self::Unavailable { .. } => ViewerErrorCode::Unavailable,
        }
    }
}

impl From<ImageLoadError> for ViewerError {
    fn from(value: ImageLoadError) -> Self {
        Self::ImageLoadFailed {
            reason: value.reason,
        }
    }
}
