#![forbid(unsafe_code)]

//! Pure geometry for the pan/zoom viewer.
//!
//! Computes the fit-to-viewport transform for a freshly loaded image and the
//! legal translation range at any scale. Nothing here holds state; callers
//! pass a fresh [`ViewportGeometry`] for every interaction.

use pz_core::{GeometryError, Point, Size, ViewportGeometry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of fitting an image into a viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fit {
    /// Largest scale at which the whole image is visible.
    pub min_scale: f64,
    /// Top-left that centers the image at `min_scale`.
    pub position: Point,
}

/// Compute the fit scale and the centered position for a new image.
///
/// Finite, positive sizes can still overflow or underflow the ratio; such a
/// fit is reported as [`GeometryError::InvalidScale`].
pub fn fit(geometry: &ViewportGeometry) -> Result<Fit, GeometryError> {
    geometry.validate()?;
    let ViewportGeometry { viewport, image } = *geometry;

    let scale_x = viewport.width / image.width;
    let scale_y = viewport.height / image.height;
    let min_scale = scale_x.min(scale_y);

    let position = Point::new(
        (viewport.width - image.width * min_scale) / 2.0,
        (viewport.height - image.height * min_scale) / 2.0,
    );
    if !(min_scale.is_finite() && min_scale > 0.0 && position.is_finite()) {
        return Err(GeometryError::InvalidScale { scale: min_scale });
    }

    debug!(
        viewport_w = viewport.width,
        viewport_h = viewport.height,
        image_w = image.width,
        image_h = image.height,
        min_scale,
        x = position.x,
        y = position.y,
        "computed fit transform"
    );

    Ok(Fit {
        min_scale,
        position,
    })
}

/// Closed zoom interval `[min_scale, max_scale]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoomLimits {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl ZoomLimits {
    /// A fit scale above `max_scale` raises the ceiling to the floor, so the
    /// interval never inverts.
    #[must_use]
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale: max_scale.max(min_scale),
        }
    }

    /// `min(max(s, min_scale), max_scale)`; NaN lands on the floor.
    #[must_use]
    pub fn clamp(&self, scale: f64) -> f64 {
        clamp_axis(scale, self.min_scale, self.max_scale)
    }

    #[must_use]
    pub fn contains(&self, scale: f64) -> bool {
        (self.min_scale..=self.max_scale).contains(&scale)
    }
}

/// Free-function form of [`ZoomLimits::clamp`].
#[must_use]
pub fn clamp_scale(scale: f64, limits: ZoomLimits) -> f64 {
    limits.clamp(scale)
}

/// Legal range of the image's top-left at one particular scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl PositionBounds {
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (self.x_min..=self.x_max).contains(&point.x) && (self.y_min..=self.y_max).contains(&point.y)
    }

    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            clamp_axis(point.x, self.x_min, self.x_max),
            clamp_axis(point.y, self.y_min, self.y_max),
        )
    }

    /// Slack available on each axis; zero on an axis pinned at exact fit.
    #[must_use]
    pub fn slack(&self) -> Size {
        Size::new(self.x_max - self.x_min, self.y_max - self.y_min)
    }
}

/// Translation bounds for `geometry` at `scale`.
///
/// When the scaled image overflows an axis the range is
/// `[viewport - scaled, 0]`, so the image always covers the viewport on that
/// axis. When it underflows the range is `[0, viewport - scaled]`, so the
/// image stays fully inside.
pub fn position_bounds(
    geometry: &ViewportGeometry,
    scale: f64,
) -> Result<PositionBounds, GeometryError> {
    geometry.validate()?;
    if !(scale.is_finite() && scale > 0.0) {
        return Err(GeometryError::InvalidScale { scale });
    }

    let scaled = geometry.image.scaled(scale);
    let slack_x = geometry.viewport.width - scaled.width;
    let slack_y = geometry.viewport.height - scaled.height;

    Ok(PositionBounds {
        x_min: slack_x.min(0.0),
        x_max: slack_x.max(0.0),
        y_min: slack_y.min(0.0),
        y_max: slack_y.max(0.0),
    })
}

/// Clamp `position` into the bounds for `scale`.
///
/// `scale` must already be final; bounds at one scale are meaningless at
/// another.
pub fn clamp_position(
    geometry: &ViewportGeometry,
    scale: f64,
    position: Point,
) -> Result<Point, GeometryError> {
    Ok(position_bounds(geometry, scale)?.clamp(position))
}

/// A scale/position pair that satisfies every view invariant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ClampedTransform {
    pub scale: f64,
    pub position: Point,
}

/// Clamp scale first, then position against the bounds of the clamped scale.
pub fn clamp_transform(
    geometry: &ViewportGeometry,
    limits: ZoomLimits,
    scale: f64,
    position: Point,
) -> Result<ClampedTransform, GeometryError> {
    let scale = limits.clamp(scale);
    let position = clamp_position(geometry, scale, position)?;
    Ok(ClampedTransform { scale, position })
}

fn clamp_axis(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.max(lo).min(hi)
}
