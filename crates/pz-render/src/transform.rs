//! Affine mapping between image-natural and viewport coordinates.

use pz_core::{Point, ViewState};
use serde::{Deserialize, Serialize};

/// A 2D affine transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderTransform {
    pub a: f64, // scale x
    pub b: f64, // skew y
    pub c: f64, // skew x
    pub d: f64, // scale y
    pub e: f64, // translate x
    pub f: f64, // translate y
}

impl Default for RenderTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RenderTransform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    #[must_use]
    pub const fn translate(x: f64, y: f64) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: x,
            f: y,
        }
    }

    #[must_use]
    pub const fn scale(s: f64) -> Self {
        Self {
            a: s,
            b: 0.0,
            c: 0.0,
            d: s,
            e: 0.0,
            f: 0.0,
        }
    }

    /// `translate(position)` then `scale(scale)`, with the image's top-left
    /// landing on `position`.
    #[must_use]
    pub fn from_state(state: &ViewState) -> Self {
        Self::translate(state.position.x, state.position.y).multiply(&Self::scale(state.scale))
    }

    /// `self * other`: `other` is applied first.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    #[must_use]
    pub fn apply(&self, point: Point) -> Point {
        Point::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// `None` when the matrix is singular or not finite.
    #[must_use]
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

/// Map a point in viewport pixels onto the image's natural pixel grid.
#[must_use]
pub fn viewport_to_image(state: &ViewState, point: Point) -> Option<Point> {
    RenderTransform::from_state(state)
        .invert()
        .map(|inverse| inverse.apply(point))
}

#[must_use]
pub fn image_to_viewport(state: &ViewState, point: Point) -> Point {
    RenderTransform::from_state(state).apply(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(scale: f64, x: f64, y: f64) -> ViewState {
        ViewState {
            scale,
            position: Point::new(x, y),
            ..ViewState::default()
        }
    }

    #[test]
    fn from_state_places_top_left_at_position() {
        let transform = RenderTransform::from_state(&state(0.5, 0.0, 100.0));
        assert_eq!(transform.apply(Point::ZERO), Point::new(0.0, 100.0));
        assert_eq!(
            transform.apply(Point::new(1600.0, 800.0)),
            Point::new(800.0, 500.0)
        );
    }

    #[test]
    fn inverse_round_trips() {
        let transform = RenderTransform::from_state(&state(2.0, -300.0, -40.0));
        let inverse = transform.invert().expect("invertible");
        let identity = transform.multiply(&inverse);
        assert!((identity.a - 1.0).abs() < 1e-12);
        assert!((identity.d - 1.0).abs() < 1e-12);
        assert!(identity.e.abs() < 1e-9);
        assert!(identity.f.abs() < 1e-9);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert_eq!(RenderTransform::scale(0.0).invert(), None);
        assert_eq!(RenderTransform::scale(f64::INFINITY).invert(), None);
    }

    #[test]
    fn coordinate_conversion() {
        let view = state(2.0, 100.0, 50.0);
        let image = viewport_to_image(&view, Point::new(300.0, 150.0)).expect("invertible");
        assert!((image.x - 100.0).abs() < 1e-9);
        assert!((image.y - 50.0).abs() < 1e-9);

        let back = image_to_viewport(&view, image);
        assert!((back.x - 300.0).abs() < 1e-9);
        assert!((back.y - 150.0).abs() < 1e-9);
    }
}
