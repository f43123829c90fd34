#![forbid(unsafe_code)]

//! Gesture coordination for the pan/zoom viewer.
//!
//! Each input channel reads the current state from the store, computes a
//! candidate transform, clamps it through `pz-engine`, and writes the result
//! back in a single store update. Invalid requests are corrected, never
//! rejected.

mod event;
mod script;
mod viewport;

pub use event::{GestureKind, GesturePayload, InputEvent, WheelInput, ZoomDirection};
pub use script::{ReplayOutcome, SessionScript, TraceEntry, replay};
pub use viewport::ViewportSource;

use pz_core::{
    ImageLoadError, Point, Size, ViewState, ViewStateUpdate, ViewStore, ViewerConfig, ViewerError,
    ViewportGeometry,
};
use pz_engine::{Fit, ZoomLimits, clamp_position, clamp_transform, fit};
use tracing::{debug, warn};

/// Identifies one image load; only the most recent token is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    /// Rebuild a token that crossed a boundary as a plain number.
    #[must_use]
    pub const fn from_generation(generation: u64) -> Self {
        Self(generation)
    }

    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadOutcome {
    /// The fit was computed and written to the store.
    Applied(Fit),
    /// A newer load superseded this one; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ActiveGesture {
    #[default]
    Idle,
    Drag {
        /// Image position when the drag began.
        origin: Point,
    },
    Pinch,
}

impl ActiveGesture {
    #[must_use]
    pub const fn kind(&self) -> Option<GestureKind> {
        match self {
            Self::Idle => None,
            Self::Drag { .. } => Some(GestureKind::Drag),
            Self::Pinch => Some(GestureKind::Pinch),
        }
    }
}

#[derive(Debug)]
pub struct GestureCoordinator<V> {
    config: ViewerConfig,
    viewport: V,
    image: Option<Size>,
    active: ActiveGesture,
    generation: u64,
    /// Last generation whose completion was honored; a repeat is stale.
    settled: u64,
}

impl<V: ViewportSource> GestureCoordinator<V> {
    #[must_use]
    pub fn new(viewport: V, config: ViewerConfig) -> Self {
        Self {
            config,
            viewport,
            image: None,
            active: ActiveGesture::Idle,
            generation: 0,
            settled: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub const fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Natural size of the currently displayed image.
    #[must_use]
    pub const fn image_size(&self) -> Option<Size> {
        self.image
    }

    #[must_use]
    pub const fn active_gesture(&self) -> ActiveGesture {
        self.active
    }

    #[must_use]
    pub fn zoom_limits(&self, state: &ViewState) -> ZoomLimits {
        ZoomLimits::new(state.min_scale, self.config.max_scale)
    }

    // -------------------------------------------------------------------------
    // Image load
    // -------------------------------------------------------------------------

    /// Start a new load, superseding any load still in flight.
    pub fn begin_load(&mut self, store: &mut ViewStore) -> LoadToken {
        self.generation += 1;
        store.set_loading(true);
        debug!(generation = self.generation, "image load started");
        LoadToken(self.generation)
    }

    /// Apply the loader's completion signal.
    ///
    /// On success the fit scale and centered position are written together.
    /// On failure the previous transform stays in place. Either way the
    /// loading flag is cleared, unless the token is stale. Each token is
    /// honored at most once.
    pub fn on_image_loaded(
        &mut self,
        store: &mut ViewStore,
        token: LoadToken,
        result: Result<Size, ImageLoadError>,
    ) -> Result<LoadOutcome, ViewerError> {
        if token.0 != self.generation || token.0 == self.settled {
            debug!(
                token = token.0,
                latest = self.generation,
                settled = self.settled,
                "ignoring superseded or repeated image load"
            );
            return Ok(LoadOutcome::Stale);
        }
        self.settled = token.0;

        let natural = match result {
            Ok(natural) => natural,
            Err(err) => {
                store.set_loading(false);
                warn!(reason = %err.reason, "image load failed; keeping current transform");
                return Err(err.into());
            }
        };

        let geometry = ViewportGeometry::new(self.viewport.viewport_size(), natural);
        let fitted = match fit(&geometry) {
            Ok(fitted) => fitted,
            Err(err) => {
                store.set_loading(false);
                warn!(error = %err, "cannot fit image; keeping current transform");
                return Err(err.into());
            }
        };

        self.image = Some(natural);
        self.active = ActiveGesture::Idle;
        store.update(
            ViewStateUpdate::new()
                .with_min_scale(fitted.min_scale)
                .with_transform(fitted.min_scale, fitted.position)
                .with_dragging(false),
        );
        store.set_loading(false);
        Ok(LoadOutcome::Applied(fitted))
    }

    /// Recompute the fit floor for a resized viewport and pull scale and
    /// position back into range.
    pub fn on_viewport_resized(&mut self, store: &mut ViewStore) -> bool {
        let Some(geometry) = self.geometry() else {
            return false;
        };
        let fitted = match fit(&geometry) {
            Ok(fitted) => fitted,
            Err(err) => {
                warn!(error = %err, "ignoring resize to invalid viewport");
                return false;
            }
        };
        let state = store.state();
        let limits = ZoomLimits::new(fitted.min_scale, self.config.max_scale);
        let Some(clamped) = self.clamped(&geometry, limits, state.scale, state.position) else {
            return false;
        };
        debug!(
            min_scale = fitted.min_scale,
            scale = clamped.scale,
            "viewport resized"
        );
        store.update(
            ViewStateUpdate::new()
                .with_min_scale(fitted.min_scale)
                .with_transform(clamped.scale, clamped.position),
        );
        true
    }

    // -------------------------------------------------------------------------
    // Continuous gestures
    // -------------------------------------------------------------------------

    pub fn on_gesture_start(&mut self, kind: GestureKind, store: &mut ViewStore) -> bool {
        if self.image.is_none() {
            debug!(kind = kind.as_str(), "no image loaded; ignoring gesture");
            return false;
        }
        let mut updated = false;
        if let Some(previous) = self.active.kind() {
            debug!(
                previous = previous.as_str(),
                next = kind.as_str(),
                "new gesture supersedes active one"
            );
            updated |= self.on_gesture_end(previous, store);
        }

        match kind {
            GestureKind::Drag => {
                self.active = ActiveGesture::Drag {
                    origin: store.state().position,
                };
                store.update(ViewStateUpdate::new().with_dragging(true));
                true
            }
            GestureKind::Pinch => {
                self.active = ActiveGesture::Pinch;
                updated
            }
        }
    }

    pub fn on_gesture_update(
        &mut self,
        kind: GestureKind,
        payload: GesturePayload,
        store: &mut ViewStore,
    ) -> bool {
        if payload.kind() != kind {
            debug!(
                kind = kind.as_str(),
                payload = payload.kind().as_str(),
                "payload does not match gesture kind"
            );
            return false;
        }
        if self.image.is_none() {
            return false;
        }

        match self.active.kind() {
            None => {
                self.on_gesture_start(kind, store);
            }
            Some(active) if active != kind => {
                debug!(
                    active = active.as_str(),
                    update = kind.as_str(),
                    "ignoring update for inactive gesture"
                );
                return false;
            }
            Some(_) => {}
        }

        match (payload, self.active) {
            (GesturePayload::Drag { dx, dy }, ActiveGesture::Drag { origin }) => {
                self.drag_to(origin.offset(dx, dy), store)
            }
            (GesturePayload::Pinch { scale }, ActiveGesture::Pinch) => self.zoom_to(scale, store),
            _ => false,
        }
    }

    /// Ending never rolls the position back; a drag end only flushes the
    /// dragging flag.
    pub fn on_gesture_end(&mut self, kind: GestureKind, store: &mut ViewStore) -> bool {
        match self.active.kind() {
            Some(active) if active == kind => self.active = ActiveGesture::Idle,
            Some(active) => {
                debug!(
                    active = active.as_str(),
                    end = kind.as_str(),
                    "ignoring end for inactive gesture"
                );
                return false;
            }
            None => {}
        }

        if kind == GestureKind::Drag && store.state().is_dragging {
            store.update(ViewStateUpdate::new().with_dragging(false));
            return true;
        }
        false
    }

    // -------------------------------------------------------------------------
    // Single-shot inputs
    // -------------------------------------------------------------------------

    /// Wheel zoom, only while the configured modifier is held. Scrolling
    /// down (positive delta) zooms out.
    pub fn on_wheel(&mut self, input: WheelInput, store: &mut ViewStore) -> bool {
        if !self.config.zoom_modifier.is_held(input.modifiers) {
            return false;
        }
        let requested = store.state().scale - input.delta_y * self.config.wheel_sensitivity;
        self.zoom_to(requested, store)
    }

    pub fn on_slider(&mut self, value: f64, store: &mut ViewStore) -> bool {
        self.zoom_to(value, store)
    }

    pub fn on_zoom_button(&mut self, direction: ZoomDirection, store: &mut ViewStore) -> bool {
        let requested = store.state().scale + direction.sign() * self.config.zoom_step;
        self.zoom_to(requested, store)
    }

    /// Route a flat [`InputEvent`] to the matching phase handler.
    pub fn dispatch(&mut self, event: InputEvent, store: &mut ViewStore) -> bool {
        match event {
            InputEvent::DragStart => self.on_gesture_start(GestureKind::Drag, store),
            InputEvent::DragMove { dx, dy } => self.on_gesture_update(
                GestureKind::Drag,
                GesturePayload::Drag { dx, dy },
                store,
            ),
            InputEvent::DragEnd => self.on_gesture_end(GestureKind::Drag, store),
            InputEvent::PinchStart => self.on_gesture_start(GestureKind::Pinch, store),
            InputEvent::Pinch { scale } => self.on_gesture_update(
                GestureKind::Pinch,
                GesturePayload::Pinch { scale },
                store,
            ),
            InputEvent::PinchEnd => self.on_gesture_end(GestureKind::Pinch, store),
            InputEvent::Wheel(input) => self.on_wheel(input, store),
            InputEvent::Slider { value } => self.on_slider(value, store),
            InputEvent::ZoomIn => self.on_zoom_button(ZoomDirection::In, store),
            InputEvent::ZoomOut => self.on_zoom_button(ZoomDirection::Out, store),
        }
    }

    // -------------------------------------------------------------------------
    // Shared update paths
    // -------------------------------------------------------------------------

    fn geometry(&self) -> Option<ViewportGeometry> {
        self.image
            .map(|image| ViewportGeometry::new(self.viewport.viewport_size(), image))
    }

    fn clamped(
        &self,
        geometry: &ViewportGeometry,
        limits: ZoomLimits,
        scale: f64,
        position: Point,
    ) -> Option<pz_engine::ClampedTransform> {
        match clamp_transform(geometry, limits, scale, position) {
            Ok(clamped) => Some(clamped),
            Err(err) => {
                warn!(error = %err, "dropping input against invalid geometry");
                None
            }
        }
    }

    /// Position-only update at the current scale.
    fn drag_to(&mut self, candidate: Point, store: &mut ViewStore) -> bool {
        let Some(geometry) = self.geometry() else {
            return false;
        };
        let state = store.state();
        match clamp_position(&geometry, state.scale, candidate) {
            Ok(position) => {
                store.update(ViewStateUpdate::new().with_position(position));
                true
            }
            Err(err) => {
                warn!(error = %err, "dropping drag against invalid geometry");
                false
            }
        }
    }

    /// Scale change; position is re-clamped against the new scale's bounds in
    /// the same update.
    fn zoom_to(&mut self, requested: f64, store: &mut ViewStore) -> bool {
        let Some(geometry) = self.geometry() else {
            return false;
        };
        let state = store.state();
        let limits = self.zoom_limits(&state);
        let Some(clamped) = self.clamped(&geometry, limits, requested, state.position) else {
            return false;
        };
        store.update(ViewStateUpdate::new().with_transform(clamped.scale, clamped.position));
        true
    }
}
