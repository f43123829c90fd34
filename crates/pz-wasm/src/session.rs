//! Target-independent half of the browser viewer: the store, coordinator and
//! live viewport size, driven by plain numbers.

use std::cell::Cell;
use std::rc::Rc;

use pz_core::{ImageLoadError, Modifiers, Size, ViewState, ViewStore, ViewerConfig, ViewerError};
use pz_gesture::{
    GestureCoordinator, GestureKind, GesturePayload, LoadOutcome, LoadToken, WheelInput,
    ZoomDirection,
};
use pz_render::{RenderFrame, SliderRange};

#[derive(Debug)]
pub struct ViewerSession {
    store: ViewStore,
    viewport: Rc<Cell<Size>>,
    coordinator: GestureCoordinator<Rc<Cell<Size>>>,
}

impl ViewerSession {
    #[must_use]
    pub fn new(config: ViewerConfig, viewport: Size) -> Self {
        let viewport = Rc::new(Cell::new(viewport));
        Self {
            store: ViewStore::new(),
            coordinator: GestureCoordinator::new(Rc::clone(&viewport), config),
            viewport,
        }
    }

    pub fn store_mut(&mut self) -> &mut ViewStore {
        &mut self.store
    }

    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.store.state()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        self.coordinator.config()
    }

    /// Returns the load generation the caller hands back on completion.
    pub fn begin_load(&mut self) -> u64 {
        self.coordinator.begin_load(&mut self.store).generation()
    }

    pub fn image_loaded(
        &mut self,
        generation: u64,
        natural: Size,
    ) -> Result<LoadOutcome, ViewerError> {
        self.coordinator.on_image_loaded(
            &mut self.store,
            LoadToken::from_generation(generation),
            Ok(natural),
        )
    }

    pub fn image_failed(
        &mut self,
        generation: u64,
        reason: &str,
    ) -> Result<LoadOutcome, ViewerError> {
        self.coordinator.on_image_loaded(
            &mut self.store,
            LoadToken::from_generation(generation),
            Err(ImageLoadError::new(reason)),
        )
    }

    pub fn drag_start(&mut self) -> bool {
        self.coordinator
            .on_gesture_start(GestureKind::Drag, &mut self.store)
    }

    pub fn drag_move(&mut self, dx: f64, dy: f64) -> bool {
        self.coordinator.on_gesture_update(
            GestureKind::Drag,
            GesturePayload::Drag { dx, dy },
            &mut self.store,
        )
    }

    pub fn drag_end(&mut self) -> bool {
        self.coordinator
            .on_gesture_end(GestureKind::Drag, &mut self.store)
    }

    pub fn pinch_start(&mut self) -> bool {
        self.coordinator
            .on_gesture_start(GestureKind::Pinch, &mut self.store)
    }

    pub fn pinch(&mut self, scale: f64) -> bool {
        self.coordinator.on_gesture_update(
            GestureKind::Pinch,
            GesturePayload::Pinch { scale },
            &mut self.store,
        )
    }

    pub fn pinch_end(&mut self) -> bool {
        self.coordinator
            .on_gesture_end(GestureKind::Pinch, &mut self.store)
    }

    pub fn wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        self.coordinator
            .on_wheel(WheelInput { delta_y, modifiers }, &mut self.store)
    }

    pub fn slider(&mut self, value: f64) -> bool {
        self.coordinator.on_slider(value, &mut self.store)
    }

    pub fn zoom(&mut self, direction: ZoomDirection) -> bool {
        self.coordinator.on_zoom_button(direction, &mut self.store)
    }

    pub fn resize(&mut self, viewport: Size) -> bool {
        self.viewport.set(viewport);
        self.coordinator.on_viewport_resized(&mut self.store)
    }

    #[must_use]
    pub fn slider_range(&self) -> SliderRange {
        SliderRange::from_state(&self.store.state(), self.coordinator.config())
    }

    /// Render output for the current state, once an image is displayed.
    #[must_use]
    pub fn frame(&self) -> Option<RenderFrame> {
        self.coordinator
            .image_size()
            .map(|image| RenderFrame::new(&self.store.state(), image, self.coordinator.config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pz_core::Point;

    fn loaded() -> ViewerSession {
        let mut session = ViewerSession::new(ViewerConfig::default(), Size::new(800.0, 600.0));
        let generation = session.begin_load();
        session
            .image_loaded(generation, Size::new(1600.0, 800.0))
            .expect("image fits");
        session
    }

    #[test]
    fn frame_is_absent_before_first_load() {
        let session = ViewerSession::new(ViewerConfig::default(), Size::new(800.0, 600.0));
        assert!(session.frame().is_none());
    }

    #[test]
    fn loaded_session_renders_fit() {
        let session = loaded();
        let frame = session.frame().expect("image displayed");
        assert_eq!(frame.transform, "translate(-400px, -100px) scale(0.5)");
        assert_eq!(frame.transition_ms, Some(100));
        assert!(!session.is_loading());
    }

    #[test]
    fn drag_disables_transition_until_end() {
        let mut session = loaded();
        session.drag_start();
        session.drag_move(0.0, 50.0);
        let frame = session.frame().expect("image displayed");
        assert_eq!(frame.transition, "none");
        assert_eq!(session.state().position, Point::new(0.0, 150.0));

        session.drag_end();
        assert_eq!(
            session.frame().expect("image displayed").transition_ms,
            Some(100)
        );
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut session = loaded();
        let old = session.begin_load();
        let new = session.begin_load();
        assert_eq!(
            session
                .image_loaded(old, Size::new(10.0, 10.0))
                .expect("stale"),
            LoadOutcome::Stale
        );
        let err = session
            .image_failed(new, "decode error")
            .expect_err("failure surfaces");
        assert_eq!(err.code().as_str(), "panzoom/error/image-load");
        // The previous image stays fitted.
        assert_eq!(session.state().min_scale, 0.5);
        assert!(!session.is_loading());
    }

    #[test]
    fn resize_refits_floor() {
        let mut session = loaded();
        assert!(session.resize(Size::new(400.0, 300.0)));
        assert_eq!(session.state().min_scale, 0.25);
        assert_eq!(session.slider_range().min, 0.25);
    }

    #[test]
    fn wheel_and_buttons_zoom() {
        let mut session = loaded();
        assert!(!session.wheel(-50.0, Modifiers::NONE));
        assert!(session.wheel(-50.0, Modifiers::ctrl()));
        assert!((session.state().scale - 1.0).abs() < 1e-12);
        session.zoom(ZoomDirection::Out);
        assert!((session.state().scale - 0.9).abs() < 1e-12);
        session.slider(100.0);
        assert_eq!(session.state().scale, 4.0);
    }
}
