#![forbid(unsafe_code)]

mod session;

pub use session::ViewerSession;

use std::sync::{LazyLock, RwLock};

use pz_core::{Size, ViewerConfig, ViewerError, ViewportGeometry, ZoomModifier};
use pz_engine::{Fit, PositionBounds};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;
#[cfg(target_arch = "wasm32")]
use pz_core::{Modifiers, SubscriptionId};
#[cfg(target_arch = "wasm32")]
use pz_gesture::{LoadOutcome, ZoomDirection};
#[cfg(target_arch = "wasm32")]
use tracing::warn;

#[derive(Debug, Clone, Default)]
struct RuntimeConfig {
    viewer: ViewerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RuntimeInitConfig {
    viewer: ViewerConfigOverrides,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ViewerConfigOverrides {
    max_scale: Option<f64>,
    wheel_sensitivity: Option<f64>,
    zoom_step: Option<f64>,
    slider_step: Option<f64>,
    transition_ms: Option<u32>,
    zoom_modifier: Option<String>,
}

/// Result of the pure `fit` helper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitSummary {
    pub min_scale: f64,
    pub x: f64,
    pub y: f64,
}

impl From<Fit> for FitSummary {
    fn from(value: Fit) -> Self {
        Self {
            min_scale: value.min_scale,
            x: value.position.x,
            y: value.position.y,
        }
    }
}

static RUNTIME_CONFIG: LazyLock<RwLock<RuntimeConfig>> =
    LazyLock::new(|| RwLock::new(RuntimeConfig::default()));

fn read_runtime_config() -> RuntimeConfig {
    match RUNTIME_CONFIG.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn write_runtime_config(config: RuntimeConfig) {
    match RUNTIME_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => {
            let mut guard = poisoned.into_inner();
            *guard = config;
        }
    }
}

/// Every error crossing into JS is `"<code>: <message>"`.
fn viewer_error(err: &ViewerError) -> JsValue {
    JsValue::from_str(&error_message(err))
}

fn error_message(err: &ViewerError) -> String {
    format!("{}: {err}", err.code().as_str())
}

fn unavailable(reason: &str) -> JsValue {
    viewer_error(&ViewerError::Unavailable {
        reason: reason.to_string(),
    })
}

fn parse_js_value_or_default<T>(value: Option<JsValue>) -> Result<T, JsValue>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match value {
        None => Ok(T::default()),
        Some(raw) if raw.is_undefined() || raw.is_null() => Ok(T::default()),
        Some(raw) => {
            #[cfg(target_arch = "wasm32")]
            {
                serde_wasm_bindgen::from_value(raw).map_err(|err| {
                    viewer_error(&ViewerError::InvalidConfig {
                        reason: err.to_string(),
                    })
                })
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = raw;
                Ok(T::default())
            }
        }
    }
}

fn to_js_value<T>(value: &T) -> Result<JsValue, JsValue>
where
    T: Serialize,
{
    let serialization = |reason: String| viewer_error(&ViewerError::Serialization { reason });
    #[cfg(target_arch = "wasm32")]
    {
        serde_wasm_bindgen::to_value(value).map_err(|err| serialization(err.to_string()))
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        serde_json::to_string(value)
            .map(|json| JsValue::from_str(&json))
            .map_err(|err| serialization(err.to_string()))
    }
}

/// Apply `overrides` on top of `base`, rejecting values that fail validation.
fn merge_viewer_config(
    base: &ViewerConfig,
    overrides: &ViewerConfigOverrides,
) -> Result<ViewerConfig, ViewerError> {
    let invalid = |reason: String| ViewerError::InvalidConfig { reason };
    let mut merged = base.clone();

    if let Some(value) = overrides.max_scale {
        merged.max_scale = value;
    }
    if let Some(value) = overrides.wheel_sensitivity {
        merged.wheel_sensitivity = value;
    }
    if let Some(value) = overrides.zoom_step {
        merged.zoom_step = value;
    }
    if let Some(value) = overrides.slider_step {
        merged.slider_step = value;
    }
    if let Some(value) = overrides.transition_ms {
        merged.transition_ms = value;
    }
    if let Some(value) = overrides.zoom_modifier.as_deref() {
        merged.zoom_modifier = value.parse::<ZoomModifier>().map_err(invalid)?;
    }

    let errors = merged.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(invalid(messages.join("; ")));
    }
    Ok(merged)
}

fn fit_summary(
    viewport_width: f64,
    viewport_height: f64,
    image_width: f64,
    image_height: f64,
) -> Result<FitSummary, ViewerError> {
    let geometry = ViewportGeometry::new(
        Size::new(viewport_width, viewport_height),
        Size::new(image_width, image_height),
    );
    Ok(pz_engine::fit(&geometry)?.into())
}

fn bounds_at(
    viewport_width: f64,
    viewport_height: f64,
    image_width: f64,
    image_height: f64,
    scale: f64,
) -> Result<PositionBounds, ViewerError> {
    let geometry = ViewportGeometry::new(
        Size::new(viewport_width, viewport_height),
        Size::new(image_width, image_height),
    );
    Ok(pz_engine::position_bounds(&geometry, scale)?)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn init(config: Option<JsValue>) -> Result<(), JsValue> {
    let overrides: RuntimeInitConfig = parse_js_value_or_default(config)?;
    let current = read_runtime_config();

    let next = RuntimeConfig {
        viewer: merge_viewer_config(&current.viewer, &overrides.viewer)
            .map_err(|err| viewer_error(&err))?,
    };

    write_runtime_config(next);
    Ok(())
}

/// Fit scale and centered position for an image in a viewport.
#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn fit(
    viewport_width: f64,
    viewport_height: f64,
    image_width: f64,
    image_height: f64,
) -> Result<JsValue, JsValue> {
    let summary = fit_summary(viewport_width, viewport_height, image_width, image_height)
        .map_err(|err| viewer_error(&err))?;
    to_js_value(&summary)
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn bounds(
    viewport_width: f64,
    viewport_height: f64,
    image_width: f64,
    image_height: f64,
    scale: f64,
) -> Result<JsValue, JsValue> {
    let bounds = bounds_at(
        viewport_width,
        viewport_height,
        image_width,
        image_height,
        scale,
    )
    .map_err(|err| viewer_error(&err))?;
    to_js_value(&bounds)
}

#[cfg(target_arch = "wasm32")]
fn element_size(element: &web_sys::Element) -> Size {
    let rect = element.get_bounding_client_rect();
    Size::new(rect.width(), rect.height())
}

/// Browser viewer bound to a container element and the `<img>` inside it.
///
/// The host wires DOM events to the gesture methods and drives image
/// loading through `beginLoad` / `imageLoaded` / `imageFailed`. Every call
/// that changes the state re-applies the image's inline style.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct Viewer {
    container: web_sys::HtmlElement,
    image: web_sys::HtmlImageElement,
    session: ViewerSession,
    subscription: Option<SubscriptionId>,
    destroyed: bool,
}

#[cfg(target_arch = "wasm32")]
impl Viewer {
    fn ensure_alive(&self) -> Result<(), JsValue> {
        if self.destroyed {
            return Err(unavailable("viewer has been destroyed"));
        }
        Ok(())
    }

    fn apply_style(&self) -> Result<(), JsValue> {
        let Some(frame) = self.session.frame() else {
            return Ok(());
        };
        let style = self.image.style();
        style.set_property("transform-origin", "center")?;
        style.set_property("transform", &frame.transform)?;
        style.set_property("transition", &frame.transition)?;
        Ok(())
    }

    fn after(&self, changed: bool) -> Result<bool, JsValue> {
        if changed {
            self.apply_style()?;
        }
        Ok(changed)
    }

    fn finish_load(&self, result: Result<LoadOutcome, ViewerError>) -> Result<bool, JsValue> {
        match result {
            Ok(LoadOutcome::Applied(_)) => self.after(true),
            Ok(LoadOutcome::Stale) => Ok(false),
            Err(err) => Err(viewer_error(&err)),
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl Viewer {
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: web_sys::HtmlElement,
        image: web_sys::HtmlImageElement,
        config: Option<JsValue>,
    ) -> Result<Self, JsValue> {
        let overrides: RuntimeInitConfig = parse_js_value_or_default(config)?;
        let runtime = read_runtime_config();
        let viewer_config = merge_viewer_config(&runtime.viewer, &overrides.viewer)
            .map_err(|err| viewer_error(&err))?;
        let session = ViewerSession::new(viewer_config, element_size(&container));

        Ok(Self {
            container,
            image,
            session,
            subscription: None,
            destroyed: false,
        })
    }

    /// Starts a load and returns its generation.
    #[wasm_bindgen(js_name = beginLoad)]
    pub fn begin_load(&mut self) -> Result<f64, JsValue> {
        self.ensure_alive()?;
        // Generations stay far below 2^53.
        Ok(self.session.begin_load() as f64)
    }

    /// Call from the image's `load` event; the natural size is read from the
    /// element.
    #[wasm_bindgen(js_name = imageLoaded)]
    pub fn image_loaded(&mut self, generation: f64) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        self.session.resize(element_size(&self.container));
        let natural = Size::new(
            f64::from(self.image.natural_width()),
            f64::from(self.image.natural_height()),
        );
        let result = self.session.image_loaded(generation as u64, natural);
        self.finish_load(result)
    }

    #[wasm_bindgen(js_name = imageFailed)]
    pub fn image_failed(&mut self, generation: f64, reason: &str) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let result = self.session.image_failed(generation as u64, reason);
        self.finish_load(result)
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    #[wasm_bindgen(js_name = dragStart)]
    pub fn drag_start(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.drag_start();
        self.after(changed)
    }

    /// `dx`/`dy` are the total movement since `dragStart`.
    #[wasm_bindgen(js_name = dragMove)]
    pub fn drag_move(&mut self, dx: f64, dy: f64) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.drag_move(dx, dy);
        self.after(changed)
    }

    #[wasm_bindgen(js_name = dragEnd)]
    pub fn drag_end(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.drag_end();
        self.after(changed)
    }

    #[wasm_bindgen(js_name = pinchStart)]
    pub fn pinch_start(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.pinch_start();
        self.after(changed)
    }

    pub fn pinch(&mut self, scale: f64) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.pinch(scale);
        self.after(changed)
    }

    #[wasm_bindgen(js_name = pinchEnd)]
    pub fn pinch_end(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.pinch_end();
        self.after(changed)
    }

    /// Returns whether the wheel event zoomed; hosts should only
    /// `preventDefault()` when it did.
    pub fn wheel(
        &mut self,
        delta_y: f64,
        ctrl: bool,
        meta: bool,
        alt: bool,
        shift: bool,
    ) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let modifiers = Modifiers {
            ctrl,
            meta,
            alt,
            shift,
        };
        let changed = self.session.wheel(delta_y, modifiers);
        self.after(changed)
    }

    pub fn slider(&mut self, value: f64) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.slider(value);
        self.after(changed)
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.zoom(ZoomDirection::In);
        self.after(changed)
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.zoom(ZoomDirection::Out);
        self.after(changed)
    }

    /// Re-reads the container size.
    pub fn resize(&mut self) -> Result<bool, JsValue> {
        self.ensure_alive()?;
        let changed = self.session.resize(element_size(&self.container));
        self.after(changed)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.session.state())
    }

    #[wasm_bindgen(js_name = sliderRange)]
    pub fn slider_range(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.session.slider_range())
    }

    /// Registers `callback(state)` for every state update, replacing any
    /// previous callback.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: js_sys::Function) -> Result<(), JsValue> {
        self.ensure_alive()?;
        let store = self.session.store_mut();
        if let Some(previous) = self.subscription.take() {
            store.unsubscribe(previous);
        }
        let id = store.subscribe(move |state| match serde_wasm_bindgen::to_value(state) {
            Ok(value) => {
                if let Err(thrown) = callback.call1(&JsValue::NULL, &value) {
                    warn!(error = ?thrown, "onChange callback threw");
                }
            }
            Err(err) => warn!(error = %err, "cannot serialize state for onChange"),
        });
        self.subscription = Some(id);
        Ok(())
    }

    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.session.store_mut().unsubscribe(id);
        }
        let style = self.image.style();
        let _ = style.remove_property("transform");
        let _ = style.remove_property("transition");
        self.destroyed = true;
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct Viewer;

#[cfg(not(target_arch = "wasm32"))]
impl Viewer {
    pub fn new(
        _container: JsValue,
        _image: JsValue,
        _config: Option<JsValue>,
    ) -> Result<Self, JsValue> {
        Err(unavailable("Viewer is only available on wasm32 targets"))
    }

    pub fn begin_load(&mut self) -> Result<f64, JsValue> {
        Err(unavailable("Viewer is only available on wasm32 targets"))
    }

    pub fn image_loaded(&mut self, _generation: f64) -> Result<bool, JsValue> {
        Err(unavailable("Viewer is only available on wasm32 targets"))
    }

    pub fn image_failed(&mut self, _generation: f64, _reason: &str) -> Result<bool, JsValue> {
        Err(unavailable("Viewer is only available on wasm32 targets"))
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        Err(unavailable("Viewer is only available on wasm32 targets"))
    }

    pub fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::{
        ViewerConfigOverrides, bounds_at, error_message, fit_summary, merge_viewer_config,
    };
    use pz_core::{ViewerConfig, ViewerError, ZoomModifier};

    #[test]
    fn merge_viewer_config_applies_overrides() {
        let base = ViewerConfig::default();
        let overrides = ViewerConfigOverrides {
            max_scale: Some(8.0),
            zoom_modifier: Some("cmd".to_string()),
            ..ViewerConfigOverrides::default()
        };
        let merged = merge_viewer_config(&base, &overrides).expect("valid overrides");
        assert_eq!(merged.max_scale, 8.0);
        assert_eq!(merged.zoom_modifier, ZoomModifier::Meta);
        assert_eq!(merged.zoom_step, base.zoom_step);
    }

    #[test]
    fn merge_viewer_config_rejects_invalid_values() {
        let overrides = ViewerConfigOverrides {
            zoom_step: Some(-1.0),
            ..ViewerConfigOverrides::default()
        };
        let err = merge_viewer_config(&ViewerConfig::default(), &overrides)
            .expect_err("negative step");
        assert!(matches!(err, ViewerError::InvalidConfig { .. }));
        let message = error_message(&err);
        assert!(message.starts_with("panzoom/error/config: "), "{message}");
        assert!(message.contains("zoomStep"), "{message}");

        let overrides = ViewerConfigOverrides {
            zoom_modifier: Some("hyper".to_string()),
            ..ViewerConfigOverrides::default()
        };
        let err = merge_viewer_config(&ViewerConfig::default(), &overrides)
            .expect_err("unknown modifier");
        assert_eq!(err.code().as_str(), "panzoom/error/config");
    }

    #[test]
    fn error_messages_carry_viewer_codes() {
        let err = fit_summary(0.0, 600.0, 1600.0, 800.0).expect_err("zero viewport");
        assert!(
            error_message(&err).starts_with("panzoom/error/geometry: "),
            "{}",
            error_message(&err)
        );

        let gone = ViewerError::Unavailable {
            reason: "viewer has been destroyed".to_string(),
        };
        assert_eq!(
            error_message(&gone),
            "panzoom/error/unavailable: viewer unavailable: viewer has been destroyed"
        );
    }

    #[test]
    fn overrides_parse_from_camel_case_json() {
        let overrides: super::RuntimeInitConfig = serde_json::from_str(
            r#"{"viewer": {"maxScale": 6, "transitionMs": 0}}"#,
        )
        .expect("parse overrides");
        assert_eq!(overrides.viewer.max_scale, Some(6.0));
        assert_eq!(overrides.viewer.transition_ms, Some(0));
        assert_eq!(overrides.viewer.zoom_step, None);
    }

    #[test]
    fn fit_helper_matches_engine() {
        let summary = fit_summary(800.0, 600.0, 1600.0, 800.0).expect("valid geometry");
        assert_eq!(summary.min_scale, 0.5);
        assert_eq!((summary.x, summary.y), (0.0, 100.0));

        let err = fit_summary(800.0, 600.0, 0.0, 800.0).expect_err("zero width");
        assert_eq!(err.code().as_str(), "panzoom/error/geometry");
    }

    #[test]
    fn bounds_helper_reports_ranges() {
        let bounds = bounds_at(800.0, 600.0, 1600.0, 800.0, 2.0).expect("valid geometry");
        assert_eq!((bounds.x_min, bounds.x_max), (-2400.0, 0.0));
        assert_eq!((bounds.y_min, bounds.y_max), (-1000.0, 0.0));
        assert!(bounds_at(800.0, 600.0, 1600.0, 800.0, 0.0).is_err());
    }
}
