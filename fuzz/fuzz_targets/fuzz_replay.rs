#![no_main]

use libfuzzer_sys::fuzz_target;
use pz_core::{ViewerConfig, ViewportGeometry};
use pz_engine::{ZoomLimits, position_bounds};
use pz_gesture::{SessionScript, replay};
use pz_render::css_transform;

fuzz_target!(|data: &[u8]| {
    let Ok(script) = serde_json::from_slice::<SessionScript>(data) else {
        return;
    };
    let config = ViewerConfig::default();
    let Ok(outcome) = replay(&script, config.clone(), false) else {
        return;
    };

    assert!(
        outcome.fit.min_scale.is_finite() && outcome.fit.min_scale > 0.0,
        "degenerate fit: {:?}",
        outcome.fit
    );
    assert!(outcome.fit.position.is_finite(), "degenerate fit: {:?}", outcome.fit);

    let state = outcome.state;
    let limits = ZoomLimits::new(state.min_scale, config.max_scale);
    assert!(limits.contains(state.scale), "scale escaped: {state:?}");

    let geometry = ViewportGeometry::new(script.viewport, script.image);
    if let Ok(bounds) = position_bounds(&geometry, state.scale) {
        assert!(bounds.contains(state.position), "position escaped: {state:?}");
    }
    let _ = css_transform(&state, script.image);
});
