//! Recorded sessions: a viewport, an image and the input events that
//! followed, replayed through a fresh coordinator.

use pz_core::{Size, ViewState, ViewStore, ViewerConfig, ViewerError};
use pz_engine::Fit;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GestureCoordinator, InputEvent, LoadOutcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScript {
    pub viewport: Size,
    pub image: Size,
    #[serde(default)]
    pub events: Vec<InputEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    pub index: usize,
    pub event: InputEvent,
    pub changed: bool,
    pub state: ViewState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub fit: Fit,
    pub state: ViewState,
    pub events_applied: usize,
    pub events_ignored: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<TraceEntry>,
}

/// Load `script.image` into `script.viewport` and dispatch every event in
/// order. Fails only when the image cannot be fitted.
pub fn replay(
    script: &SessionScript,
    config: ViewerConfig,
    record_trace: bool,
) -> Result<ReplayOutcome, ViewerError> {
    let mut store = ViewStore::new();
    let mut coordinator = GestureCoordinator::new(script.viewport, config);

    let token = coordinator.begin_load(&mut store);
    let LoadOutcome::Applied(fit) =
        coordinator.on_image_loaded(&mut store, token, Ok(script.image))?
    else {
        return Err(ViewerError::ImageLoadFailed {
            reason: "load superseded".to_string(),
        });
    };

    let mut outcome = ReplayOutcome {
        fit,
        state: store.state(),
        events_applied: 0,
        events_ignored: 0,
        trace: Vec::new(),
    };

    for (index, event) in script.events.iter().copied().enumerate() {
        let changed = coordinator.dispatch(event, &mut store);
        if changed {
            outcome.events_applied += 1;
        } else {
            outcome.events_ignored += 1;
        }
        if record_trace {
            outcome.trace.push(TraceEntry {
                index,
                event,
                changed,
                state: store.state(),
            });
        }
    }

    outcome.state = store.state();
    debug!(
        applied = outcome.events_applied,
        ignored = outcome.events_ignored,
        "session replayed"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pz_core::Point;

    fn script(json: &str) -> SessionScript {
        serde_json::from_str(json).expect("valid script")
    }

    #[test]
    fn replays_drag_and_slider() {
        let script = script(
            r#"{
                "viewport": {"width": 800, "height": 600},
                "image": {"width": 1600, "height": 800},
                "events": [
                    {"type": "slider", "value": 2},
                    {"type": "dragStart"},
                    {"type": "dragMove", "dx": -100, "dy": -100},
                    {"type": "dragEnd"},
                    {"type": "wheel", "deltaY": -40}
                ]
            }"#,
        );
        let outcome = replay(&script, ViewerConfig::default(), true).expect("replay");

        assert_eq!(outcome.fit.min_scale, 0.5);
        assert_eq!(outcome.state.scale, 2.0);
        assert_eq!(outcome.state.position, Point::new(-100.0, -100.0));
        assert_eq!(outcome.events_applied, 4);
        assert_eq!(outcome.events_ignored, 1);
        assert_eq!(outcome.trace.len(), 5);
        assert!(outcome.trace[2].state.is_dragging);
        assert!(!outcome.trace[4].changed);
    }

    #[test]
    fn events_default_to_empty() {
        let script = script(
            r#"{"viewport": {"width": 100, "height": 100}, "image": {"width": 50, "height": 25}}"#,
        );
        let outcome = replay(&script, ViewerConfig::default(), false).expect("replay");
        assert_eq!(outcome.state.scale, 2.0);
        assert_eq!(outcome.state.position, Point::new(0.0, 25.0));
        assert!(outcome.trace.is_empty());
    }

    #[test]
    fn unfittable_image_is_an_error() {
        let script = script(
            r#"{"viewport": {"width": 0, "height": 100}, "image": {"width": 50, "height": 25}}"#,
        );
        let err = replay(&script, ViewerConfig::default(), false).expect_err("zero viewport");
        assert_eq!(err.code().as_str(), "panzoom/error/geometry");
    }
}
