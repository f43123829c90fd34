//! Integration tests for the panzoom pipeline.
//!
//! These tests drive the flow from image load through gestures to the render
//! transform, and run the CLI binary against script and config files.

use std::io::Write;
use std::process::Command;

use pz_core::{Modifiers, Point, Size, ViewStore, ViewerConfig, ViewportGeometry};
use pz_engine::position_bounds;
use pz_gesture::{
    GestureCoordinator, GestureKind, GesturePayload, InputEvent, SessionScript, WheelInput,
    replay,
};
use pz_render::{RenderFrame, css_transform, viewport_to_image};

const VIEWPORT: Size = Size::new(800.0, 600.0);
const IMAGE: Size = Size::new(1600.0, 800.0);

fn pz_cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pz-cli"))
}

/// Load, pinch, drag and wheel, checking the render output at each step.
#[test]
fn load_gesture_render_pipeline() {
    let mut store = ViewStore::new();
    let mut coordinator = GestureCoordinator::new(VIEWPORT, ViewerConfig::default());

    let token = coordinator.begin_load(&mut store);
    coordinator
        .on_image_loaded(&mut store, token, Ok(IMAGE))
        .expect("image fits");
    assert_eq!(
        css_transform(&store.state(), IMAGE),
        "translate(-400px, -100px) scale(0.5)"
    );

    coordinator.on_gesture_update(
        GestureKind::Pinch,
        GesturePayload::Pinch { scale: 2.0 },
        &mut store,
    );
    coordinator.on_gesture_end(GestureKind::Pinch, &mut store);
    let state = store.state();
    assert_eq!(state.scale, 2.0);
    assert_eq!(state.position, Point::new(0.0, 0.0));

    coordinator.on_gesture_start(GestureKind::Drag, &mut store);
    coordinator.on_gesture_update(
        GestureKind::Drag,
        GesturePayload::Drag {
            dx: -3000.0,
            dy: -400.0,
        },
        &mut store,
    );
    let frame = RenderFrame::new(&store.state(), IMAGE, coordinator.config());
    assert_eq!(frame.transition, "none");
    assert_eq!(store.state().position, Point::new(-2400.0, -400.0));
    coordinator.on_gesture_end(GestureKind::Drag, &mut store);

    // The viewport's bottom-right corner shows the image's bottom-right region.
    let corner = viewport_to_image(&store.state(), Point::new(800.0, 600.0)).expect("invertible");
    assert_eq!(corner, Point::new(1600.0, 500.0));

    coordinator.on_wheel(
        WheelInput {
            delta_y: 500.0,
            modifiers: Modifiers::ctrl(),
        },
        &mut store,
    );
    let state = store.state();
    assert_eq!(state.scale, 0.5);
    let bounds = position_bounds(&ViewportGeometry::new(VIEWPORT, IMAGE), state.scale)
        .expect("valid geometry");
    assert!(bounds.contains(state.position));
}

#[test]
fn session_script_parses_every_event_kind() {
    let script: SessionScript = serde_json::from_str(
        r#"{
            "viewport": {"width": 800, "height": 600},
            "image": {"width": 1600, "height": 800},
            "events": [
                {"type": "dragStart"},
                {"type": "dragMove", "dx": 5, "dy": 5},
                {"type": "dragEnd"},
                {"type": "pinchStart"},
                {"type": "pinch", "scale": 1.5},
                {"type": "pinchEnd"},
                {"type": "wheel", "deltaY": 10, "modifiers": {"ctrl": true}},
                {"type": "slider", "value": 3},
                {"type": "zoomIn"},
                {"type": "zoomOut"}
            ]
        }"#,
    )
    .expect("valid script");

    assert_eq!(script.events.len(), 10);
    assert_eq!(script.events[4], InputEvent::Pinch { scale: 1.5 });

    let outcome = replay(&script, ViewerConfig::default(), false).expect("replay");
    assert!((outcome.state.scale - 3.0).abs() < 1e-9);
    assert!(!outcome.state.is_dragging);
}

#[test]
fn cli_fit_reports_json() {
    let output = pz_cli()
        .args(["fit", "--viewport", "800x600", "--image", "1600x800", "--json"])
        .output()
        .expect("run pz-cli");
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["minScale"], 0.5);
    assert!(value.get("min_scale").is_none());
    assert_eq!(value["position"]["y"], 100.0);
    assert_eq!(value["bounds"]["yMax"], 200.0);
}

#[test]
fn cli_bounds_reports_camel_case_json() {
    let output = pz_cli()
        .args([
            "bounds", "--viewport", "800x600", "--image", "1600x800", "--scale", "2", "--json",
        ])
        .output()
        .expect("run pz-cli");
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["bounds"]["xMin"], -2400.0);
    assert_eq!(value["slack"]["height"], 1000.0);
}

#[test]
fn cli_fit_rejects_zero_image() {
    let output = pz_cli()
        .args(["fit", "--viewport", "800x600", "--image", "0x800"])
        .output()
        .expect("run pz-cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Cannot fit image"), "{stderr}");
}

#[test]
fn cli_replays_script_file_with_config() {
    let dir = tempfile::tempdir().expect("tempdir");

    let script_path = dir.path().join("session.json");
    std::fs::write(
        &script_path,
        r#"{
            "viewport": {"width": 800, "height": 600},
            "image": {"width": 1600, "height": 800},
            "events": [
                {"type": "slider", "value": 9},
                {"type": "wheel", "deltaY": -100, "modifiers": {"alt": true}}
            ]
        }"#,
    )
    .expect("write script");

    let config_path = dir.path().join("viewer.toml");
    let mut config = std::fs::File::create(&config_path).expect("create config");
    writeln!(config, "maxScale = 6.0").expect("write config");
    writeln!(config, "zoomModifier = \"alt\"").expect("write config");
    writeln!(config, "transitionMs = 250").expect("write config");
    drop(config);

    let output = pz_cli()
        .arg("replay")
        .arg(&script_path)
        .arg("--config")
        .arg(&config_path)
        .arg("--trace")
        .output()
        .expect("run pz-cli");
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    // Slider clamps to the configured max; the alt-wheel zoom-in is clamped too.
    assert_eq!(value["state"]["scale"], 6.0);
    assert_eq!(value["eventsApplied"], 2);
    assert_eq!(value["trace"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["frame"]["transitionMs"], 250);
}

#[test]
fn cli_rejects_invalid_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config_path = dir.path().join("viewer.toml");
    std::fs::write(&config_path, "zoomStep = -0.5\n").expect("write config");

    let output = pz_cli()
        .arg("config")
        .arg("--config")
        .arg(&config_path)
        .output()
        .expect("run pz-cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("zoomStep"), "{stderr}");
}

#[test]
fn cli_config_prints_defaults() {
    let output = pz_cli().arg("config").output().expect("run pz-cli");
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["maxScale"], 4.0);
    assert_eq!(value["zoomModifier"], "control");
}
