#![no_main]

use libfuzzer_sys::fuzz_target;
use pz_core::{Modifiers, Size, ViewStore, ViewerConfig, ViewportGeometry};
use pz_engine::position_bounds;
use pz_gesture::{GestureCoordinator, InputEvent, WheelInput};

fn value(chunk: &[u8]) -> f64 {
    let raw = i16::from_le_bytes([chunk[1], chunk[2]]);
    f64::from(raw) / 8.0
}

fn event(chunk: &[u8]) -> InputEvent {
    let v = value(chunk);
    match chunk[0] % 10 {
        0 => InputEvent::DragStart,
        1 => InputEvent::DragMove { dx: v, dy: -v * 1.5 },
        2 => InputEvent::DragEnd,
        3 => InputEvent::PinchStart,
        4 => InputEvent::Pinch { scale: v / 64.0 },
        5 => InputEvent::PinchEnd,
        6 => InputEvent::Wheel(WheelInput {
            delta_y: v,
            modifiers: Modifiers {
                ctrl: chunk[0] & 0x80 != 0,
                ..Modifiers::NONE
            },
        }),
        7 => InputEvent::Slider { value: v / 32.0 },
        8 => InputEvent::ZoomIn,
        _ => InputEvent::ZoomOut,
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let viewport = Size::new(f64::from(data[0]) + 1.0, f64::from(data[1]) + 1.0);
    let image = Size::new(f64::from(data[2]) * 8.0 + 1.0, f64::from(data[3]) * 8.0 + 1.0);
    let geometry = ViewportGeometry::new(viewport, image);

    let mut store = ViewStore::new();
    let mut coordinator = GestureCoordinator::new(viewport, ViewerConfig::default());
    let token = coordinator.begin_load(&mut store);
    if coordinator
        .on_image_loaded(&mut store, token, Ok(image))
        .is_err()
    {
        return;
    }

    for chunk in data[4..].chunks_exact(3) {
        coordinator.dispatch(event(chunk), &mut store);
        let state = store.state();
        assert!(coordinator.zoom_limits(&state).contains(state.scale));
        let bounds = position_bounds(&geometry, state.scale).expect("positive scale");
        assert!(bounds.contains(state.position), "{state:?}");
    }
});
