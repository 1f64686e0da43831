//! winit event translation.

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};

use super::types::{Button, ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Translates one winit `WindowEvent` into zero or more `InputEvent`s.
///
/// `scale` is the window's scale factor; positions come out in logical pixels.
/// A key press carrying printable text yields a `Button` event followed by a
/// `Text` event.
pub(crate) fn translate_window_event(
    scale: f64,
    event: &WindowEvent,
    mut emit: impl FnMut(InputEvent),
) {
    match event {
        WindowEvent::ModifiersChanged(m) => {
            emit(InputEvent::ModifiersChanged(map_modifiers(m.state())));
        }

        WindowEvent::Focused(f) => emit(InputEvent::Focused(*f)),

        WindowEvent::CursorMoved { position, .. } => {
            let (x, y) = to_logical(scale, *position);
            emit(InputEvent::CursorMoved { x, y });
        }

        WindowEvent::MouseInput { state, button, .. } => emit(InputEvent::Button {
            button: Button::Mouse(map_mouse_button(*button)),
            state: map_state(*state),
            repeat: false,
        }),

        WindowEvent::MouseWheel { delta, .. } => {
            let (dx, dy) = match delta {
                MouseScrollDelta::LineDelta(x, y) => (f64::from(*x), f64::from(*y)),
                MouseScrollDelta::PixelDelta(p) => to_logical(scale, *p),
            };
            emit(InputEvent::Scroll { dx, dy });
        }

        WindowEvent::KeyboardInput { event, .. } => {
            emit(InputEvent::Button {
                button: Button::Key(map_key(event.physical_key)),
                state: map_state(event.state),
                repeat: event.repeat,
            });

            if event.state == ElementState::Pressed {
                if let Some(text) = event.text.as_deref().and_then(printable) {
                    emit(InputEvent::Text(text));
                }
            }
        }

        WindowEvent::Ime(Ime::Commit(text)) => {
            if let Some(text) = printable(text) {
                emit(InputEvent::Text(text));
            }
        }

        _ => {}
    }
}

/// Drops control characters (Enter, Backspace, Escape...) from key text.
fn printable(text: &str) -> Option<String> {
    let text: String = text.chars().filter(|c| !c.is_control()).collect();
    (!text.is_empty()).then_some(text)
}

fn to_logical(scale: f64, pos: PhysicalPosition<f64>) -> (f64, f64) {
    let logical = pos.to_logical::<f64>(scale);
    (logical.x, logical.y)
}

fn map_state(state: ElementState) -> ButtonState {
    match state {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    match pk {
        PhysicalKey::Code(code) => match code {
            KeyCode::Escape => Key::Escape,
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Space => Key::Space,

            KeyCode::Insert => Key::Insert,
            KeyCode::Delete => Key::Delete,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,

            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,

            KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
            KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
            KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
            KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

            KeyCode::KeyA => Key::A,
            KeyCode::KeyB => Key::B,
            KeyCode::KeyC => Key::C,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyE => Key::E,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyG => Key::G,
            KeyCode::KeyH => Key::H,
            KeyCode::KeyI => Key::I,
            KeyCode::KeyJ => Key::J,
            KeyCode::KeyK => Key::K,
            KeyCode::KeyL => Key::L,
            KeyCode::KeyM => Key::M,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyQ => Key::Q,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyT => Key::T,
            KeyCode::KeyU => Key::U,
            KeyCode::KeyV => Key::V,
            KeyCode::KeyW => Key::W,
            KeyCode::KeyX => Key::X,
            KeyCode::KeyY => Key::Y,
            KeyCode::KeyZ => Key::Z,

            KeyCode::Digit0 => Key::Digit0,
            KeyCode::Digit1 => Key::Digit1,
            KeyCode::Digit2 => Key::Digit2,
            KeyCode::Digit3 => Key::Digit3,
            KeyCode::Digit4 => Key::Digit4,
            KeyCode::Digit5 => Key::Digit5,
            KeyCode::Digit6 => Key::Digit6,
            KeyCode::Digit7 => Key::Digit7,
            KeyCode::Digit8 => Key::Digit8,
            KeyCode::Digit9 => Key::Digit9,

            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            KeyCode::F3 => Key::F3,
            KeyCode::F4 => Key::F4,
            KeyCode::F5 => Key::F5,
            KeyCode::F6 => Key::F6,
            KeyCode::F7 => Key::F7,
            KeyCode::F8 => Key::F8,
            KeyCode::F9 => Key::F9,
            KeyCode::F10 => Key::F10,
            KeyCode::F11 => Key::F11,
            KeyCode::F12 => Key::F12,

            other => Key::Unknown(other as u32),
        },

        PhysicalKey::Unidentified(_) => Key::Unknown(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::DeviceId;

    fn collect(scale: f64, event: WindowEvent) -> Vec<InputEvent> {
        let mut out = Vec::new();
        translate_window_event(scale, &event, |e| out.push(e));
        out
    }

    fn device() -> DeviceId {
        // SAFETY: only used as an opaque tag inside test events.
        unsafe { DeviceId::dummy() }
    }

    #[test]
    fn cursor_is_reported_in_logical_pixels() {
        let events = collect(
            2.0,
            WindowEvent::CursorMoved {
                device_id: device(),
                position: PhysicalPosition::new(100.0, 50.0),
            },
        );
        assert_eq!(events, vec![InputEvent::CursorMoved { x: 50.0, y: 25.0 }]);
    }

    #[test]
    fn line_scroll_is_passed_through() {
        let events = collect(
            2.0,
            WindowEvent::MouseWheel {
                device_id: device(),
                delta: MouseScrollDelta::LineDelta(0.0, -1.0),
                phase: winit::event::TouchPhase::Moved,
            },
        );
        assert_eq!(events, vec![InputEvent::Scroll { dx: 0.0, dy: -1.0 }]);
    }

    #[test]
    fn mouse_buttons_map_to_button_events() {
        let events = collect(
            1.0,
            WindowEvent::MouseInput {
                device_id: device(),
                state: ElementState::Released,
                button: WinitMouseButton::Other(9),
            },
        );
        assert_eq!(
            events,
            vec![InputEvent::Button {
                button: Button::Mouse(MouseButton::Other(9)),
                state: ButtonState::Released,
                repeat: false,
            }]
        );
    }

    #[test]
    fn ime_commit_strips_control_characters() {
        let events = collect(1.0, WindowEvent::Ime(Ime::Commit("\u{8}".into())));
        assert!(events.is_empty());
        let events = collect(1.0, WindowEvent::Ime(Ime::Commit("é".into())));
        assert_eq!(events, vec![InputEvent::Text("é".into())]);
    }

    #[test]
    fn key_codes_map_by_position() {
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::KeyW)), Key::W);
        assert_eq!(map_key(PhysicalKey::Code(KeyCode::ShiftRight)), Key::Shift);
        assert!(matches!(
            map_key(PhysicalKey::Code(KeyCode::NumpadAdd)),
            Key::Unknown(_)
        ));
    }
}
