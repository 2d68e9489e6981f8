use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::event::{
    Event, KeyPressed, KeyReleased, MouseButtonPressed, MouseButtonReleased, MouseMoved,
    WindowClose, WindowResize,
};
use crate::input::{KeyCode, MouseButton};

/// Translates a winit `WindowEvent` into an engine [`Event`].
///
/// `cursor` is the last known pointer position (physical pixels); winit does not
/// attach it to button events. Returns `None` for events the engine does not model
/// and for keys without an engine code.
pub(crate) fn translate_window_event(event: &WindowEvent, cursor: (f64, f64)) -> Option<Event> {
    match event {
        WindowEvent::Resized(size) => Some(
            WindowResize {
                width: size.width,
                height: size.height,
            }
            .into(),
        ),

        WindowEvent::CloseRequested => Some(WindowClose.into()),

        WindowEvent::CursorMoved { position, .. } => Some(
            MouseMoved {
                x: position.x,
                y: position.y,
            }
            .into(),
        ),

        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_mouse_button(*button);
            let (x, y) = cursor;
            Some(match state {
                ElementState::Pressed => MouseButtonPressed { button, x, y }.into(),
                ElementState::Released => MouseButtonReleased { button, x, y }.into(),
            })
        }

        WindowEvent::KeyboardInput { event, .. } => {
            let Some(key) = map_key(event.physical_key) else {
                log::trace!("unmapped key {:?}", event.physical_key);
                return None;
            };
            Some(match event.state {
                ElementState::Pressed => KeyPressed {
                    key,
                    repeat: event.repeat,
                }
                .into(),
                ElementState::Released => KeyReleased { key }.into(),
            })
        }

        _ => None,
    }
}

pub(crate) fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::LEFT,
        WinitMouseButton::Right => MouseButton::RIGHT,
        WinitMouseButton::Middle => MouseButton::MIDDLE,
        WinitMouseButton::Back => MouseButton::BACK,
        WinitMouseButton::Forward => MouseButton::FORWARD,
        // Out-of-range values survive so the latch can reject them.
        WinitMouseButton::Other(v) => MouseButton(u8::try_from(v).unwrap_or(u8::MAX)),
    }
}

pub(crate) fn map_key(pk: PhysicalKey) -> Option<KeyCode> {
    let PhysicalKey::Code(code) = pk else {
        return None;
    };

    let key = match code {
        WinitKeyCode::Space => KeyCode::SPACE,
        WinitKeyCode::Quote => KeyCode::APOSTROPHE,
        WinitKeyCode::Comma => KeyCode::COMMA,
        WinitKeyCode::Minus => KeyCode::MINUS,
        WinitKeyCode::Period => KeyCode::PERIOD,
        WinitKeyCode::Slash => KeyCode::SLASH,
        WinitKeyCode::Semicolon => KeyCode::SEMICOLON,
        WinitKeyCode::Equal => KeyCode::EQUAL,
        WinitKeyCode::BracketLeft => KeyCode::LEFT_BRACKET,
        WinitKeyCode::Backslash => KeyCode::BACKSLASH,
        WinitKeyCode::BracketRight => KeyCode::RIGHT_BRACKET,
        WinitKeyCode::Backquote => KeyCode::GRAVE_ACCENT,

        WinitKeyCode::Digit0 => KeyCode::DIGIT_0,
        WinitKeyCode::Digit1 => KeyCode::DIGIT_1,
        WinitKeyCode::Digit2 => KeyCode::DIGIT_2,
        WinitKeyCode::Digit3 => KeyCode::DIGIT_3,
        WinitKeyCode::Digit4 => KeyCode::DIGIT_4,
        WinitKeyCode::Digit5 => KeyCode::DIGIT_5,
        WinitKeyCode::Digit6 => KeyCode::DIGIT_6,
        WinitKeyCode::Digit7 => KeyCode::DIGIT_7,
        WinitKeyCode::Digit8 => KeyCode::DIGIT_8,
        WinitKeyCode::Digit9 => KeyCode::DIGIT_9,

        WinitKeyCode::KeyA => KeyCode::A,
        WinitKeyCode::KeyB => KeyCode::B,
        WinitKeyCode::KeyC => KeyCode::C,
        WinitKeyCode::KeyD => KeyCode::D,
        WinitKeyCode::KeyE => KeyCode::E,
        WinitKeyCode::KeyF => KeyCode::F,
        WinitKeyCode::KeyG => KeyCode::G,
        WinitKeyCode::KeyH => KeyCode::H,
        WinitKeyCode::KeyI => KeyCode::I,
        WinitKeyCode::KeyJ => KeyCode::J,
        WinitKeyCode::KeyK => KeyCode::K,
        WinitKeyCode::KeyL => KeyCode::L,
        WinitKeyCode::KeyM => KeyCode::M,
        WinitKeyCode::KeyN => KeyCode::N,
        WinitKeyCode::KeyO => KeyCode::O,
        WinitKeyCode::KeyP => KeyCode::P,
        WinitKeyCode::KeyQ => KeyCode::Q,
        WinitKeyCode::KeyR => KeyCode::R,
        WinitKeyCode::KeyS => KeyCode::S,
        WinitKeyCode::KeyT => KeyCode::T,
        WinitKeyCode::KeyU => KeyCode::U,
        WinitKeyCode::KeyV => KeyCode::V,
        WinitKeyCode::KeyW => KeyCode::W,
        WinitKeyCode::KeyX => KeyCode::X,
        WinitKeyCode::KeyY => KeyCode::Y,
        WinitKeyCode::KeyZ => KeyCode::Z,

        WinitKeyCode::Escape => KeyCode::ESCAPE,
        WinitKeyCode::Enter => KeyCode::ENTER,
        WinitKeyCode::Tab => KeyCode::TAB,
        WinitKeyCode::Backspace => KeyCode::BACKSPACE,
        WinitKeyCode::Insert => KeyCode::INSERT,
        WinitKeyCode::Delete => KeyCode::DELETE,
        WinitKeyCode::ArrowRight => KeyCode::RIGHT,
        WinitKeyCode::ArrowLeft => KeyCode::LEFT,
        WinitKeyCode::ArrowDown => KeyCode::DOWN,
        WinitKeyCode::ArrowUp => KeyCode::UP,
        WinitKeyCode::PageUp => KeyCode::PAGE_UP,
        WinitKeyCode::PageDown => KeyCode::PAGE_DOWN,
        WinitKeyCode::Home => KeyCode::HOME,
        WinitKeyCode::End => KeyCode::END,
        WinitKeyCode::CapsLock => KeyCode::CAPS_LOCK,
        WinitKeyCode::ScrollLock => KeyCode::SCROLL_LOCK,
        WinitKeyCode::NumLock => KeyCode::NUM_LOCK,
        WinitKeyCode::PrintScreen => KeyCode::PRINT_SCREEN,
        WinitKeyCode::Pause => KeyCode::PAUSE,

        WinitKeyCode::F1 => KeyCode::F1,
        WinitKeyCode::F2 => KeyCode::F2,
        WinitKeyCode::F3 => KeyCode::F3,
        WinitKeyCode::F4 => KeyCode::F4,
        WinitKeyCode::F5 => KeyCode::F5,
        WinitKeyCode::F6 => KeyCode::F6,
        WinitKeyCode::F7 => KeyCode::F7,
        WinitKeyCode::F8 => KeyCode::F8,
        WinitKeyCode::F9 => KeyCode::F9,
        WinitKeyCode::F10 => KeyCode::F10,
        WinitKeyCode::F11 => KeyCode::F11,
        WinitKeyCode::F12 => KeyCode::F12,

        WinitKeyCode::Numpad0 => KeyCode::KEYPAD_0,
        WinitKeyCode::Numpad1 => KeyCode::KEYPAD_1,
        WinitKeyCode::Numpad2 => KeyCode::KEYPAD_2,
        WinitKeyCode::Numpad3 => KeyCode::KEYPAD_3,
        WinitKeyCode::Numpad4 => KeyCode::KEYPAD_4,
        WinitKeyCode::Numpad5 => KeyCode::KEYPAD_5,
        WinitKeyCode::Numpad6 => KeyCode::KEYPAD_6,
        WinitKeyCode::Numpad7 => KeyCode::KEYPAD_7,
        WinitKeyCode::Numpad8 => KeyCode::KEYPAD_8,
        WinitKeyCode::Numpad9 => KeyCode::KEYPAD_9,

        WinitKeyCode::ShiftLeft => KeyCode::LEFT_SHIFT,
        WinitKeyCode::ControlLeft => KeyCode::LEFT_CONTROL,
        WinitKeyCode::AltLeft => KeyCode::LEFT_ALT,
        WinitKeyCode::SuperLeft => KeyCode::LEFT_SUPER,
        WinitKeyCode::ShiftRight => KeyCode::RIGHT_SHIFT,
        WinitKeyCode::ControlRight => KeyCode::RIGHT_CONTROL,
        WinitKeyCode::AltRight => KeyCode::RIGHT_ALT,
        WinitKeyCode::SuperRight => KeyCode::RIGHT_SUPER,
        WinitKeyCode::ContextMenu => KeyCode::MENU,

        _ => return None,
    };

    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn letters_map_to_ascii_codes() {
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::KeyW)), Some(KeyCode::W));
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::ArrowUp)), Some(KeyCode::UP));
        assert_eq!(map_key(PhysicalKey::Code(WinitKeyCode::F13)), None);
    }

    #[test]
    fn extra_buttons_keep_their_number() {
        assert_eq!(map_mouse_button(WinitMouseButton::Right), MouseButton::RIGHT);
        assert_eq!(map_mouse_button(WinitMouseButton::Other(6)), MouseButton(6));
        assert_eq!(map_mouse_button(WinitMouseButton::Other(900)), MouseButton(u8::MAX));
    }

    #[test]
    fn resize_and_close_translate() {
        let ev = translate_window_event(&WindowEvent::Resized(PhysicalSize::new(300, 200)), (0.0, 0.0));
        assert_eq!(
            ev,
            Some(Event::WindowResize(WindowResize {
                width: 300,
                height: 200
            }))
        );

        let ev = translate_window_event(&WindowEvent::CloseRequested, (0.0, 0.0));
        assert_eq!(ev, Some(Event::WindowClose(WindowClose)));

        assert_eq!(translate_window_event(&WindowEvent::Focused(true), (0.0, 0.0)), None);
    }
}
