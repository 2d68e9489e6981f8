use super::types::{KeyCode, MouseButton};

/// Pressed/released state of every key and mouse button.
///
/// Written by event handlers and read by per-frame logic. Codes outside the
/// defined range are ignored on write and always read as released.
#[derive(Debug, Clone)]
pub struct InputLatch {
    keys: [bool; KeyCode::COUNT],
    buttons: [bool; MouseButton::COUNT],
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl InputLatch {
    pub fn new() -> Self {
        Self {
            keys: [false; KeyCode::COUNT],
            buttons: [false; MouseButton::COUNT],
        }
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.set_key(key, true);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.set_key(key, false);
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.get(key.index()).copied().unwrap_or(false)
    }

    pub fn press_mouse_button(&mut self, button: MouseButton) {
        self.set_button(button, true);
    }

    pub fn release_mouse_button(&mut self, button: MouseButton) {
        self.set_button(button, false);
    }

    pub fn is_mouse_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons.get(button.index()).copied().unwrap_or(false)
    }

    /// Marks everything released, e.g. after the window loses focus.
    pub fn release_all(&mut self) {
        self.keys.fill(false);
        self.buttons.fill(false);
    }

    fn set_key(&mut self, key: KeyCode, pressed: bool) {
        match self.keys.get_mut(key.index()) {
            Some(slot) => *slot = pressed,
            None => log::warn!("ignoring out-of-range key code {}", key.0),
        }
    }

    fn set_button(&mut self, button: MouseButton, pressed: bool) {
        match self.buttons.get_mut(button.index()) {
            Some(slot) => *slot = pressed,
            None => log::warn!("ignoring out-of-range mouse button {}", button.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_then_release() {
        let mut latch = InputLatch::new();
        assert!(!latch.is_key_pressed(KeyCode::W));

        latch.press_key(KeyCode::W);
        assert!(latch.is_key_pressed(KeyCode::W));
        assert!(!latch.is_key_pressed(KeyCode::S));

        latch.release_key(KeyCode::W);
        assert!(!latch.is_key_pressed(KeyCode::W));
    }

    #[test]
    fn mouse_buttons_are_independent() {
        let mut latch = InputLatch::new();
        latch.press_mouse_button(MouseButton::RIGHT);
        latch.press_mouse_button(MouseButton::LEFT);
        latch.release_mouse_button(MouseButton::LEFT);

        assert!(latch.is_mouse_button_pressed(MouseButton::RIGHT));
        assert!(!latch.is_mouse_button_pressed(MouseButton::LEFT));
        assert!(!latch.is_mouse_button_pressed(MouseButton::MIDDLE));
    }

    #[test]
    fn out_of_range_codes_are_ignored() {
        let mut latch = InputLatch::new();
        latch.press_key(KeyCode(KeyCode::LAST.0 + 1));
        latch.press_key(KeyCode(u16::MAX));
        latch.press_mouse_button(MouseButton(200));

        assert!(!latch.is_key_pressed(KeyCode(u16::MAX)));
        assert!(!latch.is_mouse_button_pressed(MouseButton(200)));
    }

    #[test]
    fn last_key_is_addressable() {
        let mut latch = InputLatch::new();
        latch.press_key(KeyCode::LAST);
        assert!(latch.is_key_pressed(KeyCode::LAST));
    }

    #[test]
    fn release_all_clears_everything() {
        let mut latch = InputLatch::new();
        latch.press_key(KeyCode::ESCAPE);
        latch.press_mouse_button(MouseButton::MIDDLE);
        latch.release_all();

        assert!(!latch.is_key_pressed(KeyCode::ESCAPE));
        assert!(!latch.is_mouse_button_pressed(MouseButton::MIDDLE));
    }
}
