use glam::Vec3;

use lumen_engine::camera::Camera;
use lumen_engine::input::{InputLatch, KeyCode, MouseButton};

const MOVE_STEP: f32 = 0.005;
const TURN_STEP: f32 = 0.001;

/// Pixels of cursor travel per world unit when panning.
const PAN_SCALE: f64 = 100.0;
/// Pixels of cursor travel per degree when looking around.
const LOOK_SCALE: f64 = 5.0;

/// Movement (forward, right, up) and rotation (roll, pitch, yaw) from the first
/// pressed key, in priority order W S A D E Q ↑ ↓ → ← P O.
pub(crate) fn keyboard_deltas(input: &InputLatch) -> (Vec3, Vec3) {
    let mut movement = Vec3::ZERO;
    let mut rotation = Vec3::ZERO;

    if input.is_key_pressed(KeyCode::W) {
        movement.x += MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::S) {
        movement.x -= MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::A) {
        movement.y -= MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::D) {
        movement.y += MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::E) {
        movement.z += MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::Q) {
        movement.z -= MOVE_STEP;
    } else if input.is_key_pressed(KeyCode::UP) {
        rotation.y -= TURN_STEP;
    } else if input.is_key_pressed(KeyCode::DOWN) {
        rotation.y += TURN_STEP;
    } else if input.is_key_pressed(KeyCode::RIGHT) {
        rotation.z -= TURN_STEP;
    } else if input.is_key_pressed(KeyCode::LEFT) {
        rotation.z += TURN_STEP;
    } else if input.is_key_pressed(KeyCode::P) {
        rotation.x += TURN_STEP;
    } else if input.is_key_pressed(KeyCode::O) {
        rotation.x -= TURN_STEP;
    }

    (movement, rotation)
}

/// Free-fly camera controls.
///
/// Keys always move the camera. Holding the right button adds mouse look;
/// holding both buttons pans instead. While the right button is held the
/// keyboard deltas are applied twice per frame.
#[derive(Debug, Default)]
pub(crate) struct CameraControls {
    anchor: (f64, f64),
}

impl CameraControls {
    /// Restarts mouse tracking from `(x, y)`.
    pub fn set_anchor(&mut self, x: f64, y: f64) {
        self.anchor = (x, y);
    }

    pub fn update(&mut self, camera: &mut Camera, input: &InputLatch, cursor: (f64, f64)) {
        let (movement, mut rotation) = keyboard_deltas(input);

        if input.is_mouse_button_pressed(MouseButton::RIGHT) {
            camera.add_movement_and_rotation(movement, rotation);

            let (x, y) = cursor;
            let (anchor_x, anchor_y) = self.anchor;

            if input.is_mouse_button_pressed(MouseButton::LEFT) {
                camera.move_right(((x - anchor_x) / PAN_SCALE) as f32);
                camera.move_up(((anchor_y - y) / PAN_SCALE) as f32);
            } else {
                rotation.z += ((anchor_x - x) / LOOK_SCALE) as f32;
                rotation.y -= ((anchor_y - y) / LOOK_SCALE) as f32;
            }

            self.anchor = cursor;
        }

        camera.add_movement_and_rotation(movement, rotation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    // ── keyboard ──────────────────────────────────────────────────────────

    #[test]
    fn no_keys_no_deltas() {
        assert_eq!(keyboard_deltas(&InputLatch::new()), (Vec3::ZERO, Vec3::ZERO));
    }

    #[test]
    fn first_pressed_key_wins() {
        let mut input = InputLatch::new();
        input.press_key(KeyCode::S);
        input.press_key(KeyCode::W);
        input.press_key(KeyCode::UP);

        let (movement, rotation) = keyboard_deltas(&input);
        assert_eq!(movement, Vec3::new(MOVE_STEP, 0.0, 0.0));
        assert_eq!(rotation, Vec3::ZERO);
    }

    #[test]
    fn arrows_rotate() {
        let mut input = InputLatch::new();
        input.press_key(KeyCode::LEFT);
        assert_eq!(keyboard_deltas(&input).1, Vec3::new(0.0, 0.0, TURN_STEP));
    }

    // ── mouse ─────────────────────────────────────────────────────────────

    #[test]
    fn cursor_ignored_without_right_button() {
        let mut camera = Camera::default();
        let mut controls = CameraControls::default();
        controls.update(&mut camera, &InputLatch::new(), (500.0, 500.0));

        assert_eq!(camera.rotation(), Vec3::ZERO);
        assert_eq!(camera.position(), Vec3::ZERO);
    }

    #[test]
    fn right_drag_looks_around() {
        let mut camera = Camera::default();
        let mut input = InputLatch::new();
        input.press_mouse_button(MouseButton::RIGHT);

        let mut controls = CameraControls::default();
        controls.set_anchor(100.0, 100.0);
        controls.update(&mut camera, &input, (110.0, 90.0));

        assert!(camera.rotation().abs_diff_eq(Vec3::new(0.0, -2.0, -2.0), EPS));
        assert_eq!(controls.anchor, (110.0, 90.0));
    }

    #[test]
    fn both_buttons_pan() {
        let mut camera = Camera::default();
        let mut input = InputLatch::new();
        input.press_mouse_button(MouseButton::RIGHT);
        input.press_mouse_button(MouseButton::LEFT);

        let mut controls = CameraControls::default();
        controls.set_anchor(100.0, 100.0);
        controls.update(&mut camera, &input, (200.0, 50.0));

        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, -1.0, 0.5), EPS));
        assert_eq!(camera.rotation(), Vec3::ZERO);
    }

    #[test]
    fn right_button_doubles_keyboard_motion() {
        let mut camera = Camera::default();
        let mut input = InputLatch::new();
        input.press_key(KeyCode::W);
        input.press_mouse_button(MouseButton::RIGHT);

        let mut controls = CameraControls::default();
        controls.update(&mut camera, &input, (0.0, 0.0));

        assert!(camera.position().abs_diff_eq(Vec3::new(2.0 * MOVE_STEP, 0.0, 0.0), EPS));
    }
}
