use winit::window::Window;

use crate::camera::Camera;
use crate::input::InputLatch;

/// Per-frame context passed to [`App`](super::App) hooks.
///
/// `'a` is the duration of the callback invocation.
pub struct FrameCtx<'a> {
    window: Option<&'a Window>,
    camera: &'a mut Camera,
    input: &'a InputLatch,
    cursor: (f64, f64),
    frame_index: u64,
    close_requested: bool,
}

impl<'a> FrameCtx<'a> {
    pub fn new(
        window: Option<&'a Window>,
        camera: &'a mut Camera,
        input: &'a InputLatch,
        cursor: (f64, f64),
        frame_index: u64,
    ) -> Self {
        Self {
            window,
            camera,
            input,
            cursor,
            frame_index,
            close_requested: false,
        }
    }

    /// `None` when running without a platform window (headless).
    pub fn window(&self) -> Option<&Window> {
        self.window
    }

    pub fn camera(&self) -> &Camera {
        self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        self.camera
    }

    pub fn input(&self) -> &InputLatch {
        self.input
    }

    /// Mutable camera together with the input latch, for controllers that need both.
    pub fn camera_and_input(&mut self) -> (&mut Camera, &InputLatch) {
        (&mut *self.camera, self.input)
    }

    /// Last known cursor position in physical pixels, origin top-left.
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Number of frames completed before this one.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Stops the loop after the current frame.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}
