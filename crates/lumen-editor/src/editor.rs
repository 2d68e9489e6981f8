use anyhow::Result;

use lumen_engine::core::{App, FrameCtx};
use lumen_engine::input::MouseButton;

use crate::controls::CameraControls;
use crate::scene::{CubeScene, ModelTransform};

/// Cube scene with free-fly camera controls.
pub(crate) struct Editor {
    scene: Option<CubeScene>,
    model: ModelTransform,
    controls: CameraControls,
    current_frame: i32,
}

impl Editor {
    pub fn new() -> Self {
        log::info!("Starting application");
        Self {
            scene: None,
            model: ModelTransform::default(),
            controls: CameraControls::default(),
            current_frame: 0,
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        log::info!("Closing application");
    }
}

impl App for Editor {
    fn on_start(&mut self, _ctx: &mut FrameCtx<'_>) -> Result<()> {
        self.scene = Some(CubeScene::new()?);
        Ok(())
    }

    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) {
        let Some(scene) = &self.scene else {
            return;
        };

        let view_projection = ctx.camera_mut().view_projection_matrix();
        scene.draw(&self.model, view_projection, self.current_frame);
        self.current_frame = self.current_frame.wrapping_add(1);
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) {
        let cursor = ctx.cursor();
        let (camera, input) = ctx.camera_and_input();
        self.controls.update(camera, input, cursor);
    }

    fn on_mouse_button_event(
        &mut self,
        _ctx: &mut FrameCtx<'_>,
        _button: MouseButton,
        x: f64,
        y: f64,
        _pressed: bool,
    ) {
        self.controls.set_anchor(x, y);
    }
}
