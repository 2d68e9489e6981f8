use anyhow::Result;

use crate::input::MouseButton;

use super::ctx::FrameCtx;

/// Application contract implemented by higher layers.
///
/// Per frame the runtime calls `on_draw`, then `on_ui_draw` inside the overlay
/// bracket, presents, and finally calls `on_update`.
pub trait App {
    /// Called once after the render context is current. Build GPU resources here.
    fn on_start(&mut self, ctx: &mut FrameCtx<'_>) -> Result<()>;

    fn on_draw(&mut self, ctx: &mut FrameCtx<'_>) {
        let _ = ctx;
    }

    fn on_ui_draw(&mut self, ctx: &mut FrameCtx<'_>) {
        let _ = ctx;
    }

    fn on_update(&mut self, ctx: &mut FrameCtx<'_>) {
        let _ = ctx;
    }

    /// Called for every mouse button transition, after the input latch is updated.
    fn on_mouse_button_event(
        &mut self,
        ctx: &mut FrameCtx<'_>,
        button: MouseButton,
        x: f64,
        y: f64,
        pressed: bool,
    ) {
        let _ = (ctx, button, x, y, pressed);
    }
}

/// Immediate-mode UI layer bracketing [`App::on_ui_draw`].
pub trait UiOverlay {
    fn begin_frame(&mut self, ctx: &FrameCtx<'_>);
    fn end_frame(&mut self, ctx: &FrameCtx<'_>);
}

/// Overlay that does nothing.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoOverlay;

impl UiOverlay for NoOverlay {
    fn begin_frame(&mut self, _ctx: &FrameCtx<'_>) {}
    fn end_frame(&mut self, _ctx: &FrameCtx<'_>) {}
}
