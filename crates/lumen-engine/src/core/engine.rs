use std::sync::Arc;

use anyhow::{Context, Result, bail};
use glam::Vec3;
use winit::window::Window;

use crate::camera::{Camera, ProjectionMode};
use crate::device::SurfaceErrorAction;
use crate::event::{
    Event, EventDispatcher, KeyPressed, KeyReleased, MouseButtonPressed, MouseButtonReleased,
    MouseMoved, WindowClose, WindowResize,
};
use crate::input::{InputLatch, MouseButton};
use crate::render::Renderer;

use super::app::{App, NoOverlay, UiOverlay};
use super::ctx::FrameCtx;

const CLEAR_COLOR: [f32; 4] = [0.33, 0.33, 0.33, 0.0];
const CAMERA_START: Vec3 = Vec3::new(-5.0, 0.0, 0.0);

/// Window-independent half of the runtime.
///
/// Owns the application, the camera and the input latch, routes typed events
/// through an [`EventDispatcher`] and runs one frame at a time against the
/// current render context. The platform loop feeds it events and redraws.
pub struct Engine<A, O = NoOverlay> {
    dispatcher: EventDispatcher<EngineState<A>>,
    state: EngineState<A>,
    overlay: O,
}

struct EngineState<A> {
    app: A,
    window: Option<Arc<Window>>,
    camera: Camera,
    input: InputLatch,
    cursor: (f64, f64),
    frame_index: u64,
    close_requested: bool,
}

impl<A> EngineState<A>
where
    A: App,
{
    /// Builds a [`FrameCtx`] over the engine state and hands it to `f` with the app.
    fn run_hook<R>(&mut self, f: impl FnOnce(&mut A, &mut FrameCtx<'_>) -> R) -> R {
        let Self {
            app,
            window,
            camera,
            input,
            cursor,
            frame_index,
            close_requested,
        } = self;

        let mut ctx = FrameCtx::new(window.as_deref(), camera, input, *cursor, *frame_index);
        let out = f(app, &mut ctx);
        *close_requested |= ctx.close_requested();
        out
    }

    fn mouse_button(&mut self, button: MouseButton, x: f64, y: f64, pressed: bool) {
        if pressed {
            self.input.press_mouse_button(button);
        } else {
            self.input.release_mouse_button(button);
        }
        self.run_hook(|app, ctx| app.on_mouse_button_event(ctx, button, x, y, pressed));
    }
}

impl<A> Engine<A, NoOverlay>
where
    A: App + 'static,
{
    pub fn new(app: A) -> Self {
        Self::with_overlay(app, NoOverlay)
    }
}

impl<A, O> Engine<A, O>
where
    A: App + 'static,
    O: UiOverlay,
{
    pub fn with_overlay(app: A, overlay: O) -> Self {
        let mut engine = Self {
            dispatcher: EventDispatcher::new(),
            state: EngineState {
                app,
                window: None,
                camera: Camera::new(CAMERA_START, Vec3::ZERO, ProjectionMode::Perspective),
                input: InputLatch::new(),
                cursor: (0.0, 0.0),
                frame_index: 0,
                close_requested: false,
            },
            overlay,
        };
        engine.register_handlers();
        engine
    }

    fn register_handlers(&mut self) {
        let d = &mut self.dispatcher;

        d.add_listener::<WindowResize, _>(|state, e| {
            state.camera.set_viewport_size(e.width as f32, e.height as f32);
            Renderer::resize(e.width, e.height);
            Renderer::set_viewport(e.width, e.height, 0, 0);
            if let Some(window) = &state.window {
                window.request_redraw();
            }
        });

        d.add_listener::<WindowClose, _>(|state, _| {
            log::info!("close requested");
            state.close_requested = true;
        });

        d.add_listener::<MouseButtonPressed, _>(|state, e| {
            state.mouse_button(e.button, e.x, e.y, true);
        });

        d.add_listener::<MouseButtonReleased, _>(|state, e| {
            state.mouse_button(e.button, e.x, e.y, false);
        });

        d.add_listener::<KeyPressed, _>(|state, e| {
            if !e.repeat {
                log::debug!("key pressed: {}", e.key);
            }
            state.input.press_key(e.key);
        });

        d.add_listener::<KeyReleased, _>(|state, e| {
            log::debug!("key released: {}", e.key);
            state.input.release_key(e.key);
        });

        d.add_listener::<MouseMoved, _>(|state, e| {
            log::debug!("mouse moved to ({}, {})", e.x, e.y);
            state.cursor = (e.x, e.y);
        });
    }

    /// Prepares render state and calls [`App::on_start`].
    ///
    /// The render context must already be current.
    pub fn start(&mut self, window: Option<Arc<Window>>) -> Result<()> {
        if let Some(window) = &window {
            let size = window.inner_size();
            self.state
                .camera
                .set_viewport_size(size.width as f32, size.height as f32);
            Renderer::set_viewport(size.width, size.height, 0, 0);
        }
        self.state.window = window;

        Renderer::enable_depth_test();
        self.state
            .run_hook(|app, ctx| app.on_start(ctx))
            .context("application failed to start")
    }

    /// Routes `event` to its registered handler.
    pub fn handle_event(&mut self, event: &Event) {
        self.dispatcher.dispatch(&mut self.state, event);
    }

    /// Runs one frame: clear, draw, UI, present, update.
    ///
    /// Fails only when the surface cannot be recovered.
    pub fn frame(&mut self) -> Result<()> {
        let [r, g, b, a] = CLEAR_COLOR;
        Renderer::set_clear_color(r, g, b, a);
        Renderer::clear();

        let overlay = &mut self.overlay;
        self.state.run_hook(|app, ctx| {
            app.on_draw(ctx);
            overlay.begin_frame(ctx);
            app.on_ui_draw(ctx);
            overlay.end_frame(ctx);
        });

        match Renderer::present() {
            Ok(()) => {}
            Err(SurfaceErrorAction::Fatal) => bail!("surface lost and could not be recovered"),
            Err(action) => log::debug!("frame {} not presented: {action:?}", self.state.frame_index),
        }

        self.state.run_hook(|app, ctx| app.on_update(ctx));
        self.state.frame_index += 1;
        Ok(())
    }

    pub fn close_requested(&self) -> bool {
        self.state.close_requested
    }

    pub fn request_close(&mut self) {
        self.state.close_requested = true;
    }

    pub fn camera(&self) -> &Camera {
        &self.state.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.state.camera
    }

    pub fn input(&self) -> &InputLatch {
        &self.state.input
    }

    pub fn input_mut(&mut self) -> &mut InputLatch {
        &mut self.state.input
    }

    pub fn cursor(&self) -> (f64, f64) {
        self.state.cursor
    }

    pub fn frame_index(&self) -> u64 {
        self.state.frame_index
    }

    pub fn app(&self) -> &A {
        &self.state.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.state.app
    }

    /// Consumes the engine, returning the application.
    pub fn into_app(self) -> A {
        self.state.app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{CallLog, DeviceCall, HeadlessBackend, ViewportRect};
    use crate::input::KeyCode;

    #[derive(Default)]
    struct Recorder {
        hooks: Vec<&'static str>,
        clicks: Vec<(MouseButton, f64, f64, bool)>,
        close_on_update: bool,
        fail_start: bool,
    }

    impl App for Recorder {
        fn on_start(&mut self, _ctx: &mut FrameCtx<'_>) -> Result<()> {
            if self.fail_start {
                bail!("no assets");
            }
            self.hooks.push("start");
            Ok(())
        }

        fn on_draw(&mut self, _ctx: &mut FrameCtx<'_>) {
            self.hooks.push("draw");
        }

        fn on_ui_draw(&mut self, _ctx: &mut FrameCtx<'_>) {
            self.hooks.push("ui");
        }

        fn on_update(&mut self, ctx: &mut FrameCtx<'_>) {
            self.hooks.push("update");
            if self.close_on_update {
                ctx.request_close();
            }
        }

        fn on_mouse_button_event(
            &mut self,
            ctx: &mut FrameCtx<'_>,
            button: MouseButton,
            x: f64,
            y: f64,
            pressed: bool,
        ) {
            assert_eq!(ctx.input().is_mouse_button_pressed(button), pressed);
            self.clicks.push((button, x, y, pressed));
        }
    }

    fn with_headless<R>(f: impl FnOnce(&CallLog) -> R) -> R {
        let log = CallLog::new();
        Renderer::init_with(Box::new(HeadlessBackend::with_log(log.clone()))).expect("init");
        let out = f(&log);
        Renderer::shutdown();
        out
    }

    // ── frame sequencing ──────────────────────────────────────────────────

    #[test]
    fn frame_runs_hooks_in_order() {
        with_headless(|log| {
            let mut engine = Engine::new(Recorder::default());
            engine.start(None).expect("start");
            engine.frame().expect("frame");

            assert_eq!(engine.app().hooks, ["start", "draw", "ui", "update"]);
            assert_eq!(engine.frame_index(), 1);

            let calls = log.calls();
            let clear = calls.iter().position(|c| matches!(c, DeviceCall::Clear));
            let present = calls.iter().position(|c| matches!(c, DeviceCall::Present));
            assert!(clear < present);
            assert!(calls.contains(&DeviceCall::SetDepthTest(true)));
        });
    }

    #[test]
    fn failed_start_is_reported() {
        with_headless(|_| {
            let mut engine = Engine::new(Recorder {
                fail_start: true,
                ..Recorder::default()
            });
            assert!(engine.start(None).is_err());
        });
    }

    #[test]
    fn close_from_update_is_visible_after_frame() {
        with_headless(|_| {
            let mut engine = Engine::new(Recorder {
                close_on_update: true,
                ..Recorder::default()
            });
            engine.start(None).expect("start");
            assert!(!engine.close_requested());
            engine.frame().expect("frame");
            assert!(engine.close_requested());
        });
    }

    // ── event handlers ────────────────────────────────────────────────────

    #[test]
    fn keys_update_latch() {
        let mut engine = Engine::new(Recorder::default());
        engine.handle_event(&Event::from(KeyPressed {
            key: KeyCode::W,
            repeat: false,
        }));
        assert!(engine.input().is_key_pressed(KeyCode::W));

        engine.handle_event(&Event::from(KeyReleased { key: KeyCode::W }));
        assert!(!engine.input().is_key_pressed(KeyCode::W));
    }

    #[test]
    fn mouse_buttons_reach_latch_and_app() {
        let mut engine = Engine::new(Recorder::default());
        engine.handle_event(&Event::from(MouseButtonPressed {
            button: MouseButton::RIGHT,
            x: 10.0,
            y: 20.0,
        }));
        engine.handle_event(&Event::from(MouseButtonReleased {
            button: MouseButton::RIGHT,
            x: 12.0,
            y: 20.0,
        }));

        assert!(!engine.input().is_mouse_button_pressed(MouseButton::RIGHT));
        assert_eq!(
            engine.app().clicks,
            [
                (MouseButton::RIGHT, 10.0, 20.0, true),
                (MouseButton::RIGHT, 12.0, 20.0, false),
            ]
        );
    }

    #[test]
    fn mouse_moved_tracks_cursor() {
        let mut engine = Engine::new(Recorder::default());
        engine.handle_event(&Event::from(MouseMoved { x: 3.5, y: 7.0 }));
        assert_eq!(engine.cursor(), (3.5, 7.0));
    }

    #[test]
    fn close_event_sets_flag() {
        let mut engine = Engine::new(Recorder::default());
        engine.handle_event(&Event::from(WindowClose));
        assert!(engine.close_requested());
    }

    #[test]
    fn resize_updates_camera_and_viewport() {
        with_headless(|log| {
            let mut engine = Engine::new(Recorder::default());
            engine.handle_event(&Event::from(WindowResize {
                width: 1024,
                height: 512,
            }));

            assert_eq!(engine.camera().viewport_size(), glam::Vec2::new(1024.0, 512.0));
            assert!(log.calls().contains(&DeviceCall::Resize {
                width: 1024,
                height: 512
            }));
            assert!(log.calls().contains(&DeviceCall::SetViewport(ViewportRect {
                left: 0,
                bottom: 0,
                width: 1024,
                height: 512,
            })));
        });
    }
}
