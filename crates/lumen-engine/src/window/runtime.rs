use std::sync::Arc;

use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, Engine, NoOverlay, UiOverlay};
use crate::device::GpuInit;
use crate::event::{Event, WindowResize};
use crate::input::platform::translate_window_event;
use crate::render::Renderer;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Initial inner width in logical pixels.
    pub width: u32,
    pub height: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens a window and drives `app` until it closes.
    ///
    /// Blocks the calling thread, which also owns the render context.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        Self::run_with_overlay(config, gpu_init, app, NoOverlay)
    }

    pub fn run_with_overlay<A, O>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        app: A,
        overlay: O,
    ) -> Result<()>
    where
        A: App + 'static,
        O: UiOverlay + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut state = AppState::new(config, gpu_init, Engine::with_overlay(app, overlay));

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.shutdown();
        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<A, O> {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    engine: Option<Engine<A, O>>,
    window: Option<Arc<Window>>,
    failure: Option<anyhow::Error>,
}

impl<A, O> AppState<A, O>
where
    A: App + 'static,
    O: UiOverlay,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, engine: Engine<A, O>) -> Self {
        Self {
            config,
            gpu_init,
            engine: Some(engine),
            window: None,
            failure: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                f64::from(self.config.width),
                f64::from(self.config.height),
            ));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        Renderer::init(window.clone(), self.gpu_init.clone())?;

        if let Some(engine) = self.engine.as_mut() {
            engine.start(Some(window.clone()))?;
        }

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        event_loop.exit();
    }

    /// Drops the application and its GPU resources before the render context.
    fn shutdown(&mut self) {
        if self.engine.take().is_some() {
            log::debug!("application released");
        }
        Renderer::shutdown();
        self.window = None;
    }
}

impl<A, O> ApplicationHandler for AppState<A, O>
where
    A: App + 'static,
    O: UiOverlay,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(err) = self.create_window(event_loop) {
            self.fail(event_loop, err.context("failed to initialize the runtime"));
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous redraw.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        if let Some(ev) = translate_window_event(&event, engine.cursor()) {
            engine.handle_event(&ev);
        }

        match &event {
            WindowEvent::Focused(false) => engine.input_mut().release_all(),

            WindowEvent::ScaleFactorChanged { .. } => {
                let size = window.inner_size();
                engine.handle_event(&Event::from(WindowResize {
                    width: size.width,
                    height: size.height,
                }));
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = engine.frame() {
                    self.fail(event_loop, err);
                    return;
                }
                if engine.close_requested() {
                    event_loop.exit();
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
