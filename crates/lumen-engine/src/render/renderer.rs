use std::sync::Arc;

use anyhow::{Context, Result};
use winit::window::Window;

use crate::device::{
    self, DeviceInfo, GpuInit, RenderBackend, SurfaceErrorAction, ViewportRect, WgpuBackend,
};

use super::vertex_array::VertexArray;
use super::with_device;

/// Immediate-mode entry points against the thread's current render context.
pub struct Renderer;

impl Renderer {
    /// Creates a wgpu backend for `window` and makes it current.
    pub fn init(window: Arc<Window>, gpu_init: GpuInit) -> Result<DeviceInfo> {
        let backend = pollster::block_on(WgpuBackend::new(window, gpu_init))
            .context("GPU initialization failed")?;
        Self::init_with(Box::new(backend))
    }

    /// Makes `backend` the current context and logs what it is.
    pub fn init_with(backend: Box<dyn RenderBackend>) -> Result<DeviceInfo> {
        let info = backend.info();
        if device::make_current(backend)
            .context("cannot install render context")?
            .is_some()
        {
            log::warn!("replaced an existing render context");
        }

        log::info!("Vendor: {}", info.vendor);
        log::info!("Renderer: {}", info.renderer);
        log::info!("Version: {}", info.version);
        Ok(info)
    }

    /// Detaches and drops the current context. Resources must be dropped first.
    pub fn shutdown() {
        if device::release_current().is_some() {
            log::debug!("render context released");
        }
    }

    pub fn info() -> Option<DeviceInfo> {
        device::with(|d| d.info()).ok()
    }

    /// Draws every index of `vertex_array` as a triangle list.
    pub fn draw(vertex_array: &VertexArray) {
        let id = vertex_array.id();
        let count = vertex_array.index_count();
        with_device("draw", |d| {
            d.bind_vertex_array(Some(id));
            d.draw_indexed(count);
        });
    }

    pub fn set_clear_color(r: f32, g: f32, b: f32, a: f32) {
        with_device("set clear color", |d| d.set_clear_color([r, g, b, a]));
    }

    /// Clears color and depth.
    pub fn clear() {
        with_device("clear", |d| d.clear());
    }

    /// Sets the viewport; `left`/`bottom` are measured from the bottom-left corner.
    pub fn set_viewport(width: u32, height: u32, left: i32, bottom: i32) {
        let rect = ViewportRect {
            left,
            bottom,
            width,
            height,
        };
        with_device("set viewport", |d| d.set_viewport(rect));
    }

    /// Resizes the drawable surface after the window changed size.
    pub fn resize(width: u32, height: u32) {
        with_device("resize", |d| d.resize(width, height));
    }

    pub fn enable_depth_test() {
        with_device("enable depth test", |d| d.set_depth_test(true));
    }

    pub fn disable_depth_test() {
        with_device("disable depth test", |d| d.set_depth_test(false));
    }

    /// Submits the frame and shows it.
    pub fn present() -> std::result::Result<(), SurfaceErrorAction> {
        with_device("present", |d| d.present()).unwrap_or(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{CallLog, DeviceCall, HeadlessBackend};

    #[test]
    fn init_with_reports_backend_info() {
        let info = Renderer::init_with(Box::new(HeadlessBackend::new())).expect("init");
        assert_eq!(info.renderer, "headless");
        assert_eq!(Renderer::info(), Some(info));

        Renderer::shutdown();
        assert_eq!(Renderer::info(), None);
    }

    #[test]
    fn calls_without_context_are_no_ops() {
        Renderer::clear();
        Renderer::enable_depth_test();
        Renderer::set_viewport(10, 10, 0, 0);
        assert_eq!(Renderer::present(), Ok(()));
    }

    #[test]
    fn frame_state_reaches_the_backend() {
        let log = CallLog::new();
        Renderer::init_with(Box::new(HeadlessBackend::with_log(log.clone()))).expect("init");

        Renderer::set_clear_color(0.33, 0.33, 0.33, 0.0);
        Renderer::clear();
        Renderer::set_viewport(640, 480, 0, 0);
        Renderer::disable_depth_test();
        Renderer::present().expect("present");

        assert_eq!(
            log.calls(),
            vec![
                DeviceCall::SetClearColor([0.33, 0.33, 0.33, 0.0]),
                DeviceCall::Clear,
                DeviceCall::SetViewport(ViewportRect {
                    left: 0,
                    bottom: 0,
                    width: 640,
                    height: 480,
                }),
                DeviceCall::SetDepthTest(false),
                DeviceCall::Present,
            ]
        );
        Renderer::shutdown();
    }
}
