//! Lumen engine crate.
//!
//! Rendering-resource and scene-transform core of a small real-time engine:
//! typed window/input events, GPU buffers and shader programs bound to a
//! per-thread render context, a free-fly camera and the winit runtime loop
//! that ties them to an [`App`](core::App).

pub mod camera;
pub mod core;
pub mod device;
pub mod event;
pub mod input;
pub mod logging;
pub mod render;
pub mod window;
