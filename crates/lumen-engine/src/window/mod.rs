//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, makes the wgpu backend current and
//! feeds translated events and redraws into the [`Engine`](crate::core::Engine).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
