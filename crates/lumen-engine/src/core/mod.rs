//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! applications built on the engine: the [`App`] hooks, the per-frame
//! [`FrameCtx`] and the [`Engine`] that drives them from typed events.

mod app;
mod ctx;
mod engine;

pub use app::{App, NoOverlay, UiOverlay};
pub use ctx::FrameCtx;
pub use engine::Engine;
