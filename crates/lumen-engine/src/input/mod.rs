//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into [`crate::event::Event`]s and
//! the registered handlers update the [`InputLatch`].

mod latch;
pub(crate) mod platform;
mod types;

pub use latch::InputLatch;
pub use types::{KeyCode, MouseButton};
