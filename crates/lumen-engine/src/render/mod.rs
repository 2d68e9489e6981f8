//! GPU resource wrappers and the renderer facade.
//!
//! Every wrapper exclusively owns one device handle and releases it on drop.
//! They act on the thread's current render context (see
//! [`crate::device::make_current`]); without one, operations warn and do nothing.

mod buffer;
mod layout;
mod renderer;
mod shader;
mod vertex_array;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use layout::{BufferElement, BufferLayout, ShaderDataType};
pub use renderer::Renderer;
pub use shader::{ShaderError, ShaderProgram};
pub use vertex_array::VertexArray;

pub use crate::device::BufferUsage;

use crate::device::{self, RenderBackend};

/// Runs `f` on the current backend, warning when that is not possible.
fn with_device<R>(op: &str, f: impl FnOnce(&mut dyn RenderBackend) -> R) -> Option<R> {
    match device::with(f) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("{op} skipped: {err}");
            None
        }
    }
}
