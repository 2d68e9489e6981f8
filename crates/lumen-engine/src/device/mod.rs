//! Render device layer.
//!
//! [`RenderBackend`] is the primitive, bind-state driven device API. One backend
//! is current per thread (see [`make_current`]); resource wrappers in
//! [`crate::render`] and the [`crate::render::Renderer`] facade act on it.
//!
//! - [`WgpuBackend`] drives a window surface through wgpu.
//! - [`HeadlessBackend`] needs no GPU and records every call into a [`CallLog`].

mod backend;
mod context;
mod error;
mod gpu;
mod headless;
mod init;
mod state;
mod surface;
mod wgsl;

pub use backend::{
    BufferId,
    BufferTarget,
    BufferUsage,
    ComponentType,
    DeviceInfo,
    ProgramId,
    RenderBackend,
    ShaderId,
    ShaderStage,
    UniformKind,
    UniformLocation,
    UniformValue,
    VertexArrayId,
    VertexAttrib,
    ViewportRect,
};
pub use context::{is_current, make_current, release_current};
pub(crate) use context::with;
pub use error::{DeviceError, SurfaceErrorAction};
pub use gpu::WgpuBackend;
pub use headless::{CallLog, DeviceCall, HeadlessBackend};
pub use init::GpuInit;
