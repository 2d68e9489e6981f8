use std::fmt;
use std::num::NonZeroU32;

use glam::{Mat4, Vec3, Vec4};

use super::{DeviceError, SurfaceErrorAction};

macro_rules! device_handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
            pub struct $name(NonZeroU32);

            impl $name {
                pub const fn from_raw(raw: NonZeroU32) -> Self {
                    Self(raw)
                }

                pub const fn get(self) -> u32 {
                    self.0.get()
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}#{}", stringify!($name), self.0)
                }
            }
        )*
    };
}

device_handle!(
    /// Device buffer holding vertex or index data.
    BufferId,
    /// Device object recording vertex attribute and element buffer bindings.
    VertexArrayId,
    /// A single compiled shader stage.
    ShaderId,
    /// A linked vertex + fragment program.
    ProgramId,
);

/// Hands out non-zero handle values; zero stays reserved for "nothing bound".
#[derive(Debug, Default)]
pub(crate) struct HandleCounter {
    last: u32,
}

impl HandleCounter {
    pub(crate) fn next(&mut self) -> Result<NonZeroU32, DeviceError> {
        self.last = self
            .last
            .checked_add(1)
            .ok_or_else(|| DeviceError::Allocation("device handle space exhausted".into()))?;
        NonZeroU32::new(self.last)
            .ok_or_else(|| DeviceError::Allocation("device handle space exhausted".into()))
    }
}

/// Binding point a buffer is attached to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// `u32` indices, captured by the bound vertex array.
    ElementArray,
}

/// Advisory hint about how often buffer contents change.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    #[default]
    Static,
    Dynamic,
    Stream,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Scalar type of a vertex attribute component (always 4 bytes wide).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ComponentType {
    Float,
    Int,
}

/// Where one vertex attribute lives inside the currently bound array buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttrib {
    /// 1 to 4 components.
    pub component_count: u8,
    pub component_type: ComponentType,
    /// Bytes between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the first component within a vertex.
    pub offset: u32,
}

/// Viewport rectangle with a bottom-left origin, in physical pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ViewportRect {
    pub left: i32,
    pub bottom: i32,
    pub width: u32,
    pub height: u32,
}

/// Human-readable identification of the active device.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeviceInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.vendor, self.renderer, self.version)
    }
}

/// Shader-side type of a uniform member, as reflected from WGSL.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Vec4,
    Mat4,
    /// Any type the uniform setters cannot write.
    Unsupported,
}

/// Resolved address of a uniform inside a linked program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct UniformLocation {
    /// Index of the uniform block within the program.
    pub block: u16,
    /// Byte offset inside that block.
    pub offset: u32,
    pub kind: UniformKind,
}

/// A value written through one of the typed uniform setters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Raw little-endian bytes as laid out in a WGSL uniform block.
    pub fn bytes(&self) -> &[u8] {
        match self {
            UniformValue::Int(v) => bytemuck::bytes_of(v),
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec3(v) => bytemuck::bytes_of(v),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v),
        }
    }
}

/// Primitive, bind-state driven device operations.
///
/// Resource wrappers in [`crate::render`] talk to whichever backend is current on
/// the calling thread. Operations mirror a classic immediate-mode API: objects
/// are bound to targets and later calls act on whatever is bound.
pub trait RenderBackend {
    fn info(&self) -> DeviceInfo;

    // ── buffers ───────────────────────────────────────────────────────────

    /// Creates a buffer initialised with `data`. Current bindings are left untouched.
    fn create_buffer(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError>;

    /// Binds `buffer` to `target`; `None` clears the binding.
    ///
    /// Binding an element buffer records it in the currently bound vertex array.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>);

    fn delete_buffer(&mut self, buffer: BufferId);

    // ── vertex arrays ─────────────────────────────────────────────────────

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, DeviceError>;

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);

    fn enable_vertex_attrib(&mut self, slot: u32);

    /// Points `slot` of the bound vertex array at the bound array buffer.
    fn vertex_attrib_pointer(&mut self, slot: u32, attrib: VertexAttrib);

    // ── shaders ───────────────────────────────────────────────────────────

    /// Compiles one WGSL stage. The error carries the compiler diagnostic.
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String>;

    fn delete_shader(&mut self, shader: ShaderId);

    /// Links two compiled stages. The error carries the linker diagnostic.
    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String>;

    fn delete_program(&mut self, program: ProgramId);

    fn use_program(&mut self, program: Option<ProgramId>);

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes `value` at `location`; the caller has checked the kinds match.
    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: UniformValue);

    // ── frame state ───────────────────────────────────────────────────────

    fn set_clear_color(&mut self, rgba: [f32; 4]);

    /// Clears color and depth.
    fn clear(&mut self);

    fn set_viewport(&mut self, rect: ViewportRect);

    /// Resizes the drawable surface.
    fn resize(&mut self, width: u32, height: u32);

    fn set_depth_test(&mut self, enabled: bool);

    /// Draws `count` indices of the bound vertex array as a triangle list.
    fn draw_indexed(&mut self, count: u32);

    /// Finishes the frame and presents it.
    fn present(&mut self) -> Result<(), SurfaceErrorAction>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_start_at_one() {
        let mut counter = HandleCounter::default();
        assert_eq!(counter.next().map(NonZeroU32::get), Ok(1));
        assert_eq!(counter.next().map(NonZeroU32::get), Ok(2));
    }

    #[test]
    fn exhausted_counter_reports_allocation_error() {
        let mut counter = HandleCounter { last: u32::MAX };
        assert!(matches!(counter.next(), Err(DeviceError::Allocation(_))));
    }

    #[test]
    fn uniform_bytes_match_kind_size() {
        assert_eq!(UniformValue::Int(7).bytes().len(), 4);
        assert_eq!(UniformValue::Vec3(Vec3::ONE).bytes().len(), 12);
        assert_eq!(UniformValue::Mat4(Mat4::IDENTITY).bytes().len(), 64);
        assert_eq!(UniformValue::Vec4(Vec4::ZERO).kind(), UniformKind::Vec4);
    }
}
