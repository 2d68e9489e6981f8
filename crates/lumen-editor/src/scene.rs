use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec3};

use lumen_engine::render::{
    BufferLayout, BufferUsage, IndexBuffer, Renderer, ShaderDataType, ShaderProgram, VertexArray,
    VertexBuffer,
};

/// Unit cube: position (xyz) + texture coordinate (uv) per vertex.
#[rustfmt::skip]
pub(crate) const CUBE_VERTICES: [f32; 40] = [
    -1.0, -1.0, -1.0,   1.0, 0.0,
    -1.0,  1.0, -1.0,   0.0, 0.0,
    -1.0, -1.0,  1.0,   1.0, 1.0,
    -1.0,  1.0,  1.0,   0.0, 1.0,

     1.0, -1.0, -1.0,   1.0, 0.0,
     1.0,  1.0, -1.0,   0.0, 0.0,
     1.0, -1.0,  1.0,   1.0, 1.0,
     1.0,  1.0,  1.0,   0.0, 1.0,
];

#[rustfmt::skip]
pub(crate) const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 3, 2, 1,
    4, 5, 6, 7, 6, 5,
    0, 4, 6, 0, 2, 6,
    1, 5, 3, 3, 7, 5,
    3, 7, 2, 7, 6, 2,
    1, 5, 0, 5, 0, 4,
];

/// Extra cubes drawn with a plain translation.
pub(crate) const EXTRA_CUBES: [Vec3; 5] = [
    Vec3::new(-2.0, -2.0, -4.0),
    Vec3::new(-5.0, 0.0, 3.0),
    Vec3::new(2.0, 1.0, -2.0),
    Vec3::new(4.0, -3.0, 3.0),
    Vec3::new(1.0, -7.0, 1.0),
];

const VERTEX_SHADER: &str = r#"
struct Uniforms {
    model_matrix: mat4x4<f32>,
    view_projection_matrix: mat4x4<f32>,
    current_frame: i32,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) face_uv: vec2<f32>,
    @location(1) checker_uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) vertex_position: vec3<f32>,
    @location(1) texture_coord: vec2<f32>,
) -> VertexOut {
    let shift = f32(u.current_frame) / 1000.0;

    var out: VertexOut;
    out.face_uv = texture_coord;
    out.checker_uv = texture_coord + vec2<f32>(shift, shift);
    out.position = u.view_projection_matrix * u.model_matrix * vec4<f32>(vertex_position, 1.0);
    return out;
}
"#;

const FRAGMENT_SHADER: &str = r#"
@fragment
fn fs_main(
    @location(0) face_uv: vec2<f32>,
    @location(1) checker_uv: vec2<f32>,
) -> @location(0) vec4<f32> {
    let background = vec3<f32>(200.0, 191.0, 231.0) / 255.0;
    let disc = length(face_uv - vec2<f32>(0.5, 0.5)) < 0.4;
    let face = select(background, vec3<f32>(1.0, 1.0, 0.0), disc);

    let cell = fract(checker_uv);
    let dark = (cell.x < 0.5) == (cell.y < 0.5);
    let checker = select(vec3<f32>(1.0), vec3<f32>(0.0), dark);

    return vec4<f32>(face * checker, 1.0);
}
"#;

/// Scale, rotation about Z (degrees) and translation of the main cube.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ModelTransform {
    pub scale: Vec3,
    pub rotate: f32,
    pub translate: Vec3,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotate: 0.0,
            translate: Vec3::ZERO,
        }
    }
}

impl ModelTransform {
    /// translate * rotate * scale
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.scale,
            Quat::from_rotation_z(self.rotate.to_radians()),
            self.translate,
        )
    }
}

/// GPU resources of the cube scene.
pub(crate) struct CubeScene {
    program: ShaderProgram,
    vertex_array: VertexArray,
    _vertex_buffer: VertexBuffer,
    _index_buffer: IndexBuffer,
}

impl CubeScene {
    /// Uploads the cube and compiles its shaders. Needs a current render context.
    pub fn new() -> Result<Self> {
        let program = ShaderProgram::try_new(VERTEX_SHADER, FRAGMENT_SHADER)
            .context("cube shader failed to build")?;

        let layout = BufferLayout::new([ShaderDataType::Float3, ShaderDataType::Float2]);
        let vertex_buffer = VertexBuffer::new(&CUBE_VERTICES, layout, BufferUsage::Static)
            .context("cube vertex upload failed")?;
        let index_buffer = IndexBuffer::new(&CUBE_INDICES, BufferUsage::Static)
            .context("cube index upload failed")?;

        let mut vertex_array = VertexArray::new().context("cube vertex array failed")?;
        vertex_array.add_vertex_buffer(&vertex_buffer);
        vertex_array.set_index_buffer(&index_buffer);

        Ok(Self {
            program,
            vertex_array,
            _vertex_buffer: vertex_buffer,
            _index_buffer: index_buffer,
        })
    }

    /// Draws the main cube with `model`, then every [`EXTRA_CUBES`] instance.
    pub fn draw(&self, model: &ModelTransform, view_projection: Mat4, current_frame: i32) {
        let program = &self.program;
        program.bind();

        program.set_matrix4("model_matrix", model.matrix());
        program.set_int("current_frame", current_frame);
        program.set_matrix4("view_projection_matrix", view_projection);
        Renderer::draw(&self.vertex_array);

        for position in EXTRA_CUBES {
            program.set_matrix4("model_matrix", Mat4::from_translation(position));
            Renderer::draw(&self.vertex_array);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_engine::device::{CallLog, DeviceCall, HeadlessBackend};

    fn with_headless<R>(f: impl FnOnce(&CallLog) -> R) -> R {
        let log = CallLog::new();
        Renderer::init_with(Box::new(HeadlessBackend::with_log(log.clone()))).expect("init");
        let out = f(&log);
        Renderer::shutdown();
        out
    }

    #[test]
    fn default_model_is_identity() {
        let model = ModelTransform::default().matrix();
        assert!(model.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn rotation_is_about_z() {
        let model = ModelTransform {
            rotate: 90.0,
            ..ModelTransform::default()
        };
        let rotated = model.matrix().transform_point3(Vec3::X);
        assert!(rotated.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn cube_shaders_build_and_draw_six_instances() {
        with_headless(|log| {
            let scene = CubeScene::new().expect("scene");
            assert!(scene.program.is_compiled());
            assert_eq!(scene.vertex_array.index_count(), 36);
            assert_eq!(scene.vertex_array.attribute_count(), 2);

            scene.draw(&ModelTransform::default(), Mat4::IDENTITY, 0);

            let draws = log.count(|c| matches!(c, DeviceCall::DrawIndexed { count: 36, .. }));
            assert_eq!(draws, 1 + EXTRA_CUBES.len());
        });
    }
}
