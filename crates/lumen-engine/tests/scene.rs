use anyhow::Result;

use lumen_engine::core::{App, Engine, FrameCtx};
use lumen_engine::device::{CallLog, DeviceCall, HeadlessBackend, ShaderStage};
use lumen_engine::event::{Event, KeyPressed, KeyReleased};
use lumen_engine::input::KeyCode;
use lumen_engine::render::{
    BufferLayout, BufferUsage, IndexBuffer, Renderer, ShaderDataType, ShaderProgram, VertexArray,
    VertexBuffer,
};

#[rustfmt::skip]
const CUBE_VERTICES: [f32; 40] = [
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
const CUBE_INDICES: [u32; 36] = [
    0, 1, 2, 3, 2, 1,
    4, 5, 6, 7, 6, 5,
    0, 4, 6, 0, 2, 6,
    1, 5, 3, 3, 7, 5,
    3, 7, 2, 7, 6, 2,
    1, 5, 0, 5, 0, 4,
];

const VERTEX: &str = r#"
struct Uniforms {
    model_matrix: mat4x4<f32>,
    view_projection_matrix: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.uv = uv;
    out.position = u.view_projection_matrix * u.model_matrix * vec4<f32>(position, 1.0);
    return out;
}
"#;

const FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;

fn with_headless<R>(f: impl FnOnce(&CallLog) -> R) -> R {
    let log = CallLog::new();
    Renderer::init_with(Box::new(HeadlessBackend::with_log(log.clone()))).expect("init");
    let out = f(&log);
    Renderer::shutdown();
    out
}

struct Cube {
    program: ShaderProgram,
    vertex_array: VertexArray,
    _vertices: VertexBuffer,
    _indices: IndexBuffer,
}

impl Cube {
    fn new() -> Result<Self> {
        let program = ShaderProgram::try_new(VERTEX, FRAGMENT)?;
        let layout = BufferLayout::new([ShaderDataType::Float3, ShaderDataType::Float2]);
        let vertices = VertexBuffer::new(&CUBE_VERTICES, layout, BufferUsage::Static)?;
        let indices = IndexBuffer::new(&CUBE_INDICES, BufferUsage::Static)?;

        let mut vertex_array = VertexArray::new()?;
        vertex_array.add_vertex_buffer(&vertices);
        vertex_array.set_index_buffer(&indices);

        Ok(Self {
            program,
            vertex_array,
            _vertices: vertices,
            _indices: indices,
        })
    }
}

// ── draw ──────────────────────────────────────────────────────────────────

#[test]
fn cube_draw_issues_one_indexed_draw_of_36() {
    with_headless(|log| {
        let cube = Cube::new().expect("cube");
        assert_eq!(cube.vertex_array.attribute_count(), 2);

        log.clear();
        cube.program.bind();
        Renderer::draw(&cube.vertex_array);

        assert_eq!(log.draws(), vec![(cube.vertex_array.id(), 36)]);
    });
}

#[test]
fn dropping_cube_releases_each_handle_once() {
    with_headless(|log| {
        let cube = Cube::new().expect("cube");
        let moved = cube;
        drop(moved);

        assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteBuffer(_))), 2);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteVertexArray(_))), 1);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteProgram(_))), 1);
    });
}

#[test]
fn int_attribute_for_float_input_is_not_drawn() {
    with_headless(|log| {
        let program = ShaderProgram::try_new(VERTEX, FRAGMENT).expect("program");
        let layout = BufferLayout::new([ShaderDataType::Int3, ShaderDataType::Float2]);
        let data = [0i32; 5 * 4];
        let vertices = VertexBuffer::new(&data, layout, BufferUsage::Static).expect("vertices");
        let indices = IndexBuffer::new(&[0, 1, 2], BufferUsage::Static).expect("indices");

        let mut vertex_array = VertexArray::new().expect("vertex array");
        vertex_array.add_vertex_buffer(&vertices);
        vertex_array.set_index_buffer(&indices);

        log.clear();
        program.bind();
        Renderer::draw(&vertex_array);
        assert!(log.draws().is_empty());
    });
}

// ── shaders ───────────────────────────────────────────────────────────────

#[test]
fn invalid_vertex_stage_creates_nothing() {
    with_headless(|log| {
        let program = ShaderProgram::new("@vertex fn vs_main( -> {", FRAGMENT);

        assert!(!program.is_compiled());
        assert_eq!(log.count(|c| matches!(c, DeviceCall::LinkProgram { .. })), 0);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::CompileShader { .. })), 0);
    });
}

#[test]
fn invalid_fragment_stage_releases_vertex_stage() {
    with_headless(|log| {
        let program = ShaderProgram::new(VERTEX, "@fragment fn fs_main( -> {");
        assert!(!program.is_compiled());

        let vertex = log.calls().into_iter().find_map(|c| match c {
            DeviceCall::CompileShader {
                shader,
                stage: ShaderStage::Vertex,
            } => Some(shader),
            _ => None,
        });
        let vertex = vertex.expect("vertex stage compiled");
        assert!(log.calls().contains(&DeviceCall::DeleteShader(vertex)));
    });
}

#[test]
fn unwritten_fragment_input_fails_to_link() {
    const POSITION_ONLY: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}
"#;

    with_headless(|log| {
        let program = ShaderProgram::new(POSITION_ONLY, FRAGMENT);

        assert!(!program.is_compiled());
        assert_eq!(log.count(|c| matches!(c, DeviceCall::LinkProgram { .. })), 0);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::DeleteShader(_))), 2);
    });
}

#[test]
fn unknown_uniform_records_nothing() {
    with_headless(|log| {
        let cube = Cube::new().expect("cube");
        cube.program.bind();

        log.clear();
        cube.program.set_float("does_not_exist", 1.0);
        cube.program.set_int("model_matrix", 3);
        assert!(log.is_empty());
    });
}

// ── input ─────────────────────────────────────────────────────────────────

struct Idle;

impl App for Idle {
    fn on_start(&mut self, _ctx: &mut FrameCtx<'_>) -> Result<()> {
        Ok(())
    }
}

#[test]
fn key_events_flip_latch() {
    let mut engine = Engine::new(Idle);

    engine.handle_event(&Event::from(KeyPressed {
        key: KeyCode::SPACE,
        repeat: false,
    }));
    assert!(engine.input().is_key_pressed(KeyCode::SPACE));

    engine.handle_event(&Event::from(KeyReleased {
        key: KeyCode::SPACE,
    }));
    assert!(!engine.input().is_key_pressed(KeyCode::SPACE));
}
