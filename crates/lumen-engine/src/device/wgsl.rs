//! WGSL validation and reflection through naga.
//!
//! Both backends share this so compile and link diagnostics are identical with or
//! without a GPU.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Handle, Module, Scalar, ScalarKind, Type, TypeInner, VectorSize};

use super::{ShaderStage, UniformKind, UniformLocation};

/// Reflection of a single compiled stage.
#[derive(Debug, Clone)]
pub(crate) struct StageInfo {
    pub(crate) stage: ShaderStage,
    pub(crate) entry_point: String,
    /// `@location` values consumed by the entry point, sorted by location.
    pub(crate) inputs: Vec<Varying>,
    /// `@location` values written by the entry point, sorted by location.
    pub(crate) outputs: Vec<Varying>,
    pub(crate) uniforms: Vec<UniformBlock>,
}

/// A `@location` value passed between stages or fed by a vertex attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Varying {
    pub(crate) location: u32,
    pub(crate) scalar: ScalarKind,
    pub(crate) components: u8,
}

/// A `var<uniform>` global in `@group(0)`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UniformBlock {
    pub(crate) binding: u32,
    /// Variable name, usable as a prefix: `name.member`.
    pub(crate) name: String,
    /// Size in bytes as laid out by the shader.
    pub(crate) size: u32,
    pub(crate) fields: Vec<UniformField>,
}

impl UniformBlock {
    /// Size rounded up to 16 bytes, the granularity used for buffer bindings.
    pub(crate) fn padded_size(&self) -> u32 {
        self.size.div_ceil(16) * 16
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct UniformField {
    pub(crate) name: String,
    pub(crate) offset: u32,
    pub(crate) kind: UniformKind,
}

/// Result of linking a vertex and a fragment stage.
#[derive(Debug, Clone)]
pub(crate) struct ProgramLayout {
    pub(crate) vertex_entry: String,
    pub(crate) fragment_entry: String,
    pub(crate) vertex_inputs: Vec<Varying>,
    /// Sorted by binding.
    pub(crate) blocks: Vec<UniformBlock>,
}

impl ProgramLayout {
    /// Resolves `name` as a bare member name, `block.member`, or a non-struct
    /// uniform's variable name.
    pub(crate) fn locate(&self, name: &str) -> Option<UniformLocation> {
        let (prefix, member) = match name.split_once('.') {
            Some((prefix, member)) => (Some(prefix), member),
            None => (None, name),
        };

        self.blocks.iter().enumerate().find_map(|(index, block)| {
            if prefix.is_some_and(|p| p != block.name) {
                return None;
            }
            let field = block.fields.iter().find(|f| f.name == member)?;
            Some(UniformLocation {
                block: u16::try_from(index).ok()?,
                offset: field.offset,
                kind: field.kind,
            })
        })
    }
}

/// Parses and validates `source`, then reflects the entry point for `stage`.
pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<StageInfo, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let want = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.stage == want)
        .ok_or_else(|| format!("no @{stage} entry point"))?;

    let mut inputs = Vec::new();
    for arg in &entry.function.arguments {
        collect_varyings(&module, arg.binding.as_ref(), arg.ty, &mut inputs);
    }
    inputs.sort_unstable_by_key(|v| v.location);

    let mut outputs = Vec::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, result.binding.as_ref(), result.ty, &mut outputs);
    }
    outputs.sort_unstable_by_key(|v| v.location);

    Ok(StageInfo {
        stage,
        entry_point: entry.name.clone(),
        inputs,
        outputs,
        uniforms: reflect_uniforms(&module)?,
    })
}

/// Pushes the `@location` values behind one argument or result. Unbound
/// values are structs whose members carry the bindings.
fn collect_varyings(
    module: &Module,
    binding: Option<&Binding>,
    ty: Handle<Type>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.extend(varying(*location, &module.types[ty].inner));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                out.extend(members.iter().filter_map(|m| match m.binding {
                    Some(Binding::Location { location, .. }) => {
                        varying(location, &module.types[m.ty].inner)
                    }
                    _ => None,
                }));
            }
        }
    }
}

fn varying(location: u32, inner: &TypeInner) -> Option<Varying> {
    let (scalar, components) = match *inner {
        TypeInner::Scalar(s) => (s.kind, 1),
        TypeInner::Vector { size, scalar } => (scalar.kind, size as u8),
        _ => return None,
    };
    Some(Varying {
        location,
        scalar,
        components,
    })
}

fn reflect_uniforms(module: &Module) -> Result<Vec<UniformBlock>, String> {
    let mut blocks = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let name = var.name.clone().unwrap_or_default();
        match var.space {
            AddressSpace::Uniform => {}
            AddressSpace::Handle | AddressSpace::Storage { .. } => {
                return Err(format!(
                    "global `{name}`: only uniform buffers are supported as shader resources"
                ));
            }
            _ => continue,
        }

        let binding = var
            .binding
            .as_ref()
            .ok_or_else(|| format!("uniform `{name}` has no @binding"))?;
        if binding.group != 0 {
            return Err(format!("uniform `{name}` must be declared in @group(0)"));
        }

        let inner = &module.types[var.ty].inner;
        let fields = match inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|m| {
                    Some(UniformField {
                        name: m.name.clone()?,
                        offset: m.offset,
                        kind: uniform_kind(&module.types[m.ty].inner),
                    })
                })
                .collect(),
            other => vec![UniformField {
                name: name.clone(),
                offset: 0,
                kind: uniform_kind(other),
            }],
        };

        blocks.push(UniformBlock {
            binding: binding.binding,
            name,
            size: inner.size(module.to_ctx()),
            fields,
        });
    }

    blocks.sort_by_key(|b| b.binding);
    Ok(blocks)
}

fn uniform_kind(inner: &TypeInner) -> UniformKind {
    const F32: Scalar = Scalar {
        kind: ScalarKind::Float,
        width: 4,
    };

    match *inner {
        TypeInner::Scalar(Scalar {
            kind: ScalarKind::Sint | ScalarKind::Uint,
            width: 4,
        }) => UniformKind::Int,
        TypeInner::Scalar(s) if s == F32 => UniformKind::Float,
        TypeInner::Vector {
            size: VectorSize::Tri,
            scalar,
        } if scalar == F32 => UniformKind::Vec3,
        TypeInner::Vector {
            size: VectorSize::Quad,
            scalar,
        } if scalar == F32 => UniformKind::Vec4,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == F32 => UniformKind::Mat4,
        _ => UniformKind::Unsupported,
    }
}

/// Checks two stages fit together and merges their uniform blocks.
pub(crate) fn link(vertex: &StageInfo, fragment: &StageInfo) -> Result<ProgramLayout, String> {
    if vertex.stage != ShaderStage::Vertex {
        return Err(format!("expected a vertex stage, got {}", vertex.stage));
    }
    if fragment.stage != ShaderStage::Fragment {
        return Err(format!("expected a fragment stage, got {}", fragment.stage));
    }

    for input in &fragment.inputs {
        match vertex.outputs.iter().find(|o| o.location == input.location) {
            None => {
                return Err(format!(
                    "fragment input @location({}) is not written by the vertex stage",
                    input.location
                ));
            }
            Some(output) if output != input => {
                return Err(format!(
                    "@location({}) is {} in the vertex stage but {} in the fragment stage",
                    input.location,
                    type_name(output),
                    type_name(input)
                ));
            }
            Some(_) => {}
        }
    }

    let mut blocks = vertex.uniforms.clone();
    for block in &fragment.uniforms {
        let existing = blocks
            .iter()
            .find(|b| b.binding == block.binding)
            .map(|b| b.size);
        match existing {
            Some(size) if size != block.size => {
                return Err(format!(
                    "uniform binding {} is {} bytes in the vertex stage but {} in the fragment stage",
                    block.binding, size, block.size
                ));
            }
            Some(_) => {}
            None => blocks.push(block.clone()),
        }
    }
    blocks.sort_by_key(|b| b.binding);

    Ok(ProgramLayout {
        vertex_entry: vertex.entry_point.clone(),
        fragment_entry: fragment.entry_point.clone(),
        vertex_inputs: vertex.inputs.clone(),
        blocks,
    })
}

fn type_name(v: &Varying) -> String {
    let scalar = match v.scalar {
        ScalarKind::Float => "f32",
        ScalarKind::Sint => "i32",
        ScalarKind::Uint => "u32",
        ScalarKind::Bool => "bool",
        ScalarKind::AbstractInt | ScalarKind::AbstractFloat => "abstract",
    };
    match v.components {
        1 => scalar.to_owned(),
        n => format!("vec{n}<{scalar}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct Uniforms {
    model: mat4x4<f32>,
    frame: i32,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

struct VertexOut {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) uv: vec2<f32>) -> VertexOut {
    var out: VertexOut;
    out.position = u.model * vec4<f32>(pos, 1.0);
    out.uv = uv + vec2<f32>(f32(u.frame), 0.0);
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@group(0) @binding(1) var<uniform> tint: vec4<f32>;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return tint * vec4<f32>(uv, 0.0, 1.0);
}
"#;

    #[test]
    fn reflects_inputs_and_uniform_members() {
        let info = compile(ShaderStage::Vertex, VERTEX).expect("valid shader");
        assert_eq!(info.entry_point, "vs_main");
        let locations: Vec<u32> = info.inputs.iter().map(|v| v.location).collect();
        assert_eq!(locations, vec![0, 1]);
        assert_eq!(
            info.inputs[0],
            Varying { location: 0, scalar: ScalarKind::Float, components: 3 }
        );
        assert_eq!(
            info.outputs,
            vec![Varying { location: 0, scalar: ScalarKind::Float, components: 2 }]
        );

        let block = &info.uniforms[0];
        assert_eq!(block.name, "u");
        assert_eq!(block.binding, 0);
        assert!(block.size >= 68);
        assert_eq!(block.padded_size() % 16, 0);
        assert_eq!(
            block.fields,
            vec![
                UniformField { name: "model".into(), offset: 0, kind: UniformKind::Mat4 },
                UniformField { name: "frame".into(), offset: 64, kind: UniformKind::Int },
            ]
        );
    }

    #[test]
    fn link_merges_blocks_and_resolves_names() {
        let vs = compile(ShaderStage::Vertex, VERTEX).expect("vertex");
        let fs = compile(ShaderStage::Fragment, FRAGMENT).expect("fragment");
        let layout = link(&vs, &fs).expect("link");

        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(layout.locate("model").map(|l| l.kind), Some(UniformKind::Mat4));
        assert_eq!(layout.locate("u.frame").map(|l| l.offset), Some(64));
        assert_eq!(layout.locate("tint").map(|l| (l.block, l.kind)), Some((1, UniformKind::Vec4)));
        assert_eq!(layout.locate("x.frame"), None);
        assert_eq!(layout.locate("missing"), None);
    }

    #[test]
    fn syntax_errors_carry_a_diagnostic() {
        let err = compile(ShaderStage::Vertex, "@vertex fn vs_main( -> {").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn missing_entry_point_is_an_error() {
        let err = compile(ShaderStage::Vertex, FRAGMENT).unwrap_err();
        assert!(err.contains("vertex"));
    }

    #[test]
    fn link_rejects_swapped_stages() {
        let vs = compile(ShaderStage::Vertex, VERTEX).expect("vertex");
        assert!(link(&vs, &vs).is_err());
    }

    // ── inter-stage ──

    const POSITION_ONLY: &str = r#"
@vertex
fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(p, 1.0);
}
"#;

    #[test]
    fn link_rejects_unwritten_fragment_input() {
        let vs = compile(ShaderStage::Vertex, POSITION_ONLY).expect("vertex");
        let fs = compile(ShaderStage::Fragment, FRAGMENT).expect("fragment");
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("@location(0)"), "{err}");
    }

    #[test]
    fn link_rejects_varying_type_mismatch() {
        let fs = r#"
@fragment
fn fs_main(@location(0) uv: vec4<f32>) -> @location(0) vec4<f32> {
    return uv;
}
"#;
        let vs = compile(ShaderStage::Vertex, VERTEX).expect("vertex");
        let fs = compile(ShaderStage::Fragment, fs).expect("fragment");
        let err = link(&vs, &fs).unwrap_err();
        assert!(err.contains("vec2<f32>") && err.contains("vec4<f32>"), "{err}");
    }

    #[test]
    fn extra_vertex_outputs_are_allowed() {
        let fs = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let vs = compile(ShaderStage::Vertex, VERTEX).expect("vertex");
        let fs = compile(ShaderStage::Fragment, fs).expect("fragment");
        assert!(link(&vs, &fs).is_ok());
    }

    #[test]
    fn non_zero_group_is_rejected() {
        let src = r#"
@group(1) @binding(0) var<uniform> m: mat4x4<f32>;
@vertex
fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
    return m * vec4<f32>(p, 1.0);
}
"#;
        assert!(compile(ShaderStage::Vertex, src).unwrap_err().contains("group(0)"));
    }
}
