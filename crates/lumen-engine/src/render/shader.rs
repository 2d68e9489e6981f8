use glam::{Mat4, Vec3, Vec4};

use crate::device::{self, DeviceError, ProgramId, RenderBackend, ShaderStage, UniformValue};

use super::with_device;

/// Why a shader program could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    #[error("shader program failed to link:\n{0}")]
    Link(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// A linked vertex + fragment program.
///
/// A program that failed to build is still a valid value: it owns no handle,
/// [`ShaderProgram::is_compiled`] is `false` and every operation is a warned no-op.
#[derive(Debug)]
pub struct ShaderProgram {
    id: Option<ProgramId>,
}

impl ShaderProgram {
    /// Compiles both WGSL stages and links them.
    pub fn try_new(vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let id = device::with(|d| build_program(d, vertex_src, fragment_src))??;
        log::debug!("linked {id}");
        Ok(Self { id: Some(id) })
    }

    /// Like [`ShaderProgram::try_new`], but logs failures and returns an
    /// uncompiled program instead.
    pub fn new(vertex_src: &str, fragment_src: &str) -> Self {
        Self::try_new(vertex_src, fragment_src).unwrap_or_else(|err| {
            log::error!("{err}");
            Self { id: None }
        })
    }

    pub fn is_compiled(&self) -> bool {
        self.id.is_some()
    }

    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    pub fn bind(&self) {
        match self.id {
            Some(id) => {
                with_device("shader bind", |d| d.use_program(Some(id)));
            }
            None => log::warn!("bind of an uncompiled shader program ignored"),
        }
    }

    pub fn unbind() {
        with_device("shader unbind", |d| d.use_program(None));
    }

    pub fn set_matrix4(&self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    pub fn set_vec4(&self, name: &str, value: Vec4) {
        self.set_uniform(name, UniformValue::Vec4(value));
    }

    fn set_uniform(&self, name: &str, value: UniformValue) {
        let Some(program) = self.id else {
            log::warn!("uniform `{name}` ignored: shader program is not compiled");
            return;
        };

        with_device("set uniform", |d| {
            let Some(location) = d.uniform_location(program, name) else {
                log::warn!("uniform `{name}` not found in {program}");
                return;
            };
            if location.kind != value.kind() {
                log::warn!(
                    "uniform `{name}` is {:?}, cannot assign {:?}",
                    location.kind,
                    value.kind()
                );
                return;
            }
            d.set_uniform(program, location, value);
        });
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            with_device("shader program release", |d| d.delete_program(id));
        }
    }
}

/// Compiles vertex then fragment, links, and releases both stage objects.
fn build_program(
    d: &mut dyn RenderBackend,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<ProgramId, ShaderError> {
    let vertex = d
        .compile_shader(ShaderStage::Vertex, vertex_src)
        .map_err(|log| ShaderError::Compile {
            stage: ShaderStage::Vertex,
            log,
        })?;

    let fragment = match d.compile_shader(ShaderStage::Fragment, fragment_src) {
        Ok(id) => id,
        Err(log) => {
            d.delete_shader(vertex);
            return Err(ShaderError::Compile {
                stage: ShaderStage::Fragment,
                log,
            });
        }
    };

    let linked = d.link_program(vertex, fragment);
    d.delete_shader(vertex);
    d.delete_shader(fragment);
    linked.map_err(ShaderError::Link)
}
