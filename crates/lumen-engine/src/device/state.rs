use std::collections::{BTreeMap, BTreeSet, HashMap};

use naga::ScalarKind;

use super::wgsl::Varying;
use super::{
    BufferId, BufferTarget, ComponentType, ProgramId, VertexArrayId, VertexAttrib, ViewportRect,
};

/// One attribute slot: the buffer captured at pointer time plus its layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct AttribBinding {
    pub(crate) buffer: BufferId,
    pub(crate) attrib: VertexAttrib,
}

#[derive(Debug, Default)]
pub(crate) struct VertexArrayState {
    pub(crate) attribs: BTreeMap<u32, AttribBinding>,
    pub(crate) enabled: BTreeSet<u32>,
    pub(crate) element_buffer: Option<BufferId>,
}

/// Everything a draw call needs, resolved from the current bindings.
#[derive(Debug, Clone)]
pub(crate) struct DrawTarget {
    pub(crate) vertex_array: VertexArrayId,
    pub(crate) program: ProgramId,
    pub(crate) element_buffer: BufferId,
    /// Enabled slots in ascending order.
    pub(crate) attribs: Vec<(u32, AttribBinding)>,
}

impl DrawTarget {
    /// Shader input locations with no enabled attribute behind them.
    pub(crate) fn missing_inputs(&self, inputs: &[Varying]) -> Vec<u32> {
        inputs
            .iter()
            .map(|v| v.location)
            .filter(|loc| !self.attribs.iter().any(|(slot, _)| slot == loc))
            .collect()
    }

    /// Shader input locations fed by an attribute of a different scalar kind.
    /// Component counts may differ.
    pub(crate) fn mismatched_inputs(&self, inputs: &[Varying]) -> Vec<u32> {
        inputs
            .iter()
            .filter(|v| {
                self.attribs.iter().any(|(slot, b)| {
                    *slot == v.location && !feeds_scalar(b.attrib.component_type, v.scalar)
                })
            })
            .map(|v| v.location)
            .collect()
    }

    /// Whether every shader input has a compatible attribute; logs the
    /// reason when it does not.
    pub(crate) fn accepts(&self, inputs: &[Varying]) -> bool {
        let missing = self.missing_inputs(inputs);
        if !missing.is_empty() {
            log::warn!("draw ignored: shader inputs {missing:?} have no enabled attribute");
            return false;
        }
        let mismatched = self.mismatched_inputs(inputs);
        if !mismatched.is_empty() {
            log::warn!(
                "draw ignored: attribute types for shader inputs {mismatched:?} do not match"
            );
            return false;
        }
        true
    }
}

fn feeds_scalar(component: ComponentType, scalar: ScalarKind) -> bool {
    matches!(
        (component, scalar),
        (ComponentType::Float, ScalarKind::Float) | (ComponentType::Int, ScalarKind::Sint)
    )
}

/// Bind-point bookkeeping shared by every backend.
#[derive(Debug)]
pub(crate) struct BindState {
    pub(crate) array_buffer: Option<BufferId>,
    pub(crate) vertex_array: Option<VertexArrayId>,
    pub(crate) program: Option<ProgramId>,
    pub(crate) vertex_arrays: HashMap<VertexArrayId, VertexArrayState>,
    pub(crate) clear_color: [f32; 4],
    pub(crate) viewport: Option<ViewportRect>,
    pub(crate) depth_test: bool,
}

impl Default for BindState {
    fn default() -> Self {
        Self {
            array_buffer: None,
            vertex_array: None,
            program: None,
            vertex_arrays: HashMap::new(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            viewport: None,
            depth_test: false,
        }
    }
}

impl BindState {
    fn bound_array_mut(&mut self) -> Option<&mut VertexArrayState> {
        let id = self.vertex_array?;
        self.vertex_arrays.get_mut(&id)
    }

    pub(crate) fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        match target {
            BufferTarget::Array => self.array_buffer = buffer,
            BufferTarget::ElementArray => match self.bound_array_mut() {
                Some(vao) => vao.element_buffer = buffer,
                None => log::debug!("element buffer binding ignored: no vertex array bound"),
            },
        }
    }

    pub(crate) fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        match vertex_array {
            Some(id) if !self.vertex_arrays.contains_key(&id) => {
                log::warn!("bind of unknown {id} ignored");
            }
            other => self.vertex_array = other,
        }
    }

    pub(crate) fn enable_attrib(&mut self, slot: u32) {
        match self.bound_array_mut() {
            Some(vao) => {
                vao.enabled.insert(slot);
            }
            None => log::warn!("enable of attribute {slot} ignored: no vertex array bound"),
        }
    }

    pub(crate) fn attrib_pointer(&mut self, slot: u32, attrib: VertexAttrib) {
        let Some(buffer) = self.array_buffer else {
            log::warn!("attribute {slot} ignored: no array buffer bound");
            return;
        };
        match self.bound_array_mut() {
            Some(vao) => {
                vao.attribs.insert(slot, AttribBinding { buffer, attrib });
            }
            None => log::warn!("attribute {slot} ignored: no vertex array bound"),
        }
    }

    /// Drops every reference to a deleted buffer.
    pub(crate) fn forget_buffer(&mut self, buffer: BufferId) {
        if self.array_buffer == Some(buffer) {
            self.array_buffer = None;
        }
        for vao in self.vertex_arrays.values_mut() {
            if vao.element_buffer == Some(buffer) {
                vao.element_buffer = None;
            }
            vao.attribs.retain(|_, b| b.buffer != buffer);
        }
    }

    pub(crate) fn forget_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        if self.vertex_array == Some(vertex_array) {
            self.vertex_array = None;
        }
    }

    pub(crate) fn forget_program(&mut self, program: ProgramId) {
        if self.program == Some(program) {
            self.program = None;
        }
    }

    /// Resolves the bound vertex array, program and element buffer, warning
    /// about whatever is missing.
    pub(crate) fn draw_target(&self) -> Option<DrawTarget> {
        let Some(vertex_array) = self.vertex_array else {
            log::warn!("draw ignored: no vertex array bound");
            return None;
        };
        let Some(program) = self.program else {
            log::warn!("draw ignored: no shader program in use");
            return None;
        };
        let vao = self.vertex_arrays.get(&vertex_array)?;
        let Some(element_buffer) = vao.element_buffer else {
            log::warn!("draw ignored: {vertex_array} has no index buffer");
            return None;
        };

        let attribs = vao
            .enabled
            .iter()
            .filter_map(|slot| vao.attribs.get(slot).map(|b| (*slot, *b)))
            .collect();

        Some(DrawTarget {
            vertex_array,
            program,
            element_buffer,
            attribs,
        })
    }
}

/// Largest index count that fits in an element buffer of `buffer_size` bytes.
pub(crate) fn clamp_index_count(count: u32, buffer_size: u64) -> u32 {
    let available = buffer_size / std::mem::size_of::<u32>() as u64;
    if u64::from(count) > available {
        log::warn!("draw of {count} indices clamped to {available}");
    }
    u32::try_from(available.min(u64::from(count))).unwrap_or(count)
}
