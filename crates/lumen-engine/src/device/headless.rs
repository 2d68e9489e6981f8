use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::backend::HandleCounter;
use super::state::{clamp_index_count, BindState, VertexArrayState};
use super::wgsl::{self, ProgramLayout, StageInfo};
use super::{
    BufferId, BufferTarget, BufferUsage, DeviceError, DeviceInfo, ProgramId, RenderBackend,
    ShaderId, ShaderStage, SurfaceErrorAction, UniformLocation, UniformValue, VertexArrayId,
    VertexAttrib, ViewportRect,
};

/// A device operation observed by [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        buffer: BufferId,
        target: BufferTarget,
        size: usize,
        usage: BufferUsage,
    },
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferId>,
    },
    DeleteBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    EnableVertexAttrib(u32),
    VertexAttribPointer {
        slot: u32,
        attrib: VertexAttrib,
    },
    CompileShader {
        shader: ShaderId,
        stage: ShaderStage,
    },
    DeleteShader(ShaderId),
    LinkProgram {
        program: ProgramId,
        vertex: ShaderId,
        fragment: ShaderId,
    },
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        location: UniformLocation,
        value: UniformValue,
    },
    SetClearColor([f32; 4]),
    Clear,
    SetViewport(ViewportRect),
    Resize {
        width: u32,
        height: u32,
    },
    SetDepthTest(bool),
    DrawIndexed {
        vertex_array: VertexArrayId,
        program: ProgramId,
        count: u32,
    },
    Present,
}

/// Shared, append-only record of device calls.
///
/// Clones observe the same log, so a test keeps one handle while the backend
/// is owned by the thread's render context.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<DeviceCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every call recorded so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    /// `(vertex array, index count)` of every recorded draw, in order.
    pub fn draws(&self) -> Vec<(VertexArrayId, u32)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match *c {
                DeviceCall::DrawIndexed {
                    vertex_array, count, ..
                } => Some((vertex_array, count)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: DeviceCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Render backend without a GPU.
///
/// WGSL is validated with the same rules as the wgpu backend and bindings are
/// tracked the same way, but draws only land in the [`CallLog`].
#[derive(Debug)]
pub struct HeadlessBackend {
    log: CallLog,
    handles: HandleCounter,
    state: BindState,
    buffers: HashMap<BufferId, usize>,
    shaders: HashMap<ShaderId, StageInfo>,
    programs: HashMap<ProgramId, ProgramLayout>,
    memory_budget: Option<usize>,
    allocated: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::with_log(CallLog::new())
    }

    /// Creates a backend recording into `log`.
    pub fn with_log(log: CallLog) -> Self {
        Self {
            log,
            handles: HandleCounter::default(),
            state: BindState::default(),
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            memory_budget: None,
            allocated: 0,
        }
    }

    /// Makes buffer creation fail once `bytes` of buffer memory are in use.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl RenderBackend for HeadlessBackend {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            vendor: "lumen".into(),
            renderer: "headless".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError> {
        if let Some(budget) = self.memory_budget {
            let requested = self.allocated.saturating_add(data.len());
            if requested > budget {
                return Err(DeviceError::Allocation(format!(
                    "{} bytes requested with {} of {budget} bytes in use",
                    data.len(),
                    self.allocated
                )));
            }
        }

        let buffer = BufferId::from_raw(self.handles.next()?);
        self.buffers.insert(buffer, data.len());
        self.allocated += data.len();
        self.log.push(DeviceCall::CreateBuffer {
            buffer,
            target,
            size: data.len(),
            usage,
        });
        Ok(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        self.state.bind_buffer(target, buffer);
        self.log.push(DeviceCall::BindBuffer { target, buffer });
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(size) => self.allocated -= size,
            None => log::warn!("delete of unknown {buffer}"),
        }
        self.state.forget_buffer(buffer);
        self.log.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, DeviceError> {
        let vertex_array = VertexArrayId::from_raw(self.handles.next()?);
        self.state
            .vertex_arrays
            .insert(vertex_array, VertexArrayState::default());
        self.log.push(DeviceCall::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.state.bind_vertex_array(vertex_array);
        self.log.push(DeviceCall::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if !self.state.vertex_arrays.contains_key(&vertex_array) {
            log::warn!("delete of unknown {vertex_array}");
        }
        self.state.forget_vertex_array(vertex_array);
        self.log.push(DeviceCall::DeleteVertexArray(vertex_array));
    }

    fn enable_vertex_attrib(&mut self, slot: u32) {
        self.state.enable_attrib(slot);
        self.log.push(DeviceCall::EnableVertexAttrib(slot));
    }

    fn vertex_attrib_pointer(&mut self, slot: u32, attrib: VertexAttrib) {
        self.state.attrib_pointer(slot, attrib);
        self.log.push(DeviceCall::VertexAttribPointer { slot, attrib });
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let info = wgsl::compile(stage, source)?;
        let shader = ShaderId::from_raw(self.handles.next().map_err(|e| e.to_string())?);
        self.shaders.insert(shader, info);
        self.log.push(DeviceCall::CompileShader { shader, stage });
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if self.shaders.remove(&shader).is_none() {
            log::warn!("delete of unknown {shader}");
        }
        self.log.push(DeviceCall::DeleteShader(shader));
    }

    fn link_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, String> {
        let vs = self
            .shaders
            .get(&vertex)
            .ok_or_else(|| format!("unknown {vertex}"))?;
        let fs = self
            .shaders
            .get(&fragment)
            .ok_or_else(|| format!("unknown {fragment}"))?;
        let layout = wgsl::link(vs, fs)?;

        let program = ProgramId::from_raw(self.handles.next().map_err(|e| e.to_string())?);
        self.programs.insert(program, layout);
        self.log.push(DeviceCall::LinkProgram {
            program,
            vertex,
            fragment,
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            log::warn!("delete of unknown {program}");
        }
        self.state.forget_program(program);
        self.log.push(DeviceCall::DeleteProgram(program));
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        match program {
            Some(id) if !self.programs.contains_key(&id) => log::warn!("use of unknown {id} ignored"),
            other => self.state.program = other,
        }
        self.log.push(DeviceCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(&program)?.locate(name)
    }

    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: UniformValue) {
        let known = self
            .programs
            .get(&program)
            .is_some_and(|layout| usize::from(location.block) < layout.blocks.len());
        if !known {
            log::warn!("uniform write to {program} ignored: no such block");
            return;
        }
        self.log.push(DeviceCall::SetUniform {
            program,
            location,
            value,
        });
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.state.clear_color = rgba;
        self.log.push(DeviceCall::SetClearColor(rgba));
    }

    fn clear(&mut self) {
        self.log.push(DeviceCall::Clear);
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.state.viewport = Some(rect);
        self.log.push(DeviceCall::SetViewport(rect));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.push(DeviceCall::Resize { width, height });
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
        self.log.push(DeviceCall::SetDepthTest(enabled));
    }

    fn draw_indexed(&mut self, count: u32) {
        let Some(target) = self.state.draw_target() else {
            return;
        };
        let Some(layout) = self.programs.get(&target.program) else {
            log::warn!("draw ignored: {} is not linked", target.program);
            return;
        };
        if !target.accepts(&layout.vertex_inputs) {
            return;
        }

        let buffer_size = self.buffers.get(&target.element_buffer).copied().unwrap_or(0);
        let count = clamp_index_count(count, buffer_size as u64);
        self.log.push(DeviceCall::DrawIndexed {
            vertex_array: target.vertex_array,
            program: target.program,
            count,
        });
    }

    fn present(&mut self) -> Result<(), SurfaceErrorAction> {
        self.log.push(DeviceCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_budget_rejects_large_buffers() {
        let mut backend = HeadlessBackend::new().with_memory_budget(64);
        let small = backend.create_buffer(BufferTarget::Array, &[0u8; 48], BufferUsage::Static);
        assert!(small.is_ok());

        let big = backend.create_buffer(BufferTarget::Array, &[0u8; 32], BufferUsage::Static);
        assert!(matches!(big, Err(DeviceError::Allocation(_))));

        // Freed memory becomes available again.
        if let Ok(id) = small {
            backend.delete_buffer(id);
        }
        assert!(backend.create_buffer(BufferTarget::Array, &[0u8; 32], BufferUsage::Static).is_ok());
    }

    #[test]
    fn failed_compile_creates_nothing() {
        let mut backend = HeadlessBackend::new();
        let log = backend.log();
        assert!(backend.compile_shader(ShaderStage::Vertex, "not wgsl").is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn draw_without_bindings_records_nothing() {
        let mut backend = HeadlessBackend::new();
        let log = backend.log();
        backend.draw_indexed(3);
        assert!(log.draws().is_empty());
    }

    #[test]
    fn clones_share_one_log() {
        let log = CallLog::new();
        let mut backend = HeadlessBackend::with_log(log.clone());
        backend.clear();
        backend.set_depth_test(true);

        assert_eq!(log.calls(), vec![DeviceCall::Clear, DeviceCall::SetDepthTest(true)]);
        assert_eq!(log.count(|c| matches!(c, DeviceCall::Clear)), 1);
    }
}
