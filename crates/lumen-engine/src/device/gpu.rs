use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::backend::HandleCounter;
use super::state::{clamp_index_count, AttribBinding, BindState, VertexArrayState};
use super::surface::{self, SurfaceState};
use super::wgsl::{self, ProgramLayout, StageInfo, Varying};
use super::{
    BufferId, BufferTarget, BufferUsage, ComponentType, DeviceError, DeviceInfo, GpuInit,
    ProgramId, RenderBackend, ShaderId, ShaderStage, SurfaceErrorAction, UniformLocation,
    UniformValue, VertexArrayId, VertexAttrib, ViewportRect,
};

/// Render backend driving a window surface through wgpu.
///
/// wgpu has no global bind state, so this type keeps one and turns each
/// `draw_indexed` into a recorded draw carrying its pipeline, buffers and a
/// snapshot of the program's uniforms. Recorded draws are encoded into render
/// passes at [`RenderBackend::present`]; every `clear` starts a new pass.
pub struct WgpuBackend {
    window: Arc<Window>,
    surface: SurfaceState,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    depth: DepthTarget,

    handles: HandleCounter,
    state: BindState,
    buffers: HashMap<BufferId, DeviceBuffer>,
    shaders: HashMap<ShaderId, CompiledStage>,
    programs: HashMap<ProgramId, GpuProgram>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    frame: FrameRecording,
    uniform_ring: Option<UniformRing>,
    uniform_alignment: u32,
}

struct DeviceBuffer {
    buffer: wgpu::Buffer,
    /// Bytes supplied by the caller (the wgpu allocation may be padded).
    size: u64,
}

struct CompiledStage {
    info: StageInfo,
    module: wgpu::ShaderModule,
}

struct GpuProgram {
    layout: ProgramLayout,
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
    /// CPU copy of every uniform block, snapshotted per draw.
    shadow: Vec<Vec<u8>>,
}

struct DepthTarget {
    format: wgpu::TextureFormat,
    view: wgpu::TextureView,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    buffers: Vec<VertexBufferKey>,
    depth_test: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct VertexBufferKey {
    stride: u64,
    /// `(shader location, format, offset)`.
    attributes: Vec<(u32, wgpu::VertexFormat, u64)>,
}

struct RecordedDraw {
    program: ProgramId,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    /// `(binding, bound size)` per uniform block.
    block_bindings: Vec<(u32, u64)>,
    uniform_offsets: Vec<u32>,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    count: u32,
    viewport: Option<ViewportRect>,
}

struct RecordedPass {
    clear: Option<[f32; 4]>,
    draws: Vec<RecordedDraw>,
}

#[derive(Default)]
struct FrameRecording {
    passes: Vec<RecordedPass>,
    /// Uniform snapshots, each block at an aligned offset.
    uniforms: Vec<u8>,
}

struct UniformRing {
    buffer: wgpu::Buffer,
    capacity: u64,
}

impl WgpuBackend {
    /// Creates the device and configures a surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            power_preference,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
            depth_format,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let raw_surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: Some(&raw_surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;
        device.on_uncaptured_error(Arc::new(|e| {
            log::error!("wgpu uncaptured error: {e}");
        }));

        let caps = raw_surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        raw_surface.configure(&device, &config);

        let depth = DepthTarget::new(&device, depth_format, size);
        let uniform_alignment = device.limits().min_uniform_buffer_offset_alignment;

        log::debug!("surface configured: {format:?} {}x{}", size.width, size.height);

        Ok(Self {
            window,
            surface: SurfaceState {
                surface: raw_surface,
                config,
                size,
            },
            adapter,
            device,
            queue,
            depth,
            handles: HandleCounter::default(),
            state: BindState::default(),
            buffers: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
            frame: FrameRecording::default(),
            uniform_ring: None,
            uniform_alignment,
        })
    }

    fn current_pass(&mut self) -> &mut RecordedPass {
        if self.frame.passes.is_empty() {
            self.frame.passes.push(RecordedPass {
                clear: None,
                draws: Vec::new(),
            });
        }
        let last = self.frame.passes.len() - 1;
        &mut self.frame.passes[last]
    }

    /// Appends the program's uniform blocks to the frame and returns their offsets.
    fn snapshot_uniforms(&mut self, program: ProgramId) -> Vec<u32> {
        let Some(gpu_program) = self.programs.get(&program) else {
            return Vec::new();
        };
        let align = self.uniform_alignment.max(16) as usize;
        let bytes = &mut self.frame.uniforms;

        gpu_program
            .shadow
            .iter()
            .map(|block| {
                let offset = bytes.len().div_ceil(align) * align;
                bytes.resize(offset, 0);
                bytes.extend_from_slice(block);
                u32::try_from(offset).unwrap_or(u32::MAX)
            })
            .collect()
    }

    fn ensure_uniform_capacity(&mut self, required: u64) {
        if self
            .uniform_ring
            .as_ref()
            .is_some_and(|ring| ring.capacity >= required)
        {
            return;
        }

        let capacity = required.next_power_of_two().max(4096);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen uniform ring"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!("uniform ring grown to {capacity} bytes");
        self.uniform_ring = Some(UniformRing { buffer, capacity });
    }

    fn ensure_pipeline(&mut self, key: &PipelineKey) -> Option<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(key) {
            return Some(pipeline.clone());
        }
        let program = self.programs.get(&key.program)?;

        let attributes: Vec<Vec<wgpu::VertexAttribute>> = key
            .buffers
            .iter()
            .map(|b| {
                b.attributes
                    .iter()
                    .map(|&(shader_location, format, offset)| wgpu::VertexAttribute {
                        format,
                        offset,
                        shader_location,
                    })
                    .collect()
            })
            .collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .buffers
            .iter()
            .zip(&attributes)
            .map(|(b, attrs)| wgpu::VertexBufferLayout {
                array_stride: b.stride,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: attrs,
            })
            .collect();

        let label = format!("lumen pipeline {}", key.program);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&label),
                layout: Some(&program.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &program.vertex,
                    entry_point: Some(&program.layout.vertex_entry),
                    compilation_options: Default::default(),
                    buffers: &buffers,
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.fragment,
                    entry_point: Some(&program.layout.fragment_entry),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.surface.config.format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: self.depth.format,
                    depth_write_enabled: key.depth_test,
                    depth_compare: if key.depth_test {
                        wgpu::CompareFunction::Less
                    } else {
                        wgpu::CompareFunction::Always
                    },
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("created {label} ({} vertex buffers)", key.buffers.len());
        self.pipelines.insert(key.clone(), pipeline.clone());
        Some(pipeline)
    }

    /// Groups the enabled attributes consumed by the program into vertex buffer slots.
    fn vertex_buffer_keys(
        &self,
        attribs: &[(u32, AttribBinding)],
        inputs: &[Varying],
    ) -> Option<(Vec<VertexBufferKey>, Vec<wgpu::Buffer>)> {
        let mut slots: Vec<(BufferId, VertexBufferKey)> = Vec::new();

        for &(location, binding) in attribs {
            if !inputs.iter().any(|v| v.location == location) {
                continue;
            }
            let Some(format) = vertex_format(binding.attrib) else {
                log::warn!(
                    "draw ignored: attribute {location} has {} components",
                    binding.attrib.component_count
                );
                return None;
            };
            let stride = match binding.attrib.stride {
                0 => format.size(),
                s => u64::from(s),
            };
            let offset = u64::from(binding.attrib.offset);
            if offset + format.size() > stride {
                log::warn!("draw ignored: attribute {location} overruns its {stride}-byte stride");
                return None;
            }

            let entry = (location, format, offset);
            match slots
                .iter_mut()
                .find(|(buffer, key)| *buffer == binding.buffer && key.stride == stride)
            {
                Some((_, key)) => key.attributes.push(entry),
                None => slots.push((
                    binding.buffer,
                    VertexBufferKey {
                        stride,
                        attributes: vec![entry],
                    },
                )),
            }
        }

        let mut buffers = Vec::with_capacity(slots.len());
        for (id, _) in &slots {
            match self.buffers.get(id) {
                Some(b) => buffers.push(b.buffer.clone()),
                None => {
                    log::warn!("draw ignored: {id} was deleted");
                    return None;
                }
            }
        }

        Some((slots.into_iter().map(|(_, key)| key).collect(), buffers))
    }
}

impl DepthTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: PhysicalSize<u32>) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen depth"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { format, view }
    }
}

impl RenderBackend for WgpuBackend {
    fn info(&self) -> DeviceInfo {
        let info = self.adapter.get_info();
        DeviceInfo {
            vendor: format!("{:#06x}", info.vendor),
            renderer: info.name,
            version: format!("{:?} {} {}", info.backend, info.driver, info.driver_info)
                .trim_end()
                .to_owned(),
        }
    }

    fn create_buffer(
        &mut self,
        target: BufferTarget,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<BufferId, DeviceError> {
        let max = self.device.limits().max_buffer_size;
        if data.len() as u64 > max {
            return Err(DeviceError::Allocation(format!(
                "{} bytes exceeds the device limit of {max}",
                data.len()
            )));
        }

        // wgpu rejects empty initial contents; keep one aligned word instead.
        let contents: Cow<'_, [u8]> = if data.is_empty() {
            Cow::Owned(vec![0; 4])
        } else {
            Cow::Borrowed(data)
        };

        let id = BufferId::from_raw(self.handles.next()?);
        let label = match target {
            BufferTarget::Array => "lumen vertex buffer",
            BufferTarget::ElementArray => "lumen index buffer",
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: &contents,
                usage: wgpu::BufferUsages::VERTEX
                    | wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::COPY_DST,
            });

        log::trace!("{id}: {} bytes ({usage:?})", data.len());
        self.buffers.insert(
            id,
            DeviceBuffer {
                buffer,
                size: data.len() as u64,
            },
        );
        Ok(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferId>) {
        if let Some(id) = buffer {
            if !self.buffers.contains_key(&id) {
                log::warn!("bind of unknown {id} ignored");
                return;
            }
        }
        self.state.bind_buffer(target, buffer);
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        // Recorded draws hold their own references until present.
        if self.buffers.remove(&buffer).is_none() {
            log::warn!("delete of unknown {buffer}");
        }
        self.state.forget_buffer(buffer);
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, DeviceError> {
        let id = VertexArrayId::from_raw(self.handles.next()?);
        self.state
            .vertex_arrays
            .insert(id, VertexArrayState::default());
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.state.bind_vertex_array(vertex_array);
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.state.forget_vertex_array(vertex_array);
    }

    fn enable_vertex_attrib(&mut self, slot: u32) {
        self.state.enable_attrib(slot);
    }

    fn vertex_attrib_pointer(&mut self, slot: u32, attrib: VertexAttrib) {
        self.state.attrib_pointer(slot, attrib);
    }

    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, String> {
        let info = wgsl::compile(stage, source)?;
        let id = ShaderId::from_raw(self.handles.next().map_err(|e| e.to_string())?);

        let label = format!("lumen {stage} shader");
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_owned())),
            });

        self.shaders.insert(id, CompiledStage { info, module });
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if self.shaders.remove(&shader).is_none() {
            log::warn!("delete of unknown {shader}");
        }
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
        let layout = wgsl::link(&vs.info, &fs.info)?;

        let bind_group_layout = (!layout.blocks.is_empty()).then(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = layout
                .blocks
                .iter()
                .map(|block| wgpu::BindGroupLayoutEntry {
                    binding: block.binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(u64::from(block.size)),
                    },
                    count: None,
                })
                .collect();
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("lumen program uniforms"),
                    entries: &entries,
                })
        });

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("lumen program layout"),
                bind_group_layouts: &bind_group_layouts,
                immediate_size: 0,
            });

        let shadow = layout
            .blocks
            .iter()
            .map(|b| vec![0u8; b.padded_size() as usize])
            .collect();

        let program = GpuProgram {
            vertex: vs.module.clone(),
            fragment: fs.module.clone(),
            layout,
            bind_group_layout,
            pipeline_layout,
            shadow,
        };

        let id = ProgramId::from_raw(self.handles.next().map_err(|e| e.to_string())?);
        self.programs.insert(id, program);
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            log::warn!("delete of unknown {program}");
        }
        self.pipelines.retain(|key, _| key.program != program);
        self.state.forget_program(program);
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        match program {
            Some(id) if !self.programs.contains_key(&id) => log::warn!("use of unknown {id} ignored"),
            other => self.state.program = other,
        }
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.programs.get(&program)?.layout.locate(name)
    }

    fn set_uniform(&mut self, program: ProgramId, location: UniformLocation, value: UniformValue) {
        let Some(block) = self
            .programs
            .get_mut(&program)
            .and_then(|p| p.shadow.get_mut(usize::from(location.block)))
        else {
            log::warn!("uniform write to {program} ignored: no such block");
            return;
        };

        let bytes = value.bytes();
        let start = location.offset as usize;
        match block.get_mut(start..start + bytes.len()) {
            Some(dst) => dst.copy_from_slice(bytes),
            None => log::warn!("uniform write at offset {start} overruns its block"),
        }
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.state.clear_color = rgba;
    }

    fn clear(&mut self) {
        self.frame.passes.push(RecordedPass {
            clear: Some(self.state.clear_color),
            draws: Vec::new(),
        });
    }

    fn set_viewport(&mut self, rect: ViewportRect) {
        self.state.viewport = Some(rect);
    }

    fn resize(&mut self, width: u32, height: u32) {
        let new_size = PhysicalSize::new(width, height);
        if self.surface.resize(&self.device, new_size) {
            self.depth = DepthTarget::new(&self.device, self.depth.format, new_size);
            log::debug!("surface resized to {width}x{height}");
        }
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn draw_indexed(&mut self, count: u32) {
        let Some(target) = self.state.draw_target() else {
            return;
        };
        let Some(program) = self.programs.get(&target.program) else {
            log::warn!("draw ignored: {} is not linked", target.program);
            return;
        };
        let inputs = program.layout.vertex_inputs.clone();
        let bind_group_layout = program.bind_group_layout.clone();
        let block_bindings: Vec<(u32, u64)> = program
            .layout
            .blocks
            .iter()
            .map(|b| (b.binding, u64::from(b.padded_size())))
            .collect();

        if !target.accepts(&inputs) {
            return;
        }

        let Some(index) = self.buffers.get(&target.element_buffer) else {
            log::warn!("draw ignored: {} was deleted", target.element_buffer);
            return;
        };
        let index_buffer = index.buffer.clone();
        let count = clamp_index_count(count, index.size);
        if count == 0 {
            return;
        }

        let Some((buffers, vertex_buffers)) = self.vertex_buffer_keys(&target.attribs, &inputs)
        else {
            return;
        };
        let key = PipelineKey {
            program: target.program,
            buffers,
            depth_test: self.state.depth_test,
        };
        let Some(pipeline) = self.ensure_pipeline(&key) else {
            return;
        };

        let uniform_offsets = self.snapshot_uniforms(target.program);
        let viewport = self.state.viewport;
        self.current_pass().draws.push(RecordedDraw {
            program: target.program,
            pipeline,
            bind_group_layout,
            block_bindings,
            uniform_offsets,
            vertex_buffers,
            index_buffer,
            count,
            viewport,
        });
    }

    fn present(&mut self) -> Result<(), SurfaceErrorAction> {
        let mut frame = std::mem::take(&mut self.frame);
        if !self.surface.is_drawable() {
            return Err(SurfaceErrorAction::SkipFrame);
        }

        let surface_texture = match self.surface.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => return Err(self.surface.recover(&self.device, err)),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        if frame.passes.is_empty() {
            frame.passes.push(RecordedPass {
                clear: Some(self.state.clear_color),
                draws: Vec::new(),
            });
        }

        if !frame.uniforms.is_empty() {
            self.ensure_uniform_capacity(frame.uniforms.len() as u64);
        }
        let ring = self.uniform_ring.as_ref().map(|r| &r.buffer);
        if let Some(ring) = ring.filter(|_| !frame.uniforms.is_empty()) {
            self.queue.write_buffer(ring, 0, &frame.uniforms);
        }

        // One bind group per program; draws differ only in their dynamic offsets.
        let mut bind_groups: HashMap<ProgramId, wgpu::BindGroup> = HashMap::new();
        for draw in frame.passes.iter().flat_map(|p| &p.draws) {
            let (Some(layout), Some(ring)) = (&draw.bind_group_layout, ring) else {
                continue;
            };
            bind_groups.entry(draw.program).or_insert_with(|| {
                let entries: Vec<wgpu::BindGroupEntry<'_>> = draw
                    .block_bindings
                    .iter()
                    .map(|&(binding, size)| wgpu::BindGroupEntry {
                        binding,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: ring,
                            offset: 0,
                            size: NonZeroU64::new(size),
                        }),
                    })
                    .collect();
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("lumen program uniforms"),
                    layout,
                    entries: &entries,
                })
            });
        }

        let surface_size = (self.surface.config.width, self.surface.config.height);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        for (i, pass) in frame.passes.iter().enumerate() {
            let color_load = match pass.clear {
                Some([r, g, b, a]) => wgpu::LoadOp::Clear(wgpu::Color {
                    r: f64::from(r),
                    g: f64::from(g),
                    b: f64::from(b),
                    a: f64::from(a),
                }),
                None => wgpu::LoadOp::Load,
            };
            let depth_load = if pass.clear.is_some() || i == 0 {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &pass.draws {
                let Some([x, y, w, h]) = surface_viewport(draw.viewport, surface_size) else {
                    continue;
                };
                rpass.set_viewport(x, y, w, h, 0.0, 1.0);
                rpass.set_pipeline(&draw.pipeline);
                if let Some(group) = bind_groups.get(&draw.program) {
                    rpass.set_bind_group(0, group, &draw.uniform_offsets);
                }
                for (slot, buffer) in (0u32..).zip(&draw.vertex_buffers) {
                    rpass.set_vertex_buffer(slot, buffer.slice(..));
                }
                rpass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}

fn vertex_format(attrib: VertexAttrib) -> Option<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;

    Some(match (attrib.component_type, attrib.component_count) {
        (ComponentType::Float, 1) => F::Float32,
        (ComponentType::Float, 2) => F::Float32x2,
        (ComponentType::Float, 3) => F::Float32x3,
        (ComponentType::Float, 4) => F::Float32x4,
        (ComponentType::Int, 1) => F::Sint32,
        (ComponentType::Int, 2) => F::Sint32x2,
        (ComponentType::Int, 3) => F::Sint32x3,
        (ComponentType::Int, 4) => F::Sint32x4,
        _ => return None,
    })
}

/// Converts a bottom-left-origin viewport into a top-left one clipped to the
/// surface. `None` means the full surface; an empty result yields `None`.
fn surface_viewport(rect: Option<ViewportRect>, (width, height): (u32, u32)) -> Option<[f32; 4]> {
    let Some(rect) = rect else {
        return Some([0.0, 0.0, width as f32, height as f32]);
    };

    let (sw, sh) = (i64::from(width), i64::from(height));
    let x0 = i64::from(rect.left).clamp(0, sw);
    let x1 = (i64::from(rect.left) + i64::from(rect.width)).clamp(0, sw);
    let bottom = i64::from(rect.bottom).clamp(0, sh);
    let top = (i64::from(rect.bottom) + i64::from(rect.height)).clamp(0, sh);

    if x1 <= x0 || top <= bottom {
        return None;
    }
    Some([
        x0 as f32,
        (sh - top) as f32,
        (x1 - x0) as f32,
        (top - bottom) as f32,
    ])
}
