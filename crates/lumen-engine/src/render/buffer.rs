use bytemuck::Pod;

use crate::device::{self, BufferId, BufferTarget, BufferUsage, DeviceError};

use super::layout::BufferLayout;
use super::with_device;

/// Vertex data resident on the device, described by a [`BufferLayout`].
///
/// Owns its device buffer exclusively and deletes it on drop.
#[derive(Debug)]
pub struct VertexBuffer {
    id: BufferId,
    layout: BufferLayout,
    usage: BufferUsage,
    size: usize,
}

impl VertexBuffer {
    /// Uploads `data` as raw bytes.
    pub fn new<T: Pod>(
        data: &[T],
        layout: BufferLayout,
        usage: BufferUsage,
    ) -> Result<Self, DeviceError> {
        Self::from_bytes(bytemuck::cast_slice(data), layout, usage)
    }

    pub fn from_bytes(
        bytes: &[u8],
        layout: BufferLayout,
        usage: BufferUsage,
    ) -> Result<Self, DeviceError> {
        let stride = layout.stride() as usize;
        if stride > 0 && bytes.len() % stride != 0 {
            log::warn!(
                "vertex data of {} bytes is not a whole number of {stride}-byte vertices",
                bytes.len()
            );
        }

        let id = device::with(|d| d.create_buffer(BufferTarget::Array, bytes, usage))??;
        Ok(Self {
            id,
            layout,
            usage,
            size: bytes.len(),
        })
    }

    pub fn bind(&self) {
        with_device("vertex buffer bind", |d| {
            d.bind_buffer(BufferTarget::Array, Some(self.id))
        });
    }

    pub fn unbind() {
        with_device("vertex buffer unbind", |d| d.bind_buffer(BufferTarget::Array, None));
    }

    pub fn layout(&self) -> &BufferLayout {
        &self.layout
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Size of the uploaded data in bytes.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        with_device("vertex buffer release", |d| d.delete_buffer(self.id));
    }
}

/// `u32` indices resident on the device.
#[derive(Debug)]
pub struct IndexBuffer {
    id: BufferId,
    count: u32,
    usage: BufferUsage,
}

impl IndexBuffer {
    pub fn new(indices: &[u32], usage: BufferUsage) -> Result<Self, DeviceError> {
        let count = u32::try_from(indices.len())
            .map_err(|_| DeviceError::Allocation(format!("{} indices", indices.len())))?;
        let bytes = bytemuck::cast_slice(indices);

        let id = device::with(|d| d.create_buffer(BufferTarget::ElementArray, bytes, usage))??;
        Ok(Self { id, count, usage })
    }

    /// Binds to the element target, which attaches it to the bound vertex array.
    pub fn bind(&self) {
        with_device("index buffer bind", |d| {
            d.bind_buffer(BufferTarget::ElementArray, Some(self.id))
        });
    }

    pub fn unbind() {
        with_device("index buffer unbind", |d| {
            d.bind_buffer(BufferTarget::ElementArray, None)
        });
    }

    /// Number of indices.
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for IndexBuffer {
    fn drop(&mut self) {
        with_device("index buffer release", |d| d.delete_buffer(self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{make_current, release_current, CallLog, DeviceCall, HeadlessBackend};
    use crate::render::ShaderDataType;

    fn headless() -> CallLog {
        let log = CallLog::new();
        make_current(Box::new(HeadlessBackend::with_log(log.clone()))).expect("context free");
        log
    }

    fn deletes(log: &CallLog, id: BufferId) -> usize {
        log.count(|c| *c == DeviceCall::DeleteBuffer(id))
    }

    // ── creation ──────────────────────────────────────────────────────────

    #[test]
    fn creation_without_context_fails() {
        let layout = BufferLayout::new([ShaderDataType::Float]);
        let result = VertexBuffer::new(&[1.0f32], layout, BufferUsage::Static);
        assert_eq!(result.err(), Some(DeviceError::NoContext));
    }

    #[test]
    fn vertex_upload_records_size_and_usage() {
        let log = headless();
        let layout = BufferLayout::new([ShaderDataType::Float3]);
        let vb = VertexBuffer::new(&[0.0f32; 9], layout, BufferUsage::Dynamic).expect("buffer");

        assert_eq!(vb.size(), 36);
        assert_eq!(
            log.calls()[0],
            DeviceCall::CreateBuffer {
                buffer: vb.id(),
                target: BufferTarget::Array,
                size: 36,
                usage: BufferUsage::Dynamic,
            }
        );
        drop(vb);
        release_current();
    }

    #[test]
    fn allocation_failure_is_returned() {
        make_current(Box::new(HeadlessBackend::new().with_memory_budget(8))).expect("context");
        let result = IndexBuffer::new(&[0, 1, 2], BufferUsage::Static);
        assert!(matches!(result, Err(DeviceError::Allocation(_))));
        release_current();
    }

    // ── ownership ─────────────────────────────────────────────────────────

    #[test]
    fn moved_buffer_is_released_once() {
        let log = headless();
        let ib = IndexBuffer::new(&[0, 1, 2], BufferUsage::Static).expect("buffer");
        let id = ib.id();
        assert_eq!(ib.count(), 3);

        let moved = ib;
        let boxed = Box::new(moved);
        assert_eq!(deletes(&log, id), 0);

        drop(boxed);
        assert_eq!(deletes(&log, id), 1);
        release_current();
    }

    #[test]
    fn each_buffer_releases_its_own_handle() {
        let log = headless();
        let layout = BufferLayout::new([ShaderDataType::Float2]);
        let a = VertexBuffer::new(&[0.0f32; 4], layout.clone(), BufferUsage::Static).expect("a");
        let b = VertexBuffer::new(&[0.0f32; 4], layout, BufferUsage::Static).expect("b");
        let (a_id, b_id) = (a.id(), b.id());
        assert_ne!(a_id, b_id);

        drop(a);
        assert_eq!(deletes(&log, a_id), 1);
        assert_eq!(deletes(&log, b_id), 0);

        drop(b);
        assert_eq!(deletes(&log, b_id), 1);
        release_current();
    }
}
