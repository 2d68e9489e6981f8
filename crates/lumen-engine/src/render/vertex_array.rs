use crate::device::{self, BufferTarget, DeviceError, VertexArrayId};

use super::buffer::{IndexBuffer, VertexBuffer};
use super::with_device;

/// Records which vertex buffers feed which attribute slots, plus the index buffer.
///
/// Binding the array restores all of those bindings at once. Attribute slots are
/// assigned in the order buffers are added.
#[derive(Debug)]
pub struct VertexArray {
    id: VertexArrayId,
    attribute_count: u32,
    index_count: u32,
}

impl VertexArray {
    pub fn new() -> Result<Self, DeviceError> {
        let id = device::with(|d| d.create_vertex_array())??;
        Ok(Self {
            id,
            attribute_count: 0,
            index_count: 0,
        })
    }

    pub fn bind(&self) {
        with_device("vertex array bind", |d| d.bind_vertex_array(Some(self.id)));
    }

    pub fn unbind() {
        with_device("vertex array unbind", |d| d.bind_vertex_array(None));
    }

    /// Assigns one attribute slot per element of the buffer's layout.
    pub fn add_vertex_buffer(&mut self, vertex_buffer: &VertexBuffer) {
        let id = self.id;
        let first = self.attribute_count;
        let layout = vertex_buffer.layout();

        let next = with_device("add vertex buffer", |d| {
            d.bind_vertex_array(Some(id));
            d.bind_buffer(BufferTarget::Array, Some(vertex_buffer.id()));

            let mut slot = first;
            for element in layout {
                d.enable_vertex_attrib(slot);
                d.vertex_attrib_pointer(slot, element.attrib(layout.stride()));
                slot += 1;
            }
            slot
        });

        if let Some(next) = next {
            self.attribute_count = next;
        }
    }

    /// Attaches `index_buffer`; later draws use its index count.
    pub fn set_index_buffer(&mut self, index_buffer: &IndexBuffer) {
        let id = self.id;
        let attached = with_device("set index buffer", |d| {
            d.bind_vertex_array(Some(id));
            d.bind_buffer(BufferTarget::ElementArray, Some(index_buffer.id()));
        });

        if attached.is_some() {
            self.index_count = index_buffer.count();
        }
    }

    /// Number of attribute slots assigned so far.
    pub fn attribute_count(&self) -> u32 {
        self.attribute_count
    }

    /// Index count of the attached index buffer.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn id(&self) -> VertexArrayId {
        self.id
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        with_device("vertex array release", |d| d.delete_vertex_array(self.id));
    }
}
