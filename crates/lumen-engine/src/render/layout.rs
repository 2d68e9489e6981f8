use crate::device::{ComponentType, VertexAttrib};

/// Type of a single vertex attribute as seen by the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    Int2,
    Int3,
    Int4,
}

impl ShaderDataType {
    pub const fn component_count(self) -> u8 {
        match self {
            ShaderDataType::Float | ShaderDataType::Int => 1,
            ShaderDataType::Float2 | ShaderDataType::Int2 => 2,
            ShaderDataType::Float3 | ShaderDataType::Int3 => 3,
            ShaderDataType::Float4 | ShaderDataType::Int4 => 4,
        }
    }

    pub const fn component_type(self) -> ComponentType {
        match self {
            ShaderDataType::Float
            | ShaderDataType::Float2
            | ShaderDataType::Float3
            | ShaderDataType::Float4 => ComponentType::Float,
            ShaderDataType::Int
            | ShaderDataType::Int2
            | ShaderDataType::Int3
            | ShaderDataType::Int4 => ComponentType::Int,
        }
    }

    /// Size in bytes; every component is 4 bytes wide.
    pub const fn size(self) -> u32 {
        self.component_count() as u32 * 4
    }
}

/// One attribute inside an interleaved vertex.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferElement {
    pub data_type: ShaderDataType,
    pub component_type: ComponentType,
    pub component_count: u8,
    /// Bytes occupied by this element.
    pub size: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

impl BufferElement {
    fn new(data_type: ShaderDataType, offset: u32) -> Self {
        Self {
            data_type,
            component_type: data_type.component_type(),
            component_count: data_type.component_count(),
            size: data_type.size(),
            offset,
        }
    }

    pub(crate) fn attrib(&self, stride: u32) -> VertexAttrib {
        VertexAttrib {
            component_count: self.component_count,
            component_type: self.component_type,
            stride,
            offset: self.offset,
        }
    }
}

/// Ordered, tightly packed attribute layout of a vertex buffer.
///
/// Offsets and stride are computed once at construction.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(types: impl IntoIterator<Item = ShaderDataType>) -> Self {
        let mut stride = 0;
        let elements = types
            .into_iter()
            .map(|data_type| {
                let element = BufferElement::new(data_type, stride);
                stride += element.size;
                element
            })
            .collect();

        Self { elements, stride }
    }

    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    /// Bytes per vertex.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl FromIterator<ShaderDataType> for BufferLayout {
    fn from_iter<I: IntoIterator<Item = ShaderDataType>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ShaderDataType::*;

    fn assert_packed(layout: &BufferLayout) {
        let mut expected = 0;
        for element in layout {
            assert_eq!(element.offset, expected);
            expected += element.size;
        }
        assert_eq!(layout.stride(), expected);
    }

    #[test]
    fn position_uv_layout() {
        let layout = BufferLayout::new([Float3, Float2]);
        assert_eq!(layout.stride(), 20);
        assert_eq!(layout.elements()[0].offset, 0);
        assert_eq!(layout.elements()[1].offset, 12);
        assert_eq!(layout.elements()[1].component_count, 2);
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let layouts = [
            vec![Float],
            vec![Float4, Int, Float2],
            vec![Int4, Int3, Int2, Int, Float4, Float3, Float2, Float],
            vec![Float3; 5],
        ];
        for types in layouts {
            let layout: BufferLayout = types.iter().copied().collect();
            assert_eq!(layout.len(), types.len());
            assert_packed(&layout);
        }
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let layout = BufferLayout::default();
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn int_types_keep_int_components() {
        assert_eq!(Int3.component_type(), ComponentType::Int);
        assert_eq!(Int3.size(), 12);
        assert_eq!(Float4.component_type(), ComponentType::Float);
    }

    #[test]
    fn attrib_uses_layout_stride() {
        let layout = BufferLayout::new([Float3, Float2]);
        let attrib = layout.elements()[1].attrib(layout.stride());
        assert_eq!(attrib.stride, 20);
        assert_eq!(attrib.offset, 12);
        assert_eq!(attrib.component_type, ComponentType::Float);
    }
}
