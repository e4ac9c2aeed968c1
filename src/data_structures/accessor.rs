//! Typed accessors over buffer views.
//!
//! An [`Accessor`] says how to read a [`BufferView`] as a sequence of
//! elements: the numeric component type, the element shape and how many
//! elements there are. From that it derives byte geometry (element size,
//! effective stride, total length) and the GPU vertex format.

use std::fmt;

use crate::{
    data_structures::buffer_view::BufferView,
    error::{LoadError, Result},
    glb::schema::AccessorDescriptor,
};

/// Numeric type of a single accessor component, keyed by its GL enum code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ComponentType {
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            5120 => Ok(Self::Int8),
            5121 => Ok(Self::Uint8),
            5122 => Ok(Self::Int16),
            5123 => Ok(Self::Uint16),
            5124 => Ok(Self::Int32),
            5125 => Ok(Self::Uint32),
            5126 => Ok(Self::Float32),
            5130 => Ok(Self::Float64),
            other => Err(LoadError::Schema(format!(
                "unknown accessor componentType {other}"
            ))),
        }
    }

    /// Width of one component in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    fn scalar_kind(self, normalized: bool) -> &'static str {
        match (self, normalized) {
            (Self::Int8, false) => "sint8",
            (Self::Int8, true) => "snorm8",
            (Self::Uint8, false) => "uint8",
            (Self::Uint8, true) => "unorm8",
            (Self::Int16, false) => "sint16",
            (Self::Int16, true) => "snorm16",
            (Self::Uint16, false) => "uint16",
            (Self::Uint16, true) => "unorm16",
            (Self::Int32, _) => "sint32",
            (Self::Uint32, _) => "uint32",
            (Self::Float32, _) => "float32",
            (Self::Float64, _) => "float64",
        }
    }
}

/// Element shape of an accessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessorShape {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AccessorShape {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "SCALAR" => Ok(Self::Scalar),
            "VEC2" => Ok(Self::Vec2),
            "VEC3" => Ok(Self::Vec3),
            "VEC4" => Ok(Self::Vec4),
            "MAT2" => Ok(Self::Mat2),
            "MAT3" => Ok(Self::Mat3),
            "MAT4" => Ok(Self::Mat4),
            other => Err(LoadError::Schema(format!(
                "unknown accessor type \"{other}\""
            ))),
        }
    }

    /// Number of components per element.
    pub fn arity(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }
}

/// A vertex format name in WebGPU spelling, e.g. `float32x3`.
///
/// Not every name has a `wgpu::VertexFormat` counterpart (3-component
/// 8/16-bit formats don't exist on the GPU side); see [`VertexFormat::to_wgpu`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexFormat {
    pub component: ComponentType,
    pub components: usize,
    pub normalized: bool,
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.component.scalar_kind(self.normalized))?;
        if self.components > 1 {
            write!(f, "x{}", self.components)?;
        }
        Ok(())
    }
}

impl VertexFormat {
    pub fn to_wgpu(self) -> Result<wgpu::VertexFormat> {
        use ComponentType as C;
        use wgpu::VertexFormat as W;

        let format = match (self.component, self.normalized, self.components) {
            (C::Float32, _, 1) => W::Float32,
            (C::Float32, _, 2) => W::Float32x2,
            (C::Float32, _, 3) => W::Float32x3,
            (C::Float32, _, 4) => W::Float32x4,
            (C::Uint32, _, 1) => W::Uint32,
            (C::Uint32, _, 2) => W::Uint32x2,
            (C::Uint32, _, 3) => W::Uint32x3,
            (C::Uint32, _, 4) => W::Uint32x4,
            (C::Int32, _, 1) => W::Sint32,
            (C::Int32, _, 2) => W::Sint32x2,
            (C::Int32, _, 3) => W::Sint32x3,
            (C::Int32, _, 4) => W::Sint32x4,
            (C::Uint16, false, 2) => W::Uint16x2,
            (C::Uint16, false, 4) => W::Uint16x4,
            (C::Uint16, true, 2) => W::Unorm16x2,
            (C::Uint16, true, 4) => W::Unorm16x4,
            (C::Int16, false, 2) => W::Sint16x2,
            (C::Int16, false, 4) => W::Sint16x4,
            (C::Int16, true, 2) => W::Snorm16x2,
            (C::Int16, true, 4) => W::Snorm16x4,
            (C::Uint8, false, 2) => W::Uint8x2,
            (C::Uint8, false, 4) => W::Uint8x4,
            (C::Uint8, true, 2) => W::Unorm8x2,
            (C::Uint8, true, 4) => W::Unorm8x4,
            (C::Int8, false, 2) => W::Sint8x2,
            (C::Int8, false, 4) => W::Sint8x4,
            (C::Int8, true, 2) => W::Snorm8x2,
            (C::Int8, true, 4) => W::Snorm8x4,
            _ => {
                return Err(LoadError::UnsupportedType(format!(
                    "vertex format {self} has no GPU equivalent"
                )));
            }
        };
        Ok(format)
    }
}

/// A typed, strided window into one buffer view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    /// Index of the backing buffer view.
    pub view: usize,
    pub component_type: ComponentType,
    pub shape: AccessorShape,
    pub normalized: bool,
    pub count: usize,
    /// Offset of the first element inside the view.
    pub byte_offset: usize,
    view_stride: usize,
}

impl Accessor {
    /// Resolves `descriptor` against the buffer view it names.
    ///
    /// Fails with a schema error for unknown shapes or component codes and
    /// for elements that would be read past the end of the view.
    pub fn resolve(view: &BufferView, descriptor: &AccessorDescriptor) -> Result<Self> {
        let shape = AccessorShape::parse(&descriptor.shape)?;
        let component_type = ComponentType::from_code(descriptor.component_type)?;
        let accessor = Self {
            view: view.index,
            component_type,
            shape,
            normalized: descriptor.normalized,
            count: descriptor.count,
            byte_offset: descriptor.byte_offset.unwrap_or(0),
            view_stride: view.stride,
        };

        if let Some(end) = accessor.end_byte()? {
            if end > view.len() {
                return Err(LoadError::Schema(format!(
                    "accessor reads up to byte {end} of buffer view {} which is only {} bytes",
                    view.index,
                    view.len()
                )));
            }
        }
        Ok(accessor)
    }

    /// Byte size of one element: arity times component width.
    pub fn element_size(&self) -> usize {
        self.shape.arity() * self.component_type.width()
    }

    /// Distance between consecutive elements.
    ///
    /// A view stride of zero means tightly packed, so the element size wins.
    pub fn byte_stride(&self) -> usize {
        self.view_stride.max(self.element_size())
    }

    pub fn byte_length(&self) -> usize {
        self.count * self.byte_stride()
    }

    /// One past the last byte read, relative to the view start.
    ///
    /// `None` for an empty accessor. Offsets or counts too large to address
    /// are a schema error.
    fn end_byte(&self) -> Result<Option<usize>> {
        let Some(last) = self.count.checked_sub(1) else {
            return Ok(None);
        };
        last.checked_mul(self.byte_stride())
            .and_then(|span| span.checked_add(self.byte_offset))
            .and_then(|start| start.checked_add(self.element_size()))
            .map(Some)
            .ok_or_else(|| {
                LoadError::Schema(format!(
                    "accessor with {} elements at byte offset {} overflows the address space",
                    self.count, self.byte_offset
                ))
            })
    }

    pub fn vertex_format(&self) -> Result<VertexFormat> {
        if self.component_type == ComponentType::Float64 {
            return Err(LoadError::UnsupportedType(
                "double-precision components cannot be used as a vertex format".to_string(),
            ));
        }
        if self.shape.is_matrix() {
            return Err(LoadError::UnsupportedType(format!(
                "{:?} accessors cannot be used as a vertex format",
                self.shape
            )));
        }
        Ok(VertexFormat {
            component: self.component_type,
            components: self.shape.arity(),
            normalized: self.normalized,
        })
    }

    pub fn wgpu_vertex_format(&self) -> Result<wgpu::VertexFormat> {
        self.vertex_format()?.to_wgpu()
    }

    pub fn index_format(&self) -> Result<wgpu::IndexFormat> {
        match (self.shape, self.component_type) {
            (AccessorShape::Scalar, ComponentType::Uint16) => Ok(wgpu::IndexFormat::Uint16),
            (AccessorShape::Scalar, ComponentType::Uint32) => Ok(wgpu::IndexFormat::Uint32),
            (shape, component) => Err(LoadError::UnsupportedType(format!(
                "{component:?} {shape:?} accessors cannot be used as indices"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::glb::{RawBuffer, schema::BufferViewDescriptor};

    fn view(len: usize, stride: Option<usize>) -> BufferView {
        let raw = RawBuffer::new(vec![0u8; len]);
        let descriptor = BufferViewDescriptor {
            buffer: 0,
            byte_length: len,
            byte_offset: None,
            byte_stride: stride,
            name: None,
        };
        BufferView::new(0, &raw, &descriptor).unwrap()
    }

    fn descriptor(component_type: u32, shape: &str, count: usize) -> AccessorDescriptor {
        AccessorDescriptor {
            buffer_view: Some(0),
            byte_offset: None,
            component_type,
            normalized: false,
            count,
            shape: shape.to_string(),
        }
    }

    #[rstest]
    #[case("SCALAR", 1)]
    #[case("VEC2", 2)]
    #[case("VEC3", 3)]
    #[case("VEC4", 4)]
    #[case("MAT2", 4)]
    #[case("MAT3", 9)]
    #[case("MAT4", 16)]
    fn shape_arity(#[case] name: &str, #[case] arity: usize) {
        assert_eq!(AccessorShape::parse(name).unwrap().arity(), arity);
    }

    #[rstest]
    #[case("vec3")]
    #[case("MAT5")]
    #[case("")]
    fn unknown_shape_is_schema_error(#[case] name: &str) {
        assert!(matches!(AccessorShape::parse(name), Err(LoadError::Schema(_))));
    }

    #[rstest]
    #[case(5120, 1)]
    #[case(5121, 1)]
    #[case(5122, 2)]
    #[case(5123, 2)]
    #[case(5124, 4)]
    #[case(5125, 4)]
    #[case(5126, 4)]
    #[case(5130, 8)]
    fn component_width(#[case] code: u32, #[case] width: usize) {
        assert_eq!(ComponentType::from_code(code).unwrap().width(), width);
    }

    #[test]
    fn unknown_component_is_schema_error() {
        assert!(matches!(
            ComponentType::from_code(5127),
            Err(LoadError::Schema(_))
        ));
    }

    #[test]
    fn packed_uint16_vec3() {
        let accessor = Accessor::resolve(&view(60, None), &descriptor(5123, "VEC3", 10)).unwrap();
        assert_eq!(accessor.vertex_format().unwrap().to_string(), "uint16x3");
        assert_eq!(accessor.byte_stride(), 6);
        assert_eq!(accessor.byte_length(), 60);
        assert_eq!(accessor.byte_offset, 0);
        // no Uint16x3 on the GPU
        assert!(matches!(
            accessor.wgpu_vertex_format(),
            Err(LoadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn interleaved_stride_wins_over_element_size() {
        let mut d = descriptor(5126, "VEC3", 4);
        d.byte_offset = Some(12);
        let accessor = Accessor::resolve(&view(128, Some(32)), &d).unwrap();
        assert_eq!(accessor.element_size(), 12);
        assert_eq!(accessor.byte_stride(), 32);
        assert_eq!(accessor.byte_length(), 128);
        assert_eq!(
            accessor.wgpu_vertex_format().unwrap(),
            wgpu::VertexFormat::Float32x3
        );
    }

    #[test]
    fn stride_never_below_element_size() {
        let shapes = ["SCALAR", "VEC2", "VEC3", "VEC4", "MAT2", "MAT3", "MAT4"];
        let codes = [5120, 5121, 5122, 5123, 5124, 5125, 5126, 5130];
        for shape in shapes {
            for code in codes {
                for stride in [None, Some(0), Some(1), Some(4), Some(12), Some(36), Some(252)] {
                    let accessor =
                        Accessor::resolve(&view(1024, stride), &descriptor(code, shape, 1))
                            .unwrap();
                    assert!(
                        accessor.byte_stride() >= accessor.element_size(),
                        "{shape} {code} {stride:?}"
                    );
                }
            }
        }
    }

    #[rstest]
    #[case(Some(0), usize::MAX)]
    #[case(Some(usize::MAX), 1)]
    #[case(Some(usize::MAX - 4), 2)]
    fn oversized_count_or_offset_is_schema_error(
        #[case] offset: Option<usize>,
        #[case] count: usize,
    ) {
        let mut d = descriptor(5126, "VEC3", count);
        d.byte_offset = offset;
        let err = Accessor::resolve(&view(24, None), &d).unwrap_err();
        assert!(matches!(err, LoadError::Schema(msg) if msg.contains("overflows")));
    }

    #[test]
    fn double_precision_is_not_a_vertex_format() {
        let accessor = Accessor::resolve(&view(24, None), &descriptor(5130, "VEC3", 1)).unwrap();
        assert_eq!(accessor.byte_stride(), 24);
        assert!(matches!(
            accessor.vertex_format(),
            Err(LoadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn normalized_bytes_become_unorm() {
        let mut d = descriptor(5121, "VEC2", 2);
        d.normalized = true;
        let accessor = Accessor::resolve(&view(4, None), &d).unwrap();
        assert_eq!(accessor.vertex_format().unwrap().to_string(), "unorm8x2");
        assert_eq!(
            accessor.wgpu_vertex_format().unwrap(),
            wgpu::VertexFormat::Unorm8x2
        );
    }

    #[test]
    fn scalar_float_has_no_suffix() {
        let accessor = Accessor::resolve(&view(4, None), &descriptor(5126, "SCALAR", 1)).unwrap();
        assert_eq!(accessor.vertex_format().unwrap().to_string(), "float32");
    }

    #[test]
    fn index_formats() {
        let short = Accessor::resolve(&view(6, None), &descriptor(5123, "SCALAR", 3)).unwrap();
        let int = Accessor::resolve(&view(12, None), &descriptor(5125, "SCALAR", 3)).unwrap();
        let byte = Accessor::resolve(&view(3, None), &descriptor(5121, "SCALAR", 3)).unwrap();
        assert_eq!(short.index_format().unwrap(), wgpu::IndexFormat::Uint16);
        assert_eq!(int.index_format().unwrap(), wgpu::IndexFormat::Uint32);
        assert!(matches!(
            byte.index_format(),
            Err(LoadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn reading_past_the_view_is_rejected() {
        let err = Accessor::resolve(&view(35, None), &descriptor(5126, "VEC3", 3)).unwrap_err();
        assert!(matches!(err, LoadError::Schema(msg) if msg.contains("only 35 bytes")));
    }
}
