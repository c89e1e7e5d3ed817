//! Byte layout of uniform blocks under WGSL's uniform address-space rules.
//!
//! Structs are described declaratively as `(name, FieldType)` lists. The same
//! description yields the Rust-side byte offsets used to pack buffers and the
//! WGSL `struct` text the shaders are compiled against, so the two can't drift.

use std::fmt::Write;

use glam::{Mat4, Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl FieldType {
    pub const fn align(self) -> u64 {
        match self {
            FieldType::F32 => 4,
            FieldType::Vec2 => 8,
            FieldType::Vec3 | FieldType::Vec4 | FieldType::Mat4 => 16,
        }
    }

    pub const fn size(self) -> u64 {
        match self {
            FieldType::F32 => 4,
            FieldType::Vec2 => 8,
            // vec3 is 12 bytes but 16-aligned; a following scalar may use the gap
            FieldType::Vec3 => 12,
            FieldType::Vec4 => 16,
            FieldType::Mat4 => 64,
        }
    }

    pub const fn wgsl(self) -> &'static str {
        match self {
            FieldType::F32 => "f32",
            FieldType::Vec2 => "vec2<f32>",
            FieldType::Vec3 => "vec3<f32>",
            FieldType::Vec4 => "vec4<f32>",
            FieldType::Mat4 => "mat4x4<f32>",
        }
    }
}

pub const fn round_up(align: u64, n: u64) -> u64 {
    n.div_ceil(align) * align
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructLayout {
    name: &'static str,
    fields: Vec<Field>,
    align: u64,
    size: u64,
}

impl StructLayout {
    pub fn new(name: &'static str, members: &[(&'static str, FieldType)]) -> Self {
        let mut offset = 0;
        let mut align = 1;
        let mut fields = Vec::with_capacity(members.len());

        for &(field_name, ty) in members {
            offset = round_up(ty.align(), offset);
            fields.push(Field {
                name: field_name,
                ty,
                offset,
            });
            offset += ty.size();
            align = align.max(ty.align());
        }

        Self {
            name,
            fields,
            align,
            size: round_up(align, offset),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn align(&self) -> u64 {
        self.align
    }

    /// Alignment when the struct is nested in a uniform block or array.
    pub fn uniform_align(&self) -> u64 {
        round_up(16, self.align)
    }

    /// Distance between consecutive elements of `array<Self, N>` in a uniform block.
    pub fn array_stride(&self) -> u64 {
        round_up(16, round_up(self.align, self.size))
    }

    pub fn offset_of(&self, field: &str) -> Option<u64> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.offset)
    }

    pub fn wgsl(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "struct {} {{", self.name);
        for field in &self.fields {
            let _ = writeln!(out, "    {}: {},", field.name, field.ty.wgsl());
        }
        out.push_str("}\n");
        out
    }
}

/// A value matching one `FieldType`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl FieldValue {
    pub fn ty(&self) -> FieldType {
        match self {
            FieldValue::F32(_) => FieldType::F32,
            FieldValue::Vec2(_) => FieldType::Vec2,
            FieldValue::Vec3(_) => FieldType::Vec3,
            FieldValue::Vec4(_) => FieldType::Vec4,
            FieldValue::Mat4(_) => FieldType::Mat4,
        }
    }
}

/// Zero-initialised byte image of a uniform block.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn zeroed(size: u64) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    pub fn put(&mut self, offset: u64, value: FieldValue) {
        let start = offset as usize;
        match value {
            FieldValue::F32(v) => self.put_floats(start, &[v]),
            FieldValue::Vec2(v) => self.put_floats(start, &v.to_array()),
            FieldValue::Vec3(v) => self.put_floats(start, &v.to_array()),
            FieldValue::Vec4(v) => self.put_floats(start, &v.to_array()),
            FieldValue::Mat4(m) => self.put_floats(start, &m.to_cols_array()),
        }
    }

    /// Writes `values` in declaration order at `base`.
    pub fn put_struct(&mut self, layout: &StructLayout, base: u64, values: &[FieldValue]) {
        debug_assert_eq!(layout.fields().len(), values.len(), "{}", layout.name());
        for (field, value) in layout.fields().iter().zip(values) {
            debug_assert_eq!(field.ty, value.ty(), "{}.{}", layout.name(), field.name);
            self.put(base + field.offset, *value);
        }
    }

    fn put_floats(&mut self, start: usize, floats: &[f32]) {
        let src: &[u8] = bytemuck::cast_slice(floats);
        self.bytes[start..start + src.len()].copy_from_slice(src);
    }

    pub fn read_f32(&self, offset: u64) -> f32 {
        let start = offset as usize;
        bytemuck::pod_read_unaligned(&self.bytes[start..start + 4])
    }

    pub fn read_vec3(&self, offset: u64) -> Vec3 {
        Vec3::new(
            self.read_f32(offset),
            self.read_f32(offset + 4),
            self.read_f32(offset + 8),
        )
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_packs_into_vec3_tail() {
        let layout = StructLayout::new(
            "Probe",
            &[("a", FieldType::Vec3), ("b", FieldType::F32), ("c", FieldType::Vec3)],
        );
        assert_eq!(layout.offset_of("a"), Some(0));
        assert_eq!(layout.offset_of("b"), Some(12));
        assert_eq!(layout.offset_of("c"), Some(16));
        assert_eq!(layout.size(), 32);
        assert_eq!(layout.align(), 16);
    }

    #[test]
    fn test_scalar_only_struct_stride_is_padded_to_16() {
        let layout = StructLayout::new(
            "Scalars",
            &[("x", FieldType::F32), ("y", FieldType::F32), ("z", FieldType::F32)],
        );
        assert_eq!(layout.size(), 12);
        assert_eq!(layout.align(), 4);
        assert_eq!(layout.uniform_align(), 16);
        assert_eq!(layout.array_stride(), 16);
    }

    #[test]
    fn test_mat4_and_vec2_alignment() {
        let layout = StructLayout::new(
            "Mixed",
            &[("uv", FieldType::Vec2), ("m", FieldType::Mat4), ("w", FieldType::F32)],
        );
        assert_eq!(layout.offset_of("uv"), Some(0));
        assert_eq!(layout.offset_of("m"), Some(16));
        assert_eq!(layout.offset_of("w"), Some(80));
        assert_eq!(layout.size(), 96);
        assert_eq!(layout.offset_of("missing"), None);
    }

    #[test]
    fn test_wgsl_declaration() {
        let layout = StructLayout::new("Probe", &[("a", FieldType::Vec3), ("b", FieldType::F32)]);
        assert_eq!(layout.wgsl(), "struct Probe {\n    a: vec3<f32>,\n    b: f32,\n}\n");
    }

    #[test]
    fn test_block_writes_at_field_offsets() {
        let layout = StructLayout::new("Probe", &[("a", FieldType::Vec3), ("b", FieldType::F32)]);
        let mut block = UniformBlock::zeroed(layout.size() * 2);
        block.put_struct(
            &layout,
            layout.size(),
            &[FieldValue::Vec3(Vec3::new(1.0, 2.0, 3.0)), FieldValue::F32(4.0)],
        );
        assert_eq!(block.read_vec3(0), Vec3::ZERO);
        assert_eq!(block.read_vec3(16), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(block.read_f32(28), 4.0);
    }
}
