//! Light records and the shared light uniform block.
//!
//! Block layout: the directional light first, then `array<PointLight, P>`,
//! then `array<SpotLight, S>`. A kind with no lights has no member. Offsets and strides come from [`crate::layout`],
//! and the WGSL declarations the lit shaders use are generated from the same
//! field lists.

use std::fmt::Write;

use glam::Vec3;

use crate::error::RenderError;
use crate::layout::{round_up, FieldType, FieldValue, StructLayout, UniformBlock};

const DIR_LIGHT_FIELDS: [(&str, FieldType); 4] = [
    ("direction", FieldType::Vec3),
    ("ambient", FieldType::Vec3),
    ("diffuse", FieldType::Vec3),
    ("specular", FieldType::Vec3),
];

const POINT_LIGHT_FIELDS: [(&str, FieldType); 7] = [
    ("position", FieldType::Vec3),
    ("ambient", FieldType::Vec3),
    ("diffuse", FieldType::Vec3),
    ("specular", FieldType::Vec3),
    ("att_constant", FieldType::F32),
    ("att_linear", FieldType::F32),
    ("att_quadratic", FieldType::F32),
];

const SPOT_LIGHT_FIELDS: [(&str, FieldType); 10] = [
    ("position", FieldType::Vec3),
    ("direction", FieldType::Vec3),
    ("ambient", FieldType::Vec3),
    ("diffuse", FieldType::Vec3),
    ("specular", FieldType::Vec3),
    ("att_constant", FieldType::F32),
    ("att_linear", FieldType::F32),
    ("att_quadratic", FieldType::F32),
    ("cut_off", FieldType::F32),
    ("outer_cut_off", FieldType::F32),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    /// Falloff that reaches roughly 50 units.
    pub const RANGE_50: Attenuation = Attenuation {
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
    };
}

/// Spot cone edges, stored as cosines of the half-angles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub inner: f32,
    pub outer: f32,
}

impl Cutoff {
    pub fn from_degrees(inner: f32, outer: f32) -> Self {
        Self {
            inner: inner.to_radians().cos(),
            outer: outer.to_radians().cos(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirLight {
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl DirLight {
    fn values(&self) -> [FieldValue; 4] {
        [
            FieldValue::Vec3(self.direction),
            FieldValue::Vec3(self.ambient),
            FieldValue::Vec3(self.diffuse),
            FieldValue::Vec3(self.specular),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
}

impl PointLight {
    fn values(&self) -> [FieldValue; 7] {
        [
            FieldValue::Vec3(self.position),
            FieldValue::Vec3(self.ambient),
            FieldValue::Vec3(self.diffuse),
            FieldValue::Vec3(self.specular),
            FieldValue::F32(self.attenuation.constant),
            FieldValue::F32(self.attenuation.linear),
            FieldValue::F32(self.attenuation.quadratic),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub attenuation: Attenuation,
    pub cutoff: Cutoff,
}

impl SpotLight {
    fn values(&self) -> [FieldValue; 10] {
        [
            FieldValue::Vec3(self.position),
            FieldValue::Vec3(self.direction),
            FieldValue::Vec3(self.ambient),
            FieldValue::Vec3(self.diffuse),
            FieldValue::Vec3(self.specular),
            FieldValue::F32(self.attenuation.constant),
            FieldValue::F32(self.attenuation.linear),
            FieldValue::F32(self.attenuation.quadratic),
            FieldValue::F32(self.cutoff.inner),
            FieldValue::F32(self.cutoff.outer),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSet {
    pub dir: DirLight,
    pub points: Vec<PointLight>,
    pub spots: Vec<SpotLight>,
}

impl LightSet {
    pub fn layout(&self) -> LightSetLayout {
        LightSetLayout::new(self.points.len(), self.spots.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSetLayout {
    dir: StructLayout,
    point: StructLayout,
    spot: StructLayout,
    point_count: usize,
    spot_count: usize,
}

impl LightSetLayout {
    pub fn new(point_count: usize, spot_count: usize) -> Self {
        Self {
            dir: StructLayout::new("DirLight", &DIR_LIGHT_FIELDS),
            point: StructLayout::new("PointLight", &POINT_LIGHT_FIELDS),
            spot: StructLayout::new("SpotLight", &SPOT_LIGHT_FIELDS),
            point_count,
            spot_count,
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn spot_count(&self) -> usize {
        self.spot_count
    }

    pub fn dir_layout(&self) -> &StructLayout {
        &self.dir
    }

    pub fn point_layout(&self) -> &StructLayout {
        &self.point
    }

    pub fn spot_layout(&self) -> &StructLayout {
        &self.spot
    }

    pub fn point_stride(&self) -> u64 {
        self.point.array_stride()
    }

    pub fn spot_stride(&self) -> u64 {
        self.spot.array_stride()
    }

    pub fn dir_offset(&self) -> u64 {
        0
    }

    fn points_base(&self) -> u64 {
        round_up(self.point.uniform_align(), self.dir.size())
    }

    fn spots_base(&self) -> u64 {
        round_up(
            self.spot.uniform_align(),
            self.points_base() + self.point_count as u64 * self.point_stride(),
        )
    }

    pub fn point_offset(&self, index: usize) -> u64 {
        self.points_base() + index as u64 * self.point_stride()
    }

    pub fn spot_offset(&self, index: usize) -> u64 {
        self.spots_base() + index as u64 * self.spot_stride()
    }

    pub fn total_size(&self) -> u64 {
        round_up(16, self.spots_base() + self.spot_count as u64 * self.spot_stride())
    }

    pub fn pack(&self, lights: &LightSet) -> Result<UniformBlock, RenderError> {
        if lights.points.len() != self.point_count {
            return Err(RenderError::LightCountMismatch {
                kind: "point",
                expected: self.point_count,
                actual: lights.points.len(),
            });
        }
        if lights.spots.len() != self.spot_count {
            return Err(RenderError::LightCountMismatch {
                kind: "spot",
                expected: self.spot_count,
                actual: lights.spots.len(),
            });
        }

        let mut block = UniformBlock::zeroed(self.total_size());
        block.put_struct(&self.dir, self.dir_offset(), &lights.dir.values());
        for (i, light) in lights.points.iter().enumerate() {
            block.put_struct(&self.point, self.point_offset(i), &light.values());
        }
        for (i, light) in lights.spots.iter().enumerate() {
            block.put_struct(&self.spot, self.spot_offset(i), &light.values());
        }
        Ok(block)
    }

    /// WGSL declarations for the light structs, the `Lights` block and the
    /// `point_light_at`/`spot_light_at` accessors.
    ///
    /// WGSL has no zero-length fixed arrays, so an empty kind gets no member
    /// at all and its accessor returns a zero light. Shaders only index up to
    /// the count constants, so that accessor is never reached.
    pub fn wgsl(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.dir.wgsl());
        out.push_str(&self.point.wgsl());
        out.push_str(&self.spot.wgsl());
        let _ = writeln!(out, "const POINT_LIGHT_COUNT: u32 = {}u;", self.point_count);
        let _ = writeln!(out, "const SPOT_LIGHT_COUNT: u32 = {}u;", self.spot_count);

        out.push_str("struct Lights {\n    dir: DirLight,\n");
        if self.point_count > 0 {
            let _ = writeln!(out, "    points: array<PointLight, {}>,", self.point_count);
        }
        if self.spot_count > 0 {
            let _ = writeln!(out, "    spots: array<SpotLight, {}>,", self.spot_count);
        }
        out.push_str("}\n");

        for (accessor, kind, member, count) in [
            ("point_light_at", "PointLight", "points", self.point_count),
            ("spot_light_at", "SpotLight", "spots", self.spot_count),
        ] {
            let body = if count > 0 {
                format!("lights.{member}[i]")
            } else {
                format!("{kind}()")
            };
            let _ = writeln!(out, "fn {accessor}(i: u32) -> {kind} {{ return {body}; }}");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32) -> PointLight {
        PointLight {
            position: Vec3::new(x, 0.0, 0.0),
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
            attenuation: Attenuation::RANGE_50,
        }
    }

    fn spot(y: f32) -> SpotLight {
        SpotLight {
            position: Vec3::new(0.0, y, 0.0),
            direction: Vec3::NEG_Y,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            attenuation: Attenuation::RANGE_50,
            cutoff: Cutoff::from_degrees(8.0, 15.0),
        }
    }

    fn dir() -> DirLight {
        DirLight {
            direction: Vec3::new(-0.2, -1.0, -0.3),
            ambient: Vec3::splat(0.02),
            diffuse: Vec3::splat(0.3),
            specular: Vec3::splat(0.5),
        }
    }

    #[test]
    fn test_light_struct_sizes_follow_uniform_rules() {
        let layout = LightSetLayout::new(4, 1);
        // four 16-aligned vec3 members
        assert_eq!(layout.dir_layout().size(), 4 * 16);
        // four vec3 slots, then three scalars starting in the last vec3's tail
        assert_eq!(layout.point_layout().offset_of("att_constant"), Some(3 * 16 + 12));
        assert_eq!(layout.point_layout().offset_of("att_quadratic"), Some(3 * 16 + 20));
        assert_eq!(layout.point_stride(), round_up(16, 3 * 16 + 24));
        assert_eq!(layout.spot_layout().offset_of("outer_cut_off"), Some(4 * 16 + 28));
        assert_eq!(layout.spot_stride(), round_up(16, 4 * 16 + 32));
    }

    #[test]
    fn test_offsets_match_analytic_formula_for_all_counts() {
        for points in 0..=8usize {
            for spots in 0..=8usize {
                let layout = LightSetLayout::new(points, spots);
                let dir_size = layout.dir_layout().size();
                let p = layout.point_stride();
                let s = layout.spot_stride();
                for i in 0..points {
                    assert_eq!(layout.point_offset(i), dir_size + i as u64 * p, "P={points} S={spots} i={i}");
                }
                for j in 0..spots {
                    assert_eq!(
                        layout.spot_offset(j),
                        dir_size + points as u64 * p + j as u64 * s,
                        "P={points} S={spots} j={j}"
                    );
                }
                assert_eq!(layout.total_size(), dir_size + points as u64 * p + spots as u64 * s);
                assert_eq!(layout.total_size() % 16, 0);
            }
        }
    }

    #[test]
    fn test_empty_kind_takes_no_space() {
        let layout = LightSetLayout::new(0, 1);
        let dir_size = layout.dir_layout().size();
        assert_eq!(layout.spot_offset(0), dir_size);
        assert_eq!(layout.total_size(), dir_size + layout.spot_stride());

        let wgsl = layout.wgsl();
        assert!(!wgsl.contains("points:"));
        assert!(wgsl.contains("spots: array<SpotLight, 1>"));
        assert!(wgsl.contains("const POINT_LIGHT_COUNT: u32 = 0u;"));
        assert!(wgsl.contains("fn point_light_at(i: u32) -> PointLight { return PointLight(); }"));
        assert!(wgsl.contains("fn spot_light_at(i: u32) -> SpotLight { return lights.spots[i]; }"));

        let bare = LightSetLayout::new(0, 0);
        assert_eq!(bare.total_size(), dir_size);
        assert!(!bare.wgsl().contains("spots:"));
    }

    #[test]
    fn test_pack_places_each_light_at_its_offset() {
        let lights = LightSet {
            dir: dir(),
            points: vec![point(1.0), point(2.0), point(3.0), point(4.0)],
            spots: vec![spot(4.5)],
        };
        let layout = lights.layout();
        let block = layout.pack(&lights).unwrap();
        assert_eq!(block.len() as u64, layout.total_size());

        assert_eq!(block.read_vec3(0), Vec3::new(-0.2, -1.0, -0.3));
        for i in 0..4 {
            let base = layout.point_offset(i);
            assert_eq!(block.read_vec3(base), Vec3::new((i + 1) as f32, 0.0, 0.0));
            let quadratic = base + layout.point_layout().offset_of("att_quadratic").unwrap();
            assert_eq!(block.read_f32(quadratic), 0.032);
        }
        let base = layout.spot_offset(0);
        assert_eq!(block.read_vec3(base), Vec3::new(0.0, 4.5, 0.0));
        let outer = base + layout.spot_layout().offset_of("outer_cut_off").unwrap();
        approx::assert_relative_eq!(block.read_f32(outer), 15f32.to_radians().cos());
    }

    #[test]
    fn test_pack_rejects_count_mismatch() {
        let lights = LightSet {
            dir: dir(),
            points: vec![point(1.0)],
            spots: vec![],
        };
        let err = LightSetLayout::new(2, 0).pack(&lights).unwrap_err();
        assert!(matches!(
            err,
            RenderError::LightCountMismatch { kind: "point", expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_generated_wgsl_declares_all_fields() {
        let wgsl = LightSetLayout::new(4, 1).wgsl();
        for (name, _) in SPOT_LIGHT_FIELDS {
            assert!(wgsl.contains(&format!("    {name}: ")), "missing {name}");
        }
        assert!(wgsl.contains("points: array<PointLight, 4>"));
        assert!(wgsl.contains("spots: array<SpotLight, 1>"));
        assert!(wgsl.contains("const SPOT_LIGHT_COUNT: u32 = 1u;"));
    }
}
