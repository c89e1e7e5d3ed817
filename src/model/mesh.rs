use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use wgpu::util::DeviceExt;

use super::{Texture, TextureKind, Vertex};
use crate::error::RenderError;

/// Struct name the material samplers live under in the shaders.
pub const MATERIAL_PREFIX: &str = "material";

/// Where one of a mesh's textures goes at draw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub kind: Option<TextureKind>,
    /// 1-based count among textures of the same kind.
    pub ordinal: Option<u32>,
    pub unit: u32,
    /// `material.<kind><ordinal>`; untagged textures are bound by unit only.
    pub uniform_name: Option<String>,
}

impl TextureBinding {
    /// WGSL identifier of the texture variable this binding targets.
    pub fn shader_name(&self) -> String {
        match &self.uniform_name {
            Some(name) => name.replace('.', "_"),
            None => format!("texture_unit{}", self.unit),
        }
    }
}

/// Assigns units in stored order and a per-kind ordinal starting at 1.
/// Every call starts again from unit 0.
pub fn texture_bindings<I>(kinds: I) -> Vec<TextureBinding>
where
    I: IntoIterator<Item = Option<TextureKind>>,
{
    let mut counters: HashMap<TextureKind, u32> = HashMap::new();
    kinds
        .into_iter()
        .enumerate()
        .map(|(unit, kind)| {
            let ordinal = kind.map(|k| {
                let n = counters.entry(k).or_insert(0);
                *n += 1;
                *n
            });
            let uniform_name = kind
                .zip(ordinal)
                .map(|(k, n)| format!("{MATERIAL_PREFIX}.{}{n}", k.uniform_stem()));
            TextureBinding {
                kind,
                ordinal,
                unit: unit as u32,
                uniform_name,
            }
        })
        .collect()
}

pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<Arc<Texture>>,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        textures: Vec<Arc<Texture>>,
        indices: Vec<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            textures,
        }
    }

    pub fn texture_bindings(&self) -> Vec<TextureBinding> {
        texture_bindings(self.textures.iter().map(|t| t.kind))
    }

    /// A mesh with no vertices has nothing to draw and is refused.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.vertices.is_empty() {
            log::error!("Mesh `{}` has no vertices", self.name);
            return Err(RenderError::EmptyMesh {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn upload(&self, device: &wgpu::Device) -> Result<GpuMesh, RenderError> {
        self.validate()?;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", self.name)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = (!self.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });

        log::debug!(
            "Uploaded mesh `{}`: {} vertices, {} indices, {} textures",
            self.name,
            self.vertices.len(),
            self.indices.len(),
            self.textures.len()
        );

        Ok(GpuMesh {
            name: self.name.clone(),
            vertex_buffer,
            index_buffer,
            vertex_count: self.vertices.len() as u32,
            index_count: self.indices.len() as u32,
        })
    }

    /// Line-list segments from each vertex along its normal.
    pub fn normal_lines(&self, length: f32) -> Vec<[f32; 3]> {
        self.vertices
            .iter()
            .flat_map(|v| {
                let start = Vec3::from(v.position);
                let end = start + Vec3::from(v.normal).normalize_or_zero() * length;
                [start.to_array(), end.to_array()]
            })
            .collect()
    }
}

/// A mesh whose geometry lives on the GPU. Only uploaded meshes can be drawn.
pub struct GpuMesh {
    pub name: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl GpuMesh {
    pub fn is_indexed(&self) -> bool {
        self.index_buffer.is_some()
    }

    pub fn element_count(&self) -> u32 {
        if self.is_indexed() {
            self.index_count
        } else {
            self.vertex_count
        }
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        match &self.index_buffer {
            Some(index_buffer) => {
                render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..self.index_count, 0, 0..1);
            }
            None => render_pass.draw(0..self.vertex_count, 0..1),
        }
    }
}

/// Unlit line geometry, used by the normal visualisation pass.
pub struct GpuLines {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl GpuLines {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn upload(device: &wgpu::Device, name: &str, points: &[[f32; 3]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Normal Lines")),
            contents: bytemuck::cast_slice(points),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Some(Self {
            buffer,
            vertex_count: points.len() as u32,
        })
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.buffer.slice(..));
        render_pass.draw(0..self.vertex_count, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::primitives;

    #[test]
    fn test_mesh_without_vertices_is_refused() {
        let empty = Mesh::new("nothing", Vec::new(), Vec::new(), vec![0, 1, 2]);
        let err = empty.validate().unwrap_err();
        assert!(matches!(err, RenderError::EmptyMesh { name } if name == "nothing"));

        let cube = Mesh::new("box", primitives::cube(), Vec::new(), Vec::new());
        assert!(cube.validate().is_ok());
    }

    #[test]
    fn test_diffuse_diffuse_specular_bindings() {
        let bindings = texture_bindings([
            Some(TextureKind::Diffuse),
            Some(TextureKind::Diffuse),
            Some(TextureKind::Specular),
        ]);
        let names: Vec<_> = bindings.iter().map(|b| b.uniform_name.as_deref()).collect();
        assert_eq!(
            names,
            [
                Some("material.texture_diffuse1"),
                Some("material.texture_diffuse2"),
                Some("material.texture_specular1"),
            ]
        );
        let units: Vec<_> = bindings.iter().map(|b| b.unit).collect();
        assert_eq!(units, [0, 1, 2]);
    }

    #[test]
    fn test_ordinals_count_per_kind_in_stored_order() {
        let bindings = texture_bindings([
            Some(TextureKind::Specular),
            Some(TextureKind::Reflect),
            Some(TextureKind::Diffuse),
            Some(TextureKind::Specular),
            Some(TextureKind::Normal),
        ]);
        let ordinals: Vec<_> = bindings.iter().map(|b| b.ordinal).collect();
        assert_eq!(ordinals, [Some(1), Some(1), Some(1), Some(2), Some(1)]);
        assert_eq!(bindings[3].shader_name(), "material_texture_specular2");
    }

    #[test]
    fn test_untagged_texture_binds_by_unit() {
        let bindings = texture_bindings([None, Some(TextureKind::Diffuse)]);
        assert_eq!(bindings[0].uniform_name, None);
        assert_eq!(bindings[0].ordinal, None);
        assert_eq!(bindings[0].shader_name(), "texture_unit0");
        assert_eq!(bindings[1].uniform_name.as_deref(), Some("material.texture_diffuse1"));
        assert_eq!(bindings[1].unit, 1);
    }

    #[test]
    fn test_each_preparation_restarts_at_unit_zero() {
        let first = texture_bindings([Some(TextureKind::Diffuse)]);
        let second = texture_bindings([Some(TextureKind::Diffuse)]);
        assert_eq!(first, second);
        assert_eq!(second[0].unit, 0);
        assert!(texture_bindings(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_normal_lines_pair_per_vertex() {
        let mesh = Mesh::new(
            "probe",
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
            ],
            vec![],
            vec![],
        );
        let lines = mesh.normal_lines(0.5);
        assert_eq!(
            lines,
            vec![[0.0, 0.0, 0.0], [0.0, 0.5, 0.0], [1.0, 0.0, 0.0], [1.5, 0.0, 0.0]]
        );
    }
}
