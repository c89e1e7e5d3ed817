#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3,  // position
        1 => Float32x3,  // normal
        2 => Float32x2,  // tex_coords
        3 => Float32x3,  // tangent
        4 => Float32x3,  // bitangent
    ];

    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
            ..Default::default()
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Fills `tangent`/`bitangent` from triangle edges and UV deltas, averaged
/// over every triangle that shares a vertex.
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    use glam::{Vec2, Vec3};

    let mut tangents = vec![Vec3::ZERO; vertices.len()];
    let mut bitangents = vec![Vec3::ZERO; vertices.len()];
    let mut shared = vec![0u32; vertices.len()];

    let sequential: Vec<u32>;
    let indices = if indices.is_empty() {
        sequential = (0..vertices.len() as u32).collect();
        &sequential[..]
    } else {
        indices
    };

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let (v0, v1, v2) = (vertices[a], vertices[b], vertices[c]);

        let delta_pos1 = Vec3::from(v1.position) - Vec3::from(v0.position);
        let delta_pos2 = Vec3::from(v2.position) - Vec3::from(v0.position);
        let delta_uv1 = Vec2::from(v1.tex_coords) - Vec2::from(v0.tex_coords);
        let delta_uv2 = Vec2::from(v2.tex_coords) - Vec2::from(v0.tex_coords);

        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * r;

        for i in [a, b, c] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
            shared[i] += 1;
        }
    }

    for (i, vertex) in vertices.iter_mut().enumerate() {
        if shared[i] == 0 {
            continue;
        }
        vertex.tangent = tangents[i].normalize_or_zero().into();
        vertex.bitangent = bitangents[i].normalize_or_zero().into();
    }
}
