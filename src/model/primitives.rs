//! Built-in geometry for the lab scene when no vertex-data files are supplied.

use glam::{Vec2, Vec3};

use super::vertex::compute_tangents;
use super::Vertex;

/// One quad as two counter-clockwise triangles seen from `normal`.
/// `right x up` must equal `normal`.
fn quad(center: Vec3, right: Vec3, up: Vec3, normal: Vec3, half: Vec2, uv_scale: f32) -> [Vertex; 6] {
    let corner = |sx: f32, sy: f32, u: f32, v: f32| {
        let p = center + right * half.x * sx + up * half.y * sy;
        Vertex::new(p.to_array(), normal.to_array(), [u * uv_scale, v * uv_scale])
    };
    // image rows start at the top, so v runs downwards
    let p0 = corner(-1.0, -1.0, 0.0, 1.0);
    let p1 = corner(1.0, -1.0, 1.0, 1.0);
    let p2 = corner(1.0, 1.0, 1.0, 0.0);
    let p3 = corner(-1.0, 1.0, 0.0, 0.0);
    [p0, p1, p2, p0, p2, p3]
}

/// Unit cube centred on the origin, 36 unindexed vertices.
pub fn cube() -> Vec<Vertex> {
    let faces = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices: Vec<Vertex> = faces
        .iter()
        .flat_map(|&(normal, right, up)| quad(normal * 0.5, right, up, normal, Vec2::splat(0.5), 1.0))
        .collect();
    compute_tangents(&mut vertices, &[]);
    vertices
}

/// Horizontal quad at y = 0 facing up, `half_extent` to each side.
pub fn ground_plane(half_extent: f32, uv_repeat: f32) -> Vec<Vertex> {
    let mut vertices = quad(
        Vec3::ZERO,
        Vec3::X,
        Vec3::NEG_Z,
        Vec3::Y,
        Vec2::splat(half_extent),
        uv_repeat,
    )
    .to_vec();
    compute_tangents(&mut vertices, &[]);
    vertices
}

/// Upright unit quad in the XY plane for billboards.
pub fn billboard() -> Vec<Vertex> {
    let mut vertices = quad(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, Vec2::splat(0.5), 1.0).to_vec();
    compute_tangents(&mut vertices, &[]);
    vertices
}
