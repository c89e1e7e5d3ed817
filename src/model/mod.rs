mod texture;
mod mesh;
mod vertex;
mod loader;
pub mod primitives;

pub use texture::{Texture, TextureKind, TextureOptions, WrapMode, CUBE_FACES};
pub use mesh::{texture_bindings, GpuLines, GpuMesh, Mesh, TextureBinding, MATERIAL_PREFIX};
pub use vertex::{compute_tangents, Vertex};
pub use loader::{load_vertex_data, Model};

#[cfg(all(test, feature = "gpu-tests"))]
mod tests;
