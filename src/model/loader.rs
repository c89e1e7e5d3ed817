use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;

use super::vertex::compute_tangents;
use super::{Mesh, Texture, TextureKind, TextureOptions, Vertex};
use crate::error::RenderError;

/// Floats per vertex in vertex-data text files: position, normal, uv.
const FLOATS_PER_VERTEX: usize = 8;

/// Reads whitespace-separated vertex data, eight floats per vertex.
/// Everything after `#` on a line is ignored.
pub fn load_vertex_data(path: &Path) -> Result<Vec<Vertex>, RenderError> {
    let file = File::open(path).map_err(|_| RenderError::MissingAsset(path.to_path_buf()))?;
    let mut floats = Vec::new();

    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| RenderError::VertexData {
            path: path.to_path_buf(),
            line: number + 1,
            reason: e.to_string(),
        })?;
        let content = line.split('#').next().unwrap_or("");
        for token in content.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
            let value = token.parse::<f32>().map_err(|_| RenderError::VertexData {
                path: path.to_path_buf(),
                line: number + 1,
                reason: format!("`{token}` is not a number"),
            })?;
            floats.push(value);
        }
    }

    if floats.len() % FLOATS_PER_VERTEX != 0 {
        return Err(RenderError::VertexData {
            path: path.to_path_buf(),
            line: 0,
            reason: format!(
                "{} floats is not a multiple of {FLOATS_PER_VERTEX}",
                floats.len()
            ),
        });
    }

    let mut vertices: Vec<Vertex> = floats
        .chunks_exact(FLOATS_PER_VERTEX)
        .map(|f| Vertex::new([f[0], f[1], f[2]], [f[3], f[4], f[5]], [f[6], f[7]]))
        .collect();
    compute_tangents(&mut vertices, &[]);
    Ok(vertices)
}

#[derive(Debug, Default)]
struct ObjGroup {
    material: Option<String>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    lookup: HashMap<(usize, Option<usize>, Option<usize>), u32>,
}

#[derive(Debug, Default)]
struct ObjData {
    positions: Vec<[f32; 3]>,
    tex_coords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    groups: Vec<(String, ObjGroup)>,
    material_libs: Vec<String>,
}

/// OBJ indices are 1-based; negatives count back from the end.
fn resolve_index(token: Option<&str>, len: usize) -> Result<Option<usize>> {
    let Some(token) = token.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let i: i64 = token
        .parse()
        .with_context(|| format!("invalid face index `{token}`"))?;
    let resolved = if i < 0 { len as i64 + i } else { i - 1 };
    if resolved < 0 || resolved as usize >= len {
        anyhow::bail!("face index {i} out of range (have {len})");
    }
    Ok(Some(resolved as usize))
}

impl ObjData {
    fn current_group(&mut self) -> &mut ObjGroup {
        if self.groups.is_empty() {
            self.groups.push(("default".to_string(), ObjGroup::default()));
        }
        let last = self.groups.len() - 1;
        &mut self.groups[last].1
    }

    fn start_group(&mut self, name: &str, material: Option<String>) {
        let reuse = self
            .groups
            .last()
            .is_some_and(|(_, g)| g.vertices.is_empty());
        if reuse {
            if let Some((group_name, group)) = self.groups.last_mut() {
                *group_name = name.to_string();
                group.material = material;
            }
        } else {
            self.groups.push((
                name.to_string(),
                ObjGroup {
                    material,
                    ..Default::default()
                },
            ));
        }
    }

    fn process_face(&mut self, face_tokens: &[&str]) -> Result<()> {
        let mut corners = Vec::with_capacity(face_tokens.len());
        for vertex_str in face_tokens {
            let mut parts = vertex_str.split('/');
            let position = resolve_index(parts.next(), self.positions.len())?
                .ok_or_else(|| anyhow::anyhow!("face vertex without position"))?;
            let tex = resolve_index(parts.next(), self.tex_coords.len())?;
            let normal = resolve_index(parts.next(), self.normals.len())?;
            corners.push((position, tex, normal));
        }

        let (positions, tex_coords, normals) = (&self.positions, &self.tex_coords, &self.normals);
        let mut face_indices = Vec::with_capacity(corners.len());
        let group = {
            if self.groups.is_empty() {
                self.groups.push(("default".to_string(), ObjGroup::default()));
            }
            let last = self.groups.len() - 1;
            &mut self.groups[last].1
        };
        for key in corners {
            let index = match group.lookup.get(&key) {
                Some(&index) => index,
                None => {
                    let (p, t, n) = key;
                    // OBJ puts v = 0 at the bottom of the image
                    let uv = t.map(|t| [tex_coords[t][0], 1.0 - tex_coords[t][1]]).unwrap_or([0.0, 0.0]);
                    let normal = n.map(|n| normals[n]).unwrap_or([0.0, 1.0, 0.0]);
                    let index = group.vertices.len() as u32;
                    group.vertices.push(Vertex::new(positions[p], normal, uv));
                    group.lookup.insert(key, index);
                    index
                }
            };
            face_indices.push(index);
        }

        // fan triangulation, faces are assumed convex
        for i in 1..face_indices.len().saturating_sub(1) {
            group.indices.extend_from_slice(&[face_indices[0], face_indices[i], face_indices[i + 1]]);
        }
        Ok(())
    }
}

/// Texture maps referenced by one `newmtl` entry, in declaration order.
#[derive(Debug, Default, Clone, PartialEq)]
struct MtlMaterial {
    maps: Vec<(TextureKind, String)>,
}

fn mtl_map_kind(keyword: &str) -> Option<TextureKind> {
    match keyword {
        "map_Kd" => Some(TextureKind::Diffuse),
        "map_Ks" => Some(TextureKind::Specular),
        "map_Ka" | "refl" | "map_refl" => Some(TextureKind::Reflect),
        "map_Bump" | "map_bump" | "bump" | "norm" => Some(TextureKind::Normal),
        _ => None,
    }
}

fn parse_mtl(path: &Path) -> Result<HashMap<String, MtlMaterial>> {
    let file = File::open(path).with_context(|| format!("opening material library {}", path.display()))?;
    let mut materials = HashMap::new();
    let mut current: Option<(String, MtlMaterial)> = None;

    for line in BufReader::new(file).lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&keyword) = tokens.first() else {
            continue;
        };
        if keyword == "newmtl" {
            if let Some((name, material)) = current.take() {
                materials.insert(name, material);
            }
            current = Some((tokens[1..].join(" "), MtlMaterial::default()));
        } else if let (Some(kind), Some((_, material))) = (mtl_map_kind(keyword), current.as_mut()) {
            // options like `-bm 1.0` come before the file name
            if let Some(file_name) = tokens.last().filter(|_| tokens.len() > 1) {
                material.maps.push((kind, file_name.to_string()));
            }
        }
    }
    if let Some((name, material)) = current {
        materials.insert(name, material);
    }
    Ok(materials)
}

fn sort_maps(maps: &mut [(TextureKind, String)]) {
    maps.sort_by_key(|(kind, _)| TextureKind::ALL.iter().position(|k| k == kind));
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}

impl Model {
    // Calculate the bounding box for a set of vertices
    fn calculate_bounds<'a>(vertices: impl Iterator<Item = &'a Vertex>) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];

        for vertex in vertices {
            for i in 0..3 {
                min[i] = min[i].min(vertex.position[i]);
                max[i] = max[i].max(vertex.position[i]);
            }
        }

        (min, max)
    }

    fn from_meshes(meshes: Vec<Mesh>) -> Self {
        let (bounds_min, bounds_max) =
            Self::calculate_bounds(meshes.iter().flat_map(|m| m.vertices.iter()));
        Self {
            meshes,
            bounds_min,
            bounds_max,
        }
    }

    pub fn load<P: AsRef<Path>>(device: &wgpu::Device, queue: &wgpu::Queue, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RenderError::MissingAsset(path.to_path_buf()).into());
        }
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .unwrap_or("");

        match extension.to_lowercase().as_str() {
            "glb" | "gltf" => Self::load_gltf(device, queue, path),
            "obj" => Self::load_obj(device, queue, path),
            _ => Err(RenderError::UnsupportedFormat(extension.to_string()).into()),
        }
    }

    fn load_gltf(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self> {
        let (document, buffers, images) = gltf::import(path)?;

        let mut image_cache: HashMap<(usize, TextureKind), Arc<Texture>> = HashMap::new();
        let mut texture_for = |index: usize, kind: TextureKind| -> Option<Arc<Texture>> {
            if let Some(texture) = image_cache.get(&(index, kind)) {
                return Some(texture.clone());
            }
            let data = images.get(index)?;
            let rgba = match data.format {
                gltf::image::Format::R8G8B8A8 => data.pixels.clone(),
                gltf::image::Format::R8G8B8 => data
                    .pixels
                    .chunks_exact(3)
                    .flat_map(|c| [c[0], c[1], c[2], 255])
                    .collect(),
                other => {
                    log::warn!("Skipping glTF image {} with unsupported format {:?}", index, other);
                    return None;
                }
            };
            let img = image::RgbaImage::from_raw(data.width, data.height, rgba)?;
            let texture = Arc::new(Texture::from_image(
                device,
                queue,
                &image::DynamicImage::ImageRgba8(img),
                &format!("{}#image{}", path.display(), index),
                TextureOptions::of_kind(kind),
            ));
            image_cache.insert((index, kind), texture.clone());
            Some(texture)
        };

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

                let positions: Vec<[f32; 3]> = reader
                    .read_positions()
                    .ok_or_else(|| anyhow::anyhow!("No position data"))?
                    .collect();
                let normals: Vec<[f32; 3]> = reader
                    .read_normals()
                    .map(|iter| iter.collect())
                    .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
                let tex_coords: Vec<[f32; 2]> = reader
                    .read_tex_coords(0)
                    .map(|iter| iter.into_f32().collect())
                    .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
                let tangents: Option<Vec<[f32; 4]>> = reader.read_tangents().map(|iter| iter.collect());
                let indices: Vec<u32> = reader
                    .read_indices()
                    .map(|iter| iter.into_u32().collect())
                    .unwrap_or_else(|| (0..positions.len() as u32).collect());

                let mut vertices: Vec<Vertex> = positions
                    .iter()
                    .zip(normals.iter())
                    .zip(tex_coords.iter())
                    .map(|((pos, norm), tex)| Vertex::new(*pos, *norm, *tex))
                    .collect();

                match tangents {
                    Some(tangents) => {
                        for (vertex, t) in vertices.iter_mut().zip(tangents) {
                            let tangent = Vec3::new(t[0], t[1], t[2]);
                            let bitangent = Vec3::from(vertex.normal).cross(tangent) * t[3];
                            vertex.tangent = tangent.to_array();
                            vertex.bitangent = bitangent.to_array();
                        }
                    }
                    None => compute_tangents(&mut vertices, &indices),
                }

                let material = primitive.material();
                let mut textures = Vec::new();
                if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
                    textures.extend(texture_for(info.texture().source().index(), TextureKind::Diffuse));
                }
                if let Some(normal) = material.normal_texture() {
                    textures.extend(texture_for(normal.texture().source().index(), TextureKind::Normal));
                }

                meshes.push(Mesh::new(
                    mesh.name().unwrap_or("gltf mesh"),
                    vertices,
                    textures,
                    indices,
                ));
            }
        }

        if meshes.is_empty() {
            return Err(anyhow::anyhow!("No meshes found in GLTF file"));
        }

        Ok(Self::from_meshes(meshes))
    }

    fn load_obj(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self> {
        let obj_data = parse_obj(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut materials = HashMap::new();
        for lib in &obj_data.material_libs {
            let lib_path = base_dir.join(lib);
            match parse_mtl(&lib_path) {
                Ok(parsed) => materials.extend(parsed),
                Err(e) => log::warn!("{:#}", e),
            }
        }

        let mut cache: HashMap<(PathBuf, TextureKind), Arc<Texture>> = HashMap::new();
        let mut meshes = Vec::new();

        for (name, group) in obj_data.groups {
            if group.indices.is_empty() {
                continue;
            }
            let mut maps = group
                .material
                .as_ref()
                .and_then(|m| materials.get(m))
                .map(|m: &MtlMaterial| m.maps.clone())
                .unwrap_or_default();
            sort_maps(&mut maps);

            let mut textures = Vec::with_capacity(maps.len());
            for (kind, file_name) in maps {
                let texture_path = base_dir.join(file_name.replace('\\', "/"));
                let key = (texture_path.clone(), kind);
                if let Some(texture) = cache.get(&key) {
                    textures.push(texture.clone());
                    continue;
                }
                let texture = Arc::new(
                    Texture::from_path(device, queue, &texture_path, TextureOptions::of_kind(kind))
                        .with_context(|| format!("loading {} for {}", kind, path.display()))?,
                );
                cache.insert(key, texture.clone());
                textures.push(texture);
            }

            let mut vertices = group.vertices;
            compute_tangents(&mut vertices, &group.indices);
            meshes.push(Mesh::new(name, vertices, textures, group.indices));
        }

        if meshes.is_empty() {
            return Err(anyhow::anyhow!("No faces found in OBJ file {}", path.display()));
        }

        log::info!(
            "Loaded {} with {} meshes and {} textures",
            path.display(),
            meshes.len(),
            cache.len()
        );
        Ok(Self::from_meshes(meshes))
    }
}

fn parse_obj(path: &Path) -> Result<ObjData> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut obj_data = ObjData::default();
    let mut group_name = "default".to_string();

    for line in reader.lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        match tokens[0] {
            "v" if tokens.len() >= 4 => {
                let x = tokens[1].parse::<f32>()?;
                let y = tokens[2].parse::<f32>()?;
                let z = tokens[3].parse::<f32>()?;
                obj_data.positions.push([x, y, z]);
            }
            "vt" if tokens.len() >= 3 => {
                let u = tokens[1].parse::<f32>()?;
                let v = tokens[2].parse::<f32>()?;
                obj_data.tex_coords.push([u, v]);
            }
            "vn" if tokens.len() >= 4 => {
                let x = tokens[1].parse::<f32>()?;
                let y = tokens[2].parse::<f32>()?;
                let z = tokens[3].parse::<f32>()?;
                obj_data.normals.push([x, y, z]);
            }
            "f" if tokens.len() >= 4 => {
                obj_data.process_face(&tokens[1..])?;
            }
            "o" | "g" => {
                group_name = tokens[1..].join(" ");
                let material = obj_data.current_group().material.clone();
                obj_data.start_group(&group_name, material);
            }
            "usemtl" if tokens.len() >= 2 => {
                obj_data.start_group(&group_name, Some(tokens[1..].join(" ")));
            }
            "mtllib" if tokens.len() >= 2 => {
                obj_data.material_libs.push(tokens[1..].join(" "));
            }
            _ => {}
        }
    }

    Ok(obj_data)
}
