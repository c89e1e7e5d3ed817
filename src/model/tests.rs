use super::*;
use crate::error::RenderError;
use crate::gpu_test::test_device;
use assert_fs::prelude::*;
use serial_test::serial;
use std::path::Path;

fn write_png(path: impl AsRef<Path>, width: u32, height: u32, texel: [u8; 4]) {
    image::RgbaImage::from_pixel(width, height, image::Rgba(texel))
        .save(path.as_ref())
        .unwrap();
}

#[test_log::test]
#[serial]
fn test_unsupported_format() {
    let Some((device, queue)) = test_device() else { return };
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("test.unsupported");
    file.touch().unwrap();

    let err = Model::load(&device, &queue, file.path()).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<RenderError>(),
        Some(RenderError::UnsupportedFormat(ext)) if ext == "unsupported"
    ));
}

#[test]
#[serial]
fn test_missing_model() {
    let Some((device, queue)) = test_device() else { return };
    let temp = assert_fs::TempDir::new().unwrap();
    let err = Model::load(&device, &queue, temp.path().join("nanosuit.obj")).err().unwrap();
    assert!(matches!(err.downcast_ref::<RenderError>(), Some(RenderError::MissingAsset(_))));
}

#[test_log::test]
#[serial]
fn test_load_obj_with_material() {
    let Some((device, queue)) = test_device() else { return };
    let temp = assert_fs::TempDir::new().unwrap();
    write_png(temp.child("body_dif.png"), 2, 2, [200, 100, 50, 255]);
    write_png(temp.child("body_showroom_spec.png"), 2, 2, [255, 255, 255, 255]);
    temp.child("suit.mtl")
        .write_str(
            "newmtl Body\n\
             map_Ks body_showroom_spec.png\n\
             map_Kd body_dif.png\n",
        )
        .unwrap();
    temp.child("suit.obj")
        .write_str(
            "mtllib suit.mtl\n\
             o Body\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             vn 0 0 1\n\
             usemtl Body\n\
             f 1/1/1 2/2/1 3/3/1 4/4/1\n",
        )
        .unwrap();

    let model = Model::load(&device, &queue, temp.child("suit.obj").path()).unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.bounds_min, [0.0, 0.0, 0.0]);
    assert_eq!(model.bounds_max, [1.0, 1.0, 0.0]);

    let mesh = &model.meshes[0];
    let names: Vec<_> = mesh
        .texture_bindings()
        .iter()
        .map(|b| b.uniform_name.clone())
        .collect();
    assert_eq!(
        names,
        [
            Some("material.texture_diffuse1".to_string()),
            Some("material.texture_specular1".to_string()),
        ]
    );

    let gpu = mesh.upload(&device).unwrap();
    assert!(gpu.is_indexed());
    assert_eq!(gpu.element_count(), 6);
}

#[test]
#[serial]
fn test_cubemap_faces() {
    let Some((device, queue)) = test_device() else { return };
    let temp = assert_fs::TempDir::new().unwrap();
    for face in CUBE_FACES {
        write_png(temp.child(format!("{face}.png")), 4, 4, [0, 0, 64, 255]);
    }
    let cube = Texture::cubemap_from_dir(&device, &queue, temp.path()).unwrap();
    assert_eq!(cube.texture.size().depth_or_array_layers, 6);
    assert_eq!(cube.texture.size().width, 4);

    write_png(temp.child("back.png"), 8, 4, [0, 0, 64, 255]);
    let err = Texture::cubemap_from_dir(&device, &queue, temp.path()).unwrap_err();
    assert!(matches!(err, RenderError::CubemapFace { width: 8, height: 4, .. }));
}

#[test]
#[serial]
fn test_texture_from_path() {
    let Some((device, queue)) = test_device() else { return };
    let temp = assert_fs::TempDir::new().unwrap();
    let file = temp.child("grass.png");
    write_png(&file, 4, 2, [0, 255, 0, 0]);

    let options = TextureOptions::default()
        .set_wrap_s(WrapMode::ClampToEdge)
        .set_wrap_t(WrapMode::ClampToEdge);
    let texture = Texture::from_path(&device, &queue, file.path(), options).unwrap();
    assert_eq!(texture.texture.size().width, 4);
    assert_eq!(texture.texture.size().height, 2);
    assert_eq!(texture.kind, None);
}

#[test]
#[serial]
fn test_mesh_upload() {
    let Some((device, _queue)) = test_device() else { return };
    let cube = Mesh::new("box", primitives::cube(), Vec::new(), Vec::new());
    let gpu = cube.upload(&device).unwrap();
    assert!(!gpu.is_indexed());
    assert_eq!(gpu.element_count(), 36);

    let empty = Mesh::new("nothing", Vec::new(), Vec::new(), Vec::new());
    let err = empty.upload(&device).err().unwrap();
    assert!(matches!(err, RenderError::EmptyMesh { name } if name == "nothing"));

    assert!(GpuLines::upload(&device, "nothing", &[]).is_none());
    let lines = cube.normal_lines(0.5);
    assert!(GpuLines::upload(&device, "box", &lines).is_some());
}
