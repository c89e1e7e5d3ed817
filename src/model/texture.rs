use std::fmt;
use std::path::{Path, PathBuf};

use image::GenericImageView;
use wgpu::util::DeviceExt;

use crate::error::RenderError;

/// Shading role of a texture; decides which material slot it binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Reflect,
    Normal,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Reflect,
        TextureKind::Normal,
    ];

    pub fn uniform_stem(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Reflect => "texture_reflect",
            TextureKind::Normal => "texture_normal",
        }
    }

    /// Neutral texel used when a program expects this kind but the mesh has none.
    pub fn fallback_texel(self) -> [u8; 4] {
        match self {
            TextureKind::Diffuse => [255, 255, 255, 255],
            TextureKind::Specular | TextureKind::Reflect => [0, 0, 0, 255],
            TextureKind::Normal => [127, 127, 255, 255],
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uniform_stem())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
    MirrorRepeat,
}

impl From<WrapMode> for wgpu::AddressMode {
    fn from(mode: WrapMode) -> Self {
        match mode {
            WrapMode::Repeat => wgpu::AddressMode::Repeat,
            WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            WrapMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Sampler setup chosen before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureOptions {
    pub kind: Option<TextureKind>,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

impl TextureOptions {
    pub fn of_kind(kind: TextureKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn set_wrap_s(mut self, mode: WrapMode) -> Self {
        self.wrap_s = mode;
        self
    }

    pub fn set_wrap_t(mut self, mode: WrapMode) -> Self {
        self.wrap_t = mode;
        self
    }
}

pub struct Texture {
    pub label: String,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub kind: Option<TextureKind>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Texture {
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        options: TextureOptions,
    ) -> Result<Self, RenderError> {
        let img = open_image(path)?;
        let label = path.display().to_string();
        Ok(Self::from_image(device, queue, &img, &label, options))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: &str,
        options: TextureOptions,
    ) -> Self {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();
        // normal maps hold vectors, not colours
        let format = if options.kind == Some(TextureKind::Normal) {
            wgpu::TextureFormat::Rgba8Unorm
        } else {
            wgpu::TextureFormat::Rgba8UnormSrgb
        };
        Self::from_rgba(device, queue, &rgba, dimensions, format, label, options)
    }

    /// A 1x1 texture of a single texel.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texel: [u8; 4],
        label: &str,
        options: TextureOptions,
    ) -> Self {
        Self::from_rgba(
            device,
            queue,
            &texel,
            (1, 1),
            wgpu::TextureFormat::Rgba8Unorm,
            label,
            options,
        )
    }

    /// A cube texture with one texel per face, for programs that sample an
    /// environment when the scene has none.
    pub fn solid_cube(device: &wgpu::Device, queue: &wgpu::Queue, texel: [u8; 4], label: &str) -> Self {
        let data: Vec<u8> = texel.repeat(6);
        Self::cube_from_layers(device, queue, &data, 1, wgpu::TextureFormat::Rgba8Unorm, label)
    }

    fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        dimensions: (u32, u32),
        format: wgpu::TextureFormat,
        label: &str,
        options: TextureOptions,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: options.wrap_s.into(),
            address_mode_v: options.wrap_t.into(),
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            label: label.to_string(),
            texture,
            view,
            sampler,
            kind: options.kind,
        }
    }

    /// Loads the six faces `right, left, top, bottom, front, back` (png or jpg)
    /// from `dir` as a cube texture.
    pub fn cubemap_from_dir(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        dir: &Path,
    ) -> Result<Self, RenderError> {
        let mut side = None;
        let mut data = Vec::new();

        for face in CUBE_FACES {
            let path = find_face(dir, face)?;
            let rgba = open_image(&path)?.to_rgba8();
            let (width, height) = rgba.dimensions();
            let expected = *side.get_or_insert(width);
            if width != height || width != expected {
                return Err(RenderError::CubemapFace {
                    path,
                    width,
                    height,
                });
            }
            data.extend_from_slice(rgba.as_raw());
        }

        let side = side.unwrap_or(1);
        let label = dir.display().to_string();
        let cube = Self::cube_from_layers(
            device,
            queue,
            &data,
            side,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            &label,
        );
        log::debug!("Loaded cubemap {} ({}x{} per face)", label, side, side);
        Ok(cube)
    }

    fn cube_from_layers(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        side: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: side,
                    height: side,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("cube view"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("cube sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            label: label.to_string(),
            texture,
            view,
            sampler,
            kind: None,
        }
    }
}

/// +X, -X, +Y, -Y, +Z, -Z
pub const CUBE_FACES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

const FACE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

fn find_face(dir: &Path, face: &str) -> Result<PathBuf, RenderError> {
    FACE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{face}.{ext}")))
        .find(|p| p.is_file())
        .ok_or_else(|| RenderError::MissingAsset(dir.join(format!("{face}.png"))))
}

fn open_image(path: &Path) -> Result<image::DynamicImage, RenderError> {
    if !path.is_file() {
        return Err(RenderError::MissingAsset(path.to_path_buf()));
    }
    image::open(path).map_err(|source| RenderError::Image {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_uniform_stems() {
        let stems: Vec<_> = TextureKind::ALL.iter().map(|k| k.uniform_stem()).collect();
        assert_eq!(
            stems,
            ["texture_diffuse", "texture_specular", "texture_reflect", "texture_normal"]
        );
    }

    #[test]
    fn test_wrap_modes_map_to_address_modes() {
        let options = TextureOptions::default()
            .set_wrap_s(WrapMode::ClampToEdge)
            .set_wrap_t(WrapMode::MirrorRepeat);
        assert_eq!(wgpu::AddressMode::from(options.wrap_s), wgpu::AddressMode::ClampToEdge);
        assert_eq!(wgpu::AddressMode::from(options.wrap_t), wgpu::AddressMode::MirrorRepeat);
        assert_eq!(options.kind, None);
    }

    #[test]
    fn test_missing_face_is_reported() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("right.png").touch().unwrap();
        assert!(find_face(temp.path(), "right").is_ok());
        let err = find_face(temp.path(), "left").unwrap_err();
        assert!(matches!(err, RenderError::MissingAsset(p) if p.ends_with("left.png")));
    }

    #[test]
    fn test_open_image_missing_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = open_image(&temp.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, RenderError::MissingAsset(_)));
    }
}
