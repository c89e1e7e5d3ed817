use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use winit::window::Window;

pub mod context;
pub mod error;
pub mod frame;
pub mod layout;
pub mod lighting;
pub mod model;
pub mod renderer;
pub mod scene;
pub mod shader;


use context::RenderContext;
use error::RenderError;
use frame::{FramePlan, Pass, SceneDraws};
use model::{primitives, Mesh, Model, Texture, TextureKind, TextureOptions, Vertex, WrapMode};
use renderer::{Renderer, SceneGeometry};
use scene::{Camera, LabScene};

/// Resolved startup options.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub assets: PathBuf,
    /// Directory of WGSL overrides; built-in sources are used when unset.
    pub shader_dir: Option<PathBuf>,
    pub show_normals: bool,
    pub normal_length: f32,
    pub present_mode: wgpu::PresentMode,
    pub clear_color: wgpu::Color,
    pub near: f32,
    pub far: f32,
    pub camera_start: Vec3,
    pub empty_scene: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            assets: PathBuf::from("assets"),
            shader_dir: None,
            show_normals: false,
            normal_length: 0.4,
            present_mode: wgpu::PresentMode::Fifo,
            clear_color: wgpu::Color::BLACK,
            near: 0.1,
            far: 100.0,
            camera_start: Vec3::new(0.0, 1.0, 5.0),
            empty_scene: false,
        }
    }
}

/// Where each asset lives under the assets directory.
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn image(&self, name: &str) -> PathBuf {
        self.root.join("image").join(name)
    }

    pub fn vertices(&self, name: &str) -> PathBuf {
        self.root.join("vertices").join(name)
    }

    pub fn model(&self) -> PathBuf {
        self.root.join("models").join("nanosuit_reflect").join("nanosuit.obj")
    }

    pub fn skybox(&self) -> PathBuf {
        self.image("ame_nebula")
    }
}

/// Reads vertex data from `path` when the file exists, otherwise builds the
/// built-in primitive.
pub fn vertex_data_or(path: &Path, fallback: fn() -> Vec<Vertex>) -> Result<Vec<Vertex>, RenderError> {
    if path.is_file() {
        model::load_vertex_data(path)
    } else {
        log::info!("{} not found, using built-in geometry", path.display());
        Ok(fallback())
    }
}

fn lab_plane() -> Vec<Vertex> {
    primitives::ground_plane(2.5, 2.0)
}

fn load_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: &Path,
    options: TextureOptions,
) -> Result<Arc<Texture>, RenderError> {
    Texture::from_path(device, queue, path, options).map(Arc::new)
}

/// Loads the textures and meshes `scene` needs, grouped by the pass that draws them.
pub fn load_geometry(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    assets: &AssetPaths,
    scene: &LabScene,
) -> Result<SceneGeometry> {
    let mut geometry = SceneGeometry::default();

    let has_lamps = scene.lamps().next().is_some();
    if !scene.boxes.is_empty() || has_lamps {
        let cube = vertex_data_or(&assets.vertices("boxVertexData.txt"), primitives::cube)?;
        if has_lamps {
            geometry.add(Pass::LightMarkers, Mesh::new("lamp", cube.clone(), Vec::new(), Vec::new()));
        }
        if !scene.boxes.is_empty() {
            let diffuse = load_texture(
                device,
                queue,
                &assets.image("container2.png"),
                TextureOptions::of_kind(TextureKind::Diffuse),
            )?;
            let specular = load_texture(
                device,
                queue,
                &assets.image("container2_specular.png"),
                TextureOptions::of_kind(TextureKind::Specular),
            )?;
            geometry.add(Pass::Opaque, Mesh::new("box", cube, vec![diffuse, specular], Vec::new()));
        }
    }

    if !scene.grass.is_empty() {
        let grass = load_texture(
            device,
            queue,
            &assets.image("grass.png"),
            TextureOptions::default()
                .set_wrap_s(WrapMode::ClampToEdge)
                .set_wrap_t(WrapMode::ClampToEdge),
        )?;
        let vertices = vertex_data_or(&assets.vertices("grassVertexData.txt"), primitives::billboard)?;
        geometry.add(Pass::Foliage, Mesh::new("grass", vertices, vec![grass], Vec::new()));
    }

    if scene.model.is_some() {
        let path = assets.model();
        let model = Model::load(device, queue, &path).with_context(|| format!("loading {}", path.display()))?;
        log::info!(
            "Loaded {} meshes from {}, bounds {:?} to {:?}",
            model.meshes.len(),
            path.display(),
            model.bounds_min,
            model.bounds_max
        );
        for mesh in model.meshes {
            geometry.add(Pass::Reflective, mesh);
        }
    }

    if scene.skybox {
        geometry.environment = Some(Texture::cubemap_from_dir(device, queue, &assets.skybox())?);
        geometry.add(Pass::Skybox, Mesh::new("skybox", primitives::cube(), Vec::new(), Vec::new()));
    }

    if scene.plane.is_some() {
        let window = load_texture(
            device,
            queue,
            &assets.image("blending_transparent_window.png"),
            TextureOptions::of_kind(TextureKind::Diffuse),
        )?;
        let vertices = vertex_data_or(&assets.vertices("planeVertexData.txt"), lab_plane)?;
        geometry.add(Pass::Transparent, Mesh::new("plane", vertices, vec![window], Vec::new()));
    }

    Ok(geometry)
}

pub struct State {
    window: Arc<Window>,
    renderer: Renderer,
    ctx: RenderContext,
    plan: FramePlan,
    draws: SceneDraws,
}

impl State {
    pub fn new(window: Window, settings: &RenderSettings) -> Result<Self> {
        let window = Arc::new(window);
        let size = window.inner_size();
        let (width, height) = if size.width > 0 && size.height > 0 {
            (size.width, size.height)
        } else {
            (settings.width, settings.height)
        };

        log::info!("Creating WGPU instance...");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("Using adapter: {} ({:?})", info.name, info.backend);
        log::debug!("Adapter driver: {} {}", info.driver, info.driver_info);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no texture formats"))?;
        log::info!("Selected surface format: {:?}", surface_format);

        let present_mode = if surface_caps.present_modes.contains(&settings.present_mode) {
            settings.present_mode
        } else {
            log::warn!("Present mode {:?} unsupported, using Fifo", settings.present_mode);
            wgpu::PresentMode::Fifo
        };

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene = if settings.empty_scene {
            LabScene::empty()
        } else {
            LabScene::lab()
        };
        let assets = AssetPaths::new(&settings.assets);
        let geometry = load_geometry(&device, &queue, &assets, &scene)?;
        log::info!("Assets loaded from {}", settings.assets.display());

        let draws = scene.draws();
        let renderer = Renderer::new(
            device,
            queue,
            surface,
            config,
            &scene.lights,
            geometry,
            draws.len(),
            scene.shininess,
            settings,
        )?;

        let plan = FramePlan::new(settings.show_normals, settings.clear_color, settings.near, settings.far);
        let ctx = RenderContext::new(width, height, Camera::new(settings.camera_start));

        Ok(Self {
            window,
            renderer,
            ctx,
            plan,
            draws,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.ctx
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if self.ctx.on_resize(width, height) {
            self.renderer.resize(width, height);
        }
    }

    /// Advances timing and camera movement to `now` (seconds), then draws a frame.
    pub fn render(&mut self, now: f64) -> Result<()> {
        self.ctx.begin_frame(now);
        match frame::run_frame(&self.plan, &self.ctx, &self.draws, &mut self.renderer) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.renderer.reconfigure();
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("out of GPU memory")),
            Err(e) => {
                log::warn!("Skipping frame: {}", e);
                Ok(())
            }
        }
    }
}
