use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::error::RenderError;
use crate::frame::{DrawItem, FrameTarget, FrameUniforms, Pass, PassState};
use crate::layout::{round_up, FieldValue, StructLayout, UniformBlock};
use crate::lighting::LightSet;
use crate::model::{GpuLines, GpuMesh, Mesh, Texture};
use crate::shader::{
    self, FallbackTextures, ProgramContext, ProgramKind, ShaderProgram, DEPTH_FORMAT, FRAME_GROUP,
    LIGHT_GROUP, MATERIAL_GROUP,
};
use crate::RenderSettings;

/// CPU-side meshes for each pass, handed to the renderer for upload.
#[derive(Default)]
pub struct SceneGeometry {
    meshes: Vec<(Pass, Mesh)>,
    pub environment: Option<Texture>,
}

impl SceneGeometry {
    pub fn add(&mut self, pass: Pass, mesh: Mesh) {
        self.meshes.push((pass, mesh));
    }

    pub fn meshes_for(&self, pass: Pass) -> impl Iterator<Item = &Mesh> + '_ {
        self.meshes
            .iter()
            .filter(move |(p, _)| *p == pass)
            .map(|(_, mesh)| mesh)
    }
}

struct PreparedMesh {
    mesh: GpuMesh,
    material: wgpu::BindGroup,
}

enum PassGeometry {
    Meshes(Vec<PreparedMesh>),
    Lines {
        lines: Vec<GpuLines>,
        material: wgpu::BindGroup,
    },
}

enum Command {
    SetState(PassState),
    Draw { pass: Pass, slot: u32 },
}

struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    clear: wgpu::Color,
    commands: Vec<Command>,
}

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    camera_layout: StructLayout,
    camera_buffer: wgpu::Buffer,
    object_layout: StructLayout,
    object_buffer: wgpu::Buffer,
    object_stride: u64,
    object_capacity: u32,
    object_cursor: u32,
    frame_bind_group: wgpu::BindGroup,
    light_bind_group: wgpu::BindGroup,
    programs: HashMap<ProgramKind, ShaderProgram>,
    geometry: HashMap<Pass, PassGeometry>,
    shininess: f32,
    view_pos: glam::Vec3,
    frame: Option<Frame>,
}

fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}

impl Renderer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
        lights: &LightSet,
        geometry: SceneGeometry,
        draw_count: usize,
        shininess: f32,
        settings: &RenderSettings,
    ) -> Result<Self, RenderError> {
        let depth_view = create_depth_view(&device, &config);

        let light_layout = lights.layout();
        let light_block = light_layout.pack(lights)?;
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: light_block.as_bytes(),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        log::debug!(
            "Light block: {} point, {} spot, {} bytes",
            light_layout.point_count(),
            light_layout.spot_count(),
            light_layout.total_size()
        );

        let camera_layout = shader::camera_layout();
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: camera_layout.size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let object_layout = shader::object_layout();
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let object_stride = round_up(alignment, object_layout.size());
        let object_capacity = draw_count.max(1) as u32;
        let object_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object Buffer"),
            size: object_stride * object_capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_layout = shader::frame_bind_group_layout(&device);
        let light_bind_group_layout = shader::light_bind_group_layout(&device, &light_layout);

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &object_buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(object_layout.size()),
                    }),
                },
            ],
        });
        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light_bind_group"),
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let program_ctx = ProgramContext {
            device: &device,
            frame_layout: &frame_layout,
            light_layout: &light_bind_group_layout,
            color_format: config.format,
            lights: &light_layout,
            shader_dir: settings.shader_dir.as_deref(),
        };
        let mut programs = HashMap::new();
        for kind in ProgramKind::ALL {
            programs.insert(kind, ShaderProgram::load(&program_ctx, kind)?);
        }
        log::info!("Compiled {} shader programs", programs.len());

        let fallbacks = FallbackTextures::new(&device, &queue);
        let environment = geometry.environment.as_ref().unwrap_or(&fallbacks.environment);

        let mut prepared = HashMap::new();
        for pass in Pass::ORDER {
            let Some(program) = programs.get(&ProgramKind::for_pass(pass)) else {
                continue;
            };
            if pass == Pass::NormalDebug {
                if !settings.show_normals {
                    continue;
                }
                let lines = geometry
                    .meshes_for(Pass::Reflective)
                    .filter_map(|mesh| {
                        GpuLines::upload(&device, &mesh.name, &mesh.normal_lines(settings.normal_length))
                    })
                    .collect();
                let material = program.material_bind_group(&device, "normal lines", &[], &[], &fallbacks, environment);
                prepared.insert(pass, PassGeometry::Lines { lines, material });
                continue;
            }

            let mut meshes = Vec::new();
            for mesh in geometry.meshes_for(pass) {
                let material = program.material_bind_group(
                    &device,
                    &mesh.name,
                    &mesh.textures,
                    &mesh.texture_bindings(),
                    &fallbacks,
                    environment,
                );
                meshes.push(PreparedMesh {
                    mesh: mesh.upload(&device)?,
                    material,
                });
            }
            if !meshes.is_empty() {
                log::debug!("{} pass: {} meshes", pass.label(), meshes.len());
                prepared.insert(pass, PassGeometry::Meshes(meshes));
            }
        }

        Ok(Self {
            device,
            queue,
            surface,
            config,
            depth_view,
            camera_layout,
            camera_buffer,
            object_layout,
            object_buffer,
            object_stride,
            object_capacity,
            object_cursor: 0,
            frame_bind_group,
            light_bind_group,
            programs,
            geometry: prepared,
            shininess,
            view_pos: glam::Vec3::ZERO,
            frame: None,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, &self.config);
        }
    }

    /// Reconfigures the surface at its current size, after it was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.resize(self.config.width, self.config.height);
    }

    fn encode_draw(&self, render_pass: &mut wgpu::RenderPass<'_>, pass: Pass, slot: u32, state: PassState) {
        let Some(program) = self.programs.get(&ProgramKind::for_pass(pass)) else {
            return;
        };
        debug_assert_eq!(program.state, state, "{} drawn in the wrong state", pass.label());

        render_pass.set_pipeline(&program.pipeline);
        let offset = (slot as u64 * self.object_stride) as wgpu::DynamicOffset;
        render_pass.set_bind_group(FRAME_GROUP, &self.frame_bind_group, &[offset]);

        match self.geometry.get(&pass) {
            Some(PassGeometry::Meshes(meshes)) => {
                for prepared in meshes {
                    render_pass.set_bind_group(MATERIAL_GROUP, &prepared.material, &[]);
                    prepared.mesh.draw(render_pass);
                }
            }
            Some(PassGeometry::Lines { lines, material }) => {
                render_pass.set_bind_group(MATERIAL_GROUP, material, &[]);
                for line_set in lines {
                    line_set.draw(render_pass);
                }
            }
            None => {}
        }
    }
}

impl FrameTarget for Renderer {
    type Error = wgpu::SurfaceError;

    fn write_view_projection(&mut self, uniforms: &FrameUniforms) {
        let mut block = UniformBlock::zeroed(self.camera_layout.size());
        block.put_struct(
            &self.camera_layout,
            0,
            &[FieldValue::Mat4(uniforms.view), FieldValue::Mat4(uniforms.projection)],
        );
        self.queue.write_buffer(&self.camera_buffer, 0, block.as_bytes());
        self.view_pos = uniforms.view_pos;
    }

    fn begin(&mut self, clear: wgpu::Color) -> Result<(), Self::Error> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.object_cursor = 0;
        self.frame = Some(Frame {
            surface_texture,
            view,
            clear,
            commands: Vec::new(),
        });
        Ok(())
    }

    fn set_state(&mut self, state: PassState) {
        if let Some(frame) = &mut self.frame {
            frame.commands.push(Command::SetState(state));
        }
    }

    fn draw(&mut self, pass: Pass, item: &DrawItem) {
        if self.frame.is_none() || !self.geometry.contains_key(&pass) {
            return;
        }
        if self.object_cursor >= self.object_capacity {
            log::warn!("More draws than object slots ({}), dropping {} draw", self.object_capacity, pass.label());
            return;
        }
        let slot = self.object_cursor;
        self.object_cursor += 1;

        let mut block = UniformBlock::zeroed(self.object_layout.size());
        block.put_struct(
            &self.object_layout,
            0,
            &[
                FieldValue::Mat4(item.model),
                FieldValue::Vec3(self.view_pos),
                FieldValue::F32(self.shininess),
            ],
        );
        self.queue
            .write_buffer(&self.object_buffer, slot as u64 * self.object_stride, block.as_bytes());

        if let Some(frame) = &mut self.frame {
            frame.commands.push(Command::Draw { pass, slot });
        }
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(LIGHT_GROUP, &self.light_bind_group, &[]);

            let mut state = PassState::BASELINE;
            for command in &frame.commands {
                match *command {
                    Command::SetState(next) => state = next,
                    Command::Draw { pass, slot } => self.encode_draw(&mut render_pass, pass, slot, state),
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }
}
