//! Shader programs, their pipelines, and the material binding tables.
//!
//! Every program is WGSL with a generated prelude: the `Camera` and `Object`
//! uniforms in group 0 and, for lit programs, the `Lights` block in group 1
//! plus the shared Phong helpers. Material textures live in group 2. Each
//! texture `NAME` at `@binding(2 * unit)` is paired with `NAME_sampler` at the
//! next binding. The table of those slots is read out of the source once at
//! load time, so drawing never looks anything up by string.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use crate::error::RenderError;
use crate::frame::{Pass, PassState};
use crate::layout::{FieldType, StructLayout};
use crate::lighting::LightSetLayout;
use crate::model::{GpuLines, Texture, TextureBinding, TextureKind, TextureOptions, Vertex};

pub const PHONG_WGSL: &str = include_str!("shaders/phong.wgsl");

pub const FRAME_GROUP: u32 = 0;
pub const LIGHT_GROUP: u32 = 1;
pub const MATERIAL_GROUP: u32 = 2;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Lit,
    Foliage,
    Emissive,
    Reflective,
    NormalLines,
    Skybox,
    Transparent,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 7] = [
        ProgramKind::Lit,
        ProgramKind::Foliage,
        ProgramKind::Emissive,
        ProgramKind::Reflective,
        ProgramKind::NormalLines,
        ProgramKind::Skybox,
        ProgramKind::Transparent,
    ];

    pub fn for_pass(pass: Pass) -> Self {
        match pass {
            Pass::Opaque => ProgramKind::Lit,
            Pass::Foliage => ProgramKind::Foliage,
            Pass::LightMarkers => ProgramKind::Emissive,
            Pass::Reflective => ProgramKind::Reflective,
            Pass::NormalDebug => ProgramKind::NormalLines,
            Pass::Skybox => ProgramKind::Skybox,
            Pass::Transparent => ProgramKind::Transparent,
        }
    }

    pub fn pass(self) -> Pass {
        match self {
            ProgramKind::Lit => Pass::Opaque,
            ProgramKind::Foliage => Pass::Foliage,
            ProgramKind::Emissive => Pass::LightMarkers,
            ProgramKind::Reflective => Pass::Reflective,
            ProgramKind::NormalLines => Pass::NormalDebug,
            ProgramKind::Skybox => Pass::Skybox,
            ProgramKind::Transparent => Pass::Transparent,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ProgramKind::Lit => "lit.wgsl",
            ProgramKind::Foliage => "foliage.wgsl",
            ProgramKind::Emissive => "emissive.wgsl",
            ProgramKind::Reflective => "reflective.wgsl",
            ProgramKind::NormalLines => "normal_lines.wgsl",
            ProgramKind::Skybox => "skybox.wgsl",
            ProgramKind::Transparent => "transparent.wgsl",
        }
    }

    pub(crate) fn builtin(self) -> &'static str {
        match self {
            ProgramKind::Lit => include_str!("shaders/lit.wgsl"),
            ProgramKind::Foliage => include_str!("shaders/foliage.wgsl"),
            ProgramKind::Emissive => include_str!("shaders/emissive.wgsl"),
            ProgramKind::Reflective => include_str!("shaders/reflective.wgsl"),
            ProgramKind::NormalLines => include_str!("shaders/normal_lines.wgsl"),
            ProgramKind::Skybox => include_str!("shaders/skybox.wgsl"),
            ProgramKind::Transparent => include_str!("shaders/transparent.wgsl"),
        }
    }

    pub fn is_lit(self) -> bool {
        matches!(
            self,
            ProgramKind::Lit | ProgramKind::Reflective | ProgramKind::Transparent
        )
    }

    pub fn label(self) -> &'static str {
        self.file_name().trim_end_matches(".wgsl")
    }

    fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            ProgramKind::NormalLines => wgpu::PrimitiveTopology::LineList,
            _ => wgpu::PrimitiveTopology::TriangleList,
        }
    }

    fn vertex_layout(self) -> wgpu::VertexBufferLayout<'static> {
        match self {
            ProgramKind::NormalLines => GpuLines::desc(),
            _ => Vertex::desc(),
        }
    }
}

/// View and projection, rewritten once per frame.
pub fn camera_layout() -> StructLayout {
    StructLayout::new(
        "Camera",
        &[("view", FieldType::Mat4), ("projection", FieldType::Mat4)],
    )
}

/// Per-draw values, one dynamic-offset slot per draw.
pub fn object_layout() -> StructLayout {
    StructLayout::new(
        "Object",
        &[
            ("model", FieldType::Mat4),
            ("view_pos", FieldType::Vec3),
            ("shininess", FieldType::F32),
        ],
    )
}

/// Reads a program's WGSL from `shader_dir` when given, otherwise uses the
/// copy compiled into the binary.
pub fn load_source(kind: ProgramKind, shader_dir: Option<&Path>) -> Result<Cow<'static, str>, RenderError> {
    match shader_dir {
        None => Ok(Cow::Borrowed(kind.builtin())),
        Some(dir) => {
            let path = dir.join(kind.file_name());
            std::fs::read_to_string(&path)
                .map(Cow::Owned)
                .map_err(|source| RenderError::ShaderSource { path, source })
        }
    }
}

/// Prepends the generated declarations to a program body.
pub fn compose(kind: ProgramKind, body: &str, lights: &LightSetLayout) -> String {
    let camera = camera_layout();
    let object = object_layout();

    let mut out = String::new();
    out.push_str(&camera.wgsl());
    out.push_str(&object.wgsl());
    let _ = writeln!(out, "@group({FRAME_GROUP}) @binding(0) var<uniform> camera: Camera;");
    let _ = writeln!(out, "@group({FRAME_GROUP}) @binding(1) var<uniform> object: Object;");
    if kind.is_lit() {
        out.push_str(&lights.wgsl());
        let _ = writeln!(out, "@group({LIGHT_GROUP}) @binding(0) var<uniform> lights: Lights;");
        out.push_str(PHONG_WGSL);
    }
    out.push('\n');
    out.push_str(body);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Texture2d,
    Cube,
}

/// One texture/sampler pair a program declares in the material group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialSlot {
    pub name: String,
    pub binding: u32,
    pub sampler_binding: u32,
    pub kind: SlotKind,
}

impl MaterialSlot {
    pub fn unit(&self) -> u32 {
        self.binding / 2
    }

    /// The texture kind a `material_texture_<kind><n>` slot expects.
    pub fn texture_kind(&self) -> Option<TextureKind> {
        TextureKind::ALL
            .into_iter()
            .find(|kind| self.name.contains(kind.uniform_stem()))
    }
}

/// What fills a material slot for one mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    /// Index into the mesh's textures.
    Mesh(usize),
    Environment,
    Fallback(Option<TextureKind>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub sources: Vec<SlotSource>,
    /// Names of mesh textures the program has no slot for.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingTable {
    slots: Vec<MaterialSlot>,
}

fn attribute(line: &str, prefix: &str) -> Option<u32> {
    let start = line.find(prefix)? + prefix.len();
    let rest = &line[start..];
    rest[..rest.find(')')?].trim().parse().ok()
}

/// `NAME: TYPE` from `@group(g) @binding(b) var NAME: TYPE;`
fn declaration(line: &str) -> Option<(&str, &str)> {
    let after_attributes = line[line.rfind(')')? + 1..].trim();
    let decl = after_attributes.strip_prefix("var")?;
    if decl.starts_with('<') {
        // var<uniform> and friends are buffers
        return None;
    }
    let (name, ty) = decl.split_once(':')?;
    Some((name.trim(), ty.trim().trim_end_matches(';').trim()))
}

impl BindingTable {
    pub fn parse(program: &str, source: &str) -> Result<Self, RenderError> {
        let mut textures = Vec::new();
        let mut samplers = HashMap::new();

        for line in source.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if attribute(line, "@group(") != Some(MATERIAL_GROUP) {
                continue;
            }
            let (Some(binding), Some((name, ty))) = (attribute(line, "@binding("), declaration(line)) else {
                continue;
            };
            if ty.starts_with("texture_2d") {
                textures.push((name.to_string(), binding, SlotKind::Texture2d));
            } else if ty.starts_with("texture_cube") {
                textures.push((name.to_string(), binding, SlotKind::Cube));
            } else if ty == "sampler" {
                samplers.insert(name.to_string(), binding);
            }
        }

        let mut slots = Vec::with_capacity(textures.len());
        for (name, binding, kind) in textures {
            let sampler_name = format!("{name}_sampler");
            let sampler_binding = samplers
                .get(&sampler_name)
                .copied()
                .ok_or_else(|| RenderError::MissingBinding {
                    program: program.to_string(),
                    name: sampler_name,
                })?;
            slots.push(MaterialSlot {
                name,
                binding,
                sampler_binding,
                kind,
            });
        }
        slots.sort_by_key(|slot| slot.binding);
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[MaterialSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&MaterialSlot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn layout_entries(&self) -> Vec<wgpu::BindGroupLayoutEntry> {
        self.slots
            .iter()
            .flat_map(|slot| {
                let view_dimension = match slot.kind {
                    SlotKind::Texture2d => wgpu::TextureViewDimension::D2,
                    SlotKind::Cube => wgpu::TextureViewDimension::Cube,
                };
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: slot.binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: slot.sampler_binding,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect()
    }

    /// Matches a mesh's texture bindings against the declared slots by name.
    /// Cube slots always take the environment map.
    pub fn resolve(&self, bindings: &[TextureBinding]) -> Resolution {
        let sources = self
            .slots
            .iter()
            .map(|slot| match slot.kind {
                SlotKind::Cube => SlotSource::Environment,
                SlotKind::Texture2d => bindings
                    .iter()
                    .position(|b| b.shader_name() == slot.name)
                    .map(SlotSource::Mesh)
                    .unwrap_or(SlotSource::Fallback(slot.texture_kind())),
            })
            .collect();
        let skipped = bindings
            .iter()
            .filter(|b| self.slot(&b.shader_name()).is_none())
            .map(|b| b.uniform_name.clone().unwrap_or_else(|| b.shader_name()))
            .collect();
        Resolution { sources, skipped }
    }
}

/// 1x1 stand-ins for slots a mesh doesn't fill.
pub struct FallbackTextures {
    by_kind: HashMap<TextureKind, Texture>,
    plain: Texture,
    pub environment: Texture,
}

impl FallbackTextures {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let by_kind = TextureKind::ALL
            .into_iter()
            .map(|kind| {
                let label = format!("fallback {kind}");
                let texture = Texture::solid(device, queue, kind.fallback_texel(), &label, TextureOptions::of_kind(kind));
                (kind, texture)
            })
            .collect();
        let plain = Texture::solid(device, queue, [255; 4], "fallback", TextureOptions::default());
        let environment = Texture::solid_cube(device, queue, [0, 0, 0, 255], "fallback environment");
        Self {
            by_kind,
            plain,
            environment,
        }
    }

    pub fn get(&self, kind: Option<TextureKind>) -> &Texture {
        kind.and_then(|k| self.by_kind.get(&k)).unwrap_or(&self.plain)
    }
}

/// Shared inputs for building every program.
pub struct ProgramContext<'a> {
    pub device: &'a wgpu::Device,
    pub frame_layout: &'a wgpu::BindGroupLayout,
    pub light_layout: &'a wgpu::BindGroupLayout,
    pub color_format: wgpu::TextureFormat,
    pub lights: &'a LightSetLayout,
    pub shader_dir: Option<&'a Path>,
}

pub struct ShaderProgram {
    pub kind: ProgramKind,
    pub state: PassState,
    pub table: BindingTable,
    pub material_layout: wgpu::BindGroupLayout,
    pub pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    pub fn load(ctx: &ProgramContext<'_>, kind: ProgramKind) -> Result<Self, RenderError> {
        let body = load_source(kind, ctx.shader_dir)?;
        let source = compose(kind, &body, ctx.lights);
        let table = BindingTable::parse(kind.label(), &source)?;
        log::debug!(
            "Program {}: material slots {:?}",
            kind.label(),
            table.slots().iter().map(|s| (&s.name, s.unit())).collect::<Vec<_>>()
        );

        let device = ctx.device;
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} material layout", kind.label())),
            entries: &table.layout_entries(),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", kind.label())),
            bind_group_layouts: &[ctx.frame_layout, ctx.light_layout, &material_layout],
            push_constant_ranges: &[],
        });

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(kind.label()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let state = kind.pass().state();
        let pipeline = mk_render_pipeline(
            device,
            kind.label(),
            &pipeline_layout,
            &module,
            ctx.color_format,
            state,
            kind.topology(),
            &[kind.vertex_layout()],
        );
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                program: kind.label().to_string(),
                message: error.to_string(),
            });
        }

        Ok(Self {
            kind,
            state,
            table,
            material_layout,
            pipeline,
        })
    }

    /// Binds a mesh's textures to this program's slots. Textures the program
    /// doesn't declare are left out with a warning; empty slots get fallbacks.
    pub fn material_bind_group(
        &self,
        device: &wgpu::Device,
        label: &str,
        textures: &[Arc<Texture>],
        bindings: &[TextureBinding],
        fallbacks: &FallbackTextures,
        environment: &Texture,
    ) -> wgpu::BindGroup {
        let resolution = self.table.resolve(bindings);
        for name in &resolution.skipped {
            log::warn!("{}: program {} has no slot for {}, not bound", label, self.kind.label(), name);
        }

        let mut entries = Vec::with_capacity(self.table.slots().len() * 2);
        for (slot, source) in self.table.slots().iter().zip(&resolution.sources) {
            let texture: &Texture = match *source {
                SlotSource::Mesh(index) => textures[index].as_ref(),
                SlotSource::Environment => environment,
                SlotSource::Fallback(kind) => fallbacks.get(kind),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: slot.sampler_binding,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.material_layout,
            entries: &entries,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn mk_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    state: PassState,
    topology: wgpu::PrimitiveTopology,
    vertex_layouts: &[wgpu::VertexBufferLayout],
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: state.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: state.depth_write,
            depth_compare: state.depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// Group 0: the camera block and the per-draw block at a dynamic offset.
pub fn frame_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("frame_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(camera_layout().size()),
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(object_layout().size()),
                },
                count: None,
            },
        ],
    })
}

/// Group 1. The declared size makes pipeline creation fail if a shader's
/// `Lights` block grows past the packed buffer.
pub fn light_bind_group_layout(device: &wgpu::Device, lights: &LightSetLayout) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("light_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(lights.total_size()),
            },
            count: None,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::texture_bindings;

    fn table(kind: ProgramKind) -> BindingTable {
        let source = compose(kind, kind.builtin(), &LightSetLayout::new(4, 1));
        BindingTable::parse(kind.label(), &source).unwrap()
    }

    #[test]
    fn test_reflective_table_puts_environment_at_unit_three() {
        let table = table(ProgramKind::Reflective);
        let names: Vec<_> = table.slots().iter().map(|s| (s.name.as_str(), s.unit())).collect();
        assert_eq!(
            names,
            [
                ("material_texture_diffuse1", 0),
                ("material_texture_specular1", 1),
                ("material_texture_reflect1", 2),
                ("environment", 3),
            ]
        );
        assert_eq!(table.slot("environment").map(|s| s.kind), Some(SlotKind::Cube));
        assert_eq!(table.slot("environment").map(|s| s.sampler_binding), Some(7));
    }

    #[test]
    fn test_box_textures_resolve_by_name() {
        let table = table(ProgramKind::Lit);
        let bindings = texture_bindings([Some(TextureKind::Diffuse), Some(TextureKind::Specular)]);
        let resolution = table.resolve(&bindings);
        assert_eq!(resolution.sources, [SlotSource::Mesh(0), SlotSource::Mesh(1)]);
        assert!(resolution.skipped.is_empty());
    }

    #[test]
    fn test_undeclared_textures_are_skipped_and_gaps_filled() {
        let table = table(ProgramKind::Reflective);
        let bindings = texture_bindings([
            Some(TextureKind::Specular),
            Some(TextureKind::Normal),
            Some(TextureKind::Diffuse),
            Some(TextureKind::Diffuse),
        ]);
        let resolution = table.resolve(&bindings);
        assert_eq!(
            resolution.sources,
            [
                SlotSource::Mesh(2),
                SlotSource::Mesh(0),
                SlotSource::Fallback(Some(TextureKind::Reflect)),
                SlotSource::Environment,
            ]
        );
        assert_eq!(
            resolution.skipped,
            ["material.texture_normal1", "material.texture_diffuse2"]
        );
    }

    #[test]
    fn test_untagged_texture_binds_by_unit() {
        let table = table(ProgramKind::Foliage);
        let resolution = table.resolve(&texture_bindings([None]));
        assert_eq!(resolution.sources, [SlotSource::Mesh(0)]);
        assert_eq!(table.slots()[0].name, "texture_unit0");
    }

    #[test]
    fn test_unlit_programs_have_no_light_block() {
        let lights = LightSetLayout::new(4, 1);
        for kind in ProgramKind::ALL {
            let source = compose(kind, kind.builtin(), &lights);
            assert!(source.contains("var<uniform> camera: Camera;"));
            assert_eq!(source.contains("struct Lights"), kind.is_lit(), "{}", kind.label());
            // uniform buffers are not material slots
            let table = BindingTable::parse(kind.label(), &source).unwrap();
            assert!(table.slot("camera").is_none());
        }
        assert!(table(ProgramKind::Emissive).slots().is_empty());
        assert!(table(ProgramKind::NormalLines).slots().is_empty());
    }

    #[test]
    fn test_texture_without_sampler_is_an_error() {
        let source = "@group(2) @binding(0) var lonely: texture_2d<f32>;\n";
        let err = BindingTable::parse("probe", source).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingBinding { ref name, .. } if name == "lonely_sampler"
        ));
    }

    #[test]
    fn test_object_block_layout() {
        let object = object_layout();
        assert_eq!(object.offset_of("view_pos"), Some(64));
        assert_eq!(object.offset_of("shininess"), Some(76));
        assert_eq!(object.size(), 80);
        assert_eq!(camera_layout().size(), 128);
    }

    #[test]
    fn test_programs_cover_every_pass() {
        for pass in Pass::ORDER {
            assert_eq!(ProgramKind::for_pass(pass).pass(), pass);
        }
    }

    #[test]
    fn test_shader_dir_override() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_source(ProgramKind::Lit, Some(temp.path())).unwrap_err();
        assert!(matches!(err, RenderError::ShaderSource { .. }));

        std::fs::write(temp.path().join("lit.wgsl"), "// custom").unwrap();
        let source = load_source(ProgramKind::Lit, Some(temp.path())).unwrap();
        assert_eq!(source, "// custom");
        assert!(matches!(load_source(ProgramKind::Lit, None).unwrap(), Cow::Borrowed(_)));
    }
}
