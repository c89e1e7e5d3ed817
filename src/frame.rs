//! Per-frame render order.
//!
//! A frame visits the same passes in the same order every time. Each pass
//! carries the fixed-function state it draws with; a pass that departs from
//! the baseline state restores it once its draws are done, so blending and
//! the relaxed skybox depth test never leak into the next pass.

use glam::{Mat4, Vec3};

use crate::context::RenderContext;

/// Fixed-function state a pass draws with. wgpu bakes this into pipelines,
/// so every program is built against the state of the pass it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassState {
    pub depth_compare: wgpu::CompareFunction,
    pub depth_write: bool,
    pub blend: Option<wgpu::BlendState>,
}

impl PassState {
    /// Depth test with `Less`, depth writes on, no blending.
    pub const BASELINE: PassState = PassState {
        depth_compare: wgpu::CompareFunction::Less,
        depth_write: true,
        blend: None,
    };

    pub fn blending(&self) -> bool {
        self.blend.is_some()
    }
}

impl Default for PassState {
    fn default() -> Self {
        Self::BASELINE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Opaque,
    Foliage,
    LightMarkers,
    Reflective,
    NormalDebug,
    Skybox,
    Transparent,
}

impl Pass {
    pub const ORDER: [Pass; 7] = [
        Pass::Opaque,
        Pass::Foliage,
        Pass::LightMarkers,
        Pass::Reflective,
        Pass::NormalDebug,
        Pass::Skybox,
        Pass::Transparent,
    ];

    pub fn state(self) -> PassState {
        match self {
            // no face culling anywhere, the loaded vertex data has mixed winding
            Pass::Opaque | Pass::Foliage | Pass::LightMarkers | Pass::Reflective | Pass::NormalDebug => {
                PassState::BASELINE
            }
            // the skybox writes depth 1.0, which only passes against a cleared buffer
            Pass::Skybox => PassState {
                depth_compare: wgpu::CompareFunction::LessEqual,
                ..PassState::BASELINE
            },
            Pass::Transparent => PassState {
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                ..PassState::BASELINE
            },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pass::Opaque => "opaque",
            Pass::Foliage => "foliage",
            Pass::LightMarkers => "light markers",
            Pass::Reflective => "reflective",
            Pass::NormalDebug => "normal debug",
            Pass::Skybox => "skybox",
            Pass::Transparent => "transparent",
        }
    }
}

/// One draw of a pass's geometry at a placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub model: Mat4,
}

/// Everything a frame draws, grouped by the pass that draws it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneDraws {
    items: Vec<(Pass, DrawItem)>,
}

impl SceneDraws {
    pub fn push(&mut self, pass: Pass, model: Mat4) {
        self.items.push((pass, DrawItem { model }));
    }

    pub fn for_pass(&self, pass: Pass) -> impl Iterator<Item = &DrawItem> + '_ {
        self.items
            .iter()
            .filter(move |(p, _)| *p == pass)
            .map(|(_, item)| item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Values written to the shared view/projection buffer once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_pos: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    passes: Vec<Pass>,
    pub clear_color: wgpu::Color,
    pub near: f32,
    pub far: f32,
}

impl FramePlan {
    pub fn new(show_normals: bool, clear_color: wgpu::Color, near: f32, far: f32) -> Self {
        let passes = Pass::ORDER
            .into_iter()
            .filter(|&pass| pass != Pass::NormalDebug || show_normals)
            .collect();
        Self {
            passes,
            clear_color,
            near,
            far,
        }
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn uniforms(&self, ctx: &RenderContext) -> FrameUniforms {
        FrameUniforms {
            view: ctx.camera.view_matrix(),
            projection: ctx.camera.projection_matrix(ctx.aspect(), self.near, self.far),
            view_pos: ctx.camera.position,
        }
    }
}

/// Where a frame's commands go. The wgpu renderer draws them; tests record them.
pub trait FrameTarget {
    type Error;

    fn write_view_projection(&mut self, uniforms: &FrameUniforms);
    /// Starts the frame with depth testing on and both buffers cleared.
    fn begin(&mut self, clear: wgpu::Color) -> Result<(), Self::Error>;
    fn set_state(&mut self, state: PassState);
    fn draw(&mut self, pass: Pass, item: &DrawItem);
    fn present(&mut self) -> Result<(), Self::Error>;
}

/// Records one frame into `target`. Timing and camera input are applied by
/// [`RenderContext::begin_frame`] before this runs.
pub fn run_frame<T: FrameTarget>(
    plan: &FramePlan,
    ctx: &RenderContext,
    draws: &SceneDraws,
    target: &mut T,
) -> Result<(), T::Error> {
    target.write_view_projection(&plan.uniforms(ctx));
    target.begin(plan.clear_color)?;

    for &pass in plan.passes() {
        let state = pass.state();
        target.set_state(state);
        for item in draws.for_pass(pass) {
            target.draw(pass, item);
        }
        if state != PassState::BASELINE {
            target.set_state(PassState::BASELINE);
        }
    }

    target.present()
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    WriteViewProjection(FrameUniforms),
    Begin(wgpu::Color),
    SetState(PassState),
    Draw { pass: Pass, state: PassState },
    Present,
}

/// A [`FrameTarget`] that snapshots every state transition and draw.
#[derive(Debug, Default)]
pub struct StateRecorder {
    pub events: Vec<FrameEvent>,
    current: PassState,
}

impl StateRecorder {
    pub fn current(&self) -> PassState {
        self.current
    }

    pub fn draws(&self) -> impl Iterator<Item = (Pass, PassState)> + '_ {
        self.events.iter().filter_map(|e| match e {
            FrameEvent::Draw { pass, state } => Some((*pass, *state)),
            _ => None,
        })
    }
}

impl FrameTarget for StateRecorder {
    type Error = std::convert::Infallible;

    fn write_view_projection(&mut self, uniforms: &FrameUniforms) {
        self.events.push(FrameEvent::WriteViewProjection(*uniforms));
    }

    fn begin(&mut self, clear: wgpu::Color) -> Result<(), Self::Error> {
        self.events.push(FrameEvent::Begin(clear));
        Ok(())
    }

    fn set_state(&mut self, state: PassState) {
        self.current = state;
        self.events.push(FrameEvent::SetState(state));
    }

    fn draw(&mut self, pass: Pass, _item: &DrawItem) {
        self.events.push(FrameEvent::Draw {
            pass,
            state: self.current,
        });
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        self.events.push(FrameEvent::Present);
        Ok(())
    }
}
