pub mod camera;
pub mod transform;

pub use camera::{Camera, Direction};
pub use transform::Transform;

use glam::{Mat4, Vec3};

use crate::frame::{Pass, SceneDraws};
use crate::lighting::{Attenuation, Cutoff, DirLight, LightSet, PointLight, SpotLight};

pub const BOX_POSITIONS: [Vec3; 2] = [Vec3::new(0.0, 0.52, 2.0), Vec3::new(-2.0, 1.5, -1.5)];

pub const GRASS_POSITIONS: [Vec3; 5] = [
    Vec3::new(-1.5, 0.5, -0.48),
    Vec3::new(1.5, 0.5, 0.51),
    Vec3::new(0.0, 0.5, 0.7),
    Vec3::new(-0.3, 0.5, -2.3),
    Vec3::new(0.5, 0.5, -0.6),
];

pub const POINT_LIGHT_POSITIONS: [Vec3; 4] = [
    Vec3::new(0.2, 0.6, 3.0),
    Vec3::new(0.0, 0.5, 0.5),
    Vec3::new(1.0, 1.0, 3.5),
    Vec3::new(-3.5, 1.5, -1.5),
];

pub const SPOT_LIGHT_POSITIONS: [Vec3; 1] = [Vec3::new(0.0, 4.5, 0.0)];

pub const LAMP_SCALE: f32 = 0.1;
pub const MODEL_SCALE: f32 = 0.2;
pub const PLANE_SCALE: f32 = 2.0;
pub const SHININESS: f32 = 32.0;

/// The fixed set of lights the lab is lit by.
pub fn default_lights() -> LightSet {
    let dir = DirLight {
        direction: Vec3::new(-0.2, -1.0, -0.3),
        ambient: Vec3::splat(0.02),
        diffuse: Vec3::splat(0.3),
        specular: Vec3::splat(0.5),
    };
    let points = POINT_LIGHT_POSITIONS
        .iter()
        .map(|&position| PointLight {
            position,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
            attenuation: Attenuation::RANGE_50,
        })
        .collect();
    let spots = SPOT_LIGHT_POSITIONS
        .iter()
        .map(|&position| SpotLight {
            position,
            direction: Vec3::NEG_Y,
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
            attenuation: Attenuation::RANGE_50,
            cutoff: Cutoff::from_degrees(8.0, 15.0),
        })
        .collect();
    LightSet { dir, points, spots }
}

/// Placement of everything in the lab. Geometry and textures are loaded by
/// the renderer; this only says where things go and how they are lit.
#[derive(Debug, Clone, PartialEq)]
pub struct LabScene {
    pub boxes: Vec<Transform>,
    pub grass: Vec<Transform>,
    pub lights: LightSet,
    pub model: Option<Transform>,
    pub plane: Option<Transform>,
    pub skybox: bool,
    pub shininess: f32,
}

impl Default for LabScene {
    fn default() -> Self {
        Self::lab()
    }
}

impl LabScene {
    pub fn lab() -> Self {
        Self {
            boxes: BOX_POSITIONS.iter().copied().map(Transform::at).collect(),
            grass: GRASS_POSITIONS.iter().copied().map(Transform::at).collect(),
            lights: default_lights(),
            model: Some(Transform::new().scaled(MODEL_SCALE)),
            plane: Some(Transform::new().scaled(PLANE_SCALE)),
            skybox: true,
            shininess: SHININESS,
        }
    }

    /// Nothing to draw and no point or spot lights.
    pub fn empty() -> Self {
        Self {
            boxes: Vec::new(),
            grass: Vec::new(),
            lights: LightSet {
                points: Vec::new(),
                spots: Vec::new(),
                ..default_lights()
            },
            model: None,
            plane: None,
            skybox: false,
            shininess: SHININESS,
        }
    }

    /// One small emissive cube at every point light.
    pub fn lamps(&self) -> impl Iterator<Item = Transform> + '_ {
        self.lights
            .points
            .iter()
            .map(|light| Transform::at(light.position).scaled(LAMP_SCALE))
    }

    pub fn draws(&self) -> SceneDraws {
        let mut draws = SceneDraws::default();
        for transform in &self.boxes {
            draws.push(Pass::Opaque, transform.to_matrix());
        }
        for transform in &self.grass {
            draws.push(Pass::Foliage, transform.to_matrix());
        }
        for transform in self.lamps() {
            draws.push(Pass::LightMarkers, transform.to_matrix());
        }
        if let Some(model) = &self.model {
            draws.push(Pass::Reflective, model.to_matrix());
            draws.push(Pass::NormalDebug, model.to_matrix());
        }
        if self.skybox {
            draws.push(Pass::Skybox, Mat4::IDENTITY);
        }
        if let Some(plane) = &self.plane {
            draws.push(Pass::Transparent, plane.to_matrix());
        }
        draws
    }
}
