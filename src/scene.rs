//! The scene context: an ECS world of objects plus scene-wide lighting.
//!
//! Objects are `hecs` entities built from these components:
//!
//! | Component | Purpose |
//! |---|---|
//! | [`Transform`](crate::Transform) | placement in world space |
//! | [`Model`] | CPU geometry and its edit revision |
//! | [`Material`] | colour, shading mode, wireframe and fog flags |
//! | [`Collider`](crate::Collider) | makes the object pickable |
//! | [`Name`] | optional tag used to recognize objects |
//!
//! Entities are compared by identity; a [`Name`] is only needed when an object
//! must be found by tag.

use glam::Vec3;

use crate::color::Color;
use crate::geometry::RawGeometry;

/// Tag attached to an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name(pub String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is(&self, tag: &str) -> bool {
        self.0 == tag
    }
}

/// How a surface responds to scene lights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    /// Ambient plus spot light contribution.
    #[default]
    Lit,
    /// Unlit base colour.
    Flat,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub shading: Shading,
    /// Draw triangle edges instead of filled faces.
    pub wireframe: bool,
    /// Whether scene fog applies.
    pub fog: bool,
}

impl Material {
    pub fn lit(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Lit,
            wireframe: false,
            fog: true,
        }
    }

    pub fn flat(color: Color) -> Self {
        Self {
            shading: Shading::Flat,
            ..Self::lit(color)
        }
    }

    pub fn wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn without_fog(mut self) -> Self {
        self.fog = false;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::lit(Color::WHITE)
    }
}

/// Geometry owned by an entity.
///
/// The revision increases on every mutable access so the renderer knows
/// when to re-upload.
#[derive(Clone, Debug)]
pub struct Model {
    geometry: RawGeometry,
    revision: u64,
}

impl Model {
    pub fn new(geometry: RawGeometry) -> Self {
        Self {
            geometry,
            revision: 0,
        }
    }

    pub fn geometry(&self) -> &RawGeometry {
        &self.geometry
    }

    /// Mutable access to the geometry. Bumps the revision.
    pub fn edit(&mut self) -> &mut RawGeometry {
        self.revision += 1;
        &mut self.geometry
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// A cone light shining from `position` toward `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Color,
    pub intensity: f32,
    /// Half-angle of the cone in radians.
    pub angle: f32,
    /// Fraction of the cone over which light fades out, in `[0, 1]`.
    pub penumbra: f32,
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }

    /// Cosines of the outer and inner cone edges.
    ///
    /// The inner cosine is kept strictly above the outer one so the shader's
    /// smoothstep never divides by zero.
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra)).cos();
        (outer, inner.max(outer + 1e-4))
    }
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 0.0),
            target: Vec3::ZERO,
            color: Color::WHITE,
            intensity: 1.0,
            angle: std::f32::consts::FRAC_PI_3,
            penumbra: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
}

/// Exponential-squared fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub density: f32,
}

impl Fog {
    /// Blend factor toward the fog colour at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        let d = self.density * distance;
        1.0 - (-d * d).exp()
    }
}

/// Everything the frame loop and renderer operate on.
pub struct Scene {
    pub world: hecs::World,
    pub spot_light: SpotLight,
    pub ambient: AmbientLight,
    pub fog: Option<Fog>,
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            world: hecs::World::new(),
            spot_light: SpotLight::default(),
            ambient: AmbientLight {
                color: Color::BLACK,
            },
            fog: None,
            background: Color::BLACK,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// First entity carrying the given tag.
    pub fn find_named(&self, tag: &str) -> Option<hecs::Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, name)| name.is(tag))
            .map(|(entity, _)| entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Transform;

    #[test]
    fn model_edit_bumps_revision() {
        let mut model = Model::new(RawGeometry::cuboid(1.0, 1.0, 1.0));
        assert_eq!(model.revision(), 0);
        model.edit().translate(Vec3::X);
        model.edit();
        assert_eq!(model.revision(), 2);
        assert_eq!(model.geometry().center(), Vec3::X);
    }

    #[test]
    fn cone_inner_edge_stays_inside_outer() {
        let light = SpotLight {
            angle: 0.4,
            penumbra: 0.0,
            ..Default::default()
        };
        let (outer, inner) = light.cone_cosines();
        assert!(inner > outer);

        let soft = SpotLight {
            penumbra: 1.0,
            ..light
        };
        let (outer, inner) = soft.cone_cosines();
        assert!((outer - 0.4f32.cos()).abs() < 1e-6);
        assert!((inner - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fog_is_zero_at_eye() {
        let fog = Fog {
            color: Color::WHITE,
            density: 0.005,
        };
        assert_eq!(fog.factor(0.0), 0.0);
        assert!(fog.factor(100.0) > 0.2 && fog.factor(100.0) < 0.25);
    }

    #[test]
    fn find_named_matches_tag() {
        let mut scene = Scene::new();
        scene.world.spawn((Transform::new(),));
        let tagged = scene.world.spawn((Transform::new(), Name::new("galaxyBox")));
        assert_eq!(scene.find_named("galaxyBox"), Some(tagged));
        assert_eq!(scene.find_named("missing"), None);
    }
}
