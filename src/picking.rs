//! Ray casting against scene objects.
//!
//! A [`Ray`] is built from the camera through a pointer position in normalized
//! device coordinates. [`raycast_all`] tests it against every entity that has
//! a [`Transform`] and a [`Collider`] and returns the hits nearest first.
//!
//! Intersections run in each object's local space, so rotated and
//! non-uniformly scaled objects are handled exactly. Hit distances are always
//! reported in world units along the ray.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;
use crate::geometry::RawGeometry;
use crate::mesh::Transform;
use crate::scene::Model;

/// A ray in 3D space with an origin and a unit direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from the camera position through `ndc` (x right, y up, `[-1, 1]`).
    pub fn from_ndc(ndc: Vec2, camera: &Camera) -> Self {
        let inv_view_proj = camera.view_projection().inverse();
        let on_far_side = inv_view_proj.project_point3(ndc.extend(0.5));
        Self::new(camera.position, on_far_side - camera.position)
    }

    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Same ray expressed in the space mapped to by `matrix`.
    ///
    /// The direction is left unnormalized so ray parameters stay comparable
    /// across spaces.
    fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Slab test against an axis-aligned box.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab
                if origin < min[i] || origin > max[i] {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min[i] - origin) * inv_dir;
                let mut t2 = (max[i] - origin) * inv_dir;

                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                t_min = t_min.max(t1);
                t_max = t_max.min(t2);

                if t_min > t_max {
                    return None;
                }
            }
        }

        nearest_positive(t_min, t_max)
    }

    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        if a <= f32::EPSILON {
            return None;
        }
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);
        nearest_positive(t1, t2)
    }

    /// Möller–Trumbore test, hitting both faces.
    pub fn intersect_triangle(&self, [a, b, c]: [Vec3; 3]) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() < 1e-8 {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > 0.0).then_some(t)
    }

    /// Nearest triangle hit in `geometry`.
    pub fn intersect_geometry(&self, geometry: &RawGeometry) -> Option<f32> {
        geometry
            .triangles()
            .filter_map(|tri| self.intersect_triangle(tri))
            .min_by(f32::total_cmp)
    }
}

fn nearest_positive(t1: f32, t2: f32) -> Option<f32> {
    if t1 > 0.0 {
        Some(t1)
    } else if t2 > 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Pickable shape of an entity, in its local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Test the triangles of the entity's [`Model`].
    Mesh,
}

impl Collider {
    pub fn box_collider(size: Vec3) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Distance along `ray` to this collider placed by `transform`.
    ///
    /// Mesh colliders without a model never hit.
    pub fn intersect(
        &self,
        ray: &Ray,
        transform: &Transform,
        model: Option<&Model>,
    ) -> Option<f32> {
        let to_local = transform.matrix().inverse();
        if !to_local.is_finite() {
            return None;
        }
        let local = ray.transformed(&to_local);

        match self {
            Collider::Box { half_extents } => local.intersect_aabb(-*half_extents, *half_extents),
            Collider::Sphere { radius } => local.intersect_sphere(Vec3::ZERO, *radius),
            Collider::Mesh => model.and_then(|m| local.intersect_geometry(m.geometry())),
        }
    }
}

/// An intersection between a ray and a scene entity.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub entity: hecs::Entity,
    /// Distance from the ray origin in world units.
    pub distance: f32,
    /// World-space hit point.
    pub point: Vec3,
}

/// Cast a ray against all colliders and return every hit, nearest first.
pub fn raycast_all(world: &hecs::World, ray: &Ray) -> Vec<RayHit> {
    let mut hits = Vec::new();

    for (entity, (transform, collider, model)) in world
        .query::<(&Transform, &Collider, Option<&Model>)>()
        .iter()
    {
        if let Some(distance) = collider.intersect(ray, transform, model) {
            hits.push(RayHit {
                entity,
                distance,
                point: ray.point_at(distance),
            });
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn ndc_center_follows_camera_forward() {
        let camera = Camera::new()
            .at(Vec3::new(-10.0, 30.0, 30.0))
            .looking_at(Vec3::ZERO)
            .with_aspect(1.5);
        let ray = Ray::from_ndc(Vec2::ZERO, &camera);
        assert_eq!(ray.origin, camera.position);
        assert!((ray.direction - camera.forward).length() < 1e-4);
    }

    #[test]
    fn ndc_corner_tilts_right_and_up() {
        let camera = Camera::new().at(Vec3::new(0.0, 0.0, 10.0)).looking_at(Vec3::ZERO);
        let ray = Ray::from_ndc(Vec2::new(1.0, 1.0), &camera);
        assert!(ray.direction.x > 0.0);
        assert!(ray.direction.y > 0.0);
        assert!(ray.direction.z < 0.0);
        // Half the vertical fov above the axis.
        let up_angle = ray.direction.y.atan2(-ray.direction.z);
        assert!((up_angle - camera.fov / 2.0).abs() < 1e-2);
    }

    #[test]
    fn sphere_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let t = ray.intersect_sphere(Vec3::ZERO, 4.0).unwrap();
        assert!((t - 6.0).abs() < 1e-5);
        assert!(ray.intersect_sphere(Vec3::new(0.0, 5.0, 0.0), 4.0).is_none());
    }

    #[test]
    fn origin_inside_box_hits_far_side() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let t = ray.intersect_aabb(Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
    }

    #[test]
    fn triangle_hit_from_both_sides() {
        let tri = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let front = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let back = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!((front.intersect_triangle(tri).unwrap() - 5.0).abs() < 1e-5);
        assert!((back.intersect_triangle(tri).unwrap() - 5.0).abs() < 1e-5);

        let miss = Ray::new(Vec3::new(3.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(miss.intersect_triangle(tri).is_none());
    }

    #[test]
    fn rotated_box_uses_local_space() {
        let collider = Collider::box_collider(Vec3::new(4.0, 1.0, 1.0));
        let turned = Transform::new().rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Long axis now runs along Z; a ray down X sees the short side.
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X);
        let t = collider.intersect(&ray, &turned, None).unwrap();
        assert!((t - 4.5).abs() < 1e-4);
    }

    #[test]
    fn scaled_sphere_distance_is_in_world_units() {
        let collider = Collider::sphere(1.0);
        let transform = Transform::from_position(Vec3::new(0.0, 0.0, -10.0)).uniform_scale(2.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let t = collider.intersect(&ray, &transform, None).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
    }

    #[test]
    fn mesh_collider_needs_model() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let model = Model::new(RawGeometry::plane(2.0, 2.0, 1, 1));
        let t = Collider::Mesh
            .intersect(&ray, &Transform::new(), Some(&model))
            .unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!(Collider::Mesh.intersect(&ray, &Transform::new(), None).is_none());
    }

    #[test]
    fn raycast_all_sorts_nearest_first() {
        let mut world = hecs::World::new();
        let far = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -20.0)),
            Collider::sphere(1.0),
        ));
        let near = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
            Collider::box_collider(Vec3::ONE),
        ));
        world.spawn((Transform::from_position(Vec3::new(10.0, 0.0, -5.0)), Collider::sphere(1.0)));
        world.spawn((Transform::new(),));

        let hits = raycast_all(&world, &Ray::new(Vec3::ZERO, Vec3::NEG_Z));
        let order: Vec<_> = hits.iter().map(|h| h.entity).collect();
        assert_eq!(order, vec![near, far]);
        assert!((hits[0].point - Vec3::new(0.0, 0.0, -4.5)).length() < 1e-5);
    }
}
