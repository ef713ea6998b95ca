use glam::Vec3;
use winit::event::MouseButton;

use crate::camera::Camera;
use crate::input::Input;

const ELEVATION_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// A camera controller that orbits around a target point.
///
/// Left drag rotates, the scroll wheel zooms.
///
/// ```
/// use glam::Vec3;
/// use sceneplay::OrbitCamera;
///
/// let orbit = OrbitCamera::from_position(Vec3::new(-10.0, 30.0, 30.0), Vec3::ZERO);
/// let camera = orbit.camera(16.0 / 9.0);
/// assert!((camera.position - Vec3::new(-10.0, 30.0, 30.0)).length() < 1e-3);
/// ```
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Distance from target.
    pub distance: f32,
    /// Horizontal angle in radians (yaw).
    pub azimuth: f32,
    /// Vertical angle in radians (pitch), clamped short of the poles.
    pub elevation: f32,
    /// Field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Mouse drag sensitivity.
    pub sensitivity: f32,
    /// Scroll zoom sensitivity.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 5.0,
            azimuth: 0.0,
            elevation: 0.3,
            fov: 45f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            sensitivity: 0.005,
            zoom_sensitivity: 2.0,
            min_distance: 0.5,
            max_distance: 1000.0,
        }
    }
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an orbit whose camera sits at `position` looking at `target`.
    pub fn from_position(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let mut orbit = Self::new().target(target);
        orbit.distance = distance.clamp(orbit.min_distance, orbit.max_distance);
        if distance > 0.0 {
            orbit.azimuth = offset.x.atan2(offset.z);
            orbit.elevation = (offset.y / distance)
                .clamp(-1.0, 1.0)
                .asin()
                .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }
        orbit
    }

    /// Set the target point to orbit around.
    pub fn target(mut self, target: impl Into<Vec3>) -> Self {
        self.target = target.into();
        self
    }

    /// Set the distance from target.
    pub fn distance(mut self, distance: f32) -> Self {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
        self
    }

    /// Set the field of view in degrees.
    pub fn fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    /// Set the near and far clip planes.
    pub fn clip(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Update the orbit from this frame's mouse input.
    pub fn update(&mut self, input: &Input) {
        if input.mouse_down(MouseButton::Left) {
            let delta = input.mouse_delta();
            self.azimuth -= delta.x * self.sensitivity;
            self.elevation += delta.y * self.sensitivity;
            self.elevation = self.elevation.clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
        }

        let scroll = input.scroll_delta();
        if scroll.y.abs() > 0.0 {
            self.distance -= scroll.y * self.zoom_sensitivity;
            self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        }
    }

    /// Get the current camera state.
    pub fn camera(&self, aspect: f32) -> Camera {
        // Spherical to Cartesian conversion
        let offset = Vec3::new(
            self.distance * self.elevation.cos() * self.azimuth.sin(),
            self.distance * self.elevation.sin(),
            self.distance * self.elevation.cos() * self.azimuth.cos(),
        );

        let position = self.target + offset;

        Camera {
            position,
            forward: (self.target - position).normalize_or(Vec3::NEG_Z),
            up: Vec3::Y,
            fov: self.fov,
            aspect: 1.0,
            near: self.near,
            far: self.far,
        }
        .with_aspect(aspect)
    }
}
