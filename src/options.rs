use std::ops::RangeInclusive;

use crate::color::Color;

/// Tunable parameters read by the frame loop and edited by the options panel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationOptions {
    pub sphere_x: f32,
    pub sphere_z: f32,
    /// Phase added to the bounce each frame.
    pub sphere_speed: f32,
    pub sphere_color: Color,
    pub sphere_wireframe: bool,
    pub spot_angle: f32,
    pub spot_penumbra: f32,
    pub spot_intensity: f32,
}

impl AnimationOptions {
    pub const SPHERE_POSITION_RANGE: RangeInclusive<f32> = -10.0..=10.0;
    pub const SPHERE_SPEED_RANGE: RangeInclusive<f32> = 0.0..=0.1;
    pub const UNIT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            sphere_x: 0.0,
            sphere_z: 0.0,
            sphere_speed: 0.01,
            sphere_color: Color::hex(0x0000ff),
            sphere_wireframe: false,
            spot_angle: 0.4,
            spot_penumbra: 0.1,
            spot_intensity: 0.7,
        }
    }
}

/// Option edits that must be pushed into the scene when they happen,
/// rather than being read by the frame loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OptionChange {
    SphereColor(Color),
    SphereWireframe(bool),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_their_ranges() {
        let o = AnimationOptions::default();
        assert!(AnimationOptions::SPHERE_POSITION_RANGE.contains(&o.sphere_x));
        assert!(AnimationOptions::SPHERE_POSITION_RANGE.contains(&o.sphere_z));
        assert!(AnimationOptions::SPHERE_SPEED_RANGE.contains(&o.sphere_speed));
        for v in [o.spot_angle, o.spot_penumbra, o.spot_intensity] {
            assert!(AnimationOptions::UNIT_RANGE.contains(&v));
        }
        assert_eq!(o.sphere_color, Color::BLUE);
        assert!(!o.sphere_wireframe);
    }
}
