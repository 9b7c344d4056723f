/*!
Core math aliases and the small geometric helpers shared by the suspension,
locomotion and host modules.

This module intentionally contains no physics. Conventions used everywhere else:
- Vehicle frame: +X right (strafe), +Y up, +Z forward (drive).
- World up is +Y.
- Rotations are unit quaternions; angles handed to nalgebra are radians.
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// World-space up axis.
#[inline]
pub fn world_up() -> Vec3 {
    Vec3::y()
}

/// A rigid pose (translation + rotation) in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// As the nalgebra isometry rapier rigid bodies are posed with.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }

    /// Local point -> world point.
    #[inline]
    pub fn transform_point(&self, local: &Vec3) -> Vec3 {
        self.translation + self.rotation * local
    }
}

/// Yaw-only rotation about world up. `yaw_degrees` follows the vehicle convention:
/// positive turns +Z toward +X.
#[inline]
pub fn yaw_rotation_degrees(yaw_degrees: f32) -> Quat {
    Quat::from_axis_angle(&Vec3::y_axis(), yaw_degrees.to_radians())
}

/// Componentwise finiteness check.
#[inline]
pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
