//! Scrolling wheel/tread textures driven by vehicle motion.
//!
//! Hover vehicles with visible treads fake wheel motion by scrolling a texture.
//! Material lookup lives in the renderer; this only integrates the UV offset.

use nalgebra::Vector2;

use crate::config::WheelDef;

/// Renderer-side material the offset is pushed into.
pub trait WheelMaterial {
    fn set_texture_offset(&mut self, offset: Vector2<f32>);
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelScroller {
    /// UV units per m/s of local forward velocity.
    pub velocity_factor: Vector2<f32>,
    /// UV units per rad/s of local angular velocity about the forward axis.
    pub turn_factor: Vector2<f32>,
    offset: Vector2<f32>,
}

impl WheelScroller {
    pub fn new(velocity_factor: Vector2<f32>, turn_factor: Vector2<f32>) -> Self {
        Self {
            velocity_factor,
            turn_factor,
            offset: Vector2::zeros(),
        }
    }

    pub fn from_def(def: &WheelDef) -> Self {
        Self::new(
            Vector2::new(def.velocity_to_u, def.velocity_to_v),
            Vector2::new(def.omega_to_u, def.omega_to_v),
        )
    }

    pub fn offset(&self) -> Vector2<f32> {
        self.offset
    }

    /// Advance the offset by `dt` given local forward velocity and angular rate.
    pub fn update(&mut self, dt: f32, velocity: f32, turn: f32) -> Vector2<f32> {
        self.offset += (self.velocity_factor * velocity + self.turn_factor * turn) * dt;
        self.offset
    }
}
