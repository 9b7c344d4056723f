//! Raycast spring suspension.
//!
//! Each spring casts a ray from its local position along the body's down axis.
//! A hit within reach compresses the spring; compression drives a roll torque,
//! a pitch torque and a lift force, all in acceleration mode. Contributions of
//! different springs are applied independently and add up: more grounded springs
//! means more correction, there is no averaging.

use log::{debug, trace, warn};

use crate::config::TuningParameters;
use crate::constants::{
    FACTOR_DEAD_ZONE, LIFT_DAMP_GAIN, LIFT_FORCE_SCALE, PITCH_DAMP_GAIN, PITCH_TORQUE_SCALE,
    ROLL_DAMP_GAIN, ROLL_SPRING_GAIN, ROLL_TORQUE_SCALE,
};
use crate::error::ConfigError;
use crate::host::{ColliderLayers, ForceMode, LayerScope, SpringRay, RayCaster, VehicleBody};
use crate::layers::SuspensionLayers;
use crate::types::{Vec3, is_finite, world_up};

/// One spring: where it sits on the vehicle, how far it reaches and which way it stabilizes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SuspensionPoint {
    position: Vec3,
    reach: f32,
    rest_length: f32,
    omega_x_factor: f32,
    omega_z_factor: f32,
}

/// Sign of `v` with a dead-zone of `FACTOR_DEAD_ZONE` around zero.
fn dead_zone_sign(v: f32) -> f32 {
    if v < -FACTOR_DEAD_ZONE {
        -1.0
    } else if v > FACTOR_DEAD_ZONE {
        1.0
    } else {
        0.0
    }
}

fn check_factor(value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidFactor { index: 0, value })
    }
}

impl SuspensionPoint {
    /// Spring at local `position` with the given reach. The rest length starts equal to
    /// the reach and the stabilization factors are derived from the position:
    /// springs right of center lift the right side, springs ahead of center lift the nose.
    pub fn new(position: Vec3, reach: f32) -> Result<Self, ConfigError> {
        if !is_finite(&position) {
            return Err(ConfigError::InvalidPosition { index: 0 });
        }
        if !reach.is_finite() || reach <= 0.0 {
            return Err(ConfigError::InvalidReach {
                index: 0,
                value: reach,
            });
        }

        Ok(Self {
            position,
            reach,
            rest_length: reach,
            omega_x_factor: dead_zone_sign(-position.z),
            omega_z_factor: dead_zone_sign(position.x),
        })
    }

    /// Override the compression reference length.
    ///
    /// `rest_length >= 2 * reach` lets the vehicle sink through thin geometry. It is
    /// accepted as-is and only logged.
    pub fn with_rest_length(mut self, rest_length: f32) -> Result<Self, ConfigError> {
        if !rest_length.is_finite() || rest_length <= 0.0 {
            return Err(ConfigError::InvalidRestLength {
                index: 0,
                value: rest_length,
            });
        }
        self.rest_length = rest_length;
        if self.is_degenerate() {
            warn!(
                "spring at {:?}: rest length {} >= 2 x reach {}, vehicle may fall through thin terrain",
                self.position, self.rest_length, self.reach
            );
        }
        Ok(self)
    }

    pub fn with_omega_x_factor(mut self, factor: f32) -> Result<Self, ConfigError> {
        self.omega_x_factor = check_factor(factor)?;
        Ok(self)
    }

    pub fn with_omega_z_factor(mut self, factor: f32) -> Result<Self, ConfigError> {
        self.omega_z_factor = check_factor(factor)?;
        Ok(self)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn reach(&self) -> f32 {
        self.reach
    }

    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    pub fn omega_x_factor(&self) -> f32 {
        self.omega_x_factor
    }

    pub fn omega_z_factor(&self) -> f32 {
        self.omega_z_factor
    }

    pub fn is_degenerate(&self) -> bool {
        self.rest_length >= 2.0 * self.reach
    }

    /// Normalized compression for a hit `distance` along the ray, in [0, 1].
    #[inline]
    pub fn penetration(&self, distance: f32) -> f32 {
        ((self.reach - distance) / self.rest_length).clamp(0.0, 1.0)
    }

    /// Coefficients for a grounded hit at `distance`.
    ///
    /// - `roll_rate`: body angular velocity projected on its right axis.
    /// - `pitch_rate`: body angular velocity projected on its forward axis.
    /// - `vertical_velocity`: world-space vertical velocity of the body.
    pub fn sample(
        &self,
        distance: f32,
        tuning: &TuningParameters,
        roll_rate: f32,
        pitch_rate: f32,
        vertical_velocity: f32,
    ) -> SuspensionSample {
        let penetration = self.penetration(distance);
        if penetration.is_nan() || penetration <= 0.0 {
            return SuspensionSample::default();
        }

        SuspensionSample {
            penetration,
            roll_torque_coeff: ROLL_SPRING_GAIN * tuning.omega_x_spring * self.omega_x_factor,
            roll_damp_coeff: ROLL_DAMP_GAIN * tuning.omega_x_damp * -roll_rate,
            pitch_torque_coeff: tuning.omega_z_spring * self.omega_z_factor,
            pitch_damp_coeff: PITCH_DAMP_GAIN * tuning.omega_z_damp * -pitch_rate,
            lift_force_coeff: tuning.velocity_spring,
            lift_damp_coeff: LIFT_DAMP_GAIN * tuning.velocity_damp * -vertical_velocity,
        }
    }
}

/// Per-tick output of one spring. All zero while the spring is not grounded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SuspensionSample {
    pub penetration: f32,
    pub roll_torque_coeff: f32,
    pub roll_damp_coeff: f32,
    pub pitch_torque_coeff: f32,
    pub pitch_damp_coeff: f32,
    pub lift_force_coeff: f32,
    pub lift_damp_coeff: f32,
}

impl SuspensionSample {
    pub fn is_grounded(&self) -> bool {
        self.penetration > 0.0
    }

    fn is_finite(&self) -> bool {
        [
            self.penetration,
            self.roll_torque_coeff,
            self.roll_damp_coeff,
            self.pitch_torque_coeff,
            self.pitch_damp_coeff,
            self.lift_force_coeff,
            self.lift_damp_coeff,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Local torque about the right axis for this tick.
    pub fn roll_torque(&self, dt: f32) -> f32 {
        ROLL_TORQUE_SCALE * self.penetration * dt * (self.roll_torque_coeff + self.roll_damp_coeff)
    }

    /// Local torque about the forward axis for this tick.
    pub fn pitch_torque(&self, dt: f32) -> f32 {
        PITCH_TORQUE_SCALE
            * self.penetration
            * dt
            * (self.pitch_torque_coeff + self.pitch_damp_coeff)
    }

    /// World-up lift for this tick.
    pub fn lift_force(&self, dt: f32) -> f32 {
        LIFT_FORCE_SCALE * self.penetration * dt * (self.lift_force_coeff + self.lift_damp_coeff)
    }
}

/// Owns the springs of one vehicle and their samples, index for index.
#[derive(Clone, Debug)]
pub struct SuspensionSystem {
    points: Vec<SuspensionPoint>,
    samples: Vec<SuspensionSample>,
    layers: SuspensionLayers,
}

impl SuspensionSystem {
    pub fn new(points: Vec<SuspensionPoint>, layers: SuspensionLayers) -> Self {
        let samples = vec![SuspensionSample::default(); points.len()];
        Self {
            points,
            samples,
            layers,
        }
    }

    pub fn points(&self) -> &[SuspensionPoint] {
        &self.points
    }

    pub fn samples(&self) -> &[SuspensionSample] {
        &self.samples
    }

    pub fn layers(&self) -> &SuspensionLayers {
        &self.layers
    }

    pub fn grounded_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_grounded()).count()
    }

    /// Run one spring pass: cast every spring and apply its torques and lift to `body`.
    ///
    /// Own colliders are parked on the self-ignore layer for the duration of the pass and
    /// restored before this returns, including when a cast unwinds.
    pub fn update<H, B>(&mut self, dt: f32, tuning: &TuningParameters, host: &mut H, body: &mut B)
    where
        H: RayCaster<Identity = B::Identity> + ColliderLayers + ?Sized,
        B: VehicleBody,
    {
        let scope = LayerScope::enter(host, self.layers.self_ignore);

        let down = -body.up();
        let right = body.right();
        let forward = body.forward();
        let own = body.identity();

        for (index, (point, sample)) in self.points.iter().zip(self.samples.iter_mut()).enumerate()
        {
            let ray = SpringRay {
                origin: body.transform_point(&point.position),
                direction: down,
                max_distance: point.reach,
                layer_mask: self.layers.ground_mask,
                ignore_triggers: true,
            };

            *sample = match scope.cast(&ray) {
                Some(hit) if hit.owner != Some(own) => {
                    let angular = body.angular_velocity();
                    point.sample(
                        hit.distance,
                        tuning,
                        angular.dot(&right),
                        angular.dot(&forward),
                        body.linear_velocity().y,
                    )
                }
                _ => SuspensionSample::default(),
            };

            if !sample.is_finite() {
                debug!("spring {index}: non-finite sample {sample:?}, skipped this tick");
                *sample = SuspensionSample::default();
                continue;
            }
            if !sample.is_grounded() {
                continue;
            }

            trace!("spring {index}: {sample:?}");
            body.apply_relative_torque(Vec3::x() * sample.roll_torque(dt), ForceMode::Acceleration);
            body.apply_relative_torque(Vec3::z() * sample.pitch_torque(dt), ForceMode::Acceleration);
            body.apply_force(world_up() * sample.lift_force(dt), ForceMode::Acceleration);
        }
    }
}
