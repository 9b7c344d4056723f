//! Driver input -> vehicle-frame velocity and yaw.
//!
//! Velocity is integrated directly in the vehicle frame rather than through the
//! body's force accumulator, so top speeds can be clamped exactly per axis. The
//! vertical component is never touched here; springs own it.

use crate::config::TuningParameters;
use crate::constants::{DRIVE_FORCE_SCALE, SPIN_SPEED_THRESHOLD, YAW_RATE_SCALE};
use crate::control::DriveInput;
use crate::host::VehicleBody;
use crate::types::{Vec3, yaw_rotation_degrees};

/// Vehicle-frame motion derived from the body each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocomotionState {
    pub local_velocity: Vec3,
    pub local_angular_velocity: Vec3,
}

#[derive(Clone, Debug, Default)]
pub struct LocomotionController {
    state: LocomotionState,
}

/// Turn rate for this tick: spin in place when nearly stopped, turn otherwise.
#[inline]
pub fn rotation_rate(local_velocity: &Vec3, tuning: &TuningParameters) -> f32 {
    if local_velocity.norm() < SPIN_SPEED_THRESHOLD {
        tuning.spin_rate
    } else {
        tuning.turn_rate
    }
}

/// Forward engine force. Pushing back while moving forward (or standing) brakes
/// with `deceleration`; everything else uses `acceleration`.
#[inline]
pub fn forward_force(local_forward_velocity: f32, drive: f32, tuning: &TuningParameters) -> f32 {
    if local_forward_velocity >= 0.0 && drive < 0.0 {
        drive * tuning.deceleration
    } else {
        drive * tuning.acceleration
    }
}

/// Strafe engine force. Strafing left uses `deceleration`, right uses `acceleration`,
/// whatever the current lateral velocity is.
#[inline]
pub fn strafe_force(strafe: f32, tuning: &TuningParameters) -> f32 {
    if strafe < 0.0 {
        strafe * tuning.deceleration
    } else {
        strafe * tuning.acceleration
    }
}

impl LocomotionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    /// Re-derive the vehicle-frame velocities from the body. Runs every tick, driver or not.
    pub fn observe<B: VehicleBody + ?Sized>(&mut self, body: &B) {
        self.state = LocomotionState {
            local_velocity: body.to_local(&body.linear_velocity()),
            local_angular_velocity: body.to_local(&body.angular_velocity()),
        };
    }

    /// Apply one tick of driver input and commit velocity and yaw to the body.
    ///
    /// Expects [`observe`](Self::observe) to have run this tick.
    pub fn drive<B: VehicleBody + ?Sized>(
        &mut self,
        dt: f32,
        input: &DriveInput,
        tuning: &TuningParameters,
        body: &mut B,
    ) {
        let mut velocity = self.state.local_velocity;

        let rot_rate = rotation_rate(&velocity, tuning);
        let yaw = yaw_rotation_degrees(YAW_RATE_SCALE * rot_rate * input.yaw * dt);
        body.set_orientation(body.orientation() * yaw);

        let forward = forward_force(velocity.z, input.drive, tuning);
        let strafe = strafe_force(input.strafe, tuning);

        velocity += Vec3::new(strafe, 0.0, forward) * (DRIVE_FORCE_SCALE * dt / tuning.gravity_scale);

        velocity.x = velocity.x.clamp(-tuning.strafe_speed, tuning.strafe_speed);
        velocity.z = velocity.z.clamp(-tuning.reverse_speed, tuning.forward_speed);

        self.state.local_velocity = velocity;
        body.set_velocity(body.to_world(&velocity));
    }

    pub fn update<B: VehicleBody + ?Sized>(
        &mut self,
        dt: f32,
        input: &DriveInput,
        tuning: &TuningParameters,
        body: &mut B,
    ) {
        self.observe(body);
        self.drive(dt, input, tuning, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{BodyFrame, VehicleBody};
    use crate::test_support::{VEHICLE_ID, moving_body};
    use crate::types::{Pose, Quat};

    fn tuning() -> TuningParameters {
        TuningParameters {
            acceleration: 3.0,
            deceleration: 7.0,
            forward_speed: 10.0,
            reverse_speed: 4.0,
            strafe_speed: 2.0,
            spin_rate: 2.0,
            turn_rate: 1.0,
            gravity_scale: 0.5,
            ..TuningParameters::default()
        }
    }

    /// Local velocity committed by the controller.
    fn committed_local(body: &BodyFrame<u32>) -> Vec3 {
        let world = body.writes().velocity.unwrap();
        body.orientation().inverse_transform_vector(&world)
    }

    #[test]
    fn braking_while_moving_forward_uses_deceleration() {
        let t = tuning();
        assert_eq!(forward_force(5.0, -1.0, &t), -7.0);
        assert_eq!(forward_force(0.0, -1.0, &t), -7.0);
        assert_eq!(forward_force(-5.0, -1.0, &t), -3.0);
        assert_eq!(forward_force(5.0, 1.0, &t), 3.0);
        assert_eq!(forward_force(-5.0, 1.0, &t), 3.0);
    }

    #[test]
    fn strafe_branch_depends_only_on_input_sign() {
        let t = tuning();
        assert_eq!(strafe_force(-1.0, &t), -7.0);
        assert_eq!(strafe_force(1.0, &t), 3.0);
        assert_eq!(strafe_force(0.0, &t), 0.0);
    }

    #[test]
    fn input_is_integrated_in_vehicle_frame() {
        let t = tuning();
        let orientation = yaw_rotation_degrees(90.0);
        let mut body = moving_body(Vec3::zeros(), orientation);
        let mut loco = LocomotionController::new();

        loco.update(0.1, &DriveInput::new(0.0, 1.0, 0.0), &t, &mut body);

        // dz = 2 * dt * accel / gravity_scale
        let local = committed_local(&body);
        assert!((local.z - 1.2).abs() < 1.0e-5);
        assert!(local.x.abs() < 1.0e-5);

        // Forward of a body yawed 90 degrees is world +X.
        let world = body.writes().velocity.unwrap();
        assert!((world.x - 1.2).abs() < 1.0e-5);
    }

    #[test]
    fn speeds_clamp_per_axis() {
        let t = tuning();
        let mut loco = LocomotionController::new();

        let mut body = moving_body(Vec3::new(0.0, 0.0, 9.9), Quat::identity());
        loco.update(1.0, &DriveInput::new(1.0, 1.0, 0.0), &t, &mut body);
        let local = committed_local(&body);
        assert_eq!(local.z, t.forward_speed);
        assert_eq!(local.x, t.strafe_speed);

        let mut body = moving_body(Vec3::new(0.0, 0.0, -3.9), Quat::identity());
        loco.update(1.0, &DriveInput::new(-1.0, -1.0, 0.0), &t, &mut body);
        let local = committed_local(&body);
        assert_eq!(local.z, -t.reverse_speed);
        assert_eq!(local.x, -t.strafe_speed);
    }

    #[test]
    fn vertical_velocity_is_not_clamped() {
        let t = tuning();
        let mut body = moving_body(Vec3::new(0.0, -25.0, 0.0), Quat::identity());
        LocomotionController::new().update(0.02, &DriveInput::default(), &t, &mut body);
        assert!((committed_local(&body).y + 25.0).abs() < 1.0e-5);
    }

    #[test]
    fn zero_input_at_top_speed_holds_speed() {
        let t = tuning();
        let mut loco = LocomotionController::new();
        let mut local = Vec3::new(0.0, 0.0, t.forward_speed);

        for _ in 0..50 {
            let mut body = moving_body(local, Quat::identity());
            loco.update(0.02, &DriveInput::default(), &t, &mut body);
            local = committed_local(&body);
            assert_eq!(local.z, t.forward_speed);
        }
    }

    #[test]
    fn spins_when_stopped_and_turns_when_moving() {
        let t = tuning();
        assert_eq!(rotation_rate(&Vec3::new(0.0, 0.0, 0.05), &t), t.spin_rate);
        assert_eq!(rotation_rate(&Vec3::new(0.0, 0.0, 1.0), &t), t.turn_rate);

        let dt = 0.5;
        let mut body = moving_body(Vec3::zeros(), Quat::identity());
        LocomotionController::new().update(dt, &DriveInput::new(0.0, 0.0, 1.0), &t, &mut body);

        let expected = 16.0 * t.spin_rate * dt;
        let yaw = body.writes().orientation.unwrap();
        assert!((yaw.angle().to_degrees() - expected).abs() < 1.0e-3);
        // Positive yaw turns forward toward +X.
        assert!((yaw * Vec3::z()).x > 0.0);
    }

    #[test]
    fn yaw_composes_with_current_orientation() {
        let t = tuning();
        let start = yaw_rotation_degrees(30.0);
        let mut body = moving_body(Vec3::new(0.0, 0.0, 5.0), start);
        LocomotionController::new().update(1.0, &DriveInput::new(0.0, 0.0, -1.0), &t, &mut body);

        let expected = start * yaw_rotation_degrees(-16.0 * t.turn_rate);
        let got = body.writes().orientation.unwrap();
        assert!(got.angle_to(&expected) < 1.0e-4);
    }

    #[test]
    fn angular_velocity_is_left_alone() {
        let t = tuning();
        let mut body = moving_body(Vec3::new(0.0, 0.0, 2.0), Quat::identity());
        LocomotionController::new().update(0.02, &DriveInput::new(1.0, 1.0, 1.0), &t, &mut body);

        let writes = body.writes();
        assert_eq!(writes.angular_acceleration, Vec3::zeros());
        assert_eq!(writes.torque, Vec3::zeros());
    }

    #[test]
    fn observe_derives_local_angular_velocity() {
        let body = BodyFrame::capture(
            VEHICLE_ID,
            Pose::new(Vec3::zeros(), yaw_rotation_degrees(90.0)),
            Vec3::zeros(),
            Vec3::new(1.0, 0.0, 0.0),
            5.0,
        );
        let mut loco = LocomotionController::new();
        loco.observe(&body);

        // Forward of a body yawed 90 degrees is world +X, so world +X is local +Z.
        let local = loco.state().local_angular_velocity;
        assert!((local - Vec3::new(0.0, 0.0, 1.0)).norm() < 1.0e-5);
    }
}
