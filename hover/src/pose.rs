//! Movement pose selection.
//!
//! Hover vehicles lean into their movement through a nine-pose animation set.
//! Blending is the animator's job; this picks the target pose from driver input.

use crate::control::DriveInput;

/// Below this input magnitude the vehicle idles.
const IDLE_INPUT: f32 = 0.001;
/// Strafe/turn inputs beyond this select the directional pose.
const AXIS_THRESHOLD: f32 = 0.01;
/// Blend speed per second.
const BLEND_RATE: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NinePose {
    Idle,
    Forward,
    ForwardTurnLeft,
    ForwardTurnRight,
    Backwards,
    BackwardsTurnLeft,
    BackwardsTurnRight,
    StrafeLeft,
    StrafeRight,
}

/// Animation sink for movement poses.
pub trait Poser {
    fn set_state(&mut self, pose: NinePose, blend: f32);
}

/// Pose requests for one tick, in the order they should be applied.
///
/// A strafing vehicle first requests the strafe pose and then the drive pose; the
/// animator blends both toward the last target.
pub fn select_poses(input: &DriveInput) -> Vec<NinePose> {
    if input.magnitude() < IDLE_INPUT {
        return vec![NinePose::Idle];
    }

    let mut poses = Vec::with_capacity(2);
    if input.strafe > AXIS_THRESHOLD {
        poses.push(NinePose::StrafeRight);
    }
    if input.strafe < -AXIS_THRESHOLD {
        poses.push(NinePose::StrafeLeft);
    }

    let turn_left = input.yaw > AXIS_THRESHOLD;
    let turn_right = input.yaw < -AXIS_THRESHOLD;
    poses.push(if input.drive < 0.0 {
        if turn_left {
            NinePose::BackwardsTurnLeft
        } else if turn_right {
            NinePose::BackwardsTurnRight
        } else {
            NinePose::Backwards
        }
    } else if turn_left {
        NinePose::ForwardTurnLeft
    } else if turn_right {
        NinePose::ForwardTurnRight
    } else {
        NinePose::Forward
    });
    poses
}

/// Push this tick's poses into `poser`.
pub fn apply_poses(poser: &mut dyn Poser, input: &DriveInput, dt: f32) {
    let blend = BLEND_RATE * dt;
    for pose in select_poses(input) {
        poser.set_state(pose, blend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(NinePose, f32)>);

    impl Poser for Recorder {
        fn set_state(&mut self, pose: NinePose, blend: f32) {
            self.0.push((pose, blend));
        }
    }

    #[test]
    fn neutral_input_idles() {
        assert_eq!(select_poses(&DriveInput::default()), vec![NinePose::Idle]);
    }

    #[test]
    fn reversing_with_turn() {
        let poses = select_poses(&DriveInput::new(0.0, -1.0, 0.5));
        assert_eq!(poses, vec![NinePose::BackwardsTurnLeft]);

        let poses = select_poses(&DriveInput::new(0.0, -1.0, -0.5));
        assert_eq!(poses, vec![NinePose::BackwardsTurnRight]);
    }

    #[test]
    fn strafing_requests_strafe_then_drive_pose() {
        let poses = select_poses(&DriveInput::new(1.0, 0.0, 0.0));
        assert_eq!(poses, vec![NinePose::StrafeRight, NinePose::Forward]);
    }

    #[test]
    fn blend_scales_with_dt() {
        let mut recorder = Recorder::default();
        apply_poses(&mut recorder, &DriveInput::new(0.0, 1.0, 0.0), 0.25);
        assert_eq!(recorder.0, vec![(NinePose::Forward, 0.5)]);
    }
}
