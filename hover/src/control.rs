//! Driver input and the capability lookup used to find whoever is driving.
//!
//! A hover vehicle never knows what kind of section it has. It asks its control
//! section for a controller; no controller means nobody is driving this tick.

use serde::Deserialize;

/// Per-tick driver input. Every axis is in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub struct DriveInput {
    /// Right positive.
    #[serde(default)]
    pub strafe: f32,
    /// Forward positive.
    #[serde(default)]
    pub drive: f32,
    /// Fraction of the turn rate; positive turns toward +X.
    #[serde(default)]
    pub yaw: f32,
}

impl DriveInput {
    pub fn new(strafe: f32, drive: f32, yaw: f32) -> Self {
        Self {
            strafe: strafe.clamp(-1.0, 1.0),
            drive: drive.clamp(-1.0, 1.0),
            yaw: yaw.clamp(-1.0, 1.0),
        }
    }

    /// Same input with every axis clamped to [-1, 1]; NaN axes become 0.
    pub fn sanitized(self) -> Self {
        let axis = |v: f32| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            strafe: axis(self.strafe),
            drive: axis(self.drive),
            yaw: axis(self.yaw),
        }
    }

    pub fn magnitude(&self) -> f32 {
        (self.strafe * self.strafe + self.drive * self.drive + self.yaw * self.yaw).sqrt()
    }
}

/// Source of driver input (a player, an AI pilot, a replay).
pub trait DriveController {
    fn drive_input(&self) -> DriveInput;

    fn tick(&mut self, _dt: f32) {}
}

/// A vehicle section that may host a controller.
pub trait ControlSection {
    fn controller(&self) -> Option<&dyn DriveController>;

    fn tick(&mut self, _dt: f32) {}
}

/// The main/driver section of a hover vehicle.
#[derive(Default)]
pub struct PilotSeat {
    occupant: Option<Box<dyn DriveController>>,
}

impl PilotSeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupied(controller: Box<dyn DriveController>) -> Self {
        Self {
            occupant: Some(controller),
        }
    }

    /// Seat a controller, returning whoever was there before.
    pub fn board(
        &mut self,
        controller: Box<dyn DriveController>,
    ) -> Option<Box<dyn DriveController>> {
        self.occupant.replace(controller)
    }

    pub fn disembark(&mut self) -> Option<Box<dyn DriveController>> {
        self.occupant.take()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

impl ControlSection for PilotSeat {
    fn controller(&self) -> Option<&dyn DriveController> {
        self.occupant.as_deref()
    }

    fn tick(&mut self, dt: f32) {
        if let Some(occupant) = self.occupant.as_mut() {
            occupant.tick(dt);
        }
    }
}

/// A gunner position. Its controller aims the turret and never drives the vehicle.
pub struct TurretSeat {
    index: usize,
    seat: PilotSeat,
}

impl TurretSeat {
    /// Turrets are numbered from 1 in section order.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            seat: PilotSeat::new(),
        }
    }

    pub fn occupied(index: usize, controller: Box<dyn DriveController>) -> Self {
        Self {
            index,
            seat: PilotSeat::occupied(controller),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn board(
        &mut self,
        controller: Box<dyn DriveController>,
    ) -> Option<Box<dyn DriveController>> {
        self.seat.board(controller)
    }

    pub fn disembark(&mut self) -> Option<Box<dyn DriveController>> {
        self.seat.disembark()
    }
}

impl ControlSection for TurretSeat {
    fn controller(&self) -> Option<&dyn DriveController> {
        self.seat.controller()
    }

    fn tick(&mut self, dt: f32) {
        self.seat.tick(dt);
    }
}

/// Fixed input for a fixed amount of time.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct InputPhase {
    /// Seconds this phase lasts.
    pub duration: f32,
    #[serde(flatten)]
    pub input: DriveInput,
}

/// Replays a list of input phases, then holds neutral input.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDriver {
    phases: Vec<InputPhase>,
    elapsed: f32,
}

impl ScriptedDriver {
    pub fn new(phases: Vec<InputPhase>) -> Self {
        Self {
            phases,
            elapsed: 0.0,
        }
    }

    pub fn constant(input: DriveInput) -> Self {
        Self::new(vec![InputPhase {
            duration: f32::INFINITY,
            input,
        }])
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn current(&self) -> Option<&InputPhase> {
        let mut start = 0.0;
        for phase in &self.phases {
            let end = start + phase.duration.max(0.0);
            if self.elapsed < end {
                return Some(phase);
            }
            start = end;
        }
        None
    }
}

impl DriveController for ScriptedDriver {
    fn drive_input(&self) -> DriveInput {
        self.current()
            .map(|phase| phase.input.sanitized())
            .unwrap_or_default()
    }

    fn tick(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_axes() {
        let input = DriveInput::new(2.0, -3.0, 0.5);
        assert_eq!(input, DriveInput::new(1.0, -1.0, 0.5));
    }

    #[test]
    fn sanitized_zeroes_nan() {
        let input = DriveInput {
            strafe: f32::NAN,
            drive: 4.0,
            yaw: -0.25,
        }
        .sanitized();
        assert_eq!(input.strafe, 0.0);
        assert_eq!(input.drive, 1.0);
        assert_eq!(input.yaw, -0.25);
    }

    #[test]
    fn empty_seat_has_no_controller() {
        let mut seat = PilotSeat::new();
        assert!(seat.controller().is_none());

        seat.board(Box::new(ScriptedDriver::constant(DriveInput::new(0.0, 1.0, 0.0))));
        assert!(seat.is_occupied());
        assert_eq!(seat.controller().map(|c| c.drive_input().drive), Some(1.0));

        assert!(seat.disembark().is_some());
        assert!(seat.controller().is_none());
    }

    #[test]
    fn scripted_driver_walks_phases_then_goes_neutral() {
        let mut driver = ScriptedDriver::new(vec![
            InputPhase {
                duration: 1.0,
                input: DriveInput::new(0.0, 1.0, 0.0),
            },
            InputPhase {
                duration: 0.5,
                input: DriveInput::new(0.0, 0.0, -1.0),
            },
        ]);

        assert_eq!(driver.drive_input().drive, 1.0);
        driver.tick(1.2);
        assert_eq!(driver.elapsed(), 1.2);
        assert_eq!(driver.drive_input().yaw, -1.0);
        driver.tick(0.5);
        assert_eq!(driver.drive_input(), DriveInput::default());
    }

    #[test]
    fn turret_seat_hosts_a_gunner() {
        let mut turret = TurretSeat::new(1);
        assert_eq!(turret.index(), 1);
        assert!(turret.controller().is_none());

        turret.board(Box::new(ScriptedDriver::constant(DriveInput::new(0.0, 0.0, 1.0))));
        assert_eq!(turret.controller().map(|c| c.drive_input().yaw), Some(1.0));
        assert!(turret.disembark().is_some());
        assert!(turret.controller().is_none());
    }

    #[test]
    fn seat_ticks_its_occupant() {
        let mut seat = PilotSeat::occupied(Box::new(ScriptedDriver::new(vec![InputPhase {
            duration: 0.1,
            input: DriveInput::new(1.0, 0.0, 0.0),
        }])));
        assert_eq!(seat.controller().map(|c| c.drive_input().strafe), Some(1.0));
        seat.tick(0.2);
        assert_eq!(seat.controller().map(|c| c.drive_input().strafe), Some(0.0));
    }
}
