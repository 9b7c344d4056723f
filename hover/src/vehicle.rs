//! A hover vehicle: springs, locomotion and the sections that drive them.
//!
//! The host calls two entry points at its own cadence:
//! - [`HoverVehicle::advance_state`] once per frame (sections, poses, wheel textures);
//! - [`HoverVehicle::advance_physics`] once per physics step, serialized per vehicle.

use log::debug;

use crate::config::{HoverClass, TuningParameters};
use crate::control::{ControlSection, DriveInput};
use crate::host::{ColliderLayers, RayCaster, VehicleBody};
use crate::locomotion::{LocomotionController, LocomotionState};
use crate::pose::{Poser, apply_poses};
use crate::suspension::{SuspensionSample, SuspensionSystem};
use crate::wheel::{WheelMaterial, WheelScroller};

/// A scrolling wheel and the material it drives, if the renderer supplied one.
pub struct WheelSlot {
    pub scroller: WheelScroller,
    pub material: Option<Box<dyn WheelMaterial>>,
}

pub struct HoverVehicle {
    tuning: TuningParameters,
    suspension: SuspensionSystem,
    locomotion: LocomotionController,
    /// Driver and turret sections, in section order.
    sections: Vec<Box<dyn ControlSection>>,
    /// Index into `sections` of the section whose controller drives.
    driver: Option<usize>,
    poser: Option<Box<dyn Poser>>,
    wheels: Vec<WheelSlot>,
}

impl HoverVehicle {
    pub fn from_class(class: &HoverClass) -> Self {
        Self {
            tuning: class.tuning,
            suspension: SuspensionSystem::new(class.springs.clone(), class.layers),
            locomotion: LocomotionController::new(),
            sections: Vec::new(),
            driver: None,
            poser: None,
            wheels: class
                .wheels
                .iter()
                .map(|&scroller| WheelSlot {
                    scroller,
                    material: None,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn with_driver_section(mut self, section: Box<dyn ControlSection>) -> Self {
        self.set_driver_section(section);
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: Box<dyn ControlSection>) -> Self {
        self.add_section(section);
        self
    }

    #[must_use]
    pub fn with_poser(mut self, poser: Box<dyn Poser>) -> Self {
        self.poser = Some(poser);
        self
    }

    /// Returns `false` if there is no wheel at `index`.
    pub fn attach_wheel_material(&mut self, index: usize, material: Box<dyn WheelMaterial>) -> bool {
        match self.wheels.get_mut(index) {
            Some(slot) => {
                slot.material = Some(material);
                true
            }
            None => false,
        }
    }

    /// Append a non-driving section (a turret). Returns its section index.
    pub fn add_section(&mut self, section: Box<dyn ControlSection>) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    /// Replace the driver section, or add one if there is none yet.
    pub fn set_driver_section(&mut self, section: Box<dyn ControlSection>) {
        match self.driver.and_then(|index| self.sections.get_mut(index)) {
            Some(slot) => *slot = section,
            None => self.driver = Some(self.add_section(section)),
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn suspension(&self) -> &SuspensionSystem {
        &self.suspension
    }

    pub fn samples(&self) -> &[SuspensionSample] {
        self.suspension.samples()
    }

    pub fn locomotion_state(&self) -> &LocomotionState {
        self.locomotion.state()
    }

    pub fn wheels(&self) -> &[WheelSlot] {
        &self.wheels
    }

    /// Current driver input, or `None` when nobody is driving.
    pub fn driver_input(&self) -> Option<DriveInput> {
        self.driver
            .and_then(|index| self.sections.get(index))
            .and_then(|section| section.controller())
            .map(|controller| controller.drive_input().sanitized())
    }

    /// Per-frame presentation update: sections, movement pose and wheel textures.
    pub fn advance_state(&mut self, dt: f32) {
        for section in &mut self.sections {
            section.tick(dt);
        }

        let input = self.driver_input().unwrap_or_default();
        if let Some(poser) = self.poser.as_deref_mut() {
            apply_poses(poser, &input, dt);
        }

        let state = *self.locomotion.state();
        for slot in &mut self.wheels {
            let offset = slot.scroller.update(
                dt,
                state.local_velocity.z,
                state.local_angular_velocity.z,
            );
            if let Some(material) = slot.material.as_deref_mut() {
                material.set_texture_offset(offset);
            }
        }
    }

    /// One physics step: derive local motion, run the springs, then apply driver input.
    ///
    /// Without a driver the springs still run and the vehicle coasts. A non-positive or
    /// non-finite `dt` skips the step.
    pub fn advance_physics<H, B>(&mut self, dt: f32, host: &mut H, body: &mut B)
    where
        H: RayCaster<Identity = B::Identity> + ColliderLayers + ?Sized,
        B: VehicleBody,
    {
        if !dt.is_finite() || dt <= 0.0 {
            debug!("skipping hover physics step with dt = {dt}");
            return;
        }

        self.locomotion.observe(body);
        self.suspension.update(dt, &self.tuning, host, body);

        let Some(input) = self.driver_input() else {
            return;
        };
        self.locomotion.drive(dt, &input, &self.tuning, body);
    }
}
