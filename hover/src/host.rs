//! Collaborator contracts between the hover core and whatever physics host runs it.
//!
//! The core never talks to an engine directly. It reads and writes a [`VehicleBody`],
//! casts rays through a [`RayCaster`], and parks its own colliders through
//! [`ColliderLayers`] while it does so.

use std::ops::{Deref, DerefMut};

use crate::layers::{Layer, LayerMask};
use crate::types::{Pose, Quat, Vec3};

/// How an applied force or torque is integrated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForceMode {
    /// Regular force/torque, divided by mass/inertia by the integrator.
    Force,
    /// Already mass-normalized: integrated as `Δv = a * dt` regardless of mass or inertia.
    Acceleration,
}

/// The rigid body a hover vehicle reads from and writes to.
pub trait VehicleBody {
    /// Identity compared against ray hits to reject self-hits.
    type Identity: Copy + PartialEq;

    fn identity(&self) -> Self::Identity;
    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn linear_velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;
    fn mass(&self) -> f32;

    /// Torque expressed in the body's local frame.
    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode);
    /// Force expressed in world space, applied at the center of mass.
    fn apply_force(&mut self, force: Vec3, mode: ForceMode);
    fn set_velocity(&mut self, velocity: Vec3);
    fn set_orientation(&mut self, orientation: Quat);

    fn right(&self) -> Vec3 {
        self.orientation() * Vec3::x()
    }

    fn up(&self) -> Vec3 {
        self.orientation() * Vec3::y()
    }

    fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::z()
    }

    /// Local point -> world point.
    fn transform_point(&self, local: &Vec3) -> Vec3 {
        Pose::new(self.position(), self.orientation()).transform_point(local)
    }

    /// World direction -> local direction.
    fn to_local(&self, world: &Vec3) -> Vec3 {
        self.orientation().inverse_transform_vector(world)
    }

    /// Local direction -> world direction.
    fn to_world(&self, local: &Vec3) -> Vec3 {
        self.orientation() * local
    }
}

/// A single ray query.
#[derive(Clone, Copy, Debug)]
pub struct SpringRay {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    pub max_distance: f32,
    pub layer_mask: LayerMask,
    /// Skip sensor/trigger volumes.
    pub ignore_triggers: bool,
}

/// Closest hit reported by a [`RayCaster`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit<Id> {
    /// Distance from the ray origin (meters).
    pub distance: f32,
    /// Owner of the collider that was hit, if it has one.
    pub owner: Option<Id>,
}

pub trait RayCaster {
    type Identity: Copy + PartialEq;

    fn cast(&self, ray: &SpringRay) -> Option<RayHit<Self::Identity>>;
}

/// Layer control over the colliders owned by one vehicle.
pub trait ColliderLayers {
    /// Move every own collider to `layer`, remembering where each one was.
    fn set_own_colliders_to_layer(&mut self, layer: Layer);
    /// Put every own collider back on the layer it had before the last
    /// [`set_own_colliders_to_layer`](Self::set_own_colliders_to_layer).
    fn restore_own_collider_layers(&mut self);
    /// Current layer of every own collider, in a stable order.
    fn own_collider_layers(&self) -> Vec<Layer>;
}

/// Scoped self-ignore: own colliders sit on `layer` for as long as the scope lives.
///
/// Restoration happens in `Drop`, so it runs on early return and on unwinding.
pub struct LayerScope<'a, H: ColliderLayers + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: ColliderLayers + ?Sized> LayerScope<'a, H> {
    pub fn enter(host: &'a mut H, layer: Layer) -> Self {
        host.set_own_colliders_to_layer(layer);
        Self { host }
    }
}

impl<H: ColliderLayers + ?Sized> Deref for LayerScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: ColliderLayers + ?Sized> DerefMut for LayerScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: ColliderLayers + ?Sized> Drop for LayerScope<'_, H> {
    fn drop(&mut self) {
        self.host.restore_own_collider_layers();
    }
}

/// Writes accumulated against a [`BodyFrame`] during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyWrites {
    /// World-space linear acceleration (acceleration mode).
    pub linear_acceleration: Vec3,
    /// World-space angular acceleration (acceleration mode).
    pub angular_acceleration: Vec3,
    /// World-space force for the host's force accumulator.
    pub force: Vec3,
    /// World-space torque for the host's force accumulator.
    pub torque: Vec3,
    pub velocity: Option<Vec3>,
    pub orientation: Option<Quat>,
}

/// Capture/commit view of a host rigid body.
///
/// The host captures one frame per vehicle before the tick, lets the suspension and
/// locomotion passes read and write it, then commits [`BodyWrites`] before its
/// integrator advances. Reads see the state at capture time, except that a velocity
/// written earlier in the tick is visible to later reads.
#[derive(Clone, Debug)]
pub struct BodyFrame<Id> {
    identity: Id,
    pose: Pose,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    mass: f32,
    writes: BodyWrites,
}

impl<Id: Copy + PartialEq> BodyFrame<Id> {
    pub fn capture(
        identity: Id,
        pose: Pose,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
        mass: f32,
    ) -> Self {
        Self {
            identity,
            pose,
            linear_velocity,
            angular_velocity,
            mass,
            writes: BodyWrites::default(),
        }
    }

    pub fn writes(&self) -> &BodyWrites {
        &self.writes
    }

    /// Velocities after integrating the acceleration-mode writes over `dt`.
    ///
    /// Force-mode writes are not included; the host integrates those itself.
    pub fn integrated_velocities(&self, dt: f32) -> (Vec3, Vec3) {
        let linear = self.linear_velocity() + self.writes.linear_acceleration * dt;
        let angular = self.angular_velocity + self.writes.angular_acceleration * dt;
        (linear, angular)
    }
}

impl<Id: Copy + PartialEq> VehicleBody for BodyFrame<Id> {
    type Identity = Id;

    fn identity(&self) -> Id {
        self.identity
    }

    fn position(&self) -> Vec3 {
        self.pose.translation
    }

    fn orientation(&self) -> Quat {
        self.pose.rotation
    }

    fn linear_velocity(&self) -> Vec3 {
        self.writes.velocity.unwrap_or(self.linear_velocity)
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn mass(&self) -> f32 {
        self.mass
    }

    fn apply_relative_torque(&mut self, torque: Vec3, mode: ForceMode) {
        let world = self.pose.rotation * torque;
        match mode {
            ForceMode::Acceleration => self.writes.angular_acceleration += world,
            ForceMode::Force => self.writes.torque += world,
        }
    }

    fn apply_force(&mut self, force: Vec3, mode: ForceMode) {
        match mode {
            ForceMode::Acceleration => self.writes.linear_acceleration += force,
            ForceMode::Force => self.writes.force += force,
        }
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.writes.velocity = Some(velocity);
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.writes.orientation = Some(orientation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::yaw_rotation_degrees;

    struct Layers {
        current: Vec<Layer>,
        saved: Option<Vec<Layer>>,
    }

    impl ColliderLayers for Layers {
        fn set_own_colliders_to_layer(&mut self, layer: Layer) {
            self.saved = Some(self.current.clone());
            self.current.iter_mut().for_each(|l| *l = layer);
        }

        fn restore_own_collider_layers(&mut self) {
            if let Some(saved) = self.saved.take() {
                self.current = saved;
            }
        }

        fn own_collider_layers(&self) -> Vec<Layer> {
            self.current.clone()
        }
    }

    #[test]
    fn layer_scope_restores_on_drop() {
        let hull = Layer::new(12).unwrap();
        let ignore = Layer::new(2).unwrap();
        let mut layers = Layers {
            current: vec![hull, hull],
            saved: None,
        };
        let before = layers.own_collider_layers();
        {
            let scope = LayerScope::enter(&mut layers, ignore);
            assert_eq!(scope.own_collider_layers(), vec![ignore, ignore]);
        }
        assert_eq!(layers.own_collider_layers(), before);
    }

    #[test]
    fn relative_torque_is_rotated_into_world() {
        let pose = Pose::new(Vec3::zeros(), yaw_rotation_degrees(90.0));
        let mut frame = BodyFrame::capture(7u32, pose, Vec3::zeros(), Vec3::zeros(), 5.0);
        frame.apply_relative_torque(Vec3::new(1.0, 0.0, 0.0), ForceMode::Acceleration);

        // Local right of a body yawed 90 degrees points along world -Z.
        let w = frame.writes().angular_acceleration;
        assert!((w - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-5);
    }

    #[test]
    fn acceleration_mode_ignores_mass() {
        let pose = Pose::new(Vec3::zeros(), Quat::identity());
        let mut frame = BodyFrame::capture(1u32, pose, Vec3::zeros(), Vec3::zeros(), 1000.0);
        frame.apply_force(Vec3::new(0.0, 3.0, 0.0), ForceMode::Acceleration);
        frame.apply_force(Vec3::new(0.0, 1.0, 0.0), ForceMode::Force);

        let (lin, _) = frame.integrated_velocities(0.5);
        assert!((lin.y - 1.5).abs() < 1.0e-6);
        assert_eq!(frame.writes().force, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn written_velocity_is_visible_to_later_reads() {
        let pose = Pose::new(Vec3::zeros(), Quat::identity());
        let mut frame = BodyFrame::capture(1u32, pose, Vec3::new(1.0, 0.0, 0.0), Vec3::zeros(), 1.0);
        frame.set_velocity(Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(frame.linear_velocity(), Vec3::new(0.0, 0.0, 4.0));
    }
}
