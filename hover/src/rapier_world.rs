//! Rapier-backed host for hover vehicles.
//!
//! `HoverWorld` owns the rapier sets, static terrain and spawned vehicles. Each
//! [`HoverWorld::step`] captures a [`BodyFrame`] per vehicle, runs the vehicle against a
//! borrowed [`RapierScene`], commits the frame back to the rigid body and then advances the
//! physics pipeline once.
//!
//! Layers map onto rapier collision groups: a collider on layer `n` has membership bit `n`.
//! Spring rays test their layer mask against those membership bits.

// Re-export Rapier so the binary can name handles and shapes without its own dependency.
pub use rapier3d;

use log::debug;
use rapier3d::na::UnitQuaternion;
use rapier3d::prelude::*;

use crate::config::HoverClass;
use crate::error::WorldError;
use crate::host::{BodyFrame, ColliderLayers, SpringRay, RayHit, RayCaster};
use crate::layers::{Layer, LayerBit};
use crate::types::{Pose, Vec3, world_up, yaw_rotation_degrees};
use crate::vehicle::HoverVehicle;

/// Definition of an immutable terrain collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - For planes the normal is `rotation * +Y`.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    pub translation: Vector<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    /// Trigger volume: reported to the physics pipeline, skipped by spring rays.
    pub sensor: bool,
}

/// Supported terrain shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space), offset along its normal.
    Plane { offset_along_normal: f32 },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },
}

/// Build a terrain collider on `layer`. The pose lives on the parent rigid body.
pub fn collider_from_def(def: &WorldStaticDef, layer: Layer) -> Collider {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // Body-local half-space: the parent pose supplies rotation and translation,
            // so only the offset along the local normal is left.
            ColliderBuilder::halfspace(Vector::y_axis())
                .translation(Vector::y() * *offset_along_normal)
        }

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
    };

    let mut collider = builder.sensor(def.sensor).build();
    set_membership(&mut collider, layer);
    collider
}

fn layer_group(layer: Layer) -> Group {
    Group::from_bits_truncate(layer.bit())
}

/// Put `collider` on exactly one layer, leaving its filter untouched.
fn set_membership(collider: &mut Collider, layer: Layer) {
    let mut groups = collider.collision_groups();
    groups.memberships = layer_group(layer);
    collider.set_collision_groups(groups);
}

/// Lowest layer a collider is a member of.
fn membership_layer(collider: &Collider) -> Option<Layer> {
    let bits = collider.collision_groups().memberships.bits();
    if bits == 0 {
        return None;
    }
    u8::try_from(bits.trailing_zeros()).ok().and_then(Layer::new)
}

/// Settings shared by every vehicle in a world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldSettings {
    /// Fixed physics step (seconds).
    pub dt: f32,
    pub gravity: Vector<f32>,
    pub terrain_layer: Layer,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            dt: 1.0 / 50.0,
            gravity: Vector::new(0.0, -9.81, 0.0),
            terrain_layer: Layer::TERRAIN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VehicleId(usize);

impl VehicleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Snapshot of a vehicle's rigid body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub pose: Pose,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

struct SpawnedVehicle {
    hover: HoverVehicle,
    body: RigidBodyHandle,
    colliders: Vec<ColliderHandle>,
}

pub struct HoverWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
    integration_parameters: IntegrationParameters,
    gravity: Vector<f32>,
    islands: IslandManager,
    pipeline: PhysicsPipeline,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    vehicles: Vec<SpawnedVehicle>,
}

impl HoverWorld {
    /// Build a world from terrain definitions, inserted sorted by `id`.
    pub fn build(mut statics: Vec<WorldStaticDef>, settings: WorldSettings) -> Self {
        statics.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        for def in &statics {
            let pose = Pose::new(def.translation, def.rotation);
            let rb_handle = bodies.insert(RigidBodyBuilder::fixed().pose(pose.iso()).build());
            colliders.insert_with_parent(
                collider_from_def(def, settings.terrain_layer),
                rb_handle,
                &mut bodies,
            );
        }

        let mut world = Self {
            bodies,
            colliders,
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            integration_parameters: IntegrationParameters {
                dt: settings.dt,
                ..IntegrationParameters::default()
            },
            gravity: settings.gravity,
            islands: IslandManager::new(),
            pipeline: PhysicsPipeline::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            vehicles: Vec::new(),
        };
        world.refresh_broad_phase();
        world
    }

    /// Run collision detection only, so the first step's rays see the terrain.
    ///
    /// Only for statics: a dynamic body stepped here would never reach the island manager.
    fn refresh_broad_phase(&mut self) {
        let mut collision_pipeline = CollisionPipeline::new();
        collision_pipeline.step(
            0.0,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &(),
            &(),
        );
    }

    /// Spawn a vehicle of `class` at `position` (raised by the class altitude), facing `yaw_degrees`.
    pub fn spawn(
        &mut self,
        class: &HoverClass,
        position: Vec3,
        yaw_degrees: f32,
    ) -> Result<VehicleId, WorldError> {
        if class.springs.is_empty() {
            return Err(WorldError::NoSprings);
        }

        let translation = position + world_up() * class.body.set_altitude;
        let pose = Pose::new(translation, yaw_rotation_degrees(yaw_degrees));
        let rb = RigidBodyBuilder::dynamic()
            .pose(pose.iso())
            .linear_damping(class.body.linear_damping)
            .angular_damping(class.body.angular_damping)
            .ccd_enabled(true)
            .build();
        let body = self.bodies.insert(rb);

        let [hx, hy, hz] = class.body.hull_half_extents;
        let mut hull = ColliderBuilder::cuboid(hx, hy, hz).mass(class.mass()).build();
        set_membership(&mut hull, class.layers.hull);
        let hull = self
            .colliders
            .insert_with_parent(hull, body, &mut self.bodies);

        let id = VehicleId(self.vehicles.len());
        self.vehicles.push(SpawnedVehicle {
            hover: HoverVehicle::from_class(class),
            body,
            colliders: vec![hull],
        });
        debug!("spawned hover vehicle {} at {translation:?}", id.0);
        Ok(id)
    }

    fn spawned(&self, id: VehicleId) -> Result<&SpawnedVehicle, WorldError> {
        self.vehicles
            .get(id.0)
            .ok_or(WorldError::UnknownVehicle(id.0))
    }

    pub fn vehicle(&self, id: VehicleId) -> Result<&HoverVehicle, WorldError> {
        Ok(&self.spawned(id)?.hover)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Result<&mut HoverVehicle, WorldError> {
        self.vehicles
            .get_mut(id.0)
            .map(|v| &mut v.hover)
            .ok_or(WorldError::UnknownVehicle(id.0))
    }

    pub fn body_state(&self, id: VehicleId) -> Result<BodyState, WorldError> {
        let rb = self
            .bodies
            .get(self.spawned(id)?.body)
            .ok_or(WorldError::UnknownVehicle(id.0))?;
        Ok(BodyState {
            pose: Pose::new(*rb.translation(), *rb.rotation()),
            linear_velocity: *rb.linvel(),
            angular_velocity: *rb.angvel(),
        })
    }

    pub fn dt(&self) -> f32 {
        self.integration_parameters.dt
    }

    /// Advance every vehicle, then the physics pipeline, by one fixed step.
    pub fn step(&mut self) {
        let dt = self.integration_parameters.dt;

        for (index, vehicle) in self.vehicles.iter_mut().enumerate() {
            let Some(rb) = self.bodies.get(vehicle.body) else {
                debug!("hover vehicle {index} has no rigid body, skipping");
                continue;
            };
            let mut frame = BodyFrame::capture(
                vehicle.body,
                Pose::new(*rb.translation(), *rb.rotation()),
                *rb.linvel(),
                *rb.angvel(),
                rb.mass(),
            );

            vehicle.hover.advance_state(dt);
            {
                let mut scene = RapierScene::new(
                    &self.bodies,
                    &mut self.colliders,
                    &self.broad_phase,
                    &self.narrow_phase,
                    &vehicle.colliders,
                );
                vehicle.hover.advance_physics(dt, &mut scene, &mut frame);
            }

            if let Some(rb) = self.bodies.get_mut(vehicle.body) {
                commit_frame(rb, &frame, dt);
            }
        }

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }
}

/// Write one tick of vehicle output into the rigid body before the pipeline integrates it.
fn commit_frame(rb: &mut RigidBody, frame: &BodyFrame<RigidBodyHandle>, dt: f32) {
    let (linvel, angvel) = frame.integrated_velocities(dt);
    let writes = frame.writes();

    rb.set_linvel(linvel, true);
    rb.set_angvel(angvel, true);
    if let Some(orientation) = writes.orientation {
        rb.set_rotation(orientation, true);
    }

    rb.reset_forces(true);
    rb.reset_torques(true);
    rb.add_force(writes.force, true);
    rb.add_torque(writes.torque, true);
}

/// Borrowed view of a [`HoverWorld`] handed to one vehicle for one tick.
pub struct RapierScene<'a> {
    bodies: &'a RigidBodySet,
    colliders: &'a mut ColliderSet,
    broad_phase: &'a BroadPhaseBvh,
    narrow_phase: &'a NarrowPhase,
    own_colliders: &'a [ColliderHandle],
    saved: Vec<(ColliderHandle, Group)>,
}

impl<'a> RapierScene<'a> {
    pub fn new(
        bodies: &'a RigidBodySet,
        colliders: &'a mut ColliderSet,
        broad_phase: &'a BroadPhaseBvh,
        narrow_phase: &'a NarrowPhase,
        own_colliders: &'a [ColliderHandle],
    ) -> Self {
        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
            own_colliders,
            saved: Vec::new(),
        }
    }
}

impl RayCaster for RapierScene<'_> {
    type Identity = RigidBodyHandle;

    fn cast(&self, ray: &SpringRay) -> Option<RayHit<RigidBodyHandle>> {
        let mask = ray.layer_mask.bits();
        let on_mask = |_: ColliderHandle, collider: &Collider| {
            collider.collision_groups().memberships.bits() & mask != 0
        };

        let mut filter = QueryFilter::default().predicate(&on_mask);
        if ray.ignore_triggers {
            filter = filter.exclude_sensors();
        }

        let pipeline = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            self.bodies,
            &*self.colliders,
            filter,
        );
        let query = Ray::new(Point::from(ray.origin), ray.direction);
        let (handle, distance) = pipeline.cast_ray(&query, ray.max_distance, true)?;

        Some(RayHit {
            distance,
            owner: self.colliders.get(handle).and_then(Collider::parent),
        })
    }
}

impl ColliderLayers for RapierScene<'_> {
    fn set_own_colliders_to_layer(&mut self, layer: Layer) {
        self.saved.clear();
        for &handle in self.own_colliders {
            if let Some(collider) = self.colliders.get_mut(handle) {
                self.saved
                    .push((handle, collider.collision_groups().memberships));
                set_membership(collider, layer);
            }
        }
    }

    fn restore_own_collider_layers(&mut self) {
        for (handle, memberships) in self.saved.drain(..) {
            if let Some(collider) = self.colliders.get_mut(handle) {
                let mut groups = collider.collision_groups();
                groups.memberships = memberships;
                collider.set_collision_groups(groups);
            }
        }
    }

    fn own_collider_layers(&self) -> Vec<Layer> {
        self.own_colliders
            .iter()
            .filter_map(|&handle| self.colliders.get(handle))
            .filter_map(membership_layer)
            .collect()
    }
}
