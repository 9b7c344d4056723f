pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod host;
pub mod layers;
pub mod locomotion;
pub mod pose;
pub mod rapier_world;
pub mod suspension;
pub mod types;
pub mod vehicle;
pub mod wheel;

#[cfg(test)]
mod test_support;

pub use config::{HoverClass, HoverClassConfig, TuningParameters};
pub use control::{
    ControlSection, DriveController, DriveInput, PilotSeat, ScriptedDriver, TurretSeat,
};
pub use error::{ConfigError, WorldError};
pub use host::{BodyFrame, ColliderLayers, ForceMode, SpringRay, RayHit, RayCaster, VehicleBody};
pub use layers::{Layer, LayerMask, SuspensionLayers};
pub use rapier_world::{
    BodyState, ColliderShapeDef, HoverWorld, RapierScene, VehicleId, WorldSettings,
    WorldStaticDef, collider_from_def, rapier3d,
};
pub use suspension::{SuspensionPoint, SuspensionSample, SuspensionSystem};
pub use vehicle::HoverVehicle;
