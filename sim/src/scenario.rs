use std::path::Path;

use anyhow::Context;
use hover::control::InputPhase;
use hover::{
    ColliderShapeDef, HoverClassConfig, HoverWorld, PilotSeat, ScriptedDriver, VehicleId,
    WorldSettings, WorldStaticDef,
};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::Deserialize;

/// A headless run: terrain, one vehicle class, where to spawn it and what to drive.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Log vehicle state every this many ticks; 0 disables.
    #[serde(default)]
    pub log_every: u32,
    #[serde(default = "default_gravity")]
    pub gravity: [f32; 3],
    #[serde(default)]
    pub terrain: Vec<TerrainRow>,
    pub vehicle: HoverClassConfig,
    #[serde(default)]
    pub spawn: Spawn,
    #[serde(default)]
    pub script: Vec<InputPhase>,
}

fn default_dt() -> f32 {
    0.02
}

fn default_ticks() -> u32 {
    500
}

fn default_gravity() -> [f32; 3] {
    [0.0, -9.81, 0.0]
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Spawn {
    #[serde(default)]
    pub position: [f32; 3],
    /// Degrees about world up.
    #[serde(default)]
    pub yaw: f32,
}

/// One `[[terrain]]` entry as authored.
#[derive(Clone, Debug, Deserialize)]
pub struct TerrainRow {
    pub id: u32,
    #[serde(default)]
    pub translation: [f32; 3],
    /// Quaternion `[x, y, z, w]`.
    #[serde(default = "identity_rotation")]
    pub rotation: [f32; 4],
    pub shape: TerrainShape,
    #[serde(default)]
    pub sensor: bool,
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerrainShape {
    Plane {
        #[serde(default)]
        offset: f32,
    },
    Cuboid {
        half_extents: [f32; 3],
    },
    Sphere {
        radius: f32,
    },
    Capsule {
        radius: f32,
        half_height: f32,
    },
    Cylinder {
        radius: f32,
        half_height: f32,
    },
}

/// Convert a single terrain row to the world's static definition.
pub fn row_to_def(row: &TerrainRow) -> WorldStaticDef {
    let shape = match row.shape {
        TerrainShape::Plane { offset } => ColliderShapeDef::Plane {
            offset_along_normal: offset,
        },
        TerrainShape::Cuboid { half_extents } => ColliderShapeDef::Cuboid {
            half_extents: Vector3::from(half_extents),
        },
        TerrainShape::Sphere { radius } => ColliderShapeDef::Sphere { radius },
        TerrainShape::Capsule {
            radius,
            half_height,
        } => ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        },
        TerrainShape::Cylinder {
            radius,
            half_height,
        } => ColliderShapeDef::CylinderY {
            radius,
            half_height,
        },
    };

    let [x, y, z, w] = row.rotation;
    WorldStaticDef {
        id: row.id,
        translation: Vector3::from(row.translation),
        rotation: UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        shape,
        sensor: row.sensor,
    }
}

impl Scenario {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let scenario: Self = toml::from_str(source)?;
        anyhow::ensure!(
            scenario.dt.is_finite() && scenario.dt > 0.0,
            "scenario dt must be positive, got {}",
            scenario.dt
        );
        Ok(scenario)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn settings(&self) -> WorldSettings {
        WorldSettings {
            dt: self.dt,
            gravity: Vector3::from(self.gravity),
            ..WorldSettings::default()
        }
    }

    /// Build the world and spawn the scenario's vehicle, seated with its script if it has one.
    pub fn build_world(&self) -> anyhow::Result<(HoverWorld, VehicleId)> {
        let class = self.vehicle.build().context("building vehicle class")?;
        let statics = self.terrain.iter().map(row_to_def).collect();

        let mut world = HoverWorld::build(statics, self.settings());
        let id = world.spawn(&class, Vector3::from(self.spawn.position), self.spawn.yaw)?;

        if !self.script.is_empty() {
            let driver = ScriptedDriver::new(self.script.clone());
            world
                .vehicle_mut(id)?
                .set_driver_section(Box::new(PilotSeat::occupied(Box::new(driver))));
        }
        Ok((world, id))
    }

    /// Seconds of scripted input.
    pub fn script_duration(&self) -> f32 {
        self.script.iter().map(|phase| phase.duration).sum()
    }
}
