/*!
Hover class configuration.

A hover class is authored as TOML and turned into validated runtime types once,
when the vehicle class is loaded. Nothing here is consulted during a tick.

```toml
[tuning]
acceleration = 8.0
forward_speed = 12.0

[[springs]]
position = [0.8, 0.0, 1.2]
scale = 1.0
length = 0.8

[[wheels]]
velocity_to_v = 0.5
```

Defaults follow the stock hover property table: every field may be omitted.
*/

use std::path::Path;

use serde::Deserialize;

use crate::constants::{DEFAULT_HULL_LAYER, DEFAULT_GROUND_LAYERS, DEFAULT_SELF_IGNORE_LAYER};
use crate::error::ConfigError;
use crate::layers::{Layer, LayerMask, SuspensionLayers};
use crate::suspension::SuspensionPoint;
use crate::types::Vec3;
use crate::wheel::WheelScroller;

/// Per-class tuning. Loaded once at spawn, never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TuningParameters {
    pub acceleration: f32,
    pub deceleration: f32,
    pub forward_speed: f32,
    pub reverse_speed: f32,
    pub strafe_speed: f32,
    /// Turn rate while (almost) stationary.
    pub spin_rate: f32,
    /// Turn rate while moving.
    pub turn_rate: f32,
    pub gravity_scale: f32,
    pub omega_x_spring: f32,
    pub omega_x_damp: f32,
    pub omega_z_spring: f32,
    pub omega_z_damp: f32,
    pub velocity_spring: f32,
    pub velocity_damp: f32,
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self {
            acceleration: 5.0,
            deceleration: 5.0,
            forward_speed: 5.0,
            reverse_speed: 5.0,
            strafe_speed: 5.0,
            spin_rate: 1.7,
            turn_rate: 1.7,
            gravity_scale: 0.5,
            omega_x_spring: 0.5,
            omega_x_damp: 0.5,
            omega_z_spring: 1.7,
            omega_z_damp: 1.7,
            velocity_spring: 0.5,
            velocity_damp: 0.5,
        }
    }
}

impl TuningParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
            ("forward_speed", self.forward_speed),
            ("reverse_speed", self.reverse_speed),
            ("strafe_speed", self.strafe_speed),
            ("spin_rate", self.spin_rate),
            ("turn_rate", self.turn_rate),
            ("gravity_scale", self.gravity_scale),
            ("omega_x_spring", self.omega_x_spring),
            ("omega_x_damp", self.omega_x_damp),
            ("omega_z_spring", self.omega_z_spring),
            ("omega_z_damp", self.omega_z_damp),
            ("velocity_spring", self.velocity_spring),
            ("velocity_damp", self.velocity_damp),
        ];
        if let Some(&(field, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::InvalidTuning { field, value });
        }

        let speeds = [
            ("forward_speed", self.forward_speed),
            ("reverse_speed", self.reverse_speed),
            ("strafe_speed", self.strafe_speed),
        ];
        if let Some(&(field, value)) = speeds.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::InvalidTuning { field, value });
        }

        // Velocity increments are divided by it.
        if self.gravity_scale <= 0.0 {
            return Err(ConfigError::InvalidTuning {
                field: "gravity_scale",
                value: self.gravity_scale,
            });
        }
        Ok(())
    }
}

/// One `[[springs]]` entry.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct SpringDef {
    /// Local offset from the vehicle origin.
    pub position: [f32; 3],
    /// Reach: max ray length.
    pub scale: f32,
    /// Compression reference length; defaults to `scale`.
    #[serde(default)]
    pub length: Option<f32>,
    #[serde(default)]
    pub omega_x_factor: Option<f32>,
    #[serde(default)]
    pub omega_z_factor: Option<f32>,
}

impl SpringDef {
    pub fn build(&self) -> Result<SuspensionPoint, ConfigError> {
        let [x, y, z] = self.position;
        let mut point = SuspensionPoint::new(Vec3::new(x, y, z), self.scale)?;
        if let Some(length) = self.length {
            point = point.with_rest_length(length)?;
        }
        if let Some(factor) = self.omega_x_factor {
            point = point.with_omega_x_factor(factor)?;
        }
        if let Some(factor) = self.omega_z_factor {
            point = point.with_omega_z_factor(factor)?;
        }
        Ok(point)
    }
}

/// Rigid-body setup used by hosts when spawning the vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Height added to the spawn position. Actual hover height comes from the springs.
    pub set_altitude: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Half extents of the hull box collider.
    pub hull_half_extents: [f32; 3],
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            set_altitude: 0.5,
            linear_damping: 0.2,
            angular_damping: 10.0,
            hull_half_extents: [1.0, 0.3, 1.6],
        }
    }
}

impl BodyConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let scalars = [
            ("set_altitude", self.set_altitude),
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
        ];
        if let Some(&(field, value)) = scalars.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::InvalidBody { field, value });
        }
        if let Some(&value) = self
            .hull_half_extents
            .iter()
            .find(|v| !v.is_finite() || **v <= 0.0)
        {
            return Err(ConfigError::InvalidBody {
                field: "hull_half_extents",
                value,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub self_ignore: u8,
    pub hull: u8,
    pub ground: Vec<u8>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            self_ignore: DEFAULT_SELF_IGNORE_LAYER,
            hull: DEFAULT_HULL_LAYER,
            ground: DEFAULT_GROUND_LAYERS.to_vec(),
        }
    }
}

impl LayerConfig {
    pub fn build(&self) -> Result<SuspensionLayers, ConfigError> {
        let layer = |i: u8| Layer::new(i).ok_or(ConfigError::InvalidLayer(i));
        let ground = self
            .ground
            .iter()
            .map(|&i| layer(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SuspensionLayers {
            self_ignore: layer(self.self_ignore)?,
            ground_mask: LayerMask::from_layers(&ground),
            hull: layer(self.hull)?,
        })
    }
}

/// One `[[wheels]]` entry: how a scrolling wheel texture follows the vehicle's motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WheelDef {
    pub velocity_to_u: f32,
    pub omega_to_u: f32,
    pub velocity_to_v: f32,
    pub omega_to_v: f32,
}

/// Raw, unvalidated hover class as authored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HoverClassConfig {
    pub tuning: TuningParameters,
    pub body: BodyConfig,
    pub springs: Vec<SpringDef>,
    pub layers: LayerConfig,
    pub wheels: Vec<WheelDef>,
}

impl HoverClassConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate everything and build the runtime class.
    pub fn build(&self) -> Result<HoverClass, ConfigError> {
        self.tuning.validate()?;
        self.body.validate()?;

        let springs = self
            .springs
            .iter()
            .enumerate()
            .map(|(index, def)| def.build().map_err(|e| e.at_spring(index)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HoverClass {
            tuning: self.tuning,
            body: self.body,
            springs,
            layers: self.layers.build()?,
            wheels: self.wheels.iter().map(WheelScroller::from_def).collect(),
        })
    }
}

impl ConfigError {
    /// Re-address a spring error to the spring at `index`.
    pub fn at_spring(self, index: usize) -> Self {
        match self {
            ConfigError::InvalidReach { value, .. } => ConfigError::InvalidReach { index, value },
            ConfigError::InvalidRestLength { value, .. } => {
                ConfigError::InvalidRestLength { index, value }
            }
            ConfigError::InvalidFactor { value, .. } => ConfigError::InvalidFactor { index, value },
            ConfigError::InvalidPosition { .. } => ConfigError::InvalidPosition { index },
            other => other,
        }
    }
}

/// Validated hover class, ready to spawn vehicles from.
#[derive(Clone, Debug)]
pub struct HoverClass {
    pub tuning: TuningParameters,
    pub body: BodyConfig,
    pub springs: Vec<SuspensionPoint>,
    pub layers: SuspensionLayers,
    pub wheels: Vec<WheelScroller>,
}

impl HoverClass {
    /// Vehicle mass (kg) for the host body.
    pub fn mass(&self) -> f32 {
        self.tuning.gravity_scale * crate::constants::MASS_PER_GRAVITY_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reports_missing_file() {
        let result = HoverClassConfig::load("does/not/exist/hover.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    const SPEEDER: &str = r#"
        [tuning]
        acceleration = 8.0
        forward_speed = 12.0
        gravity_scale = 1.0

        [body]
        set_altitude = 1.0

        [[springs]]
        position = [0.8, 0.0, 1.2]
        scale = 1.0
        length = 0.8

        [[springs]]
        position = [-0.8, 0.0, 1.2]
        scale = 1.0

        [[springs]]
        position = [0.0, 0.0, -1.5]
        scale = 1.2
        omega_x_factor = 0.5

        [layers]
        ground = [11, 13]

        [[wheels]]
        velocity_to_v = 0.5
        omega_to_u = -0.25
    "#;

    #[test]
    fn parses_and_builds_a_class() {
        let class = HoverClassConfig::from_toml_str(SPEEDER)
            .and_then(|c| c.build())
            .unwrap();

        assert_eq!(class.tuning.acceleration, 8.0);
        assert_eq!(class.tuning.deceleration, 5.0);
        assert_eq!(class.tuning.turn_rate, 1.7);
        assert_eq!(class.body.set_altitude, 1.0);
        assert_eq!(class.body.angular_damping, 10.0);
        assert_eq!(class.mass(), 10.0);

        assert_eq!(class.springs.len(), 3);
        assert_eq!(class.springs[0].rest_length(), 0.8);
        assert_eq!(class.springs[1].rest_length(), 1.0);
        assert_eq!(class.springs[1].omega_z_factor(), -1.0);
        assert_eq!(class.springs[1].omega_x_factor(), -1.0);
        assert_eq!(class.springs[2].omega_x_factor(), 0.5);

        assert_eq!(class.layers.ground_mask.bits(), (1 << 11) | (1 << 13));
        assert_eq!(class.layers.self_ignore.index(), 2);
        assert_eq!(class.wheels.len(), 1);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = HoverClassConfig::from_toml_str("").unwrap();
        assert_eq!(config.tuning, TuningParameters::default());
        assert_eq!(config.layers, LayerConfig::default());
        assert!(config.springs.is_empty());
    }

    #[test]
    fn zero_length_spring_is_rejected_with_its_index() {
        let source = r#"
            [[springs]]
            position = [0.0, 0.0, 0.0]
            scale = 1.0

            [[springs]]
            position = [0.0, 0.0, 1.0]
            scale = 1.0
            length = 0.0
        "#;
        let err = HoverClassConfig::from_toml_str(source)
            .and_then(|c| c.build())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRestLength { index: 1, .. }));
    }

    #[test]
    fn zero_gravity_scale_is_rejected() {
        let config = HoverClassConfig {
            tuning: TuningParameters {
                gravity_scale: 0.0,
                ..TuningParameters::default()
            },
            ..HoverClassConfig::default()
        };
        assert!(matches!(
            config.build(),
            Err(ConfigError::InvalidTuning {
                field: "gravity_scale",
                ..
            })
        ));
    }

    #[test]
    fn out_of_range_layer_is_rejected() {
        let err = HoverClassConfig::from_toml_str("[layers]\nground = [11, 40]")
            .and_then(|c| c.build())
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLayer(40)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = HoverClassConfig::from_toml_str("[[springs]]\nscale = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn degenerate_spring_is_accepted() {
        let source = r#"
            [[springs]]
            position = [0.0, 0.0, 0.0]
            scale = 0.5
            length = 1.5
        "#;
        let class = HoverClassConfig::from_toml_str(source)
            .and_then(|c| c.build())
            .unwrap();
        assert!(class.springs[0].is_degenerate());
    }
}
