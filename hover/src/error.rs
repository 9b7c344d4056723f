use thiserror::Error;

/// Rejected vehicle configuration. Raised at construction time, never during a tick.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("spring {index}: reach must be positive and finite, got {value}")]
    InvalidReach { index: usize, value: f32 },

    #[error("spring {index}: rest length must be positive and finite, got {value}")]
    InvalidRestLength { index: usize, value: f32 },

    #[error("spring {index}: stabilization factor must be in [-1, 1], got {value}")]
    InvalidFactor { index: usize, value: f32 },

    #[error("spring {index}: position must be finite")]
    InvalidPosition { index: usize },

    #[error("tuning `{field}` is invalid: {value}")]
    InvalidTuning { field: &'static str, value: f32 },

    #[error("body `{field}` is invalid: {value}")]
    InvalidBody { field: &'static str, value: f32 },

    #[error("collision layer {0} is out of range")]
    InvalidLayer(u8),

    #[error("failed to parse hover class: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read hover class: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the rapier host world.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("hover class has no springs")]
    NoSprings,

    #[error("unknown vehicle {0}")]
    UnknownVehicle(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
