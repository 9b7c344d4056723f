/*!
Hover suspension and locomotion tuning constants.

These are the fixed gains of the spring pass and the locomotion step. They are
not exposed through class configuration: changing any of them changes how every
hover vehicle feels.

Notes
- Distances are in meters, time in seconds, yaw increments in degrees.
- Gains multiply per-tick penetration and `dt`; see `suspension` for the
  formulas they take part in.
*/

/// Dead-zone around zero when deriving stabilization factors from a spring's
/// local position (meters).
pub const FACTOR_DEAD_ZONE: f32 = 0.001;

/// Roll (about local right) spring gain applied to `omega_x_spring * omega_x_factor`.
pub const ROLL_SPRING_GAIN: f32 = 2.0;
/// Roll damping gain applied to `omega_x_damp * -(ω · right)`.
pub const ROLL_DAMP_GAIN: f32 = 0.3;
/// Roll torque scale (multiplied by penetration and dt).
pub const ROLL_TORQUE_SCALE: f32 = 60.0;

/// Pitch (about local forward) damping gain applied to `omega_z_damp * -(ω · forward)`.
pub const PITCH_DAMP_GAIN: f32 = 0.5;
/// Pitch torque scale (multiplied by penetration and dt).
pub const PITCH_TORQUE_SCALE: f32 = 80.0;

/// Lift damping gain applied to `velocity_damp * -v_y`.
pub const LIFT_DAMP_GAIN: f32 = 0.3;
/// Lift force scale (multiplied by penetration and dt).
pub const LIFT_FORCE_SCALE: f32 = 80.0;

/// Below this local speed (m/s) the vehicle spins in place with `spin_rate`,
/// above it turns with `turn_rate`.
pub const SPIN_SPEED_THRESHOLD: f32 = 0.1;

/// Yaw increment scale: `YAW_RATE_SCALE * rot_rate * yaw * dt` degrees per tick.
pub const YAW_RATE_SCALE: f32 = 16.0;

/// Engine force to velocity scale: `Δv = DRIVE_FORCE_SCALE * dt * force / gravity_scale`.
pub const DRIVE_FORCE_SCALE: f32 = 2.0;

/// Vehicle mass per unit of `gravity_scale` (kg).
pub const MASS_PER_GRAVITY_SCALE: f32 = 10.0;

/// Collision layer own colliders are parked on while spring rays are cast.
pub const DEFAULT_SELF_IGNORE_LAYER: u8 = 2;

/// Layer hover hulls live on outside of the spring pass.
pub const DEFAULT_HULL_LAYER: u8 = 12;

/// Layer terrain statics are inserted on by the rapier host.
pub const DEFAULT_TERRAIN_LAYER: u8 = 11;

/// Layers spring rays can hit (terrain, vehicles, props, buildings, ordnance).
pub const DEFAULT_GROUND_LAYERS: [u8; 5] = [11, 12, 13, 14, 15];

/// Number of addressable collision layers.
pub const LAYER_COUNT: u8 = 32;
