use std::{env, path::PathBuf};

// Runtime settings, read from the environment (and `.env` when present).

pub fn scenario_path() -> PathBuf {
    env::var("HOVER_SIM_SCENARIO")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/flat.toml"))
}

/// Overrides the scenario's own tick count.
pub fn tick_override() -> Option<u32> {
    env::var("HOVER_SIM_TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
}
