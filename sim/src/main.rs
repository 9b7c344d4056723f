mod config;
mod scenario;

use anyhow::Context;
use tracing::info;

use crate::scenario::Scenario;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn main() -> anyhow::Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let path = config::scenario_path();
    let scenario = Scenario::load(&path)?;
    let ticks = config::tick_override().unwrap_or(scenario.ticks);
    let (mut world, id) = scenario.build_world().context("building scenario world")?;

    info!(
        scenario = %path.display(),
        vehicle = id.index(),
        ticks,
        dt = world.dt(),
        terrain = scenario.terrain.len(),
        script_secs = scenario.script_duration(),
        "starting hover sim"
    );

    for tick in 1..=ticks {
        world.step();

        if scenario.log_every > 0 && tick % scenario.log_every == 0 {
            let state = world.body_state(id)?;
            let vehicle = world.vehicle(id)?;
            let p = state.pose.translation;
            info!(
                tick,
                x = p.x,
                y = p.y,
                z = p.z,
                speed = state.linear_velocity.norm(),
                grounded = vehicle.suspension().grounded_count(),
                "vehicle"
            );
        }
    }

    let state = world.body_state(id)?;
    let local = world.vehicle(id)?.locomotion_state().local_velocity;
    info!(
        position = ?state.pose.translation,
        forward_speed = local.z,
        strafe_speed = local.x,
        "hover sim finished"
    );
    Ok(())
}
