// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Ability Player - headless ability timeline playback
//!
//! Loads an exported ability timeline, resolves its asset references through
//! the manifest in the player config and plays it with the built-in
//! handlers against logging stand-in services:
//! - Fixed-step simulation driven from simulated frame time
//! - Summary of transitions and handler failures at the end
//!
//! `ordoplay_ability_player --write-demo <dir>` writes a sample ability and
//! a matching config to get started.

mod config;
mod demo;
mod driver;
mod error;
mod services;

use config::PlayerConfig;
use driver::FixedStepDriver;
use error::{PlayerError, Result};
use ordoplay_ability_runtime::{ActorId, ProcessRegistry, Runner, RunnerStats};
use ordoplay_ability_timeline::resolver;
use services::{LoggingServices, ServiceLog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Outcome of one headless run
#[derive(Debug, Clone)]
struct Summary {
    stats: RunnerStats,
    steps: u64,
    dropped_frames: u64,
    unresolved: usize,
    services: ServiceLog,
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OrdoPlay Ability Player v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(std::env::args().skip(1).collect()) {
        tracing::error!("Player failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let config_path = match args.as_slice() {
        [flag, dir] if flag == "--write-demo" => {
            let path = demo::write(Path::new(dir))?;
            tracing::info!("Run it with: ordoplay_ability_player {}", path.display());
            return Ok(());
        }
        [path] => PathBuf::from(path),
        _ => return Err(PlayerError::Usage),
    };

    let config = PlayerConfig::load(&config_path).map_err(PlayerError::io(&config_path))?;
    let summary = play(&config, &config_path)?;

    tracing::info!(
        "Done: {} enter(s), {} exit(s), {} failure(s) over {} step(s)",
        summary.stats.entered,
        summary.stats.exited,
        summary.stats.failed,
        summary.steps
    );
    if summary.dropped_frames > 0 {
        tracing::warn!("{} frame(s) dropped simulation backlog", summary.dropped_frames);
    }
    if summary.unresolved > 0 {
        tracing::warn!("{} asset reference(s) did not resolve", summary.unresolved);
    }
    tracing::info!(
        "Services: {} animation(s), {} spawn(s) ({} destroyed), {} hit window(s), moved {:?}, events {:?}",
        summary.services.animations,
        summary.services.spawned,
        summary.services.destroyed,
        summary.services.hit_windows,
        summary.services.displacement,
        summary.services.events
    );
    Ok(())
}

/// Import the configured timeline and simulate it for the configured frames
fn play(config: &PlayerConfig, config_path: &Path) -> Result<Summary> {
    let timeline_path = config.timeline_path(config_path);
    let text = std::fs::read_to_string(&timeline_path).map_err(PlayerError::io(&timeline_path))?;
    let imported = resolver::import(&text, &config.manifest)?;
    let unresolved = imported.unresolved.len();

    let services = Arc::new(LoggingServices::new(ActorId(1)));
    let registry = Arc::new(ProcessRegistry::builtin()?);
    let mut runner = Runner::new(registry, Arc::new(services.table()), config.runner.clone());
    let mut driver = FixedStepDriver::new(config.fixed_timestep, config.max_steps_per_frame);

    tracing::info!(
        "Simulating {} frame(s) at {:.0} Hz",
        config.frames,
        1.0 / driver.fixed_timestep()
    );
    runner.play(Arc::new(imported.timeline))?;
    for _ in 0..config.frames {
        if !runner.is_playing() {
            break;
        }
        driver.drive(&mut runner, config.frame_delta);
    }
    tracing::debug!(
        "Stopping at {:.3}s with {:.4}s left in the accumulator",
        runner.cursor(),
        driver.accumulated_time()
    );
    runner.stop();

    for failure in runner.failures() {
        tracing::warn!(
            "{} on '{}' ({:?} at {:.3}s): {}",
            failure.handler,
            failure.clip_name,
            failure.phase,
            failure.time,
            failure.error
        );
    }
    tracing::debug!(
        "Pools: {} audio voice(s), {} effect instance(s) created",
        services.audio().created_count(),
        services.effects().created_count()
    );

    Ok(Summary {
        stats: runner.stats(),
        steps: driver.step_count(),
        dropped_frames: driver.dropped_frames(),
        unresolved,
        services: services.log(),
    })
}
