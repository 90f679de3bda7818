// app/mod.rs
// Headless driver: config loading, simulation thread and command cadence

use std::io::ErrorKind;
use std::thread;
use std::time::Duration;

use crate::commands::SimCommand;
use crate::error::{Result, SimError};
use crate::init_config::{InitConfig, DEFAULT_CONFIG_PATH};
use crate::simulation::Simulation;

pub mod simulation_loop;

pub use simulation_loop::{FrameSnapshot, SharedFrame};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Headless entry point: run the simulation on its own thread and act as
/// the outside collaborator that reads frames and sends commands.
pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let run = config.run.clone();
    let simulation = Simulation::new(config.simulation)?;
    let commands = simulation.command_sender();
    let shared = SharedFrame::default();

    let handle = thread::Builder::new().name("simulation".into()).spawn({
        let shared = shared.clone();
        let run = run.clone();
        move || simulation_loop::run_simulation_loop(simulation, &run, &shared)
    })?;

    let cadence = run.regenerate_every.filter(|&n| n > 0);
    let mut next_regen = cadence.unwrap_or(u64::MAX);
    while !handle.is_finished() {
        thread::sleep(POLL_INTERVAL);
        let Some(every) = cadence else { continue };
        let frame = shared.frame();
        if frame >= next_regen {
            if commands.send(SimCommand::RegenerateRules).is_err() {
                break;
            }
            next_regen = (frame / every + 1) * every;
        }
    }

    handle
        .join()
        .map_err(|_| SimError::SimulationThread("simulation thread panicked".into()))?;

    let last = shared.snapshot();
    log::info!(
        "last published frame {}: {} bodies in {}x{}",
        last.frame,
        last.bodies.len(),
        last.bounds.0,
        last.bounds.1
    );
    Ok(())
}

/// Config path from the first CLI argument, else `particle_life.toml`,
/// else built-in defaults.
fn load_config() -> Result<InitConfig> {
    if let Some(path) = std::env::args().nth(1) {
        log::info!("loading configuration from {path}");
        return InitConfig::load_from_file(path);
    }
    match InitConfig::load_default() {
        Ok(config) => {
            log::info!("loaded configuration from {DEFAULT_CONFIG_PATH}");
            Ok(config)
        }
        Err(SimError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            log::info!("{DEFAULT_CONFIG_PATH} not found, using defaults");
            Ok(InitConfig::default())
        }
        Err(e) => Err(e),
    }
}
