//! Starglider - arcade space flight between planets and landing platforms.
//!
//! Headless driver: builds the scene, flies the ship through the scripted
//! maneuvers in `config.ron` and logs the debug panel.

mod chase_camera;
mod config;
mod controller;
mod flight;
mod gravity;
mod scene;
mod script;
mod sim;
mod telemetry;

use anyhow::{Context, Result};

use config::GameConfig;
use sim::Simulation;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load();
    if std::env::args().any(|arg| arg == "--write-config") {
        config.save();
        log::info!("Wrote config.ron with current settings");
        return Ok(());
    }

    log::info!("Starting Starglider ({} s scripted flight)", config.sim_seconds);
    let mut sim = Simulation::new(&config).context("failed to build the simulation")?;
    sim.run();

    Ok(())
}
