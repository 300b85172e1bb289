//! Game configuration (tick rate, world, ship, flight and camera tuning). Loaded from config.ron at startup.

use serde::{Deserialize, Serialize};

use crate::chase_camera::CameraTuning;
use crate::flight::FlightTuning;
use crate::script::ManeuverSegment;

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Fixed simulation rate in Hz.
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f64,
    /// How long the headless run lasts, in simulated seconds.
    #[serde(default = "default_sim_seconds")]
    pub sim_seconds: f32,
    /// Pace ticks against the wall clock instead of running flat out.
    #[serde(default)]
    pub realtime: bool,
    /// Log the debug panel every this many ticks (0 = never).
    #[serde(default = "default_telemetry_interval")]
    pub telemetry_interval_ticks: u32,
    /// Draw the full bounds cube in the overlay.
    #[serde(default)]
    pub show_debug_bounds: bool,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub ship: ShipConfig,
    #[serde(default)]
    pub flight: FlightTuning,
    #[serde(default)]
    pub camera: CameraTuning,
    /// Scripted maneuvers flown by the headless driver.
    #[serde(default = "default_script")]
    pub script: Vec<ManeuverSegment>,
}

fn default_tick_rate() -> f64 {
    50.0
}
fn default_sim_seconds() -> f32 {
    30.0
}
fn default_telemetry_interval() -> u32 {
    50
}

fn default_script() -> Vec<ManeuverSegment> {
    vec![
        // Settle onto the spawn platform.
        ManeuverSegment::idle(2.0),
        ManeuverSegment {
            seconds: 1.5,
            thrust: 1.0,
            forward: 1.0,
            ..ManeuverSegment::idle(0.0)
        },
        ManeuverSegment {
            seconds: 5.0,
            thrust: 1.0,
            ..ManeuverSegment::idle(0.0)
        },
        ManeuverSegment {
            seconds: 3.0,
            thrust: 1.0,
            lateral: 1.0,
            ..ManeuverSegment::idle(0.0)
        },
        ManeuverSegment {
            seconds: 4.0,
            toggle_camera: true,
            ..ManeuverSegment::idle(0.0)
        },
        ManeuverSegment {
            seconds: 3.0,
            brake: 1.0,
            toggle_camera: true,
            ..ManeuverSegment::idle(0.0)
        },
    ]
}

/// Play volume and static scene layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the bounds reference wall; the cube's half extent is half of this.
    pub bounds_reference_scale: f32,
    pub platform_count: u32,
    /// Full size of a landing platform.
    pub platform_size: [f32; 3],
    pub planet_count: u32,
    /// Planet radius before the per-planet random scale.
    pub planet_radius: f32,
    /// Seed for the scene layout.
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds_reference_scale: 1200.0,
            platform_count: 16,
            platform_size: [40.0, 2.0, 40.0],
            planet_count: 16,
            planet_radius: 40.0,
            seed: 0x5747,
        }
    }
}

/// Player ship body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub spawn: [f32; 3],
    pub mass: f32,
    /// Principal inertia about the local right, up and back axes.
    pub inertia: [f32; 3],
    /// Capsule half length along the ship's long axis.
    pub half_length: f32,
    /// Capsule radius, also the ship's half height when resting on a platform.
    pub radius: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            // Just above the first platform ring.
            spawn: [300.0, 204.0, 0.0],
            mass: 1.0,
            inertia: [0.6, 0.7, 0.3],
            half_length: 1.5,
            radius: 1.0,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
            sim_seconds: default_sim_seconds(),
            realtime: false,
            telemetry_interval_ticks: default_telemetry_interval(),
            show_debug_bounds: false,
            world: WorldConfig::default(),
            ship: ShipConfig::default(),
            flight: FlightTuning::default(),
            camera: CameraTuning::default(),
            script: default_script(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        let path = config_path();
        if let Ok(data) = std::fs::read_to_string(&path) {
            match Self::from_ron(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        let path = config_path();
        if let Ok(s) = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            if let Err(e) = std::fs::write(&path, s) {
                log::warn!("Could not write config to {:?}: {}", path, e);
            }
        }
    }
}

fn config_path() -> std::path::PathBuf {
    std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from(".")).join("config.ron")
}
