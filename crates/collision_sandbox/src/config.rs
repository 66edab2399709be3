//! Sandbox configuration

use serde::{Deserialize, Serialize};
use tycoon_engine::config::Config;
use tycoon_engine::core::CollisionConfig;

/// Scenario settings, loadable from TOML or RON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Number of critters spawned in a row along x
    pub critter_count: u32,

    /// Ticks to simulate
    pub ticks: u32,

    /// Game time per tick
    pub delta_time: f32,

    /// Distance between neighbouring critters at spawn
    pub spacing: f32,

    /// Edge length of a critter's cubic hitbox
    pub critter_size: f32,

    /// Largest speed along x; y and z get a quarter of it
    pub max_speed: f32,

    /// Entity hits a critter survives; 0 makes critters indestructible
    pub durability: u32,

    /// Free space between the critter row and the arena walls
    pub arena_margin: f32,

    /// Seed for velocity generation
    pub seed: u64,

    /// Detector settings
    pub collision: CollisionConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            critter_count: 200,
            ticks: 600,
            delta_time: 1.0 / 60.0,
            spacing: 2.0,
            critter_size: 1.0,
            max_speed: 8.0,
            durability: 25,
            arena_margin: 10.0,
            seed: 0x5eed,
            collision: CollisionConfig::default(),
        }
    }
}

impl Config for SandboxConfig {}
