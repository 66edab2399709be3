//! Headless sandbox driving the collision detector
//!
//! Spawns a row of critters inside a walled arena and runs the detector tick by tick.
//! Pass a `.toml` or `.ron` file as the first argument to override the defaults; set
//! `RUST_LOG=debug` for per-tick reports.

mod config;
mod critter;

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tycoon_engine::config::{Config, ConfigError};
use tycoon_engine::foundation::logging;
use tycoon_engine::foundation::math::Vec3;
use tycoon_engine::foundation::time::{SimulationClock, Stopwatch};
use tycoon_engine::physics::{
    BoundingBox, CollisionBody, CollisionDetection, CollisionError, MapMarker, ObstacleField,
    Registrar,
};

use crate::config::SandboxConfig;
use crate::critter::Critter;

/// Sandbox failures
#[derive(Error, Debug)]
enum SandboxError {
    #[error("failed to load sandbox configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("collision detection failed: {0}")]
    Collision(#[from] CollisionError),
}

/// Totals over a whole run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct RunSummary {
    ticks: u32,
    candidate_pairs: usize,
    collisions: usize,
    capped_ticks: u32,
    worn_out: usize,
}

/// Wall thickness of the arena
const WALL_THICKNESS: f32 = 1.0;

fn arena_half_extents(config: &SandboxConfig) -> Vec3 {
    #[allow(clippy::cast_precision_loss)]
    let row = config.critter_count as f32 * config.spacing * 0.5;
    Vec3::new(row + config.arena_margin, config.arena_margin, config.arena_margin)
}

/// Six walls enclosing the arena
fn build_arena(config: &SandboxConfig) -> ObstacleField {
    let half = arena_half_extents(config);
    let mut field = ObstacleField::new();
    let mut id = 0;

    for axis in 0..3 {
        let mut wall_half = half + Vec3::repeat(WALL_THICKNESS);
        wall_half[axis] = WALL_THICKNESS * 0.5;
        for side in [-1.0, 1.0] {
            let mut position = Vec3::zeros();
            position[axis] = side * (half[axis] + WALL_THICKNESS * 0.5);
            field.add_marker(MapMarker::new(id, position, BoundingBox::from_half_extents(wall_half)));
            id += 1;
        }
    }
    field
}

/// Critters in a row along x with seeded random velocities
fn spawn_critters(config: &SandboxConfig, registrar: &Registrar) -> Vec<Arc<Critter>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let speed = config.max_speed.abs();
    #[allow(clippy::cast_precision_loss)]
    let first = -(config.critter_count.saturating_sub(1) as f32) * config.spacing * 0.5;

    (0..config.critter_count)
        .map(|id| {
            #[allow(clippy::cast_precision_loss)]
            let position = Vec3::new(first + id as f32 * config.spacing, 0.0, 0.0);
            let velocity = Vec3::new(
                rng.gen_range(-speed..=speed),
                rng.gen_range(-speed..=speed) * 0.25,
                rng.gen_range(-speed..=speed) * 0.25,
            );
            let critter = Critter::new(id, config.critter_size, 0.0, position, velocity, config.durability)
                .with_registrar(registrar.clone());
            Arc::new(critter)
        })
        .collect()
}

fn run(config: &SandboxConfig) -> Result<RunSummary, SandboxError> {
    let arena = build_arena(config);
    log::info!(
        "Sandbox: {} critters, {} ticks of {:.4}, {} walls",
        config.critter_count,
        config.ticks,
        config.delta_time,
        arena.len()
    );

    let mut detection = CollisionDetection::with_world(config.collision.clone(), Box::new(arena));
    let mut critters = spawn_critters(config, &detection.registrar());
    detection.add_entities(critters.iter().map(|critter| Arc::clone(critter) as Arc<dyn CollisionBody>))?;

    let mut clock = SimulationClock::new(0.0, config.delta_time);
    let mut stopwatch = Stopwatch::new();
    let mut summary = RunSummary::default();

    for _ in 0..config.ticks {
        let time = clock.time();

        stopwatch.start();
        detection.pre_update_entities(time)?;
        let report = detection.analyse_collisions(time, clock.delta_time())?;
        stopwatch.stop();

        // Worn-out critters have already unregistered themselves
        let before = critters.len();
        critters.retain(|critter| !critter.is_disposed());

        summary.ticks += 1;
        summary.candidate_pairs += report.candidate_pairs;
        summary.collisions += report.collisions;
        summary.worn_out += before - critters.len();
        if report.iterations == tycoon_engine::physics::MAX_COLLISION_ITERATIONS {
            summary.capped_ticks += 1;
        }
        log::debug!(
            "tick {} t={time:.3}: {} candidates, {} collisions in {} passes, {} critters left",
            clock.tick(),
            report.candidate_pairs,
            report.collisions,
            report.iterations,
            critters.len()
        );

        clock.advance();
    }

    log::info!(
        "Sandbox finished: {summary:?}, {:.2} ms in collision detection",
        stopwatch.elapsed_millis()
    );
    detection.cleanup();
    Ok(summary)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading sandbox configuration from {path}");
            SandboxConfig::load_from_file(path).map_err(SandboxError::from)?
        }
        None => SandboxConfig::default(),
    };

    match run(&config) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Sandbox error: {e}");
            Err(e.into())
        }
    }
}
