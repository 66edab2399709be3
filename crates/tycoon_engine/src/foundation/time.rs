//! Time management utilities
//!
//! The simulation runs on a fixed-step clock in game time, independent of wall time.
//! [`Stopwatch`] measures wall time spent inside a tick for profiling.

use std::time::{Duration, Instant};

/// Fixed-step game clock driving `pre_update` / `analyse` ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationClock {
    start_time: f32,
    time: f32,
    delta_time: f32,
    tick: u64,
}

impl SimulationClock {
    /// Create a clock starting at `start_time` advancing `delta_time` per tick
    pub fn new(start_time: f32, delta_time: f32) -> Self {
        Self {
            start_time,
            time: start_time,
            delta_time,
            tick: 0,
        }
    }

    /// Game time at the start of the current tick
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Length of one tick in game time
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance to the next tick
    pub fn advance(&mut self) {
        self.tick += 1;
        #[allow(clippy::cast_precision_loss)]
        let elapsed = self.tick as f32 * self.delta_time;
        // Recompute from the tick count so error does not accumulate
        self.time = self.start_time + elapsed;
    }
}

/// Simple stopwatch for measuring elapsed time
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}
