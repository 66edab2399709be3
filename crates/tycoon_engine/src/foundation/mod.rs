//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Simulation time and profiling
//! - Logging utilities

pub mod math;
pub mod time;
pub mod logging;
