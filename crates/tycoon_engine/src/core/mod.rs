//! # Core Engine Module
//!
//! Shared configuration for the engine subsystems.
//!
//! ## Organization
//!
//! - **Config**: Typed settings for each subsystem, loadable through [`crate::config::Config`]

pub mod config;

pub use config::{CollisionConfig, EngineConfig};
pub use crate::config::{Config, ConfigError};
