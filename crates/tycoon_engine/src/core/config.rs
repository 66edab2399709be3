//! # Engine Configuration
//!
//! Settings structs for the engine subsystems. Every struct is serde-enabled and
//! implements [`Config`], so it can be read from TOML or RON:
//!
//! ```toml
//! log_filter = "info"
//!
//! [collision]
//! insertion_sort_threshold = 256
//! parallel_resolution = true
//! parallel_pair_threshold = 64
//! check_invariants = false
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// # Collision Detection Configuration
///
/// Tuning knobs for [`crate::physics::CollisionDetection`]. None of these change which
/// pairs are found or notified, only how fast that happens and how much is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Below this entity count the axis arrays are re-sorted with insertion sort,
    /// which is linear on the nearly-sorted data produced by small per-tick motion
    pub insertion_sort_threshold: usize,
    /// Resolve candidate pairs on the rayon thread pool
    pub parallel_resolution: bool,
    /// Minimum candidate pair count before parallel resolution kicks in
    pub parallel_pair_threshold: usize,
    /// Verify the sorted-array invariants after every entity pre-update
    pub check_invariants: bool,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            insertion_sort_threshold: 256,
            parallel_resolution: true,
            parallel_pair_threshold: 64,
            check_invariants: false,
        }
    }
}

impl CollisionConfig {
    /// Sequential, self-checking configuration for tests and debugging sessions
    pub fn debug() -> Self {
        Self {
            parallel_resolution: false,
            check_invariants: true,
            ..Self::default()
        }
    }

    /// Whether `pair_count` candidate pairs should be resolved in parallel
    pub fn resolves_in_parallel(&self, pair_count: usize) -> bool {
        self.parallel_resolution && pair_count >= self.parallel_pair_threshold
    }
}

impl Config for CollisionConfig {}

/// # Engine Configuration
///
/// Top-level settings for an engine session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default `env_logger` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Collision detection settings
    pub collision: CollisionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            collision: CollisionConfig::default(),
        }
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_threshold() {
        let config = CollisionConfig::default();
        assert!(!config.resolves_in_parallel(config.parallel_pair_threshold - 1));
        assert!(config.resolves_in_parallel(config.parallel_pair_threshold));
        assert!(!CollisionConfig::debug().resolves_in_parallel(10_000));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");

        let mut config = EngineConfig::default();
        config.collision.insertion_sort_threshold = 32;
        config.collision.check_invariants = true;
        config.log_filter = "debug".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = EngineConfig::load_from_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collision.ron");
        std::fs::write(&path, "(parallel_resolution: false)").unwrap();

        let loaded = CollisionConfig::load_from_file(&path).unwrap();

        assert!(!loaded.parallel_resolution);
        assert_eq!(loaded.insertion_sort_threshold, CollisionConfig::default().insertion_sort_threshold);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collision.yaml");
        std::fs::write(&path, "parallel_resolution: false").unwrap();

        let result = CollisionConfig::load_from_file(&path);
        assert!(matches!(result, Err(crate::config::ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = EngineConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, EngineConfig::default());
    }
}
