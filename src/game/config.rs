//! Per-game configuration

use crate::game::VerbosityLevel;
use serde::{Deserialize, Serialize};

/// Tunables for one game session
///
/// Built with `GameConfig::default()` plus the `with_*` methods:
///
/// ```ignore
/// let config = GameConfig::default().with_seed(42).with_starting_life(30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub starting_life: i32,
    /// Stack entries resolved per `resolve_if_ready` call
    pub max_auto_resolve: usize,
    pub max_hand_size: usize,
    /// The player who starts does not draw on turn 1
    pub skip_first_draw: bool,
    /// Nesting limit for computed ability expansion
    pub computed_depth_limit: usize,
    /// Seed for library shuffles
    pub seed: u64,
    pub verbosity: VerbosityLevel,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_life: 20,
            max_auto_resolve: 100,
            max_hand_size: 7,
            skip_first_draw: false,
            computed_depth_limit: 8,
            seed: 0,
            verbosity: VerbosityLevel::default(),
        }
    }
}

impl GameConfig {
    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }

    pub fn with_max_auto_resolve(mut self, max: usize) -> Self {
        self.max_auto_resolve = max;
        self
    }

    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    pub fn with_skip_first_draw(mut self, skip: bool) -> Self {
        self.skip_first_draw = skip;
        self
    }

    pub fn with_computed_depth_limit(mut self, limit: usize) -> Self {
        self.computed_depth_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.verbosity = verbosity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.starting_life, 20);
        assert_eq!(config.max_auto_resolve, 100);
        assert_eq!(config.max_hand_size, 7);
        assert!(!config.skip_first_draw);
    }

    #[test]
    fn test_builder_and_json_round_trip() {
        let config = GameConfig::default()
            .with_seed(7)
            .with_max_auto_resolve(3)
            .with_skip_first_draw(true);
        let json = serde_json::to_string(&config).unwrap();
        let back: GameConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.seed, 7);
    }
}
