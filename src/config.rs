use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_RANDOM_CHANCE, DEFAULT_TICK_LIMIT, DOT_SPEED, LOOKAHEAD_DEPTH, LOOKAHEAD_RADIUS,
    MAX_DOTS, MAX_LOOKAHEAD_DEPTH, MAX_LOOKAHEAD_RADIUS, MIN_MOTION, PANIC_DISTANCE, PLAYER_DISTANCE_WEIGHT,
    SPACING_WEIGHT, SPAWN_MAX_ATTEMPTS, SPAWN_MIN_DISTANCE_CELLS, STUCK_PATIENCE_FRAMES,
    STUCK_RANDOM_CHANCE,
};
use crate::error::ConfigError;
use crate::types::ScoringVariant;

/// Knobs for dot spawning and per-frame move selection.
///
/// Missing fields in a JSON config fall back to [`DotTuning::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DotTuning {
    pub max_dots: usize,
    pub speed: f32,
    pub min_motion: f32,
    pub patience_frames: u32,
    pub base_random_chance: f32,
    pub stuck_random_chance: f32,
    pub panic_distance: f32,
    pub lookahead_depth: u32,
    pub lookahead_radius: f32,
    pub player_distance_weight: f32,
    pub spacing_weight: f32,
    pub scoring: ScoringVariant,
    pub anti_oscillation: bool,
    pub spawn_min_distance_cells: f32,
    pub spawn_max_attempts: u32,
}

impl Default for DotTuning {
    fn default() -> Self {
        Self {
            max_dots: MAX_DOTS,
            speed: DOT_SPEED,
            min_motion: MIN_MOTION,
            patience_frames: STUCK_PATIENCE_FRAMES,
            base_random_chance: BASE_RANDOM_CHANCE,
            stuck_random_chance: STUCK_RANDOM_CHANCE,
            panic_distance: PANIC_DISTANCE,
            lookahead_depth: LOOKAHEAD_DEPTH,
            lookahead_radius: LOOKAHEAD_RADIUS,
            player_distance_weight: PLAYER_DISTANCE_WEIGHT,
            spacing_weight: SPACING_WEIGHT,
            scoring: ScoringVariant::OpenSpace,
            anti_oscillation: true,
            spawn_min_distance_cells: SPAWN_MIN_DISTANCE_CELLS,
            spawn_max_attempts: SPAWN_MAX_ATTEMPTS,
        }
    }
}

impl DotTuning {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let tuning: DotTuning = serde_json::from_str(raw)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dots == 0 {
            return Err(invalid("maxDots", "must be at least 1"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid("speed", format!("must be positive, got {}", self.speed)));
        }
        if !(0.0..=MAX_LOOKAHEAD_RADIUS).contains(&self.lookahead_radius) {
            return Err(invalid(
                "lookaheadRadius",
                format!(
                    "must be within 0..={MAX_LOOKAHEAD_RADIUS}, got {}",
                    self.lookahead_radius
                ),
            ));
        }
        if self.lookahead_depth > MAX_LOOKAHEAD_DEPTH {
            return Err(invalid(
                "lookaheadDepth",
                format!(
                    "{} exceeds the limit of {MAX_LOOKAHEAD_DEPTH}",
                    self.lookahead_depth
                ),
            ));
        }
        for (field, chance) in [
            ("baseRandomChance", self.base_random_chance),
            ("stuckRandomChance", self.stuck_random_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(field, format!("{chance} is not a probability")));
            }
        }
        if self.spawn_max_attempts == 0 {
            return Err(invalid("spawnMaxAttempts", "must be at least 1"));
        }
        if self.spawn_min_distance_cells < 0.0 {
            return Err(invalid("spawnMinDistanceCells", "must be non-negative"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Clone, Debug)]
pub struct GameEngineOptions {
    pub tick_limit: u64,
    pub tuning: DotTuning,
}

impl Default for GameEngineOptions {
    fn default() -> Self {
        Self {
            tick_limit: DEFAULT_TICK_LIMIT,
            tuning: DotTuning::default(),
        }
    }
}
