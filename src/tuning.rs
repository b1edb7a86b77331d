//! Game balance and simulation tuning
//!
//! Loaded from JSON separately from save files. A save never carries its
//! tuning; the loader supplies one.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Finest broad-phase cell a tuning file may ask for
const MIN_CELL_SIZE: f32 = 1.0;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Starting lives for this preset
    pub fn lives(&self) -> u32 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => STARTING_LIVES,
            Difficulty::Hard => 1,
        }
    }

    /// Multiplier applied to base speed and speed step
    pub fn speed_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.25,
        }
    }
}

/// Simulation tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Ball ===
    /// Ball speed before any bonus (pixels/s)
    pub base_speed: f32,
    /// Bonus speed added per speed step
    pub speed_step: f32,
    /// Bounces needed for one speed step
    pub bounces_per_step: u32,

    // === Paddle ===
    /// Horizontal paddle speed (pixels/s)
    pub paddle_speed: f32,

    // === Power-ups ===
    /// Fall speed as a fraction of the global ball speed
    pub powerup_drift: f32,

    // === Rules ===
    pub starting_lives: u32,
    pub brick_score: u64,

    // === Engine ===
    /// Broad-phase cell size; keep it at least as large as a ball's bounding box
    pub cell_size: f32,
    /// Fixed timestep used by drivers
    pub dt: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: BALL_BASE_SPEED,
            speed_step: SPEED_STEP,
            bounces_per_step: BOUNCES_PER_SPEED_STEP,

            paddle_speed: PADDLE_SPEED,

            powerup_drift: POWERUP_DRIFT,

            starting_lives: STARTING_LIVES,
            brick_score: BRICK_SCORE,

            cell_size: GRID_CELL_SIZE,
            dt: SIM_DT,
        }
    }
}

impl Tuning {
    /// Create tuning from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let scale = difficulty.speed_scale();
        let defaults = Self::default();
        Self {
            base_speed: defaults.base_speed * scale,
            speed_step: defaults.speed_step * scale,
            starting_lives: difficulty.lives(),
            ..defaults
        }
    }

    /// Slowest the global ball speed may drop (slow-ball power-ups)
    pub fn min_speed(&self) -> f32 {
        self.base_speed * 0.5
    }

    /// Load tuning from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Tuning>(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.display());
                    tuning.sanitized()
                }
                Err(e) => {
                    log::warn!("Malformed tuning file {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {} - using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write tuning as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Tuning saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Replace values the engine cannot run with by their defaults
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.cell_size.is_finite() && self.cell_size >= MIN_CELL_SIZE) {
            log::warn!("Invalid cell_size {} - using {}", self.cell_size, defaults.cell_size);
            self.cell_size = defaults.cell_size;
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            log::warn!("Invalid dt {} - using {}", self.dt, defaults.dt);
            self.dt = defaults.dt;
        }
        if self.bounces_per_step == 0 {
            self.bounces_per_step = defaults.bounces_per_step;
        }
        self
    }
}
