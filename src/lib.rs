//! Bricked - a brick-breaker arena simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (broad-phase grid, motion, collisions, game state)
//! - `persistence`: Text save/load of the full simulation state
//! - `tuning`: Data-driven game balance

pub mod persistence;
pub mod sim;
pub mod tuning;

pub use tuning::{Difficulty, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (the driver runs at ~60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 16.0;
    pub const BALL_BASE_SPEED: f32 = 200.0;
    /// Speed added each time the bounce counter rolls over
    pub const SPEED_STEP: f32 = 50.0;
    pub const BOUNCES_PER_SPEED_STEP: u32 = 4;

    /// Paddle ellipse footprint (full width/height)
    pub const PADDLE_WIDTH: f32 = 112.0;
    pub const PADDLE_HEIGHT: f32 = 60.0;
    pub const PADDLE_SPEED: f32 = 200.0;
    /// Distance from the bottom of the field to the paddle center
    pub const PADDLE_BOTTOM_OFFSET: f32 = 56.0;

    /// Rectangular brick footprint
    pub const RECT_BRICK_WIDTH: f32 = 48.0;
    pub const RECT_BRICK_HEIGHT: f32 = 24.0;
    /// Circumradius of the hexagonal brick
    pub const HEX_BRICK_RADIUS: f32 = 20.0;
    pub const MAX_DURABILITY: u32 = 5;

    /// Power-up pickup radius (16px sprite)
    pub const POWERUP_RADIUS: f32 = 8.0;
    /// Power-ups fall at this fraction of the global ball speed
    pub const POWERUP_DRIFT: f32 = 0.1;

    pub const STARTING_LIVES: u32 = 3;
    pub const BRICK_SCORE: u64 = 100;

    /// Broad-phase cell size
    pub const GRID_CELL_SIZE: f32 = 64.0;
    /// Largest playfield side a save may declare
    pub const MAX_FIELD_SIZE: f32 = 16_384.0;
}
