//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (level layout)
//! - Stable iteration order (arena index)
//! - No rendering or platform dependencies

pub mod collision;
pub mod editor;
pub mod grid;
pub mod motion;
pub mod shape;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, ball_ellipse_collision, ball_polygon_collision, resolve_pair};
pub use editor::EditError;
pub use grid::SpatialGrid;
pub use shape::BrickShape;
pub use state::{
    Ball, Brick, DEFAULT_SEED, Entity, EntityVisitor, GamePhase, Paddle, PaddleDir, Powerup, PowerupKind,
    SimContext, Simulation,
};
pub use tick::{TickInput, launch_ball, tick};
