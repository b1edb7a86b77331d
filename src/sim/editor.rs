//! Editor-mode brick commands
//!
//! These run between ticks, never during one. Every command keeps the
//! level valid: no brick overlaps another and every footprint stays inside
//! the field. Ids are arena indices and are only valid until the next tick
//! or the next removal.

use glam::Vec2;
use thiserror::Error;

use super::shape::{self, BrickShape};
use super::state::{Brick, Entity, PowerupKind, Simulation, brick_in_bounds, brick_overlaps_others};
use crate::consts::MAX_DURABILITY;

/// Why an editor command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("brick would overlap another brick")]
    Overlap,
    #[error("brick footprint would leave the field")]
    OutOfBounds,
    #[error("no brick with id {0}")]
    NotFound(usize),
}

impl Simulation {
    /// Live brick with this id
    pub fn brick(&self, id: usize) -> Option<&Brick> {
        match self.entities.get(id) {
            Some(Entity::Brick(brick)) if brick.durability > 0 => Some(brick),
            _ => None,
        }
    }

    fn brick_mut(&mut self, id: usize) -> Result<&mut Brick, EditError> {
        match self.entities.get_mut(id) {
            Some(Entity::Brick(brick)) if brick.durability > 0 => Ok(brick),
            _ => Err(EditError::NotFound(id)),
        }
    }

    /// Id of the live brick whose footprint contains `point`
    pub fn brick_at(&self, point: Vec2) -> Option<usize> {
        self.grid
            .query(point, point)
            .into_iter()
            .find(|&id| self.brick(id).is_some_and(|brick| shape::contains_point(&brick.vertices(), point)))
    }

    fn check_footprint(&self, shape: BrickShape, pos: Vec2, skip: Option<usize>) -> Result<(), EditError> {
        if !brick_in_bounds(shape, pos, self.ctx.width, self.ctx.height) {
            return Err(EditError::OutOfBounds);
        }
        if brick_overlaps_others(&self.entities, shape, pos, skip) {
            return Err(EditError::Overlap);
        }
        Ok(())
    }

    /// Add a brick; durability is clamped to `1..=MAX_DURABILITY`
    pub fn place_brick(&mut self, pos: Vec2, shape: BrickShape, durability: u32) -> Result<usize, EditError> {
        if let Err(e) = self.check_footprint(shape, pos, None) {
            log::warn!("Rejected brick placement at ({:.0}, {:.0}): {}", pos.x, pos.y, e);
            return Err(e);
        }
        let id = self.push_brick(Brick::new(pos, shape, durability.clamp(1, MAX_DURABILITY)));
        self.rebuild_grid();
        Ok(id)
    }

    /// Delete a brick. Ids above `id` shift down by one.
    pub fn remove_brick(&mut self, id: usize) -> Result<Brick, EditError> {
        self.brick_mut(id)?;
        let Entity::Brick(brick) = self.entities.remove(id) else {
            return Err(EditError::NotFound(id));
        };
        self.ctx.brick_count = self.ctx.brick_count.saturating_sub(1);
        self.rebuild_grid();
        Ok(brick)
    }

    /// Move a brick, checked against every other brick's current footprint
    pub fn move_brick(&mut self, id: usize, pos: Vec2) -> Result<(), EditError> {
        let shape = self.brick_mut(id)?.shape;
        if let Err(e) = self.check_footprint(shape, pos, Some(id)) {
            log::warn!("Rejected brick move to ({:.0}, {:.0}): {}", pos.x, pos.y, e);
            return Err(e);
        }
        self.brick_mut(id)?.pos = pos;
        self.rebuild_grid();
        Ok(())
    }

    /// Attach or clear the power-up a brick releases when destroyed
    pub fn set_brick_powerup(&mut self, id: usize, powerup: Option<PowerupKind>) -> Result<(), EditError> {
        self.brick_mut(id)?.powerup = powerup;
        Ok(())
    }
}
