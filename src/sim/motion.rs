//! Per-entity motion integration
//!
//! Each entity moves, applies its bounds rules, then registers its new
//! bounding box in the broad-phase grid in the same pass.

use super::grid::SpatialGrid;
use super::state::{Ball, Entity, Paddle, Powerup, SimContext};
use crate::consts::POWERUP_RADIUS;

/// Advance one arena slot by `dt` and re-register it in the grid
pub fn integrate(entity: &mut Entity, id: usize, ctx: &mut SimContext, grid: &mut SpatialGrid, dt: f32) {
    match entity {
        Entity::Ball(ball) => move_ball(ball, ctx, dt),
        Entity::Paddle(paddle) => move_paddle(paddle, ctx, dt),
        Entity::Powerup(powerup) => move_powerup(powerup, ctx, dt),
        // Stationary
        Entity::Brick(_) => {}
    }

    if entity.is_active() {
        let (min, max) = entity.aabb();
        grid.insert(min, max, id);
    }
}

/// Renormalize to the global speed, move, then bounce off the left/right/top walls.
/// Crossing the bottom edge kills the ball.
pub fn move_ball(ball: &mut Ball, ctx: &mut SimContext, dt: f32) {
    if !ball.alive {
        return;
    }

    // A zero velocity stays zero until something launches the ball
    if let Some(dir) = ball.vel.try_normalize() {
        ball.vel = dir * ctx.speed();
    }
    ball.pos += ball.vel * dt;

    let r = ball.radius;
    if ball.pos.x - r < 0.0 {
        ball.pos.x = r;
        ball.vel.x = ball.vel.x.abs();
        ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    }
    if ball.pos.x + r > ctx.width {
        ball.pos.x = ctx.width - r;
        ball.vel.x = -ball.vel.x.abs();
        ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    }
    if ball.pos.y - r < 0.0 {
        ball.pos.y = r;
        ball.vel.y = ball.vel.y.abs();
        ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    }
    if ball.pos.y - r >= ctx.height {
        ball.alive = false;
        ctx.ball_count = ctx.ball_count.saturating_sub(1);
        log::debug!("Ball lost at x={:.1}, {} left in play", ball.pos.x, ctx.ball_count);
    }
}

/// Slide by the input direction, then keep the ellipse inside the field
pub fn move_paddle(paddle: &mut Paddle, ctx: &SimContext, dt: f32) {
    paddle.pos.x += paddle.dir.sign() * ctx.tuning.paddle_speed * dt;

    // max-then-min rather than clamp: a field narrower than the paddle must not panic
    let half = paddle.half_size;
    paddle.pos.x = paddle.pos.x.max(half.x).min(ctx.width - half.x);
    paddle.pos.y = paddle.pos.y.max(half.y).min(ctx.height - half.y);
}

/// Drift downward at a fraction of the global speed; gone once below the field
pub fn move_powerup(powerup: &mut Powerup, ctx: &SimContext, dt: f32) {
    if !powerup.alive {
        return;
    }
    powerup.pos.y += ctx.tuning.powerup_drift * ctx.speed() * dt;
    if powerup.pos.y - POWERUP_RADIUS > ctx.height {
        powerup.alive = false;
    }
}
