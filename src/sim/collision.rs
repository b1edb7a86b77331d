//! Narrow-phase collision detection and response
//!
//! Geometry tests return a `CollisionResult`; the per-pair handlers apply
//! the response and update the shared counters. Every handler is a no-op
//! when either side is already inactive, so entities removed earlier in the
//! same tick cannot produce phantom hits.

use glam::Vec2;

use super::shape;
use super::state::{Ball, Brick, Entity, Paddle, Powerup, PowerupKind, SimContext, Spawn};
use crate::consts::POWERUP_RADIUS;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit normal pointing from the obstacle toward the ball
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Circle vs convex polygon by separating axes
///
/// Tests every edge normal plus the axis from the circle center to the
/// nearest vertex; without that extra axis a circle near a corner would be
/// reported as overlapping. The axis of least penetration becomes the
/// contact normal. Zero penetration (exactly tangent) counts as a miss.
pub fn ball_polygon_collision(center: Vec2, radius: f32, vertices: &[Vec2]) -> CollisionResult {
    let Some(nearest) = shape::nearest_vertex(vertices, center) else {
        return CollisionResult::miss();
    };
    // Center sitting on a vertex leaves only the face normals
    let corner_axis = (nearest - center).try_normalize();

    let mut best = CollisionResult::miss();
    best.penetration = f32::INFINITY;

    for axis in shape::edge_normals(vertices).chain(corner_axis) {
        let (lo, hi) = shape::project(vertices, axis);
        let p = center.dot(axis);
        let (c_lo, c_hi) = (p - radius, p + radius);

        if lo > c_hi || hi < c_lo {
            return CollisionResult::miss();
        }

        // Distance the circle must travel along +axis or -axis to clear the polygon
        let push_pos = hi - c_lo;
        let push_neg = c_hi - lo;
        let (depth, normal) = if push_pos <= push_neg {
            (push_pos, axis)
        } else {
            (push_neg, -axis)
        };

        if depth < best.penetration {
            best.penetration = depth;
            best.normal = normal;
        }
    }

    if best.penetration <= 0.0 || !best.penetration.is_finite() {
        return CollisionResult::miss();
    }
    best.hit = true;
    best
}

/// Circle vs ellipse, approximated
///
/// The ellipse radius along the center-to-center direction is taken as the
/// length of that unit direction scaled by the semi-axes. This is not the
/// exact circle/ellipse intersection; it gives a bounce whose response
/// follows the projected radius, which is what the paddle needs.
pub fn ball_ellipse_collision(center: Vec2, radius: f32, ellipse_center: Vec2, semi_axes: Vec2) -> CollisionResult {
    let delta = center - ellipse_center;
    let Some(dir) = delta.try_normalize() else {
        return CollisionResult::miss();
    };
    let projected = (dir * semi_axes).length();
    let penetration = radius + projected - delta.length();
    if penetration <= 0.0 {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        normal: dir,
        penetration,
    }
}

/// Keep the tangential part and send the normal part along `normal`
///
/// Equivalent to a mirror reflection when the ball is moving into the
/// surface; a ball already leaving keeps its velocity.
#[inline]
pub fn reflect_outward(velocity: Vec2, normal: Vec2) -> Vec2 {
    let v_n = normal * velocity.dot(normal);
    let v_t = velocity - v_n;
    v_t + normal * v_n.length()
}

/// Dispatch one candidate pair to its handler. Returns true if they collided.
pub fn resolve_pair(a: &mut Entity, b: &mut Entity, ctx: &mut SimContext) -> bool {
    match (a, b) {
        (Entity::Ball(ball), Entity::Brick(brick)) | (Entity::Brick(brick), Entity::Ball(ball)) => {
            ball_brick(ball, brick, ctx)
        }
        (Entity::Ball(first), Entity::Ball(second)) => ball_ball(first, second, ctx),
        (Entity::Ball(ball), Entity::Paddle(paddle)) | (Entity::Paddle(paddle), Entity::Ball(ball)) => {
            ball_paddle(ball, paddle, ctx)
        }
        (Entity::Ball(ball), Entity::Powerup(powerup)) | (Entity::Powerup(powerup), Entity::Ball(ball)) => {
            ball_powerup(ball, powerup, ctx)
        }
        // Bricks, power-ups and the paddle never interact with each other
        _ => false,
    }
}

pub fn ball_brick(ball: &mut Ball, brick: &mut Brick, ctx: &mut SimContext) -> bool {
    if !ball.alive || brick.durability == 0 {
        return false;
    }

    let result = ball_polygon_collision(ball.pos, ball.radius, &brick.vertices());
    if !result.hit {
        return false;
    }

    brick.last_hit = Some(ctx.tick);
    brick.durability -= 1;
    if brick.durability == 0 {
        ctx.brick_count = ctx.brick_count.saturating_sub(1);
        ctx.score = ctx.score.saturating_add(ctx.tuning.brick_score);
        ctx.combo = ctx.combo.saturating_add(1);
        if let Some(kind) = brick.powerup {
            ctx.spawns.push(Spawn::Powerup { pos: brick.pos, kind });
        }
        log::debug!(
            "Brick destroyed at ({:.0}, {:.0}), {} left, combo {}",
            brick.pos.x,
            brick.pos.y,
            ctx.brick_count,
            ctx.combo
        );
    }

    ball.pos += result.normal * result.penetration;
    ball.vel = reflect_outward(ball.vel, result.normal);
    ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    true
}

/// Equal-mass elastic collision: separate symmetrically and swap normal velocities
pub fn ball_ball(first: &mut Ball, second: &mut Ball, ctx: &mut SimContext) -> bool {
    if !first.alive || !second.alive {
        return false;
    }

    let delta = first.pos - second.pos;
    let dist = delta.length();
    let reach = first.radius + second.radius;
    if dist >= reach {
        return false;
    }
    // Coincident centers have no separating direction
    let Some(n) = delta.try_normalize() else {
        return false;
    };

    let correction = n * ((reach - dist) / 2.0);
    first.pos += correction;
    second.pos -= correction;

    let first_n = n * first.vel.dot(n);
    let second_n = n * second.vel.dot(n);
    first.vel = first.vel - first_n + second_n;
    second.vel = second.vel - second_n + first_n;

    ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    true
}

pub fn ball_paddle(ball: &mut Ball, paddle: &Paddle, ctx: &mut SimContext) -> bool {
    if !ball.alive {
        return false;
    }

    let result = ball_ellipse_collision(ball.pos, ball.radius, paddle.pos, paddle.half_size);
    if !result.hit {
        return false;
    }

    ball.pos += result.normal * result.penetration;
    ball.vel = reflect_outward(ball.vel, result.normal);
    ctx.bounce_count = ctx.bounce_count.saturating_add(1);
    ctx.combo = 0;
    true
}

/// A live ball touching a power-up consumes it
pub fn ball_powerup(ball: &Ball, powerup: &mut Powerup, ctx: &mut SimContext) -> bool {
    if !ball.alive || !powerup.alive {
        return false;
    }
    if ball.pos.distance(powerup.pos) >= ball.radius + POWERUP_RADIUS {
        return false;
    }

    powerup.alive = false;
    apply_powerup(powerup.kind, ctx);
    true
}

/// Apply a consumed power-up's effect
pub fn apply_powerup(kind: PowerupKind, ctx: &mut SimContext) {
    match kind {
        PowerupKind::SlowBall => {
            let floor = ctx.tuning.min_speed() - ctx.tuning.base_speed;
            ctx.bonus_speed = (ctx.bonus_speed - ctx.tuning.speed_step).max(floor);
        }
        PowerupKind::FastBall => ctx.bonus_speed += ctx.tuning.speed_step,
        PowerupKind::ExtraBall => ctx.spawns.push(Spawn::LaunchedBall),
        PowerupKind::ExtraLife => ctx.lives = ctx.lives.saturating_add(1),
        PowerupKind::SmallBall | PowerupKind::BigBall | PowerupKind::StrongBall => {
            log::debug!("Power-up {:?} has no effect", kind);
            return;
        }
    }
    log::debug!("Power-up {:?} applied", kind);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::shape::BrickShape;
    use crate::tuning::Tuning;

    fn ctx() -> SimContext {
        let mut ctx = SimContext::new(300.0, 300.0, Tuning::default());
        ctx.brick_count = 1;
        ctx.ball_count = 2;
        ctx
    }

    fn rect_brick(durability: u32) -> Brick {
        Brick::new(Vec2::new(100.0, 100.0), BrickShape::Rect, durability)
    }

    #[test]
    fn test_polygon_face_hit() {
        let rect = BrickShape::Rect.vertices_at(Vec2::ZERO);
        // Ball just below the bottom face, overlapping by 2
        let center = Vec2::new(0.0, RECT_BRICK_HEIGHT / 2.0 + 8.0);
        let result = ball_polygon_collision(center, 10.0, &rect);
        assert!(result.hit);
        assert!((result.normal - Vec2::Y).length() < 1e-5);
        assert!((result.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_polygon_corner_needs_extra_axis() {
        let rect = BrickShape::Rect.vertices_at(Vec2::ZERO);
        let corner = Vec2::new(RECT_BRICK_WIDTH / 2.0, RECT_BRICK_HEIGHT / 2.0);
        // Diagonally off the corner: face projections overlap, the circle does not
        let center = corner + Vec2::splat(8.0);
        assert!(!ball_polygon_collision(center, 10.0, &rect).hit);
        // Closer in, it does
        let center = corner + Vec2::splat(6.0);
        let result = ball_polygon_collision(center, 10.0, &rect);
        assert!(result.hit);
        assert!(result.normal.x > 0.0 && result.normal.y > 0.0);
    }

    #[test]
    fn test_polygon_tangent_is_miss() {
        let rect = BrickShape::Rect.vertices_at(Vec2::ZERO);
        let center = Vec2::new(0.0, RECT_BRICK_HEIGHT / 2.0 + 10.0);
        assert!(!ball_polygon_collision(center, 10.0, &rect).hit);
    }

    #[test]
    fn test_tangent_ball_leaves_brick_untouched() {
        let mut ctx = ctx();
        let mut brick = rect_brick(2);
        // Resting exactly on the bottom face
        let mut ball = Ball::new(Vec2::new(100.0, 100.0 + RECT_BRICK_HEIGHT / 2.0 + BALL_RADIUS), Vec2::new(30.0, -200.0));
        let (ball_before, brick_before) = (ball.clone(), brick.clone());

        assert!(!ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(ball, ball_before);
        assert_eq!(brick, brick_before);
        assert_eq!(ctx.bounce_count, 0);
        assert_eq!(ctx.brick_count, 1);
        assert_eq!(ctx.score, 0);
    }

    #[test]
    fn test_counters_saturate() {
        let mut ctx = ctx();
        ctx.bounce_count = u32::MAX;
        ctx.score = u64::MAX - 1;
        ctx.combo = u32::MAX;
        let mut brick = rect_brick(1);
        let mut ball = Ball::new(Vec2::new(100.0, 120.0), Vec2::new(0.0, -200.0));
        assert!(ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(ctx.bounce_count, u32::MAX);
        assert_eq!(ctx.score, u64::MAX);
        assert_eq!(ctx.combo, u32::MAX);

        ctx.lives = u32::MAX;
        apply_powerup(PowerupKind::ExtraLife, &mut ctx);
        assert_eq!(ctx.lives, u32::MAX);
    }

    #[test]
    fn test_hex_side_hit() {
        let hex = BrickShape::Hex.vertices_at(Vec2::ZERO);
        let center = Vec2::new(HEX_BRICK_RADIUS + 5.0, 0.0);
        let result = ball_polygon_collision(center, 8.0, &hex);
        assert!(result.hit);
        assert!(result.normal.x > 0.0);
    }

    #[test]
    fn test_ball_brick_reflects_and_damages() {
        let mut ctx = ctx();
        let mut brick = rect_brick(2);
        let mut ball = Ball::new(Vec2::new(100.0, 100.0 + RECT_BRICK_HEIGHT / 2.0 + 14.0), Vec2::new(30.0, -200.0));
        ctx.tick = 42;

        assert!(ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(brick.durability, 1);
        assert_eq!(brick.last_hit, Some(42));
        assert_eq!(ctx.brick_count, 1);
        assert_eq!(ctx.score, 0);
        assert_eq!(ctx.bounce_count, 1);
        assert_eq!(ball.vel, Vec2::new(30.0, 200.0));
        // Pushed clear of the brick
        assert!((ball.pos.y - (100.0 + RECT_BRICK_HEIGHT / 2.0 + BALL_RADIUS)).abs() < 1e-3);
    }

    #[test]
    fn test_last_hit_destroys_and_spawns_powerup() {
        let mut ctx = ctx();
        let mut brick = rect_brick(1);
        brick.powerup = Some(PowerupKind::ExtraLife);
        let mut ball = Ball::new(Vec2::new(100.0, 120.0), Vec2::new(0.0, -200.0));

        assert!(ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(brick.durability, 0);
        assert_eq!(ctx.brick_count, 0);
        assert_eq!(ctx.score, BRICK_SCORE);
        assert_eq!(ctx.combo, 1);
        assert_eq!(
            ctx.spawns,
            vec![Spawn::Powerup {
                pos: brick.pos,
                kind: PowerupKind::ExtraLife
            }]
        );

        // A destroyed brick is inert
        let mut ball = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, -200.0));
        assert!(!ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(ctx.brick_count, 0);
        assert_eq!(ctx.bounce_count, 1);
    }

    #[test]
    fn test_dead_ball_ignored() {
        let mut ctx = ctx();
        let mut brick = rect_brick(3);
        let mut ball = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(0.0, -200.0));
        ball.alive = false;
        assert!(!ball_brick(&mut ball, &mut brick, &mut ctx));
        assert_eq!(brick.durability, 3);
    }

    #[test]
    fn test_balls_apart_by_more_than_reach_do_not_collide() {
        let mut ctx = ctx();
        let eps = 1e-3;
        let mut a = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(200.0, 0.0));
        let mut b = Ball::new(Vec2::new(100.0 + 2.0 * BALL_RADIUS + eps, 100.0), Vec2::new(-200.0, 0.0));
        let (a0, b0) = (a.clone(), b.clone());
        assert!(!ball_ball(&mut a, &mut b, &mut ctx));
        assert_eq!(a, a0);
        assert_eq!(b, b0);
        assert_eq!(ctx.bounce_count, 0);
    }

    #[test]
    fn test_touching_balls_are_untouched() {
        let mut ctx = ctx();
        let mut a = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(200.0, 0.0));
        let mut b = Ball::new(Vec2::new(100.0 + 2.0 * BALL_RADIUS, 100.0), Vec2::new(-200.0, 0.0));
        let (a0, b0) = (a.clone(), b.clone());
        assert!(!ball_ball(&mut a, &mut b, &mut ctx));
        assert_eq!((a, b), (a0, b0));
    }

    #[test]
    fn test_overlapping_balls_collide_once() {
        let mut ctx = ctx();
        let eps = 0.5;
        let mut a = Ball::new(Vec2::new(100.0, 100.0), Vec2::new(200.0, 10.0));
        let mut b = Ball::new(Vec2::new(100.0 + 2.0 * BALL_RADIUS - eps, 100.0), Vec2::new(-150.0, -20.0));

        assert!(ball_ball(&mut a, &mut b, &mut ctx));
        assert!((a.pos.distance(b.pos) - 2.0 * BALL_RADIUS).abs() < 1e-3);
        // Normal components swapped, tangential kept
        assert!((a.vel - Vec2::new(-150.0, 10.0)).length() < 1e-3);
        assert!((b.vel - Vec2::new(200.0, -20.0)).length() < 1e-3);
        assert_eq!(ctx.bounce_count, 1);

        // Separated now: a second resolution does nothing
        assert!(!ball_ball(&mut a, &mut b, &mut ctx));
        assert_eq!(ctx.bounce_count, 1);
    }

    #[test]
    fn test_paddle_bounces_ball_up() {
        let mut ctx = ctx();
        ctx.combo = 3;
        let paddle = Paddle::new(Vec2::new(150.0, 244.0));
        let mut ball = Ball::new(Vec2::new(150.0, 244.0 - 30.0 - BALL_RADIUS + 4.0), Vec2::new(0.0, 200.0));
        assert!(ball_paddle(&mut ball, &paddle, &mut ctx));
        assert!((ball.vel - Vec2::new(0.0, -200.0)).length() < 1e-3);
        assert!((ball.pos.y - (244.0 - 30.0 - BALL_RADIUS)).abs() < 1e-3);
        assert_eq!(ctx.combo, 0);
        assert_eq!(ctx.bounce_count, 1);
    }

    #[test]
    fn test_paddle_miss_leaves_ball_alone() {
        let mut ctx = ctx();
        let paddle = Paddle::new(Vec2::new(150.0, 244.0));
        let mut ball = Ball::new(Vec2::new(150.0, 244.0 - 30.0 - BALL_RADIUS), Vec2::new(0.0, 200.0));
        let before = ball.clone();
        assert!(!ball_paddle(&mut ball, &paddle, &mut ctx));
        assert_eq!(ball, before);
    }

    #[test]
    fn test_powerup_consumed_once() {
        let mut ctx = ctx();
        let ball = Ball::new(Vec2::new(50.0, 50.0), Vec2::new(0.0, 200.0));
        let mut powerup = Powerup::new(Vec2::new(55.0, 55.0), PowerupKind::ExtraLife);
        let lives = ctx.lives;
        assert!(ball_powerup(&ball, &mut powerup, &mut ctx));
        assert!(!powerup.alive);
        assert_eq!(ctx.lives, lives + 1);
        assert!(!ball_powerup(&ball, &mut powerup, &mut ctx));
        assert_eq!(ctx.lives, lives + 1);
    }

    #[test]
    fn test_powerup_effects() {
        let mut ctx = ctx();
        apply_powerup(PowerupKind::FastBall, &mut ctx);
        assert_eq!(ctx.bonus_speed, SPEED_STEP);
        for _ in 0..10 {
            apply_powerup(PowerupKind::SlowBall, &mut ctx);
        }
        assert_eq!(ctx.speed(), ctx.tuning.min_speed());
        apply_powerup(PowerupKind::ExtraBall, &mut ctx);
        assert_eq!(ctx.spawns, vec![Spawn::LaunchedBall]);
        let before = ctx.bonus_speed;
        apply_powerup(PowerupKind::BigBall, &mut ctx);
        assert_eq!(ctx.bonus_speed, before);
    }

    #[test]
    fn test_dispatch_is_symmetric() {
        let mut ctx = ctx();
        let mut brick = Entity::Brick(rect_brick(2));
        let mut ball = Entity::Ball(Ball::new(Vec2::new(100.0, 120.0), Vec2::new(0.0, -200.0)));
        assert!(resolve_pair(&mut brick, &mut ball, &mut ctx));
        let mut paddle = Entity::Paddle(Paddle::new(Vec2::new(150.0, 244.0)));
        assert!(!resolve_pair(&mut paddle, &mut brick, &mut ctx));
        if let Entity::Brick(brick) = &brick {
            assert_eq!(brick.durability, 1);
        }
    }
}
