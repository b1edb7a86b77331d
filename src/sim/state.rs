//! Game state and core simulation types
//!
//! All entities live in one arena (`Vec<Entity>`) and are referred to by
//! index. The paddle is always index 0. Indices are stable for the length of
//! a tick; inactive entities are compacted out before the next one starts.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::grid::SpatialGrid;
use super::shape::{self, BrickShape};
use crate::consts::*;
use crate::tuning::Tuning;

/// Seed used by `Simulation::new`
pub const DEFAULT_SEED: u64 = 0x5eed_b41c;

/// Arena index of the paddle
pub const PADDLE_INDEX: usize = 0;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// All bricks destroyed (terminal)
    Won,
    /// No ball in play and no lives left (terminal)
    Lost,
}

/// Paddle movement direction for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaddleDir {
    #[default]
    None,
    Left,
    Right,
}

impl PaddleDir {
    /// Sign of the horizontal motion
    pub fn sign(self) -> f32 {
        match self {
            PaddleDir::None => 0.0,
            PaddleDir::Left => -1.0,
            PaddleDir::Right => 1.0,
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    SlowBall,
    FastBall,
    ExtraBall,
    ExtraLife,
    SmallBall,
    BigBall,
    StrongBall,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 7] = [
        PowerupKind::SlowBall,
        PowerupKind::FastBall,
        PowerupKind::ExtraBall,
        PowerupKind::ExtraLife,
        PowerupKind::SmallBall,
        PowerupKind::BigBall,
        PowerupKind::StrongBall,
    ];

    /// Integer tag used by the save format (also the sprite column)
    pub fn tag(self) -> i32 {
        match self {
            PowerupKind::SlowBall => 0,
            PowerupKind::FastBall => 1,
            PowerupKind::ExtraBall => 2,
            PowerupKind::ExtraLife => 3,
            PowerupKind::SmallBall => 4,
            PowerupKind::BigBall => 5,
            PowerupKind::StrongBall => 6,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        usize::try_from(tag).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

/// A ball entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub alive: bool,
}

impl Ball {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            pos,
            vel,
            radius: BALL_RADIUS,
            alive: true,
        }
    }
}

/// The player's paddle (elliptical footprint)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub pos: Vec2,
    /// Ellipse semi-axes
    pub half_size: Vec2,
    pub dir: PaddleDir,
}

impl Paddle {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            half_size: Vec2::new(PADDLE_WIDTH / 2.0, PADDLE_HEIGHT / 2.0),
            dir: PaddleDir::None,
        }
    }

    /// Spawn point for launched balls, resting on top of the paddle
    pub fn launch_point(&self) -> Vec2 {
        self.pos - Vec2::new(0.0, self.half_size.y + BALL_RADIUS)
    }
}

/// A brick entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub pos: Vec2,
    pub shape: BrickShape,
    /// Hits left; 0 means destroyed
    pub durability: u32,
    /// Tick of the most recent hit (hit-flash animation)
    pub last_hit: Option<u64>,
    pub powerup: Option<PowerupKind>,
}

impl Brick {
    pub fn new(pos: Vec2, shape: BrickShape, durability: u32) -> Self {
        Self {
            pos,
            shape,
            durability,
            last_hit: None,
            powerup: None,
        }
    }

    pub fn vertices(&self) -> Vec<Vec2> {
        self.shape.vertices_at(self.pos)
    }
}

/// A falling power-up pickup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub pos: Vec2,
    pub kind: PowerupKind,
    pub alive: bool,
}

impl Powerup {
    pub fn new(pos: Vec2, kind: PowerupKind) -> Self {
        Self {
            pos,
            kind,
            alive: true,
        }
    }
}

/// Closed set of everything the arena can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Entity {
    Ball(Ball),
    Brick(Brick),
    Paddle(Paddle),
    Powerup(Powerup),
}

impl Entity {
    /// False once the entity is logically removed (dead, destroyed or consumed)
    pub fn is_active(&self) -> bool {
        match self {
            Entity::Ball(ball) => ball.alive,
            Entity::Brick(brick) => brick.durability > 0,
            Entity::Paddle(_) => true,
            Entity::Powerup(powerup) => powerup.alive,
        }
    }

    /// Axis-aligned bounding box (min, max)
    pub fn aabb(&self) -> (Vec2, Vec2) {
        match self {
            Entity::Ball(ball) => (ball.pos - Vec2::splat(ball.radius), ball.pos + Vec2::splat(ball.radius)),
            Entity::Brick(brick) => brick.shape.aabb_at(brick.pos),
            Entity::Paddle(paddle) => (paddle.pos - paddle.half_size, paddle.pos + paddle.half_size),
            Entity::Powerup(powerup) => (
                powerup.pos - Vec2::splat(POWERUP_RADIUS),
                powerup.pos + Vec2::splat(POWERUP_RADIUS),
            ),
        }
    }
}

/// Read-only visitation over live entities, for drawing
pub trait EntityVisitor {
    fn ball(&mut self, _ball: &Ball) {}
    fn brick(&mut self, _brick: &Brick) {}
    fn paddle(&mut self, _paddle: &Paddle) {}
    fn powerup(&mut self, _powerup: &Powerup) {}
}

/// Entity creation requested while the arena is borrowed pair-wise
#[derive(Debug, Clone, PartialEq)]
pub enum Spawn {
    /// New ball on top of the paddle, heading straight up
    LaunchedBall,
    Powerup { pos: Vec2, kind: PowerupKind },
}

/// Aggregate counters shared by motion and collision handlers
#[derive(Debug, Clone)]
pub struct SimContext {
    pub width: f32,
    pub height: f32,
    pub tuning: Tuning,
    pub tick: u64,
    pub score: u64,
    /// Bricks destroyed since the last paddle touch
    pub combo: u32,
    /// Added to the base speed; stepped by bounces and power-ups
    pub bonus_speed: f32,
    pub bounce_count: u32,
    pub lives: u32,
    pub brick_count: u32,
    pub ball_count: u32,
    /// Deferred entity creation, drained after pair resolution
    pub spawns: Vec<Spawn>,
}

impl SimContext {
    pub fn new(width: f32, height: f32, tuning: Tuning) -> Self {
        Self {
            width,
            height,
            lives: tuning.starting_lives,
            tuning,
            tick: 0,
            score: 0,
            combo: 0,
            bonus_speed: 0.0,
            bounce_count: 0,
            brick_count: 0,
            ball_count: 0,
            spawns: Vec::new(),
        }
    }

    /// Global ball speed scalar
    pub fn speed(&self) -> f32 {
        (self.tuning.base_speed + self.bonus_speed).max(self.tuning.min_speed())
    }

    /// Phase implied by the counters
    pub fn outcome(&self) -> GamePhase {
        if self.brick_count == 0 {
            GamePhase::Won
        } else if self.ball_count == 0 && self.lives == 0 {
            GamePhase::Lost
        } else {
            GamePhase::Running
        }
    }
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(crate) ctx: SimContext,
    pub(crate) phase: GamePhase,
    pub(crate) entities: Vec<Entity>,
    pub(crate) grid: SpatialGrid,
}

impl Simulation {
    /// Fresh level with the default seed and tuning
    pub fn new(width: f32, height: f32) -> Self {
        Self::with_seed(width, height, DEFAULT_SEED, Tuning::default())
    }

    /// Fresh level; the seed decides which bricks carry power-ups
    pub fn with_seed(width: f32, height: f32, seed: u64, tuning: Tuning) -> Self {
        let mut sim = Self::empty(width, height, tuning);
        let mut rng = Pcg32::seed_from_u64(seed);

        const ROWS: u32 = 4;
        const TOP_MARGIN: f32 = 16.0;
        let cols = (width / RECT_BRICK_WIDTH).floor() as u32;
        let left = (width - cols as f32 * RECT_BRICK_WIDTH) / 2.0 + RECT_BRICK_WIDTH / 2.0;

        for row in 0..ROWS {
            let y = TOP_MARGIN + RECT_BRICK_HEIGHT / 2.0 + row as f32 * RECT_BRICK_HEIGHT;
            let durability = (ROWS - row).min(MAX_DURABILITY);
            for col in 0..cols {
                let x = left + col as f32 * RECT_BRICK_WIDTH;
                let mut brick = Brick::new(Vec2::new(x, y), BrickShape::Rect, durability);
                if rng.random_ratio(1, 7) {
                    brick.powerup = Some(PowerupKind::ALL[rng.random_range(0..PowerupKind::ALL.len())]);
                }
                sim.push_brick(brick);
            }
        }

        // Straight down; the first tick renormalizes to the global speed
        sim.push_ball(Ball::new(Vec2::new(width / 2.0, height / 2.0), Vec2::new(0.0, 1.0)));
        sim.rebuild_grid();

        log::info!(
            "Simulation created: {}x{}, {} bricks, seed {:#x}",
            width,
            height,
            sim.ctx.brick_count,
            seed
        );
        sim
    }

    /// Paddle-only canvas (editor and loader starting point)
    pub fn empty(width: f32, height: f32, tuning: Tuning) -> Self {
        let grid = SpatialGrid::new(width, height, tuning.cell_size);
        let paddle = Paddle::new(Vec2::new(width / 2.0, height - PADDLE_BOTTOM_OFFSET));
        Self {
            ctx: SimContext::new(width, height, tuning),
            phase: GamePhase::Running,
            entities: vec![Entity::Paddle(paddle)],
            grid,
        }
    }

    /// Append a ball, keeping `ball_count` in step
    pub(crate) fn push_ball(&mut self, ball: Ball) -> usize {
        if ball.alive {
            self.ctx.ball_count += 1;
        }
        self.entities.push(Entity::Ball(ball));
        self.entities.len() - 1
    }

    /// Append a brick, keeping `brick_count` in step
    pub(crate) fn push_brick(&mut self, brick: Brick) -> usize {
        if brick.durability > 0 {
            self.ctx.brick_count += 1;
        }
        self.entities.push(Entity::Brick(brick));
        self.entities.len() - 1
    }

    pub(crate) fn push_powerup(&mut self, powerup: Powerup) -> usize {
        self.entities.push(Entity::Powerup(powerup));
        self.entities.len() - 1
    }

    /// Create everything queued in `ctx.spawns`
    pub(crate) fn drain_spawns(&mut self) {
        let spawns = std::mem::take(&mut self.ctx.spawns);
        for spawn in spawns {
            match spawn {
                Spawn::LaunchedBall => {
                    let pos = self.paddle().launch_point();
                    let vel = Vec2::new(0.0, -self.ctx.speed());
                    self.push_ball(Ball::new(pos, vel));
                }
                Spawn::Powerup { pos, kind } => {
                    self.push_powerup(Powerup::new(pos, kind));
                }
            }
        }
    }

    /// Drop inactive entities. Invalidates indices; only call between ticks.
    pub(crate) fn compact(&mut self) {
        self.entities.retain(Entity::is_active);
    }

    /// Re-register every active footprint without moving anything
    pub(crate) fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (id, entity) in self.entities.iter().enumerate() {
            if entity.is_active() {
                let (min, max) = entity.aabb();
                self.grid.insert(min, max, id);
            }
        }
    }

    /// Call `visitor` for every live entity: balls, bricks, power-ups, then the paddle
    pub fn visit(&self, visitor: &mut impl EntityVisitor) {
        for entity in self.live_entities() {
            match entity {
                Entity::Ball(ball) => visitor.ball(ball),
                Entity::Brick(brick) => visitor.brick(brick),
                Entity::Powerup(powerup) => visitor.powerup(powerup),
                Entity::Paddle(_) => {}
            }
        }
        visitor.paddle(self.paddle());
    }

    /// Live entities in arena order
    pub fn live_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_active())
    }

    pub fn balls(&self) -> impl Iterator<Item = &Ball> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Ball(ball) if ball.alive => Some(ball),
            _ => None,
        })
    }

    pub fn bricks(&self) -> impl Iterator<Item = &Brick> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Brick(brick) if brick.durability > 0 => Some(brick),
            _ => None,
        })
    }

    pub fn powerups(&self) -> impl Iterator<Item = &Powerup> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Powerup(powerup) if powerup.alive => Some(powerup),
            _ => None,
        })
    }

    pub fn paddle(&self) -> &Paddle {
        match &self.entities[PADDLE_INDEX] {
            Entity::Paddle(paddle) => paddle,
            _ => unreachable!("paddle is always arena index 0"),
        }
    }

    pub(crate) fn paddle_mut(&mut self) -> &mut Paddle {
        match &mut self.entities[PADDLE_INDEX] {
            Entity::Paddle(paddle) => paddle,
            _ => unreachable!("paddle is always arena index 0"),
        }
    }

    pub fn width(&self) -> f32 {
        self.ctx.width
    }

    pub fn height(&self) -> f32 {
        self.ctx.height
    }

    pub fn tick(&self) -> u64 {
        self.ctx.tick
    }

    pub fn score(&self) -> u64 {
        self.ctx.score
    }

    pub fn combo(&self) -> u32 {
        self.ctx.combo
    }

    /// Current global ball speed
    pub fn speed(&self) -> f32 {
        self.ctx.speed()
    }

    pub fn bonus_speed(&self) -> f32 {
        self.ctx.bonus_speed
    }

    pub fn bounce_count(&self) -> u32 {
        self.ctx.bounce_count
    }

    pub fn lives(&self) -> u32 {
        self.ctx.lives
    }

    pub fn brick_count(&self) -> u32 {
        self.ctx.brick_count
    }

    pub fn ball_count(&self) -> u32 {
        self.ctx.ball_count
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn tuning(&self) -> &Tuning {
        &self.ctx.tuning
    }

    /// Check the counter invariants against the arena (tests and debug builds)
    pub fn counts_consistent(&self) -> bool {
        self.balls().count() as u32 == self.ctx.ball_count
            && self.bricks().count() as u32 == self.ctx.brick_count
    }
}

/// Borrow two distinct arena slots mutably
pub(crate) fn pair_mut(entities: &mut [Entity], a: usize, b: usize) -> (&mut Entity, &mut Entity) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = entities.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = entities.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Whether a brick footprint at `pos` lies entirely inside the field
pub(crate) fn brick_in_bounds(shape: BrickShape, pos: Vec2, width: f32, height: f32) -> bool {
    let (min, max) = shape.aabb_at(pos);
    min.x >= 0.0 && min.y >= 0.0 && max.x <= width && max.y <= height
}

/// Whether a brick footprint at `pos` overlaps any live brick other than `skip`
pub(crate) fn brick_overlaps_others(
    entities: &[Entity],
    shape: BrickShape,
    pos: Vec2,
    skip: Option<usize>,
) -> bool {
    let candidate = shape.vertices_at(pos);
    entities.iter().enumerate().any(|(id, e)| match e {
        Entity::Brick(other) if Some(id) != skip && other.durability > 0 => {
            shape::polygons_overlap(&candidate, &other.vertices())
        }
        _ => false,
    })
}
