//! Line-oriented text save format
//!
//! ```text
//! width,height
//! tick
//! score,combo
//! bonus_speed,bounce_count
//! lives,paddle_x,paddle_y
//! ball_count
//! x,y,vx,vy                         (one line per live ball)
//! brick_count
//! x,y,durability,shape,powerup      (one line per live brick; powerup -1 = none)
//! ```
//!
//! Floats are written in shortest round-trip form, so a save/load cycle
//! reproduces every value bit for bit. Power-ups in flight and the tuning
//! are not part of the format.

use std::io::{Read, Write};
use std::str::FromStr;

use glam::Vec2;

use super::SaveError;
use crate::consts::MAX_FIELD_SIZE;
use crate::sim::{Ball, Brick, BrickShape, PowerupKind, Simulation};
use crate::tuning::Tuning;

/// Everything a save file holds, parsed but not yet turned into a simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SaveData {
    pub width: f32,
    pub height: f32,
    pub tick: u64,
    pub score: u64,
    pub combo: u32,
    pub bonus_speed: f32,
    pub bounce_count: u32,
    pub lives: u32,
    pub paddle: Vec2,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
}

impl SaveData {
    /// Snapshot the persisted part of a simulation
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            width: sim.width(),
            height: sim.height(),
            tick: sim.tick(),
            score: sim.score(),
            combo: sim.combo(),
            bonus_speed: sim.bonus_speed(),
            bounce_count: sim.bounce_count(),
            lives: sim.lives(),
            paddle: sim.paddle().pos,
            balls: sim.balls().cloned().collect(),
            bricks: sim
                .bricks()
                .map(|brick| Brick {
                    last_hit: None,
                    ..brick.clone()
                })
                .collect(),
        }
    }

    /// Build a simulation; counts, ids and phase are derived from the records
    pub fn into_simulation(self, tuning: Tuning) -> Simulation {
        let mut sim = Simulation::empty(self.width, self.height, tuning);
        sim.ctx.tick = self.tick;
        sim.ctx.score = self.score;
        sim.ctx.combo = self.combo;
        sim.ctx.bonus_speed = self.bonus_speed;
        sim.ctx.bounce_count = self.bounce_count;
        sim.ctx.lives = self.lives;
        sim.paddle_mut().pos = self.paddle;
        for ball in self.balls {
            sim.push_ball(ball);
        }
        for brick in self.bricks {
            sim.push_brick(brick);
        }
        sim.phase = sim.ctx.outcome();
        sim.rebuild_grid();
        sim
    }

    pub fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        writeln!(out, "{},{}", self.width, self.height)?;
        writeln!(out, "{}", self.tick)?;
        writeln!(out, "{},{}", self.score, self.combo)?;
        writeln!(out, "{},{}", self.bonus_speed, self.bounce_count)?;
        writeln!(out, "{},{},{}", self.lives, self.paddle.x, self.paddle.y)?;
        writeln!(out, "{}", self.balls.len())?;
        for ball in &self.balls {
            writeln!(out, "{},{},{},{}", ball.pos.x, ball.pos.y, ball.vel.x, ball.vel.y)?;
        }
        writeln!(out, "{}", self.bricks.len())?;
        for brick in &self.bricks {
            writeln!(
                out,
                "{},{},{},{},{}",
                brick.pos.x,
                brick.pos.y,
                brick.durability,
                brick.shape.tag(),
                brick.powerup.map_or(-1, PowerupKind::tag)
            )?;
        }
        Ok(())
    }

    /// Parse a whole save. Fails on the first malformed field.
    pub fn parse(text: &str) -> Result<Self, SaveError> {
        let mut records = Records::new(text);

        let (line, f) = records.next(2)?;
        let width: f32 = field(line, "width", f[0])?;
        let height: f32 = field(line, "height", f[1])?;
        let side_ok = |side: f32| side.is_finite() && side > 0.0 && side <= MAX_FIELD_SIZE;
        if !(side_ok(width) && side_ok(height)) {
            return Err(SaveError::InvalidDimensions { width, height });
        }

        let (line, f) = records.next(1)?;
        let tick = field(line, "tick", f[0])?;

        let (line, f) = records.next(2)?;
        let score = field(line, "score", f[0])?;
        let combo = field(line, "combo", f[1])?;

        let (line, f) = records.next(2)?;
        let bonus_speed = finite_field(line, "bonus_speed", f[0])?;
        let bounce_count = field(line, "bounce_count", f[1])?;

        let (line, f) = records.next(3)?;
        let lives = field(line, "lives", f[0])?;
        let paddle = Vec2::new(finite_field(line, "paddle_x", f[1])?, finite_field(line, "paddle_y", f[2])?);

        let (line, f) = records.next(1)?;
        let ball_count: usize = field(line, "ball_count", f[0])?;
        let mut balls = Vec::new();
        for _ in 0..ball_count {
            let (line, f) = records.next(4)?;
            let pos = Vec2::new(finite_field(line, "x", f[0])?, finite_field(line, "y", f[1])?);
            let vel = Vec2::new(finite_field(line, "vx", f[2])?, finite_field(line, "vy", f[3])?);
            balls.push(Ball::new(pos, vel));
        }

        let (line, f) = records.next(1)?;
        let brick_count: usize = field(line, "brick_count", f[0])?;
        let mut bricks = Vec::new();
        for _ in 0..brick_count {
            let (line, f) = records.next(5)?;
            let pos = Vec2::new(finite_field(line, "x", f[0])?, finite_field(line, "y", f[1])?);
            let durability = field(line, "durability", f[2])?;

            let shape_tag: i32 = field(line, "shape", f[3])?;
            let shape = BrickShape::from_tag(shape_tag).ok_or(SaveError::UnknownShape { line, tag: shape_tag })?;

            let powerup_tag: i32 = field(line, "powerup", f[4])?;
            let powerup = match powerup_tag {
                -1 => None,
                tag => Some(PowerupKind::from_tag(tag).ok_or(SaveError::UnknownPowerup { line, tag })?),
            };

            let mut brick = Brick::new(pos, shape, durability);
            brick.powerup = powerup;
            bricks.push(brick);
        }

        Ok(Self {
            width,
            height,
            tick,
            score,
            combo,
            bonus_speed,
            bounce_count,
            lives,
            paddle,
            balls,
            bricks,
        })
    }
}

/// Non-blank lines split on commas, with 1-based line numbers
struct Records<'a> {
    lines: std::str::Lines<'a>,
    line: usize,
}

impl<'a> Records<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
            line: 0,
        }
    }

    fn next(&mut self, expected: usize) -> Result<(usize, Vec<&'a str>), SaveError> {
        loop {
            self.line += 1;
            let Some(raw) = self.lines.next() else {
                return Err(SaveError::UnexpectedEof { line: self.line });
            };
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let line = self.line;
            let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
            if fields.len() != expected {
                return Err(SaveError::FieldCount {
                    line,
                    expected,
                    found: fields.len(),
                });
            }
            return Ok((line, fields));
        }
    }
}

fn field<T: FromStr>(line: usize, name: &'static str, raw: &str) -> Result<T, SaveError> {
    raw.parse().map_err(|_| SaveError::InvalidNumber {
        line,
        field: name,
        value: raw.to_string(),
    })
}

/// Float field that must be finite; `NaN` and `inf` parse as floats but are rejected
fn finite_field(line: usize, name: &'static str, raw: &str) -> Result<f32, SaveError> {
    let value: f32 = field(line, name, raw)?;
    if !value.is_finite() {
        return Err(SaveError::InvalidNumber {
            line,
            field: name,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

impl Simulation {
    /// Write the save format
    pub fn save(&self, out: &mut impl Write) -> std::io::Result<()> {
        SaveData::capture(self).write_to(out)
    }

    /// Save format as a string
    pub fn to_save_string(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.save(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Read a whole save. Nothing is constructed unless every record parses.
    pub fn load(mut input: impl Read, tuning: Tuning) -> Result<Simulation, SaveError> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;
        Ok(SaveData::parse(&text)?.into_simulation(tuning))
    }
}
