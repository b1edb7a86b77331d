//! Save/load of simulation state
//!
//! The text format lives in [`save`]. This module adds the file helpers and
//! the recovery policy: a save that fails to load in any way is replaced by
//! a fresh level, never partially applied.

pub mod save;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::sim::Simulation;
use crate::tuning::Tuning;

pub use save::SaveData;

/// Why a save could not be read
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save ended early, expected a record at line {line}")]
    UnexpectedEof { line: usize },
    #[error("line {line}: {field} is not a valid number: {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: unknown brick shape tag {tag}")]
    UnknownShape { line: usize, tag: i32 },
    #[error("line {line}: unknown power-up tag {tag}")]
    UnknownPowerup { line: usize, tag: i32 },
    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount { line: usize, expected: usize, found: usize },
    #[error("invalid playfield size {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
}

/// Write the simulation to `path`, replacing any existing file
pub fn save_to_file(sim: &Simulation, path: impl AsRef<Path>) -> std::io::Result<()> {
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    sim.save(&mut out)?;
    out.flush()?;
    log::info!(
        "Saved tick {} ({} bricks, {} balls) to {}",
        sim.tick(),
        sim.brick_count(),
        sim.ball_count(),
        path.display()
    );
    Ok(())
}

pub fn load_from_file(path: impl AsRef<Path>, tuning: Tuning) -> Result<Simulation, SaveError> {
    let path = path.as_ref();
    let sim = Simulation::load(BufReader::new(File::open(path)?), tuning)?;
    log::info!(
        "Loaded tick {} ({} bricks, {} balls) from {}",
        sim.tick(),
        sim.brick_count(),
        sim.ball_count(),
        path.display()
    );
    Ok(sim)
}

/// Load a save, or start a fresh `width` x `height` level if it cannot be read
pub fn load_or_default(path: impl AsRef<Path>, width: f32, height: f32, tuning: Tuning) -> Simulation {
    let path = path.as_ref();
    match load_from_file(path, tuning.clone()) {
        Ok(sim) => sim,
        Err(e) => {
            log::warn!("Cannot load save {}: {} - starting a new level", path.display(), e);
            Simulation::with_seed(width, height, crate::sim::DEFAULT_SEED, tuning)
        }
    }
}
