//! Bricked headless driver
//!
//! Loads a save (or starts a fresh level), plays it with a simple autopilot
//! at the fixed timestep and writes the resulting state back.
//!
//! Usage: `bricked [save-file]`. Set `BRICKED_TUNING` to a JSON tuning file,
//! or `BRICKED_DIFFICULTY` to `easy`, `normal` or `hard` for a preset.

#[cfg(not(target_arch = "wasm32"))]
use bricked::{
    Difficulty, Tuning,
    persistence,
    sim::{GamePhase, PaddleDir, Simulation, TickInput, tick},
};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SAVE: &str = "bricked.sav";
#[cfg(not(target_arch = "wasm32"))]
const FIELD_SIZE: f32 = 300.0;
/// Ten minutes of play at 60 Hz
#[cfg(not(target_arch = "wasm32"))]
const TICK_CAP: u64 = 60 * 60 * 10;
/// Paddle dead zone around the tracked ball
#[cfg(not(target_arch = "wasm32"))]
const TRACK_SLACK: f32 = 4.0;

/// Follow the lowest ball; launch a new one when none is in play
#[cfg(not(target_arch = "wasm32"))]
fn autopilot(sim: &Simulation) -> TickInput {
    let paddle_x = sim.paddle().pos.x;
    let target = sim.balls().max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let paddle_dir = match target {
        Some(ball) if ball.pos.x < paddle_x - TRACK_SLACK => PaddleDir::Left,
        Some(ball) if ball.pos.x > paddle_x + TRACK_SLACK => PaddleDir::Right,
        _ => PaddleDir::None,
    };

    TickInput {
        paddle_dir,
        launch: sim.ball_count() == 0,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bricked (headless) starting...");

    let tuning = match std::env::var_os("BRICKED_TUNING") {
        Some(path) => Tuning::load(path),
        None => match std::env::var("BRICKED_DIFFICULTY") {
            Ok(name) => match Difficulty::from_str(&name) {
                Some(difficulty) => {
                    log::info!("Difficulty: {}", difficulty.as_str());
                    Tuning::from_difficulty(difficulty)
                }
                None => {
                    log::warn!("Unknown difficulty {:?} - using Normal", name);
                    Tuning::default()
                }
            },
            Err(_) => Tuning::default(),
        },
    };
    let dt = tuning.dt;

    let save_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SAVE.to_string());
    let mut sim = persistence::load_or_default(&save_path, FIELD_SIZE, FIELD_SIZE, tuning);

    let start = sim.tick();
    while sim.phase() == GamePhase::Running && sim.tick() - start < TICK_CAP {
        let input = autopilot(&sim);
        tick(&mut sim, &input, dt);
    }

    match sim.phase() {
        GamePhase::Won => log::info!("Won after {} ticks", sim.tick() - start),
        GamePhase::Lost => log::info!("Lost after {} ticks", sim.tick() - start),
        GamePhase::Running => log::info!("Stopped at tick cap, {} bricks left", sim.brick_count()),
    }
    println!(
        "{:?}: tick {} score {} lives {} bricks {}",
        sim.phase(),
        sim.tick(),
        sim.score(),
        sim.lives(),
        sim.brick_count()
    );

    if let Err(e) = persistence::save_to_file(&sim, &save_path) {
        log::error!("Failed to write {}: {}", save_path, e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation runs inside a host page on wasm; there is no CLI
}
