use std::time::Duration;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cli::render::{format_statistics, render_game};
use crate::config::simulation::SimulationConfig;
use crate::simulation::{ClickResult, Game, GameEvent, TickOutcome, TickStatistics};
use crate::world::generation::{generate_valid_grid, grid_summary};
use crate::world::Grid;

/// A line typed by the player during `play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Click the cell at column `x`, row `y`. Out-of-range cells count as empty space.
    Click { x: i64, y: i64 },
    ClickEmpty,
    Restart,
    Quit,
}

pub fn parse_command(line: &str) -> Result<PlayerCommand, String> {
    let line = line.trim();
    match line {
        "q" | "quit" => return Ok(PlayerCommand::Quit),
        "r" | "restart" => return Ok(PlayerCommand::Restart),
        "-" => return Ok(PlayerCommand::ClickEmpty),
        _ => {}
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let [x, y] = parts.as_slice() else {
        return Err(format!(
            "Unrecognised input '{}'. Type 'x y' to click a cell, '-' to click away, 'r' to restart or 'q' to quit",
            line
        ));
    };
    let x = x
        .parse::<i64>()
        .map_err(|_| format!("Invalid column '{}'", x))?;
    let y = y.parse::<i64>().map_err(|_| format!("Invalid row '{}'", y))?;
    Ok(PlayerCommand::Click { x, y })
}

/// Seed from the command line, or a fresh one from the OS.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().r#gen())
}

#[derive(Serialize)]
struct GridDump<'a> {
    /// Seed passed on the command line; reproduces this grid.
    seed: u64,
    /// Seed of the accepted generation pass.
    grid_seed: u64,
    attempts: u32,
    grid: &'a Grid,
}

/// Generate one valid grid and print it.
pub fn generate(config: &SimulationConfig, seed: u64, json: bool) -> Result<(), String> {
    print!("{}", generate_output(config, seed, json)?);
    Ok(())
}

/// What `generate` prints. Passing the reported `Seed` back in yields the same board.
pub fn generate_output(config: &SimulationConfig, seed: u64, json: bool) -> Result<String, String> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let generated = generate_valid_grid(&mut rng, &config.generation).map_err(|e| e.to_string())?;
    info!(
        seed,
        grid_seed = generated.seed,
        attempts = generated.attempts,
        "Grid generated"
    );

    if json {
        let dump = GridDump {
            seed,
            grid_seed: generated.seed,
            attempts: generated.attempts,
            grid: &generated.grid,
        };
        let text = serde_json::to_string_pretty(&dump)
            .map_err(|e| format!("Cannot serialize grid: {}", e))?;
        Ok(format!("{}\n", text))
    } else {
        Ok(format!(
            "Seed: {}\n{}",
            seed,
            grid_summary(&generated.grid, generated.seed)
        ))
    }
}

/// Real-time game in the terminal.
///
/// Frames advance on a tokio interval; typed commands arrive on stdin and
/// are applied between frames. Ctrl-C or `q` ends the session.
pub async fn play(config: &SimulationConfig, seed: u64) -> Result<(), String> {
    let mut game = Game::new(config.clone(), seed).map_err(|e| e.to_string())?;
    info!(seed, "Game started");
    print!("{}", render_game(&game));
    println!("Commands: 'x y' click a cell, '-' click away, 'r' restart, 'q' quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = tokio::time::interval(config.frame_duration());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_frame = Instant::now();
    loop {
        tokio::select! {
            now = frames.tick() => {
                let dt = now.duration_since(last_frame);
                last_frame = now;
                let outcome = game.update(dt).map_err(|e| e.to_string())?;
                let events = game.drain_events();
                log_events(&events);
                if outcome.is_some() || events.iter().any(|e| matches!(e, GameEvent::VillagerDied { .. })) {
                    print!("{}", render_game(&game));
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| format!("Cannot read stdin: {}", e))? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(PlayerCommand::Quit) => break,
                    Ok(PlayerCommand::Restart) => {
                        game.restart().map_err(|e| e.to_string())?;
                    }
                    Ok(PlayerCommand::ClickEmpty) => {
                        game.click(None);
                    }
                    Ok(PlayerCommand::Click { x, y }) => {
                        let target = game.grid().pos(x, y);
                        if let ClickResult::Ignored = game.click(target) {
                            println!("Nothing to select at ({}, {})", x, y);
                        }
                    }
                    Err(e) => {
                        println!("{}", e);
                        continue;
                    }
                }
                log_events(&game.drain_events());
                print!("{}", render_game(&game));
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!(wave = game.wave(), ticks = game.tick_count(), "Game ended");
    Ok(())
}

fn log_events(events: &[GameEvent]) {
    for event in events {
        debug!(?event, "Game event");
    }
}

/// Headless run with fixed frame steps and no player input.
///
/// Stops when the game ends or once `max_waves` waves have completed
/// (0 runs until the game ends).
pub fn simulate(config: &SimulationConfig, seed: u64, max_waves: u32) -> Result<(), String> {
    let mut game = Game::new(config.clone(), seed).map_err(|e| e.to_string())?;
    let frame = config.frame_duration();
    info!(seed, max_waves, "Headless run started");
    println!("Seed: {}", seed);

    let summary = run_headless(&mut game, frame, max_waves, |stats| {
        println!("{}", format_statistics(stats));
    })?;

    println!();
    print!("{}", render_game(&game));
    if !game.is_game_over() {
        println!("Stopped after {} completed wave(s)", summary.waves_completed);
    }
    println!(
        "Simulated {:.1}s over {} tick(s)",
        summary.elapsed.as_secs_f32(),
        game.tick_count()
    );
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub waves_completed: u32,
    pub elapsed: Duration,
}

/// Step `game` by `frame` until it ends or `max_waves` waves complete.
/// `on_wave` sees the statistics of the tick that ended each wave.
pub fn run_headless(
    game: &mut Game,
    frame: Duration,
    max_waves: u32,
    mut on_wave: impl FnMut(&TickStatistics),
) -> Result<HeadlessSummary, String> {
    let mut waves_completed = 0;
    let mut elapsed = Duration::ZERO;

    while !game.is_game_over() && (max_waves == 0 || waves_completed < max_waves) {
        let outcome = game.update(frame).map_err(|e| e.to_string())?;
        elapsed += frame;
        game.drain_events();
        match outcome {
            Some(TickOutcome::WaveComplete { .. }) | Some(TickOutcome::GameOver(_)) => {
                if let Some(stats) = game.last_statistics() {
                    on_wave(stats);
                }
                if matches!(outcome, Some(TickOutcome::WaveComplete { .. })) {
                    waves_completed += 1;
                }
            }
            Some(TickOutcome::Continue) | None => {}
        }
    }

    Ok(HeadlessSummary {
        waves_completed,
        elapsed,
    })
}
