//! Soak test: plays many random games in parallel and generates many mazes,
//! checking the engine invariants after every move.
//!
//! Checked per move:
//! - every move the engine offers is accepted
//! - chess never leaves the mover's own king attacked
//! - checkers only ever loses pieces, and captures match the missing pieces
//! - othello adds exactly one disc per placement
//!
//! Checked per maze: the goal is reachable and every shared wall agrees.

use clap::Parser;
use colored::Colorize;
use parking_lot::Mutex;
use parlor::game_wrapper::{GameKind, GameWrapper, MoveWrapper, SideWrapper};
use parlor::games::{checkers, chess, maze, othello};
use parlor::GameState;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random games to play per engine
    #[arg(long, default_value_t = 200)]
    games: usize,

    /// Mazes to generate per size preset
    #[arg(long, default_value_t = 1000)]
    mazes: usize,

    /// Move cap per game
    #[arg(long, default_value_t = 500)]
    max_plies: usize,

    /// Worker threads (default: all logical CPUs)
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// Base seed; game `i` uses `seed + i`
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Restrict the run to one engine (chess, checkers, othello, tictactoe)
    #[arg(long)]
    game: Option<String>,

    /// Skip the maze soak
    #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
    skip_mazes: bool,
}

#[derive(Default, Debug)]
struct SoakStats {
    games: usize,
    finished: usize,
    moves: usize,
    mazes: usize,
    failures: Vec<String>,
}

/// Board facts compared before and after each move.
#[derive(Clone, Copy, Debug)]
enum Snapshot {
    Pieces { on_board: usize, captured: u32 },
    Discs(usize),
    Nothing,
}

fn snapshot(game: &GameWrapper) -> Snapshot {
    match game {
        GameWrapper::Checkers(g) => {
            let (red, black) = g.scores();
            Snapshot::Pieces {
                on_board: g.board().as_slice().iter().flatten().count(),
                captured: red + black,
            }
        }
        GameWrapper::Othello(g) => {
            let count = othello::count_discs(g.board());
            Snapshot::Discs(count.black + count.white)
        }
        _ => Snapshot::Nothing,
    }
}

fn check_move(game: &GameWrapper, mover: SideWrapper, before: Snapshot, mv: &MoveWrapper) -> Result<(), String> {
    match (game, mover, before, snapshot(game)) {
        (GameWrapper::Chess(g), SideWrapper::Chess(color), _, _) => {
            if chess::is_in_check(g.board(), color) {
                return Err(format!("{mv} left the {color} king in check"));
            }
        }
        (GameWrapper::Checkers(_), _, Snapshot::Pieces { on_board: was, .. }, Snapshot::Pieces { on_board, captured }) => {
            if on_board > was {
                return Err(format!("{mv} added a checkers piece"));
            }
            if on_board + captured as usize != 2 * checkers::PIECES_PER_SIDE {
                return Err(format!("{mv}: {on_board} pieces left but {captured} captured"));
            }
        }
        (GameWrapper::Othello(_), _, Snapshot::Discs(was), Snapshot::Discs(now)) => {
            if now != was + 1 {
                return Err(format!("{mv} changed the disc total from {was} to {now}"));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Plays one random game, returning (moves played, finished).
fn soak_game(kind: GameKind, seed: u64, max_plies: usize) -> Result<(usize, bool), String> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut game = kind.new_game();
    let mut plies = 0;
    while plies < max_plies && !game.is_terminal() {
        let moves = game.get_possible_moves();
        let Some(mv) = moves.choose(&mut rng) else {
            return Err(format!("{kind} seed {seed}: no moves in a non-terminal position"));
        };
        let mover = game.get_current_player();
        let before = snapshot(&game);
        game.make_move(mv)
            .map_err(|e| format!("{kind} seed {seed}: offered move {mv} rejected: {e}"))?;
        check_move(&game, mover, before, mv).map_err(|e| format!("{kind} seed {seed}: {e}"))?;
        plies += 1;
    }
    Ok((plies, game.is_terminal()))
}

fn soak_maze(size: usize, seed: u64) -> Result<(), String> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let generated = maze::generate(size, size, &mut rng).map_err(|e| format!("maze seed {seed}: {e}"))?;
    if !generated.is_solvable() {
        return Err(format!("{size}x{size} maze seed {seed} is unsolvable"));
    }
    if !generated.walls_consistent() {
        return Err(format!("{size}x{size} maze seed {seed} has one-sided walls"));
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let kinds = match &args.game {
        Some(name) => vec![name.parse::<GameKind>()?],
        None => GameKind::ALL.to_vec(),
    };

    println!("Parlor Games - Soak Run");
    println!("=======================");
    println!("Games per engine: {}", args.games);
    println!("Mazes per size: {}", if args.skip_mazes { 0 } else { args.mazes });
    println!("Threads: {}", args.threads);
    println!("Seed: {}", args.seed);
    println!("-----------------------");

    #[cfg(debug_assertions)]
    println!("WARNING: Running in debug mode. Use --release for large runs.\n");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(args.threads).build()?;
    let stats = Mutex::new(SoakStats::default());
    let start = Instant::now();

    pool.install(|| {
        for &kind in &kinds {
            info!(%kind, games = args.games, "playing random games");
            (0..args.games).into_par_iter().for_each(|i| {
                let result = soak_game(kind, args.seed.wrapping_add(i as u64), args.max_plies);
                let mut stats = stats.lock();
                stats.games += 1;
                match result {
                    Ok((plies, finished)) => {
                        stats.moves += plies;
                        stats.finished += usize::from(finished);
                    }
                    Err(failure) => {
                        warn!(%failure, "invariant violated");
                        stats.failures.push(failure);
                    }
                }
            });
        }

        if !args.skip_mazes {
            for difficulty in [maze::Difficulty::Easy, maze::Difficulty::Hard, maze::Difficulty::VeryHard] {
                let size = difficulty.size();
                info!(size, mazes = args.mazes, "generating mazes");
                (0..args.mazes).into_par_iter().for_each(|i| {
                    let result = soak_maze(size, args.seed.wrapping_add(i as u64));
                    let mut stats = stats.lock();
                    stats.mazes += 1;
                    if let Err(failure) = result {
                        warn!(%failure, "invariant violated");
                        stats.failures.push(failure);
                    }
                });
            }
        }
    });

    let stats = stats.into_inner();
    print_stats(&stats, start.elapsed());
    if !stats.failures.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_stats(stats: &SoakStats, duration: Duration) {
    let secs = duration.as_secs_f64();
    println!("Results:");
    println!("  Games: {} ({} finished)", stats.games, stats.finished);
    println!("  Moves: {}", stats.moves);
    println!("  Mazes: {}", stats.mazes);
    println!("  Time: {:.3}s", secs);
    println!("  Moves/sec: {:.0}", stats.moves as f64 / secs.max(f64::EPSILON));

    if stats.failures.is_empty() {
        println!("{}", "All invariants held".green().bold());
    } else {
        println!("{}", format!("{} invariant violations", stats.failures.len()).red().bold());
        for failure in stats.failures.iter().take(20) {
            println!("  {}", failure.red());
        }
    }
}
