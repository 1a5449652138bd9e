//! # Parlor Games - Demo Runner
//!
//! Plays computer-vs-computer games on the terminal and prints generated
//! mazes. Every random choice comes from one seeded generator, so a run is
//! reproducible with `--seed`.
//!
//! ```text
//! play --game checkers --seed 7 --every-ply
//! play --game maze --difficulty very-hard
//! RUST_LOG=parlor=debug play --game chess
//! ```

use clap::{Parser, ValueEnum};
use colored::Colorize;
use parlor::game_wrapper::{GameKind, GameWrapper};
use parlor::games::maze::{self, Difficulty, Direction, MazeState};
use parlor::{GameState, Result};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MazeSize {
    Easy,
    Hard,
    VeryHard,
}

impl From<MazeSize> for Difficulty {
    fn from(size: MazeSize) -> Self {
        match size {
            MazeSize::Easy => Difficulty::Easy,
            MazeSize::Hard => Difficulty::Hard,
            MazeSize::VeryHard => Difficulty::VeryHard,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// chess, checkers, othello, tictactoe, maze or all
    #[clap(short, long, default_value = "all")]
    game: String,

    /// Seed for every random choice in the run
    #[clap(short, long, default_value_t = 0)]
    seed: u64,

    /// Maze size preset
    #[clap(short, long, value_enum, default_value_t = MazeSize::Easy)]
    difficulty: MazeSize,

    /// Stop a game after this many moves
    #[clap(short, long, default_value_t = 400)]
    max_plies: usize,

    /// Print the board after every move instead of only the final position
    #[clap(long, action = clap::ArgAction::SetTrue)]
    every_ply: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(args.seed);
    info!(seed = args.seed, game = %args.game, "starting demo");

    let wanted = args.game.to_ascii_lowercase();
    let kinds: Vec<GameKind> = match wanted.as_str() {
        "all" => GameKind::ALL.to_vec(),
        "maze" => Vec::new(),
        other => vec![other.parse()?],
    };

    for kind in kinds {
        play_game(kind.new_game(), &args, &mut rng)?;
    }
    if matches!(wanted.as_str(), "all" | "maze") {
        walk_maze(args.difficulty.into(), &mut rng)?;
    }
    Ok(())
}

fn play_game(mut game: GameWrapper, args: &Args, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
    println!("{}", format!("== {} ==", game.kind()).bold().cyan());
    let mut plies = 0;
    while plies < args.max_plies && !game.is_terminal() {
        let mover = game.get_current_player();
        let Some(mv) = game.play_ai_move(rng)? else {
            break;
        };
        plies += 1;
        if args.every_ply {
            println!("{:>4}. {} plays {}", plies, mover, mv.to_string().yellow());
            println!("{}", game);
        }
    }

    if !args.every_ply {
        println!("{}", game);
    }
    let verdict = match (game.is_terminal(), game.get_winner()) {
        (true, Some(winner)) => format!("{} wins after {} moves", winner, plies).green(),
        (true, None) => format!("draw after {} moves", plies).yellow(),
        (false, _) => format!("stopped unfinished after {} moves", plies).red(),
    };
    println!("{}\n", verdict.bold());
    Ok(())
}

fn walk_maze(difficulty: Difficulty, rng: &mut Xoshiro256PlusPlus) -> Result<()> {
    let size = difficulty.size();
    println!("{}", format!("== maze {size}x{size} ==").bold().cyan());
    let mut session = MazeState::new(difficulty, rng)?;
    print!("{}", session.maze());

    let route = session.maze().shortest_path().unwrap_or_default();
    for pair in route.windows(2) {
        let step = Direction::ALL
            .into_iter()
            .find(|&dir| session.maze().step(pair[0], dir) == Some(pair[1]));
        if let Some(dir) = step {
            session.move_player(dir);
        }
    }

    let summary = format!(
        "solved in {} steps (goal {}), {} attempts allowed per maze",
        session.path().len().saturating_sub(1),
        session.goal(),
        maze::MAX_ATTEMPTS
    );
    if session.has_won() {
        println!("{}\n", summary.green().bold());
    } else {
        println!("{}\n", "maze walk did not reach the goal".red().bold());
    }
    Ok(())
}
