//! # Parlor Games
//!
//! Rule engines for a family of turn-based board games plus a maze generator.
//! Each engine in [`games`] is a set of pure functions over a board value
//! (legal-move queries, move application, terminal checks) and a session type
//! that tracks side-to-move, selection and scores on top of those functions.
//!
//! ## Engines
//! - **Chess**: per-piece move generation with a self-check filter
//! - **Checkers**: simple moves, jumps, forced capture chains, kings
//! - **Othello**: directional flips, implicit passes, greedy positional bot
//! - **Tic-Tac-Toe**: line detection and a full negamax opponent
//! - **Maze**: randomized depth-first carving with BFS solvability checks
//!
//! Boards are [`Grid`] values from the `grid-shared` crate. Every move returns
//! a fresh board; nothing is shared between sessions or engines.

pub mod error;
pub mod game_wrapper;
pub mod games;

pub use error::{Result, RulesError};
pub use grid_shared::{in_bounds, Grid, ParsePositionError, Position};

use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt::Debug;
use std::hash::Hash;

/// The state of a two-player game session.
///
/// `Send` and `Sync` are required so sessions can be driven from worker
/// threads (see the `soak` binary).
pub trait GameState: Clone + Send + Sync {
    /// The type of a move in the game.
    type Move: Clone + Eq + Hash + Debug + Send + Sync;
    /// The two-valued side identifier.
    type Side: Copy + Eq + Debug + Send + Sync;

    /// Returns every move the side to move may legally play.
    fn get_possible_moves(&self) -> Vec<Self::Move>;
    /// Validates and applies a move. On error the state is unchanged.
    fn make_move(&mut self, mv: &Self::Move) -> Result<()>;
    /// Returns true if the game is over.
    fn is_terminal(&self) -> bool;
    /// Returns the winner once the game is over, `None` for a draw or an
    /// unfinished game.
    fn get_winner(&self) -> Option<Self::Side>;
    /// Returns the side whose turn it is.
    fn get_current_player(&self) -> Self::Side;
}

/// Plays uniformly random legal moves until the game ends or `max_plies`
/// moves have been made. Returns the number of moves played.
pub fn random_playout<S, R>(state: &mut S, rng: &mut R, max_plies: usize) -> Result<usize>
where
    S: GameState,
    R: Rng + ?Sized,
{
    let mut plies = 0;
    while plies < max_plies && !state.is_terminal() {
        let moves = state.get_possible_moves();
        let Some(mv) = moves.choose(rng) else {
            break;
        };
        state.make_move(mv)?;
        plies += 1;
    }
    Ok(plies)
}
