//! # Game Engines
//!
//! One module per game. Each module exposes pure board functions (move
//! generation, move application, terminal checks) plus a session type that
//! implements [`crate::GameState`]. The maze is single-player and has its own
//! session type instead.
//!
//! ## Engines
//! - **Chess**: 8x8, no castling, en passant or promotion
//! - **Checkers**: 8x8 dark squares, forced capture chains, kings
//! - **Othello**: 8x8 flanking placements with implicit passes
//! - **Tic-Tac-Toe**: 3x3 with random and negamax opponents
//! - **Maze**: depth-first carved perfect mazes with BFS solving
//!
//! ## Adding New Games
//! To add a new game, create a new module and implement:
//! 1. A move type with `Display` and `FromStr`
//! 2. A session type implementing `GameState`
//! 3. A variant in [`crate::game_wrapper`]

pub mod checkers;
pub mod chess;
pub mod maze;
pub mod othello;
pub mod tictactoe;
