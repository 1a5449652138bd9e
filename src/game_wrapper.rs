//! # Game Wrapper Module
//!
//! Enum dispatch over the two-player engines so the binaries can drive any of
//! them through one [`GameState`] implementation. Each engine keeps its own
//! move and side types; the wrapper enums only tag them with the game they
//! belong to.
//!
//! Pairing a move with the wrong game is rejected with
//! [`RulesError::MismatchedGame`] rather than panicking.

use crate::error::{Result, RulesError};
use crate::games::checkers::{self, CheckersMove, CheckersState, GameMode};
use crate::games::chess::{self, ChessMove, ChessState};
use crate::games::othello::{self, OthelloMove, OthelloState};
use crate::games::tictactoe::{Difficulty, Mark, TicTacToeMove, TicTacToeState};
use crate::GameState;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Selects which engine a [`GameWrapper`] is built around.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameKind {
    Chess,
    Checkers,
    Othello,
    TicTacToe,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [GameKind::Chess, GameKind::Checkers, GameKind::Othello, GameKind::TicTacToe];

    /// A fresh session in the starting position.
    pub fn new_game(self) -> GameWrapper {
        match self {
            GameKind::Chess => GameWrapper::Chess(ChessState::new()),
            GameKind::Checkers => GameWrapper::Checkers(CheckersState::new(GameMode::PlayerVsPlayer)),
            GameKind::Othello => GameWrapper::Othello(OthelloState::new()),
            GameKind::TicTacToe => GameWrapper::TicTacToe(TicTacToeState::new()),
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameKind::Chess => "chess",
            GameKind::Checkers => "checkers",
            GameKind::Othello => "othello",
            GameKind::TicTacToe => "tictactoe",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GameKind {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chess" => Ok(GameKind::Chess),
            "checkers" => Ok(GameKind::Checkers),
            "othello" | "reversi" => Ok(GameKind::Othello),
            "tictactoe" | "tic-tac-toe" => Ok(GameKind::TicTacToe),
            other => Err(RulesError::Parse(format!("unknown game '{other}'"))),
        }
    }
}

/// A session of any supported two-player game.
#[derive(Debug, Clone)]
pub enum GameWrapper {
    /// Chess without castling, en passant or promotion
    Chess(ChessState),
    /// Checkers with forced capture chains
    Checkers(CheckersState),
    /// Othello with implicit passes
    Othello(OthelloState),
    TicTacToe(TicTacToeState),
}

/// A move tagged with the game it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MoveWrapper {
    /// `r,c-r,c`, shown as `Ch(..)`
    Chess(ChessMove),
    /// `r,c-r,c`, shown as `Ck(..)`
    Checkers(CheckersMove),
    /// `r,c`, shown as `O(..)`
    Othello(OthelloMove),
    /// `r,c`, shown as `T(..)`
    TicTacToe(TicTacToeMove),
}

/// A side tagged with the game it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideWrapper {
    /// White moves first
    Chess(chess::Color),
    /// Red moves first
    Checkers(checkers::Color),
    /// Black moves first
    Othello(othello::Color),
    /// X moves first
    TicTacToe(Mark),
}

impl fmt::Display for MoveWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveWrapper::Chess(m) => write!(f, "Ch({})", m),
            MoveWrapper::Checkers(m) => write!(f, "Ck({})", m),
            MoveWrapper::Othello(m) => write!(f, "O({})", m),
            MoveWrapper::TicTacToe(m) => write!(f, "T({})", m),
        }
    }
}

impl fmt::Display for SideWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideWrapper::Chess(c) => write!(f, "{}", c),
            SideWrapper::Checkers(c) => write!(f, "{}", c),
            SideWrapper::Othello(c) => write!(f, "{}", c),
            SideWrapper::TicTacToe(m) => write!(f, "{}", m),
        }
    }
}

impl fmt::Display for GameWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameWrapper::Chess(g) => write!(f, "{}", g),
            GameWrapper::Checkers(g) => write!(f, "{}", g),
            GameWrapper::Othello(g) => write!(f, "{}", g),
            GameWrapper::TicTacToe(g) => write!(f, "{}", g),
        }
    }
}

macro_rules! impl_game_dispatch {
    ($($variant:ident),*) => {
        impl GameState for GameWrapper {
            type Move = MoveWrapper;
            type Side = SideWrapper;

            fn get_possible_moves(&self) -> Vec<Self::Move> {
                match self {
                    $(GameWrapper::$variant(g) => g
                        .get_possible_moves()
                        .into_iter()
                        .map(MoveWrapper::$variant)
                        .collect(),)*
                }
            }

            fn make_move(&mut self, mv: &Self::Move) -> Result<()> {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => g.make_move(m),)*
                    _ => Err(RulesError::MismatchedGame),
                }
            }

            fn is_terminal(&self) -> bool {
                match self {
                    $(GameWrapper::$variant(g) => g.is_terminal(),)*
                }
            }

            fn get_winner(&self) -> Option<Self::Side> {
                match self {
                    $(GameWrapper::$variant(g) => g.get_winner().map(SideWrapper::$variant),)*
                }
            }

            fn get_current_player(&self) -> Self::Side {
                match self {
                    $(GameWrapper::$variant(g) => SideWrapper::$variant(g.get_current_player()),)*
                }
            }
        }

        impl GameWrapper {
            pub fn kind(&self) -> GameKind {
                match self {
                    $(GameWrapper::$variant(_) => GameKind::$variant,)*
                }
            }

            /// Checks if a move is legal in the current game state
            pub fn is_legal(&self, mv: &MoveWrapper) -> bool {
                match (self, mv) {
                    $((GameWrapper::$variant(g), MoveWrapper::$variant(m)) => {
                        g.get_possible_moves().contains(m)
                    })*
                    _ => false,
                }
            }
        }
    };
}

impl_game_dispatch!(Chess, Checkers, Othello, TicTacToe);

impl GameWrapper {
    /// Plays each engine's computer move for the side to move: random for
    /// chess, capture-first random for checkers, greedy for othello and
    /// negamax for tic-tac-toe. Returns `None` when there is nothing to play.
    pub fn play_ai_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<MoveWrapper>> {
        match self {
            GameWrapper::Chess(g) => {
                let Some(mv) = g.get_possible_moves().choose(rng).copied() else {
                    return Ok(None);
                };
                g.make_move(&mv)?;
                Ok(Some(MoveWrapper::Chess(mv)))
            }
            GameWrapper::Checkers(g) => Ok(g.play_ai_move(rng)?.map(MoveWrapper::Checkers)),
            GameWrapper::Othello(g) => Ok(g.play_ai_move()?.map(MoveWrapper::Othello)),
            GameWrapper::TicTacToe(g) => Ok(g.play_ai_move(Difficulty::Hard, rng)?.map(MoveWrapper::TicTacToe)),
        }
    }

    /// Parses move text in the notation of the wrapped game.
    pub fn parse_move(&self, text: &str) -> Result<MoveWrapper> {
        match self {
            GameWrapper::Chess(_) => text.parse().map(MoveWrapper::Chess),
            GameWrapper::Checkers(_) => text.parse().map(MoveWrapper::Checkers),
            GameWrapper::Othello(_) => text.parse().map(MoveWrapper::Othello),
            GameWrapper::TicTacToe(_) => text.parse().map(MoveWrapper::TicTacToe),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_display() {
        let move_wrapper = MoveWrapper::Othello(OthelloMove(1, 2));
        assert_eq!(format!("{}", move_wrapper), "O(1,2)");

        let game_wrapper = GameKind::TicTacToe.new_game();
        assert_eq!(format!("{}", game_wrapper), ". . . \n. . . \n. . . \n");
    }

    #[test]
    fn test_mismatched_move_rejected() {
        let mut game = GameKind::Chess.new_game();
        let mv = MoveWrapper::TicTacToe(TicTacToeMove(0, 0));
        assert!(!game.is_legal(&mv));
        assert_eq!(game.make_move(&mv), Err(RulesError::MismatchedGame));
        assert_eq!(game.get_current_player(), SideWrapper::Chess(chess::Color::White));
    }

    #[test]
    fn test_parse_and_play() {
        let mut game = GameKind::Othello.new_game();
        let mv = game.parse_move("2,3").unwrap();
        assert!(game.is_legal(&mv));
        game.make_move(&mv).unwrap();
        assert_eq!(game.get_current_player(), SideWrapper::Othello(othello::Color::White));
    }

    #[test]
    fn test_first_mover_per_game() {
        let first: Vec<SideWrapper> = GameKind::ALL
            .iter()
            .map(|kind| kind.new_game().get_current_player())
            .collect();
        assert_eq!(
            first,
            vec![
                SideWrapper::Chess(chess::Color::White),
                SideWrapper::Checkers(checkers::Color::Red),
                SideWrapper::Othello(othello::Color::Black),
                SideWrapper::TicTacToe(Mark::X),
            ]
        );
    }

    #[test]
    fn test_kind_round_trips_through_name() {
        for kind in GameKind::ALL {
            assert_eq!(kind.to_string().parse::<GameKind>(), Ok(kind));
            assert_eq!(kind.new_game().kind(), kind);
        }
        assert!("go".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_ai_plays_every_game_to_the_end() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for kind in GameKind::ALL {
            let mut game = kind.new_game();
            let mut plies = 0;
            while plies < 300 {
                match game.play_ai_move(&mut rng).unwrap() {
                    Some(_) => plies += 1,
                    None => break,
                }
            }
            assert!(plies > 0, "{kind} made no moves");
        }
    }
}
