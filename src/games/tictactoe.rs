//! # Tic-Tac-Toe
//!
//! 3x3 noughts and crosses. X moves first. Three in a row along a row, column
//! or diagonal wins; a full board with no line is a draw.
//!
//! The computer opponent has two levels: [`Difficulty::Easy`] picks any empty
//! cell uniformly at random, [`Difficulty::Hard`] searches the whole game tree
//! with negamax and never loses.

use crate::error::{Result, RulesError};
use crate::GameState;
use grid_shared::{check_line_win, Grid, Position};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

pub const BOARD_SIZE: usize = 3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

pub type TicTacToeBoard = Grid<Option<Mark>>;

pub fn new_board() -> TicTacToeBoard {
    Grid::new(BOARD_SIZE, BOARD_SIZE, None)
}

/// The mark holding a complete line, if any.
pub fn winner(board: &TicTacToeBoard) -> Option<Mark> {
    [Mark::X, Mark::O]
        .into_iter()
        .find(|&mark| check_line_win(board.as_slice(), board.cols(), board.rows(), &Some(mark), BOARD_SIZE))
}

pub fn empty_cells(board: &TicTacToeBoard) -> Vec<Position> {
    board.iter().filter(|(_, cell)| cell.is_none()).map(|(pos, _)| pos).collect()
}

pub fn is_draw(board: &TicTacToeBoard) -> bool {
    winner(board).is_none() && board.as_slice().iter().all(Option::is_some)
}

/// Negamax value of `board` for `to_move`. Wins are worth more the sooner
/// they happen.
fn negamax(board: &mut TicTacToeBoard, to_move: Mark) -> i32 {
    let empties = empty_cells(board);
    if winner(board).is_some() {
        // the previous mover just completed a line
        return -(empties.len() as i32 + 1);
    }
    if empties.is_empty() {
        return 0;
    }
    let mut best = i32::MIN;
    for pos in empties {
        board[pos] = Some(to_move);
        best = best.max(-negamax(board, to_move.opponent()));
        board[pos] = None;
    }
    best
}

/// The strongest move for `to_move`. Ties go to the first cell in row-major
/// order. Returns `None` when the game is already decided.
pub fn best_move(board: &TicTacToeBoard, to_move: Mark) -> Option<Position> {
    if winner(board).is_some() {
        return None;
    }
    let mut scratch = board.clone();
    let mut best: Option<(Position, i32)> = None;
    for pos in empty_cells(board) {
        scratch[pos] = Some(to_move);
        let score = -negamax(&mut scratch, to_move.opponent());
        scratch[pos] = None;
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((pos, score));
        }
    }
    best.map(|(pos, _)| pos)
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

pub fn choose_ai_move<R: Rng + ?Sized>(
    board: &TicTacToeBoard,
    to_move: Mark,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<Position> {
    if winner(board).is_some() {
        return None;
    }
    match difficulty {
        Difficulty::Easy => empty_cells(board).choose(rng).copied(),
        Difficulty::Hard => best_move(board, to_move),
    }
}

/// A mark placed at `(row, col)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TicTacToeMove(pub usize, pub usize);

impl TicTacToeMove {
    pub fn position(self) -> Position {
        Position::new(self.0, self.1)
    }
}

impl From<Position> for TicTacToeMove {
    fn from(pos: Position) -> Self {
        TicTacToeMove(pos.row, pos.col)
    }
}

impl fmt::Display for TicTacToeMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

impl FromStr for TicTacToeMove {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self::from(s.parse::<Position>()?))
    }
}

/// Session scoreboard, kept across resets.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Scores {
    pub x: u32,
    pub o: u32,
    pub draws: u32,
}

#[derive(Debug, Clone)]
pub struct TicTacToeState {
    board: TicTacToeBoard,
    current: Mark,
    winner: Option<Mark>,
    scores: Scores,
}

impl Default for TicTacToeState {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToeState {
    pub fn new() -> Self {
        Self {
            board: new_board(),
            current: Mark::X,
            winner: None,
            scores: Scores::default(),
        }
    }

    /// Clears the board for another round. X starts again; scores stay.
    pub fn reset(&mut self) {
        self.board = new_board();
        self.current = Mark::X;
        self.winner = None;
    }

    pub fn board(&self) -> &TicTacToeBoard {
        &self.board
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }

    pub fn is_draw(&self) -> bool {
        is_draw(&self.board)
    }

    pub fn play_ai_move<R: Rng + ?Sized>(&mut self, difficulty: Difficulty, rng: &mut R) -> Result<Option<TicTacToeMove>> {
        let Some(pos) = choose_ai_move(&self.board, self.current, difficulty, rng) else {
            return Ok(None);
        };
        let mv = TicTacToeMove::from(pos);
        self.make_move(&mv)?;
        Ok(Some(mv))
    }
}

impl fmt::Display for TicTacToeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.row_slices() {
            for cell in row {
                match cell {
                    Some(mark) => write!(f, "{} ", mark)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for TicTacToeState {
    type Move = TicTacToeMove;
    type Side = Mark;

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        if self.is_terminal() {
            return Vec::new();
        }
        empty_cells(&self.board).into_iter().map(TicTacToeMove::from).collect()
    }

    #[instrument(skip(self), fields(mark = %self.current))]
    fn make_move(&mut self, mv: &Self::Move) -> Result<()> {
        let pos = mv.position();
        if self.is_terminal() {
            warn!(%mv, "move after game end rejected");
            return Err(RulesError::GameOver);
        }
        match self.board.get(pos) {
            None => return Err(RulesError::OutOfBounds(pos)),
            Some(Some(_)) => {
                warn!(%mv, "occupied cell rejected");
                return Err(RulesError::InvalidPlacement(pos));
            }
            Some(None) => {}
        }

        self.board[pos] = Some(self.current);
        debug!(%mv, "mark placed");
        if let Some(mark) = winner(&self.board) {
            self.winner = Some(mark);
            match mark {
                Mark::X => self.scores.x += 1,
                Mark::O => self.scores.o += 1,
            }
        } else if is_draw(&self.board) {
            self.scores.draws += 1;
        }
        self.current = self.current.opponent();
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_draw()
    }

    fn get_winner(&self) -> Option<Self::Side> {
        self.winner
    }

    fn get_current_player(&self) -> Self::Side {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn play(state: &mut TicTacToeState, moves: &[(usize, usize)]) {
        for &(r, c) in moves {
            state.make_move(&TicTacToeMove(r, c)).unwrap();
        }
    }

    #[test]
    fn test_row_win_scores_x() {
        let mut state = TicTacToeState::new();
        play(&mut state, &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)]);
        assert!(state.is_terminal());
        assert_eq!(state.get_winner(), Some(Mark::X));
        assert_eq!(state.scores(), Scores { x: 1, o: 0, draws: 0 });
        assert!(state.get_possible_moves().is_empty());
        assert_eq!(state.make_move(&TicTacToeMove(2, 2)), Err(RulesError::GameOver));
    }

    #[test]
    fn test_draw_counts_and_reset_keeps_scores() {
        let mut state = TicTacToeState::new();
        // X O X / X O O / O X X
        play(
            &mut state,
            &[(0, 0), (0, 1), (0, 2), (1, 1), (1, 0), (1, 2), (2, 1), (2, 0), (2, 2)],
        );
        assert!(state.is_draw());
        assert_eq!(state.get_winner(), None);
        assert_eq!(state.scores().draws, 1);

        state.reset();
        assert_eq!(state.get_possible_moves().len(), 9);
        assert_eq!(state.get_current_player(), Mark::X);
        assert_eq!(state.scores().draws, 1);
    }

    #[test]
    fn test_occupied_cell_rejected() {
        let mut state = TicTacToeState::new();
        play(&mut state, &[(1, 1)]);
        assert_eq!(
            state.make_move(&TicTacToeMove(1, 1)),
            Err(RulesError::InvalidPlacement(Position::new(1, 1)))
        );
        assert_eq!(state.get_current_player(), Mark::O);
        assert_eq!(
            state.make_move(&TicTacToeMove(3, 0)),
            Err(RulesError::OutOfBounds(Position::new(3, 0)))
        );
    }

    #[test]
    fn test_hard_ai_takes_win() {
        let mut board = new_board();
        board[Position::new(0, 0)] = Some(Mark::O);
        board[Position::new(0, 1)] = Some(Mark::O);
        board[Position::new(1, 0)] = Some(Mark::X);
        board[Position::new(1, 1)] = Some(Mark::X);
        board[Position::new(2, 2)] = Some(Mark::X);
        assert_eq!(best_move(&board, Mark::O), Some(Position::new(0, 2)));
    }

    #[test]
    fn test_hard_ai_blocks() {
        let mut board = new_board();
        board[Position::new(0, 0)] = Some(Mark::X);
        board[Position::new(1, 0)] = Some(Mark::X);
        board[Position::new(1, 1)] = Some(Mark::O);
        assert_eq!(best_move(&board, Mark::O), Some(Position::new(2, 0)));
    }

    #[test]
    fn test_hard_self_play_is_draw() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let mut state = TicTacToeState::new();
        while state.play_ai_move(Difficulty::Hard, &mut rng).unwrap().is_some() {}
        assert!(state.is_draw());
    }

    #[test]
    fn test_easy_ai_places_own_mark() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(9);
        let mut state = TicTacToeState::new();
        let mv = state.play_ai_move(Difficulty::Easy, &mut rng).unwrap().unwrap();
        assert_eq!(state.board()[mv.position()], Some(Mark::X));
    }

    #[test]
    fn test_parse_move() {
        assert_eq!("2,1".parse::<TicTacToeMove>(), Ok(TicTacToeMove(2, 1)));
        assert!(matches!("x".parse::<TicTacToeMove>(), Err(RulesError::Parse(_))));
    }
}
