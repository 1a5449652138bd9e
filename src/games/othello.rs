//! # Othello (Reversi) Rules Engine
//!
//! Players take turns placing discs on an 8x8 board, with the goal of having
//! the most discs of their color when neither side can move.
//!
//! ## Rules
//! - A disc must "sandwich" a contiguous run of opponent discs between the new
//!   disc and an existing disc of the same color, in at least one of the eight
//!   directions
//! - Every sandwiched disc is flipped to the mover's color
//! - If the opponent has no legal placement the mover plays again
//! - The game ends when the board is full or neither player can move
//! - Winner is whoever has more discs; equal counts are a draw
//!
//! ## Computer player
//! The bot is a one-ply greedy search: every legal placement is simulated and
//! the resulting board scored by positional weights (corner 4, edge 2,
//! interior 1) summed over the bot's own discs. The first best placement in
//! row-major order wins ties.

use crate::error::{Result, RulesError};
use crate::GameState;
use grid_shared::{Grid, Position};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

pub const BOARD_SIZE: usize = 8;

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "Black"),
            Color::White => write!(f, "White"),
        }
    }
}

pub type OthelloBoard = Grid<Option<Color>>;

/// Creates the standard start: four discs in the centre, same colors on the
/// diagonals, White top-left.
pub fn new_board() -> OthelloBoard {
    let mut board = Grid::new(BOARD_SIZE, BOARD_SIZE, None);
    let mid = BOARD_SIZE / 2 - 1;
    board[Position::new(mid, mid)] = Some(Color::White);
    board[Position::new(mid, mid + 1)] = Some(Color::Black);
    board[Position::new(mid + 1, mid)] = Some(Color::Black);
    board[Position::new(mid + 1, mid + 1)] = Some(Color::White);
    board
}

/// Opponent discs captured in one direction from `pos`: the contiguous run
/// of opponent discs, kept only if a `side` disc closes it.
fn run_to_flip(board: &OthelloBoard, pos: Position, (dr, dc): (isize, isize), side: Color) -> Vec<Position> {
    let opponent = side.opponent();
    let mut line = Vec::new();
    let mut current = pos;
    while let Some(next) = board.offset(current, dr, dc) {
        match board[next] {
            Some(c) if c == opponent => line.push(next),
            Some(_) => return line,
            None => break,
        }
        current = next;
    }
    Vec::new()
}

/// Every disc that placing `side` at (`row`, `col`) would flip. Empty when
/// the placement is illegal.
pub fn flips(board: &OthelloBoard, row: usize, col: usize, side: Color) -> Vec<Position> {
    let pos = Position::new(row, col);
    if board.get(pos) != Some(&None) {
        return Vec::new();
    }
    DIRECTIONS
        .iter()
        .flat_map(|&dir| run_to_flip(board, pos, dir, side))
        .collect()
}

/// A placement is valid on an empty cell that sandwiches at least one run
/// of opponent discs.
pub fn is_valid_move(board: &OthelloBoard, row: usize, col: usize, side: Color) -> bool {
    let pos = Position::new(row, col);
    board.get(pos) == Some(&None)
        && DIRECTIONS
            .iter()
            .any(|&dir| !run_to_flip(board, pos, dir, side).is_empty())
}

pub fn valid_moves(board: &OthelloBoard, side: Color) -> Vec<Position> {
    board
        .positions()
        .filter(|pos| is_valid_move(board, pos.row, pos.col, side))
        .collect()
}

pub fn has_any_valid_move(board: &OthelloBoard, side: Color) -> bool {
    board
        .positions()
        .any(|pos| is_valid_move(board, pos.row, pos.col, side))
}

/// The board after a placement, plus the discs that were flipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub board: OthelloBoard,
    pub flipped: Vec<Position>,
}

/// Places a `side` disc and flips every sandwiched run.
pub fn apply_move(board: &OthelloBoard, row: usize, col: usize, side: Color) -> Result<Placement> {
    let pos = Position::new(row, col);
    if !board.contains(pos) {
        return Err(RulesError::OutOfBounds(pos));
    }
    let flipped = flips(board, row, col, side);
    if flipped.is_empty() {
        return Err(RulesError::InvalidPlacement(pos));
    }
    let mut next = board.clone();
    next[pos] = Some(side);
    for &disc in &flipped {
        next[disc] = Some(side);
    }
    Ok(Placement { board: next, flipped })
}

/// Disc totals for both colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DiscCount {
    pub black: usize,
    pub white: usize,
}

pub fn count_discs(board: &OthelloBoard) -> DiscCount {
    board
        .as_slice()
        .iter()
        .fold(DiscCount::default(), |mut count, cell| {
            match cell {
                Some(Color::Black) => count.black += 1,
                Some(Color::White) => count.white += 1,
                None => {}
            }
            count
        })
}

pub fn is_board_full(board: &OthelloBoard) -> bool {
    board.as_slice().iter().all(Option::is_some)
}

pub fn is_game_over(board: &OthelloBoard) -> bool {
    is_board_full(board)
        || (!has_any_valid_move(board, Color::Black) && !has_any_valid_move(board, Color::White))
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Winner(Color),
    Draw,
}

/// Result by disc count. Meaningful once [`is_game_over`] holds.
pub fn outcome(board: &OthelloBoard) -> Outcome {
    let count = count_discs(board);
    match count.black.cmp(&count.white) {
        std::cmp::Ordering::Greater => Outcome::Winner(Color::Black),
        std::cmp::Ordering::Less => Outcome::Winner(Color::White),
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

/// Who moves after `mover` has played on `board`: the opponent if they can,
/// otherwise `mover` again, otherwise nobody (game over).
pub fn next_turn(board: &OthelloBoard, mover: Color) -> Option<Color> {
    if is_board_full(board) {
        None
    } else if has_any_valid_move(board, mover.opponent()) {
        Some(mover.opponent())
    } else if has_any_valid_move(board, mover) {
        Some(mover)
    } else {
        None
    }
}

/// Static weight of a cell: corners 4, other edge cells 2, interior 1.
pub fn position_weight(board: &OthelloBoard, pos: Position) -> i32 {
    let last_row = board.rows().saturating_sub(1);
    let last_col = board.cols().saturating_sub(1);
    let on_row_edge = pos.row == 0 || pos.row == last_row;
    let on_col_edge = pos.col == 0 || pos.col == last_col;
    match (on_row_edge, on_col_edge) {
        (true, true) => 4,
        (true, false) | (false, true) => 2,
        (false, false) => 1,
    }
}

/// Sum of positional weights over `side`'s discs.
pub fn evaluate(board: &OthelloBoard, side: Color) -> i32 {
    board
        .iter()
        .filter(|(_, cell)| **cell == Some(side))
        .map(|(pos, _)| position_weight(board, pos))
        .sum()
}

/// The bot's placement for `side`, or `None` if `side` has no valid move.
pub fn choose_ai_move(board: &OthelloBoard, side: Color) -> Option<Position> {
    let mut best: Option<(Position, i32)> = None;
    for pos in valid_moves(board, side) {
        let Ok(placement) = apply_move(board, pos.row, pos.col, side) else {
            continue;
        };
        let score = evaluate(&placement.board, side);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((pos, score));
        }
    }
    best.map(|(pos, _)| pos)
}

/// Represents a move in Othello
///
/// Contains the row and column coordinates where a player wants to place their piece.
/// Both coordinates are 0-based indices.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct OthelloMove(pub usize, pub usize);

impl fmt::Display for OthelloMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

impl FromStr for OthelloMove {
    type Err = RulesError;

    /// Creates an OthelloMove from a string representation
    ///
    /// Expected format is "row,col" where both are 0-based indices.
    ///
    /// # Examples
    /// ```
    /// use parlor::games::othello::OthelloMove;
    /// let mv: OthelloMove = "3,4".parse().unwrap();
    /// assert_eq!(mv, OthelloMove(3, 4));
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let pos: Position = s.parse()?;
        Ok(OthelloMove(pos.row, pos.col))
    }
}

/// Represents the complete state of an Othello game
///
/// Contains the board, the side to move, whether the bot plays White, and
/// the last placement.
#[derive(Debug, Clone)]
pub struct OthelloState {
    board: OthelloBoard,
    /// Side to move
    current: Color,
    game_over: bool,
    /// The bot plays White when enabled
    bot_enabled: bool,
    last_move: Option<Position>,
}

impl Default for OthelloState {
    fn default() -> Self {
        Self::new()
    }
}

impl OthelloState {
    /// Creates a new game with the standard starting position. Black moves first.
    pub fn new() -> Self {
        Self::from_position(new_board(), Color::Black)
    }

    /// Starts a session from an arbitrary position. If `current` has no
    /// placement but the opponent does, the turn passes straight away.
    pub fn from_position(board: OthelloBoard, current: Color) -> Self {
        let game_over = is_game_over(&board);
        let current = if !game_over && !has_any_valid_move(&board, current) {
            current.opponent()
        } else {
            current
        };
        Self {
            board,
            current,
            game_over,
            bot_enabled: false,
            last_move: None,
        }
    }

    /// Starts over; the bot setting is kept.
    pub fn reset(&mut self) {
        let bot_enabled = self.bot_enabled;
        *self = Self::new();
        self.bot_enabled = bot_enabled;
    }

    pub fn board(&self) -> &OthelloBoard {
        &self.board
    }

    pub fn last_move(&self) -> Option<Position> {
        self.last_move
    }

    pub fn disc_count(&self) -> DiscCount {
        count_discs(&self.board)
    }

    pub fn bot_enabled(&self) -> bool {
        self.bot_enabled
    }

    pub fn set_bot_enabled(&mut self, enabled: bool) {
        self.bot_enabled = enabled;
    }

    pub fn is_bot_turn(&self) -> bool {
        self.bot_enabled && self.current == Color::White && !self.game_over
    }

    /// Checks if a move is legal in the current game state
    pub fn is_legal(&self, mv: &OthelloMove) -> bool {
        !self.game_over && is_valid_move(&self.board, mv.0, mv.1, self.current)
    }

    /// Final result, once the game is over.
    pub fn outcome(&self) -> Option<Outcome> {
        self.game_over.then(|| outcome(&self.board))
    }

    /// Plays the greedy bot's placement for the side to move.
    pub fn play_ai_move(&mut self) -> Result<Option<OthelloMove>> {
        let Some(pos) = choose_ai_move(&self.board, self.current) else {
            return Ok(None);
        };
        let mv = OthelloMove(pos.row, pos.col);
        self.make_move(&mv)?;
        Ok(Some(mv))
    }
}

impl fmt::Display for OthelloState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.row_slices() {
            for cell in row {
                let symbol = match cell {
                    Some(Color::Black) => "X",
                    Some(Color::White) => "O",
                    None => ".",
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for OthelloState {
    type Move = OthelloMove;
    type Side = Color;

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        if self.game_over {
            return Vec::new();
        }
        valid_moves(&self.board, self.current)
            .into_iter()
            .map(|pos| OthelloMove(pos.row, pos.col))
            .collect()
    }

    #[instrument(skip(self), fields(side = %self.current))]
    fn make_move(&mut self, mv: &Self::Move) -> Result<()> {
        if self.game_over {
            return Err(RulesError::GameOver);
        }
        let placement = apply_move(&self.board, mv.0, mv.1, self.current)?;
        self.board = placement.board;
        self.last_move = Some(Position::new(mv.0, mv.1));

        match next_turn(&self.board, self.current) {
            Some(next) if next == self.current => {
                debug!(%mv, flipped = placement.flipped.len(), "opponent has no move, turn passes back");
            }
            Some(next) => {
                debug!(%mv, flipped = placement.flipped.len(), "othello move applied");
                self.current = next;
            }
            None => {
                debug!(%mv, outcome = ?outcome(&self.board), "othello game over");
                self.game_over = true;
            }
        }
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.game_over
    }

    fn get_winner(&self) -> Option<Color> {
        match self.outcome()? {
            Outcome::Winner(color) => Some(color),
            Outcome::Draw => None,
        }
    }

    fn get_current_player(&self) -> Color {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_opening_moves() {
        let board = new_board();
        assert_eq!(
            valid_moves(&board, Color::Black),
            vec![p(2, 3), p(3, 2), p(4, 5), p(5, 4)]
        );
        assert!(!is_valid_move(&board, 3, 3, Color::Black));
        assert!(!is_valid_move(&board, 0, 0, Color::Black));
        assert!(!is_valid_move(&board, 9, 0, Color::Black));
    }

    #[test]
    fn test_apply_flips_single_disc() {
        let board = new_board();
        let placement = apply_move(&board, 2, 3, Color::Black).unwrap();
        assert_eq!(placement.flipped, vec![p(3, 3)]);
        assert_eq!(placement.board[p(3, 3)], Some(Color::Black));
        assert_eq!(count_discs(&placement.board), DiscCount { black: 4, white: 1 });
    }

    #[test]
    fn test_invalid_placement_rejected() {
        let board = new_board();
        assert_eq!(
            apply_move(&board, 0, 0, Color::Black),
            Err(RulesError::InvalidPlacement(p(0, 0)))
        );
        assert_eq!(
            apply_move(&board, 8, 0, Color::Black),
            Err(RulesError::OutOfBounds(p(8, 0)))
        );
    }

    #[test]
    fn test_position_weights() {
        let board = new_board();
        assert_eq!(position_weight(&board, p(0, 0)), 4);
        assert_eq!(position_weight(&board, p(7, 7)), 4);
        assert_eq!(position_weight(&board, p(0, 3)), 2);
        assert_eq!(position_weight(&board, p(4, 7)), 2);
        assert_eq!(position_weight(&board, p(3, 3)), 1);
        assert_eq!(evaluate(&board, Color::Black), 2);
    }

    #[test]
    fn test_ai_takes_first_of_equal_moves() {
        // all four openings score the same for Black
        let board = new_board();
        assert_eq!(choose_ai_move(&board, Color::Black), Some(p(2, 3)));
    }

    #[test]
    fn test_ai_prefers_corner() {
        let mut board = Grid::new(BOARD_SIZE, BOARD_SIZE, None);
        board[p(0, 1)] = Some(Color::Black);
        board[p(0, 2)] = Some(Color::White);
        board[p(4, 4)] = Some(Color::Black);
        board[p(5, 5)] = Some(Color::White);
        assert_eq!(valid_moves(&board, Color::White), vec![p(0, 0), p(3, 3)]);
        assert_eq!(choose_ai_move(&board, Color::White), Some(p(0, 0)));
    }

    #[test]
    fn test_turn_passes_back_when_opponent_stuck() {
        // White can only answer from a single cell; after Black takes the
        // last disc White has nothing and Black moves again.
        let mut board = Grid::new(BOARD_SIZE, BOARD_SIZE, None);
        board[p(0, 0)] = Some(Color::Black);
        board[p(0, 1)] = Some(Color::White);
        board[p(7, 0)] = Some(Color::Black);
        board[p(7, 1)] = Some(Color::White);
        let mut game = OthelloState::from_position(board, Color::Black);
        game.make_move(&OthelloMove(0, 2)).unwrap();
        assert_eq!(game.get_current_player(), Color::Black);
        assert!(!game.is_terminal());
        game.make_move(&OthelloMove(7, 2)).unwrap();
        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), Some(Color::Black));
    }

    #[test]
    fn test_bot_turn() {
        let mut game = OthelloState::new();
        game.set_bot_enabled(true);
        assert!(!game.is_bot_turn());
        game.make_move(&"2,3".parse().unwrap()).unwrap();
        assert!(game.is_bot_turn());
        let mv = game.play_ai_move().unwrap().unwrap();
        assert_eq!(game.last_move(), Some(p(mv.0, mv.1)));
        assert_eq!(game.get_current_player(), Color::Black);
    }
}
