//! # Checkers Rules Engine
//!
//! American-style checkers on an 8x8 board with the pieces on dark squares.
//!
//! ## Rules
//! - Red starts on rows 5-7 and moves toward row 0; Black starts on rows 0-2
//!   and moves toward row 7. Red moves first.
//! - A plain piece steps one square diagonally forward; a king steps in both
//!   vertical directions.
//! - A piece jumps an adjacent opponent when the square beyond it is empty.
//!   A jump is identified by its landing square two rows away; the captured
//!   piece sits on the midpoint.
//! - A piece reaching the far row is crowned.
//! - After a capture, if the same piece can jump again it must keep jumping
//!   and the turn does not pass.
//! - Capturing is not compulsory at the start of a turn.

use crate::error::{Result, RulesError};
use crate::GameState;
use grid_shared::{Grid, Position};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

pub const BOARD_SIZE: usize = 8;
/// Men each side starts with.
pub const PIECES_PER_SIDE: usize = 12;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    fn forward(self) -> isize {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }

    /// Row on which this color's pieces are crowned.
    pub fn crowning_row(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => BOARD_SIZE - 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub color: Color,
    pub king: bool,
}

impl Piece {
    pub const fn man(color: Color) -> Self {
        Self { color, king: false }
    }

    pub const fn king(color: Color) -> Self {
        Self { color, king: true }
    }

    fn row_directions(self) -> &'static [isize] {
        if self.king {
            &[-1, 1]
        } else if self.color.forward() < 0 {
            &[-1]
        } else {
            &[1]
        }
    }
}

pub type CheckersBoard = Grid<Option<Piece>>;

/// Creates the starting position: twelve pieces per side on dark squares.
pub fn new_board() -> CheckersBoard {
    Grid::from_fn(BOARD_SIZE, BOARD_SIZE, |pos| {
        if (pos.row + pos.col) % 2 == 0 {
            None
        } else if pos.row < 3 {
            Some(Piece::man(Color::Black))
        } else if pos.row >= BOARD_SIZE - 3 {
            Some(Piece::man(Color::Red))
        } else {
            None
        }
    })
}

pub fn empty_board() -> CheckersBoard {
    Grid::new(BOARD_SIZE, BOARD_SIZE, None)
}

fn piece_at(board: &CheckersBoard, pos: Position) -> Option<Piece> {
    board.get(pos).copied().flatten()
}

/// Destination squares for the piece on `from`: simple steps onto empty
/// neighbours and landing squares of available jumps.
pub fn legal_moves(board: &CheckersBoard, from: Position) -> Vec<Position> {
    let Some(piece) = piece_at(board, from) else {
        return Vec::new();
    };
    let mut moves = Vec::new();
    for &dr in piece.row_directions() {
        for dc in [-1, 1] {
            let Some(next) = board.offset(from, dr, dc) else {
                continue;
            };
            match piece_at(board, next) {
                None => moves.push(next),
                Some(other) if other.color != piece.color => {
                    if let Some(landing) = board.offset(next, dr, dc) {
                        if piece_at(board, landing).is_none() {
                            moves.push(landing);
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }
    moves
}

/// Only the capturing destinations for the piece on `from`.
pub fn jump_moves(board: &CheckersBoard, from: Position) -> Vec<Position> {
    legal_moves(board, from)
        .into_iter()
        .filter(|&to| from.distance(to) == 2)
        .collect()
}

/// Every move available to `side`, in row-major order of the moving piece.
pub fn all_legal_moves(board: &CheckersBoard, side: Color) -> Vec<CheckersMove> {
    board
        .iter()
        .filter(|(_, cell)| matches!(cell, Some(p) if p.color == side))
        .flat_map(|(from, _)| {
            legal_moves(board, from)
                .into_iter()
                .map(move |to| CheckersMove { from, to })
        })
        .collect()
}

/// Result of applying a checkers move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: CheckersBoard,
    /// Square of the jumped piece, if the move was a capture
    pub captured: Option<Position>,
    /// True if the moving piece was crowned by this move
    pub promoted: bool,
}

/// Relocates the piece, removes a jumped piece and crowns on the far row,
/// without checking that the move is legal.
pub fn apply_move_unchecked(board: &CheckersBoard, from: Position, to: Position) -> MoveOutcome {
    let mut next = board.clone();
    let mut captured = None;
    let mut promoted = false;

    if let Some(mut piece) = next.get_mut(from).and_then(Option::take) {
        if from.distance(to) == 2 {
            if let Some(mid) = from.midpoint(to) {
                if next.replace(mid, None).flatten().is_some() {
                    captured = Some(mid);
                }
            }
        }
        if !piece.king && to.row == piece.color.crowning_row() {
            piece.king = true;
            promoted = true;
        }
        next.replace(to, Some(piece));
    }

    MoveOutcome {
        board: next,
        captured,
        promoted,
    }
}

/// Validates `from -> to` against [`legal_moves`] and applies it.
pub fn apply_move(board: &CheckersBoard, from: Position, to: Position) -> Result<MoveOutcome> {
    if !board.contains(from) {
        return Err(RulesError::OutOfBounds(from));
    }
    if piece_at(board, from).is_none() {
        return Err(RulesError::NoPiece(from));
    }
    if !legal_moves(board, from).contains(&to) {
        return Err(RulesError::IllegalMove { from, to });
    }
    Ok(apply_move_unchecked(board, from, to))
}

/// Picks a move the way the computer player does: uniformly among the jumps
/// if there are any, otherwise uniformly among all moves.
pub fn choose_from<R: Rng + ?Sized>(moves: &[CheckersMove], rng: &mut R) -> Option<CheckersMove> {
    let jumps: Vec<CheckersMove> = moves.iter().copied().filter(CheckersMove::is_jump).collect();
    if jumps.is_empty() {
        moves.choose(rng).copied()
    } else {
        jumps.choose(rng).copied()
    }
}

/// Computer move for `side` on `board`, or `None` if `side` cannot move.
pub fn choose_ai_move<R: Rng + ?Sized>(board: &CheckersBoard, side: Color, rng: &mut R) -> Option<CheckersMove> {
    choose_from(&all_legal_moves(board, side), rng)
}

/// One step or one jump of a single piece. A jump lands two rows away and
/// captures the piece on the midpoint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CheckersMove {
    /// Square of the moving piece
    pub from: Position,
    /// Destination, or the landing square of a jump
    pub to: Position,
}

impl CheckersMove {
    pub fn is_jump(&self) -> bool {
        self.from.distance(self.to) == 2
    }
}

impl fmt::Display for CheckersMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for CheckersMove {
    type Err = RulesError;

    /// Parses `"r,c-r,c"`.
    fn from_str(s: &str) -> Result<Self> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| RulesError::Parse("Expected format: r,c-r,c".to_string()))?;
        Ok(CheckersMove {
            from: from.parse()?,
            to: to.parse()?,
        })
    }
}

/// Who plays each side of a session.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum GameMode {
    /// Both sides are moved by callers.
    #[default]
    PlayerVsPlayer,
    /// The computer plays Black.
    PlayerVsComputer,
}

/// A checkers game in progress.
#[derive(Debug, Clone)]
pub struct CheckersState {
    board: CheckersBoard,
    /// Side to move
    current: Color,
    mode: GameMode,
    /// Piece picked with `select`
    selected: Option<Position>,
    /// Destinations of the selected piece
    valid_moves: Vec<Position>,
    /// Piece that must continue a capture chain
    chain: Option<Position>,
    /// Pieces captured by red
    red_score: u32,
    /// Pieces captured by black
    black_score: u32,
}

impl Default for CheckersState {
    fn default() -> Self {
        Self::new(GameMode::default())
    }
}

impl CheckersState {
    pub fn new(mode: GameMode) -> Self {
        Self::from_position(new_board(), Color::Red, mode)
    }

    pub fn from_position(board: CheckersBoard, current: Color, mode: GameMode) -> Self {
        Self {
            board,
            current,
            mode,
            selected: None,
            valid_moves: Vec::new(),
            chain: None,
            red_score: 0,
            black_score: 0,
        }
    }

    /// Restarts with a fresh board, keeping the mode.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    /// Switches mode and restarts.
    pub fn set_mode(&mut self, mode: GameMode) {
        *self = Self::new(mode);
    }

    pub fn board(&self) -> &CheckersBoard {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn valid_moves(&self) -> &[Position] {
        &self.valid_moves
    }

    /// The piece that must keep capturing this turn, if any.
    pub fn capture_chain(&self) -> Option<Position> {
        self.chain
    }

    /// Captures made by (red, black).
    pub fn scores(&self) -> (u32, u32) {
        (self.red_score, self.black_score)
    }

    pub fn is_computer_turn(&self) -> bool {
        self.mode == GameMode::PlayerVsComputer && self.current == Color::Black && !self.is_terminal()
    }

    /// Selects an own piece and caches its destinations. While a capture
    /// chain is active only the chaining piece can be selected.
    pub fn select(&mut self, pos: Position) -> &[Position] {
        if let Some(chain) = self.chain {
            if pos == chain {
                self.selected = Some(chain);
                self.valid_moves = jump_moves(&self.board, chain);
            }
            return &self.valid_moves;
        }
        match piece_at(&self.board, pos) {
            Some(p) if p.color == self.current => {
                self.selected = Some(pos);
                self.valid_moves = legal_moves(&self.board, pos);
            }
            _ => {
                self.selected = None;
                self.valid_moves.clear();
            }
        }
        &self.valid_moves
    }

    pub fn move_selected(&mut self, to: Position) -> Result<()> {
        let from = self.selected.ok_or(RulesError::NoPiece(to))?;
        self.make_move(&CheckersMove { from, to })
    }

    /// Plays the computer's move for the side to move.
    pub fn play_ai_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Option<CheckersMove>> {
        let Some(mv) = choose_from(&self.get_possible_moves(), rng) else {
            return Ok(None);
        };
        self.make_move(&mv)?;
        Ok(Some(mv))
    }
}

impl fmt::Display for CheckersState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.row_slices() {
            for cell in row {
                let symbol = match cell {
                    Some(Piece { color: Color::Red, king: false }) => 'r',
                    Some(Piece { color: Color::Red, king: true }) => 'R',
                    Some(Piece { color: Color::Black, king: false }) => 'b',
                    Some(Piece { color: Color::Black, king: true }) => 'B',
                    None => '.',
                };
                write!(f, "{} ", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for CheckersState {
    type Move = CheckersMove;
    type Side = Color;

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        match self.chain {
            Some(from) => jump_moves(&self.board, from)
                .into_iter()
                .map(|to| CheckersMove { from, to })
                .collect(),
            None => all_legal_moves(&self.board, self.current),
        }
    }

    #[instrument(skip(self), fields(side = %self.current))]
    fn make_move(&mut self, mv: &Self::Move) -> Result<()> {
        if self.is_terminal() {
            return Err(RulesError::GameOver);
        }
        if let Some(chain) = self.chain {
            if mv.from != chain {
                return Err(RulesError::MustContinueCapture(chain));
            }
            if !mv.is_jump() {
                return Err(RulesError::IllegalMove { from: mv.from, to: mv.to });
            }
        }
        match piece_at(&self.board, mv.from) {
            None => return Err(RulesError::NoPiece(mv.from)),
            Some(p) if p.color != self.current => return Err(RulesError::WrongSide(mv.from)),
            Some(_) => {}
        }

        let outcome = apply_move(&self.board, mv.from, mv.to).inspect_err(|err| {
            warn!(%err, "rejected checkers move");
        })?;
        self.board = outcome.board;

        let further_jumps = if outcome.captured.is_some() {
            match self.current {
                Color::Red => self.red_score += 1,
                Color::Black => self.black_score += 1,
            }
            jump_moves(&self.board, mv.to)
        } else {
            Vec::new()
        };

        if further_jumps.is_empty() {
            self.chain = None;
            self.selected = None;
            self.valid_moves.clear();
            self.current = self.current.opponent();
            debug!(%mv, promoted = outcome.promoted, "checkers move applied, turn passes");
        } else {
            self.chain = Some(mv.to);
            self.selected = Some(mv.to);
            self.valid_moves = further_jumps;
            debug!(%mv, promoted = outcome.promoted, "capture chain continues");
        }
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        self.get_possible_moves().is_empty()
    }

    fn get_winner(&self) -> Option<Color> {
        self.is_terminal().then(|| self.current.opponent())
    }

    fn get_current_player(&self) -> Color {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::collections::HashSet;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    #[test]
    fn test_initial_layout() {
        let board = new_board();
        let count = |color: Color| {
            board
                .iter()
                .filter(|(_, cell)| matches!(cell, Some(piece) if piece.color == color))
                .count()
        };
        assert_eq!(count(Color::Red), 12);
        assert_eq!(count(Color::Black), 12);
        assert_eq!(board[p(0, 1)], Some(Piece::man(Color::Black)));
        assert_eq!(board[p(7, 0)], Some(Piece::man(Color::Red)));
        assert_eq!(board[p(0, 0)], None);
    }

    #[test]
    fn test_opening_moves() {
        let board = new_board();
        assert_eq!(all_legal_moves(&board, Color::Red).len(), 7);
        assert_eq!(legal_moves(&board, p(5, 0)), vec![p(4, 1)]);
        assert!(legal_moves(&board, p(6, 1)).is_empty());
    }

    #[test]
    fn test_man_moves_forward_only() {
        let mut board = empty_board();
        board[p(4, 3)] = Some(Piece::man(Color::Red));
        let moves = legal_moves(&board, p(4, 3));
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m.row == 3));
    }

    #[test]
    fn test_jump_removes_midpoint() {
        let mut board = empty_board();
        board[p(5, 2)] = Some(Piece::man(Color::Red));
        board[p(4, 3)] = Some(Piece::man(Color::Black));
        assert!(legal_moves(&board, p(5, 2)).contains(&p(3, 4)));
        let outcome = apply_move(&board, p(5, 2), p(3, 4)).unwrap();
        assert_eq!(outcome.captured, Some(p(4, 3)));
        assert_eq!(outcome.board[p(4, 3)], None);
        assert_eq!(outcome.board[p(3, 4)], Some(Piece::man(Color::Red)));
        assert!(!outcome.promoted);
    }

    #[test]
    fn test_blocked_jump_not_offered() {
        let mut board = empty_board();
        board[p(5, 2)] = Some(Piece::man(Color::Red));
        board[p(4, 3)] = Some(Piece::man(Color::Black));
        board[p(3, 4)] = Some(Piece::man(Color::Black));
        assert_eq!(legal_moves(&board, p(5, 2)), vec![p(4, 1)]);
    }

    #[test]
    fn test_promotion_gives_both_directions() {
        let mut board = empty_board();
        board[p(1, 2)] = Some(Piece::man(Color::Red));
        let outcome = apply_move(&board, p(1, 2), p(0, 3)).unwrap();
        assert!(outcome.promoted);
        assert_eq!(outcome.board[p(0, 3)], Some(Piece::king(Color::Red)));

        let mut board = empty_board();
        board[p(6, 1)] = Some(Piece::man(Color::Black));
        let outcome = apply_move(&board, p(6, 1), p(7, 2)).unwrap();
        assert_eq!(outcome.board[p(7, 2)], Some(Piece::king(Color::Black)));

        let mut board = empty_board();
        board[p(4, 3)] = Some(Piece::king(Color::Red));
        let moves = legal_moves(&board, p(4, 3));
        assert!(moves.contains(&p(3, 2)));
        assert!(moves.contains(&p(5, 4)));
        assert_eq!(moves.len(), 4);
    }

    #[test]
    fn test_illegal_apply_is_rejected() {
        let board = new_board();
        assert_eq!(
            apply_move(&board, p(5, 0), p(3, 2)),
            Err(RulesError::IllegalMove { from: p(5, 0), to: p(3, 2) })
        );
        assert_eq!(apply_move(&board, p(4, 4), p(3, 3)), Err(RulesError::NoPiece(p(4, 4))));
    }

    #[test]
    fn test_ai_prefers_jumps() {
        let mut board = empty_board();
        board[p(2, 1)] = Some(Piece::man(Color::Black));
        board[p(3, 2)] = Some(Piece::man(Color::Red));
        board[p(0, 7)] = Some(Piece::man(Color::Black));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..20 {
            let mv = choose_ai_move(&board, Color::Black, &mut rng).unwrap();
            assert_eq!(mv, CheckersMove { from: p(2, 1), to: p(4, 3) });
        }
    }

    /// Draws `rounds` AI moves for `side` and returns every distinct pick.
    fn ai_picks(board: &CheckersBoard, side: Color, rounds: usize) -> HashSet<CheckersMove> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(17);
        (0..rounds)
            .map(|_| choose_ai_move(board, side, &mut rng).unwrap())
            .collect()
    }

    #[test]
    fn test_ai_spreads_over_every_jump() {
        let mut board = empty_board();
        board[p(2, 3)] = Some(Piece::man(Color::Black));
        board[p(3, 2)] = Some(Piece::man(Color::Red));
        board[p(3, 4)] = Some(Piece::man(Color::Red));
        board[p(0, 7)] = Some(Piece::man(Color::Black));

        let picks = ai_picks(&board, Color::Black, 200);
        let jumps = HashSet::from([
            CheckersMove { from: p(2, 3), to: p(4, 1) },
            CheckersMove { from: p(2, 3), to: p(4, 5) },
        ]);
        assert_eq!(picks, jumps);
    }

    #[test]
    fn test_ai_spreads_over_simple_moves() {
        let mut board = empty_board();
        board[p(2, 3)] = Some(Piece::man(Color::Black));
        board[p(0, 7)] = Some(Piece::man(Color::Black));
        board[p(7, 0)] = Some(Piece::man(Color::Red));

        let picks = ai_picks(&board, Color::Black, 300);
        let all: HashSet<CheckersMove> = all_legal_moves(&board, Color::Black).into_iter().collect();
        assert_eq!(all.len(), 3);
        assert_eq!(picks, all);
    }

    #[test]
    fn test_parse_reports_bad_square() {
        assert_eq!("5,0-4,1".parse::<CheckersMove>(), Ok(CheckersMove { from: p(5, 0), to: p(4, 1) }));
        assert_eq!(
            "5,0-x,1".parse::<CheckersMove>(),
            Err(RulesError::Parse("invalid index 'x'".to_string()))
        );
        assert_eq!(
            "5-4,1".parse::<CheckersMove>(),
            Err(RulesError::Parse("Expected format: r,c".to_string()))
        );
    }

    #[test]
    fn test_ai_without_moves() {
        let board = empty_board();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
        assert_eq!(choose_ai_move(&board, Color::Black, &mut rng), None);
    }

    #[test]
    fn test_session_forfeits_when_stuck() {
        let mut board = empty_board();
        board[p(0, 1)] = Some(Piece::man(Color::Black));
        board[p(7, 0)] = Some(Piece::man(Color::Red));
        board[p(6, 1)] = Some(Piece::man(Color::Black));
        board[p(5, 2)] = Some(Piece::man(Color::Black));
        let game = CheckersState::from_position(board, Color::Red, GameMode::PlayerVsPlayer);
        assert!(game.is_terminal());
        assert_eq!(game.get_winner(), Some(Color::Black));
    }

    #[test]
    fn test_computer_turn_flag() {
        let mut game = CheckersState::new(GameMode::PlayerVsComputer);
        assert!(!game.is_computer_turn());
        game.make_move(&"5,0-4,1".parse().unwrap()).unwrap();
        assert!(game.is_computer_turn());
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        let mv = game.play_ai_move(&mut rng).unwrap().unwrap();
        assert_eq!(game.board()[mv.from], None);
        assert_eq!(game.get_current_player(), Color::Red);
    }
}
