//! # Chess Rules Engine
//!
//! Legal-move generation, check detection and move application for standard
//! chess on an 8x8 board, without castling, en passant or promotion. Pawns that
//! reach the last rank stay pawns.
//!
//! ## Board orientation
//! Row 0 holds Black's back rank, row 7 holds White's. White pawns move toward
//! row 0, Black pawns toward row 7. White moves first.
//!
//! ## Legality
//! A destination is legal when the piece's movement pattern reaches it and the
//! resulting position does not leave the mover's own king attacked. The check
//! test simulates the move on a cloned board and scans every opposing piece's
//! raw move set for the king's square.

use crate::error::{Result, RulesError};
use crate::GameState;
use grid_shared::{Grid, Position};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument, warn};

pub const BOARD_SIZE: usize = 8;

/// Side in a chess game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a pawn push.
    fn forward(self) -> isize {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// The only row a pawn may double-push from.
    fn pawn_start_row(self) -> usize {
        match self {
            Color::White => BOARD_SIZE - 2,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

const KNIGHT_STEPS: [(isize, isize); 8] = [
    (2, 1), (1, 2), (-1, 2), (-2, 1),
    (-2, -1), (-1, -2), (1, -2), (2, -1),
];
const DIAGONALS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const ALL_DIRECTIONS: [(isize, isize); 8] = [
    (1, 1), (1, -1), (-1, 1), (-1, -1),
    (1, 0), (-1, 0), (0, 1), (0, -1),
];

/// How a piece kind moves.
enum Movement {
    Pawn,
    /// Single jumps by each offset.
    Leaper(&'static [(isize, isize)]),
    /// Repeated steps along each direction until blocked.
    Slider(&'static [(isize, isize)]),
}

impl PieceKind {
    fn movement(self) -> Movement {
        match self {
            PieceKind::Pawn => Movement::Pawn,
            PieceKind::Knight => Movement::Leaper(&KNIGHT_STEPS),
            PieceKind::King => Movement::Leaper(&ALL_DIRECTIONS),
            PieceKind::Bishop => Movement::Slider(&DIAGONALS),
            PieceKind::Rook => Movement::Slider(&ORTHOGONALS),
            PieceKind::Queen => Movement::Slider(&ALL_DIRECTIONS),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Unicode chess glyph for the piece.
    pub fn symbol(self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::King) => '♔',
            (Color::White, PieceKind::Queen) => '♕',
            (Color::White, PieceKind::Rook) => '♖',
            (Color::White, PieceKind::Bishop) => '♗',
            (Color::White, PieceKind::Knight) => '♘',
            (Color::White, PieceKind::Pawn) => '♙',
            (Color::Black, PieceKind::King) => '♚',
            (Color::Black, PieceKind::Queen) => '♛',
            (Color::Black, PieceKind::Rook) => '♜',
            (Color::Black, PieceKind::Bishop) => '♝',
            (Color::Black, PieceKind::Knight) => '♞',
            (Color::Black, PieceKind::Pawn) => '♟',
        }
    }
}

pub type ChessBoard = Grid<Option<Piece>>;

/// Creates the standard starting position.
pub fn new_board() -> ChessBoard {
    const BACK_RANK: [PieceKind; BOARD_SIZE] = [
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Queen,
        PieceKind::King,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Rook,
    ];
    Grid::from_fn(BOARD_SIZE, BOARD_SIZE, |pos| match pos.row {
        0 => Some(Piece::new(BACK_RANK[pos.col], Color::Black)),
        1 => Some(Piece::new(PieceKind::Pawn, Color::Black)),
        6 => Some(Piece::new(PieceKind::Pawn, Color::White)),
        7 => Some(Piece::new(BACK_RANK[pos.col], Color::White)),
        _ => None,
    })
}

/// Creates a board with no pieces, for setting up positions by hand.
pub fn empty_board() -> ChessBoard {
    Grid::new(BOARD_SIZE, BOARD_SIZE, None)
}

fn piece_at(board: &ChessBoard, pos: Position) -> Option<Piece> {
    board.get(pos).copied().flatten()
}

/// Destinations reachable by the piece on `from` by its movement pattern
/// alone, ignoring whether the move exposes its own king.
///
/// Returns an empty list for an empty or off-board square.
pub fn pseudo_legal_moves(board: &ChessBoard, from: Position) -> Vec<Position> {
    let Some(piece) = piece_at(board, from) else {
        return Vec::new();
    };
    let mut moves = Vec::new();

    match piece.kind.movement() {
        Movement::Pawn => {
            let dir = piece.color.forward();
            if let Some(one) = board.offset(from, dir, 0) {
                if piece_at(board, one).is_none() {
                    moves.push(one);
                    if from.row == piece.color.pawn_start_row() {
                        if let Some(two) = board.offset(from, 2 * dir, 0) {
                            if piece_at(board, two).is_none() {
                                moves.push(two);
                            }
                        }
                    }
                }
            }
            for dc in [-1, 1] {
                if let Some(target) = board.offset(from, dir, dc) {
                    if matches!(piece_at(board, target), Some(p) if p.color != piece.color) {
                        moves.push(target);
                    }
                }
            }
        }
        Movement::Leaper(steps) => {
            for &(dr, dc) in steps {
                if let Some(target) = board.offset(from, dr, dc) {
                    match piece_at(board, target) {
                        Some(p) if p.color == piece.color => {}
                        _ => moves.push(target),
                    }
                }
            }
        }
        Movement::Slider(directions) => {
            for &(dr, dc) in directions {
                let mut current = from;
                while let Some(target) = board.offset(current, dr, dc) {
                    match piece_at(board, target) {
                        None => moves.push(target),
                        Some(p) => {
                            if p.color != piece.color {
                                moves.push(target);
                            }
                            break;
                        }
                    }
                    current = target;
                }
            }
        }
    }
    moves
}

/// Legal destinations for the piece on `from` when `side` is to move.
///
/// Empty if the square is empty, off the board, or holds a piece of the
/// other side. Every returned destination keeps `side`'s king out of check.
pub fn legal_moves(board: &ChessBoard, from: Position, side: Color) -> Vec<Position> {
    match piece_at(board, from) {
        Some(piece) if piece.color == side => pseudo_legal_moves(board, from)
            .into_iter()
            .filter(|&to| !is_in_check(&apply_move_unchecked(board, from, to), side))
            .collect(),
        _ => Vec::new(),
    }
}

/// Every legal move for `side`, in row-major order of the moving piece.
pub fn all_legal_moves(board: &ChessBoard, side: Color) -> Vec<ChessMove> {
    board
        .positions()
        .flat_map(|from| {
            legal_moves(board, from, side)
                .into_iter()
                .map(move |to| ChessMove { from, to })
        })
        .collect()
}

pub fn find_king(board: &ChessBoard, color: Color) -> Option<Position> {
    board.iter().find_map(|(pos, cell)| match cell {
        Some(p) if p.kind == PieceKind::King && p.color == color => Some(pos),
        _ => None,
    })
}

/// True iff some opposing piece's raw move set includes `color`'s king.
/// A board without that king is never in check.
pub fn is_in_check(board: &ChessBoard, color: Color) -> bool {
    let Some(king) = find_king(board, color) else {
        return false;
    };
    board.iter().any(|(pos, cell)| match cell {
        Some(p) if p.color != color => pseudo_legal_moves(board, pos).contains(&king),
        _ => false,
    })
}

/// Relocates whatever is on `from` to `to` without any legality check.
/// Off-board squares leave the board unchanged.
pub fn apply_move_unchecked(board: &ChessBoard, from: Position, to: Position) -> ChessBoard {
    let mut next = board.clone();
    if next.contains(from) && next.contains(to) {
        let moving = next[from].take();
        next[to] = moving;
    }
    next
}

/// Validates `from -> to` for the piece's own side and returns the new board.
pub fn apply_move(board: &ChessBoard, from: Position, to: Position) -> Result<ChessBoard> {
    if !board.contains(from) {
        return Err(RulesError::OutOfBounds(from));
    }
    if !board.contains(to) {
        return Err(RulesError::OutOfBounds(to));
    }
    let piece = piece_at(board, from).ok_or(RulesError::NoPiece(from))?;
    if !legal_moves(board, from, piece.color).contains(&to) {
        return Err(RulesError::IllegalMove { from, to });
    }
    Ok(apply_move_unchecked(board, from, to))
}

/// Position summary for the side to move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ChessStatus {
    Ongoing,
    Check,
    /// The side to move is mated; the payload is the winner.
    Checkmate(Color),
    Stalemate,
}

pub fn status(board: &ChessBoard, side: Color) -> ChessStatus {
    let in_check = is_in_check(board, side);
    let can_move = board
        .positions()
        .any(|from| !legal_moves(board, from, side).is_empty());
    match (in_check, can_move) {
        (true, false) => ChessStatus::Checkmate(side.opponent()),
        (false, false) => ChessStatus::Stalemate,
        (true, true) => ChessStatus::Check,
        (false, true) => ChessStatus::Ongoing,
    }
}

/// A move from one square to another.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ChessMove {
    pub from: Position,
    pub to: Position,
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

impl FromStr for ChessMove {
    type Err = RulesError;

    /// Parses `"r,c-r,c"`.
    fn from_str(s: &str) -> Result<Self> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| RulesError::Parse("Expected format: r,c-r,c".to_string()))?;
        Ok(ChessMove {
            from: from.parse()?,
            to: to.parse()?,
        })
    }
}

/// A chess game in progress.
#[derive(Debug, Clone)]
pub struct ChessState {
    board: ChessBoard,
    turn: Color,
    selected: Option<Position>,
    /// Legal destinations of the selected piece
    targets: Vec<Position>,
    /// Pieces removed from the board, in capture order
    captured: Vec<Piece>,
    status: ChessStatus,
}

impl Default for ChessState {
    fn default() -> Self {
        Self::new()
    }
}

impl ChessState {
    pub fn new() -> Self {
        Self::from_position(new_board(), Color::White)
    }

    /// Starts a session from an arbitrary position.
    pub fn from_position(board: ChessBoard, turn: Color) -> Self {
        let status = status(&board, turn);
        Self {
            board,
            turn,
            selected: None,
            targets: Vec::new(),
            captured: Vec::new(),
            status,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &ChessBoard {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> ChessStatus {
        self.status
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub fn targets(&self) -> &[Position] {
        &self.targets
    }

    pub fn captured(&self) -> &[Piece] {
        &self.captured
    }

    /// Selects the piece on `pos` if it belongs to the side to move and
    /// caches its legal destinations. Any other square clears the selection.
    pub fn select(&mut self, pos: Position) -> &[Position] {
        match piece_at(&self.board, pos) {
            Some(p) if p.color == self.turn => {
                self.selected = Some(pos);
                self.targets = legal_moves(&self.board, pos, self.turn);
            }
            _ => self.clear_selection(),
        }
        &self.targets
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.targets.clear();
    }

    /// Moves the selected piece to `to`.
    pub fn move_selected(&mut self, to: Position) -> Result<()> {
        let from = self.selected.ok_or(RulesError::NoPiece(to))?;
        self.make_move(&ChessMove { from, to })
    }
}

impl fmt::Display for ChessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.board.row_slices() {
            for cell in row {
                match cell {
                    Some(p) => write!(f, "{} ", p.symbol())?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl GameState for ChessState {
    type Move = ChessMove;
    type Side = Color;

    fn get_possible_moves(&self) -> Vec<Self::Move> {
        all_legal_moves(&self.board, self.turn)
    }

    #[instrument(skip(self), fields(turn = %self.turn))]
    fn make_move(&mut self, mv: &Self::Move) -> Result<()> {
        if self.is_terminal() {
            return Err(RulesError::GameOver);
        }
        match piece_at(&self.board, mv.from) {
            None => return Err(RulesError::NoPiece(mv.from)),
            Some(p) if p.color != self.turn => return Err(RulesError::WrongSide(mv.from)),
            Some(_) => {}
        }
        let next = apply_move(&self.board, mv.from, mv.to).inspect_err(|err| {
            warn!(%err, "rejected chess move");
        })?;
        if let Some(taken) = piece_at(&self.board, mv.to) {
            self.captured.push(taken);
        }
        self.board = next;
        self.turn = self.turn.opponent();
        self.clear_selection();
        self.status = status(&self.board, self.turn);
        debug!(%mv, status = ?self.status, "chess move applied");
        Ok(())
    }

    fn is_terminal(&self) -> bool {
        matches!(self.status, ChessStatus::Checkmate(_) | ChessStatus::Stalemate)
    }

    fn get_winner(&self) -> Option<Color> {
        match self.status {
            ChessStatus::Checkmate(winner) => Some(winner),
            _ => None,
        }
    }

    fn get_current_player(&self) -> Color {
        self.turn
    }
}
