//! Grid primitives shared by the board game engines.
//!
//! Every engine stores its board as a [`Grid`]: a fixed-size, row-major buffer
//! of cells addressed by [`Position`]. Boards are cloned on every move, so the
//! type is a plain owned `Vec` with no interior sharing.

use std::fmt;
use std::str::FromStr;

/// A (row, col) coordinate, 0-indexed with row 0 at the top edge.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Chebyshev distance between two positions.
    pub fn distance(self, other: Position) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }

    /// The square halfway between `self` and `other`, if both axes have an
    /// even difference.
    pub fn midpoint(self, other: Position) -> Option<Position> {
        let dr = self.row.abs_diff(other.row);
        let dc = self.col.abs_diff(other.col);
        if dr % 2 != 0 || dc % 2 != 0 {
            return None;
        }
        Some(Position::new(
            self.row.min(other.row) + dr / 2,
            self.col.min(other.col) + dc / 2,
        ))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

/// Text that is not a `row,col` pair of unsigned integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsePositionError {
    /// Not exactly two comma-separated parts
    Format,
    /// A part that is not an unsigned integer
    Index(String),
}

impl fmt::Display for ParsePositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePositionError::Format => write!(f, "Expected format: r,c"),
            ParsePositionError::Index(part) => write!(f, "invalid index '{}'", part),
        }
    }
}

impl std::error::Error for ParsePositionError {}

impl FromStr for Position {
    type Err = ParsePositionError;

    /// Parses `"row,col"` with 0-based indices.
    ///
    /// # Examples
    /// ```
    /// use grid_shared::Position;
    /// let pos: Position = "3,4".parse().unwrap();
    /// assert_eq!(pos, Position::new(3, 4));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(|p| p.trim()).collect();
        let [row, col] = parts[..] else {
            return Err(ParsePositionError::Format);
        };
        let index = |part: &str| part.parse::<usize>().map_err(|_| ParsePositionError::Index(part.to_string()));
        Ok(Position::new(index(row)?, index(col)?))
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Position::new(row, col)
    }
}

/// Returns true if the signed coordinate lies on a `size` x `size` board.
pub fn in_bounds(row: isize, col: isize, size: usize) -> bool {
    row >= 0 && col >= 0 && (row as usize) < size && (col as usize) < size
}

/// A fixed-size two dimensional board stored row-major.
///
/// Dimensions never change after construction. `Clone` produces a fully
/// independent copy of every cell.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Grid<T> {
    cells: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid with every cell set to `fill`.
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            cells: vec![fill; rows * cols],
            rows,
            cols,
        }
    }
}

impl<T> Grid<T> {
    /// Creates a grid by evaluating `f` once per position, row by row.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(Position) -> T) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(Position::new(row, col)));
            }
        }
        Self { cells, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn index_of(&self, pos: Position) -> Option<usize> {
        self.contains(pos).then(|| pos.row * self.cols + pos.col)
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index_of(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.index_of(pos).map(move |i| &mut self.cells[i])
    }

    /// Stores `value` at `pos` and returns the previous value, or `None` if
    /// `pos` is off the board (in which case nothing changes).
    pub fn replace(&mut self, pos: Position, value: T) -> Option<T> {
        self.get_mut(pos).map(|cell| std::mem::replace(cell, value))
    }

    /// Moves from `pos` by a signed delta, returning the destination only if it
    /// is still on the board.
    pub fn offset(&self, pos: Position, dr: isize, dc: isize) -> Option<Position> {
        let row = pos.row as isize + dr;
        let col = pos.col as isize + dc;
        if row < 0 || col < 0 {
            return None;
        }
        let dest = Position::new(row as usize, col as usize);
        self.contains(dest).then_some(dest)
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Position::new(row, col)))
    }

    /// All cells with their positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> + '_ {
        self.positions().zip(self.cells.iter())
    }

    /// Iterates over the board one row slice at a time.
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks(self.cols.max(1))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}

impl<T> std::ops::Index<Position> for Grid<T> {
    type Output = T;

    fn index(&self, pos: Position) -> &T {
        assert!(self.contains(pos), "position {pos} is off a {}x{} grid", self.rows, self.cols);
        &self.cells[pos.row * self.cols + pos.col]
    }
}

impl<T> std::ops::IndexMut<Position> for Grid<T> {
    fn index_mut(&mut self, pos: Position) -> &mut T {
        assert!(self.contains(pos), "position {pos} is off a {}x{} grid", self.rows, self.cols);
        &mut self.cells[pos.row * self.cols + pos.col]
    }
}

/// Checks for `line_size` consecutive cells equal to `player` in any row,
/// column or diagonal of a row-major board.
///
/// # Arguments
/// * `board` - The board data as a flat slice
/// * `width` - Board width
/// * `height` - Board height
/// * `player` - The cell value to look for
/// * `line_size` - Number of consecutive cells needed
pub fn check_line_win<T: PartialEq>(
    board: &[T],
    width: usize,
    height: usize,
    player: &T,
    line_size: usize,
) -> bool {
    if line_size == 0 || board.len() < width * height {
        return false;
    }
    let w = width as isize;
    let h = height as isize;
    let n = line_size as isize;

    let owned = |x: isize, y: isize| -> bool {
        x >= 0 && y >= 0 && x < w && y < h && board[(y * w + x) as usize] == *player
    };

    // (dx, dy) for horizontal, vertical, and both diagonals
    const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

    for y in 0..h {
        for x in 0..w {
            for (dx, dy) in DIRECTIONS {
                if (0..n).all(|k| owned(x + k * dx, y + k * dy)) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_is_independent() {
        let original: Grid<Option<u8>> = Grid::new(8, 8, None);
        let mut copy = original.clone();
        copy[Position::new(3, 3)] = Some(1);
        assert_eq!(original[Position::new(3, 3)], None);
        assert_eq!(copy[Position::new(3, 3)], Some(1));
    }

    #[test]
    fn test_offset_respects_edges() {
        let grid = Grid::new(8, 8, 0u8);
        assert_eq!(grid.offset(Position::new(0, 0), -1, 0), None);
        assert_eq!(grid.offset(Position::new(7, 7), 0, 1), None);
        assert_eq!(grid.offset(Position::new(3, 3), 2, -1), Some(Position::new(5, 2)));
    }

    #[test]
    fn test_in_bounds() {
        assert!(in_bounds(0, 0, 8));
        assert!(in_bounds(7, 7, 8));
        assert!(!in_bounds(-1, 3, 8));
        assert!(!in_bounds(3, 8, 8));
    }

    #[test]
    fn test_replace_off_board_is_noop() {
        let mut grid = Grid::new(2, 2, 0u8);
        assert_eq!(grid.replace(Position::new(2, 0), 5), None);
        assert_eq!(grid.replace(Position::new(1, 1), 5), Some(0));
        assert_eq!(grid.as_slice(), &[0, 0, 0, 5]);
    }

    #[test]
    fn test_midpoint_and_distance() {
        let a = Position::new(5, 2);
        let b = Position::new(3, 4);
        assert_eq!(a.distance(b), 2);
        assert_eq!(a.midpoint(b), Some(Position::new(4, 3)));
        assert_eq!(a.midpoint(Position::new(4, 3)), None);
    }

    #[test]
    fn test_position_parse() {
        assert_eq!("2, 6".parse::<Position>(), Ok(Position::new(2, 6)));
        assert_eq!("2".parse::<Position>(), Err(ParsePositionError::Format));
        assert_eq!("1,2,3".parse::<Position>(), Err(ParsePositionError::Format));
        assert_eq!("a,b".parse::<Position>(), Err(ParsePositionError::Index("a".to_string())));
        assert_eq!("1,-1".parse::<Position>(), Err(ParsePositionError::Index("-1".to_string())));
    }

    #[test]
    fn test_check_line_win_diagonal() {
        let x = Some('x');
        let board = [
            x, None, None, //
            None, x, None, //
            None, None, x,
        ];
        assert!(check_line_win(&board, 3, 3, &x, 3));
        assert!(!check_line_win(&board, 3, 3, &Some('o'), 3));
    }

    #[test]
    fn test_check_line_win_anti_diagonal_only() {
        let board = [0, 0, 1, 0, 1, 0, 1, 0, 0];
        assert!(check_line_win(&board, 3, 3, &1, 3));
        assert!(!check_line_win(&board, 3, 3, &1, 4));
    }
}
