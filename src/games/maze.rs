//! # Maze Generator and Solver
//!
//! Perfect mazes carved by randomized depth-first backtracking from the
//! top-left cell, with breadth-first search for reachability.
//!
//! Each [`Cell`] stores its own four wall flags. Knocking down a wall always
//! clears both sides at once, so the flag on one cell and the opposing flag on
//! its neighbour agree for the whole life of a [`Maze`].
//!
//! Carving visits every cell of a connected grid, so a carved maze is always
//! solvable. [`generate`] still checks this and retries, and reports
//! [`RulesError::MazeUnsolvable`] rather than handing out a maze whose goal
//! cannot be reached.

use crate::error::{Result, RulesError};
use grid_shared::{Grid, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Generation attempts before giving up on a solvable maze.
pub const MAX_ATTEMPTS: usize = 100;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Wall flags of one maze cell.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Cell {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Cell {
    pub const WALLED: Cell = Cell {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    pub fn wall(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.top,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    fn wall_mut(&mut self, dir: Direction) -> &mut bool {
        match dir {
            Direction::Up => &mut self.top,
            Direction::Down => &mut self.bottom,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Maze {
    cells: Grid<Cell>,
}

impl Maze {
    /// A maze with every wall standing.
    pub fn fully_walled(rows: usize, cols: usize) -> Self {
        Self {
            cells: Grid::new(rows, cols, Cell::WALLED),
        }
    }

    pub fn rows(&self) -> usize {
        self.cells.rows()
    }

    pub fn cols(&self) -> usize {
        self.cells.cols()
    }

    pub fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos)
    }

    pub fn cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    pub fn start(&self) -> Position {
        Position::new(0, 0)
    }

    pub fn goal(&self) -> Position {
        Position::new(self.rows().saturating_sub(1), self.cols().saturating_sub(1))
    }

    /// The neighbouring position in `dir`, ignoring walls.
    fn neighbour(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dr, dc) = dir.delta();
        self.cells.offset(pos, dr, dc)
    }

    /// Removes the wall between `pos` and its neighbour in `dir` from both sides.
    fn knock_down(&mut self, pos: Position, dir: Direction) {
        let Some(next) = self.neighbour(pos, dir) else {
            return;
        };
        *self.cells[pos].wall_mut(dir) = false;
        *self.cells[next].wall_mut(dir.opposite()) = false;
    }

    /// A step is open when the destination exists and neither the source's
    /// wall nor the destination's opposing wall is set.
    pub fn can_move(&self, pos: Position, dir: Direction) -> bool {
        let (Some(cell), Some(next)) = (self.cell(pos), self.neighbour(pos, dir)) else {
            return false;
        };
        !cell.wall(dir) && !self.cells[next].wall(dir.opposite())
    }

    /// Where a step from `pos` in `dir` lands, if it is open.
    pub fn step(&self, pos: Position, dir: Direction) -> Option<Position> {
        if self.can_move(pos, dir) {
            self.neighbour(pos, dir)
        } else {
            None
        }
    }

    /// BFS from `start` recording each cell's predecessor.
    fn search(&self, start: Position) -> Grid<Option<Position>> {
        let mut parent: Grid<Option<Position>> = Grid::new(self.rows(), self.cols(), None);
        if !self.cells.contains(start) {
            return parent;
        }
        parent[start] = Some(start);
        let mut queue = VecDeque::from([start]);
        while let Some(pos) = queue.pop_front() {
            for dir in Direction::ALL {
                if let Some(next) = self.step(pos, dir) {
                    if parent[next].is_none() {
                        parent[next] = Some(pos);
                        queue.push_back(next);
                    }
                }
            }
        }
        parent
    }

    /// True iff the bottom-right cell is reachable from the top-left cell.
    pub fn is_solvable(&self) -> bool {
        let goal = self.goal();
        self.cells.contains(goal) && self.search(self.start())[goal].is_some()
    }

    /// Shortest route from start to goal, both ends included.
    pub fn shortest_path(&self) -> Option<Vec<Position>> {
        let parent = self.search(self.start());
        let goal = self.goal();
        parent.get(goal).copied().flatten()?;

        let mut path = vec![goal];
        let mut current = goal;
        while current != self.start() {
            current = parent[current]?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Checks that every shared wall agrees from both sides.
    pub fn walls_consistent(&self) -> bool {
        self.cells.positions().all(|pos| {
            [Direction::Right, Direction::Down].into_iter().all(|dir| {
                self.neighbour(pos, dir).map_or(true, |next| {
                    self.cells[pos].wall(dir) == self.cells[next].wall(dir.opposite())
                })
            })
        })
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.cols() {
            write!(f, "+--")?;
        }
        writeln!(f, "+")?;
        for row in self.cells.row_slices() {
            write!(f, "|")?;
            for cell in row {
                write!(f, "  {}", if cell.right { '|' } else { ' ' })?;
            }
            writeln!(f)?;
            write!(f, "+")?;
            for cell in row {
                write!(f, "{}+", if cell.bottom { "--" } else { "  " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One pending cell of the depth-first carve.
struct Frame {
    pos: Position,
    order: [Direction; 4],
    next: usize,
}

/// Carves a single maze by randomized depth-first backtracking from the
/// top-left cell. Each cell shuffles its four directions on entry and descends
/// into every unvisited neighbour in that order before trying the next one.
pub fn carve<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Maze {
    let mut maze = Maze::fully_walled(rows, cols);
    if rows == 0 || cols == 0 {
        return maze;
    }
    let mut visited = Grid::new(rows, cols, false);

    let enter = |pos: Position, visited: &mut Grid<bool>, rng: &mut R| {
        visited[pos] = true;
        let mut order = Direction::ALL;
        order.shuffle(rng);
        Frame { pos, order, next: 0 }
    };

    let start = maze.start();
    let mut stack = vec![enter(start, &mut visited, &mut *rng)];
    while let Some(frame) = stack.last_mut() {
        if frame.next == frame.order.len() {
            stack.pop();
            continue;
        }
        let dir = frame.order[frame.next];
        frame.next += 1;
        let pos = frame.pos;

        if let Some(next) = maze.neighbour(pos, dir) {
            if !visited[next] {
                maze.knock_down(pos, dir);
                let child = enter(next, &mut visited, &mut *rng);
                stack.push(child);
            }
        }
    }
    maze
}

/// Generates a solvable `rows` x `cols` maze, retrying up to
/// [`MAX_ATTEMPTS`] times.
#[instrument(skip(rng))]
pub fn generate<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Maze> {
    if rows == 0 || cols == 0 {
        return Err(RulesError::OutOfBounds(Position::new(rows, cols)));
    }
    for attempt in 1..=MAX_ATTEMPTS {
        let maze = carve(rows, cols, rng);
        if maze.is_solvable() {
            debug!(attempt, "maze generated");
            return Ok(maze);
        }
        warn!(attempt, "carved maze is unsolvable, regenerating");
    }
    Err(RulesError::MazeUnsolvable {
        rows,
        cols,
        attempts: MAX_ATTEMPTS,
    })
}

/// Preset maze sizes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
    VeryHard,
}

impl Difficulty {
    /// Side length of the square maze.
    pub fn size(self) -> usize {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Hard => 16,
            Difficulty::VeryHard => 40,
        }
    }
}

/// A player walking a maze from the top-left to the bottom-right cell.
#[derive(Clone, Debug)]
pub struct MazeState {
    maze: Maze,
    difficulty: Difficulty,
    player: Position,
    won: bool,
    /// Every cell the player has stood on, in order
    path: Vec<Position>,
}

impl MazeState {
    pub fn new<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Result<Self> {
        let size = difficulty.size();
        Ok(Self::from_maze(generate(size, size, rng)?, difficulty))
    }

    pub fn from_maze(maze: Maze, difficulty: Difficulty) -> Self {
        let start = maze.start();
        Self {
            maze,
            difficulty,
            player: start,
            won: false,
            path: vec![start],
        }
    }

    /// Generates a fresh maze of the same difficulty.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        *self = Self::new(self.difficulty, rng)?;
        Ok(())
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn goal(&self) -> Position {
        self.maze.goal()
    }

    pub fn has_won(&self) -> bool {
        self.won
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// Moves the player one cell if the way is open. Returns whether the
    /// player moved; once the goal is reached further moves are ignored.
    pub fn move_player(&mut self, dir: Direction) -> bool {
        if self.won {
            return false;
        }
        let Some(next) = self.maze.step(self.player, dir) else {
            return false;
        };
        self.player = next;
        self.path.push(next);
        if next == self.maze.goal() {
            self.won = true;
            debug!(steps = self.path.len() - 1, "maze solved");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_fully_walled_is_unsolvable() {
        let maze = Maze::fully_walled(4, 4);
        assert!(!maze.is_solvable());
        assert!(maze.walls_consistent());
        assert_eq!(maze.shortest_path(), None);
    }

    #[test]
    fn test_single_cell_maze() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let maze = generate(1, 1, &mut rng).unwrap();
        assert!(maze.is_solvable());
        assert_eq!(maze.shortest_path(), Some(vec![Position::new(0, 0)]));
    }

    #[test]
    fn test_zero_sized_maze_rejected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        assert!(generate(0, 5, &mut rng).is_err());
    }

    #[test]
    fn test_carve_opens_every_cell() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
        let maze = carve(12, 9, &mut rng);
        // a perfect maze on n cells has exactly n - 1 open passages
        let open = maze
            .cells()
            .positions()
            .flat_map(|pos| [Direction::Right, Direction::Down].map(|dir| maze.can_move(pos, dir)))
            .filter(|&open| open)
            .count();
        assert_eq!(open, 12 * 9 - 1);
        assert!(maze.walls_consistent());
    }

    #[test]
    fn test_can_move_needs_both_flags_clear() {
        let mut maze = Maze::fully_walled(2, 2);
        let origin = Position::new(0, 0);
        maze.knock_down(origin, Direction::Right);
        assert!(maze.can_move(origin, Direction::Right));
        assert!(maze.can_move(Position::new(0, 1), Direction::Left));

        maze.cells[Position::new(0, 1)].left = true;
        assert!(!maze.can_move(origin, Direction::Right));
        assert!(!maze.can_move(origin, Direction::Up));
        assert!(!maze.can_move(Position::new(5, 5), Direction::Up));
    }

    #[test]
    fn test_shortest_path_is_connected() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let maze = generate(10, 10, &mut rng).unwrap();
        let path = maze.shortest_path().unwrap();
        assert_eq!(path.first(), Some(&maze.start()));
        assert_eq!(path.last(), Some(&maze.goal()));
        for pair in path.windows(2) {
            assert!(Direction::ALL.iter().any(|&dir| maze.step(pair[0], dir) == Some(pair[1])));
        }
    }

    #[test]
    fn test_player_walks_to_goal() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(21);
        let mut game = MazeState::new(Difficulty::Easy, &mut rng).unwrap();
        assert_eq!(game.maze().rows(), 8);
        let route = game.maze().shortest_path().unwrap();
        for pair in route.windows(2) {
            let dir = Direction::ALL
                .into_iter()
                .find(|&dir| game.maze().step(pair[0], dir) == Some(pair[1]))
                .unwrap();
            assert!(game.move_player(dir));
        }
        assert!(game.has_won());
        assert_eq!(game.player(), game.goal());
        assert_eq!(game.path(), route.as_slice());
        assert!(!game.move_player(Direction::Up));
    }
}
