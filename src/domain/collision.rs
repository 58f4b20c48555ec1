/// Collision layer: single source of truth for "can something stand here".
///
/// ## Architecture
///
/// Two distinct concepts:
///   1. OBSTACLES: baked into a boolean grid at build time (O(1) lookup).
///   2. TRAPS    : queried against the live trap list, because they are
///                  lethal-but-passable and can disappear independently.
///
/// The grid is a cache of the obstacle list: rebuilt on every maze change,
/// never patched. Every query is total: out of bounds is always a
/// collision, an invalid board degrades to "everything blocked".

use super::grid::{Board, Direction, Obstacle, Position};

/// Result of sliding from a cell until the next cell would collide.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MoveResult {
    pub end: Position,
    pub distance: u32,
}

#[derive(Clone, Debug)]
pub struct CollisionSystem {
    board: Board,
    /// `grid[y * width + x] == true` ↔ obstacle at (x, y).
    grid: Vec<bool>,
}

impl CollisionSystem {
    pub fn new(board: Board) -> Self {
        CollisionSystem { board, grid: Vec::new() }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Change dimensions. Invalidates the map until the next `build`.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.grid.clear();
    }

    // ══════════════════════════════════════════════════════════════
    // Build
    // ══════════════════════════════════════════════════════════════

    /// Rebuild the obstacle grid. Obstacles outside the board are ignored.
    pub fn build(&mut self, obstacles: &[Obstacle]) {
        self.grid.clear();
        if !self.board.is_valid() {
            log::warn!(
                "collision map not built: invalid board {}x{}",
                self.board.width, self.board.height
            );
            return;
        }
        self.grid.resize(self.board.area(), false);
        for o in obstacles {
            if let Some(i) = self.board.index(o.pos) {
                self.grid[i] = true;
            }
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Point queries
    // ══════════════════════════════════════════════════════════════

    #[inline]
    pub fn is_out_of_bounds(&self, x: i32, y: i32) -> bool {
        !self.board.contains(Position::new(x, y))
    }

    #[inline]
    pub fn is_within_bounds(&self, x: i32, y: i32) -> bool {
        self.board.contains(Position::new(x, y))
    }

    /// Out of bounds OR obstacle. No wraparound.
    #[inline]
    pub fn is_collision(&self, x: i32, y: i32) -> bool {
        match self.board.index(Position::new(x, y)) {
            Some(i) => self.grid.get(i).copied().unwrap_or(false),
            None => true,
        }
    }

    #[inline]
    pub fn is_collision_at(&self, p: Position) -> bool {
        self.is_collision(p.x, p.y)
    }

    /// In bounds and present in the live trap list.
    pub fn is_trap(&self, x: i32, y: i32, traps: &[Position]) -> bool {
        if self.is_out_of_bounds(x, y) {
            return false;
        }
        traps.iter().any(|t| t.x == x && t.y == y)
    }

    // ══════════════════════════════════════════════════════════════
    // Ray queries
    // ══════════════════════════════════════════════════════════════

    /// Walk from `start` in `dir` until the next cell collides.
    /// Returns the last free cell and the number of cells advanced.
    pub fn calculate_move_until_obstacle(&self, start: Position, dir: Direction) -> MoveResult {
        let mut end = start;
        let mut distance = 0;
        loop {
            let next = end.step(dir);
            if self.is_collision_at(next) {
                break;
            }
            end = next;
            distance += 1;
        }
        MoveResult { end, distance }
    }

    /// Straight-line clearance between two patrol endpoints on the same row
    /// or column. Every stepped cell (start exclusive, end inclusive) must be
    /// obstacle-free. Endpoints that are not aligned have no straight path.
    pub fn is_path_clear(&self, start: Position, end: Position, obstacles: &[Obstacle]) -> bool {
        if start.x != end.x && start.y != end.y {
            return false;
        }
        let dx = (end.x - start.x).signum();
        let dy = (end.y - start.y).signum();
        let mut cur = start;
        while cur != end {
            cur = Position::new(cur.x + dx, cur.y + dy);
            if obstacles.iter().any(|o| o.pos == cur) {
                return false;
            }
        }
        true
    }
}
