/// Grid primitives: positions, directions, board bounds, obstacles.
/// Cell semantics are centralized here so every system agrees on them.

/// A cell on the board. Signed so that out-of-board queries are representable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// The cell `n` steps away in `dir`.
    #[inline]
    pub fn offset(self, dir: Direction, n: i32) -> Position {
        let (dx, dy) = dir.delta();
        Position { x: self.x + dx * n, y: self.y + dy * n }
    }

    /// The adjacent cell in `dir`.
    #[inline]
    pub fn step(self, dir: Direction) -> Position {
        self.offset(dir, 1)
    }
}

/// Cardinal movement direction. Zero and diagonal vectors cannot be built.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// Unit vector, y grows downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Accepts only cardinal unit vectors.
    pub fn from_delta(dx: i32, dy: i32) -> Option<Direction> {
        match (dx, dy) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    /// Translate a pointer drag into a direction. The dominant axis wins;
    /// drags shorter than `min_distance` are ignored.
    pub fn from_swipe(dx: f32, dy: f32, min_distance: f32) -> Option<Direction> {
        let (ax, ay) = (dx.abs(), dy.abs());
        if ax.max(ay) < min_distance {
            return None;
        }
        if ax > ay {
            Some(if dx > 0.0 { Direction::Right } else { Direction::Left })
        } else {
            Some(if dy > 0.0 { Direction::Down } else { Direction::Up })
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Board dimensions. A board with a non-positive side is invalid and every
/// query against it degrades to "out of bounds".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Board {
    pub width: i32,
    pub height: i32,
}

impl Board {
    pub const fn new(width: i32, height: i32) -> Self {
        Board { width, height }
    }

    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    #[inline]
    pub fn contains(self, p: Position) -> bool {
        p.x >= 0 && p.x < self.width && p.y >= 0 && p.y < self.height
    }

    /// Number of cells (0 for an invalid board).
    pub fn area(self) -> usize {
        if self.is_valid() { (self.width as usize) * (self.height as usize) } else { 0 }
    }

    /// Row-major index of an in-bounds cell.
    #[inline]
    pub fn index(self, p: Position) -> Option<usize> {
        if self.contains(p) {
            Some(p.y as usize * self.width as usize + p.x as usize)
        } else {
            None
        }
    }

    /// All cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Position> {
        let (w, h) = if self.is_valid() { (self.width, self.height) } else { (0, 0) };
        (0..h).flat_map(move |y| (0..w).map(move |x| Position::new(x, y)))
    }
}

/// Obstacle look. Cosmetic only; every kind blocks the same way.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObstacleKind {
    Brick,
    Rock,
    Tree,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 3] = [ObstacleKind::Brick, ObstacleKind::Rock, ObstacleKind::Tree];
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Obstacle {
    pub pos: Position,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub const fn new(x: i32, y: i32, kind: ObstacleKind) -> Self {
        Obstacle { pos: Position::new(x, y), kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cardinal_deltas_are_directions() {
        assert_eq!(Direction::from_delta(1, 0), Some(Direction::Right));
        assert_eq!(Direction::from_delta(0, -1), Some(Direction::Up));
        assert_eq!(Direction::from_delta(0, 0), None);
        assert_eq!(Direction::from_delta(1, 1), None);
        assert_eq!(Direction::from_delta(2, 0), None);
    }

    #[test]
    fn delta_round_trips() {
        for d in Direction::ALL {
            let (dx, dy) = d.delta();
            assert_eq!(Direction::from_delta(dx, dy), Some(d));
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn swipe_picks_dominant_axis() {
        assert_eq!(Direction::from_swipe(50.0, 10.0, 30.0), Some(Direction::Right));
        assert_eq!(Direction::from_swipe(-50.0, 10.0, 30.0), Some(Direction::Left));
        assert_eq!(Direction::from_swipe(5.0, -40.0, 30.0), Some(Direction::Up));
        assert_eq!(Direction::from_swipe(0.0, 31.0, 30.0), Some(Direction::Down));
    }

    #[test]
    fn short_swipe_is_ignored() {
        assert_eq!(Direction::from_swipe(20.0, 25.0, 30.0), None);
    }

    #[test]
    fn board_bounds() {
        let b = Board::new(3, 2);
        assert!(b.contains(Position::new(2, 1)));
        assert!(!b.contains(Position::new(3, 0)));
        assert!(!b.contains(Position::new(-1, 0)));
        assert_eq!(b.index(Position::new(1, 1)), Some(4));
        assert_eq!(b.cells().count(), 6);
        assert_eq!(b.cells().next(), Some(Position::new(0, 0)));
    }

    #[test]
    fn invalid_board_has_no_cells() {
        let b = Board::new(0, 5);
        assert!(!b.is_valid());
        assert_eq!(b.area(), 0);
        assert_eq!(b.cells().count(), 0);
        assert!(!b.contains(Position::new(0, 0)));
    }

    #[test]
    fn offset_walks_along_direction() {
        let p = Position::new(2, 2);
        assert_eq!(p.offset(Direction::Left, 2), Position::new(0, 2));
        assert_eq!(p.step(Direction::Down), Position::new(2, 3));
    }
}
