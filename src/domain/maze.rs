/// Procedural maze generation with a solvability proof.
///
/// A layout is produced by a single row-major pass over the board, drawing
/// per cell: obstacle → coin → trap (mutually exclusive, fixed priority).
/// Blocking cells (obstacles and traps) are only placed where the
/// neighbourhood stays open; the finished layout must then admit a
/// 4-connected path from the start cell to the exit that avoids every
/// blocking cell. Failed attempts are discarded wholesale.
///
/// Randomness is injected, so a seeded RNG reproduces a layout exactly.

use std::collections::VecDeque;

use rand::Rng;

use crate::config::MazeConfig;
use super::grid::{Board, Direction, Obstacle, ObstacleKind, Position};

/// Where every level starts.
pub const PLAYER_START: Position = Position::new(0, 0);

/// Rejection-sampling budget for `generate_free_position`.
pub const FREE_POSITION_ATTEMPTS: u32 = 50;

/// Hand-made layout used when every random attempt fails.
const FALLBACK_COINS: [(i32, i32); 3] = [(2, 2), (5, 5), (7, 3)];
const FALLBACK_OBSTACLES: [(i32, i32, ObstacleKind); 2] =
    [(3, 4, ObstacleKind::Brick), (6, 7, ObstacleKind::Rock)];

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

// ══════════════════════════════════════════════════════════════
// Layout
// ══════════════════════════════════════════════════════════════

/// One level's static content. Only `coins` shrinks during play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MazeData {
    pub coins: Vec<Position>,
    pub obstacles: Vec<Obstacle>,
    pub traps: Vec<Position>,
    pub exit: Position,
}

impl MazeData {
    pub fn empty(exit: Position) -> Self {
        MazeData { exit, ..MazeData::default() }
    }

    pub fn has_coin(&self, p: Position) -> bool {
        self.coins.contains(&p)
    }

    /// Remove the coin at `p`. Returns false if there was none.
    pub fn remove_coin(&mut self, p: Position) -> bool {
        match self.coins.iter().position(|&c| c == p) {
            Some(i) => {
                self.coins.swap_remove(i);
                true
            }
            None => false,
        }
    }

    pub fn is_obstacle(&self, p: Position) -> bool {
        self.obstacles.iter().any(|o| o.pos == p)
    }

    pub fn is_trap(&self, p: Position) -> bool {
        self.traps.contains(&p)
    }

    /// Cells an item or hazard must not spawn on.
    pub fn occupied_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.obstacles
            .iter()
            .map(|o| o.pos)
            .chain(self.traps.iter().copied())
            .chain(std::iter::once(self.exit))
    }
}

// ══════════════════════════════════════════════════════════════
// Generator
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct MazeGenerator {
    board: Board,
    config: MazeConfig,
}

impl MazeGenerator {
    pub fn new(board: Board, config: MazeConfig) -> Self {
        MazeGenerator { board, config }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    /// Produce a solvable layout for `exit`, or the fallback layout once
    /// `max_attempts` random attempts have failed.
    pub fn generate<R: Rng>(&self, exit: Position, rng: &mut R) -> MazeData {
        if !self.board.is_valid() {
            log::warn!(
                "refusing to generate a maze on a {}x{} board",
                self.board.width, self.board.height
            );
            return MazeData::empty(exit);
        }

        let exit = self.clamp_exit(exit);
        let attempts = self.config.max_attempts.max(1);
        for attempt in 1..=attempts {
            let maze = self.attempt(exit, rng);
            if self.is_solvable(&maze) {
                log::debug!(
                    "maze generated on attempt {attempt}: {} obstacles, {} coins, {} traps",
                    maze.obstacles.len(), maze.coins.len(), maze.traps.len()
                );
                return maze;
            }
        }

        log::warn!("no solvable maze after {attempts} attempts, using fallback layout");
        self.fallback_maze(exit)
    }

    fn clamp_exit(&self, exit: Position) -> Position {
        if self.board.contains(exit) {
            return exit;
        }
        let clamped = Position::new(
            exit.x.clamp(0, self.board.width - 1),
            exit.y.clamp(0, self.board.height - 1),
        );
        log::warn!("exit ({}, {}) is off the board, clamped to ({}, {})",
            exit.x, exit.y, clamped.x, clamped.y);
        clamped
    }

    /// One random population pass. Not necessarily solvable.
    fn attempt<R: Rng>(&self, exit: Position, rng: &mut R) -> MazeData {
        let mut maze = MazeData::empty(exit);
        // blocked[i] ↔ obstacle or trap at board index i
        let mut blocked = vec![false; self.board.area()];

        for p in self.board.cells() {
            if p == PLAYER_START || p == exit {
                continue;
            }
            let Some(i) = self.board.index(p) else { continue };

            // A cramped obstacle roll falls through to the coin and trap draws.
            if rng.random::<f64>() < self.config.obstacle_probability
                && self.has_enough_space(p, &blocked)
            {
                let kind = ObstacleKind::ALL[rng.random_range(0..ObstacleKind::ALL.len())];
                maze.obstacles.push(Obstacle { pos: p, kind });
                blocked[i] = true;
            } else if rng.random::<f64>() < self.config.coin_probability {
                maze.coins.push(p);
            } else if rng.random::<f64>() < self.config.trap_probability
                && self.has_enough_space(p, &blocked)
            {
                maze.traps.push(p);
                blocked[i] = true;
            }
        }
        maze
    }

    /// Can `p` become a blocking cell without closing in itself or any
    /// blocking neighbour?
    fn has_enough_space(&self, p: Position, blocked: &[bool]) -> bool {
        let min = self.config.min_free_spaces;
        if self.free_neighbours(p, blocked) < min {
            return false;
        }
        // Every occupied neighbour loses one free cell once `p` is taken.
        let needed = min.saturating_add(1);
        self.neighbours(p)
            .filter(|n| self.is_blocked(*n, blocked))
            .all(|n| self.free_neighbours(n, blocked) >= needed)
    }

    fn neighbours(&self, p: Position) -> impl Iterator<Item = Position> + '_ {
        NEIGHBOURS
            .iter()
            .map(move |&(dx, dy)| Position::new(p.x + dx, p.y + dy))
            .filter(|n| self.board.contains(*n))
    }

    fn is_blocked(&self, p: Position, blocked: &[bool]) -> bool {
        self.board.index(p).map_or(true, |i| blocked[i])
    }

    fn free_neighbours(&self, p: Position, blocked: &[bool]) -> u32 {
        self.neighbours(p).filter(|n| !self.is_blocked(*n, blocked)).count() as u32
    }

    /// BFS from the start cell to the exit. Obstacles and traps are walls.
    pub fn is_solvable(&self, maze: &MazeData) -> bool {
        let board = self.board;
        let (Some(start), Some(goal)) = (board.index(PLAYER_START), board.index(maze.exit)) else {
            return false;
        };
        if start == goal {
            return true;
        }

        let mut visited = vec![false; board.area()];
        for p in maze.obstacles.iter().map(|o| o.pos).chain(maze.traps.iter().copied()) {
            if let Some(i) = board.index(p) {
                visited[i] = true;
            }
        }
        if visited[start] || visited[goal] {
            return false;
        }

        let mut queue = VecDeque::with_capacity(board.area());
        visited[start] = true;
        queue.push_back(PLAYER_START);

        while let Some(cur) = queue.pop_front() {
            for dir in Direction::ALL {
                let next = cur.step(dir);
                let Some(i) = board.index(next) else { continue };
                if visited[i] {
                    continue;
                }
                if i == goal {
                    return true;
                }
                visited[i] = true;
                queue.push_back(next);
            }
        }
        false
    }

    /// The fixed layout, restricted to cells that fit this board and keep
    /// start and exit clear.
    pub fn fallback_maze(&self, exit: Position) -> MazeData {
        let usable = |p: Position| self.board.contains(p) && p != PLAYER_START && p != exit;
        MazeData {
            coins: FALLBACK_COINS
                .iter()
                .map(|&(x, y)| Position::new(x, y))
                .filter(|&p| usable(p))
                .collect(),
            obstacles: FALLBACK_OBSTACLES
                .iter()
                .map(|&(x, y, kind)| Obstacle::new(x, y, kind))
                .filter(|o| usable(o.pos))
                .collect(),
            traps: Vec::new(),
            exit,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Free placement helpers
// ══════════════════════════════════════════════════════════════

/// A cell on the right column or the bottom row, both edges equally likely.
pub fn generate_random_exit<R: Rng>(board: Board, rng: &mut R) -> Position {
    if !board.is_valid() {
        log::warn!("no exit on a {}x{} board", board.width, board.height);
        return PLAYER_START;
    }
    if rng.random::<bool>() {
        Position::new(board.width - 1, rng.random_range(0..board.height))
    } else {
        Position::new(rng.random_range(0..board.width), board.height - 1)
    }
}

/// Uniformly sample a cell not in `exclude`. Gives up after
/// `FREE_POSITION_ATTEMPTS` draws.
pub fn generate_free_position<R: Rng>(
    exclude: &[Position],
    board: Board,
    rng: &mut R,
) -> Option<Position> {
    if !board.is_valid() {
        return None;
    }
    for _ in 0..FREE_POSITION_ATTEMPTS {
        let p = Position::new(rng.random_range(0..board.width), rng.random_range(0..board.height));
        if !exclude.contains(&p) {
            return Some(p);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn generator(w: i32, h: i32) -> MazeGenerator {
        MazeGenerator::new(Board::new(w, h), MazeConfig::default())
    }

    fn count_free(board: Board, maze: &MazeData, p: Position) -> u32 {
        NEIGHBOURS
            .iter()
            .map(|&(dx, dy)| Position::new(p.x + dx, p.y + dy))
            .filter(|n| board.contains(*n) && !maze.is_obstacle(*n) && !maze.is_trap(*n))
            .count() as u32
    }

    #[test]
    fn same_seed_same_maze() {
        let g = generator(8, 12);
        let exit = Position::new(7, 6);
        let a = g.generate(exit, &mut Pcg32::seed_from_u64(42));
        let b = g.generate(exit, &mut Pcg32::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn generated_maze_is_solvable() {
        let g = generator(8, 12);
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..20 {
            let exit = generate_random_exit(g.board(), &mut rng);
            let maze = g.generate(exit, &mut rng);
            assert_eq!(maze.exit, exit);
            assert!(g.is_solvable(&maze) || maze == g.fallback_maze(exit));
        }
    }

    #[test]
    fn walled_off_exit_is_unsolvable() {
        let g = generator(5, 5);
        let maze = MazeData {
            obstacles: vec![
                Obstacle::new(3, 4, ObstacleKind::Rock),
                Obstacle::new(3, 3, ObstacleKind::Rock),
            ],
            traps: vec![Position::new(4, 3)],
            exit: Position::new(4, 4),
            ..MazeData::default()
        };
        assert!(!g.is_solvable(&maze));
    }

    #[test]
    fn coins_do_not_block_solvability() {
        let g = generator(3, 3);
        let maze = MazeData {
            coins: vec![Position::new(1, 0), Position::new(0, 1), Position::new(1, 1)],
            exit: Position::new(2, 2),
            ..MazeData::default()
        };
        assert!(g.is_solvable(&maze));
    }

    #[test]
    fn corridor_walled_shut_falls_back() {
        // A one-wide corridor where every cell between start and exit draws
        // an obstacle can never be solved.
        let cfg = MazeConfig {
            obstacle_probability: 1.0,
            min_free_spaces: 0,
            max_attempts: 3,
            ..MazeConfig::default()
        };
        let g = MazeGenerator::new(Board::new(1, 5), cfg);
        let exit = Position::new(0, 4);
        let maze = g.generate(exit, &mut Pcg32::seed_from_u64(3));
        assert_eq!(maze, g.fallback_maze(exit));
        assert_eq!(maze, MazeData::empty(exit));
    }

    #[test]
    fn cramped_obstacle_roll_still_draws_a_coin() {
        // No cell can ever have 9 free neighbours, so every obstacle roll
        // fails the space check and the coin draw takes the cell.
        let cfg = MazeConfig {
            obstacle_probability: 1.0,
            coin_probability: 1.0,
            trap_probability: 0.0,
            min_free_spaces: 9,
            ..MazeConfig::default()
        };
        let g = MazeGenerator::new(Board::new(5, 5), cfg);
        let exit = Position::new(4, 4);
        let maze = g.generate(exit, &mut Pcg32::seed_from_u64(12));
        assert!(maze.obstacles.is_empty());
        assert_eq!(maze.coins.len(), 23);
        assert!(!maze.has_coin(PLAYER_START) && !maze.has_coin(exit));
    }

    #[test]
    fn fallback_layout_on_default_board() {
        let g = generator(8, 12);
        let maze = g.fallback_maze(Position::new(7, 11));
        assert_eq!(maze.coins, vec![Position::new(2, 2), Position::new(5, 5), Position::new(7, 3)]);
        assert_eq!(maze.obstacles.len(), 2);
        assert!(maze.traps.is_empty());
        assert!(g.is_solvable(&maze));
    }

    #[test]
    fn fallback_drops_cells_off_small_board() {
        let g = generator(4, 4);
        let maze = g.fallback_maze(Position::new(2, 2));
        // (2,2) is the exit, (5,5) and (7,3) are off-board, (3,4) and (6,7) too.
        assert!(maze.coins.is_empty());
        assert!(maze.obstacles.is_empty());
    }

    #[test]
    fn invalid_board_gives_empty_layout() {
        let g = generator(0, 10);
        let maze = g.generate(Position::new(0, 0), &mut Pcg32::seed_from_u64(9));
        assert!(maze.coins.is_empty() && maze.obstacles.is_empty() && maze.traps.is_empty());
    }

    #[test]
    fn off_board_exit_is_clamped() {
        let g = generator(8, 12);
        let maze = g.generate(Position::new(20, 5), &mut Pcg32::seed_from_u64(5));
        assert_eq!(maze.exit, Position::new(7, 5));
    }

    #[test]
    fn zero_probabilities_give_empty_maze() {
        let cfg = MazeConfig {
            obstacle_probability: 0.0,
            coin_probability: 0.0,
            trap_probability: 0.0,
            ..MazeConfig::default()
        };
        let g = MazeGenerator::new(Board::new(6, 6), cfg);
        let maze = g.generate(Position::new(5, 3), &mut Pcg32::seed_from_u64(0));
        assert_eq!(maze, MazeData::empty(Position::new(5, 3)));
    }

    #[test]
    fn exit_lies_on_right_column_or_bottom_row() {
        let board = Board::new(8, 12);
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let e = generate_random_exit(board, &mut rng);
            assert!(board.contains(e));
            assert!(e.x == 7 || e.y == 11);
        }
    }

    #[test]
    fn free_position_respects_exclusions() {
        let board = Board::new(2, 2);
        let exclude = [Position::new(0, 0), Position::new(1, 0), Position::new(0, 1)];
        let mut rng = Pcg32::seed_from_u64(2);
        assert_eq!(generate_free_position(&exclude, board, &mut rng), Some(Position::new(1, 1)));
    }

    #[test]
    fn free_position_gives_up_on_full_board() {
        let board = Board::new(2, 1);
        let exclude = [Position::new(0, 0), Position::new(1, 0)];
        let mut rng = Pcg32::seed_from_u64(2);
        assert_eq!(generate_free_position(&exclude, board, &mut rng), None);
        assert_eq!(generate_free_position(&[], Board::new(0, 0), &mut rng), None);
    }

    #[test]
    fn remove_coin_is_idempotent() {
        let mut maze = MazeData {
            coins: vec![Position::new(1, 1), Position::new(2, 1)],
            ..MazeData::default()
        };
        assert!(maze.remove_coin(Position::new(1, 1)));
        assert!(!maze.remove_coin(Position::new(1, 1)));
        assert_eq!(maze.coins, vec![Position::new(2, 1)]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn generated_mazes_hold_their_invariants(
            w in 3i32..12, h in 3i32..14, seed in any::<u64>(),
        ) {
            let g = generator(w, h);
            let board = g.board();
            let mut rng = Pcg32::seed_from_u64(seed);
            let exit = generate_random_exit(board, &mut rng);
            let maze = g.generate(exit, &mut rng);

            let fallback = maze == g.fallback_maze(exit);
            prop_assert!(fallback || g.is_solvable(&maze));

            let blockers: Vec<Position> = maze
                .obstacles.iter().map(|o| o.pos)
                .chain(maze.traps.iter().copied())
                .collect();
            for p in blockers.iter().chain(maze.coins.iter()) {
                prop_assert!(board.contains(*p));
                prop_assert!(*p != PLAYER_START && *p != exit);
            }
            if !fallback {
                for p in &blockers {
                    prop_assert!(count_free(board, &maze, *p) >= MazeConfig::default().min_free_spaces);
                }
            }
        }

        #[test]
        fn cells_hold_at_most_one_entity(seed in any::<u64>()) {
            let g = generator(8, 12);
            let mut rng = Pcg32::seed_from_u64(seed);
            let maze = g.generate(Position::new(7, 11), &mut rng);
            let mut cells: Vec<Position> = maze.coins.clone();
            cells.extend(maze.traps.iter().copied());
            cells.extend(maze.obstacles.iter().map(|o| o.pos));
            let n = cells.len();
            cells.sort_by_key(|p| (p.y, p.x));
            cells.dedup();
            prop_assert_eq!(cells.len(), n);
        }
    }
}
