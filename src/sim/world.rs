/// WorldState: the complete snapshot of a running session.
///
/// ## Layers
///
///   - `maze`     : the level as generated. Only `coins` shrinks in play.
///   - `collision`: derived from `maze.obstacles`; rebuilt by
///                   `level::load_maze`, never patched.
///   - `player`   : slide state; hazards and items live beside it.
///
/// Everything a tick reads or writes hangs off this struct, so a session
/// is reproducible from its config and seed.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::domain::collision::CollisionSystem;
use crate::domain::entity::{Enemy, PowerUp, Spider};
use crate::domain::grid::{Board, Direction};
use crate::domain::maze::{MazeData, MazeGenerator, PLAYER_START};
use crate::domain::movement::{step_duration_ms, PlayerMotion};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    GameOver,
}

/// Score, level and power-up counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stats {
    pub level: u32,
    pub score: u32,
    pub shields: u32,
    pub continues: u32,
    /// Coins on the board when the level started.
    pub initial_coins: usize,
    pub best_score: u32,
}

impl Stats {
    pub fn new(best_score: u32) -> Self {
        Stats { level: 1, score: 0, shields: 0, continues: 0, initial_coins: 0, best_score }
    }
}

/// The level's single power-up slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Items {
    pub power_up: Option<PowerUp>,
    /// A power-up already appeared this level (collected or not).
    pub spawned: bool,
}

pub struct WorldState {
    pub config: GameConfig,
    pub board: Board,
    pub generator: MazeGenerator,
    pub collision: CollisionSystem,
    pub maze: MazeData,

    // ── Actors ──
    pub player: PlayerMotion,
    /// Last directional input; read by the turn check.
    pub desired: Option<Direction>,
    pub enemies: Vec<Enemy>,
    pub spiders: Vec<Spider>,
    pub items: Items,

    // ── Meta ──
    pub stats: Stats,
    pub phase: Phase,
    pub paused: bool,
    pub rng: Pcg32,
    pub seed: u64,

    // ── Timers ──
    pub time_ms: u64,
    /// Time banked towards the next hazard update.
    pub hazard_accum_ms: u32,
    /// Remaining shield grace period.
    pub invincible_ms: u32,
}

// ── Construction ──

impl WorldState {
    /// A session seeded from `config.general.seed`, or randomly.
    pub fn new(config: GameConfig) -> Self {
        let seed = config.general.seed.unwrap_or_else(rand::random::<u64>);
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        let board = Board::new(config.board.width, config.board.height);
        let step_ms = step_duration_ms(1, &config.speed);
        WorldState {
            generator: MazeGenerator::new(board, config.maze.clone()),
            collision: CollisionSystem::new(board),
            maze: MazeData::default(),
            player: PlayerMotion::new(PLAYER_START, step_ms),
            desired: None,
            enemies: vec![],
            spiders: vec![],
            items: Items::default(),
            stats: Stats::new(0),
            phase: Phase::Title,
            paused: false,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            time_ms: 0,
            hazard_accum_ms: 0,
            invincible_ms: 0,
            board,
            config,
        }
    }
}

// ── Queries ──

impl WorldState {
    pub fn coins_collected(&self) -> usize {
        self.stats.initial_coins.saturating_sub(self.maze.coins.len())
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ms > 0
    }
}
