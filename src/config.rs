/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete,
/// then sanitizes values so the core never sees an unusable board.

use serde::Deserialize;
use std::path::PathBuf;

const MIN_BOARD_SIDE: i32 = 3;

/// A cell has at most eight neighbours.
const MAX_NEIGHBOURS: u32 = 8;

// ── Public Config Struct ──

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub maze: MazeConfig,
    pub speed: SpeedConfig,
    pub enemies: EnemyConfig,
    pub spiders: SpiderConfig,
    pub powerups: PowerUpConfig,
    pub general: GeneralConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
    pub tick_rate_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    pub obstacle_probability: f64,
    pub coin_probability: f64,
    pub trap_probability: f64,
    pub max_attempts: u32,
    pub min_free_spaces: u32,
}

/// Per-cell slide duration: `base - level * step_dec_per_level`, clamped
/// at `min_step_ms`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    pub min_step_ms: u32,
    pub base_step_ms: u32,
    pub step_dec_per_level: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub first_spawn_level: u32,
    pub second_enemy_interval: u32,
    pub max_count: u32,
    pub move_duration_ms: u32,
    pub update_throttle_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpiderConfig {
    pub min_patrol_distance: i32,
    pub wait_duration_ms: u32,
    pub move_speed: f32,   // cells per hazard update
    pub first_spawn_level: u32,
    pub second_spawn_level: u32,
    pub third_spawn_level: u32,
    pub placement_attempts: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    pub spawn_coin_ratio: f64,
    pub shield_probability: f64,
    pub shield_invincibility_ms: u32,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Fixed RNG seed. `None` = seed from the clock.
    pub seed: Option<u64>,
}

// ── Defaults ──

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig { width: 8, height: 12, tick_rate_ms: 16 }
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        MazeConfig {
            obstacle_probability: 0.2,
            coin_probability: 0.1,
            trap_probability: 0.05,
            max_attempts: 100,
            min_free_spaces: 4,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            min_step_ms: 60,          // fastest slide, reached at level 17
            base_step_ms: 400,
            step_dec_per_level: 20,
        }
    }
}

impl Default for EnemyConfig {
    fn default() -> Self {
        EnemyConfig {
            first_spawn_level: 5,
            second_enemy_interval: 7,
            max_count: 4,
            move_duration_ms: 1000,
            update_throttle_ms: 16,
        }
    }
}

impl Default for SpiderConfig {
    fn default() -> Self {
        SpiderConfig {
            min_patrol_distance: 3,
            wait_duration_ms: 2000,
            move_speed: 0.05,
            first_spawn_level: 10,
            second_spawn_level: 15,
            third_spawn_level: 20,
            placement_attempts: 50,
        }
    }
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        PowerUpConfig {
            spawn_coin_ratio: 0.8,
            shield_probability: 0.8,
            shield_invincibility_ms: 500,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/lucys-maze`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        load_toml(&search_dirs).sanitized()
    }

    /// Parse a TOML document. Parse errors fall back to defaults.
    pub fn from_toml_str(text: &str) -> Self {
        match toml::from_str::<GameConfig>(text) {
            Ok(cfg) => cfg.sanitized(),
            Err(e) => {
                log::warn!("config.toml parse error: {e}; using default settings");
                GameConfig::default()
            }
        }
    }

    /// Clamp values into ranges the core can work with.
    pub fn sanitized(mut self) -> Self {
        if self.board.width < MIN_BOARD_SIDE || self.board.height < MIN_BOARD_SIDE {
            log::warn!(
                "board {}x{} is too small, clamping to at least {MIN_BOARD_SIDE}x{MIN_BOARD_SIDE}",
                self.board.width, self.board.height
            );
            self.board.width = self.board.width.max(MIN_BOARD_SIDE);
            self.board.height = self.board.height.max(MIN_BOARD_SIDE);
        }
        if self.board.tick_rate_ms == 0 {
            self.board.tick_rate_ms = 1;
        }

        let m = &mut self.maze;
        m.obstacle_probability = clamp_probability("obstacle_probability", m.obstacle_probability);
        m.coin_probability = clamp_probability("coin_probability", m.coin_probability);
        m.trap_probability = clamp_probability("trap_probability", m.trap_probability);
        m.max_attempts = m.max_attempts.max(1);
        if m.min_free_spaces > MAX_NEIGHBOURS {
            log::warn!("maze.min_free_spaces={} exceeds {MAX_NEIGHBOURS}, clamping", m.min_free_spaces);
            m.min_free_spaces = MAX_NEIGHBOURS;
        }

        let s = &mut self.speed;
        if s.min_step_ms > s.base_step_ms {
            log::warn!("speed.min_step_ms exceeds base_step_ms; using base for both");
            s.min_step_ms = s.base_step_ms;
        }

        let p = &mut self.powerups;
        p.spawn_coin_ratio = clamp_probability("spawn_coin_ratio", p.spawn_coin_ratio);
        p.shield_probability = clamp_probability("shield_probability", p.shield_probability);

        if !(self.spiders.move_speed > 0.0) {
            log::warn!("spiders.move_speed must be positive; using default");
            self.spiders.move_speed = SpiderConfig::default().move_speed;
        }
        self.enemies.update_throttle_ms = self.enemies.update_throttle_ms.max(1);

        self
    }
}

fn clamp_probability(name: &str, value: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        log::warn!("{name}={value} is outside [0, 1], clamping");
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // Resolve symlinks so a linked binary still finds data next to the real one.
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/lucys-maze");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> GameConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                log::info!("loading {}", path.display());
                return GameConfig::from_toml_str(&text);
            }
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    GameConfig::default()
}
