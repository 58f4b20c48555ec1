/// Hazard AI: enemy random walk and spider patrol.
///
/// Two hazard kinds:
///   1. **Enemies**: pick a random cardinal direction, walk one cell at a
///      time, re-roll the direction whenever the next cell is blocked.
///   2. **Spiders**: rest at one end of a straight patrol line, then crawl
///      to the other end at a fixed speed per update.
///
/// Occupancy = an enemy's current cell, or a spider's rounded cell.

use rand::Rng;

use crate::config::{EnemyConfig, SpiderConfig};
use super::collision::CollisionSystem;
use super::entity::{Enemy, Spider, SpiderState, Travel};
use super::grid::{Direction, Position};
use super::maze::{generate_free_position, MazeData, PLAYER_START};

// ── Population by level ──

/// One enemy from the first spawn level, one more every interval after
/// that, capped.
pub fn enemy_count(level: u32, cfg: &EnemyConfig) -> u32 {
    if level < cfg.first_spawn_level {
        return 0;
    }
    let mut count = 1;
    let interval = cfg.second_enemy_interval.max(1);
    if level >= cfg.first_spawn_level + interval {
        count = 1 + (level - cfg.first_spawn_level) / interval;
    }
    count.min(cfg.max_count)
}

pub fn spider_count(level: u32, cfg: &SpiderConfig) -> u32 {
    if level < cfg.first_spawn_level {
        0
    } else if level < cfg.second_spawn_level {
        1
    } else if level < cfg.third_spawn_level {
        2
    } else {
        3
    }
}

pub fn random_direction<R: Rng>(rng: &mut R) -> Direction {
    Direction::ALL[rng.random_range(0..Direction::ALL.len())]
}

// ── Spawning ──

/// Place enemies on free cells. `exclude` holds start, exit and every
/// blocking cell; enemies also avoid each other. Enemies that find no
/// cell are skipped.
pub fn spawn_enemies<R: Rng>(
    level: u32,
    exclude: &[Position],
    collision: &CollisionSystem,
    cfg: &EnemyConfig,
    rng: &mut R,
) -> Vec<Enemy> {
    let count = enemy_count(level, cfg);
    let mut taken = exclude.to_vec();
    let mut enemies = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let Some(pos) = generate_free_position(&taken, collision.board(), rng) else {
            log::debug!("no free cell for enemy {}", enemies.len() + 1);
            continue;
        };
        taken.push(pos);
        enemies.push(Enemy::new(pos, random_direction(rng)));
    }
    enemies
}

/// Place spiders on straight, obstacle-free patrol lines.
pub fn spawn_spiders<R: Rng>(
    level: u32,
    maze: &MazeData,
    collision: &CollisionSystem,
    cfg: &SpiderConfig,
    now_ms: u64,
    rng: &mut R,
) -> Vec<Spider> {
    let board = collision.board();
    if !board.is_valid() {
        return Vec::new();
    }
    let valid = |p: Position| {
        board.contains(p) && p != PLAYER_START && p != maze.exit && !maze.is_obstacle(p)
    };

    let count = spider_count(level, cfg);
    let mut spiders = Vec::with_capacity(count as usize);
    for _ in 0..count {
        for _ in 0..cfg.placement_attempts {
            let a = Position::new(rng.random_range(0..board.width), rng.random_range(0..board.height));
            if !valid(a) {
                continue;
            }
            let b = if rng.random::<bool>() {
                Position::new(rng.random_range(0..board.width), a.y)
            } else {
                Position::new(a.x, rng.random_range(0..board.height))
            };
            let dist = (b.x - a.x).abs() + (b.y - a.y).abs();
            if dist < cfg.min_patrol_distance || !valid(b) {
                continue;
            }
            if !collision.is_path_clear(a, b, &maze.obstacles) {
                continue;
            }
            spiders.push(Spider::new(a, b, now_ms));
            break;
        }
    }
    if spiders.len() < count as usize {
        log::debug!("placed {} of {count} spiders", spiders.len());
    }
    spiders
}

// ── Updates ──

/// Advance every enemy by `dt_ms`. Returns the cells enemies arrived on.
pub fn update_enemies<R: Rng>(
    enemies: &mut [Enemy],
    collision: &CollisionSystem,
    cfg: &EnemyConfig,
    dt_ms: u32,
    rng: &mut R,
) -> Vec<Position> {
    let mut arrivals = Vec::new();
    for i in 0..enemies.len() {
        if let Some(mut t) = enemies[i].travel {
            t.elapsed_ms = t.elapsed_ms.saturating_add(dt_ms);
            if t.elapsed_ms >= cfg.move_duration_ms {
                enemies[i].pos = t.target;
                enemies[i].travel = None;
                arrivals.push(t.target);
            } else {
                enemies[i].travel = Some(t);
            }
            continue;
        }

        let next = enemies[i].pos.step(enemies[i].dir);
        let crowded = enemies.iter().enumerate().any(|(j, other)| {
            j != i && (other.pos == next || other.travel.is_some_and(|t| t.target == next))
        });
        if collision.is_collision_at(next) || crowded {
            enemies[i].dir = random_direction(rng);
        } else {
            enemies[i].travel = Some(Travel { target: next, elapsed_ms: 0 });
        }
    }
    arrivals
}

/// One patrol update for every spider at world time `now_ms`.
pub fn update_spiders(spiders: &mut [Spider], cfg: &SpiderConfig, now_ms: u64) {
    let speed = cfg.move_speed;
    for s in spiders.iter_mut() {
        match s.state {
            SpiderState::Waiting { since_ms } => {
                if now_ms.saturating_sub(since_ms) > u64::from(cfg.wait_duration_ms) {
                    s.state = SpiderState::Moving;
                }
            }
            SpiderState::Moving => {
                let dx = s.target.x as f32 - s.x;
                let dy = s.target.y as f32 - s.y;
                if dx.abs() < speed && dy.abs() < speed {
                    s.x = s.target.x as f32;
                    s.y = s.target.y as f32;
                    s.state = SpiderState::Waiting { since_ms: now_ms };
                    s.target = if s.target == s.a { s.b } else { s.a };
                } else {
                    s.x += sign(dx) * speed;
                    s.y += sign(dy) * speed;
                }
            }
        }
    }
}

/// `f32::signum` maps 0.0 to 1.0; a patrol line must not drift off its axis.
fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub fn hazard_at(enemies: &[Enemy], spiders: &[Spider], p: Position) -> bool {
    enemies.iter().any(|e| e.pos == p) || spiders.iter().any(|s| s.cell() == p)
}
