/// The step function: advances the session by one frame.
///
/// Processing order:
///   1. Timers (world clock, shield grace period)
///   2. Hazard update, throttled (enemies → spiders → contact check)
///   3. Player slide (pickups, traps/hazards, exit, turns per cell)
///   4. Outcome (game over / next level)
///
/// Input is applied between steps through `input_direction`. The slide
/// policy talks back to the session through `SessionHooks`, which borrows
/// the disjoint parts of the world it needs.

use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::PowerUpConfig;
use crate::domain::ai;
use crate::domain::collision::CollisionSystem;
use crate::domain::entity::{Enemy, PowerUp, PowerUpKind, Spider};
use crate::domain::grid::{Board, Direction, Position};
use crate::domain::maze::{generate_free_position, MazeData};
use crate::domain::movement::{PlayerMotion, SlideHooks, SlideOutcome, SlideStart};
use super::event::GameEvent;
use super::level;
use super::world::{Items, Phase, Stats, WorldState};

/// Points per coin.
pub const COIN_POINTS: u32 = 10;

// ══════════════════════════════════════════════════════════════
// Session hooks
// ══════════════════════════════════════════════════════════════

struct SessionHooks<'a> {
    board: Board,
    maze: &'a mut MazeData,
    enemies: &'a [Enemy],
    spiders: &'a [Spider],
    items: &'a mut Items,
    stats: &'a mut Stats,
    invincible_ms: &'a mut u32,
    rng: &'a mut Pcg32,
    powerups: &'a PowerUpConfig,
    desired: Option<Direction>,
    events: &'a mut Vec<GameEvent>,
    /// Last cell reported as stepped on (collect runs twice on the stop cell).
    last_cell: Option<Position>,
}

/// Split the world into the player, the collision map and the hooks the
/// player's slide reports to.
fn split<'a>(
    world: &'a mut WorldState,
    events: &'a mut Vec<GameEvent>,
) -> (&'a mut PlayerMotion, &'a CollisionSystem, SessionHooks<'a>) {
    let WorldState {
        config, board, collision, maze, player, desired, enemies, spiders, items, stats, rng,
        invincible_ms, ..
    } = world;
    let hooks = SessionHooks {
        board: *board,
        maze,
        enemies: enemies.as_slice(),
        spiders: spiders.as_slice(),
        items,
        stats,
        invincible_ms,
        rng,
        powerups: &config.powerups,
        desired: *desired,
        events,
        last_cell: None,
    };
    (player, collision, hooks)
}

impl SessionHooks<'_> {
    fn maybe_spawn_power_up(&mut self, player: Position) {
        if self.items.spawned || self.stats.initial_coins == 0 {
            return;
        }
        let collected = self.stats.initial_coins.saturating_sub(self.maze.coins.len());
        let ratio = collected as f64 / self.stats.initial_coins as f64;
        if ratio < self.powerups.spawn_coin_ratio {
            return;
        }

        let kind = if self.rng.random::<f64>() < self.powerups.shield_probability {
            PowerUpKind::Shield
        } else {
            PowerUpKind::Continue
        };

        let mut exclude = vec![player];
        exclude.extend(self.maze.occupied_cells());
        exclude.extend(self.maze.coins.iter().copied());
        exclude.extend(self.enemies.iter().map(|e| e.pos));
        exclude.extend(self.items.power_up.iter().map(|p| p.pos));

        // The slot is used up even when no cell was found.
        self.items.spawned = true;
        match generate_free_position(&exclude, self.board, &mut *self.rng) {
            Some(pos) => {
                self.items.power_up = Some(PowerUp { kind, pos });
                self.events.push(GameEvent::PowerUpSpawned { kind, at: pos });
            }
            None => log::debug!("no free cell for {kind:?} power-up"),
        }
    }
}

impl SlideHooks for SessionHooks<'_> {
    fn is_trap(&self, at: Position) -> bool {
        self.maze.is_trap(at)
    }

    fn is_hazard(&self, at: Position) -> bool {
        ai::hazard_at(self.enemies, self.spiders, at)
    }

    fn is_exit(&self, at: Position) -> bool {
        self.maze.exit == at
    }

    fn desired_direction(&self) -> Option<Direction> {
        self.desired
    }

    fn collect(&mut self, at: Position) {
        if self.last_cell != Some(at) {
            self.last_cell = Some(at);
            self.events.push(GameEvent::PlayerStepped { at });
        }

        if self.maze.remove_coin(at) {
            self.stats.score += COIN_POINTS;
            self.events.push(GameEvent::CoinCollected { at });
            self.maybe_spawn_power_up(at);
        }

        if let Some(item) = self.items.power_up.filter(|p| p.pos == at) {
            self.items.power_up = None;
            match item.kind {
                PowerUpKind::Shield => self.stats.shields += 1,
                PowerUpKind::Continue => self.stats.continues += 1,
            }
            self.events.push(GameEvent::PowerUpCollected { kind: item.kind });
        }
    }

    fn hit(&mut self, at: Position) -> bool {
        absorb_hit(self.stats, self.invincible_ms, self.powerups, at, self.events)
    }

    fn reach_exit(&mut self, at: Position) {
        self.events.push(GameEvent::ExitReached { at });
    }
}

/// Resolve a trap or hazard contact. Returns true if it was fatal.
fn absorb_hit(
    stats: &mut Stats,
    invincible_ms: &mut u32,
    powerups: &PowerUpConfig,
    at: Position,
    events: &mut Vec<GameEvent>,
) -> bool {
    if *invincible_ms > 0 {
        return false;
    }
    if stats.shields > 0 {
        stats.shields -= 1;
        *invincible_ms = powerups.shield_invincibility_ms;
        events.push(GameEvent::ShieldAbsorbed { at });
        return false;
    }
    events.push(GameEvent::PlayerKilled { at });
    true
}

// ══════════════════════════════════════════════════════════════
// Input
// ══════════════════════════════════════════════════════════════

/// Record a directional input. An idle player starts sliding at once;
/// a sliding player turns at the next open cell.
pub fn input_direction(world: &mut WorldState, dir: Direction) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused {
        return vec![];
    }
    world.desired = Some(dir);
    if world.player.is_moving() {
        return vec![];
    }

    let mut events = Vec::new();
    let start = {
        let (player, collision, hooks) = split(world, &mut events);
        player.slide_toward(dir, collision, &hooks)
    };
    match start {
        SlideStart::Started { target, .. } => events.push(GameEvent::SlideStarted { dir, target }),
        SlideStart::Blocked => events.push(GameEvent::SlideBlocked),
        SlideStart::Rejected => {}
    }
    events
}

pub fn toggle_pause(world: &mut WorldState) {
    if world.phase == Phase::Playing {
        world.paused = !world.paused;
    }
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, dt_ms: u32) -> Vec<GameEvent> {
    if world.phase != Phase::Playing || world.paused {
        return vec![];
    }

    let mut events: Vec<GameEvent> = Vec::new();
    world.time_ms += u64::from(dt_ms);
    world.invincible_ms = world.invincible_ms.saturating_sub(dt_ms);

    if resolve_hazards(world, dt_ms, &mut events) {
        game_over(world, &mut events);
        return events;
    }

    let outcome = {
        let (player, collision, mut hooks) = split(world, &mut events);
        player.advance(dt_ms, collision, &mut hooks)
    };

    match outcome {
        SlideOutcome::Died(_) => game_over(world, &mut events),
        SlideOutcome::ReachedExit(_) => level::next_level(world, &mut events),
        SlideOutcome::Turned { at, dir } => events.push(GameEvent::Turned { at, dir }),
        SlideOutcome::Completed(at) => events.push(GameEvent::SlideFinished { at }),
        SlideOutcome::Idle | SlideOutcome::Sliding => {}
    }

    for e in &events {
        log::debug!("{e:?}");
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Hazards
// ══════════════════════════════════════════════════════════════

/// Throttled hazard update. Returns true if the player died.
fn resolve_hazards(world: &mut WorldState, dt_ms: u32, events: &mut Vec<GameEvent>) -> bool {
    if world.enemies.is_empty() && world.spiders.is_empty() {
        return false;
    }
    world.hazard_accum_ms = world.hazard_accum_ms.saturating_add(dt_ms);
    if world.hazard_accum_ms < world.config.enemies.update_throttle_ms {
        return false;
    }
    let elapsed = std::mem::take(&mut world.hazard_accum_ms);

    let p = world.player.position();

    // Enemies strike when they step onto the player; standing on the same
    // cell afterwards is harmless. Spiders strike on any overlap.
    let arrivals = ai::update_enemies(
        &mut world.enemies, &world.collision, &world.config.enemies, elapsed, &mut world.rng,
    );
    let enemy_hit = arrivals.contains(&p);
    events.extend(arrivals.into_iter().map(|at| GameEvent::EnemyMoved { at }));

    ai::update_spiders(&mut world.spiders, &world.config.spiders, world.time_ms);
    let spider_hit = world.spiders.iter().any(|s| s.cell() == p);

    if !enemy_hit && !spider_hit {
        return false;
    }
    let fatal = absorb_hit(
        &mut world.stats, &mut world.invincible_ms, &world.config.powerups, p, events,
    );
    if fatal {
        world.player.stop();
    }
    fatal
}

// ══════════════════════════════════════════════════════════════
// Game over
// ══════════════════════════════════════════════════════════════

fn game_over(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.phase = Phase::GameOver;
    world.player.stop();
    world.desired = None;

    let score = world.stats.score;
    log::info!("game over at level {} with {score} points", world.stats.level);
    events.push(GameEvent::GameOver { score });
    if score > world.stats.best_score {
        world.stats.best_score = score;
        events.push(GameEvent::NewRecord { score });
    }
}
