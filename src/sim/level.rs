/// Level lifecycle: new game, next level, continue.
///
/// Every level is generated fresh:
///   1. random exit on the right column or bottom row
///   2. `MazeGenerator::generate` (falls back to the fixed layout)
///   3. collision map rebuilt from the obstacles
///   4. player reset to the start cell at the level's slide speed
///   5. enemies and spiders spawned for the level number

use crate::domain::ai;
use crate::domain::grid::Position;
use crate::domain::maze::{generate_random_exit, MazeData, PLAYER_START};
use crate::domain::movement::step_duration_ms;
use super::event::GameEvent;
use super::world::{Items, Phase, Stats, WorldState};

/// Points for clearing a level.
pub const LEVEL_POINTS: u32 = 100;

/// Generate and install the level `world.stats.level`.
pub fn start_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let exit = generate_random_exit(world.board, &mut world.rng);
    let maze = world.generator.generate(exit, &mut world.rng);
    load_maze(world, maze);
    spawn_hazards(world);

    let level = world.stats.level;
    log::info!(
        "level {level}: exit ({}, {}), {} coins, {} obstacles, {} traps, {} enemies, {} spiders",
        world.maze.exit.x, world.maze.exit.y,
        world.maze.coins.len(), world.maze.obstacles.len(), world.maze.traps.len(),
        world.enemies.len(), world.spiders.len(),
    );
    events.push(GameEvent::LevelStarted { level });
}

/// Install `maze` as the current layout without any hazards.
pub fn load_maze(world: &mut WorldState, maze: MazeData) {
    world.collision.set_board(world.board);
    world.collision.build(&maze.obstacles);
    world.stats.initial_coins = maze.coins.len();
    world.maze = maze;

    world.items = Items::default();
    world.enemies.clear();
    world.spiders.clear();
    world.desired = None;
    world.invincible_ms = 0;
    world.hazard_accum_ms = 0;

    world.player.reset(PLAYER_START);
    world.player.set_step_duration(step_duration_ms(world.stats.level, &world.config.speed));
}

fn spawn_hazards(world: &mut WorldState) {
    let level = world.stats.level;
    let mut exclude: Vec<Position> = vec![PLAYER_START];
    exclude.extend(world.maze.occupied_cells());

    world.enemies = ai::spawn_enemies(
        level, &exclude, &world.collision, &world.config.enemies, &mut world.rng,
    );
    world.spiders = ai::spawn_spiders(
        level, &world.maze, &world.collision, &world.config.spiders, world.time_ms, &mut world.rng,
    );
}

// ── Session transitions ──

/// Level 1, score 0, no power-ups. Used from the title and after game over.
pub fn new_game(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.stats = Stats::new(world.stats.best_score);
    world.phase = Phase::Playing;
    world.paused = false;
    start_level(world, &mut events);
    events
}

pub fn restart(world: &mut WorldState) -> Vec<GameEvent> {
    log::info!("restart after game over at level {}", world.stats.level);
    new_game(world)
}

/// Spend a continue: same level and score, new maze.
pub fn use_continue(world: &mut WorldState) -> Vec<GameEvent> {
    if world.phase != Phase::GameOver || world.stats.continues == 0 {
        return vec![];
    }
    world.stats.continues -= 1;
    world.phase = Phase::Playing;
    let mut events = vec![GameEvent::Continued { level: world.stats.level }];
    start_level(world, &mut events);
    events
}

/// Exit reached: bonus, next level.
pub fn next_level(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    world.stats.score += LEVEL_POINTS;
    world.stats.level += 1;
    start_level(world, events);
}

pub fn return_to_title(world: &mut WorldState) {
    world.phase = Phase::Title;
    world.paused = false;
    world.player.stop();
    world.desired = None;
}
