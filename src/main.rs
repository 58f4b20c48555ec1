/// Entry point and game loop.

mod ui;

use std::time::{Duration, Instant};

use lucys_maze::config::GameConfig;
use lucys_maze::domain::entity::PowerUpKind;
use lucys_maze::sim::event::GameEvent;
use lucys_maze::sim::level;
use lucys_maze::sim::save::HighScoreStore;
use lucys_maze::sim::step;
use lucys_maze::sim::world::{Phase, WorldState};
use ui::input::{Command, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Longest simulated step; a stalled terminal must not teleport the player.
const MAX_DT_MS: u32 = 100;

const MESSAGE_FRAMES: u32 = 90;

fn main() {
    env_logger::init();

    let config = GameConfig::load();
    let store = HighScoreStore::open();

    let mut world = WorldState::new(config);
    world.stats.best_score = store.load();
    log::info!("session seed {}, high score file {}", world.seed, store.path().display());

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &store);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Lucy's Maze!");
    println!("Final Score: {}   Best: {}", world.stats.score, world.stats.best_score);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    store: &HighScoreStore,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let tick_rate = Duration::from_millis(world.config.board.tick_rate_ms);
    let mut last_tick = Instant::now();

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }

        let mut quit = false;
        for &cmd in kb.commands() {
            if cmd == Command::Quit {
                quit = true;
                break;
            }
            let events = handle_command(world, cmd);
            process_events(renderer, store, &events);
        }
        if quit {
            break;
        }

        let elapsed = last_tick.elapsed();
        if elapsed >= tick_rate {
            let dt = (elapsed.as_millis() as u32).min(MAX_DT_MS);
            let events = step::step(world, dt);
            process_events(renderer, store, &events);
            last_tick = Instant::now();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Route one command according to the current phase.
fn handle_command(world: &mut WorldState, cmd: Command) -> Vec<GameEvent> {
    match (world.phase, cmd) {
        (Phase::Title, Command::Start) => level::new_game(world),

        (Phase::Playing, Command::Move(dir)) => step::input_direction(world, dir),
        (Phase::Playing, Command::Pause) => {
            step::toggle_pause(world);
            vec![]
        }
        (Phase::Playing, Command::Menu) => {
            level::return_to_title(world);
            vec![]
        }

        (Phase::GameOver, Command::Restart | Command::Start) => level::restart(world),
        (Phase::GameOver, Command::Continue) => level::use_continue(world),
        (Phase::GameOver, Command::Menu) => {
            level::return_to_title(world);
            vec![]
        }

        _ => vec![],
    }
}

/// Persist records and turn notable events into the message line.
fn process_events(renderer: &mut Renderer, store: &HighScoreStore, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::LevelStarted { level } => {
                renderer.set_message(format!("Level {level}"), MESSAGE_FRAMES);
            }
            GameEvent::PowerUpSpawned { kind, .. } => {
                let what = match kind {
                    PowerUpKind::Shield => "A shield",
                    PowerUpKind::Continue => "A continue",
                };
                renderer.set_message(format!("{what} appeared!"), MESSAGE_FRAMES);
            }
            GameEvent::PowerUpCollected { kind } => {
                let what = match kind {
                    PowerUpKind::Shield => "Shield +1",
                    PowerUpKind::Continue => "Continue +1",
                };
                renderer.set_message(what, MESSAGE_FRAMES);
            }
            GameEvent::ShieldAbsorbed { .. } => {
                renderer.set_message("Shield absorbed the hit!", MESSAGE_FRAMES);
            }
            GameEvent::ExitReached { .. } => {
                renderer.set_message(format!("Exit! +{}", level::LEVEL_POINTS), MESSAGE_FRAMES);
            }
            GameEvent::GameOver { score } => {
                store.record(*score);
                renderer.set_message("Game over", MESSAGE_FRAMES * 2);
            }
            GameEvent::NewRecord { score } => {
                renderer.set_message(format!("NEW RECORD! {score}"), MESSAGE_FRAMES * 3);
            }
            GameEvent::Continued { level } => {
                renderer.set_message(format!("Continue from level {level}"), MESSAGE_FRAMES);
            }
            _ => {}
        }
    }
}
