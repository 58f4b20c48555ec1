/// Input state tracker.
///
/// Every slide is started by a single key press, so only fresh presses
/// matter: each frame drains the pending terminal events and turns them
/// into `Command`s. Release events are ignored; auto-repeat re-sends the
/// same direction, which just refreshes the desired-direction buffer.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use lucys_maze::domain::grid::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Move(Direction),
    Start,
    Restart,
    Continue,
    Pause,
    Menu,
    Quit,
}

pub struct InputState {
    /// Commands decoded during the most recent `drain_events` call.
    commands: Vec<Command>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            commands: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.commands.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                self.raw_events.push(key);
                if let Some(cmd) = command_for(key.code) {
                    self.commands.push(cmd);
                }
            }
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

/// Arrows and WASD move; letters drive the session.
pub fn command_for(code: KeyCode) -> Option<Command> {
    let cmd = match code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Command::Move(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Command::Move(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Command::Move(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Command::Move(Direction::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Command::Start,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Char('c') | KeyCode::Char('C') => Command::Continue,
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::F(1) => Command::Pause,
        KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Esc => Command::Menu,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}
