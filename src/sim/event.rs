/// Events emitted by input handling and simulation steps.
/// The presentation layer consumes these for messages, flashes and persistence.

use crate::domain::entity::PowerUpKind;
use crate::domain::grid::{Direction, Position};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    LevelStarted { level: u32 },
    SlideStarted { dir: Direction, target: Position },
    SlideBlocked,
    PlayerStepped { at: Position },
    Turned { at: Position, dir: Direction },
    SlideFinished { at: Position },
    CoinCollected { at: Position },
    PowerUpSpawned { kind: PowerUpKind, at: Position },
    PowerUpCollected { kind: PowerUpKind },
    ShieldAbsorbed { at: Position },
    PlayerKilled { at: Position },
    ExitReached { at: Position },
    EnemyMoved { at: Position },
    GameOver { score: u32 },
    NewRecord { score: u32 },
    Continued { level: u32 },
}
