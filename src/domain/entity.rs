/// Entities: Enemy (random walker), Spider (two-point patroller), power-up items.
/// Positions are grid cells; spiders keep a fractional position while moving.

use super::grid::{Direction, Position};

/// Random-walking enemy.
///
/// While travelling the enemy still occupies `pos`; it moves onto the
/// target cell only when the travel time has elapsed.
#[derive(Clone, Debug)]
pub struct Enemy {
    pub pos: Position,
    pub dir: Direction,
    pub travel: Option<Travel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Travel {
    pub target: Position,
    pub elapsed_ms: u32,
}

impl Enemy {
    pub fn new(pos: Position, dir: Direction) -> Self {
        Enemy { pos, dir, travel: None }
    }

    pub fn is_moving(&self) -> bool {
        self.travel.is_some()
    }

    /// Interpolated cell position for drawing.
    pub fn visual_position(&self, move_duration_ms: u32) -> (f32, f32) {
        match self.travel {
            Some(t) if move_duration_ms > 0 => {
                let k = (t.elapsed_ms as f32 / move_duration_ms as f32).min(1.0);
                (
                    self.pos.x as f32 + (t.target.x - self.pos.x) as f32 * k,
                    self.pos.y as f32 + (t.target.y - self.pos.y) as f32 * k,
                )
            }
            _ => (self.pos.x as f32, self.pos.y as f32),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SpiderState {
    /// Resting at an endpoint since the given world time.
    Waiting { since_ms: u64 },
    Moving,
}

/// Patrols back and forth between `a` and `b` along a row or column.
#[derive(Clone, Debug)]
pub struct Spider {
    pub x: f32,
    pub y: f32,
    pub a: Position,
    pub b: Position,
    pub target: Position,
    pub state: SpiderState,
}

impl Spider {
    /// Starts resting on `a`, heading for `b` next.
    pub fn new(a: Position, b: Position, now_ms: u64) -> Self {
        Spider {
            x: a.x as f32,
            y: a.y as f32,
            a,
            b,
            target: b,
            state: SpiderState::Waiting { since_ms: now_ms },
        }
    }

    /// The cell the spider counts as occupying.
    pub fn cell(&self) -> Position {
        Position::new(self.x.round() as i32, self.y.round() as i32)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PowerUpKind {
    Shield,
    Continue,
}

/// A power-up lying on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub pos: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spider_starts_waiting_on_a() {
        let s = Spider::new(Position::new(1, 4), Position::new(5, 4), 100);
        assert_eq!(s.cell(), Position::new(1, 4));
        assert_eq!(s.target, Position::new(5, 4));
        assert_eq!(s.state, SpiderState::Waiting { since_ms: 100 });
    }

    #[test]
    fn spider_cell_rounds() {
        let mut s = Spider::new(Position::new(1, 4), Position::new(5, 4), 0);
        s.x = 2.45;
        assert_eq!(s.cell(), Position::new(2, 4));
        s.x = 2.55;
        assert_eq!(s.cell(), Position::new(3, 4));
    }

    #[test]
    fn enemy_interpolates_while_travelling() {
        let mut e = Enemy::new(Position::new(2, 2), Direction::Right);
        assert_eq!(e.visual_position(1000), (2.0, 2.0));
        e.travel = Some(Travel { target: Position::new(3, 2), elapsed_ms: 250 });
        let (x, y) = e.visual_position(1000);
        assert!((x - 2.25).abs() < 1e-6);
        assert_eq!(y, 2.0);
    }
}
