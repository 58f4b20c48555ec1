/// Player slide policy: continuous "slide until blocked" movement.
///
/// A slide is committed when it starts: the stop cell is the first trap,
/// hazard or exit along the ray, else the last cell before an obstacle.
/// Time then advances the player through whole cells. Each entered cell
/// is processed exactly once, in order:
///
///   1. pickups          → `SlideHooks::collect`
///   2. trap / hazard    → `SlideHooks::hit` (true = fatal, stops here)
///   3. exit             → `SlideHooks::reach_exit` (stops here)
///   4. turn opportunity → desired direction differs and its adjacent
///                         cell is free: snap, start a new slide
///
/// A terminal condition at a cell always wins over a turn at that cell.
/// Turns only happen on cell boundaries.

use crate::config::SpeedConfig;
use super::collision::CollisionSystem;
use super::grid::{Direction, Position};

/// Per-cell slide duration for `level`: a linear drop from the base
/// duration, clamped at the minimum.
pub fn step_duration_ms(level: u32, cfg: &SpeedConfig) -> u32 {
    let decrement = level.max(1).saturating_mul(cfg.step_dec_per_level);
    cfg.base_step_ms.saturating_sub(decrement).max(cfg.min_step_ms)
}

/// What the session layer plugs into a slide.
///
/// Queries are read during planning and per cell; the `&mut` callbacks
/// apply their effects.
pub trait SlideHooks {
    fn is_trap(&self, at: Position) -> bool;
    /// A moving hazard currently occupies `at`.
    fn is_hazard(&self, at: Position) -> bool;
    fn is_exit(&self, at: Position) -> bool;
    /// Desired direction from the input buffer, if any.
    fn desired_direction(&self) -> Option<Direction>;

    /// Collect whatever lies on `at`. Must be idempotent.
    fn collect(&mut self, at: Position);
    /// The player touched a trap or hazard. Return true if it was fatal.
    fn hit(&mut self, at: Position) -> bool;
    fn reach_exit(&mut self, at: Position);
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlideStart {
    Started { target: Position, steps: u32 },
    /// Adjacent cell blocked: nothing to animate.
    Blocked,
    /// Already moving, or not a cardinal unit vector.
    Rejected,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlideOutcome {
    Idle,
    Sliding,
    Died(Position),
    ReachedExit(Position),
    Completed(Position),
    Turned { at: Position, dir: Direction },
}

#[derive(Clone, Debug)]
struct Slide {
    dir: Direction,
    origin: Position,
    target: Position,
    steps: u32,
    /// Cells already entered and processed (0..=steps).
    processed: u32,
    elapsed_ms: u32,
}

#[derive(Clone, Debug)]
pub struct PlayerMotion {
    position: Position,
    direction: Option<Direction>,
    slide: Option<Slide>,
    step_ms: u32,
}

impl PlayerMotion {
    pub fn new(position: Position, step_ms: u32) -> Self {
        PlayerMotion { position, direction: None, slide: None, step_ms }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn is_moving(&self) -> bool {
        self.slide.is_some()
    }

    pub fn step_ms(&self) -> u32 {
        self.step_ms
    }

    /// Takes effect from the next slide.
    pub fn set_step_duration(&mut self, step_ms: u32) {
        self.step_ms = step_ms;
    }

    /// Cancel any slide; the player stays on the last entered cell.
    pub fn stop(&mut self) {
        self.slide = None;
        self.direction = None;
    }

    pub fn reset(&mut self, position: Position) {
        self.stop();
        self.position = position;
    }

    // ══════════════════════════════════════════════════════════════
    // Starting a slide
    // ══════════════════════════════════════════════════════════════

    /// Start sliding along `(dx, dy)`.
    pub fn slide<H: SlideHooks + ?Sized>(
        &mut self,
        dx: i32,
        dy: i32,
        collision: &CollisionSystem,
        hooks: &H,
    ) -> SlideStart {
        match Direction::from_delta(dx, dy) {
            Some(dir) => self.slide_toward(dir, collision, hooks),
            None => SlideStart::Rejected,
        }
    }

    pub fn slide_toward<H: SlideHooks + ?Sized>(
        &mut self,
        dir: Direction,
        collision: &CollisionSystem,
        hooks: &H,
    ) -> SlideStart {
        if self.is_moving() {
            return SlideStart::Rejected;
        }

        let ray = collision.calculate_move_until_obstacle(self.position, dir);
        if ray.distance == 0 {
            self.direction = None;
            return SlideStart::Blocked;
        }

        // First interrupting cell wins over the obstacle-limited end.
        let steps = (1..=ray.distance)
            .find(|&i| {
                let cell = self.position.offset(dir, i as i32);
                hooks.is_trap(cell) || hooks.is_hazard(cell) || hooks.is_exit(cell)
            })
            .unwrap_or(ray.distance);
        let target = self.position.offset(dir, steps as i32);

        self.direction = Some(dir);
        self.slide = Some(Slide {
            dir,
            origin: self.position,
            target,
            steps,
            processed: 0,
            elapsed_ms: 0,
        });
        SlideStart::Started { target, steps }
    }

    // ══════════════════════════════════════════════════════════════
    // Advancing
    // ══════════════════════════════════════════════════════════════

    /// Advance the current slide by `dt_ms`, processing every cell entered.
    pub fn advance<H: SlideHooks + ?Sized>(
        &mut self,
        dt_ms: u32,
        collision: &CollisionSystem,
        hooks: &mut H,
    ) -> SlideOutcome {
        let Some(mut slide) = self.slide.take() else {
            return SlideOutcome::Idle;
        };

        slide.elapsed_ms = slide.elapsed_ms.saturating_add(dt_ms);
        let reached = if self.step_ms == 0 {
            slide.steps
        } else {
            (slide.elapsed_ms / self.step_ms).min(slide.steps)
        };

        while slide.processed < reached {
            slide.processed += 1;
            let cell = slide.origin.offset(slide.dir, slide.processed as i32);
            self.position = cell;

            hooks.collect(cell);

            if (hooks.is_trap(cell) || hooks.is_hazard(cell)) && hooks.hit(cell) {
                self.direction = None;
                return SlideOutcome::Died(cell);
            }

            if hooks.is_exit(cell) {
                self.direction = None;
                hooks.reach_exit(cell);
                return SlideOutcome::ReachedExit(cell);
            }

            if let Some(want) = hooks.desired_direction() {
                if want != slide.dir && !collision.is_collision_at(cell.step(want)) {
                    self.direction = None;
                    if let SlideStart::Started { .. } = self.slide_toward(want, collision, &*hooks) {
                        return SlideOutcome::Turned { at: cell, dir: want };
                    }
                }
            }
        }

        if slide.processed < slide.steps {
            self.slide = Some(slide);
            return SlideOutcome::Sliding;
        }

        // The stop cell went through the loop above, so completion only
        // snaps and re-collects.
        self.position = slide.target;
        hooks.collect(slide.target);
        self.direction = None;
        SlideOutcome::Completed(slide.target)
    }

    // ══════════════════════════════════════════════════════════════
    // Adapter views
    // ══════════════════════════════════════════════════════════════

    /// Fraction of the current slide elapsed, 0.0 when idle.
    pub fn progress(&self) -> f32 {
        match &self.slide {
            Some(s) if s.steps > 0 && self.step_ms > 0 => {
                let total = s.steps as f32 * self.step_ms as f32;
                (s.elapsed_ms as f32 / total).clamp(0.0, 1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Interpolated position in cell units for smooth drawing.
    pub fn visual_position(&self) -> (f32, f32) {
        match &self.slide {
            Some(s) => {
                let travelled = self.progress() * s.steps as f32;
                let (dx, dy) = s.dir.delta();
                (
                    s.origin.x as f32 + dx as f32 * travelled,
                    s.origin.y as f32 + dy as f32 * travelled,
                )
            }
            None => (self.position.x as f32, self.position.y as f32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::{Board, Obstacle, ObstacleKind};

    const STEP: u32 = 100;

    #[derive(Default)]
    struct Probe {
        traps: Vec<Position>,
        hazards: Vec<Position>,
        exit: Option<Position>,
        desired: Option<Direction>,
        shields: u32,
        collected: Vec<Position>,
        hits: Vec<Position>,
        exits: Vec<Position>,
    }

    impl SlideHooks for Probe {
        fn is_trap(&self, at: Position) -> bool { self.traps.contains(&at) }
        fn is_hazard(&self, at: Position) -> bool { self.hazards.contains(&at) }
        fn is_exit(&self, at: Position) -> bool { self.exit == Some(at) }
        fn desired_direction(&self) -> Option<Direction> { self.desired }
        fn collect(&mut self, at: Position) { self.collected.push(at); }
        fn hit(&mut self, at: Position) -> bool {
            self.hits.push(at);
            if self.shields > 0 {
                self.shields -= 1;
                false
            } else {
                true
            }
        }
        fn reach_exit(&mut self, at: Position) { self.exits.push(at); }
    }

    fn open_board(w: i32, h: i32, obstacles: &[(i32, i32)]) -> CollisionSystem {
        let obs: Vec<Obstacle> =
            obstacles.iter().map(|&(x, y)| Obstacle::new(x, y, ObstacleKind::Rock)).collect();
        let mut cs = CollisionSystem::new(Board::new(w, h));
        cs.build(&obs);
        cs
    }

    // ── duration curve ──

    #[test]
    fn step_duration_drops_linearly_to_the_floor() {
        let cfg = SpeedConfig::default();
        assert_eq!(step_duration_ms(1, &cfg), 380);
        assert_eq!(step_duration_ms(10, &cfg), 200);
        assert_eq!(step_duration_ms(11, &cfg), 180);
        assert_eq!(step_duration_ms(15, &cfg), 100);
        assert_eq!(step_duration_ms(16, &cfg), 80);
        assert_eq!(step_duration_ms(17, &cfg), 60);
        assert_eq!(step_duration_ms(500, &cfg), 60);
        assert_eq!(step_duration_ms(u32::MAX, &cfg), 60);
    }

    #[test]
    fn step_duration_never_increases() {
        let cfg = SpeedConfig::default();
        let mut prev = u32::MAX;
        for level in 1..200 {
            let d = step_duration_ms(level, &cfg);
            assert!(d <= prev);
            assert!(d >= cfg.min_step_ms);
            prev = d;
        }
    }

    // ── starting ──

    #[test]
    fn slide_to_far_wall() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        let start = m.slide(1, 0, &cs, &probe);
        assert_eq!(start, SlideStart::Started { target: Position::new(9, 0), steps: 9 });
        assert_eq!(m.direction(), Some(Direction::Right));

        assert_eq!(m.advance(STEP * 9, &cs, &mut probe), SlideOutcome::Completed(Position::new(9, 0)));
        assert_eq!(m.position(), Position::new(9, 0));
        assert!(!m.is_moving());
        assert_eq!(m.direction(), None);
    }

    #[test]
    fn blocked_slide_never_animates() {
        let cs = open_board(10, 10, &[(1, 0)]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        assert_eq!(m.slide(1, 0, &cs, &probe), SlideStart::Blocked);
        assert!(!m.is_moving());
        assert_eq!(m.direction(), None);
        assert_eq!(m.advance(STEP, &cs, &mut probe), SlideOutcome::Idle);
        assert!(probe.collected.is_empty());
    }

    #[test]
    fn invalid_vectors_are_rejected() {
        let cs = open_board(5, 5, &[]);
        let probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(2, 2), STEP);
        assert_eq!(m.slide(0, 0, &cs, &probe), SlideStart::Rejected);
        assert_eq!(m.slide(1, 1, &cs, &probe), SlideStart::Rejected);
        assert_eq!(m.slide(2, 0, &cs, &probe), SlideStart::Rejected);
        assert!(!m.is_moving());
    }

    #[test]
    fn moving_player_rejects_new_slides() {
        let cs = open_board(5, 5, &[]);
        let probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        assert!(matches!(m.slide(1, 0, &cs, &probe), SlideStart::Started { .. }));
        assert_eq!(m.slide(0, 1, &cs, &probe), SlideStart::Rejected);
    }

    #[test]
    fn exit_shortens_the_slide() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe { exit: Some(Position::new(4, 0)), ..Probe::default() };
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        assert_eq!(
            m.slide(1, 0, &cs, &probe),
            SlideStart::Started { target: Position::new(4, 0), steps: 4 }
        );
        assert_eq!(m.advance(STEP * 10, &cs, &mut probe), SlideOutcome::ReachedExit(Position::new(4, 0)));
        assert_eq!(probe.exits, vec![Position::new(4, 0)]);
    }

    // ── per-cell processing ──

    #[test]
    fn trap_stops_slide_and_kills() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe { traps: vec![Position::new(3, 0)], ..Probe::default() };
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        assert_eq!(
            m.slide(1, 0, &cs, &probe),
            SlideStart::Started { target: Position::new(3, 0), steps: 3 }
        );
        assert_eq!(m.advance(STEP * 3, &cs, &mut probe), SlideOutcome::Died(Position::new(3, 0)));
        assert_eq!(m.position(), Position::new(3, 0));
        assert!(!m.is_moving());
        assert_eq!(probe.hits, vec![Position::new(3, 0)]);
    }

    #[test]
    fn shielded_trap_hit_completes_there() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe { traps: vec![Position::new(3, 0)], shields: 1, ..Probe::default() };
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        assert_eq!(m.advance(STEP * 3, &cs, &mut probe), SlideOutcome::Completed(Position::new(3, 0)));
        assert_eq!(probe.hits.len(), 1);
        assert_eq!(probe.shields, 0);
    }

    #[test]
    fn hazard_on_path_shortens_the_slide() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe { hazards: vec![Position::new(4, 0)], ..Probe::default() };
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        assert_eq!(
            m.slide(1, 0, &cs, &probe),
            SlideStart::Started { target: Position::new(4, 0), steps: 4 }
        );
        assert_eq!(m.advance(STEP * 10, &cs, &mut probe), SlideOutcome::Died(Position::new(4, 0)));
        assert_eq!(m.position(), Position::new(4, 0));
        assert_eq!(probe.hits, vec![Position::new(4, 0)]);
    }

    #[test]
    fn hazard_arriving_mid_slide_is_caught() {
        let cs = open_board(10, 10, &[]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        assert_eq!(m.advance(STEP, &cs, &mut probe), SlideOutcome::Sliding);
        probe.hazards.push(Position::new(2, 0));
        assert_eq!(m.advance(STEP, &cs, &mut probe), SlideOutcome::Died(Position::new(2, 0)));
    }

    #[test]
    fn every_cell_is_processed_once_in_order() {
        let cs = open_board(6, 1, &[]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        assert_eq!(m.advance(STEP / 2, &cs, &mut probe), SlideOutcome::Sliding);
        assert!(probe.collected.is_empty());
        assert_eq!(m.advance(STEP * 2, &cs, &mut probe), SlideOutcome::Sliding);
        assert_eq!(probe.collected, vec![Position::new(1, 0), Position::new(2, 0)]);
        assert_eq!(m.advance(STEP * 50, &cs, &mut probe), SlideOutcome::Completed(Position::new(5, 0)));
        let expected: Vec<Position> =
            (1..=5).map(|x| Position::new(x, 0)).chain([Position::new(5, 0)]).collect();
        assert_eq!(probe.collected, expected);
    }

    #[test]
    fn zero_step_duration_finishes_at_once() {
        let cs = open_board(4, 4, &[]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 3), 0);
        m.slide(0, -1, &cs, &probe);
        assert_eq!(m.advance(0, &cs, &mut probe), SlideOutcome::Completed(Position::new(0, 0)));
    }

    // ── turning ──

    #[test]
    fn turn_snaps_at_first_open_cell() {
        let cs = open_board(10, 10, &[(1, 1)]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        probe.desired = Some(Direction::Down);

        // (1,0) has an obstacle below, (2,0) does not.
        let out = m.advance(STEP * 5, &cs, &mut probe);
        assert_eq!(out, SlideOutcome::Turned { at: Position::new(2, 0), dir: Direction::Down });
        assert_eq!(m.position(), Position::new(2, 0));
        assert_eq!(m.direction(), Some(Direction::Down));
        assert!(m.is_moving());
        assert_eq!(probe.collected, vec![Position::new(1, 0), Position::new(2, 0)]);

        probe.desired = None;
        assert_eq!(m.advance(STEP * 9, &cs, &mut probe), SlideOutcome::Completed(Position::new(2, 9)));
    }

    #[test]
    fn same_direction_is_not_a_turn() {
        let cs = open_board(5, 5, &[]);
        let mut probe = Probe { desired: Some(Direction::Right), ..Probe::default() };
        let mut m = PlayerMotion::new(Position::new(0, 2), STEP);
        m.slide(1, 0, &cs, &probe);
        assert_eq!(m.advance(STEP * 4, &cs, &mut probe), SlideOutcome::Completed(Position::new(4, 2)));
    }

    #[test]
    fn exit_preempts_turn_at_same_cell() {
        let cs = open_board(5, 5, &[]);
        let mut probe = Probe {
            exit: Some(Position::new(1, 0)),
            desired: Some(Direction::Down),
            ..Probe::default()
        };
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        assert_eq!(m.advance(STEP, &cs, &mut probe), SlideOutcome::ReachedExit(Position::new(1, 0)));
        assert!(!m.is_moving());
    }

    // ── views ──

    #[test]
    fn visual_position_interpolates() {
        let cs = open_board(5, 1, &[]);
        let mut probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(1, 0, &cs, &probe);
        m.advance(STEP * 2, &cs, &mut probe);
        assert!((m.progress() - 0.5).abs() < 1e-6);
        let (x, y) = m.visual_position();
        assert!((x - 2.0).abs() < 1e-5);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn stop_and_reset() {
        let cs = open_board(5, 5, &[]);
        let probe = Probe::default();
        let mut m = PlayerMotion::new(Position::new(0, 0), STEP);
        m.slide(0, 1, &cs, &probe);
        m.stop();
        assert!(!m.is_moving());
        assert_eq!(m.position(), Position::new(0, 0));
        m.reset(Position::new(3, 3));
        assert_eq!(m.position(), Position::new(3, 3));
        assert_eq!(m.progress(), 0.0);
    }
}
