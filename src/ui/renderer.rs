/// Terminal view of the maze.
///
/// The board is drawn two columns per cell below a one-line HUD. A frame
/// is composed into `front`; `flush_diff` writes only the cells that
/// differ from what is already on screen (`back`), then the two swap.
/// A phase change or a resize repaints everything.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use lucys_maze::domain::entity::PowerUpKind;
use lucys_maze::domain::grid::{ObstacleKind, Position};
use lucys_maze::domain::maze::PLAYER_START;
use lucys_maze::sim::world::{Phase, WorldState};

const BASE_BG: Color = Color::Rgb { r: 18, g: 24, b: 18 };
const HUD_BG: Color = Color::Rgb { r: 30, g: 50, b: 30 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

// ── Screen cells ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Marks a stale screen; no composed cell matches it.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = if bg == Color::Reset { BASE_BG } else { bg };
        Cell { ch, fg, bg }
    }
}

// ── Frames ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Renderer ──

const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    message: String,
    message_frames: u32,
    frame: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            message: String::new(),
            message_frames: 0,
            frame: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        self.fit_terminal();
        Ok(())
    }

    /// Track the terminal size. Returns true if it changed.
    fn fit_terminal(&mut self) -> bool {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (w, h) = (tw as usize, th as usize);
        if (w, h) == (self.term_w, self.term_h) && self.front.cells.len() == w * h {
            return false;
        }
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.invalidate();
        true
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Show `msg` under the board for `frames` rendered frames.
    pub fn set_message(&mut self, msg: impl Into<String>, frames: u32) {
        self.message = msg.into();
        self.message_frames = frames;
    }

    pub fn render(&mut self, world: &WorldState) -> io::Result<()> {
        self.frame += 1;

        let resized = self.fit_terminal();
        if resized || self.last_phase != Some(world.phase) {
            self.back.invalidate();
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world),
            Phase::Playing => self.compose_game(world),
            Phase::GameOver => {
                self.compose_game(world);
                self.compose_game_over(world);
            }
        }
        if world.paused {
            self.compose_pause_overlay(world);
        }

        if self.message_frames > 0 {
            self.message_frames -= 1;
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Output ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Screens ──

    fn compose_game(&mut self, w: &WorldState) {
        let hud = format!(
            " Level {:<3} Score {:<6} Best {:<6} Shields {}  Continues {}  Coins {}/{} ",
            w.stats.level, w.stats.score, w.stats.best_score.max(w.stats.score),
            w.stats.shields, w.stats.continues, w.coins_collected(), w.stats.initial_coins,
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        let (bw, bh) = (w.board.width.max(0) as usize, w.board.height.max(0) as usize);

        // Frame
        let wall = Color::Rgb { r: 90, g: 110, b: 90 };
        for y in 0..bh + 2 {
            self.front.set(MAP_COL - 1, MAP_ROW - 1 + y, Cell::new('│', wall, Color::Reset));
            self.front.set(MAP_COL + bw * CELL_W, MAP_ROW - 1 + y, Cell::new('│', wall, Color::Reset));
        }
        for x in 0..bw * CELL_W + 2 {
            let ch = if x == 0 || x == bw * CELL_W + 1 { '+' } else { '─' };
            self.front.set(MAP_COL - 1 + x, MAP_ROW - 1, Cell::new(ch, wall, Color::Reset));
            self.front.set(MAP_COL - 1 + x, MAP_ROW + bh, Cell::new(ch, wall, Color::Reset));
        }

        // Static layer
        for y in 0..bh as i32 {
            for x in 0..bw as i32 {
                let p = Position::new(x, y);
                let (glyph, fg) = static_glyph(w, p);
                self.put_cell(p, glyph, fg);
            }
        }

        // Items and hazards
        if let Some(item) = w.items.power_up {
            let (glyph, fg) = match item.kind {
                PowerUpKind::Shield => ("()", Color::Rgb { r: 80, g: 200, b: 255 }),
                PowerUpKind::Continue => ("<3", Color::Rgb { r: 255, g: 90, b: 140 }),
            };
            self.put_cell(item.pos, glyph, fg);
        }
        for s in &w.spiders {
            self.put_cell(s.cell(), "><", Color::Rgb { r: 200, g: 120, b: 255 });
        }
        for e in &w.enemies {
            let (vx, vy) = e.visual_position(w.config.enemies.move_duration_ms);
            let at = Position::new(vx.round() as i32, vy.round() as i32);
            self.put_cell(at, "&&", Color::Rgb { r: 255, g: 80, b: 60 });
        }

        // Player, drawn at the interpolated cell
        let (px, py) = w.player.visual_position();
        let at = Position::new(px.round() as i32, py.round() as i32);
        let blink = w.is_invincible() && (self.frame / 4) % 2 == 0;
        let fg = if w.phase == Phase::GameOver {
            Color::DarkGrey
        } else if blink {
            Color::Rgb { r: 80, g: 200, b: 255 }
        } else {
            Color::Rgb { r: 255, g: 255, b: 120 }
        };
        self.put_cell(at, "@@", fg);

        // Message + help
        let msg_row = MAP_ROW + bh + 2;
        if self.message_frames > 0 && !self.message.is_empty() {
            let msg = format!(" {} ", self.message);
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &msg, Color::Black, MSG_BG);
        }
        let help = " Arrows/WASD: Slide   P: Pause   M: Menu   Q: Quit";
        self.front.put_str(0, msg_row + 2, help, Color::DarkGrey, Color::Reset);
    }

    fn put_cell(&mut self, p: Position, glyph: &str, fg: Color) {
        if p.x < 0 || p.y < 0 {
            return;
        }
        let col = MAP_COL + p.x as usize * CELL_W;
        let row = MAP_ROW + p.y as usize;
        self.front.put_str(col, row, glyph, fg, Color::Reset);
    }

    fn compose_title(&mut self, w: &WorldState) {
        let title = [
            r"  _                 _       __  __               ",
            r" | |  _  _  __ _  _( )___  |  \/  | __ _  ___ ___",
            r" | |_| || |/ _| || |/(_-<  | |\/| |/ _` ||_ // -_)",
            r" |____\_,_|\__|\_, | /__/  |_|  |_|\__,_|/__|\___|",
            r"               |__/                               ",
        ];
        let gold = Color::Rgb { r: 255, g: 200, b: 50 };
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, gold, Color::Reset);
        }

        let hi = Color::Rgb { r: 80, g: 255, b: 80 };
        let best = format!("Best score: {}", w.stats.best_score);
        self.front.put_str(8, 9, &best, Color::White, Color::Reset);
        self.front.put_str(8, 11, "ENTER   New Game", hi, Color::Reset);
        self.front.put_str(8, 12, "  Q     Quit", Color::White, Color::Reset);

        let help = [
            "How to play",
            "  Arrows / WASD slide until something stops you.",
            "  Press a new direction mid-slide to turn at the next gap.",
            "  $ coins +10, [] exit +100, ^^ traps and && enemies kill.",
            "  () shield absorbs one hit, <3 gives a continue.",
        ];
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { gold } else { Color::White };
            self.front.put_str(8, 15 + i, line, color, Color::Reset);
        }
    }

    fn compose_game_over(&mut self, w: &WorldState) {
        let red = Color::Rgb { r: 255, g: 60, b: 60 };
        let panel = Color::Rgb { r: 40, g: 20, b: 20 };
        let x = MAP_COL + 1;
        let y = MAP_ROW + 2;
        let lines = [
            "  GAME OVER  ".to_string(),
            format!(" Score: {:<6}", w.stats.score),
            format!(" Level: {:<6}", w.stats.level),
        ];
        for (i, l) in lines.iter().enumerate() {
            self.front.put_str(x, y + i, l, if i == 0 { red } else { Color::White }, panel);
        }
        let best = format!(" Best:  {:<6}", w.stats.best_score);
        self.front.put_str(x, y + 4, &best, Color::Rgb { r: 255, g: 220, b: 50 }, panel);
        self.front.put_str(x, y + 6, " R: Restart  ", Color::Rgb { r: 80, g: 255, b: 80 }, panel);
        if w.stats.continues > 0 {
            let c = format!(" C: Continue ({})", w.stats.continues);
            self.front.put_str(x, y + 7, &c, Color::Rgb { r: 80, g: 255, b: 80 }, panel);
        }
        self.front.put_str(x, y + 8, " M: Menu     ", Color::DarkGrey, panel);
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let label = if (self.frame / 30) % 2 == 0 { " >  PAUSED  < " } else { "    PAUSED    " };
        let row = MAP_ROW + (w.board.height.max(0) as usize) / 2;
        self.front.put_str(MAP_COL + 1, row, label, Color::Rgb { r: 255, g: 220, b: 50 }, dim);
        self.front.put_str(MAP_COL + 1, row + 1, " P to resume  ", Color::White, dim);
    }
}

fn static_glyph(w: &WorldState, p: Position) -> (&'static str, Color) {
    if let Some(o) = w.maze.obstacles.iter().find(|o| o.pos == p) {
        return match o.kind {
            ObstacleKind::Brick => ("##", Color::Rgb { r: 180, g: 90, b: 60 }),
            ObstacleKind::Rock => ("%%", Color::Rgb { r: 150, g: 150, b: 150 }),
            ObstacleKind::Tree => ("YY", Color::Rgb { r: 60, g: 180, b: 60 }),
        };
    }
    if w.maze.exit == p {
        return ("[]", Color::Rgb { r: 80, g: 255, b: 80 });
    }
    if w.maze.is_trap(p) {
        return ("^^", Color::Rgb { r: 255, g: 60, b: 60 });
    }
    if w.maze.has_coin(p) {
        return ("$ ", Color::Rgb { r: 255, g: 210, b: 40 });
    }
    if p == PLAYER_START {
        return ("..", Color::DarkGrey);
    }
    ("  ", Color::White)
}
