/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Rasterise the scene (world pixels → terminal cells) into a
///      screen-sized scene buffer, bottom row = world y of the viewport
///   2. Blit the scene plus HUD and footer into `front`
///   3. Compare each cell with `back` (previous frame) and only emit
///      terminal commands for cells that changed, batched with `queue!`
///   4. Swap front/back
///
/// The renderer owns its viewport. It is moved only by `set_viewport`,
/// which the game loop calls when the simulation reports a scroll.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::ScreenConfig;
use crate::domain::geom::Rect;
use crate::domain::tile::Layer;
use crate::sim::world::{Phase, Session};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for every cell outside the playfield, so
    /// the gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never produced by composing; forces a full repaint when used as `back`.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells, row 0 at the top ──

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

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
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

    /// Write a string at (x, y). Each char occupies 1 column; clipped.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Like `put_str`, but keeps whatever background is already there.
    fn overlay_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            let bg = self.get(x + i, y).bg;
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }
}

// ── Viewport: world pixels → scene cells ──

/// Which part of the world is on screen and how big a cell is.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Viewport {
    left: f32,
    bottom: f32,
    cell_w: f32,
    cell_h: f32,
    cols: usize,
    rows: usize,
}

impl Viewport {
    /// Scene cells covered by a world rectangle, clipped to the scene.
    /// Rows are counted from the top of the scene. None if off screen.
    fn cells_of(&self, r: &Rect) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let sx0 = ((r.left() - self.left) / self.cell_w).floor();
        let sx1 = ((r.right() - self.left) / self.cell_w).ceil();
        let sy0 = ((r.bottom() - self.bottom) / self.cell_h).floor();
        let sy1 = ((r.top() - self.bottom) / self.cell_h).ceil();

        let c0 = sx0.max(0.0) as usize;
        let c1 = sx1.clamp(0.0, self.cols as f32) as usize;
        let k0 = sy0.max(0.0) as usize;
        let k1 = sy1.clamp(0.0, self.rows as f32) as usize;
        if c0 >= c1 || k0 >= k1 {
            return None;
        }
        // k counts up from the bottom; flip to top-down rows.
        Some((c0..c1, self.rows - k1..self.rows - k0))
    }
}

// ── Styling ──

/// Draw order, back to front.
const DRAW_ORDER: [Layer; 7] = [
    Layer::Platforms,
    Layer::Background,
    Layer::Coins,
    Layer::Keys,
    // player goes here
    Layer::Foreground,
    Layer::DontTouch,
    Layer::Doors,
];
const LAYERS_BEHIND_PLAYER: usize = 4;

const PLAYER_FG: Color = Color::Rgb { r: 255, g: 120, b: 40 };
const SCORE_FG: Color = Color::White;
const DEFAULT_SKY: Color = Color::Rgb { r: 30, g: 30, b: 60 };

/// (glyph, fg, bg); `None` keeps the sprite's own glyph or the sky colour.
fn layer_style(layer: Layer) -> (Option<char>, Color, Option<Color>) {
    match layer {
        Layer::Platforms => (Some('▓'), Color::Rgb { r: 150, g: 105, b: 60 }, Some(Color::Rgb { r: 90, g: 60, b: 35 })),
        Layer::Background => (None, Color::Rgb { r: 200, g: 220, b: 235 }, None),
        Layer::Coins => (None, Color::Rgb { r: 255, g: 215, b: 0 }, None),
        Layer::Keys => (None, Color::Rgb { r: 255, g: 240, b: 120 }, None),
        Layer::Foreground => (None, Color::Rgb { r: 60, g: 170, b: 60 }, None),
        Layer::DontTouch => (None, Color::Rgb { r: 230, g: 40, b: 40 }, None),
        Layer::Doors => (Some('█'), Color::Rgb { r: 140, g: 70, b: 20 }, None),
    }
}

/// Rasterise one frame of the playfield.
fn compose_scene(scene: &mut FrameBuffer, s: &Session, view: &Viewport) {
    let sky = s.level.background_color
        .map(|(r, g, b)| Color::Rgb { r, g, b })
        .unwrap_or(DEFAULT_SKY);
    scene.resize(view.cols, view.rows);
    scene.fill(Cell::new(' ', Color::White, sky));

    let draw = |scene: &mut FrameBuffer, bounds: &Rect, glyph: char, fg: Color, bg: Option<Color>| {
        if let Some((cols, rows)) = view.cells_of(bounds) {
            for row in rows {
                for col in cols.clone() {
                    let bg = bg.unwrap_or_else(|| scene.get(col, row).bg);
                    scene.set(col, row, Cell::new(glyph, fg, bg));
                }
            }
        }
    };

    for (i, layer) in DRAW_ORDER.iter().enumerate() {
        if i == LAYERS_BEHIND_PLAYER {
            draw(scene, &s.player.bounds(), '█', PLAYER_FG, None);
        }
        let (glyph, fg, bg) = layer_style(*layer);
        for sprite in s.level.layer(*layer) {
            draw(scene, &sprite.bounds, glyph.unwrap_or(sprite.glyph), fg, bg);
        }
    }

    // Score sits 10px in from the bottom-left of the screen, above everything.
    let score = format!("Score: {}", s.score);
    let col = (10.0 / view.cell_w) as usize;
    let row_from_bottom = (10.0 / view.cell_h) as usize;
    if row_from_bottom < view.rows {
        scene.overlay_str(col, view.rows - 1 - row_from_bottom, &score, SCORE_FG);
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const SCENE_ROW: usize = 1;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    scene: FrameBuffer,
    view: Viewport,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    key_release: bool,
}

impl Renderer {
    pub fn new(screen: &ScreenConfig) -> Self {
        let cols = (screen.width / screen.cell_px_w).round().max(1.0) as usize;
        let rows = (screen.height / screen.cell_px_h).round().max(1.0) as usize;
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            scene: FrameBuffer::new(cols, rows),
            view: Viewport {
                left: 0.0,
                bottom: 0.0,
                cell_w: screen.cell_px_w,
                cell_h: screen.cell_px_h,
                cols,
                rows,
            },
            term_w: 0,
            term_h: 0,
            last_phase: None,
            key_release: false,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        self.resize_to_terminal();
        log::info!(
            "terminal {}x{}, scene {}x{} cells",
            self.term_w, self.term_h, self.view.cols, self.view.rows
        );
        Ok(())
    }

    /// Ask the terminal to report key releases. True if it agreed.
    pub fn enable_key_release(&mut self) -> bool {
        if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
            log::info!("terminal has no key release events, using hold timeout");
            return false;
        }
        self.key_release = execute!(
            self.writer,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        ).is_ok();
        self.key_release
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Move the visible window. World pixels of the screen's bottom-left.
    pub fn set_viewport(&mut self, left: i32, bottom: i32) {
        self.view.left = left as f32;
        self.view.bottom = bottom as f32;
    }

    pub fn render(&mut self, session: &Session) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize_to_terminal();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(session.phase) {
            self.back.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase);
        }

        self.front.fill(Cell::BLANK);
        match session.phase {
            Phase::Playing => self.compose_game(session),
            Phase::GameComplete => self.compose_game_complete(session),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn resize_to_terminal(&mut self) {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.fill(Cell::INVALID);
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit colours, never ResetColor: the terminal default may
        // differ from BASE_BG.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

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

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &Session) {
        let w = self.front.width;

        // HUD
        let coins = if s.level.coins.is_empty() {
            "all coins".to_string()
        } else {
            format!("Coins left: {}", s.level.coins.len())
        };
        let hud = format!(
            " SUPER SMASHERS   Level {}: {}   Keys: {}   {}",
            s.level_index, s.level.name, s.player.keys_held, coins
        );
        let hud_bg = Color::Rgb { r: 40, g: 40, b: 70 };
        self.front.put_str(0, HUD_ROW, &format!("{:<w$}", hud, w = w), Color::White, hud_bg);
        if !s.message.is_empty() {
            let x = w.saturating_sub(s.message.chars().count() + 2);
            self.front.put_str(x, HUD_ROW, &s.message, Color::Rgb { r: 255, g: 220, b: 50 }, hud_bg);
        }

        // Scene, bottom-aligned when the terminal is too short for all of it
        compose_scene(&mut self.scene, s, &self.view);
        let avail = self.front.height.saturating_sub(SCENE_ROW + 1);
        let shown = self.scene.height.min(avail);
        let skip = self.scene.height - shown;
        for row in 0..shown {
            for col in 0..self.scene.width.min(w) {
                self.front.set(col, SCENE_ROW + row, self.scene.get(col, skip + row));
            }
        }

        // Footer
        let help = " ←→/AD run   ↑/W/Space jump   V skip level   Esc/Q quit";
        self.front.put_str(0, SCENE_ROW + shown, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn compose_game_complete(&mut self, s: &Session) {
        let gold = Color::Rgb { r: 255, g: 220, b: 50 };
        let green = Color::Rgb { r: 80, g: 255, b: 80 };
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★  ALL LEVELS CLEAR!  ★        ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, gold, Cell::BASE_BG);
        }
        let score = format!("Final Score: {}", s.score);
        let levels = format!("Levels cleared: {}", s.level_index);
        self.front.put_str(6, 9, &score, Color::White, Cell::BASE_BG);
        self.front.put_str(6, 10, &levels, green, Cell::BASE_BG);
        self.front.put_str(6, 12, "Esc / Q: Quit", Color::DarkGrey, Cell::BASE_BG);
    }
}
