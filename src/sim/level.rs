/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/level_<N>.toml` in the configured levels directory
///   2. Built-in embedded levels
///
/// A level index with neither source is `LevelError::NotFound`; a file that
/// exists but cannot be read or parsed is a hard error.
///
/// ## Level format (`level_<N>.toml`):
///   ```toml
///   name = "Green Hills"
///   tile_size = 64                      # optional, default 64
///   background_color = [120, 190, 235]  # optional
///
///   [layers]
///   Platforms = [ "......", "######" ]
///   Coins = [ "$....." ]
///   "Don't Touch" = [ "..^..." ]
///   ```
///
/// Each layer is a grid of rows, top to bottom. Grids are bottom-aligned:
/// the last row of every layer is world row 0, so short layers only need
/// the rows that hold something. Any character other than ' ' or '.'
/// places a tile; the character itself is the tile's glyph.
///
/// `Platforms` is required and fixes the map size. No other layer may be
/// taller than it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::entity::{Sprite, SpriteList};
use crate::domain::geom::Rect;
use crate::domain::tile::Layer;

const DEFAULT_TILE_SIZE: f32 = 64.0;

// ══════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum LevelError {
    NotFound(u32),
    Io(std::io::Error),
    Parse(toml::de::Error),
    Malformed(String),
}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::Io(e)
    }
}

impl From<toml::de::Error> for LevelError {
    fn from(e: toml::de::Error) -> Self {
        LevelError::Parse(e)
    }
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::NotFound(n) => write!(f, "level {} not found", n),
            LevelError::Io(e) => write!(f, "IO error: {}", e),
            LevelError::Parse(e) => write!(f, "Parse error: {}", e),
            LevelError::Malformed(e) => write!(f, "Malformed level: {}", e),
        }
    }
}

impl std::error::Error for LevelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LevelError::Io(e) => Some(e),
            LevelError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Level
// ══════════════════════════════════════════════════════════════

/// A loaded level: one sprite list per layer plus map extents.
/// Replaced wholesale on level advance, never reloaded in place.
#[derive(Clone, Debug)]
pub struct Level {
    pub index: u32,
    pub name: String,
    pub tile_size: f32,
    pub columns: usize,
    pub rows: usize,
    /// X coordinate the player's centre must reach to finish the level.
    pub end_of_map: f32,
    pub background_color: Option<(u8, u8, u8)>,

    pub walls: SpriteList,
    pub coins: SpriteList,
    pub foreground: SpriteList,
    pub background: SpriteList,
    pub hazards: SpriteList,
    pub keys: SpriteList,
    pub doors: SpriteList,
}

impl Level {
    pub fn layer(&self, layer: Layer) -> &SpriteList {
        match layer {
            Layer::Platforms => &self.walls,
            Layer::Coins => &self.coins,
            Layer::Foreground => &self.foreground,
            Layer::Background => &self.background,
            Layer::DontTouch => &self.hazards,
            Layer::Keys => &self.keys,
            Layer::Doors => &self.doors,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut SpriteList {
        match layer {
            Layer::Platforms => &mut self.walls,
            Layer::Coins => &mut self.coins,
            Layer::Foreground => &mut self.foreground,
            Layer::Background => &mut self.background,
            Layer::DontTouch => &mut self.hazards,
            Layer::Keys => &mut self.keys,
            Layer::Doors => &mut self.doors,
        }
    }

    pub fn width_px(&self) -> f32 {
        self.columns as f32 * self.tile_size
    }

    pub fn height_px(&self) -> f32 {
        self.rows as f32 * self.tile_size
    }

    fn empty(index: u32, name: String, tile_size: f32) -> Self {
        Level {
            index,
            name,
            tile_size,
            columns: 0,
            rows: 0,
            end_of_map: 0.0,
            background_color: None,
            walls: SpriteList::new(),
            coins: SpriteList::new(),
            foreground: SpriteList::new(),
            background: SpriteList::new(),
            hazards: SpriteList::new(),
            keys: SpriteList::new(),
            doors: SpriteList::new(),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Sources
// ══════════════════════════════════════════════════════════════

/// Anything that can hand out level `N`.
pub trait LevelSource {
    fn load(&self, index: u32) -> Result<Level, LevelError>;
}

/// Directory-backed level source with in-memory fallbacks.
pub struct LevelLibrary {
    dir: Option<PathBuf>,
    builtin: BTreeMap<u32, String>,
}

impl LevelLibrary {
    /// Levels from `dir` (if it exists), falling back to the embedded set.
    pub fn new(dir: &Path) -> Self {
        let builtin = embedded_levels()
            .into_iter()
            .map(|(n, text)| (n, text.to_string()))
            .collect();
        LevelLibrary {
            dir: if dir.is_dir() { Some(dir.to_path_buf()) } else { None },
            builtin,
        }
    }

    /// Levels held entirely in memory: `docs[0]` is level 1.
    #[cfg(test)]
    pub fn in_memory(docs: &[&str]) -> Self {
        LevelLibrary {
            dir: None,
            builtin: docs.iter()
                .enumerate()
                .map(|(i, text)| (i as u32 + 1, text.to_string()))
                .collect(),
        }
    }

    pub fn level_path(dir: &Path, index: u32) -> PathBuf {
        dir.join(format!("level_{}.toml", index))
    }

    /// Where levels are read from, for the startup log line.
    pub fn describe(&self) -> String {
        match &self.dir {
            Some(d) => format!("{} (+{} built-in)", d.display(), self.builtin.len()),
            None => format!("{} built-in", self.builtin.len()),
        }
    }
}

impl LevelSource for LevelLibrary {
    fn load(&self, index: u32) -> Result<Level, LevelError> {
        if let Some(dir) = &self.dir {
            let path = LevelLibrary::level_path(dir, index);
            if path.is_file() {
                log::debug!("loading level {} from {}", index, path.display());
                let text = std::fs::read_to_string(&path)?;
                return parse_level(&text, index);
            }
        }
        match self.builtin.get(&index) {
            Some(text) => {
                log::debug!("loading built-in level {}", index);
                parse_level(text, index)
            }
            None => Err(LevelError::NotFound(index)),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct LevelFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default)]
    background_color: Option<[u8; 3]>,
    #[serde(default)]
    layers: BTreeMap<String, Vec<String>>,
}

fn default_tile_size() -> f32 { DEFAULT_TILE_SIZE }

/// Parse a level document. `index` is only used for naming and errors.
pub fn parse_level(text: &str, index: u32) -> Result<Level, LevelError> {
    let file: LevelFile = toml::from_str(text)?;

    if !file.tile_size.is_finite() || file.tile_size <= 0.0 {
        return Err(LevelError::Malformed(format!(
            "level {}: tile_size must be positive, got {}", index, file.tile_size
        )));
    }

    let platforms = file.layers.get(Layer::Platforms.name())
        .filter(|rows| !rows.is_empty())
        .ok_or_else(|| LevelError::Malformed(format!(
            "level {}: missing '{}' layer", index, Layer::Platforms.name()
        )))?;

    let rows = platforms.len();
    let columns = platforms.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    if columns == 0 {
        return Err(LevelError::Malformed(format!(
            "level {}: '{}' layer has no columns", index, Layer::Platforms.name()
        )));
    }

    let name = file.name.unwrap_or_else(|| format!("Level {}", index));
    let mut level = Level::empty(index, name, file.tile_size);
    level.rows = rows;
    level.columns = columns;
    level.end_of_map = (columns as f32 - 1.0) * file.tile_size;
    level.background_color = file.background_color.map(|[r, g, b]| (r, g, b));

    for (layer_name, grid) in &file.layers {
        let layer = match Layer::from_name(layer_name) {
            Some(l) => l,
            None => {
                log::warn!("level {}: ignoring unknown layer '{}'", index, layer_name);
                continue;
            }
        };
        if grid.len() > rows {
            return Err(LevelError::Malformed(format!(
                "level {}: layer '{}' has {} rows, map has {}",
                index, layer_name, grid.len(), rows
            )));
        }
        *level.layer_mut(layer) = sprites_from_grid(grid, file.tile_size);
    }

    Ok(level)
}

/// Turn a bottom-aligned grid into sprites, bottom-left origin.
fn sprites_from_grid(grid: &[String], tile_size: f32) -> SpriteList {
    let height = grid.len();
    let mut list = SpriteList::new();
    for (r, row) in grid.iter().enumerate() {
        let world_row = (height - 1 - r) as f32;
        for (c, ch) in row.chars().enumerate() {
            if ch == ' ' || ch == '.' {
                continue;
            }
            let bounds = Rect::new(c as f32 * tile_size, world_row * tile_size, tile_size, tile_size);
            list.push(Sprite::new(bounds, ch));
        }
    }
    list
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<(u32, &'static str)> {
    vec![
        (1, include_str!("../../levels/level_1.toml")),
        (2, include_str!("../../levels/level_2.toml")),
    ]
}
