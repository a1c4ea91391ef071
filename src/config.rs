/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to the built-in tuning below if the file is missing
/// or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub screen: ScreenConfig,
    pub player: PlayerConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug)]
pub struct PhysicsConfig {
    pub tick_rate_ms: u64,
    pub max_speed: f32,    // px per tick, horizontal
    pub jump_speed: f32,   // px per tick, initial upward velocity
    pub gravity: f32,      // px per tick², subtracted from vy every tick
    pub jump_probe: f32,   // how far below the feet a platform still counts as ground
}

/// Screen geometry in world pixels. Margins are fractions of the screen size.
#[derive(Clone, Debug)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
    pub left_margin: f32,
    pub right_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    /// World pixels covered by one terminal cell.
    pub cell_px_w: f32,
    pub cell_px_h: f32,
}

#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub start_x: f32,
    pub start_y: f32,
    pub width: f32,
    pub height: f32,
    pub fall_threshold: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub skip_level: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    screen: TomlScreen,
    #[serde(default)]
    player: TomlPlayer,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_max_speed")]
    max_speed: f32,
    #[serde(default = "default_jump_speed")]
    jump_speed: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_jump_probe")]
    jump_probe: f32,
}

#[derive(Deserialize, Debug)]
struct TomlScreen {
    #[serde(default = "default_screen_width")]
    width: f32,
    #[serde(default = "default_screen_height")]
    height: f32,
    #[serde(default = "default_horizontal_margin")]
    left_margin: f32,
    #[serde(default = "default_horizontal_margin")]
    right_margin: f32,
    #[serde(default = "default_vertical_margin")]
    top_margin: f32,
    #[serde(default = "default_vertical_margin")]
    bottom_margin: f32,
    #[serde(default = "default_cell_px_w")]
    cell_px_w: f32,
    #[serde(default = "default_cell_px_h")]
    cell_px_h: f32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayer {
    #[serde(default = "default_start_x")]
    start_x: f32,
    #[serde(default = "default_start_y")]
    start_y: f32,
    #[serde(default = "default_player_width")]
    width: f32,
    #[serde(default = "default_player_height")]
    height: f32,
    #[serde(default = "default_fall_threshold")]
    fall_threshold: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump_buttons")]
    jump: Vec<String>,
    #[serde(default = "default_skip_buttons")]
    skip_level: Vec<String>,
    #[serde(default = "default_quit_buttons")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_log_file")]
    log_file: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }     // ~60 ticks per second
fn default_max_speed() -> f32 { 10.0 }
fn default_jump_speed() -> f32 { 25.0 }
fn default_gravity() -> f32 { 1.0 }
fn default_jump_probe() -> f32 { 5.0 }

fn default_screen_width() -> f32 { 1280.0 }
fn default_screen_height() -> f32 { 1024.0 }
fn default_horizontal_margin() -> f32 { 1.0 / 3.0 }
fn default_vertical_margin() -> f32 { 1.0 / 4.0 }
fn default_cell_px_w() -> f32 { 16.0 }   // 80 columns across the screen
fn default_cell_px_h() -> f32 { 32.0 }   // 32 rows down the screen

fn default_start_x() -> f32 { 64.0 }
fn default_start_y() -> f32 { 94.0 }
fn default_player_width() -> f32 { 40.0 }
fn default_player_height() -> f32 { 60.0 }
fn default_fall_threshold() -> f32 { -100.0 }

fn default_jump_buttons() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_skip_buttons() -> Vec<String> { vec!["R2".into()] }
fn default_quit_buttons() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_log_file() -> String { "smashers.log".into() }

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tick_rate_ms: default_tick_rate(),
            max_speed: default_max_speed(),
            jump_speed: default_jump_speed(),
            gravity: default_gravity(),
            jump_probe: default_jump_probe(),
        }
    }
}

impl Default for TomlScreen {
    fn default() -> Self {
        TomlScreen {
            width: default_screen_width(),
            height: default_screen_height(),
            left_margin: default_horizontal_margin(),
            right_margin: default_horizontal_margin(),
            top_margin: default_vertical_margin(),
            bottom_margin: default_vertical_margin(),
            cell_px_w: default_cell_px_w(),
            cell_px_h: default_cell_px_h(),
        }
    }
}

impl Default for TomlPlayer {
    fn default() -> Self {
        TomlPlayer {
            start_x: default_start_x(),
            start_y: default_start_y(),
            width: default_player_width(),
            height: default_player_height(),
            fall_threshold: default_fall_threshold(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump_buttons(),
            skip_level: default_skip_buttons(),
            quit: default_quit_buttons(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            log_file: default_log_file(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse a config document directly. Unknown keys are ignored.
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(GameConfig::from_toml(toml_cfg, &[]))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_dir(&cfg.general.levels_dir, search_dirs);

        GameConfig {
            physics: PhysicsConfig {
                tick_rate_ms: cfg.physics.tick_rate_ms.max(1),
                max_speed: cfg.physics.max_speed.abs(),
                jump_speed: cfg.physics.jump_speed,
                gravity: cfg.physics.gravity,
                jump_probe: cfg.physics.jump_probe.max(0.0),
            },
            screen: ScreenConfig {
                width: cfg.screen.width,
                height: cfg.screen.height,
                left_margin: cfg.screen.left_margin,
                right_margin: cfg.screen.right_margin,
                top_margin: cfg.screen.top_margin,
                bottom_margin: cfg.screen.bottom_margin,
                cell_px_w: cfg.screen.cell_px_w.max(1.0),
                cell_px_h: cfg.screen.cell_px_h.max(1.0),
            },
            player: PlayerConfig {
                start_x: cfg.player.start_x,
                start_y: cfg.player.start_y,
                width: cfg.player.width,
                height: cfg.player.height,
                fall_threshold: cfg.player.fall_threshold,
            },
            gamepad: GamepadConfig {
                jump: cfg.gamepad.jump,
                skip_level: cfg.gamepad.skip_level,
                quit: cfg.gamepad.quit,
            },
            levels_dir,
            log_file: PathBuf::from(cfg.general.log_file),
        }
    }
}

/// Relative paths are looked up in each search dir; the first existing
/// directory wins, otherwise the path stays relative to the CWD.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs.iter()
        .map(|d| d.join(path))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before the logger exists, so problems go straight to stderr
/// (the terminal is still in cooked mode at this point).
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
