/// Session: the complete state of a running game.
///
/// One player, one loaded level, score, camera, level index and phase.
/// Everything the step function mutates lives here; nothing is global.
///
/// ## Lifetime
///
///   - `start` loads level 1 (fatal if missing).
///   - `respawn` puts the player back at the start, same level.
///   - `enter_level` replaces the level wholesale and resets per-level state.

use crate::config::{GameConfig, PhysicsConfig, PlayerConfig};
use crate::domain::entity::Player;
use crate::sim::camera::Camera;
use crate::sim::level::{Level, LevelError, LevelSource};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    /// No level after the last one. Terminal: `step` does nothing.
    GameComplete,
}

pub struct Session {
    // ── Entities ──
    pub player: Player,
    pub level: Level,

    // ── Game tracking ──
    pub score: u32,
    pub level_index: u32,
    pub phase: Phase,
    pub tick: u64,

    // ── Camera / Viewport ──
    pub camera: Camera,

    // ── Tuning ──
    pub physics: PhysicsConfig,
    pub spawn: PlayerConfig,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,
}

impl Session {
    /// Build a session around an already loaded level.
    pub fn new(level: Level, config: &GameConfig) -> Self {
        let spawn = config.player.clone();
        let index = level.index;
        Session {
            player: Player::new(spawn.start_x, spawn.start_y, spawn.width, spawn.height),
            level,
            score: 0,
            level_index: index,
            phase: Phase::Playing,
            tick: 0,
            camera: Camera::new(&config.screen),
            physics: config.physics.clone(),
            spawn,
            message: String::new(),
            message_timer: 0,
        }
    }

    /// Load level 1 and start playing.
    pub fn start(levels: &dyn LevelSource, config: &GameConfig) -> Result<Self, LevelError> {
        let level = levels.load(1)?;
        log::info!(
            "starting at level 1: {} ({}x{} px)",
            level.name, level.width_px(), level.height_px()
        );
        let mut session = Session::new(level, config);
        let name = session.level.name.clone();
        session.set_message(&name, 120);
        Ok(session)
    }

    /// Back to the level start. Score, keys, velocity and level stay.
    pub fn respawn(&mut self) {
        self.player.x = self.spawn.start_x;
        self.player.y = self.spawn.start_y;
        self.camera.reset();
    }

    /// Swap in the next level and reset everything that is per-level.
    pub fn enter_level(&mut self, level: Level) {
        self.level_index = level.index;
        self.level = level;
        self.score = 0;
        self.camera.reset();
        self.player = Player::new(
            self.spawn.start_x,
            self.spawn.start_y,
            self.spawn.width,
            self.spawn.height,
        );
        let name = self.level.name.clone();
        self.set_message(&name, 120);
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{parse_level, LevelLibrary};

    const FLAT: &str = r#########"
name = "Flat"
[layers]
Platforms = ["########"]
"#########;

    fn level(index: u32) -> Level {
        parse_level(FLAT, index).unwrap()
    }

    #[test]
    fn new_session_starts_at_spawn() {
        let s = Session::new(level(1), &GameConfig::default());
        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!((s.player.width, s.player.height), (40.0, 60.0));
        assert_eq!(s.level_index, 1);
        assert_eq!(s.score, 0);
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn start_requires_level_one() {
        let empty = LevelLibrary::in_memory(&[]);
        match Session::start(&empty, &GameConfig::default()) {
            Err(LevelError::NotFound(1)) => {}
            other => panic!("expected NotFound(1), got {:?}", other.map(|s| s.level_index)),
        }

        let one = LevelLibrary::in_memory(&[FLAT]);
        let s = Session::start(&one, &GameConfig::default()).unwrap();
        assert_eq!(s.level.name, "Flat");
        assert_eq!(s.message, "Flat");
    }

    #[test]
    fn respawn_keeps_progress() {
        let mut s = Session::new(level(1), &GameConfig::default());
        s.score = 7;
        s.player.keys_held = 2;
        s.player.x = 900.0;
        s.player.y = -150.0;
        s.player.vx = 6.0;
        s.camera.view_left = 500.0;

        s.respawn();

        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!(s.camera.offset(), (0, 0));
        assert_eq!(s.score, 7);
        assert_eq!(s.player.keys_held, 2);
        assert_eq!(s.player.vx, 6.0);
    }

    #[test]
    fn enter_level_resets_per_level_state() {
        let mut s = Session::new(level(1), &GameConfig::default());
        s.score = 7;
        s.player.keys_held = 2;
        s.player.x = 500.0;
        s.player.vx = 10.0;
        s.player.vy = -3.0;
        s.camera.view_left = 200.0;

        s.enter_level(level(2));

        assert_eq!(s.level_index, 2);
        assert_eq!(s.score, 0);
        assert_eq!(s.player, Player::new(64.0, 94.0, 40.0, 60.0));
        assert_eq!(s.camera.offset(), (0, 0));
    }
}
