/// Keyboard state tracker and key bindings.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous run while an arrow is held
///   - Edge-triggered jump and level skip (initial press only)
///
/// Terminals rarely report key releases, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat for it. When keyboard
/// enhancement is active, explicit Release events are honoured instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::FrameInput;
use super::gamepad::GamepadState;

/// After this long without a Press/Repeat, the key is considered released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_JUMP: &[KeyCode] = &[
    KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' '),
];
pub const KEYS_SKIP: &[KeyCode] = &[KeyCode::Char('v'), KeyCode::Char('V')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events from the last drain, for Ctrl-C.
    raw_events: Vec<KeyEvent>,

    /// Only true once keyboard enhancement is confirmed.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        self.expire(Instant::now());
    }

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        let now = Instant::now();
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    /// Edge trigger: was any of these keys freshly pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    /// Esc, Q, Ctrl-C or the gamepad quit button.
    pub fn quit_requested(&self, gp: &GamepadState) -> bool {
        self.ctrl_c_pressed() || self.any_pressed(KEYS_QUIT) || gp.quit_pressed()
    }

    /// Combine keyboard and gamepad into one tick's input.
    ///
    /// Movement is level-triggered: a key pressed and released between two
    /// ticks still counts for the next one.
    pub fn frame_input(&self, gp: &GamepadState) -> FrameInput {
        FrameInput {
            left: self.any_held(KEYS_LEFT) || self.any_pressed(KEYS_LEFT) || gp.left_held(),
            right: self.any_held(KEYS_RIGHT) || self.any_pressed(KEYS_RIGHT) || gp.right_held(),
            jump: self.any_pressed(KEYS_JUMP) || gp.jump_pressed(),
            skip_level: self.any_pressed(KEYS_SKIP) || gp.skip_level_pressed(),
        }
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active.get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }
}
