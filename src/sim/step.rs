/// The step function: advances the session by one tick.
///
/// Processing order:
///   1. Debug level skip
///   2. Jump request (only when grounded)
///   3. Horizontal velocity from held keys
///   4. Physics integration (gravity + walls)
///   5. Coins → hazards → keys → doors → fall-off-map
///   6. Map edge → next level
///   7. Camera scroll, viewport event on change
///
/// Overlap queries go through the `Physics` trait, never the level lists
/// directly, so a test double can stand in for the whole engine.

use crate::domain::controller;
use crate::domain::entity::FrameInput;
use crate::domain::physics::Physics;
use super::event::{DeathCause, GameEvent};
use super::level::{LevelError, LevelSource};
use super::world::{Phase, Session};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(
    world: &mut Session,
    input: FrameInput,
    physics: &mut dyn Physics,
    levels: &dyn LevelSource,
) -> Result<Vec<GameEvent>, LevelError> {
    if world.phase != Phase::Playing { return Ok(vec![]); }

    let mut events: Vec<GameEvent> = Vec::new();
    let view_before = world.camera.offset();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    if input.skip_level {
        log::debug!("level {} skipped", world.level_index);
        complete_level(world, levels, &mut events)?;
    }

    if world.phase == Phase::Playing {
        resolve_jump(world, input.jump, physics, &mut events);
        resolve_movement(world, input);
        physics.integrate(&mut world.player, &world.level.walls);
        resolve_coins(world, physics, &mut events);
        resolve_hazards(world, physics, &mut events);
        resolve_keys(world, physics, &mut events);
        resolve_doors(world, physics, &mut events);
        resolve_fall(world, &mut events);
        resolve_map_edge(world, levels, &mut events)?;
    }

    if world.phase == Phase::Playing {
        let bounds = world.player.bounds();
        world.camera.scroll(&bounds);
    }

    let (left, bottom) = world.camera.offset();
    if (left, bottom) != view_before {
        events.push(GameEvent::ViewportChanged { left, bottom });
    }

    Ok(events)
}

// ══════════════════════════════════════════════════════════════
// Controller
// ══════════════════════════════════════════════════════════════

fn resolve_jump(world: &mut Session, jump: bool, physics: &dyn Physics, events: &mut Vec<GameEvent>) {
    if !jump { return; }
    let grounded = physics.can_jump(&world.player, &world.level.walls);
    if controller::try_jump(&mut world.player, grounded, world.physics.jump_speed) {
        events.push(GameEvent::Jumped);
    }
}

fn resolve_movement(world: &mut Session, input: FrameInput) {
    world.player.vx = controller::horizontal_velocity(
        world.player.vx,
        input.left,
        input.right,
        world.physics.max_speed,
    );
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

fn resolve_coins(world: &mut Session, physics: &dyn Physics, events: &mut Vec<GameEvent>) {
    let hits = physics.overlapping(&world.player.bounds(), &world.level.coins);
    let taken = world.level.coins.remove_all(&hits);
    for _ in 0..taken {
        world.score += 1;
        events.push(GameEvent::CoinCollected);
    }
}

fn resolve_hazards(world: &mut Session, physics: &dyn Physics, events: &mut Vec<GameEvent>) {
    let hits = physics.overlapping(&world.player.bounds(), &world.level.hazards);
    if !hits.is_empty() {
        player_die(world, DeathCause::Hazard, events);
    }
}

fn resolve_keys(world: &mut Session, physics: &dyn Physics, events: &mut Vec<GameEvent>) {
    let hits = physics.overlapping(&world.player.bounds(), &world.level.keys);
    let taken = world.level.keys.remove_all(&hits);
    for _ in 0..taken {
        world.player.keys_held += 1;
        events.push(GameEvent::KeyCollected);
    }
}

/// A door opens only for a held key; a locked door is just left alone.
/// Physics decides whether it blocks.
fn resolve_doors(world: &mut Session, physics: &dyn Physics, events: &mut Vec<GameEvent>) {
    let hits = physics.overlapping(&world.player.bounds(), &world.level.doors);
    let mut opened = Vec::new();
    for i in hits {
        if world.player.keys_held == 0 { break; }
        world.player.keys_held -= 1;
        opened.push(i);
        events.push(GameEvent::DoorUnlocked);
    }
    world.level.doors.remove_all(&opened);
}

fn resolve_fall(world: &mut Session, events: &mut Vec<GameEvent>) {
    if world.player.y < world.spawn.fall_threshold {
        player_die(world, DeathCause::Fell, events);
    }
}

fn player_die(world: &mut Session, cause: DeathCause, events: &mut Vec<GameEvent>) {
    log::debug!("player died ({:?}) at ({}, {})", cause, world.player.x, world.player.y);
    world.respawn();
    events.push(GameEvent::PlayerDied { cause });
}

// ══════════════════════════════════════════════════════════════
// Level progression
// ══════════════════════════════════════════════════════════════

fn resolve_map_edge(
    world: &mut Session,
    levels: &dyn LevelSource,
    events: &mut Vec<GameEvent>,
) -> Result<(), LevelError> {
    if world.player.x >= world.level.end_of_map {
        complete_level(world, levels, events)?;
    }
    Ok(())
}

/// Load level `level_index + 1` and move the player into it.
///
/// Running out of levels ends the game; any other load failure is fatal
/// and handed back to the caller untouched.
pub fn complete_level(
    world: &mut Session,
    levels: &dyn LevelSource,
    events: &mut Vec<GameEvent>,
) -> Result<(), LevelError> {
    let next = world.level_index + 1;
    match levels.load(next) {
        Ok(level) => {
            log::info!(
                "level {} complete (score {}), entering level {}: {}",
                world.level_index, world.score, next, level.name
            );
            world.enter_level(level);
            events.push(GameEvent::LevelCompleted { level: next });
            Ok(())
        }
        Err(LevelError::NotFound(_)) => {
            log::info!("no level {}, game complete with score {}", next, world.score);
            world.phase = Phase::GameComplete;
            world.set_message("ALL LEVELS CLEAR!", 0);
            events.push(GameEvent::GameCompleted);
            Ok(())
        }
        Err(e) => {
            log::error!("failed to load level {}: {}", next, e);
            Err(e)
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Player, SpriteList};
    use crate::domain::physics::PlatformerPhysics;
    use crate::sim::level::{parse_level, LevelLibrary};

    /// Kinematic stand-in: moves by velocity, no gravity, no walls.
    struct FakePhysics {
        grounded: bool,
        integrations: u32,
    }

    impl FakePhysics {
        fn new() -> Self {
            FakePhysics { grounded: true, integrations: 0 }
        }
    }

    impl Physics for FakePhysics {
        fn integrate(&mut self, player: &mut Player, _solids: &SpriteList) {
            self.integrations += 1;
            player.x += player.vx;
            player.y += player.vy;
        }

        fn can_jump(&self, _player: &Player, _solids: &SpriteList) -> bool {
            self.grounded
        }
    }

    // Columns: key at 2, hazard at 3 (row 2), coins at 4 and 5, door at 7.
    // end_of_map = 9 × 64 = 576.
    const ROOM: &str = r###########"
name = "Room"
[layers]
Platforms = [
    "..........",
    "..........",
    "##########",
]
Coins = [
    "....$$....",
    "..........",
]
Keys = [
    "..k.......",
    "..........",
]
Doors = [
    ".......D..",
    "..........",
]
"Don't Touch" = [
    "...^......",
    "..........",
    "..........",
]
"###########;

    const NEXT: &str = r#################"
name = "Next"
[layers]
Platforms = ["################"]
Coins = ["..$............."]
"#################;

    fn session() -> Session {
        Session::new(parse_level(ROOM, 1).unwrap(), &GameConfig::default())
    }

    fn library() -> LevelLibrary {
        LevelLibrary::in_memory(&[ROOM, NEXT])
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn tick(s: &mut Session, input: FrameInput) -> Vec<GameEvent> {
        step(s, input, &mut FakePhysics::new(), &library()).unwrap()
    }

    fn count(events: &[GameEvent], wanted: &GameEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    // ── Controller ──

    #[test]
    fn idle_velocity_decays_over_ten_ticks() {
        let mut s = session();
        s.player.y = 400.0; // clear of every pickup
        s.player.vx = 5.0;
        for _ in 0..10 {
            tick(&mut s, idle());
        }
        assert_eq!(s.player.vx, 0.0);
    }

    #[test]
    fn jump_needs_ground() {
        let libs = library();
        let mut s = session();
        let mut physics = FakePhysics::new();
        physics.grounded = false;
        let input = FrameInput { jump: true, ..idle() };

        let events = step(&mut s, input, &mut physics, &libs).unwrap();
        assert!(!events.contains(&GameEvent::Jumped));
        assert_eq!(s.player.vy, 0.0);

        physics.grounded = true;
        let events = step(&mut s, input, &mut physics, &libs).unwrap();
        assert!(events.contains(&GameEvent::Jumped));
        // Kinematic fake: one tick of upward motion at the jump speed.
        assert_eq!(s.player.vy, 25.0);
        assert_eq!(s.player.y, 94.0 + 25.0);
    }

    #[test]
    fn physics_runs_once_per_tick() {
        let libs = library();
        let mut s = session();
        let mut physics = FakePhysics::new();
        for _ in 0..3 {
            step(&mut s, idle(), &mut physics, &libs).unwrap();
        }
        assert_eq!(physics.integrations, 3);
        assert_eq!(s.tick, 3);
    }

    // ── Collisions ──

    #[test]
    fn every_overlapping_coin_is_collected() {
        let mut s = session();
        s.player.x = 320.0; // straddles columns 4 and 5
        let events = tick(&mut s, idle());
        assert_eq!(count(&events, &GameEvent::CoinCollected), 2);
        assert_eq!(s.score, 2);
        assert!(s.level.coins.is_empty());

        // Gone for good.
        let events = tick(&mut s, idle());
        assert_eq!(count(&events, &GameEvent::CoinCollected), 0);
        assert_eq!(s.score, 2);
    }

    #[test]
    fn key_goes_into_inventory() {
        let mut s = session();
        s.player.x = 160.0;
        let events = tick(&mut s, idle());
        assert_eq!(events, vec![GameEvent::KeyCollected]);
        assert_eq!(s.player.keys_held, 1);
        assert!(s.level.keys.is_empty());
    }

    #[test]
    fn locked_door_stays_without_key() {
        let mut s = session();
        s.player.x = 480.0;
        let events = tick(&mut s, idle());
        assert!(events.is_empty());
        assert_eq!(s.level.doors.len(), 1);
        assert_eq!(s.player.keys_held, 0);
    }

    #[test]
    fn door_consumes_one_key() {
        let mut s = session();
        s.player.x = 480.0;
        s.player.keys_held = 1;
        let events = tick(&mut s, idle());
        assert_eq!(events, vec![GameEvent::DoorUnlocked]);
        assert!(s.level.doors.is_empty());
        assert_eq!(s.player.keys_held, 0);
    }

    #[test]
    fn one_key_opens_only_one_of_two_doors() {
        let doc = r#####"
[layers]
Platforms = ["....", "####"]
Doors = ["DD..", "...."]
"#####;
        let mut s = Session::new(parse_level(doc, 1).unwrap(), &GameConfig::default());
        s.player.keys_held = 1;
        let events = tick(&mut s, idle());
        assert_eq!(count(&events, &GameEvent::DoorUnlocked), 1);
        assert_eq!(s.level.doors.len(), 1);
        assert_eq!(s.player.keys_held, 0);
    }

    #[test]
    fn hazard_respawns_and_keeps_score() {
        let mut s = session();
        s.score = 4;
        s.player.keys_held = 1;
        s.player.x = 224.0;
        s.player.y = 160.0;
        let events = tick(&mut s, idle());
        assert!(events.contains(&GameEvent::PlayerDied { cause: DeathCause::Hazard }));
        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!(s.score, 4);
        assert_eq!(s.player.keys_held, 1);
        assert_eq!(s.level_index, 1);
    }

    #[test]
    fn falling_off_the_map_respawns_with_camera_at_origin() {
        let mut s = session();
        s.player.y = -101.0;
        s.camera.view_left = 300.0;
        let events = tick(&mut s, idle());
        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!(s.camera.offset(), (0, 0));
        assert_eq!(events, vec![
            GameEvent::PlayerDied { cause: DeathCause::Fell },
            GameEvent::ViewportChanged { left: 0, bottom: 0 },
        ]);
    }

    #[test]
    fn exactly_at_threshold_is_not_a_fall() {
        let mut s = session();
        s.player.y = -100.0;
        let events = tick(&mut s, idle());
        assert!(events.is_empty());
        assert_eq!(s.player.y, -100.0);
    }

    // ── Level progression ──

    #[test]
    fn reaching_map_end_loads_next_level() {
        let mut s = session();
        s.score = 5;
        s.player.keys_held = 2;
        s.player.x = 576.0;
        let events = tick(&mut s, idle());
        assert!(events.contains(&GameEvent::LevelCompleted { level: 2 }));
        assert_eq!(s.level_index, 2);
        assert_eq!(s.level.name, "Next");
        assert_eq!(s.score, 0);
        assert_eq!(s.player.keys_held, 0);
        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!((s.player.vx, s.player.vy), (0.0, 0.0));
    }

    #[test]
    fn skip_input_advances_immediately() {
        let mut s = session();
        let events = tick(&mut s, FrameInput { skip_level: true, ..idle() });
        assert_eq!(events[0], GameEvent::LevelCompleted { level: 2 });
        assert_eq!(s.level_index, 2);
    }

    #[test]
    fn past_last_level_is_game_complete() {
        let mut s = session();
        tick(&mut s, FrameInput { skip_level: true, ..idle() });
        s.score = 3;
        let events = tick(&mut s, FrameInput { skip_level: true, ..idle() });
        assert_eq!(events, vec![GameEvent::GameCompleted]);
        assert_eq!(s.phase, Phase::GameComplete);
        assert_eq!(s.level_index, 2);
        assert_eq!(s.score, 3);

        // Terminal: nothing moves any more.
        s.player.vx = 10.0;
        let x = s.player.x;
        assert!(tick(&mut s, FrameInput { right: true, ..idle() }).is_empty());
        assert_eq!(s.player.x, x);
    }

    #[test]
    fn broken_next_level_is_an_error() {
        let libs = LevelLibrary::in_memory(&[ROOM, "[layers]\nCoins = [\"$\"]\n"]);
        let mut s = session();
        s.player.x = 576.0;
        match step(&mut s, idle(), &mut FakePhysics::new(), &libs) {
            Err(LevelError::Malformed(_)) => {}
            other => panic!("expected Malformed, got {:?}", other),
        }
        assert_eq!(s.level_index, 1);
    }

    // ── Camera ──

    #[test]
    fn no_viewport_event_inside_margins() {
        let mut s = session();
        s.player.x = 700.0;
        s.player.y = 500.0;
        s.camera.view_left = 100.0;
        s.camera.view_bottom = 40.0;
        s.level.end_of_map = 10_000.0;
        let events = tick(&mut s, idle());
        assert!(events.is_empty());
        assert_eq!(s.camera.offset(), (100, 40));
    }

    #[test]
    fn viewport_event_carries_new_offset() {
        let mut s = session();
        s.level.end_of_map = 10_000.0;
        s.player.x = 880.0;
        s.player.y = 400.0;
        let events = tick(&mut s, idle());
        assert_eq!(events, vec![GameEvent::ViewportChanged { left: 46, bottom: 0 }]);
    }

    // ── Whole-game runs with the real engine ──

    fn builtin() -> (Session, LevelLibrary) {
        let libs = LevelLibrary::new(std::path::Path::new("/nonexistent-levels-dir"));
        let s = Session::start(&libs, &GameConfig::default()).unwrap();
        (s, libs)
    }

    #[test]
    fn walking_right_collects_the_first_coins() {
        let (mut s, libs) = builtin();
        let mut engine = PlatformerPhysics::new(1.0, 5.0);
        let right = FrameInput { right: true, ..idle() };
        for _ in 0..60 {
            step(&mut s, right, &mut engine, &libs).unwrap();
        }
        assert_eq!(s.player.x, 64.0 + 555.0);
        assert_eq!(s.player.y, 94.0);
        assert_eq!(s.score, 3);
    }

    #[test]
    fn walking_into_the_first_pit_respawns() {
        let (mut s, libs) = builtin();
        let mut engine = PlatformerPhysics::new(1.0, 5.0);
        let right = FrameInput { right: true, ..idle() };
        let mut fell = false;
        for _ in 0..200 {
            let events = step(&mut s, right, &mut engine, &libs).unwrap();
            if events.contains(&GameEvent::PlayerDied { cause: DeathCause::Fell }) {
                fell = true;
                break;
            }
        }
        assert!(fell);
        assert_eq!((s.player.x, s.player.y), (64.0, 94.0));
        assert_eq!(s.score, 3);
    }

    // ── Properties over arbitrary input sequences ──

    mod props {
        use super::*;
        use crate::domain::physics::overlapping;
        use proptest::prelude::*;

        /// Bits 0/1 hold left/right, bits 2+3 together press jump,
        /// and 31 presses skip-level.
        fn decode(bits: u8) -> FrameInput {
            FrameInput {
                left: (bits & 1) != 0,
                right: (bits & 2) != 0,
                jump: (bits & 12) == 12,
                skip_level: bits == 31,
            }
        }

        proptest! {
            #[test]
            fn invariants_hold_for_any_input(
                inputs in proptest::collection::vec(0u8..32, 1..2000)
            ) {
                let (mut s, libs) = builtin();
                let mut engine = PlatformerPhysics::new(1.0, 5.0);

                for &bits in &inputs {
                    let level_before = s.level_index;
                    let score_before = s.score;
                    let keys_before = s.player.keys_held;
                    let doors_before = s.level.doors.len();

                    let events = step(&mut s, decode(bits), &mut engine, &libs).unwrap();

                    prop_assert!(s.player.vx.abs() <= 10.0, "vx = {}", s.player.vx);
                    if s.phase != Phase::Playing {
                        break;
                    }
                    prop_assert!(
                        overlapping(&s.player.bounds(), &s.level.walls).is_empty(),
                        "player inside a wall at ({}, {})", s.player.x, s.player.y
                    );
                    if s.level_index == level_before {
                        prop_assert!(s.score >= score_before);
                        let got = count(&events, &GameEvent::KeyCollected);
                        let used = count(&events, &GameEvent::DoorUnlocked);
                        prop_assert_eq!(
                            s.player.keys_held as usize + used,
                            keys_before as usize + got
                        );
                        prop_assert_eq!(s.level.doors.len() + used, doors_before);
                    } else {
                        prop_assert!(
                            s.score as usize <= count(&events, &GameEvent::CoinCollected)
                        );
                    }
                }
            }
        }
    }
}
