/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use env_logger::{Env, Target};

use config::GameConfig;
use domain::entity::FrameInput;
use domain::physics::{Physics, PlatformerPhysics};
use sim::event::GameEvent;
use sim::level::{LevelLibrary, LevelSource};
use sim::step;
use sim::world::{Phase, Session};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let levels = LevelLibrary::new(&config.levels_dir);
    log::info!("levels: {}", levels.describe());

    let mut session = match Session::start(&levels, &config) {
        Ok(s) => s,
        Err(e) => {
            log::error!("cannot start: {}", e);
            eprintln!("Cannot start Super Smashers: {e}");
            std::process::exit(1);
        }
    };

    let mut physics = PlatformerPhysics::new(config.physics.gravity, config.physics.jump_probe);
    let mut renderer = Renderer::new(&config.screen);

    let result = match renderer.init() {
        Ok(()) => {
            let sound = SoundEngine::new();
            game_loop(&mut session, &mut renderer, &mut physics, &levels, sound.as_ref(), &config)
        }
        Err(e) => Err(format!("terminal init failed: {e}").into()),
    };

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    println!();
    if session.phase == Phase::GameComplete {
        println!("All levels clear!");
    }
    println!("Thanks for playing Super Smashers!");
    println!("Level {}, Score: {}", session.level_index, session.score);

    if let Err(e) = &result {
        log::error!("game error: {}", e);
        eprintln!("Game error: {e}");
    } else {
        log::info!("exit at level {} with score {}", session.level_index, session.score);
    }
    std::process::exit(exit_code(&result));
}

fn exit_code<T, E>(result: &Result<T, E>) -> i32 {
    if result.is_ok() { 0 } else { 1 }
}

/// Log to a file: the terminal belongs to the renderer while the game runs.
fn init_logging(config: &GameConfig) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    match File::create(&config.log_file) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!(
                "Warning: cannot open log file {}: {e}; logging to stderr",
                config.log_file.display()
            );
        }
    }
    if let Err(e) = builder.try_init() {
        eprintln!("Warning: logger already initialised: {e}");
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    physics: &mut dyn Physics,
    levels: &dyn LevelSource,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    kb.honor_release = renderer.enable_key_release();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);

    let (left, bottom) = session.camera.offset();
    renderer.set_viewport(left, bottom);

    let tick_rate = Duration::from_millis(config.physics.tick_rate_ms);
    let mut last_tick = Instant::now();

    // Presses seen between ticks are held for the next one.
    let mut pending = FrameInput::default();

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_requested(&gp) {
            log::info!("quit requested");
            break;
        }

        let now = kb.frame_input(&gp);
        pending.jump |= now.jump;
        pending.skip_level |= now.skip_level;

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput {
                left: now.left,
                right: now.right,
                jump: pending.jump,
                skip_level: pending.skip_level,
            };
            pending = FrameInput::default();

            let events = step::step(session, input, physics, levels)?;
            process_events(&events, renderer, sound);
            last_tick = Instant::now();
        }

        renderer.render(session)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn process_events(events: &[GameEvent], renderer: &mut Renderer, sound: Option<&SoundEngine>) {
    for event in events {
        match event {
            GameEvent::ViewportChanged { left, bottom } => renderer.set_viewport(*left, *bottom),
            GameEvent::PlayerDied { cause } => log::info!("player died: {:?}", cause),
            GameEvent::LevelCompleted { level } => log::debug!("now playing level {}", level),
            _ => {}
        }

        let sfx = match sound {
            Some(s) => s,
            None => continue,
        };
        match event {
            GameEvent::Jumped => sfx.play_jump(),
            GameEvent::CoinCollected
            | GameEvent::KeyCollected
            | GameEvent::DoorUnlocked => sfx.play_pickup(),
            GameEvent::PlayerDied { .. } => sfx.play_game_over(),
            GameEvent::LevelCompleted { .. } | GameEvent::GameCompleted => sfx.play_clear(),
            GameEvent::ViewportChanged { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_failure_exits_nonzero() {
        let init_failed: Result<(), Box<dyn std::error::Error>> =
            Err("terminal init failed: not a tty".into());
        assert_eq!(exit_code(&init_failed), 1);
        assert_eq!(exit_code(&Ok::<(), String>(())), 0);
    }
}
