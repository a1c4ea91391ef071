/// Player controller: held-key state → horizontal velocity, jump requests.
///
/// Pure functions, no side effects beyond the player passed in.
///
/// ## Horizontal velocity, one tick
///
/// | left | right | effect                                   |
/// |------|-------|------------------------------------------|
/// |  no  |  no   | 1 unit toward zero, never past it        |
/// | yes  |  no   | −1, floor at −max                        |
/// |  no  | yes   | +1, ceiling at +max                      |
/// | yes  | yes   | −1 then +1, each step clamped            |
///
/// The result is always inside `[−max, +max]`, whatever came in.

use super::entity::Player;

/// Units of speed gained or lost per tick.
pub const ACCELERATION: f32 = 1.0;

pub fn horizontal_velocity(vx: f32, left: bool, right: bool, max_speed: f32) -> f32 {
    let clamp = |v: f32| v.max(-max_speed).min(max_speed);
    let mut v = vx;

    if left {
        v = clamp(v - ACCELERATION);
    }
    if right {
        v = clamp(v + ACCELERATION);
    }
    if !left && !right {
        // Friction: decay toward zero without overshooting
        if v > 0.0 {
            v = (v - ACCELERATION).max(0.0);
        } else if v < 0.0 {
            v = (v + ACCELERATION).min(0.0);
        }
    }

    clamp(v)
}

/// Start a jump if grounded. Returns true when the jump happened.
pub fn try_jump(player: &mut Player, grounded: bool, jump_speed: f32) -> bool {
    if !grounded {
        return false;
    }
    player.vy = jump_speed;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: f32 = 10.0;

    #[test]
    fn idle_decays_to_zero_and_stays() {
        let mut v = 5.0;
        let mut seen = vec![];
        for _ in 0..10 {
            v = horizontal_velocity(v, false, false, MAX);
            seen.push(v);
        }
        assert_eq!(seen, vec![4.0, 3.0, 2.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn idle_decay_from_negative() {
        assert_eq!(horizontal_velocity(-3.0, false, false, MAX), -2.0);
    }

    #[test]
    fn idle_decay_never_overshoots_fraction() {
        assert_eq!(horizontal_velocity(0.5, false, false, MAX), 0.0);
        assert_eq!(horizontal_velocity(-0.25, false, false, MAX), 0.0);
    }

    #[test]
    fn holding_right_accelerates_to_cap() {
        let mut v = 0.0;
        for _ in 0..25 {
            v = horizontal_velocity(v, false, true, MAX);
        }
        assert_eq!(v, MAX);
    }

    #[test]
    fn holding_left_accelerates_to_floor() {
        let mut v = 3.0;
        for _ in 0..25 {
            v = horizontal_velocity(v, true, false, MAX);
        }
        assert_eq!(v, -MAX);
    }

    #[test]
    fn both_held_applies_both_steps() {
        assert_eq!(horizontal_velocity(4.0, true, true, MAX), 4.0);
        // At the floor the −1 is absorbed by the clamp, the +1 is not.
        assert_eq!(horizontal_velocity(-MAX, true, true, MAX), -9.0);
        assert_eq!(horizontal_velocity(MAX, true, true, MAX), MAX);
    }

    #[test]
    fn output_always_within_bounds() {
        let inputs = [(false, false), (true, false), (false, true), (true, true)];
        for start in [-50.0, -10.5, -1.0, 0.0, 7.0, 10.0, 99.0] {
            for (l, r) in inputs {
                let v = horizontal_velocity(start, l, r, MAX);
                assert!((-MAX..=MAX).contains(&v), "start={start} l={l} r={r} → {v}");
            }
        }
    }

    #[test]
    fn jump_only_when_grounded() {
        let mut p = Player::new(64.0, 94.0, 40.0, 60.0);
        assert!(!try_jump(&mut p, false, 25.0));
        assert_eq!(p.vy, 0.0);
        assert!(try_jump(&mut p, true, 25.0));
        assert_eq!(p.vy, 25.0);
    }
}
