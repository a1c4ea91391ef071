/// Physics layer: gravity integration, solid-geometry resolution and
/// overlap queries.
///
/// ## Architecture
///
/// The simulation never talks to a concrete engine. It goes through the
/// `Physics` trait, so the step function can be driven by a fake in tests
/// and by `PlatformerPhysics` in the game.
///
/// ## PlatformerPhysics: per-tick order
///
///   1. `vy -= gravity`
///   2. Move along Y, then push out of any overlapped wall:
///        moving up   → top    = lowest wall bottom
///        moving down → bottom = highest wall top
///      and `vy = 0` on any vertical contact.
///   3. Move along X, then push out:
///        moving right → right = leftmost wall left
///        moving left  → left  = rightmost wall right
///      `vx` is left alone: the controller owns horizontal speed.
///
/// Axes are resolved separately so a player sliding along a floor never
/// snags on it: standing on a wall only *touches* it, and touching is not
/// overlapping (see `Rect::intersects`).
///
/// ## Grounded
///
/// The player may jump if a wall lies within `jump_probe` pixels below
/// the feet.

use super::entity::{Player, SpriteList};
use super::geom::Rect;

pub trait Physics {
    /// Advance the player by one tick against `solids`.
    fn integrate(&mut self, player: &mut Player, solids: &SpriteList);

    /// Is the player resting on solid geometry (and therefore allowed to jump)?
    fn can_jump(&self, player: &Player, solids: &SpriteList) -> bool;

    /// Indices of every sprite in `list` whose box overlaps `bounds`.
    fn overlapping(&self, bounds: &Rect, list: &SpriteList) -> Vec<usize> {
        overlapping(bounds, list)
    }
}

/// Linear overlap scan. Levels hold a few hundred tiles at most.
pub fn overlapping(bounds: &Rect, list: &SpriteList) -> Vec<usize> {
    list.iter()
        .enumerate()
        .filter(|(_, s)| s.bounds.intersects(bounds))
        .map(|(i, _)| i)
        .collect()
}

/// Gravity + axis-separated AABB resolution against a wall list.
#[derive(Clone, Debug)]
pub struct PlatformerPhysics {
    pub gravity: f32,
    pub jump_probe: f32,
}

impl PlatformerPhysics {
    pub fn new(gravity: f32, jump_probe: f32) -> Self {
        PlatformerPhysics { gravity, jump_probe }
    }
}

impl Physics for PlatformerPhysics {
    fn integrate(&mut self, player: &mut Player, solids: &SpriteList) {
        player.vy -= self.gravity;

        // ── Vertical ──
        player.y += player.vy;
        let hits = overlapping(&player.bounds(), solids);
        if !hits.is_empty() {
            if player.vy > 0.0 {
                let ceiling = hits.iter()
                    .filter_map(|&i| solids.get(i))
                    .map(|s| s.bounds.bottom())
                    .fold(f32::INFINITY, f32::min);
                player.set_top(ceiling);
            } else {
                let floor = hits.iter()
                    .filter_map(|&i| solids.get(i))
                    .map(|s| s.bounds.top())
                    .fold(f32::NEG_INFINITY, f32::max);
                player.set_bottom(floor);
            }
            player.vy = 0.0;
        }

        // ── Horizontal ──
        player.x += player.vx;
        let hits = overlapping(&player.bounds(), solids);
        if !hits.is_empty() {
            if player.vx > 0.0 {
                let wall = hits.iter()
                    .filter_map(|&i| solids.get(i))
                    .map(|s| s.bounds.left())
                    .fold(f32::INFINITY, f32::min);
                player.set_right(wall);
            } else if player.vx < 0.0 {
                let wall = hits.iter()
                    .filter_map(|&i| solids.get(i))
                    .map(|s| s.bounds.right())
                    .fold(f32::NEG_INFINITY, f32::max);
                player.set_left(wall);
            }
        }
    }

    fn can_jump(&self, player: &Player, solids: &SpriteList) -> bool {
        let probe = player.bounds().offset(0.0, -self.jump_probe);
        solids.iter().any(|s| s.bounds.intersects(&probe))
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Sprite;

    const T: f32 = 64.0;

    /// Build a wall list from a diagram. Last row is world row 0.
    /// '#' = wall, anything else = empty.
    fn walls_from(rows: &[&str]) -> SpriteList {
        let h = rows.len();
        let mut list = SpriteList::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                if ch == '#' {
                    let wy = (h - 1 - r) as f32 * T;
                    list.push(Sprite::new(Rect::new(c as f32 * T, wy, T, T), ch));
                }
            }
        }
        list
    }

    fn engine() -> PlatformerPhysics {
        PlatformerPhysics::new(1.0, 5.0)
    }

    // ── integrate ──

    #[test]
    fn gravity_accelerates_in_free_fall() {
        let walls = SpriteList::new();
        let mut p = Player::new(100.0, 500.0, 40.0, 60.0);
        let mut e = engine();
        e.integrate(&mut p, &walls);
        e.integrate(&mut p, &walls);
        assert_eq!(p.vy, -2.0);
        assert_eq!(p.y, 497.0);
    }

    #[test]
    fn lands_on_floor_and_stops() {
        let walls = walls_from(&[
            "   ",
            "###",
        ]);
        let mut p = Player::new(96.0, 95.0, 40.0, 60.0);
        p.vy = -8.0;
        engine().integrate(&mut p, &walls);
        assert_eq!(p.bounds().bottom(), 64.0);
        assert_eq!(p.vy, 0.0);
    }

    #[test]
    fn standing_still_is_stable() {
        let walls = walls_from(&["###"]);
        let mut p = Player::new(96.0, 94.0, 40.0, 60.0);
        let mut e = engine();
        for _ in 0..30 {
            e.integrate(&mut p, &walls);
        }
        assert_eq!(p.y, 94.0);
        assert_eq!(p.x, 96.0);
    }

    #[test]
    fn walking_along_floor_does_not_snag() {
        let walls = walls_from(&["#####"]);
        let mut p = Player::new(96.0, 94.0, 40.0, 60.0);
        p.vx = 10.0;
        let mut e = engine();
        for _ in 0..10 {
            e.integrate(&mut p, &walls);
        }
        assert_eq!(p.x, 196.0);
        assert_eq!(p.y, 94.0);
    }

    #[test]
    fn wall_blocks_horizontal_movement() {
        let walls = walls_from(&[
            "  #",
            "###",
        ]);
        // Standing on row 0, wall at column 2 row 1 (x 128..192).
        let mut p = Player::new(100.0, 94.0, 40.0, 60.0);
        p.vx = 10.0;
        engine().integrate(&mut p, &walls);
        assert_eq!(p.bounds().right(), 128.0);
        assert_eq!(p.vx, 10.0, "controller owns vx");
    }

    #[test]
    fn wall_blocks_leftward_movement() {
        let walls = walls_from(&[
            "#  ",
            "###",
        ]);
        let mut p = Player::new(88.0, 94.0, 40.0, 60.0);
        p.vx = -10.0;
        engine().integrate(&mut p, &walls);
        assert_eq!(p.bounds().left(), 64.0);
    }

    #[test]
    fn ceiling_stops_upward_motion() {
        let walls = walls_from(&[
            " # ",
            "   ",
            "###",
        ]);
        // Ceiling tile spans y 128..192. Head at 120 moving up by 20.
        let mut p = Player::new(96.0, 90.0, 40.0, 60.0);
        p.vy = 21.0;
        engine().integrate(&mut p, &walls);
        assert_eq!(p.bounds().top(), 128.0);
        assert_eq!(p.vy, 0.0);
    }

    // ── can_jump ──

    #[test]
    fn can_jump_when_standing() {
        let walls = walls_from(&["###"]);
        let p = Player::new(96.0, 94.0, 40.0, 60.0);
        assert!(engine().can_jump(&p, &walls));
    }

    #[test]
    fn cannot_jump_in_midair() {
        let walls = walls_from(&["###"]);
        let p = Player::new(96.0, 200.0, 40.0, 60.0);
        assert!(!engine().can_jump(&p, &walls));
    }

    #[test]
    fn probe_distance_counts_as_ground() {
        let walls = walls_from(&["###"]);
        let p = Player::new(96.0, 98.0, 40.0, 60.0); // feet 4px above floor
        assert!(engine().can_jump(&p, &walls));
    }

    // ── overlapping ──

    #[test]
    fn overlapping_returns_every_hit() {
        let list = walls_from(&["# ##"]);
        let probe = Rect::new(50.0, 10.0, 100.0, 10.0); // spans columns 0..2
        assert_eq!(overlapping(&probe, &list), vec![0, 1]);
        let nothing = Rect::new(64.0, 10.0, 64.0, 10.0); // exactly column 1, which is empty
        assert!(overlapping(&nothing, &list).is_empty());
    }
}
