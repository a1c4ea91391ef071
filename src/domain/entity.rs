/// Entities: the Player, static level Sprites and the lists that hold them.

use super::geom::Rect;

/// Frame input: held flags for movement, edge-triggered flags for actions.
/// Movement = continuous (held key), jump / skip = fresh press only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub skip_level: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// Centre of the bounding box, world pixels.
    pub x: f32,
    pub y: f32,
    /// Velocity in pixels per tick.
    pub vx: f32,
    pub vy: f32,
    pub width: f32,
    pub height: f32,
    pub keys_held: u32,
}

impl Player {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Player { x, y, vx: 0.0, vy: 0.0, width, height, keys_held: 0 }
    }

    pub fn bounds(&self) -> Rect {
        Rect::centered(self.x, self.y, self.width, self.height)
    }

    /// Move so that the box's left edge lands on `left`.
    pub fn set_left(&mut self, left: f32) { self.x = left + self.width / 2.0; }
    pub fn set_right(&mut self, right: f32) { self.x = right - self.width / 2.0; }
    pub fn set_bottom(&mut self, bottom: f32) { self.y = bottom + self.height / 2.0; }
    pub fn set_top(&mut self, top: f32) { self.y = top - self.height / 2.0; }
}

/// A static level entity (tile). The glyph is what the level file used
/// for this cell and is what the renderer draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub bounds: Rect,
    pub glyph: char,
}

impl Sprite {
    pub fn new(bounds: Rect, glyph: char) -> Self {
        Sprite { bounds, glyph }
    }
}

/// Ordered collection of sprites. Removal is permanent for the lifetime
/// of the level, so lists only ever shrink.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpriteList {
    sprites: Vec<Sprite>,
}

impl SpriteList {
    pub fn new() -> Self {
        SpriteList { sprites: vec![] }
    }

    pub fn push(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    pub fn len(&self) -> usize { self.sprites.len() }
    pub fn is_empty(&self) -> bool { self.sprites.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Sprite> {
        self.sprites.iter()
    }

    pub fn get(&self, idx: usize) -> Option<&Sprite> {
        self.sprites.get(idx)
    }

    /// Remove the sprites at `indices` (any order, duplicates ignored).
    /// Returns how many were actually removed.
    pub fn remove_all(&mut self, indices: &[usize]) -> usize {
        let mut sorted: Vec<usize> = indices.iter().copied()
            .filter(|&i| i < self.sprites.len())
            .collect();
        sorted.sort_unstable();
        sorted.dedup();
        for &i in sorted.iter().rev() {
            self.sprites.remove(i);
        }
        sorted.len()
    }
}

impl FromIterator<Sprite> for SpriteList {
    fn from_iter<I: IntoIterator<Item = Sprite>>(iter: I) -> Self {
        SpriteList { sprites: iter.into_iter().collect() }
    }
}

impl<'a> IntoIterator for &'a SpriteList {
    type Item = &'a Sprite;
    type IntoIter = std::slice::Iter<'a, Sprite>;

    fn into_iter(self) -> Self::IntoIter {
        self.sprites.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(col: usize) -> Sprite {
        Sprite::new(Rect::new(col as f32 * 64.0, 0.0, 64.0, 64.0), '#')
    }

    #[test]
    fn player_edge_setters_keep_size() {
        let mut p = Player::new(64.0, 94.0, 40.0, 60.0);
        p.set_bottom(128.0);
        assert_eq!(p.bounds().bottom(), 128.0);
        assert_eq!(p.y, 158.0);
        p.set_right(200.0);
        assert_eq!(p.bounds().right(), 200.0);
        p.set_left(0.0);
        assert_eq!(p.x, 20.0);
        p.set_top(60.0);
        assert_eq!(p.bounds().top(), 60.0);
    }

    #[test]
    fn remove_all_handles_unsorted_and_duplicate_indices() {
        let mut list: SpriteList = (0..5).map(tile).collect();
        let removed = list.remove_all(&[3, 0, 3, 9]);
        assert_eq!(removed, 2);
        let cols: Vec<f32> = list.iter().map(|s| s.bounds.x / 64.0).collect();
        assert_eq!(cols, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn remove_all_on_empty_list_is_noop() {
        let mut list = SpriteList::new();
        assert_eq!(list.remove_all(&[0]), 0);
        assert!(list.is_empty());
    }
}
