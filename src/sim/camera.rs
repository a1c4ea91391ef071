/// Camera: a scroll offset into the world.
///
/// `(view_left, view_bottom)` is the world coordinate of the screen's
/// bottom-left corner. The player may move freely inside the window left
/// by the four margins; crossing a margin drags the view along by exactly
/// the overshoot.
///
/// After any shift both offsets are truncated to whole pixels and clamped
/// at the world origin, so the view never shows space left of or below
/// the map.

use crate::config::ScreenConfig;
use crate::domain::geom::Rect;

#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub view_left: f32,
    pub view_bottom: f32,
    pub screen_w: f32,
    pub screen_h: f32,
    /// Margins in pixels (config holds them as fractions of the screen).
    pub left_margin: f32,
    pub right_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
}

impl Camera {
    pub fn new(screen: &ScreenConfig) -> Self {
        Camera {
            view_left: 0.0,
            view_bottom: 0.0,
            screen_w: screen.width,
            screen_h: screen.height,
            left_margin: screen.width * screen.left_margin,
            right_margin: screen.width * screen.right_margin,
            top_margin: screen.height * screen.top_margin,
            bottom_margin: screen.height * screen.bottom_margin,
        }
    }

    pub fn reset(&mut self) {
        self.view_left = 0.0;
        self.view_bottom = 0.0;
    }

    /// Integer offset as handed to the renderer.
    pub fn offset(&self) -> (i32, i32) {
        (self.view_left as i32, self.view_bottom as i32)
    }

    /// Re-evaluate the four margins against `target`.
    /// Returns true if the offset changed.
    pub fn scroll(&mut self, target: &Rect) -> bool {
        let before = (self.view_left, self.view_bottom);
        let mut shifted = false;

        // Scroll left
        let left_boundary = self.view_left + self.left_margin;
        if target.left() < left_boundary {
            self.view_left -= left_boundary - target.left();
            shifted = true;
        }

        // Scroll right
        let right_boundary = self.view_left + self.screen_w - self.right_margin;
        if target.right() > right_boundary {
            self.view_left += target.right() - right_boundary;
            shifted = true;
        }

        // Scroll up
        let top_boundary = self.view_bottom + self.screen_h - self.top_margin;
        if target.top() > top_boundary {
            self.view_bottom += target.top() - top_boundary;
            shifted = true;
        }

        // Scroll down
        let bottom_boundary = self.view_bottom + self.bottom_margin;
        if target.bottom() < bottom_boundary {
            self.view_bottom -= bottom_boundary - target.bottom();
            shifted = true;
        }

        if shifted {
            // Whole pixels only, otherwise tiles shimmer between columns.
            // The view never goes below or left of the origin, so a respawn
            // near the start always settles back on (0, 0).
            self.view_left = self.view_left.trunc().max(0.0);
            self.view_bottom = self.view_bottom.trunc().max(0.0);
        }

        (self.view_left, self.view_bottom) != before
    }
}
