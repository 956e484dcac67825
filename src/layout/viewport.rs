use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

pub const MIN_VIEW_WIDTH: f32 = 400.0;
pub const MAX_VIEW_WIDTH: f32 = 6000.0;
pub const MIN_VIEW_HEIGHT: f32 = 300.0;
pub const MAX_VIEW_HEIGHT: f32 = 4500.0;

const ZOOM_OUT_FACTOR: f32 = 1.08;
const ZOOM_IN_FACTOR: f32 = 0.93;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Wheel delta as egui reports it: positive when scrolling up.
    pub fn from_scroll(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(Self::In)
        } else if delta_y < 0.0 {
            Some(Self::Out)
        } else {
            None
        }
    }

    fn factor(self) -> f32 {
        match self {
            Self::In => ZOOM_IN_FACTOR,
            Self::Out => ZOOM_OUT_FACTOR,
        }
    }
}

/// World-space rectangle currently mapped onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

fn clamp_width(w: f32) -> f32 {
    w.clamp(MIN_VIEW_WIDTH, MAX_VIEW_WIDTH)
}

fn clamp_height(h: f32) -> f32 {
    h.clamp(MIN_VIEW_HEIGHT, MAX_VIEW_HEIGHT)
}

fn extent(bounds: Rect) -> Vec2 {
    vec2(bounds.width().max(1.0), bounds.height().max(1.0))
}

impl Default for Viewport {
    fn default() -> Self {
        Self::fit(vec2(MIN_VIEW_WIDTH, MIN_VIEW_HEIGHT))
    }
}

impl Viewport {
    /// One world unit per display unit, origin at the top-left corner.
    pub fn fit(size: Vec2) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: clamp_width(size.x),
            h: clamp_height(size.y),
        }
    }

    pub fn origin(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn center(&self) -> Vec2 {
        vec2(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Display units per world unit along each axis.
    pub fn scale(&self, bounds: Rect) -> Vec2 {
        let size = extent(bounds);
        vec2(size.x / self.w, size.y / self.h)
    }

    pub fn screen_to_world(&self, bounds: Rect, screen: Pos2) -> Vec2 {
        let size = extent(bounds);
        vec2(
            self.x + (screen.x - bounds.left()) * self.w / size.x,
            self.y + (screen.y - bounds.top()) * self.h / size.y,
        )
    }

    pub fn world_to_screen(&self, bounds: Rect, world: Vec2) -> Pos2 {
        let size = extent(bounds);
        pos2(
            bounds.left() + (world.x - self.x) * size.x / self.w,
            bounds.top() + (world.y - self.y) * size.y / self.h,
        )
    }

    /// Shift by a screen-space delta; content follows the pointer.
    pub fn pan(&mut self, bounds: Rect, delta: Vec2) {
        let size = extent(bounds);
        self.x -= delta.x * self.w / size.x;
        self.y -= delta.y * self.h / size.y;
    }

    /// Recompute the origin for a pan gesture that started at `start` with the
    /// viewport at `origin`.
    pub fn pan_from(&mut self, bounds: Rect, origin: Vec2, start: Pos2, current: Pos2) {
        self.x = origin.x;
        self.y = origin.y;
        self.pan(bounds, current - start);
    }

    /// Scale the view around `cursor`, keeping the world point under it fixed.
    pub fn zoom(&mut self, bounds: Rect, cursor: Pos2, direction: ZoomDirection) {
        let anchor = self.screen_to_world(bounds, cursor);
        let factor = direction.factor();
        let next_w = clamp_width(self.w * factor);
        let next_h = clamp_height(self.h * factor);

        self.x = anchor.x - (anchor.x - self.x) * (next_w / self.w);
        self.y = anchor.y - (anchor.y - self.y) * (next_h / self.h);
        self.w = next_w;
        self.h = next_h;
    }

    /// Follow a container resize, keeping the current zoom level and origin.
    pub fn resized(self, previous: Vec2, next: Vec2) -> Self {
        if previous.x <= 0.0 || previous.y <= 0.0 {
            return Self::fit(next);
        }
        Self {
            x: self.x,
            y: self.y,
            w: clamp_width(self.w * next.x / previous.x),
            h: clamp_height(self.h * next.y / previous.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn canvas() -> Rect {
        Rect::from_min_size(pos2(200.0, 40.0), vec2(800.0, 600.0))
    }

    #[test]
    fn fit_clamps_to_bounds() {
        let tiny = Viewport::fit(vec2(100.0, 50.0));
        assert_eq!((tiny.w, tiny.h), (MIN_VIEW_WIDTH, MIN_VIEW_HEIGHT));
        let huge = Viewport::fit(vec2(9000.0, 9000.0));
        assert_eq!((huge.w, huge.h), (MAX_VIEW_WIDTH, MAX_VIEW_HEIGHT));
    }

    #[test]
    fn screen_and_world_round_trip() {
        let viewport = Viewport {
            x: -120.0,
            y: 35.0,
            w: 1600.0,
            h: 1200.0,
        };
        let screen = pos2(530.0, 410.0);
        let world = viewport.screen_to_world(canvas(), screen);
        let back = viewport.world_to_screen(canvas(), world);
        assert!((back - screen).length() < 1e-3);
    }

    #[test]
    fn pan_moves_content_with_the_pointer() {
        let mut viewport = Viewport::fit(vec2(800.0, 600.0));
        let grabbed = viewport.screen_to_world(canvas(), pos2(500.0, 300.0));
        viewport.pan_from(canvas(), Vec2::ZERO, pos2(500.0, 300.0), pos2(560.0, 260.0));
        let under_pointer = viewport.screen_to_world(canvas(), pos2(560.0, 260.0));
        assert!((under_pointer - grabbed).length() < 1e-3);
        assert_eq!((viewport.x, viewport.y), (-60.0, 40.0));
    }

    #[test]
    fn zoom_stops_at_the_limits() {
        let mut viewport = Viewport::fit(vec2(800.0, 600.0));
        for _ in 0..200 {
            viewport.zoom(canvas(), pos2(600.0, 340.0), ZoomDirection::In);
        }
        assert_eq!((viewport.w, viewport.h), (MIN_VIEW_WIDTH, MIN_VIEW_HEIGHT));
        for _ in 0..400 {
            viewport.zoom(canvas(), pos2(600.0, 340.0), ZoomDirection::Out);
        }
        assert_eq!((viewport.w, viewport.h), (MAX_VIEW_WIDTH, MAX_VIEW_HEIGHT));
    }

    #[test]
    fn resize_keeps_zoom_level() {
        let viewport = Viewport {
            x: 10.0,
            y: 20.0,
            w: 1600.0,
            h: 1200.0,
        };
        let resized = viewport.resized(vec2(800.0, 600.0), vec2(1000.0, 600.0));
        assert_eq!((resized.x, resized.y), (10.0, 20.0));
        assert_eq!((resized.w, resized.h), (2000.0, 1200.0));
    }

    #[test]
    fn scroll_direction_maps_to_zoom() {
        assert_eq!(ZoomDirection::from_scroll(12.0), Some(ZoomDirection::In));
        assert_eq!(ZoomDirection::from_scroll(-3.0), Some(ZoomDirection::Out));
        assert_eq!(ZoomDirection::from_scroll(0.0), None);
    }

    proptest! {
        #[test]
        fn prop_zoom_keeps_cursor_anchored(
            x in -3000.0f32..3000.0,
            y in -3000.0f32..3000.0,
            w in MIN_VIEW_WIDTH..MAX_VIEW_WIDTH,
            h in MIN_VIEW_HEIGHT..MAX_VIEW_HEIGHT,
            cx in 200.0f32..1000.0,
            cy in 40.0f32..640.0,
            zoom_in in any::<bool>(),
        ) {
            let mut viewport = Viewport { x, y, w, h };
            let cursor = pos2(cx, cy);
            let before = viewport.screen_to_world(canvas(), cursor);
            let direction = if zoom_in { ZoomDirection::In } else { ZoomDirection::Out };
            viewport.zoom(canvas(), cursor, direction);
            let after = viewport.screen_to_world(canvas(), cursor);

            prop_assert!((after - before).length() < 0.02, "{before:?} -> {after:?}");
            prop_assert!(viewport.w >= MIN_VIEW_WIDTH && viewport.w <= MAX_VIEW_WIDTH);
            prop_assert!(viewport.h >= MIN_VIEW_HEIGHT && viewport.h <= MAX_VIEW_HEIGHT);
        }
    }
}
