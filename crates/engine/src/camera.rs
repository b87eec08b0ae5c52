use crate::geometry::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// View onto a map of `world_size` pixels, scaled by `zoom` into a
/// `viewport` of screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    world_width: u32,
    world_height: u32,
    viewport: Viewport,
    zoom: f32,
    center: Vec2,
}

impl Camera {
    pub fn new(world_size: (u32, u32), viewport: Viewport, zoom: f32) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            1.0
        };
        let (world_width, world_height) = world_size;
        Self {
            world_width,
            world_height,
            viewport,
            zoom,
            center: Vec2::new(world_width as f32 * 0.5, world_height as f32 * 0.5),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn world_size(&self) -> (u32, u32) {
        (self.world_width, self.world_height)
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Size of the visible world region in map pixels.
    pub fn view_size(&self) -> Vec2 {
        Vec2::new(
            self.viewport.width as f32 / self.zoom,
            self.viewport.height as f32 / self.zoom,
        )
    }

    /// Centres on `point`, clamped so the view stays inside the map. A map
    /// smaller than the view on an axis is centred on that axis instead.
    pub fn center_on(&mut self, point: Vec2) {
        let view = self.view_size();
        self.center = Vec2::new(
            clamp_axis(point.x, view.x, self.world_width as f32),
            clamp_axis(point.y, view.y, self.world_height as f32),
        );
    }

    pub fn top_left(&self) -> Vec2 {
        let view = self.view_size();
        Vec2::new(self.center.x - view.x * 0.5, self.center.y - view.y * 0.5)
    }

    /// Screen pixel holding `world`. Floors, so every caller lands on the
    /// same grid as [`Camera::world_rect_to_screen`].
    pub fn world_to_screen(&self, world: Vec2) -> (i32, i32) {
        let origin = self.top_left();
        (
            ((world.x - origin.x) * self.zoom).floor() as i32,
            ((world.y - origin.y) * self.zoom).floor() as i32,
        )
    }

    /// Screen rectangle for a map-pixel rectangle. Edges are floored separately
    /// so neighbouring tiles meet without gaps at fractional zoom.
    pub fn world_rect_to_screen(&self, world: Rect) -> Rect {
        let (left, top) =
            self.world_to_screen(Vec2::new(world.left() as f32, world.top() as f32));
        let (right, bottom) =
            self.world_to_screen(Vec2::new(world.right() as f32, world.bottom() as f32));
        Rect::new(left, top, right - left, bottom - top)
    }

    /// Map-pixel rectangle covering everything on screen.
    pub fn visible_world_rect(&self) -> Rect {
        let origin = self.top_left();
        let view = self.view_size();
        let left = origin.x.floor() as i32;
        let top = origin.y.floor() as i32;
        Rect::new(
            left,
            top,
            (origin.x + view.x).ceil() as i32 - left,
            (origin.y + view.y).ceil() as i32 - top,
        )
    }
}

fn clamp_axis(value: f32, view: f32, world: f32) -> f32 {
    if world <= view {
        world * 0.5
    } else {
        value.clamp(view * 0.5, world - view * 0.5)
    }
}
