#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in whole map pixels.
///
/// Overlap follows half-open edges: rectangles that only share an edge do not
/// collide, and empty rectangles never collide with anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from float map coordinates, truncating each
    /// component the way object records are snapped to the pixel grid.
    pub fn from_f32(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x as i32, y as i32, width as i32, height as i32)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn center(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    pub fn mid_bottom(&self) -> (i32, i32) {
        (self.x.saturating_add(self.width / 2), self.bottom())
    }

    pub fn set_mid_bottom(&mut self, (x, bottom): (i32, i32)) {
        self.x = x.saturating_sub(self.width / 2);
        self.y = bottom.saturating_sub(self.height);
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Index of the first rectangle in `others` overlapping `self`.
    pub fn first_intersecting<'a, I>(&self, others: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a Rect>,
    {
        others
            .into_iter()
            .position(|candidate| self.intersects(candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn one_pixel_overlap_intersects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(9, 9, 10, 10);
        assert!(a.intersects(&b));
    }

    #[test]
    fn empty_rect_never_intersects() {
        let point = Rect::new(5, 5, 0, 0);
        let area = Rect::new(0, 0, 10, 10);
        assert!(!point.intersects(&area));
        assert!(!area.intersects(&point));
    }

    #[test]
    fn edges_saturate_for_far_away_rects() {
        let far = Rect::from_f32(3.0e9, 0.0, 16.0, 16.0);
        assert_eq!(far.x, i32::MAX);
        assert_eq!(far.right(), i32::MAX);
        assert!(!far.intersects(&Rect::new(0, 0, 32, 32)));
        assert!(!Rect::new(0, 0, 32, 32).intersects(&far));
    }

    #[test]
    fn mid_bottom_round_trips_for_even_width() {
        let mut feet = Rect::new(0, 0, 16, 8);
        feet.set_mid_bottom((116, 132));
        assert_eq!(feet, Rect::new(108, 124, 16, 8));
        assert_eq!(feet.mid_bottom(), (116, 132));
    }

    #[test]
    fn center_uses_integer_halves() {
        assert_eq!(Rect::new(10, 20, 5, 7).center(), (12, 23));
    }

    #[test]
    fn first_intersecting_reports_lowest_index() {
        let probe = Rect::new(0, 0, 4, 4);
        let others = [
            Rect::new(10, 10, 2, 2),
            Rect::new(2, 2, 4, 4),
            Rect::new(1, 1, 1, 1),
        ];
        assert_eq!(probe.first_intersecting(&others), Some(1));
        assert_eq!(Rect::new(50, 50, 1, 1).first_intersecting(&others), None);
    }
}
