//! Integer rectangles used for blit, clip and stretch regions.

/// An axis-aligned rectangle. `x`/`y` may be negative when a caller asks
/// for a region that starts off-surface; width and height never are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle anchored at the origin.
    pub const fn sized(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }

    /// Right edge (exclusive).
    pub fn right(&self) -> i64 {
        self.x as i64 + self.w as i64
    }

    /// Bottom edge (exclusive).
    pub fn bottom(&self) -> i64 {
        self.y as i64 + self.h as i64
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    /// Overlap of two rectangles, `None` if they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 as i64 || y1 <= y0 as i64 {
            return None;
        }
        Some(Rect::new(x0, y0, (x1 - x0 as i64) as u32, (y1 - y0 as i64) as u32))
    }

    /// True if `self` lies entirely inside `[0, width) x [0, height)`.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.right() <= width as i64
            && self.bottom() <= height as i64
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && (x as i64) < self.right() && (y as i64) < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(-3, 4, 10, 2);
        assert_eq!(r.right(), 7);
        assert_eq!(r.bottom(), 6);
        assert_eq!(r.area(), 20);
        assert!(!r.is_empty());
        assert!(Rect::new(0, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersection(&b), Some(Rect::new(50, 50, 50, 50)));

        let c = Rect::new(200, 200, 10, 10);
        assert_eq!(a.intersection(&c), None);

        // Touching edges do not overlap
        let d = Rect::new(100, 0, 10, 10);
        assert_eq!(a.intersection(&d), None);
    }

    #[test]
    fn test_rect_fits_within() {
        assert!(Rect::new(0, 0, 4, 4).fits_within(4, 4));
        assert!(!Rect::new(1, 0, 4, 4).fits_within(4, 4));
        assert!(!Rect::new(-1, 0, 2, 2).fits_within(4, 4));
        assert!(!Rect::new(0, 3, 1, 2).fits_within(4, 4));
        assert!(Rect::new(4, 4, 0, 0).fits_within(4, 4));
    }

    #[test]
    fn test_rect_contains() {
        let r = Rect::new(2, 2, 3, 3);
        assert!(r.contains(2, 2));
        assert!(r.contains(4, 4));
        assert!(!r.contains(5, 4));
        assert!(!r.contains(1, 3));
    }
}
