use super::{Coord, Point};

/// Closed axis aligned box. An empty box has `min > max`; every operation treats it as the
/// neutral element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Default for Rect {
    #[inline]
    fn default() -> Self {
        Rect::empty()
    }
}

impl Rect {
    /// Box spanning the two corner points given (in any order).
    #[inline]
    pub fn new(p1: Point, p2: Point) -> Self {
        Rect {
            min: Point::new(p1.x.min(p2.x), p1.y.min(p2.y)),
            max: Point::new(p1.x.max(p2.x), p1.y.max(p2.y)),
        }
    }

    /// Box from `(left, bottom, right, top)`.
    #[inline]
    pub fn from_ltrb(left: Coord, bottom: Coord, right: Coord, top: Coord) -> Self {
        Rect::new(Point::new(left, bottom), Point::new(right, top))
    }

    #[inline]
    pub const fn empty() -> Self {
        Rect {
            min: Point::new(Coord::MAX, Coord::MAX),
            max: Point::new(Coord::MIN, Coord::MIN),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn width(&self) -> Coord {
        if self.is_empty() {
            0
        } else {
            self.max.x - self.min.x
        }
    }

    #[inline]
    pub fn height(&self) -> Coord {
        if self.is_empty() {
            0
        } else {
            self.max.y - self.min.y
        }
    }

    /// Smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Rect {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Extends the box to include the point given.
    #[inline]
    pub fn add_point(&mut self, p: Point) {
        *self = self.union(&Rect { min: p, max: p });
    }

    /// Intersection of two boxes (empty if they do not touch).
    #[inline]
    pub fn intersection(&self, other: &Rect) -> Rect {
        if !self.touches(other) {
            return Rect::empty();
        }
        Rect {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Closed overlap test: boxes sharing only a border or a corner touch.
    #[inline]
    pub fn touches(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// True if `other` lies completely inside this box (borders included).
    #[inline]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        !self.is_empty()
            && self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
    }

    /// Box translated by `d`.
    #[inline]
    pub fn moved(&self, d: Point) -> Rect {
        if self.is_empty() {
            return *self;
        }
        Rect {
            min: self.min + d,
            max: self.max + d,
        }
    }

    /// Box grown by `d` on every side.
    #[inline]
    pub fn enlarged(&self, d: Coord) -> Rect {
        if self.is_empty() || d == 0 {
            return *self;
        }
        Rect {
            min: Point::new(self.min.x - d, self.min.y - d),
            max: Point::new(self.max.x + d, self.max.y + d),
        }
    }
}

impl FromIterator<Point> for Rect {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        let mut r = Rect::empty();
        for p in iter {
            r.add_point(p);
        }
        r
    }
}
