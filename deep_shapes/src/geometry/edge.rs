use crate::core::{
    math::{gcd, Coord, Point, Rect},
    trans::ComplexTrans,
};

/// Directed edge from `p1` to `p2`.
///
/// For edges taken from polygon contours the interior lies on the right side, so "outside" is the
/// left side when looking along the edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub p1: Point,
    pub p2: Point,
}

/// Supporting line of a non-degenerate edge: primitive direction (canonical sign) and the offset
/// `perp_dot(dir, p)` shared by every point on the line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineKey {
    pub dir: Point,
    pub offset: i128,
}

impl LineKey {
    /// Position of a point on the line, growing along the canonical direction.
    #[inline]
    pub fn position(&self, p: Point) -> i128 {
        self.dir.dot(p)
    }
}

impl Edge {
    #[inline]
    pub fn new(p1: Point, p2: Point) -> Self {
        Edge { p1, p2 }
    }

    /// Edge from raw coordinates `(x1, y1) -> (x2, y2)`.
    #[inline]
    pub fn from_coords(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Edge::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    /// Direction vector `p2 - p1`.
    #[inline]
    pub fn d(&self) -> Point {
        self.p2 - self.p1
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.p1 == self.p2
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.d().length()
    }

    #[inline]
    pub fn bbox(&self) -> Rect {
        Rect::new(self.p1, self.p2)
    }

    #[inline]
    pub fn reversed(&self) -> Edge {
        Edge::new(self.p2, self.p1)
    }

    #[inline]
    pub fn moved(&self, d: Point) -> Edge {
        Edge::new(self.p1 + d, self.p2 + d)
    }

    #[inline]
    pub fn transformed(&self, t: &ComplexTrans) -> Edge {
        Edge::new(t.apply_point(self.p1), t.apply_point(self.p2))
    }

    /// Same edge pointing along the canonical direction (`dx > 0`, or `dx == 0` and `dy > 0`).
    #[inline]
    pub fn canonical(&self) -> Edge {
        let d = self.d();
        if d.x < 0 || (d.x == 0 && d.y < 0) {
            self.reversed()
        } else {
            *self
        }
    }

    /// Supporting line, `None` for degenerate edges.
    pub fn line_key(&self) -> Option<LineKey> {
        if self.is_degenerate() {
            return None;
        }
        let d = self.d();
        let g = gcd(d.x, d.y);
        let mut dir = Point::new(d.x / g, d.y / g);
        if dir.x < 0 || (dir.x == 0 && dir.y < 0) {
            dir = -dir;
        }
        Some(LineKey {
            dir,
            offset: dir.perp_dot(self.p1),
        })
    }

    /// Returns `true` if `p` lies on the closed segment.
    pub fn contains(&self, p: Point) -> bool {
        if self.is_degenerate() {
            return p == self.p1;
        }
        (p - self.p1).perp_dot(self.d()) == 0 && self.bbox().contains_point(p)
    }

    /// Returns `true` if the closed segments share at least one point.
    pub fn intersects(&self, other: &Edge) -> bool {
        if !self.bbox().touches(&other.bbox()) {
            return false;
        }
        let side = |e: &Edge, p: Point| (p - e.p1).perp_dot(e.d()).signum();
        let s1 = side(self, other.p1);
        let s2 = side(self, other.p2);
        let s3 = side(other, self.p1);
        let s4 = side(other, self.p2);
        if s1 * s2 < 0 && s3 * s4 < 0 {
            return true;
        }
        self.contains(other.p1)
            || self.contains(other.p2)
            || other.contains(self.p1)
            || other.contains(self.p2)
    }
}
