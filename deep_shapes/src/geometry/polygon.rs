use super::Edge;
use crate::core::{
    math::{Point, Rect},
    trans::ComplexTrans,
};

/// Polygon with one hull and any number of holes, always kept in normalized form.
///
/// Normalized form: no repeated or collinear points, hull clockwise (interior on the right of
/// every contour edge), holes counter clockwise, every contour starting at its smallest point.
/// Contours with fewer than three points after cleanup are dropped, a polygon without a hull is
/// degenerate.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polygon {
    hull: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

/// Twice the signed area of a closed contour (positive for counter clockwise).
pub fn contour_area2(points: &[Point]) -> i128 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum()
}

fn normalize_contour(points: &[Point], clockwise: bool) -> Vec<Point> {
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if pts.last() != Some(&p) {
            pts.push(p);
        }
    }
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }

    // drop collinear points (including spikes) until stable
    let mut changed = true;
    while changed && pts.len() >= 3 {
        changed = false;
        let mut i = 0;
        while i < pts.len() && pts.len() >= 3 {
            let n = pts.len();
            let prev = pts[(i + n - 1) % n];
            let next = pts[(i + 1) % n];
            let cur = pts[i];
            if (cur - prev).perp_dot(next - cur) == 0 {
                pts.remove(i);
                changed = true;
            } else {
                i += 1;
            }
        }
        pts.dedup();
        while pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
    }

    if pts.len() < 3 {
        return Vec::new();
    }

    let area2 = contour_area2(&pts);
    if (area2 < 0) != clockwise {
        pts.reverse();
    }

    if let Some(start) = pts
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(i, _)| i)
    {
        pts.rotate_left(start);
    }
    pts
}

impl Polygon {
    /// Polygon without holes from the hull points given (any orientation).
    pub fn new(hull: impl IntoIterator<Item = Point>) -> Self {
        Polygon::with_holes(hull, std::iter::empty::<Vec<Point>>())
    }

    /// Polygon from hull and hole point lists (any orientation).
    pub fn with_holes<H, I>(hull: H, holes: I) -> Self
    where
        H: IntoIterator<Item = Point>,
        I: IntoIterator,
        I::Item: IntoIterator<Item = Point>,
    {
        let hull: Vec<Point> = hull.into_iter().collect();
        let hull = normalize_contour(&hull, true);
        if hull.is_empty() {
            return Polygon::default();
        }
        let mut holes: Vec<Vec<Point>> = holes
            .into_iter()
            .map(|h| {
                let h: Vec<Point> = h.into_iter().collect();
                normalize_contour(&h, false)
            })
            .filter(|h| !h.is_empty())
            .collect();
        holes.sort();
        Polygon { hull, holes }
    }

    /// Box polygon.
    pub fn from_rect(r: &Rect) -> Self {
        if r.is_empty() {
            return Polygon::default();
        }
        Polygon::new([
            r.min,
            Point::new(r.min.x, r.max.y),
            r.max,
            Point::new(r.max.x, r.min.y),
        ])
    }

    #[inline]
    pub fn hull(&self) -> &[Point] {
        &self.hull
    }

    #[inline]
    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.hull.is_empty()
    }

    pub fn bbox(&self) -> Rect {
        self.hull.iter().copied().collect()
    }

    /// Twice the area (hull minus holes).
    pub fn area2(&self) -> i128 {
        -contour_area2(&self.hull) - self.holes.iter().map(|h| contour_area2(h)).sum::<i128>()
    }

    /// All contours, hull first.
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> + '_ {
        std::iter::once(self.hull.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Contour edges, interior on the right side of every edge.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.contours().flat_map(|c| {
            let n = c.len();
            (0..n).map(move |i| Edge::new(c[i], c[(i + 1) % n]))
        })
    }

    /// Translated copy (normalized form is kept).
    pub fn moved(&self, d: Point) -> Polygon {
        Polygon {
            hull: self.hull.iter().map(|p| *p + d).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|p| *p + d).collect())
                .collect(),
        }
    }

    pub fn transformed(&self, t: &ComplexTrans) -> Polygon {
        Polygon::with_holes(
            self.hull.iter().map(|p| t.apply_point(*p)),
            self.holes
                .iter()
                .map(|h| h.iter().map(|p| t.apply_point(*p)).collect::<Vec<_>>()),
        )
    }
}
